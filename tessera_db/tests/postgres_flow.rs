//! Runs against the database in `TEST_DATABASE_URL`; every test is a no-op
//! when it isn't set.

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use tessera_app::{
    audit_log::AuditLog,
    services::AuditSink,
    specification::{Predicate, Specification},
    uow::UnitOfWork,
};
use tessera_core::{ApplicationError, DbError, Result};
use tessera_db::{
    DbPool, MIGRATOR, PostgresAuditSink, establish_test_connection_pool,
    health::{HealthStatus, check_migrations, check_repository},
    uow::PostgresUnitOfWorkProvider,
};
use tessera_types::{audit::AuditRecord, grid::PageRequest};

async fn test_pool() -> Option<DbPool> {
    if std::env::var("TEST_DATABASE_URL").is_err() {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return None;
    }
    let pool = establish_test_connection_pool().await.ok()?;
    MIGRATOR.run(&pool).await.ok()?;
    Some(pool)
}

/// Audit logs tagged with a unique entity type so tests don't see each other's rows.
fn logs(tag: &str, actions: &[&str]) -> Vec<AuditLog> {
    actions
        .iter()
        .map(|action| {
            let mut record = AuditRecord::new(*action, tag, Utc::now());
            record.user_name = Some("ada".into());
            AuditLog::from(record)
        })
        .collect()
}

fn tag() -> String {
    format!("Test{}", Uuid::new_v4().simple())
}

#[tokio::test]
async fn saved_logs_are_readable_from_a_new_unit_of_work() -> Result<()> {
    let Some(pool) = test_pool().await else {
        return Ok(());
    };
    let provider = PostgresUnitOfWorkProvider::new(pool);
    let cancel = CancellationToken::new();
    let tag = tag();

    let uow = provider.unit_of_work();
    let added = uow
        .repositories()
        .commands::<AuditLog>()?
        .add_range(logs(&tag, &["CreateWidget", "RenameWidget", "DeleteWidget"]), &cancel)
        .await?;
    assert_eq!(uow.save_changes(&cancel).await?, 3);

    let reader = provider.unit_of_work();
    let queries = reader.repositories().queries::<AuditLog>()?;

    let found = queries.get_by_id(&added[1].id, &cancel).await?;
    assert_eq!(found.map(|log| log.action), Some("RenameWidget".to_string()));

    let spec = Specification::<AuditLog>::new()
        .filter(Predicate::eq("entityType", tag.as_str()))
        .filter(Predicate::contains("action", "widget"))
        .order_by("action");
    let (page, total) = queries.page(&spec, PageRequest::new(1, 2), &cancel).await?;
    assert_eq!(total, 3);
    let actions: Vec<_> = page.into_iter().map(|log| log.action).collect();
    assert_eq!(actions, ["CreateWidget", "DeleteWidget"]);

    assert!(queries.any(&spec, &cancel).await?);
    Ok(())
}

#[tokio::test]
async fn rolled_back_transaction_leaves_nothing_behind() -> Result<()> {
    let Some(pool) = test_pool().await else {
        return Ok(());
    };
    let provider = PostgresUnitOfWorkProvider::new(pool);
    let cancel = CancellationToken::new();
    let tag = tag();

    let uow = provider.unit_of_work();
    let handle = uow.begin_transaction(&cancel).await?;
    uow.repositories()
        .commands::<AuditLog>()?
        .add_range(logs(&tag, &["CreateWidget"]), &cancel)
        .await?;
    uow.save_changes(&cancel).await?;
    assert_eq!(uow.current_transaction(), Some(handle));
    uow.rollback_transaction().await?;
    assert!(!uow.has_active_transaction());

    let spec = Specification::<AuditLog>::new().filter(Predicate::eq("entity_type", tag.as_str()));
    let count = provider
        .unit_of_work()
        .repositories()
        .queries::<AuditLog>()?
        .count(&spec, &cancel)
        .await?;
    assert_eq!(count, 0);
    Ok(())
}

#[tokio::test]
async fn committing_a_stale_handle_is_rejected() -> Result<()> {
    let Some(pool) = test_pool().await else {
        return Ok(());
    };
    let provider = PostgresUnitOfWorkProvider::new(pool);
    let cancel = CancellationToken::new();

    let uow = provider.unit_of_work();
    let result = uow
        .commit_transaction(tessera_app::uow::TransactionHandle::new(), &cancel)
        .await;
    assert!(result.is_err());

    uow.begin_transaction(&cancel).await?;
    let stale = tessera_app::uow::TransactionHandle::new();
    assert!(uow.commit_transaction(stale, &cancel).await.is_err());
    uow.rollback_transaction().await?;
    Ok(())
}

#[tokio::test]
async fn updating_a_missing_row_is_not_found() -> Result<()> {
    let Some(pool) = test_pool().await else {
        return Ok(());
    };
    let provider = PostgresUnitOfWorkProvider::new(pool);
    let cancel = CancellationToken::new();

    let uow = provider.unit_of_work();
    let missing = logs(&tag(), &["CreateWidget"]).remove(0);
    let err = uow
        .repositories()
        .commands::<AuditLog>()?
        .update(missing, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, ApplicationError::Db(DbError::NotFound { .. })));
    Ok(())
}

#[tokio::test]
async fn audit_sink_stores_records() -> Result<()> {
    let Some(pool) = test_pool().await else {
        return Ok(());
    };
    let provider = PostgresUnitOfWorkProvider::new(pool);
    let sink = PostgresAuditSink::new(provider.clone());
    let tag = tag();

    sink.record(AuditRecord::new("CreateWidget", tag.as_str(), Utc::now()).failed("boom"))
        .await?;

    let spec = Specification::<AuditLog>::new().filter(Predicate::eq("entity_type", tag.as_str()));
    let stored = provider
        .unit_of_work()
        .repositories()
        .queries::<AuditLog>()?
        .first(&spec, &CancellationToken::new())
        .await?
        .expect("audit record stored");
    assert_eq!(stored.error_message.as_deref(), Some("boom"));
    Ok(())
}

#[tokio::test]
async fn health_checks_pass_on_a_migrated_database() -> Result<()> {
    let Some(pool) = test_pool().await else {
        return Ok(());
    };
    let provider = PostgresUnitOfWorkProvider::new(pool.clone());

    assert_eq!(check_migrations(&pool).await.status, HealthStatus::Healthy);
    assert_eq!(check_repository(&provider).await.status, HealthStatus::Healthy);
    Ok(())
}

#[tokio::test]
async fn long_request_and_entity_names_are_stored_whole() -> Result<()> {
    let Some(pool) = test_pool().await else {
        return Ok(());
    };
    let provider = PostgresUnitOfWorkProvider::new(pool);
    let cancel = CancellationToken::new();
    let entity_type = format!("{}{}", tag(), "Entity".repeat(50));
    let action = "Reconcile".repeat(40);

    let mut record = AuditRecord::new(action.as_str(), entity_type.as_str(), Utc::now());
    record.user_name = Some("n".repeat(300));
    PostgresAuditSink::new(provider.clone()).store(record).await?;

    let spec =
        Specification::<AuditLog>::new().filter(Predicate::eq("entity_type", entity_type.as_str()));
    let stored = provider
        .unit_of_work()
        .repositories()
        .queries::<AuditLog>()?
        .first(&spec, &cancel)
        .await?
        .expect("audit record stored");
    assert_eq!(stored.action, action);
    assert_eq!(stored.user_name.map(|n| n.len()), Some(300));
    Ok(())
}
