use std::{env, sync::Arc};

use tessera_app::{
    DispatchScope, Dispatcher,
    config::Config,
    cqrs::queries::{GetAuditLog, ListAuditLogs},
    queries_handlers::{GetAuditLogHandler, ListAuditLogsHandler},
    services::StaticUser,
};
use tessera_core::{ApplicationError, DbError, Result};
use tessera_db::{
    MIGRATOR, PostgresAuditSink, establish_connection_pool,
    health::{HealthStatus, run_health_checks},
    uow::PostgresUnitOfWorkProvider,
};
use tessera_types::grid::PagedAndSortedRequest;

mod logs;
use logs::setup_logging;

#[tokio::main]
#[cfg(not(tarpaulin_include))]
async fn main() -> Result<(), ApplicationError> {
    let _log_guard = setup_logging();
    let search = env::args().nth(1);

    let (dispatcher, pool, provider) = setup_app().await?;

    let report = run_health_checks(&pool, &provider).await;
    for check in &report.checks {
        tracing::info!(check = check.name, status = ?check.status, "{}", check.description);
    }
    if report.status == HealthStatus::Unhealthy {
        tracing::error!("Database is unhealthy, not serving requests");
        return Err(ApplicationError::Infrastructure(
            serde_json::to_string(&report)?,
        ));
    }

    summarize_audit_logs(&dispatcher, search).await
}

async fn setup_app() -> Result<(Dispatcher, tessera_db::DbPool, PostgresUnitOfWorkProvider)> {
    let config = Config::from_env();
    let db_pool = establish_connection_pool().await?;

    MIGRATOR.run(&db_pool).await.map_err(DbError::from)?;

    let uow_provider = PostgresUnitOfWorkProvider::new(db_pool.clone());
    let audit_sink = PostgresAuditSink::new(uow_provider.clone());

    let dispatcher = Dispatcher::builder(
        config,
        Arc::new(uow_provider.clone()),
        Arc::new(audit_sink),
    )
    .handler::<ListAuditLogs, _>(ListAuditLogsHandler::new())
    .handler::<GetAuditLog, _>(GetAuditLogHandler::new())
    .require::<ListAuditLogs>()
    .require::<GetAuditLog>()
    .build()?;

    tracing::info!(requests = dispatcher.registry().len(), "Dispatcher ready");

    Ok((dispatcher, db_pool, uow_provider))
}

async fn summarize_audit_logs(dispatcher: &Dispatcher, search: Option<String>) -> Result<()> {
    let request = ListAuditLogs {
        page: PagedAndSortedRequest::new(1, 20, Some("timestamp"), Some("desc")),
        search,
    };

    let outcome = dispatcher
        .dispatch_with(request, DispatchScope::new(StaticUser::system()))
        .await?;

    match outcome.into_result() {
        Ok(page) => {
            tracing::info!(
                total = page.total_count(),
                pages = page.total_pages(),
                "Audit trail"
            );
            for log in page.items() {
                tracing::info!(
                    id = %log.id,
                    action = %log.action,
                    entity_type = %log.entity_type,
                    user = log.user_name.as_deref().unwrap_or("anonymous"),
                    status = %log.status,
                    at = %log.timestamp,
                    "Audit log"
                );
            }

            match page.items().first() {
                Some(latest) => show_audit_log(dispatcher, latest.id).await,
                None => Ok(()),
            }
        }
        Err(error) => {
            tracing::error!(error = %error, "Listing audit logs failed");
            Err(ApplicationError::Unknown(error.to_string()))
        }
    }
}

async fn show_audit_log(dispatcher: &Dispatcher, id: uuid::Uuid) -> Result<()> {
    let outcome = dispatcher
        .dispatch_with(GetAuditLog { id }, DispatchScope::new(StaticUser::system()))
        .await?;

    match outcome.into_result() {
        Ok(log) => tracing::info!(
            id = %log.id,
            entity_id = log.entity_id.as_deref().unwrap_or("-"),
            data = log.data.as_deref().unwrap_or("-"),
            error = log.error_message.as_deref().unwrap_or("-"),
            "Latest audit log"
        ),
        Err(error) => tracing::warn!(error = %error, "Latest audit log is gone"),
    }
    Ok(())
}
