//! Database health checks: migrations, round-trip latency and a repository
//! smoke test. Checks never fail; problems are reported in the result.

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use tessera_app::{audit_log::AuditLog, uow::UnitOfWork};
use tessera_core::{ApplicationError, DbError};

use crate::{DbPool, MIGRATOR, uow::PostgresUnitOfWorkProvider};

pub const SLOW_QUERY_THRESHOLD: Duration = Duration::from_millis(1000);
pub const VERY_SLOW_QUERY_THRESHOLD: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResult {
    pub name: &'static str,
    pub status: HealthStatus,
    pub description: String,
    pub data: serde_json::Value,
    pub error: Option<String>,
}

impl HealthCheckResult {
    fn new(name: &'static str, status: HealthStatus, description: impl Into<String>) -> Self {
        Self {
            name,
            status,
            description: description.into(),
            data: serde_json::Value::Null,
            error: None,
        }
    }

    fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    fn failed(name: &'static str, description: &str, err: ApplicationError) -> Self {
        tracing::error!(check = name, error = %err, "{description}");
        Self {
            error: Some(err.to_string()),
            ..Self::new(name, HealthStatus::Unhealthy, description)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub checks: Vec<HealthCheckResult>,
}

impl HealthReport {
    /// The report is as healthy as its worst check.
    pub fn from_checks(checks: Vec<HealthCheckResult>) -> Self {
        let status = checks
            .iter()
            .map(|c| c.status)
            .max()
            .unwrap_or(HealthStatus::Healthy);
        Self { status, checks }
    }
}

pub async fn run_health_checks(
    pool: &DbPool,
    provider: &PostgresUnitOfWorkProvider,
) -> HealthReport {
    HealthReport::from_checks(vec![
        check_migrations(pool).await,
        check_latency(pool).await,
        check_repository(provider).await,
    ])
}

/// Descriptions of embedded migrations not yet applied, in version order.
pub fn pending_migrations<'a>(
    known: impl IntoIterator<Item = (i64, &'a str)>,
    applied: &[i64],
) -> Vec<String> {
    known
        .into_iter()
        .filter(|(version, _)| !applied.contains(version))
        .map(|(version, description)| format!("{version}_{description}"))
        .collect()
}

async fn applied_migrations(pool: &DbPool) -> Result<Vec<i64>, ApplicationError> {
    let tracked: bool = sqlx::query_scalar("SELECT to_regclass('_sqlx_migrations') IS NOT NULL")
        .fetch_one(pool)
        .await
        .map_err(|e| ApplicationError::Db(DbError::Database(e)))?;

    if !tracked {
        return Ok(Vec::new());
    }

    sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success ORDER BY version")
        .fetch_all(pool)
        .await
        .map_err(|e| ApplicationError::Db(DbError::Database(e)))
}

pub async fn check_migrations(pool: &DbPool) -> HealthCheckResult {
    const NAME: &str = "database_migrations";

    let applied = match applied_migrations(pool).await {
        Ok(applied) => applied,
        Err(err) => {
            return HealthCheckResult::failed(NAME, "Failed to check database migrations", err);
        }
    };

    let known = MIGRATOR
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .map(|m| (m.version, &*m.description));
    let pending = pending_migrations(known, &applied);

    if pending.is_empty() {
        HealthCheckResult::new(
            NAME,
            HealthStatus::Healthy,
            format!("Database is up to date with {} applied migrations", applied.len()),
        )
        .with_data(json!({ "appliedMigrations": applied }))
    } else {
        HealthCheckResult::new(
            NAME,
            HealthStatus::Unhealthy,
            format!(
                "Database has {} pending migrations: {}",
                pending.len(),
                pending.join(", ")
            ),
        )
        .with_data(json!({ "pendingMigrations": pending, "appliedMigrations": applied }))
    }
}

pub fn classify_latency(elapsed: Duration) -> HealthStatus {
    if elapsed > VERY_SLOW_QUERY_THRESHOLD {
        HealthStatus::Unhealthy
    } else if elapsed > SLOW_QUERY_THRESHOLD {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

pub async fn check_latency(pool: &DbPool) -> HealthCheckResult {
    const NAME: &str = "database_performance";

    let started = Instant::now();
    if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
        let err = ApplicationError::Db(DbError::Database(e));
        return HealthCheckResult::failed(NAME, "Failed to check database performance", err);
    }
    let elapsed = started.elapsed();
    let ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    let status = classify_latency(elapsed);
    let description = match status {
        HealthStatus::Healthy => format!("Database response time is good: {ms}ms"),
        HealthStatus::Degraded => format!("Database response time is slow: {ms}ms"),
        HealthStatus::Unhealthy => format!("Database response time is very slow: {ms}ms"),
    };

    HealthCheckResult::new(NAME, status, description)
        .with_data(json!({ "responseTimeMs": ms, "timestamp": Utc::now() }))
}

pub async fn check_repository(provider: &PostgresUnitOfWorkProvider) -> HealthCheckResult {
    const NAME: &str = "repositories";

    let uow = provider.unit_of_work();
    let counted = match uow.repositories().queries::<AuditLog>() {
        Ok(repository) => repository.count_all(&CancellationToken::new()).await,
        Err(err) => Err(err),
    };

    match counted {
        Ok(count) => HealthCheckResult::new(
            NAME,
            HealthStatus::Healthy,
            format!("Repositories are working correctly. Audit logs: {count}"),
        )
        .with_data(json!({ "auditLogCount": count, "timestamp": Utc::now() })),
        Err(err) => HealthCheckResult::failed(NAME, "Repository health check failed", err),
    }
}
