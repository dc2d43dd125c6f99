use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use tessera_app::{audit_log::AuditLog, services::AuditSink, uow::UnitOfWork};
use tessera_core::ApplicationError;
use tessera_types::audit::AuditRecord;

use crate::uow::PostgresUnitOfWorkProvider;

/// Stores audit records in `audit_logs`, each through a unit of work of
/// its own so it never shares the audited request's transaction.
///
/// Failures are logged and swallowed: the audit trail is best-effort.
#[derive(Clone)]
pub struct PostgresAuditSink {
    provider: PostgresUnitOfWorkProvider,
}

impl PostgresAuditSink {
    pub fn new(provider: PostgresUnitOfWorkProvider) -> Self {
        Self { provider }
    }

    /// Writes `record` in its own unit of work. Unlike [`AuditSink::record`]
    /// the error comes back to the caller.
    pub async fn store(&self, record: AuditRecord) -> Result<u64, ApplicationError> {
        let uow = self.provider.unit_of_work();
        let cancel = CancellationToken::new();

        let repository = uow.repositories().commands::<AuditLog>()?;
        repository.add(AuditLog::from(record), &cancel).await?;
        uow.save_changes(&cancel).await
    }
}

#[async_trait]
impl AuditSink for PostgresAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<(), ApplicationError> {
        let action = record.action.clone();
        match self.store(record).await {
            Ok(_) => tracing::debug!(action = %action, "Audit record stored"),
            Err(err) => {
                tracing::error!(action = %action, error = %err, "Failed to store audit record")
            }
        }
        Ok(())
    }
}
