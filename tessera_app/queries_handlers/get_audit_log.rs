use async_trait::async_trait;

use tessera_core::ApplicationError;
use tessera_types::Outcome;

use crate::{
    audit_log::AuditLog,
    context::RequestContext,
    cqrs::{Request, RequestHandler, queries::GetAuditLog},
};

pub struct GetAuditLogHandler {}

impl GetAuditLogHandler {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl RequestHandler<GetAuditLog> for GetAuditLogHandler {
    async fn handle(
        &self,
        query: GetAuditLog,
        ctx: &RequestContext,
    ) -> Result<<GetAuditLog as Request>::Response, ApplicationError> {
        let found = ctx
            .queries::<AuditLog>()?
            .get_by_id(&query.id, &ctx.cancellation)
            .await?;

        Ok(match found {
            Some(log) => Outcome::success(log),
            None => Outcome::not_found(format!("Audit log {} was not found", query.id)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::tests::{InMemoryDatabase, request_context};
    use chrono::Utc;
    use tessera_types::{Error, audit::AuditRecord};
    use uuid::Uuid;

    #[tokio::test]
    async fn returns_the_stored_log() {
        let db = InMemoryDatabase::new();
        let log = AuditLog::from(AuditRecord::new("CreateWidget", "Widget", Utc::now()));
        db.seed([log.clone()]);
        let ctx = request_context(&db);

        let outcome = GetAuditLogHandler::new()
            .handle(GetAuditLog { id: log.id }, &ctx)
            .await
            .unwrap();

        assert_eq!(outcome.into_value().unwrap(), log);
    }

    #[tokio::test]
    async fn missing_log_is_not_found() {
        let db = InMemoryDatabase::new();
        let ctx = request_context(&db);

        let outcome = GetAuditLogHandler::new()
            .handle(GetAuditLog { id: Uuid::new_v4() }, &ctx)
            .await
            .unwrap();

        assert!(outcome.is_failure());
        assert_eq!(outcome.error().code(), Error::NOT_FOUND.code());
    }
}
