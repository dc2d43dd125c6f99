use async_trait::async_trait;

use tessera_core::ApplicationError;
use tessera_types::{Outcome, grid::PagedResponse};

use crate::{
    audit_log::{AUDIT_LOG_SORT_KEYS, AuditLog, AuditLogSummary},
    context::RequestContext,
    cqrs::{Request, RequestHandler, queries::ListAuditLogs},
    repository::QueryRepositoryExt,
    specification::Specification,
};

pub struct ListAuditLogsHandler {}

impl ListAuditLogsHandler {
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl RequestHandler<ListAuditLogs> for ListAuditLogsHandler {
    async fn handle(
        &self,
        query: ListAuditLogs,
        ctx: &RequestContext,
    ) -> Result<<ListAuditLogs as Request>::Response, ApplicationError> {
        let page = query.page.page();
        let spec = Specification::<AuditLog>::new()
            .searched_by(query.search.as_deref())
            .sorted_by_map(
                query.page.sort_by(),
                query.page.sort_direction(),
                AUDIT_LOG_SORT_KEYS,
            );
        // newest first unless a recognized sort key was given
        let spec = if spec.order().is_empty() {
            spec.order_by_descending("timestamp")
        } else {
            spec
        };
        let summarize = |log: AuditLog| AuditLogSummary::from(log);

        let (items, total) = ctx
            .queries::<AuditLog>()?
            .page_as(&spec, page, &summarize, &ctx.cancellation)
            .await?;

        Ok(Outcome::success(PagedResponse::new(items, page, total)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::tests::{InMemoryDatabase, request_context};
    use chrono::{Duration, TimeZone, Utc};
    use tessera_types::{audit::AuditRecord, grid::PagedAndSortedRequest};

    fn seeded() -> InMemoryDatabase {
        let db = InMemoryDatabase::new();
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        db.seed((0..12).map(|i| {
            let mut record = AuditRecord::new(
                if i % 2 == 0 { "CreateWidget" } else { "DeleteWidget" },
                "Widget",
                start + Duration::minutes(i),
            );
            record.user_name = Some(format!("user{i}"));
            AuditLog::from(record)
        }));
        db
    }

    #[tokio::test]
    async fn lists_newest_first_by_default() {
        let db = seeded();
        let ctx = request_context(&db);

        let outcome = ListAuditLogsHandler::new()
            .handle(
                ListAuditLogs {
                    page: PagedAndSortedRequest::new(1, 5, None, None),
                    search: None,
                },
                &ctx,
            )
            .await
            .unwrap();

        let page = outcome.into_value().unwrap();
        assert_eq!(page.total_count(), 12);
        assert_eq!(page.total_pages(), 3);
        assert_eq!(page.items().len(), 5);
        assert_eq!(page.items()[0].user_name.as_deref(), Some("user11"));
    }

    #[tokio::test]
    async fn unknown_sort_keys_fall_back_to_newest_first() {
        let db = seeded();
        let ctx = request_context(&db);

        let outcome = ListAuditLogsHandler::new()
            .handle(
                ListAuditLogs {
                    page: PagedAndSortedRequest::new(1, 3, Some("ipAddress"), Some("asc")),
                    search: None,
                },
                &ctx,
            )
            .await
            .unwrap();

        let users: Vec<_> = outcome
            .into_value()
            .unwrap()
            .items()
            .iter()
            .filter_map(|s| s.user_name.clone())
            .collect();
        assert_eq!(users, ["user11", "user10", "user9"]);
    }

    #[tokio::test]
    async fn search_and_public_sort_keys_apply() {
        let db = seeded();
        let ctx = request_context(&db);

        let outcome = ListAuditLogsHandler::new()
            .handle(
                ListAuditLogs {
                    page: PagedAndSortedRequest::new(1, 10, Some("userName"), Some("asc")),
                    search: Some("delete".into()),
                },
                &ctx,
            )
            .await
            .unwrap();

        let page = outcome.into_value().unwrap();
        assert_eq!(page.total_count(), 6);
        let users: Vec<_> = page
            .items()
            .iter()
            .filter_map(|s| s.user_name.as_deref())
            .collect();
        assert_eq!(users, ["user1", "user11", "user3", "user5", "user7", "user9"]);
    }
}
