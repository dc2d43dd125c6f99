use serde::Serialize;
use uuid::Uuid;

use tessera_types::{Outcome, grid::{PagedAndSortedRequest, PagedResponse}};

use crate::{
    audit_log::{AuditLog, AuditLogSummary},
    cqrs::{Request, RequestKind},
};

/// Pages through the audit trail, optionally filtered by a search term
/// over action, entity type and user name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListAuditLogs {
    pub page: PagedAndSortedRequest,
    pub search: Option<String>,
}

impl Request for ListAuditLogs {
    type Response = Outcome<PagedResponse<AuditLogSummary>>;
    const KIND: RequestKind = RequestKind::Query;
}

/// Fetch a single audit record by id.
#[derive(Debug, Clone, Serialize)]
pub struct GetAuditLog {
    pub id: Uuid,
}

impl Request for GetAuditLog {
    type Response = Outcome<AuditLog>;
    const KIND: RequestKind = RequestKind::Query;

    fn entity_type() -> &'static str {
        "AuditLog"
    }

    fn entity_id(&self) -> Option<String> {
        Some(self.id.to_string())
    }
}
