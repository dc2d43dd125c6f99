use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct AuditLogRow {
    pub id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub details: Option<String>,
    pub data: Option<String>,
    pub status: String,
    pub error_message: Option<String>,
}
