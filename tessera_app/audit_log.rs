use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tessera_types::audit::{AuditRecord, AuditStatus};

use crate::{
    repository::Entity,
    specification::{FieldDescriptor, FieldValue, Fields, Predicate, Searchable},
};

/// A persisted audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub details: Option<String>,
    pub data: Option<String>,
    pub status: AuditStatus,
    pub error_message: Option<String>,
}

impl From<AuditRecord> for AuditLog {
    fn from(record: AuditRecord) -> Self {
        Self {
            id: Uuid::new_v4(),
            action: record.action,
            entity_type: record.entity_type,
            entity_id: record.entity_id,
            user_id: record.user_id,
            user_name: record.user_name,
            timestamp: record.timestamp,
            ip_address: record.ip_address,
            details: record.details,
            data: record.data,
            status: record.status,
            error_message: record.error_message,
        }
    }
}

static AUDIT_LOG_FIELDS: [FieldDescriptor; 12] = [
    FieldDescriptor::scalar("id"),
    FieldDescriptor::scalar("action"),
    FieldDescriptor::scalar("entity_type"),
    FieldDescriptor::scalar("entity_id"),
    FieldDescriptor::scalar("user_id"),
    FieldDescriptor::scalar("user_name"),
    FieldDescriptor::column("timestamp", "recorded_at"),
    FieldDescriptor::scalar("ip_address"),
    FieldDescriptor::scalar("details"),
    FieldDescriptor::scalar("data"),
    FieldDescriptor::scalar("status"),
    FieldDescriptor::scalar("error_message"),
];

impl Fields for AuditLog {
    fn fields() -> &'static [FieldDescriptor] {
        &AUDIT_LOG_FIELDS
    }

    fn field_value(&self, path: &[&str]) -> Option<FieldValue> {
        let value: FieldValue = match path {
            ["id"] => self.id.into(),
            ["action"] => self.action.as_str().into(),
            ["entity_type"] => self.entity_type.as_str().into(),
            ["entity_id"] => self.entity_id.as_deref().into(),
            ["user_id"] => self.user_id.as_deref().into(),
            ["user_name"] => self.user_name.as_deref().into(),
            ["timestamp"] => self.timestamp.into(),
            ["ip_address"] => self.ip_address.as_deref().into(),
            ["details"] => self.details.as_deref().into(),
            ["data"] => self.data.as_deref().into(),
            ["status"] => self.status.as_str().into(),
            ["error_message"] => self.error_message.as_deref().into(),
            _ => return None,
        };
        Some(value)
    }
}

impl Entity for AuditLog {
    type Id = Uuid;

    const NAME: &'static str = "AuditLog";

    fn id(&self) -> &Uuid {
        &self.id
    }
}

impl Searchable for AuditLog {
    fn search_predicate(term: &str) -> Predicate {
        Predicate::any([
            Predicate::contains("action", term),
            Predicate::contains("entity_type", term),
            Predicate::contains("user_name", term),
        ])
    }
}

/// Listing shape of an [`AuditLog`]; leaves out the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogSummary {
    pub id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub user_name: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub status: AuditStatus,
}

impl From<AuditLog> for AuditLogSummary {
    fn from(log: AuditLog) -> Self {
        Self {
            id: log.id,
            action: log.action,
            entity_type: log.entity_type,
            user_name: log.user_name,
            timestamp: log.timestamp,
            status: log.status,
        }
    }
}

/// Public sort keys of the audit-log listing.
pub const AUDIT_LOG_SORT_KEYS: &[(&str, &str)] = &[
    ("action", "action"),
    ("entityType", "entity_type"),
    ("userName", "user_name"),
    ("timestamp", "timestamp"),
    ("status", "status"),
];
