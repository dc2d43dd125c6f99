use tessera_app::{audit_log::AuditLog, specification::FieldValue};
use tessera_core::DbError;
use tessera_types::audit::AuditStatus;

use crate::{models::AuditLogRow, repository::PgEntity};

impl TryFrom<AuditLogRow> for AuditLog {
    type Error = DbError;

    fn try_from(row: AuditLogRow) -> Result<Self, Self::Error> {
        let status: AuditStatus = row
            .status
            .parse()
            .map_err(|e: String| DbError::Database(sqlx::Error::Decode(e.into())))?;

        Ok(AuditLog {
            id: row.id,
            action: row.action,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            user_id: row.user_id,
            user_name: row.user_name,
            timestamp: row.recorded_at,
            ip_address: row.ip_address,
            details: row.details,
            data: row.data,
            status,
            error_message: row.error_message,
        })
    }
}

impl PgEntity for AuditLog {
    type Row = AuditLogRow;

    const TABLE: &'static str = "audit_logs";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "action",
        "entity_type",
        "entity_id",
        "user_id",
        "user_name",
        "recorded_at",
        "ip_address",
        "details",
        "data",
        "status",
        "error_message",
    ];

    fn from_row(row: AuditLogRow) -> Result<Self, DbError> {
        row.try_into()
    }

    fn to_columns(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("id", self.id.into()),
            ("action", self.action.as_str().into()),
            ("entity_type", self.entity_type.as_str().into()),
            ("entity_id", self.entity_id.as_deref().into()),
            ("user_id", self.user_id.as_deref().into()),
            ("user_name", self.user_name.as_deref().into()),
            ("recorded_at", self.timestamp.into()),
            ("ip_address", self.ip_address.as_deref().into()),
            ("details", self.details.as_deref().into()),
            ("data", self.data.as_deref().into()),
            ("status", self.status.as_str().into()),
            ("error_message", self.error_message.as_deref().into()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn row(status: &str) -> AuditLogRow {
        AuditLogRow {
            id: Uuid::new_v4(),
            action: "CreateWidget".into(),
            entity_type: "Widget".into(),
            entity_id: Some("42".into()),
            user_id: None,
            user_name: Some("ada".into()),
            recorded_at: Utc::now(),
            ip_address: None,
            details: None,
            data: Some("{}".into()),
            status: status.into(),
            error_message: None,
        }
    }

    #[test]
    fn row_maps_to_entity() {
        let source = row("Failure");
        let log = AuditLog::try_from(source.clone()).unwrap();
        assert_eq!(log.id, source.id);
        assert_eq!(log.timestamp, source.recorded_at);
        assert_eq!(log.status, AuditStatus::Failure);
        assert_eq!(log.entity_id.as_deref(), Some("42"));
    }

    #[test]
    fn unknown_status_is_a_decode_error() {
        let err = AuditLog::try_from(row("Maybe")).unwrap_err();
        assert!(matches!(err, DbError::Database(sqlx::Error::Decode(_))));
    }

    #[test]
    fn written_columns_follow_the_select_list() {
        let log = AuditLog::try_from(row("Success")).unwrap();
        let names: Vec<&str> = log.to_columns().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, AuditLog::COLUMNS);
    }
}
