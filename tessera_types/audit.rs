use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditStatus {
    #[default]
    Success,
    Failure,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Failure => "Failure",
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Success" => Ok(Self::Success),
            "Failure" => Ok(Self::Failure),
            other => Err(format!("unknown audit status '{other}'")),
        }
    }
}

/// One audited command execution, handed to the audit sink and then dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub details: Option<String>,
    /// Depth-limited JSON of the request.
    pub data: Option<String>,
    pub status: AuditStatus,
    pub error_message: Option<String>,
}

impl AuditRecord {
    pub fn new(action: impl Into<String>, entity_type: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id: None,
            user_id: None,
            user_name: None,
            timestamp: at,
            ip_address: None,
            details: None,
            data: None,
            status: AuditStatus::Success,
            error_message: None,
        }
    }

    pub fn failed(mut self, message: impl Into<String>) -> Self {
        self.status = AuditStatus::Failure;
        self.error_message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        assert_eq!("Failure".parse::<AuditStatus>(), Ok(AuditStatus::Failure));
        assert_eq!(AuditStatus::Success.to_string(), "Success");
        assert!("failure".parse::<AuditStatus>().is_err());
    }

    #[test]
    fn failed_sets_status_and_message() {
        let record = AuditRecord::new("CreateWidget", "CreateWidget", Utc::now()).failed("boom");
        assert_eq!(record.status, AuditStatus::Failure);
        assert_eq!(record.error_message.as_deref(), Some("boom"));
    }
}
