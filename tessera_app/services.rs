use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tessera_core::ApplicationError;
use tessera_types::audit::AuditRecord;

/// The actor behind the current request. Read-only, one per dispatch.
pub trait CurrentUser: Send + Sync {
    fn user_id(&self) -> Option<String>;
    fn user_name(&self) -> Option<String>;
    fn is_authenticated(&self) -> bool;
    fn ip_address(&self) -> Option<String>;
    fn roles(&self) -> Vec<String>;

    fn is_in_role(&self, role: &str) -> bool {
        self.roles().iter().any(|r| r == role)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousUser;

impl CurrentUser for AnonymousUser {
    fn user_id(&self) -> Option<String> {
        None
    }

    fn user_name(&self) -> Option<String> {
        None
    }

    fn is_authenticated(&self) -> bool {
        false
    }

    fn ip_address(&self) -> Option<String> {
        None
    }

    fn roles(&self) -> Vec<String> {
        Vec::new()
    }
}

/// A fixed, authenticated identity: background jobs, the CLI, tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticUser {
    pub id: String,
    pub name: String,
    pub ip_address: Option<String>,
    pub roles: Vec<String>,
}

impl StaticUser {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ip_address: None,
            roles: Vec::new(),
        }
    }

    pub fn system() -> Self {
        Self::new("system", "system").with_role("system")
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn with_ip_address(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }
}

impl CurrentUser for StaticUser {
    fn user_id(&self) -> Option<String> {
        Some(self.id.clone())
    }

    fn user_name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn is_authenticated(&self) -> bool {
        true
    }

    fn ip_address(&self) -> Option<String> {
        self.ip_address.clone()
    }

    fn roles(&self) -> Vec<String> {
        self.roles.clone()
    }
}

/// Where audit records end up. Called from a detached task: errors are
/// logged by the caller and never reach the request.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: AuditRecord) -> Result<(), ApplicationError>;
}

/// Writes audit records to the log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<(), ApplicationError> {
        tracing::info!(
            action = %record.action,
            entity_type = %record.entity_type,
            user = record.user_name.as_deref().unwrap_or("anonymous"),
            status = %record.status,
            "Audit record created"
        );
        Ok(())
    }
}

pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_user_roles() {
        let user = StaticUser::new("7", "ada").with_role("admin");
        assert!(user.is_authenticated());
        assert!(user.is_in_role("admin"));
        assert!(!user.is_in_role("Admin"));
        assert!(StaticUser::system().is_in_role("system"));
    }

    #[test]
    fn anonymous_has_nothing() {
        let user = AnonymousUser;
        assert!(!user.is_authenticated());
        assert!(user.user_id().is_none());
        assert!(!user.is_in_role("admin"));
    }

    #[tokio::test]
    async fn tracing_sink_never_fails() {
        let record = AuditRecord::new("CreateWidget", "CreateWidget", Utc::now());
        assert!(TracingAuditSink.record(record).await.is_ok());
    }
}
