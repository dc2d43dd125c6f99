mod get_audit_log;
mod list_audit_logs;

pub use get_audit_log::GetAuditLogHandler;
pub use list_audit_logs::ListAuditLogsHandler;
