mod entry;
mod log;

pub use entry::{AuditEntry, AuditFilter, NewAuditEntry};
pub use log::{AuditLog, RETENTION_DAYS, SECURITY_CHANNEL};
