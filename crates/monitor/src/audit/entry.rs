use serde::{Deserialize, Serialize};
use vigil_common::{AuditKind, AuditStatus};

/// Append-only record. Never mutated after it is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AuditKind,
    pub action: String,
    pub user_id: String,
    pub timestamp_ms: i64,
    pub details: serde_json::Value,
    pub status: AuditStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

/// An entry as submitted by a caller; the log assigns id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub kind: AuditKind,
    pub action: String,
    pub user_id: String,
    pub details: serde_json::Value,
    pub status: AuditStatus,
    pub error: Option<String>,
    pub origin: Option<String>,
}

impl NewAuditEntry {
    pub fn new(kind: AuditKind, action: impl Into<String>, user_id: impl Into<String>, status: AuditStatus) -> Self {
        Self {
            kind,
            action: action.into(),
            user_id: user_id.into(),
            details: serde_json::Value::Null,
            status,
            error: None,
            origin: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub(crate) fn stamp(self, id: String, timestamp_ms: i64) -> AuditEntry {
        AuditEntry {
            id,
            kind: self.kind,
            action: self.action,
            user_id: self.user_id,
            timestamp_ms,
            details: self.details,
            status: self.status,
            error: self.error,
            origin: self.origin,
        }
    }
}

/// Optional filters for [`super::AuditLog::list`]. Bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditFilter {
    pub kind: Option<AuditKind>,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
    pub user_id: Option<String>,
}

impl AuditFilter {
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        self.kind.map_or(true, |k| entry.kind == k)
            && self.from_ms.map_or(true, |from| entry.timestamp_ms >= from)
            && self.to_ms.map_or(true, |to| entry.timestamp_ms <= to)
            && self.user_id.as_deref().map_or(true, |u| entry.user_id == u)
    }
}
