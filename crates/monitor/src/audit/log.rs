use std::sync::Arc;
use std::time::Duration;

use vigil_common::clock::DAY_MS;
use futures::future::join_all;
use vigil_common::keys::{audit_key, audit_prefix, trailing_timestamp, AUDIT_PREFIX};
use vigil_common::{AuditKind, AuditStatus, Clock, Severity};

use super::entry::{AuditEntry, AuditFilter, NewAuditEntry};
use crate::notifier::{Notification, NotificationHub};
use crate::store::TtlStore;

pub const RETENTION_DAYS: u64 = 90;
pub const SECURITY_CHANNEL: &str = "security-alerts";

#[derive(Clone)]
pub struct AuditLog {
    store: TtlStore,
    hub: NotificationHub,
    clock: Arc<dyn Clock>,
}

impl AuditLog {
    pub fn new(store: TtlStore, hub: NotificationHub, clock: Arc<dyn Clock>) -> Self {
        Self { store, hub, clock }
    }

    fn key(entry: &AuditEntry) -> String {
        audit_key(entry.kind.as_str(), &entry.id, entry.timestamp_ms)
    }

    /// Stamps and persists an entry. Security and emergency entries, and any
    /// failure, also go out as a notification.
    pub async fn append(&self, new: NewAuditEntry) -> AuditEntry {
        let entry = new.stamp(uuid::Uuid::new_v4().to_string(), self.clock.now_ms());
        let ttl = Duration::from_secs(RETENTION_DAYS * 24 * 60 * 60);
        self.store.set(&Self::key(&entry), &entry, Some(ttl)).await;

        tracing::info!(
            kind = entry.kind.as_str(),
            action = %entry.action,
            user_id = %entry.user_id,
            status = ?entry.status,
            "audit entry recorded"
        );

        if needs_alert(&entry) {
            self.hub.send(&alert_for(&entry)).await;
        }
        entry
    }

    /// Matching entries, newest first. Keys outside the time window are
    /// skipped before their entries are loaded.
    pub async fn list(&self, filter: &AuditFilter) -> Vec<AuditEntry> {
        let prefix = match filter.kind {
            Some(kind) => audit_prefix(kind.as_str()),
            None => AUDIT_PREFIX.to_string(),
        };
        let from = filter.from_ms.unwrap_or(i64::MIN);
        let to = filter.to_ms.unwrap_or(i64::MAX);
        let keys: Vec<String> = self
            .store
            .keys(&prefix)
            .await
            .into_iter()
            .filter(|k| trailing_timestamp(k).is_some_and(|ts| ts >= from && ts <= to))
            .collect();
        let loaded = join_all(keys.iter().map(|k| self.store.get::<AuditEntry>(k))).await;
        let mut entries: Vec<AuditEntry> = loaded.into_iter().flatten().filter(|e| filter.matches(e)).collect();
        entries.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        entries
    }

    pub async fn security_events(&self, window_hours: i64) -> Vec<AuditEntry> {
        self.list(&AuditFilter {
            kind: Some(AuditKind::Security),
            from_ms: Some(self.clock.now_ms() - window_hours * 60 * 60 * 1000),
            ..AuditFilter::default()
        })
        .await
    }

    pub async fn user_activity(&self, user_id: &str, window_days: i64) -> Vec<AuditEntry> {
        self.list(&AuditFilter {
            from_ms: Some(self.clock.now_ms() - window_days * DAY_MS),
            user_id: Some(user_id.to_string()),
            ..AuditFilter::default()
        })
        .await
    }
}

fn needs_alert(entry: &AuditEntry) -> bool {
    matches!(entry.kind, AuditKind::Security | AuditKind::EmergencyAction)
        || entry.status == AuditStatus::Failure
}

fn alert_for(entry: &AuditEntry) -> Notification {
    let severity = match (entry.kind, entry.status) {
        (AuditKind::EmergencyAction, _) | (AuditKind::Security, AuditStatus::Failure) => Severity::Critical,
        _ => Severity::Error,
    };
    let message = format!(
        "{} - {}",
        entry.action,
        entry.error.as_deref().unwrap_or("No error")
    );
    Notification::new(format!("Security Alert: {}", entry.action), message, severity)
        .with_channel(SECURITY_CHANNEL)
        .with_metadata(serde_json::json!({
            "type": entry.kind,
            "action": entry.action,
            "user_id": entry.user_id,
            "status": entry.status,
            "error": entry.error,
        }))
}
