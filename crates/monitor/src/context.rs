use std::sync::Arc;

use vigil_common::Clock;

use crate::audit::AuditLog;
use crate::metrics::MonitorMetrics;
use crate::notifier::NotificationHub;
use crate::store::TtlStore;

/// Sinks and services shared by every pipeline component.
#[derive(Clone)]
pub struct Context {
    pub store: TtlStore,
    pub hub: NotificationHub,
    pub audit: AuditLog,
    pub clock: Arc<dyn Clock>,
    pub metrics: Arc<MonitorMetrics>,
}

impl Context {
    pub fn new(store: TtlStore, hub: NotificationHub, clock: Arc<dyn Clock>, metrics: Arc<MonitorMetrics>) -> Self {
        let audit = AuditLog::new(store.clone(), hub.clone(), clock.clone());
        Self {
            store,
            hub,
            audit,
            clock,
            metrics,
        }
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }
}
