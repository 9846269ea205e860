use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::Instant;
use vigil_common::keys::{health_key, health_prefix};
use vigil_common::{AuditKind, AuditStatus};

use super::check::{
    AlertLevel, HealthAlert, HealthCheck, LatencyThresholds, SystemStatus, API_SERVICE, LEDGER_SERVICE,
    STORE_SERVICE,
};
use crate::audit::NewAuditEntry;
use crate::context::Context;
use crate::notifier::Notification;
use crate::probe::Probes;

pub const HEALTH_TTL: Duration = Duration::from_secs(24 * 60 * 60);

pub fn default_endpoints() -> Vec<String> {
    vec!["/health".into(), "/api/projects".into(), "/api/proposals".into()]
}

/// Probes the ledger RPC, the store and the HTTP surface. Classification is
/// memoryless: each tick depends only on that tick's probes.
#[derive(Clone)]
pub struct HealthMonitor {
    probes: Probes,
    ctx: Context,
    thresholds: LatencyThresholds,
    probe_timeout: Duration,
    endpoints: Vec<String>,
}

impl HealthMonitor {
    pub fn new(probes: Probes, ctx: Context) -> Self {
        Self {
            probes,
            ctx,
            thresholds: LatencyThresholds::default(),
            probe_timeout: Duration::from_secs(10),
            endpoints: default_endpoints(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: LatencyThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_endpoints(mut self, endpoints: Vec<String>) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub async fn check_all(&self) -> Vec<HealthCheck> {
        let (ledger, store, api) = tokio::join!(self.check_ledger(), self.check_store(), self.check_api());
        vec![ledger, store, api]
    }

    /// Fresh probe of every service. No persistence, no alerts.
    pub async fn system_status(&self) -> SystemStatus {
        SystemStatus::from_checks(self.check_all().await)
    }

    /// Probes, persists every check for 24h and alerts on each non-healthy one.
    pub async fn tick(&self) -> SystemStatus {
        let checks = self.check_all().await;
        self.ctx.metrics.inc_health_ticks();

        let timestamp_ms = self.ctx.now_ms();
        let writes = checks.iter().map(|check| async move {
            let key = health_key(&check.service, timestamp_ms);
            if !self.ctx.store.set(&key, check, Some(HEALTH_TTL)).await {
                tracing::error!(service = %check.service, "failed to persist health check");
            }
        });
        join_all(writes).await;

        for check in checks.iter().filter(|c| !c.status.is_healthy()) {
            self.ctx.metrics.inc_unhealthy_checks();
            self.raise(check).await;
        }
        SystemStatus::from_checks(checks)
    }

    /// Persisted checks for one service, newest first.
    pub async fn service_health(&self, service: &str) -> Vec<HealthCheck> {
        let mut checks: Vec<HealthCheck> = self
            .ctx
            .store
            .scan::<HealthCheck>(&health_prefix(service))
            .await
            .into_iter()
            .map(|(_, check)| check)
            .collect();
        checks.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        checks
    }

    async fn check_ledger(&self) -> HealthCheck {
        let probe = async {
            self.probes.ledger.current_slot().await.map(|_| None).map_err(|e| e.to_string())
        };
        self.timed(LEDGER_SERVICE, probe).await
    }

    async fn check_store(&self) -> HealthCheck {
        let probe = async { self.ctx.store.ping().await.map(|_| None).map_err(|e| e.to_string()) };
        self.timed(STORE_SERVICE, probe).await
    }

    async fn check_api(&self) -> HealthCheck {
        let mut check = self
            .timed(API_SERVICE, async {
                let pings = self.endpoints.iter().map(|path| self.probes.endpoints.ping(path));
                let results = join_all(pings).await;
                let rate = if results.is_empty() {
                    1.0
                } else {
                    results.iter().filter(|ok| **ok).count() as f64 / results.len() as f64
                };
                Ok::<_, String>(Some(rate))
            })
            .await;

        if let Some(rate) = check.details.as_ref().and_then(|d| d["success_rate"].as_f64()) {
            check.status = self.thresholds.classify_api(rate, check.latency_ms);
        }
        check
    }

    /// Runs one probe under the timeout and classifies by latency. A probe
    /// may return a success rate, recorded in the details.
    async fn timed<F>(&self, service: &str, probe: F) -> HealthCheck
    where
        F: Future<Output = Result<Option<f64>, String>>,
    {
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.probe_timeout, probe).await;
        let latency_ms = started.elapsed().as_millis() as u64;
        let timestamp_ms = self.ctx.now_ms();

        match outcome {
            Ok(Ok(rate)) => HealthCheck {
                service: service.to_string(),
                status: self.thresholds.classify(latency_ms),
                latency_ms,
                timestamp_ms,
                details: rate.map(|r| serde_json::json!({ "success_rate": r })),
            },
            Ok(Err(e)) => {
                tracing::warn!(service, error = %e, "health probe failed");
                HealthCheck::down(service, latency_ms, timestamp_ms, e)
            }
            Err(_) => {
                tracing::warn!(service, latency_ms, "health probe timed out");
                HealthCheck::down(service, latency_ms, timestamp_ms, "timed out")
            }
        }
    }

    async fn raise(&self, check: &HealthCheck) {
        let alert = HealthAlert {
            level: AlertLevel::for_check(check, &self.thresholds),
            service: check.service.clone(),
            message: format!("Service {} is {}", check.service, check.status.as_str()),
            timestamp_ms: self.ctx.now_ms(),
            metadata: serde_json::json!({
                "latency_ms": check.latency_ms,
                "details": check.details,
            }),
        };
        tracing::warn!(service = %alert.service, level = ?alert.level, "system alert");

        let details = serde_json::to_value(&alert).unwrap_or_default();
        self.ctx
            .audit
            .append(NewAuditEntry::new(AuditKind::Security, "SYSTEM_ALERT", "system", AuditStatus::Failure).with_details(details))
            .await;

        let notification = Notification::new(
            format!("System Alert: {}", alert.service),
            alert.message.clone(),
            alert.level.severity(),
        )
        .with_metadata(alert.metadata.clone());
        self.ctx.hub.send(&notification).await;
    }
}
