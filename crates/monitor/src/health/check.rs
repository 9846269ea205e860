use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vigil_common::{HealthStatus, Severity};

pub const LEDGER_SERVICE: &str = "ledger";
pub const STORE_SERVICE: &str = "store";
pub const API_SERVICE: &str = "api";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub service: String,
    pub status: HealthStatus,
    pub latency_ms: u64,
    pub timestamp_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl HealthCheck {
    pub fn down(service: &str, latency_ms: u64, timestamp_ms: i64, error: impl Into<String>) -> Self {
        Self {
            service: service.to_string(),
            status: HealthStatus::Down,
            latency_ms,
            timestamp_ms,
            details: Some(serde_json::json!({ "error": error.into() })),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub overall: HealthStatus,
    pub services: BTreeMap<String, HealthCheck>,
}

impl SystemStatus {
    pub fn from_checks(checks: Vec<HealthCheck>) -> Self {
        let overall = HealthStatus::worst(checks.iter().map(|c| c.status));
        let services = checks.into_iter().map(|c| (c.service.clone(), c)).collect();
        Self { overall, services }
    }
}

/// Latency cut-offs: `degraded` at or above `degraded_ms`, `down` at or
/// above `down_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencyThresholds {
    pub degraded_ms: u64,
    pub down_ms: u64,
}

impl Default for LatencyThresholds {
    fn default() -> Self {
        Self {
            degraded_ms: 1_000,
            down_ms: 5_000,
        }
    }
}

impl LatencyThresholds {
    pub fn classify(&self, latency_ms: u64) -> HealthStatus {
        if latency_ms < self.degraded_ms {
            HealthStatus::Healthy
        } else if latency_ms < self.down_ms {
            HealthStatus::Degraded
        } else {
            HealthStatus::Down
        }
    }

    /// The HTTP surface is only judged on latency when every endpoint answered.
    pub fn classify_api(&self, success_rate: f64, latency_ms: u64) -> HealthStatus {
        if success_rate >= 1.0 {
            self.classify(latency_ms)
        } else if success_rate >= 0.5 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Down
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertLevel {
    pub fn for_check(check: &HealthCheck, thresholds: &LatencyThresholds) -> Self {
        match check.status {
            HealthStatus::Down => Self::Critical,
            HealthStatus::Degraded if check.latency_ms > thresholds.degraded_ms * 2 => Self::High,
            HealthStatus::Degraded => Self::Medium,
            HealthStatus::Healthy => Self::Low,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::Critical => Severity::Critical,
            _ => Severity::Error,
        }
    }
}

/// Raised for every non-healthy check; stored as the audit detail payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAlert {
    pub level: AlertLevel,
    pub service: String,
    pub message: String,
    pub timestamp_ms: i64,
    pub metadata: serde_json::Value,
}
