use serde::Deserialize;

use crate::collector::{default_critical_thresholds, CriticalThreshold};

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MonitorConfig {
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub intervals: IntervalsConfig,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default = "default_critical_thresholds")]
    pub critical_thresholds: Vec<CriticalThreshold>,
    #[serde(default = "yes")]
    pub load_default_rules: bool,
    #[serde(default = "yes")]
    pub load_default_benchmarks: bool,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LedgerConfig {
    pub rpc_url: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HealthConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,
    #[serde(default = "default_degraded_ms")]
    pub degraded_latency_ms: u64,
    #[serde(default = "default_down_ms")]
    pub down_latency_ms: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            endpoints: default_endpoints(),
            degraded_latency_ms: default_degraded_ms(),
            down_latency_ms: default_down_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct IntervalsConfig {
    #[serde(default = "default_metrics_secs")]
    pub metrics_seconds: u64,
    #[serde(default = "default_health_secs")]
    pub health_seconds: u64,
    #[serde(default = "default_benchmark_secs")]
    pub benchmark_seconds: u64,
}

impl Default for IntervalsConfig {
    fn default() -> Self {
        Self {
            metrics_seconds: default_metrics_secs(),
            health_seconds: default_health_secs(),
            benchmark_seconds: default_benchmark_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TimeoutsConfig {
    #[serde(default = "default_sample_ms")]
    pub sample_ms: u64,
    #[serde(default = "default_probe_ms")]
    pub probe_ms: u64,
    /// Per-channel bound on one notification delivery.
    #[serde(default = "default_notify_ms")]
    pub notify_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            sample_ms: default_sample_ms(),
            probe_ms: default_probe_ms(),
            notify_ms: default_notify_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct NotificationsConfig {
    pub slack: Option<SlackConfig>,
    pub email: Option<EmailConfig>,
    #[serde(default)]
    pub retry: RetrySettings,
}

/// The token may be left out of the file and supplied via `VIGIL_SLACK_TOKEN`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SlackConfig {
    pub token: Option<String>,
    pub default_channel: String,
}

/// The password may be supplied via `VIGIL_SMTP_PASSWORD`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EmailConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub password: Option<String>,
    pub from: String,
    #[serde(default)]
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RetrySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

fn yes() -> bool {
    true
}

fn default_api_port() -> u16 {
    9100
}

fn default_api_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_endpoints() -> Vec<String> {
    crate::health::default_endpoints()
}

fn default_degraded_ms() -> u64 {
    1_000
}

fn default_down_ms() -> u64 {
    5_000
}

fn default_metrics_secs() -> u64 {
    60
}

fn default_health_secs() -> u64 {
    60
}

fn default_benchmark_secs() -> u64 {
    300
}

fn default_sample_ms() -> u64 {
    5_000
}

fn default_probe_ms() -> u64 {
    10_000
}

fn default_notify_ms() -> u64 {
    30_000
}

fn default_smtp_port() -> u16 {
    587
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1_000
}
