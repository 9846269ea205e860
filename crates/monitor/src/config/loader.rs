use std::path::Path;

use vigil_common::MetricsSnapshot;

use super::schema::MonitorConfig;

#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Parse(serde_yaml::Error),
    Validation(String),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Parse(e) => write!(f, "parse: {e}"),
            Self::Validation(msg) => write!(f, "validation: {msg}"),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_yaml::Error> for LoadError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Parse(e)
    }
}

pub fn load_from_file(path: &Path) -> Result<MonitorConfig, LoadError> {
    let contents = std::fs::read_to_string(path)?;
    load_from_str(&contents)
}

pub fn load_from_str(yaml: &str) -> Result<MonitorConfig, LoadError> {
    let cfg: MonitorConfig = serde_yaml::from_str(yaml)?;
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &MonitorConfig) -> Result<(), LoadError> {
    if cfg.ledger.rpc_url.trim().is_empty() {
        return Err(LoadError::Validation("ledger.rpc_url must not be empty".into()));
    }
    let intervals = &cfg.intervals;
    if intervals.metrics_seconds == 0 || intervals.health_seconds == 0 || intervals.benchmark_seconds == 0 {
        return Err(LoadError::Validation("intervals must be > 0".into()));
    }
    if cfg.timeouts.sample_ms == 0 || cfg.timeouts.probe_ms == 0 || cfg.timeouts.notify_ms == 0 {
        return Err(LoadError::Validation("timeouts must be > 0".into()));
    }
    if cfg.health.degraded_latency_ms >= cfg.health.down_latency_ms {
        return Err(LoadError::Validation(
            "health.degraded_latency_ms must be below health.down_latency_ms".into(),
        ));
    }

    let probe = MetricsSnapshot::empty(0);
    for t in &cfg.critical_thresholds {
        if probe.resolve(&t.path).is_none() {
            return Err(LoadError::Validation(format!("critical threshold has unknown metric path: {}", t.path)));
        }
    }
    if let Some(slack) = &cfg.notifications.slack {
        if slack.default_channel.trim().is_empty() {
            return Err(LoadError::Validation("notifications.slack.default_channel must not be empty".into()));
        }
    }
    if let Some(email) = &cfg.notifications.email {
        if email.host.trim().is_empty() || email.from.trim().is_empty() {
            return Err(LoadError::Validation("notifications.email needs host and from".into()));
        }
    }
    Ok(())
}
