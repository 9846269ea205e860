mod check;
mod monitor;

pub use check::{
    AlertLevel, HealthAlert, HealthCheck, LatencyThresholds, SystemStatus, API_SERVICE, LEDGER_SERVICE,
    STORE_SERVICE,
};
pub use monitor::{default_endpoints, HealthMonitor, HEALTH_TTL};
