mod loader;
mod schema;

pub use loader::{load_from_file, load_from_str, LoadError};
pub use schema::{
    EmailConfig, HealthConfig, IntervalsConfig, LedgerConfig, MonitorConfig, NotificationsConfig, RetrySettings,
    SlackConfig, TimeoutsConfig,
};
