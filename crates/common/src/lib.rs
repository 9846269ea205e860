pub mod audit;
pub mod clock;
pub mod keys;
pub mod retry;
pub mod rolling;
pub mod snapshot;
pub mod status;

pub use audit::{AuditKind, AuditStatus};
pub use clock::{Clock, ManualClock, SystemClock};
pub use rolling::RollingHistory;
pub use snapshot::{split_metric_path, ApplicationMetrics, ContractMetrics, LedgerMetrics, MetricsSnapshot};
pub use status::{HealthStatus, Severity};
