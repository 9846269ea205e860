mod aggregate;
mod critical;
mod sampler;

pub use aggregate::{aggregate, AggregatedMetrics, AggregationPeriod};
pub use critical::{default_critical_thresholds, CriticalThreshold};
pub use sampler::{MetricsCollector, SNAPSHOT_TTL};
