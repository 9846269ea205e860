pub mod exposition;
pub mod monitor_metrics;

pub use exposition::render_prometheus;
pub use monitor_metrics::MonitorMetrics;
