mod http;
mod instrumentation;
mod rpc;
mod traits;

use std::sync::Arc;

pub use http::{http_client, HttpEndpointProbe, REQUEST_TIMEOUT};
pub use instrumentation::StoreInstrumentation;
pub use rpc::{block_interval_ms, RpcLedgerProbe, BLOCK_INTERVAL_WINDOW};
pub use traits::{
    AppInstrumentation, ContractInstrumentation, EndpointProbe, LedgerProbe, PerformanceSample,
    ProbeError,
};

/// Every metric path a fresh probe read can produce.
pub const SAMPLED_METRICS: [&str; 14] = [
    "ledger.throughput",
    "ledger.block_interval",
    "ledger.slot_height",
    "ledger.confirmation_time",
    "ledger.failure_rate",
    "application.request_latency",
    "application.error_rate",
    "application.active_users",
    "application.memory_fraction",
    "application.cpu_fraction",
    "contract.gas_usage",
    "contract.call_count",
    "contract.failure_rate",
    "contract.average_confirmation_time",
];

/// The external collaborators the pipeline samples and probes.
#[derive(Clone)]
pub struct Probes {
    pub ledger: Arc<dyn LedgerProbe>,
    pub app: Arc<dyn AppInstrumentation>,
    pub contract: Arc<dyn ContractInstrumentation>,
    pub endpoints: Arc<dyn EndpointProbe>,
}

impl Probes {
    pub fn supports(path: &str) -> bool {
        SAMPLED_METRICS.contains(&path)
    }

    /// Reads one metric fresh from its source.
    pub async fn read(&self, path: &str) -> Result<f64, ProbeError> {
        match path {
            "ledger.throughput" => Ok(self.ledger.recent_performance_sample().await?.throughput()),
            "ledger.block_interval" => block_interval_ms(self.ledger.as_ref(), BLOCK_INTERVAL_WINDOW).await,
            "ledger.slot_height" => Ok(self.ledger.current_slot().await? as f64),
            "ledger.confirmation_time" => self.ledger.confirmation_time().await,
            "ledger.failure_rate" => self.ledger.failure_rate().await,
            "application.request_latency" => self.app.request_latency().await,
            "application.error_rate" => self.app.error_rate().await,
            "application.active_users" => self.app.active_users().await,
            "application.memory_fraction" => self.app.memory_fraction().await,
            "application.cpu_fraction" => self.app.cpu_fraction().await,
            "contract.gas_usage" => self.contract.gas_usage().await,
            "contract.call_count" => self.contract.call_count().await,
            "contract.failure_rate" => self.contract.failure_rate().await,
            "contract.average_confirmation_time" => self.contract.average_confirmation_time().await,
            other => Err(ProbeError(format!("unsupported metric: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::stub_probes;
    use vigil_common::MetricsSnapshot;

    #[test]
    fn sampled_metrics_resolve_in_snapshots() {
        let s = MetricsSnapshot::empty(0);
        for path in SAMPLED_METRICS {
            assert!(s.resolve(path).is_some(), "{path}");
        }
    }

    #[tokio::test]
    async fn read_dispatches_by_path() {
        let (probes, stubs) = stub_probes();
        stubs.ledger.set_throughput(750);
        stubs.ledger.set_slot(42);
        stubs.instruments.set("gas_usage", 9.0);
        assert_eq!(probes.read("ledger.throughput").await.unwrap(), 750.0);
        assert_eq!(probes.read("ledger.slot_height").await.unwrap(), 42.0);
        assert_eq!(probes.read("contract.gas_usage").await.unwrap(), 9.0);
        assert!(probes.read("ledger.tps").await.is_err());
        assert!(!Probes::supports("ledger.tps"));
    }
}
