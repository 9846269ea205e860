use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeError(pub String);

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "probe: {}", self.0)
    }
}

impl std::error::Error for ProbeError {}

/// One ledger performance sample: transactions and slots over a period.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PerformanceSample {
    pub num_transactions: u64,
    pub num_slots: u64,
    pub sample_period_secs: u64,
}

impl PerformanceSample {
    /// Transactions per second over the sample period.
    pub fn throughput(&self) -> f64 {
        if self.sample_period_secs == 0 {
            return self.num_transactions as f64;
        }
        self.num_transactions as f64 / self.sample_period_secs as f64
    }
}

#[async_trait]
pub trait LedgerProbe: Send + Sync {
    async fn current_slot(&self) -> Result<u64, ProbeError>;
    async fn recent_performance_sample(&self) -> Result<PerformanceSample, ProbeError>;
    /// Unix seconds at which `slot` was produced, if the node still has it.
    async fn block_time_for(&self, slot: u64) -> Result<Option<i64>, ProbeError>;
    async fn confirmation_time(&self) -> Result<f64, ProbeError>;
    async fn failure_rate(&self) -> Result<f64, ProbeError>;
}

#[async_trait]
pub trait AppInstrumentation: Send + Sync {
    async fn request_latency(&self) -> Result<f64, ProbeError>;
    async fn error_rate(&self) -> Result<f64, ProbeError>;
    async fn active_users(&self) -> Result<f64, ProbeError>;
    async fn memory_fraction(&self) -> Result<f64, ProbeError>;
    async fn cpu_fraction(&self) -> Result<f64, ProbeError>;
}

#[async_trait]
pub trait ContractInstrumentation: Send + Sync {
    async fn gas_usage(&self) -> Result<f64, ProbeError>;
    async fn call_count(&self) -> Result<f64, ProbeError>;
    async fn failure_rate(&self) -> Result<f64, ProbeError>;
    async fn average_confirmation_time(&self) -> Result<f64, ProbeError>;
}

/// HTTP reachability of one path on the service surface.
#[async_trait]
pub trait EndpointProbe: Send + Sync {
    async fn ping(&self, path: &str) -> bool;
}
