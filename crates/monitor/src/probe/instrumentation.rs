use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sysinfo::System;
use vigil_common::keys::instrument_key;

use super::traits::{AppInstrumentation, ContractInstrumentation, ProbeError};
use crate::store::TtlStore;

/// Newest samples kept per recorded series.
pub const SERIES_CAP: usize = 1_000;

const REQUEST_LATENCY: &str = "request_latency";
const ERROR_RATE: &str = "error_rate";
const ACTIVE_USERS: &str = "active_users";
const GAS_USAGE: &str = "gas_usage";
const CONTRACT_CALLS: &str = "contract_calls";
const CONTRACT_FAILURES: &str = "contract_failures";
const CONFIRMATION_TIMES: &str = "confirmation_times";
const LEDGER_CONFIRMATION_TIMES: &str = "ledger_confirmation_times";
const LEDGER_FAILURE_RATE: &str = "ledger_failure_rate";

/// Counters and gauges recorded by the application tier under `instrument:*`
/// keys, plus host memory and CPU fractions.
#[derive(Clone)]
pub struct StoreInstrumentation {
    store: TtlStore,
    system: Arc<Mutex<System>>,
}

impl StoreInstrumentation {
    pub fn new(store: TtlStore) -> Self {
        Self {
            store,
            system: Arc::new(Mutex::new(System::new())),
        }
    }

    async fn gauge(&self, name: &str) -> f64 {
        self.store.get::<f64>(&instrument_key(name)).await.unwrap_or(0.0)
    }

    async fn series_mean(&self, name: &str) -> f64 {
        let samples: Vec<f64> = self
            .store
            .get(&instrument_key(name))
            .await
            .unwrap_or_default();
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    async fn set_gauge(&self, name: &str, value: f64) {
        self.store.set(&instrument_key(name), &value, None).await;
    }

    async fn push_sample(&self, name: &str, value: f64) {
        let key = instrument_key(name);
        let mut samples: Vec<f64> = self.store.get(&key).await.unwrap_or_default();
        samples.push(value);
        if samples.len() > SERIES_CAP {
            let excess = samples.len() - SERIES_CAP;
            samples.drain(..excess);
        }
        self.store.set(&key, &samples, None).await;
    }

    pub async fn record_request_latency(&self, ms: f64) {
        self.push_sample(REQUEST_LATENCY, ms).await;
    }

    pub async fn set_error_rate(&self, rate: f64) {
        self.set_gauge(ERROR_RATE, rate).await;
    }

    pub async fn set_active_users(&self, users: f64) {
        self.set_gauge(ACTIVE_USERS, users).await;
    }

    pub async fn record_gas_usage(&self, gas: f64) {
        self.push_sample(GAS_USAGE, gas).await;
    }

    pub async fn set_contract_calls(&self, calls: f64) {
        self.set_gauge(CONTRACT_CALLS, calls).await;
    }

    pub async fn set_contract_failure_rate(&self, rate: f64) {
        self.set_gauge(CONTRACT_FAILURES, rate).await;
    }

    pub async fn record_confirmation_time(&self, ms: f64) {
        self.push_sample(CONFIRMATION_TIMES, ms).await;
    }

    pub async fn record_ledger_confirmation_time(&self, ms: f64) {
        self.push_sample(LEDGER_CONFIRMATION_TIMES, ms).await;
    }

    pub async fn set_ledger_failure_rate(&self, rate: f64) {
        self.set_gauge(LEDGER_FAILURE_RATE, rate).await;
    }

    /// Applies one value pushed by the application tier. Series names append
    /// a sample, gauge names overwrite. Returns false for an unknown name.
    pub async fn ingest(&self, name: &str, value: f64) -> bool {
        match name {
            REQUEST_LATENCY | GAS_USAGE | CONFIRMATION_TIMES | LEDGER_CONFIRMATION_TIMES => {
                self.push_sample(name, value).await
            }
            ERROR_RATE | ACTIVE_USERS | CONTRACT_CALLS | CONTRACT_FAILURES | LEDGER_FAILURE_RATE => {
                self.set_gauge(name, value).await
            }
            _ => return false,
        }
        true
    }

    pub async fn ledger_confirmation_time(&self) -> f64 {
        self.series_mean(LEDGER_CONFIRMATION_TIMES).await
    }

    pub async fn ledger_failure_rate(&self) -> f64 {
        self.gauge(LEDGER_FAILURE_RATE).await
    }

    fn with_system<T>(&self, f: impl FnOnce(&mut System) -> T) -> Result<T, ProbeError> {
        let mut sys = self
            .system
            .lock()
            .map_err(|_| ProbeError("system info lock poisoned".into()))?;
        Ok(f(&mut sys))
    }
}

#[async_trait]
impl AppInstrumentation for StoreInstrumentation {
    async fn request_latency(&self) -> Result<f64, ProbeError> {
        Ok(self.series_mean(REQUEST_LATENCY).await)
    }

    async fn error_rate(&self) -> Result<f64, ProbeError> {
        Ok(self.gauge(ERROR_RATE).await)
    }

    async fn active_users(&self) -> Result<f64, ProbeError> {
        Ok(self.gauge(ACTIVE_USERS).await)
    }

    async fn memory_fraction(&self) -> Result<f64, ProbeError> {
        self.with_system(|sys| {
            sys.refresh_memory();
            let total = sys.total_memory();
            if total == 0 {
                return Err(ProbeError("total memory unavailable".into()));
            }
            Ok(sys.used_memory() as f64 / total as f64)
        })?
    }

    /// One-minute load average divided by the number of logical CPUs.
    async fn cpu_fraction(&self) -> Result<f64, ProbeError> {
        self.with_system(|sys| {
            sys.refresh_cpu();
            let cpus = sys.cpus().len();
            if cpus == 0 {
                return Err(ProbeError("cpu count unavailable".into()));
            }
            Ok(System::load_average().one / cpus as f64)
        })?
    }
}

#[async_trait]
impl ContractInstrumentation for StoreInstrumentation {
    async fn gas_usage(&self) -> Result<f64, ProbeError> {
        Ok(self.series_mean(GAS_USAGE).await)
    }

    async fn call_count(&self) -> Result<f64, ProbeError> {
        Ok(self.gauge(CONTRACT_CALLS).await)
    }

    async fn failure_rate(&self) -> Result<f64, ProbeError> {
        Ok(self.gauge(CONTRACT_FAILURES).await)
    }

    async fn average_confirmation_time(&self) -> Result<f64, ProbeError> {
        Ok(self.series_mean(CONFIRMATION_TIMES).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::memory_store;
    use vigil_common::ManualClock;

    fn instrumentation() -> StoreInstrumentation {
        StoreInstrumentation::new(memory_store(Arc::new(ManualClock::new(0))))
    }

    #[tokio::test]
    async fn series_are_averaged() {
        let i = instrumentation();
        i.record_request_latency(100.0).await;
        i.record_request_latency(300.0).await;
        i.record_gas_usage(50.0).await;
        assert_eq!(i.request_latency().await.unwrap(), 200.0);
        assert_eq!(i.gas_usage().await.unwrap(), 50.0);
        assert_eq!(i.average_confirmation_time().await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn gauges_read_back() {
        let i = instrumentation();
        i.set_error_rate(0.02).await;
        i.set_active_users(42.0).await;
        i.set_contract_calls(9.0).await;
        i.set_contract_failure_rate(0.5).await;
        i.set_ledger_failure_rate(0.1).await;
        assert_eq!(i.error_rate().await.unwrap(), 0.02);
        assert_eq!(i.active_users().await.unwrap(), 42.0);
        assert_eq!(i.call_count().await.unwrap(), 9.0);
        assert_eq!(ContractInstrumentation::failure_rate(&i).await.unwrap(), 0.5);
        assert_eq!(i.ledger_failure_rate().await, 0.1);
    }

    #[tokio::test]
    async fn unset_values_read_as_zero() {
        let i = instrumentation();
        assert_eq!(i.error_rate().await.unwrap(), 0.0);
        assert_eq!(i.request_latency().await.unwrap(), 0.0);
        assert_eq!(i.ledger_confirmation_time().await, 0.0);
    }

    #[tokio::test]
    async fn series_capped() {
        let i = instrumentation();
        for n in 0..(SERIES_CAP + 10) {
            i.record_confirmation_time(n as f64).await;
        }
        let samples: Vec<f64> = i.store.get(&instrument_key(CONFIRMATION_TIMES)).await.unwrap();
        assert_eq!(samples.len(), SERIES_CAP);
        assert_eq!(samples[0], 10.0);
    }

    #[tokio::test]
    async fn ingest_routes_series_and_gauges() {
        let i = instrumentation();
        assert!(i.ingest("request_latency", 120.0).await);
        assert!(i.ingest("request_latency", 80.0).await);
        assert!(i.ingest("active_users", 250.0).await);
        assert!(i.ingest("ledger_failure_rate", 0.04).await);
        assert!(!i.ingest("tps", 1.0).await);
        assert_eq!(i.request_latency().await.unwrap(), 100.0);
        assert_eq!(i.active_users().await.unwrap(), 250.0);
        assert_eq!(i.ledger_failure_rate().await, 0.04);
    }

    #[tokio::test]
    async fn memory_fraction_is_a_fraction() {
        let i = instrumentation();
        let m = i.memory_fraction().await.unwrap();
        assert!((0.0..=1.0).contains(&m));
    }
}
