//! Test doubles for the probe, store, and notifier seams.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use vigil_common::Clock;

use crate::context::Context;
use crate::metrics::MonitorMetrics;
use crate::notifier::{Notification, NotificationHub, Notifier, NotifyError};
use crate::probe::{
    AppInstrumentation, ContractInstrumentation, EndpointProbe, LedgerProbe, PerformanceSample,
    ProbeError, Probes,
};
use crate::store::{MemoryBackend, StoreBackend, StoreError, TtlStore};

pub fn memory_store(clock: Arc<dyn Clock>) -> TtlStore {
    TtlStore::new(Arc::new(MemoryBackend::new(clock)), MonitorMetrics::new())
}

/// Backend whose every call fails, for outage paths.
pub struct FailingBackend;

#[async_trait]
impl StoreBackend for FailingBackend {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Option<Duration>) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn keys(&self, _prefix: &str) -> Result<Vec<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

pub struct RecordingNotifier {
    name: String,
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.notifications().len()
    }

    /// Notifications whose title starts with `prefix`.
    pub fn titled(&self, prefix: &str) -> Vec<Notification> {
        self.notifications()
            .into_iter()
            .filter(|n| n.title.starts_with(prefix))
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.clear();
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .map_err(|_| NotifyError("recorder poisoned".into()))?
            .push(notification.clone());
        Ok(())
    }

    async fn test_connection(&self) -> Result<(), NotifyError> {
        Ok(())
    }
}

pub struct FailingNotifier {
    name: String,
}

impl FailingNotifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Notifier for FailingNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
        Err(NotifyError(format!("{} unreachable", self.name)))
    }

    async fn test_connection(&self) -> Result<(), NotifyError> {
        Err(NotifyError(format!("{} unreachable", self.name)))
    }
}

/// Never completes a send or a connection test.
pub struct HangingNotifier {
    name: String,
}

impl HangingNotifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Notifier for HangingNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
        std::future::pending().await
    }

    async fn test_connection(&self) -> Result<(), NotifyError> {
        std::future::pending().await
    }
}

/// Fails the first `max_failures` sends, then succeeds.
pub struct FlakyNotifier {
    fail_count: AtomicU32,
    max_failures: u32,
}

impl FlakyNotifier {
    pub fn new(max_failures: u32) -> Self {
        Self {
            fail_count: AtomicU32::new(0),
            max_failures,
        }
    }
}

#[async_trait]
impl Notifier for FlakyNotifier {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
        let count = self.fail_count.fetch_add(1, Ordering::SeqCst);
        if count < self.max_failures {
            Err(NotifyError(format!("fail #{}", count + 1)))
        } else {
            Ok(())
        }
    }

    async fn test_connection(&self) -> Result<(), NotifyError> {
        Ok(())
    }
}

#[derive(Default)]
struct LedgerState {
    slot: u64,
    sample: PerformanceSample,
    block_times: HashMap<u64, i64>,
    confirmation_time: f64,
    failure_rate: f64,
    failing: bool,
    delay: Option<Duration>,
}

/// Scriptable ledger. Can be made to fail or hang.
#[derive(Default)]
pub struct StubLedger {
    state: Mutex<LedgerState>,
}

impl StubLedger {
    fn with_state<T>(&self, f: impl FnOnce(&mut LedgerState) -> T) -> T {
        let mut guard = self.state.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut guard)
    }

    pub fn set_slot(&self, slot: u64) {
        self.with_state(|s| s.slot = slot);
    }

    /// Throughput equals `transactions` when the period is zero.
    pub fn set_throughput(&self, transactions: u64) {
        self.with_state(|s| {
            s.sample = PerformanceSample {
                num_transactions: transactions,
                num_slots: 0,
                sample_period_secs: 0,
            }
        });
    }

    pub fn set_block_time(&self, slot: u64, unix_secs: Option<i64>) {
        self.with_state(|s| match unix_secs {
            Some(t) => {
                s.block_times.insert(slot, t);
            }
            None => {
                s.block_times.remove(&slot);
            }
        });
    }

    pub fn set_confirmation_time(&self, ms: f64) {
        self.with_state(|s| s.confirmation_time = ms);
    }

    pub fn set_failure_rate(&self, rate: f64) {
        self.with_state(|s| s.failure_rate = rate);
    }

    pub fn set_failing(&self, failing: bool) {
        self.with_state(|s| s.failing = failing);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        self.with_state(|s| s.delay = delay);
    }

    async fn gate(&self) -> Result<(), ProbeError> {
        let (failing, delay) = self.with_state(|s| (s.failing, s.delay));
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        if failing {
            return Err(ProbeError("ledger unreachable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerProbe for StubLedger {
    async fn current_slot(&self) -> Result<u64, ProbeError> {
        self.gate().await?;
        Ok(self.with_state(|s| s.slot))
    }

    async fn recent_performance_sample(&self) -> Result<PerformanceSample, ProbeError> {
        self.gate().await?;
        Ok(self.with_state(|s| s.sample))
    }

    async fn block_time_for(&self, slot: u64) -> Result<Option<i64>, ProbeError> {
        self.gate().await?;
        Ok(self.with_state(|s| s.block_times.get(&slot).copied()))
    }

    async fn confirmation_time(&self) -> Result<f64, ProbeError> {
        self.gate().await?;
        Ok(self.with_state(|s| s.confirmation_time))
    }

    async fn failure_rate(&self) -> Result<f64, ProbeError> {
        self.gate().await?;
        Ok(self.with_state(|s| s.failure_rate))
    }
}

/// Fixed named values; names missing from the map fail the sample.
#[derive(Default)]
pub struct StubInstrumentation {
    values: Mutex<HashMap<String, f64>>,
    delay: Mutex<Option<Duration>>,
}

impl StubInstrumentation {
    pub fn set(&self, name: &str, value: f64) {
        if let Ok(mut v) = self.values.lock() {
            v.insert(name.to_string(), value);
        }
    }

    pub fn unset(&self, name: &str) {
        if let Ok(mut v) = self.values.lock() {
            v.remove(name);
        }
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        if let Ok(mut d) = self.delay.lock() {
            *d = delay;
        }
    }

    async fn read(&self, name: &str) -> Result<f64, ProbeError> {
        let delay = self.delay.lock().map(|d| *d).unwrap_or(None);
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        self.values
            .lock()
            .ok()
            .and_then(|v| v.get(name).copied())
            .ok_or_else(|| ProbeError(format!("{name} unavailable")))
    }

    /// Every application and contract value set to zero.
    pub fn zeroed() -> Self {
        let stub = Self::default();
        for name in [
            "request_latency",
            "error_rate",
            "active_users",
            "memory_fraction",
            "cpu_fraction",
            "gas_usage",
            "call_count",
            "contract_failure_rate",
            "average_confirmation_time",
        ] {
            stub.set(name, 0.0);
        }
        stub
    }
}

#[async_trait]
impl AppInstrumentation for StubInstrumentation {
    async fn request_latency(&self) -> Result<f64, ProbeError> {
        self.read("request_latency").await
    }

    async fn error_rate(&self) -> Result<f64, ProbeError> {
        self.read("error_rate").await
    }

    async fn active_users(&self) -> Result<f64, ProbeError> {
        self.read("active_users").await
    }

    async fn memory_fraction(&self) -> Result<f64, ProbeError> {
        self.read("memory_fraction").await
    }

    async fn cpu_fraction(&self) -> Result<f64, ProbeError> {
        self.read("cpu_fraction").await
    }
}

#[async_trait]
impl ContractInstrumentation for StubInstrumentation {
    async fn gas_usage(&self) -> Result<f64, ProbeError> {
        self.read("gas_usage").await
    }

    async fn call_count(&self) -> Result<f64, ProbeError> {
        self.read("call_count").await
    }

    async fn failure_rate(&self) -> Result<f64, ProbeError> {
        self.read("contract_failure_rate").await
    }

    async fn average_confirmation_time(&self) -> Result<f64, ProbeError> {
        self.read("average_confirmation_time").await
    }
}

/// Endpoint probe where listed paths fail and everything else succeeds.
#[derive(Default)]
pub struct StubEndpoints {
    failing: Mutex<HashSet<String>>,
    delay: Mutex<Option<Duration>>,
}

impl StubEndpoints {
    pub fn fail(&self, path: &str) {
        if let Ok(mut f) = self.failing.lock() {
            f.insert(path.to_string());
        }
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        if let Ok(mut d) = self.delay.lock() {
            *d = delay;
        }
    }
}

#[async_trait]
impl EndpointProbe for StubEndpoints {
    async fn ping(&self, path: &str) -> bool {
        let delay = self.delay.lock().map(|d| *d).unwrap_or(None);
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        self.failing
            .lock()
            .map(|f| !f.contains(path))
            .unwrap_or(false)
    }
}

/// Handles to the stubs behind a [`Probes`] bundle built by [`stub_probes`].
#[derive(Clone)]
pub struct Stubs {
    pub ledger: Arc<StubLedger>,
    pub instruments: Arc<StubInstrumentation>,
    pub endpoints: Arc<StubEndpoints>,
}

/// Probes wired to healthy, all-zero stubs.
pub fn stub_probes() -> (Probes, Stubs) {
    let stubs = Stubs {
        ledger: Arc::new(StubLedger::default()),
        instruments: Arc::new(StubInstrumentation::zeroed()),
        endpoints: Arc::new(StubEndpoints::default()),
    };
    let probes = Probes {
        ledger: stubs.ledger.clone(),
        app: stubs.instruments.clone(),
        contract: stubs.instruments.clone(),
        endpoints: stubs.endpoints.clone(),
    };
    (probes, stubs)
}

/// In-memory context whose only channel records every notification.
pub fn test_context(clock: Arc<dyn Clock>) -> (Context, Arc<RecordingNotifier>) {
    let metrics = MonitorMetrics::new();
    let recorder = Arc::new(RecordingNotifier::new("recorder"));
    let hub = NotificationHub::new(metrics.clone()).with_channel(recorder.clone());
    let store = TtlStore::new(Arc::new(MemoryBackend::new(clock.clone())), metrics.clone());
    (Context::new(store, hub, clock, metrics), recorder)
}
