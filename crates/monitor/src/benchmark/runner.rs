use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::join_all;
use tokio::sync::Mutex;
use vigil_common::keys::BENCHMARK_RESULTS_KEY;
use vigil_common::{RollingHistory, Severity};

use super::config::{BenchmarkCategory, BenchmarkConfig};
use super::result::{BenchmarkResult, BenchmarkStatus};
use super::BenchmarkError;
use crate::context::Context;
use crate::locks::KeyedLocks;
use crate::notifier::Notification;
use crate::probe::Probes;

pub const RESULTS_CAP: usize = 1_000;
pub const RESULTS_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);
pub const DEFAULT_RESULTS_LIMIT: usize = 100;

/// Measures benchmark metrics fresh from the probes, never from a snapshot.
#[derive(Clone)]
pub struct BenchmarkSampler {
    probes: Probes,
    timeout: Duration,
}

impl BenchmarkSampler {
    pub fn new(probes: Probes, timeout: Duration) -> Self {
        Self { probes, timeout }
    }

    /// A failed or timed-out measurement reads as zero.
    pub async fn measure(&self, category: BenchmarkCategory, metric: &str) -> f64 {
        let Some(path) = category.metric_path(metric) else {
            tracing::warn!(category = category.as_str(), metric, "unsupported benchmark metric");
            return 0.0;
        };
        match tokio::time::timeout(self.timeout, self.probes.read(&path)).await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                tracing::warn!(metric = %path, error = %e, "benchmark sample failed");
                0.0
            }
            Err(_) => {
                tracing::warn!(metric = %path, "benchmark sample timed out");
                0.0
            }
        }
    }
}

#[derive(Clone)]
pub struct BenchmarkRunner {
    configs: Arc<DashMap<String, BenchmarkConfig>>,
    locks: KeyedLocks,
    results_lock: Arc<Mutex<()>>,
    sampler: BenchmarkSampler,
    ctx: Context,
}

impl BenchmarkRunner {
    pub fn new(sampler: BenchmarkSampler, ctx: Context) -> Self {
        Self {
            configs: Arc::new(DashMap::new()),
            locks: KeyedLocks::new(),
            results_lock: Arc::new(Mutex::new(())),
            sampler,
            ctx,
        }
    }

    pub async fn add_config(&self, config: BenchmarkConfig) -> Result<(), BenchmarkError> {
        config.validate()?;
        let _guard = self.locks.lock(&config.id).await;
        match self.configs.entry(config.id.clone()) {
            Entry::Occupied(_) => Err(BenchmarkError::Duplicate(config.id)),
            Entry::Vacant(slot) => {
                tracing::info!(benchmark = %config.id, category = config.category.as_str(), "benchmark config added");
                slot.insert(config);
                Ok(())
            }
        }
    }

    pub fn config(&self, id: &str) -> Option<BenchmarkConfig> {
        self.configs.get(id).map(|c| c.clone())
    }

    pub fn configs(&self) -> Vec<BenchmarkConfig> {
        let mut configs: Vec<BenchmarkConfig> = self.configs.iter().map(|c| c.value().clone()).collect();
        configs.sort_by(|a, b| a.id.cmp(&b.id));
        configs
    }

    /// Runs one benchmark. Concurrent runs of the same config are serialised.
    pub async fn run(&self, id: &str) -> Result<BenchmarkResult, BenchmarkError> {
        let _guard = self.locks.lock(id).await;
        let config = self.config(id).ok_or_else(|| BenchmarkError::NotFound(id.to_string()))?;
        Ok(self.run_locked(config).await)
    }

    /// Runs the config only if it is still due once its lock is held, so a
    /// run that finished while we waited is not repeated.
    pub async fn run_if_due(&self, id: &str) -> Result<Option<BenchmarkResult>, BenchmarkError> {
        let _guard = self.locks.lock(id).await;
        let config = self.config(id).ok_or_else(|| BenchmarkError::NotFound(id.to_string()))?;
        if !config.is_due(self.ctx.now_ms()) {
            tracing::debug!(benchmark = %id, "benchmark no longer due");
            return Ok(None);
        }
        Ok(Some(self.run_locked(config).await))
    }

    async fn run_locked(&self, config: BenchmarkConfig) -> BenchmarkResult {
        let id = config.id.as_str();

        let category = config.category;
        let reads = config.metrics.iter().map(|m| async move {
            let value = self.sampler.measure(category, &m.name).await;
            (m.name.clone(), value)
        });
        let observed = join_all(reads).await;

        let now_ms = self.ctx.now_ms();
        let result = BenchmarkResult::evaluate(&config, &observed, now_ms);
        tracing::info!(benchmark = %id, status = ?result.status, "benchmark finished");

        self.store_result(&result).await;
        if let Some(mut entry) = self.configs.get_mut(id) {
            entry.schedule.last_run_ms = Some(now_ms);
        }

        self.ctx.metrics.inc_benchmarks_run();
        if result.status == BenchmarkStatus::Failure {
            self.ctx.metrics.inc_benchmarks_failed();
        }
        if result.status != BenchmarkStatus::Success {
            self.notify(&result).await;
        }
        result
    }

    /// Runs every due config in id order. One failing run never stops the rest.
    pub async fn schedule_tick(&self) -> Vec<BenchmarkResult> {
        let now_ms = self.ctx.now_ms();
        let mut results = Vec::new();
        for config in self.configs().into_iter().filter(|c| c.is_due(now_ms)) {
            match self.run_if_due(&config.id).await {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(e) => tracing::error!(benchmark = %config.id, error = %e, "scheduled benchmark failed"),
            }
        }
        results
    }

    /// Newest first, optionally restricted to one category.
    pub async fn results(&self, category: Option<BenchmarkCategory>, limit: usize) -> Vec<BenchmarkResult> {
        self.load_results()
            .await
            .into_iter()
            .filter(|r| category.map_or(true, |c| r.category == c))
            .take(limit)
            .collect()
    }

    pub async fn latest_result(&self, category: Option<BenchmarkCategory>) -> Option<BenchmarkResult> {
        self.results(category, 1).await.into_iter().next()
    }

    async fn load_results(&self) -> Vec<BenchmarkResult> {
        self.ctx
            .store
            .get::<Vec<BenchmarkResult>>(BENCHMARK_RESULTS_KEY)
            .await
            .unwrap_or_default()
    }

    async fn store_result(&self, result: &BenchmarkResult) {
        let _guard = self.results_lock.lock().await;
        let mut history = RollingHistory::from_items(self.load_results().await, RESULTS_CAP);
        history.push(result.clone());
        let items = history.into_vec();
        if !self.ctx.store.set(BENCHMARK_RESULTS_KEY, &items, Some(RESULTS_TTL)).await {
            tracing::error!(result_id = %result.id, "failed to persist benchmark result");
        }
    }

    async fn notify(&self, result: &BenchmarkResult) {
        let (title, severity) = match result.status {
            BenchmarkStatus::Warning => ("Benchmark Warning", Severity::Warning),
            _ => ("Benchmark Failure", Severity::Error),
        };
        let metadata = serde_json::to_value(result).unwrap_or_default();
        let notification = Notification::new(title, result.summary.clone(), severity).with_metadata(metadata);
        self.ctx.hub.send(&notification).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::config::{default_benchmarks, Frequency, MetricSpec, Schedule};
    use crate::testing::{stub_probes, test_context, RecordingNotifier, Stubs};
    use vigil_common::clock::HOUR_MS;
    use vigil_common::ManualClock;

    async fn runner() -> (BenchmarkRunner, Stubs, Arc<RecordingNotifier>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(HOUR_MS));
        let (ctx, recorder) = test_context(clock.clone());
        let (probes, stubs) = stub_probes();
        let runner = BenchmarkRunner::new(BenchmarkSampler::new(probes, Duration::from_secs(5)), ctx);
        for config in default_benchmarks() {
            runner.add_config(config).await.unwrap();
        }
        (runner, stubs, recorder, clock)
    }

    fn gas_only() -> BenchmarkConfig {
        BenchmarkConfig {
            id: "gas".into(),
            name: "Gas".into(),
            description: String::new(),
            category: BenchmarkCategory::Contract,
            metrics: vec![MetricSpec {
                name: "gas_usage".into(),
                baseline: 1_000_000.0,
                warning_threshold: 2_000_000.0,
                failure_threshold: 5_000_000.0,
            }],
            schedule: Schedule {
                frequency: Frequency::Daily,
                last_run_ms: None,
            },
        }
    }

    #[tokio::test]
    async fn failing_run_notifies_and_persists() {
        let (runner, stubs, recorder, _) = runner().await;
        runner.add_config(gas_only()).await.unwrap();
        stubs.instruments.set("gas_usage", 6_000_000.0);

        let result = runner.run("gas").await.unwrap();
        assert_eq!(result.status, BenchmarkStatus::Failure);
        assert_eq!(result.metrics[0].deviation, 5.0);

        let sent = recorder.titled("Benchmark Failure");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].severity, Severity::Error);
        assert_eq!(runner.latest_result(None).await.unwrap().id, result.id);
        assert_eq!(runner.config("gas").unwrap().schedule.last_run_ms, Some(HOUR_MS));
    }

    #[tokio::test]
    async fn passing_run_is_silent() {
        let (runner, _, recorder, _) = runner().await;
        let result = runner.run("application-performance").await.unwrap();
        assert_eq!(result.status, BenchmarkStatus::Success);
        assert_eq!(recorder.count(), 0);
    }

    #[tokio::test]
    async fn unknown_config_is_an_error() {
        let (runner, _, _, _) = runner().await;
        assert_eq!(runner.run("nope").await, Err(BenchmarkError::NotFound("nope".into())));
    }

    #[tokio::test]
    async fn duplicate_and_invalid_configs_rejected() {
        let (runner, _, _, _) = runner().await;
        let dup = default_benchmarks().remove(0);
        assert!(matches!(runner.add_config(dup).await, Err(BenchmarkError::Duplicate(_))));

        let mut bad = gas_only();
        bad.metrics[0].baseline = 0.0;
        assert!(matches!(runner.add_config(bad).await, Err(BenchmarkError::Invalid(_))));
    }

    #[tokio::test]
    async fn schedule_runs_only_due_configs() {
        let (runner, _, _, clock) = runner().await;
        assert_eq!(runner.schedule_tick().await.len(), 3);
        assert!(runner.schedule_tick().await.is_empty());

        clock.advance(HOUR_MS);
        let ran: Vec<String> = runner.schedule_tick().await.into_iter().map(|r| r.config_id).collect();
        assert_eq!(ran, vec!["application-performance", "network-performance"]);
    }

    #[tokio::test]
    async fn results_filter_by_category_newest_first() {
        let (runner, _, _, clock) = runner().await;
        runner.run("contract-performance").await.unwrap();
        clock.advance(1_000);
        runner.run("network-performance").await.unwrap();
        clock.advance(1_000);
        runner.run("contract-performance").await.unwrap();

        let all = runner.results(None, DEFAULT_RESULTS_LIMIT).await;
        assert_eq!(all.len(), 3);
        assert!(all[0].timestamp_ms > all[1].timestamp_ms);

        let contract = runner.results(Some(BenchmarkCategory::Contract), 10).await;
        assert_eq!(contract.len(), 2);
        assert_eq!(runner.results(None, 1).await.len(), 1);
        let latest = runner.latest_result(Some(BenchmarkCategory::Network)).await.unwrap();
        assert_eq!(latest.config_id, "network-performance");
    }

    #[tokio::test]
    async fn concurrent_runs_keep_every_result() {
        let (runner, _, _, _) = runner().await;
        let runs = ["network-performance", "application-performance", "contract-performance"]
            .into_iter()
            .map(|id| {
                let runner = runner.clone();
                tokio::spawn(async move { runner.run(id).await })
            });
        for handle in join_all(runs).await {
            handle.unwrap().unwrap();
        }
        assert_eq!(runner.results(None, DEFAULT_RESULTS_LIMIT).await.len(), 3);
    }

    #[tokio::test]
    async fn config_named_like_results_key_completes() {
        let (runner, _, _, _) = runner().await;
        let mut config = gas_only();
        config.id = BENCHMARK_RESULTS_KEY.into();
        runner.add_config(config).await.unwrap();

        let run = tokio::time::timeout(Duration::from_secs(5), runner.run(BENCHMARK_RESULTS_KEY)).await;
        assert_eq!(run.unwrap().unwrap().config_id, BENCHMARK_RESULTS_KEY);
    }

    #[tokio::test]
    async fn racing_schedule_ticks_run_each_config_once() {
        let (runner, _, _, _) = runner().await;
        let ticks = (0..2).map(|_| {
            let runner = runner.clone();
            tokio::spawn(async move { runner.schedule_tick().await.len() })
        });
        let ran: usize = join_all(ticks).await.into_iter().map(|h| h.unwrap()).sum();
        assert_eq!(ran, 3);
        assert_eq!(runner.results(None, DEFAULT_RESULTS_LIMIT).await.len(), 3);
    }

    #[tokio::test]
    async fn manual_run_makes_scheduled_run_skip() {
        let (runner, _, _, _) = runner().await;
        runner.run("network-performance").await.unwrap();
        assert_eq!(runner.run_if_due("network-performance").await, Ok(None));
        assert!(runner.run_if_due("application-performance").await.unwrap().is_some());
    }
}
