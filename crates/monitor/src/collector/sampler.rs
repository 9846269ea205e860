use std::time::Duration;

use futures::future::join_all;
use vigil_common::keys::{snapshot_key, trailing_timestamp, METRICS_SNAPSHOT_PREFIX};
use vigil_common::{MetricsSnapshot, Severity};

use super::aggregate::{aggregate, AggregatedMetrics, AggregationPeriod};
use super::critical::{default_critical_thresholds, CriticalThreshold};
use crate::context::Context;
use crate::notifier::Notification;
use crate::probe::{Probes, SAMPLED_METRICS};

pub const SNAPSHOT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Samples all three metric groups once per tick and persists the snapshot.
#[derive(Clone)]
pub struct MetricsCollector {
    probes: Probes,
    ctx: Context,
    critical: Vec<CriticalThreshold>,
    sample_timeout: Duration,
    tick_interval: Duration,
}

impl MetricsCollector {
    pub fn new(probes: Probes, ctx: Context) -> Self {
        Self {
            probes,
            ctx,
            critical: default_critical_thresholds(),
            sample_timeout: Duration::from_secs(5),
            tick_interval: Duration::from_secs(60),
        }
    }

    pub fn with_sample_timeout(mut self, timeout: Duration) -> Self {
        self.sample_timeout = timeout;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_critical_thresholds(mut self, thresholds: Vec<CriticalThreshold>) -> Self {
        self.critical = thresholds;
        self
    }

    pub fn critical_thresholds(&self) -> &[CriticalThreshold] {
        &self.critical
    }

    /// Reads every metric concurrently. A sample that fails or exceeds the
    /// timeout is recorded as zero; the tick itself never fails.
    pub async fn sample(&self) -> MetricsSnapshot {
        let mut snapshot = MetricsSnapshot::empty(self.ctx.now_ms());
        let reads = SAMPLED_METRICS.iter().map(|path| self.sample_one(path));
        let values = join_all(reads).await;

        for (path, value) in SAMPLED_METRICS.iter().zip(values) {
            if let Some(slot) = snapshot.resolve_mut(path) {
                *slot = value;
            }
        }
        snapshot
    }

    async fn sample_one(&self, path: &str) -> f64 {
        match tokio::time::timeout(self.sample_timeout, self.probes.read(path)).await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                self.ctx.metrics.inc_samples_failed();
                tracing::warn!(metric = path, error = %e, "sample failed, recording zero");
                0.0
            }
            Err(_) => {
                self.ctx.metrics.inc_samples_failed();
                tracing::warn!(metric = path, timeout_ms = self.sample_timeout.as_millis() as u64, "sample timed out, recording zero");
                0.0
            }
        }
    }

    /// Samples, persists with a 24h TTL, then runs the critical fast path.
    pub async fn collect_and_persist(&self) -> MetricsSnapshot {
        let snapshot = self.sample().await;
        self.ctx.metrics.inc_metric_ticks();

        let key = snapshot_key(snapshot.timestamp_ms);
        if !self.ctx.store.set(&key, &snapshot, Some(SNAPSHOT_TTL)).await {
            tracing::error!(key = %key, "failed to persist snapshot");
        }
        self.check_critical(&snapshot).await;
        snapshot
    }

    /// Sends one critical notification per breached threshold.
    pub async fn check_critical(&self, snapshot: &MetricsSnapshot) -> usize {
        let mut fired = 0;
        for threshold in &self.critical {
            let Some(value) = threshold.breached_by(snapshot) else {
                continue;
            };
            tracing::error!(metric = %threshold.path, value, threshold = threshold.threshold, "critical threshold breached");
            let notification = Notification::new(threshold.title.clone(), threshold.message(value), Severity::Critical)
                .with_metadata(threshold.group_metadata(snapshot));
            self.ctx.hub.send(&notification).await;
            self.ctx.metrics.inc_critical_notifications();
            fired += 1;
        }
        fired
    }

    /// Persisted snapshots with `from_ms <= timestamp <= to_ms`, oldest first.
    pub async fn history(&self, from_ms: i64, to_ms: i64) -> Vec<MetricsSnapshot> {
        let keys: Vec<String> = self
            .ctx
            .store
            .keys(METRICS_SNAPSHOT_PREFIX)
            .await
            .into_iter()
            .filter(|k| trailing_timestamp(k).is_some_and(|ts| ts >= from_ms && ts <= to_ms))
            .collect();

        let loaded = join_all(keys.iter().map(|k| self.ctx.store.get::<MetricsSnapshot>(k))).await;
        let mut snapshots: Vec<MetricsSnapshot> = loaded.into_iter().flatten().collect();
        snapshots.sort_by_key(|s| s.timestamp_ms);
        snapshots
    }

    pub async fn aggregate(&self, period: AggregationPeriod) -> AggregatedMetrics {
        let now = self.ctx.now_ms();
        let window = self.history(now - period.duration_ms(), now).await;
        aggregate(&window, self.tick_interval.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{stub_probes, test_context};
    use vigil_common::clock::{HOUR_MS, MINUTE_MS};
    use vigil_common::ManualClock;

    fn collector(clock: Arc<ManualClock>) -> (MetricsCollector, crate::testing::Stubs, Arc<crate::testing::RecordingNotifier>) {
        let (ctx, recorder) = test_context(clock);
        let (probes, stubs) = stub_probes();
        stubs.ledger.set_throughput(1_000);
        (MetricsCollector::new(probes, ctx), stubs, recorder)
    }

    #[tokio::test]
    async fn failed_sample_is_zero_and_counted() {
        let clock = Arc::new(ManualClock::new(HOUR_MS));
        let (collector, stubs, _) = collector(clock);
        stubs.instruments.set("request_latency", 250.0);
        stubs.instruments.unset("gas_usage");

        let s = collector.sample().await;
        assert_eq!(s.application.request_latency, 250.0);
        assert_eq!(s.contract.gas_usage, 0.0);
        assert_eq!(s.timestamp_ms, HOUR_MS);
        assert!(collector.ctx.metrics.samples_failed_val() >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_sample_times_out_to_zero() {
        let clock = Arc::new(ManualClock::new(0));
        let (collector, stubs, _) = collector(clock);
        let collector = collector.with_sample_timeout(Duration::from_millis(50));
        stubs.ledger.set_delay(Some(Duration::from_secs(60)));
        stubs.instruments.set("error_rate", 0.02);

        let s = collector.sample().await;
        assert_eq!(s.ledger.throughput, 0.0);
        assert_eq!(s.ledger.slot_height, 0.0);
        assert_eq!(s.application.error_rate, 0.02);
    }

    #[tokio::test]
    async fn persists_and_fires_critical_once() {
        let clock = Arc::new(ManualClock::new(HOUR_MS));
        let (collector, stubs, recorder) = collector(clock);
        stubs.ledger.set_throughput(400);

        let s = collector.collect_and_persist().await;
        let critical = recorder.titled("Critical");
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].severity, Severity::Critical);
        assert_eq!(critical[0].metadata.as_ref().unwrap()["throughput"], 400.0);

        let stored: MetricsSnapshot = collector.ctx.store.get(&snapshot_key(s.timestamp_ms)).await.unwrap();
        assert_eq!(stored.ledger.throughput, 400.0);
    }

    #[tokio::test]
    async fn history_is_ordered_and_bounded() {
        let clock = Arc::new(ManualClock::new(HOUR_MS));
        let (collector, _, _) = collector(clock.clone());
        for _ in 0..3 {
            collector.collect_and_persist().await;
            clock.advance(MINUTE_MS);
        }
        let all = collector.history(0, i64::MAX).await;
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].timestamp_ms < w[1].timestamp_ms));

        let tail = collector.history(HOUR_MS + MINUTE_MS, i64::MAX).await;
        assert_eq!(tail.len(), 2);
    }

    #[tokio::test]
    async fn aggregate_windows_by_period() {
        let clock = Arc::new(ManualClock::new(10 * HOUR_MS));
        let (collector, _, _) = collector(clock.clone());
        collector.collect_and_persist().await;
        clock.advance(2 * HOUR_MS);
        collector.collect_and_persist().await;

        let hour = collector.aggregate(AggregationPeriod::OneHour).await;
        assert_eq!(hour.sample_count, 1);
        assert_eq!(hour.total_transactions, 60_000.0);

        let day = collector.aggregate(AggregationPeriod::OneDay).await;
        assert_eq!(day.sample_count, 2);
        assert_eq!(day.average_throughput, 1_000.0);
    }

    #[tokio::test]
    async fn aggregate_of_nothing_is_zero() {
        let clock = Arc::new(ManualClock::new(0));
        let (collector, _, _) = collector(clock);
        for period in [AggregationPeriod::OneHour, AggregationPeriod::OneDay, AggregationPeriod::SevenDays] {
            assert_eq!(collector.aggregate(period).await, AggregatedMetrics::default());
        }
    }

    #[tokio::test]
    async fn stored_snapshot_reloads_field_for_field() {
        let clock = Arc::new(ManualClock::new(HOUR_MS));
        let (collector, _, _) = collector(clock);
        let original = MetricsSnapshot {
            timestamp_ms: HOUR_MS - 5_000,
            ledger: vigil_common::LedgerMetrics {
                throughput: 1_250.5,
                block_interval: 400.25,
                slot_height: 987_654.0,
                confirmation_time: 812.75,
                failure_rate: 0.125,
            },
            application: vigil_common::ApplicationMetrics {
                request_latency: 180.5,
                error_rate: 0.0625,
                active_users: 342.0,
                memory_fraction: 0.5,
                cpu_fraction: 0.375,
            },
            contract: vigil_common::ContractMetrics {
                gas_usage: 1_500_000.0,
                call_count: 77.0,
                failure_rate: 0.25,
                average_confirmation_time: 950.5,
            },
        };
        assert!(collector
            .ctx
            .store
            .set(&snapshot_key(original.timestamp_ms), &original, Some(SNAPSHOT_TTL))
            .await);

        let sampled = collector.collect_and_persist().await;
        let history = collector.history(0, i64::MAX).await;
        assert_eq!(history, vec![original, sampled]);
    }
}
