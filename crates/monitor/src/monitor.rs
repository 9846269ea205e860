use std::time::Duration;

use vigil_common::MetricsSnapshot;

use crate::advisor::{OptimizationAdvisor, OptimizationSuggestion};
use crate::alert::{default_rules, AlertEngine, AlertEvent, AlertRule, RuleBook, RuleError, RuleUpdate};
use crate::audit::{AuditEntry, AuditFilter};
use crate::benchmark::{
    default_benchmarks, BenchmarkCategory, BenchmarkConfig, BenchmarkError, BenchmarkResult, BenchmarkRunner,
    BenchmarkSampler,
};
use crate::collector::{AggregatedMetrics, AggregationPeriod, CriticalThreshold, MetricsCollector};
use crate::config::MonitorConfig;
use crate::context::Context;
use crate::health::{default_endpoints, HealthCheck, HealthMonitor, LatencyThresholds, SystemStatus};
use crate::probe::Probes;
use crate::scheduler::{PeriodicTask, TaskHandle};

/// Tunables for the pipeline, independent of how the probes are built.
#[derive(Debug, Clone)]
pub struct Settings {
    pub metrics_interval: Duration,
    pub health_interval: Duration,
    pub benchmark_interval: Duration,
    pub sample_timeout: Duration,
    pub probe_timeout: Duration,
    pub latency: LatencyThresholds,
    pub endpoints: Vec<String>,
    pub critical_thresholds: Vec<CriticalThreshold>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            metrics_interval: Duration::from_secs(60),
            health_interval: Duration::from_secs(60),
            benchmark_interval: Duration::from_secs(300),
            sample_timeout: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(10),
            latency: LatencyThresholds::default(),
            endpoints: default_endpoints(),
            critical_thresholds: crate::collector::default_critical_thresholds(),
        }
    }
}

impl Settings {
    pub fn from_config(cfg: &MonitorConfig) -> Self {
        Self {
            metrics_interval: Duration::from_secs(cfg.intervals.metrics_seconds),
            health_interval: Duration::from_secs(cfg.intervals.health_seconds),
            benchmark_interval: Duration::from_secs(cfg.intervals.benchmark_seconds),
            sample_timeout: Duration::from_millis(cfg.timeouts.sample_ms),
            probe_timeout: Duration::from_millis(cfg.timeouts.probe_ms),
            latency: LatencyThresholds {
                degraded_ms: cfg.health.degraded_latency_ms,
                down_ms: cfg.health.down_latency_ms,
            },
            endpoints: cfg.health.endpoints.clone(),
            critical_thresholds: cfg.critical_thresholds.clone(),
        }
    }
}

/// What one metrics tick produced.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub snapshot: MetricsSnapshot,
    pub alerts: Vec<AlertEvent>,
    pub suggestions: Vec<OptimizationSuggestion>,
}

/// The assembled pipeline. Cloning is cheap; every clone shares state.
#[derive(Clone)]
pub struct Monitor {
    ctx: Context,
    settings: Settings,
    collector: MetricsCollector,
    health: HealthMonitor,
    alerts: AlertEngine,
    benchmarks: BenchmarkRunner,
    advisor: OptimizationAdvisor,
}

impl Monitor {
    pub fn new(probes: Probes, ctx: Context, settings: Settings) -> Self {
        let collector = MetricsCollector::new(probes.clone(), ctx.clone())
            .with_sample_timeout(settings.sample_timeout)
            .with_tick_interval(settings.metrics_interval)
            .with_critical_thresholds(settings.critical_thresholds.clone());
        let health = HealthMonitor::new(probes.clone(), ctx.clone())
            .with_thresholds(settings.latency)
            .with_probe_timeout(settings.probe_timeout)
            .with_endpoints(settings.endpoints.clone());
        let alerts = AlertEngine::new(RuleBook::new(), ctx.clone());
        let sampler = BenchmarkSampler::new(probes, settings.sample_timeout);
        let benchmarks = BenchmarkRunner::new(sampler, ctx.clone());
        let advisor = OptimizationAdvisor::new(ctx.clone());

        Self {
            ctx,
            settings,
            collector,
            health,
            alerts,
            benchmarks,
            advisor,
        }
    }

    /// Installs the built-in alert rules and benchmark configs.
    pub async fn install_defaults(&self, rules: bool, benchmarks: bool) {
        if rules {
            for rule in default_rules() {
                if let Err(e) = self.alerts.rules().add_rule(rule).await {
                    tracing::warn!(error = %e, "default rule not installed");
                }
            }
        }
        if benchmarks {
            for config in default_benchmarks() {
                if let Err(e) = self.benchmarks.add_config(config).await {
                    tracing::warn!(error = %e, "default benchmark not installed");
                }
            }
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Collect and persist, then evaluate rules and advise on the same snapshot.
    pub async fn metrics_tick(&self) -> TickReport {
        let snapshot = self.collector.collect_and_persist().await;
        let alerts = self.alerts.evaluate(&snapshot).await;
        let suggestions = self.advisor.analyze(&snapshot).await;
        TickReport {
            snapshot,
            alerts,
            suggestions,
        }
    }

    pub async fn health_tick(&self) -> SystemStatus {
        self.health.tick().await
    }

    pub async fn benchmark_tick(&self) -> Vec<BenchmarkResult> {
        self.benchmarks.schedule_tick().await
    }

    /// Spawns the three periodic triggers.
    pub fn start(&self) -> MonitorHandle {
        let metrics = self.clone();
        let health = self.clone();
        let benchmarks = self.clone();
        let tasks = vec![
            PeriodicTask::new("metrics", self.settings.metrics_interval).spawn(move || {
                let m = metrics.clone();
                async move {
                    m.metrics_tick().await;
                }
            }),
            PeriodicTask::new("health", self.settings.health_interval).spawn(move || {
                let m = health.clone();
                async move {
                    m.health_tick().await;
                }
            }),
            PeriodicTask::new("benchmarks", self.settings.benchmark_interval).spawn(move || {
                let m = benchmarks.clone();
                async move {
                    m.benchmark_tick().await;
                }
            }),
        ];
        tracing::info!(tasks = tasks.len(), "monitor started");
        MonitorHandle { tasks }
    }

    pub async fn system_status(&self) -> SystemStatus {
        self.health.system_status().await
    }

    pub async fn service_health(&self, service: &str) -> Vec<HealthCheck> {
        self.health.service_health(service).await
    }

    pub async fn metrics_history(&self, from_ms: i64, to_ms: i64) -> Vec<MetricsSnapshot> {
        self.collector.history(from_ms, to_ms).await
    }

    pub async fn aggregated_metrics(&self, period: AggregationPeriod) -> AggregatedMetrics {
        self.collector.aggregate(period).await
    }

    pub async fn add_rule(&self, rule: AlertRule) -> Result<(), RuleError> {
        self.alerts.rules().add_rule(rule).await
    }

    pub async fn update_rule(&self, id: &str, update: RuleUpdate) -> Result<AlertRule, RuleError> {
        self.alerts.rules().update_rule(id, update).await
    }

    pub async fn delete_rule(&self, id: &str) -> bool {
        self.alerts.rules().delete_rule(id).await
    }

    pub fn list_rules(&self) -> Vec<AlertRule> {
        self.alerts.rules().list_rules()
    }

    pub async fn add_benchmark(&self, config: BenchmarkConfig) -> Result<(), BenchmarkError> {
        self.benchmarks.add_config(config).await
    }

    pub fn benchmark_configs(&self) -> Vec<BenchmarkConfig> {
        self.benchmarks.configs()
    }

    pub async fn run_benchmark(&self, id: &str) -> Result<BenchmarkResult, BenchmarkError> {
        self.benchmarks.run(id).await
    }

    pub async fn benchmark_results(&self, category: Option<BenchmarkCategory>, limit: usize) -> Vec<BenchmarkResult> {
        self.benchmarks.results(category, limit).await
    }

    pub async fn latest_benchmark_result(&self, category: Option<BenchmarkCategory>) -> Option<BenchmarkResult> {
        self.benchmarks.latest_result(category).await
    }

    pub async fn latest_suggestions(&self) -> Vec<OptimizationSuggestion> {
        self.advisor.latest_suggestions().await
    }

    pub async fn suggestion_history(&self) -> Vec<OptimizationSuggestion> {
        self.advisor.history().await
    }

    pub async fn audit_logs(&self, filter: &AuditFilter) -> Vec<AuditEntry> {
        self.ctx.audit.list(filter).await
    }

    pub async fn security_events(&self, window_hours: i64) -> Vec<AuditEntry> {
        self.ctx.audit.security_events(window_hours).await
    }

    pub async fn user_activity(&self, user_id: &str, window_days: i64) -> Vec<AuditEntry> {
        self.ctx.audit.user_activity(user_id, window_days).await
    }

    pub async fn test_notification_channels(&self) -> std::collections::BTreeMap<String, bool> {
        self.ctx.hub.test_connections().await
    }
}

pub struct MonitorHandle {
    tasks: Vec<TaskHandle>,
}

impl MonitorHandle {
    pub fn task_names(&self) -> Vec<&'static str> {
        self.tasks.iter().map(|t| t.name()).collect()
    }

    /// Cancels every periodic trigger. A tick in flight is dropped.
    pub fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        tracing::info!("monitor stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{stub_probes, test_context};
    use vigil_common::clock::HOUR_MS;
    use vigil_common::ManualClock;

    #[tokio::test]
    async fn defaults_install_once() {
        let (ctx, _) = test_context(Arc::new(ManualClock::new(HOUR_MS)));
        let (probes, _) = stub_probes();
        let monitor = Monitor::new(probes, ctx, Settings::default());
        monitor.install_defaults(true, true).await;
        monitor.install_defaults(true, true).await;
        assert_eq!(monitor.list_rules().len(), 9);
        assert_eq!(monitor.benchmark_configs().len(), 3);
    }

    #[tokio::test]
    async fn metrics_tick_feeds_rules_and_advisor() {
        let (ctx, recorder) = test_context(Arc::new(ManualClock::new(HOUR_MS)));
        let (probes, stubs) = stub_probes();
        stubs.ledger.set_throughput(800);
        stubs.instruments.set("active_users", 500.0);
        let monitor = Monitor::new(probes, ctx, Settings::default());
        monitor.install_defaults(true, false).await;

        let report = monitor.metrics_tick().await;
        assert_eq!(report.snapshot.ledger.throughput, 800.0);
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.alerts[0].rule_id, "low-throughput");
        assert_eq!(report.suggestions.len(), 1);
        assert_eq!(recorder.titled("Alert: ").len(), 1);
        assert!(recorder.titled("Critical").is_empty());

        let history = monitor.metrics_history(0, i64::MAX).await;
        assert_eq!(history, vec![report.snapshot]);
    }

    #[tokio::test]
    async fn handle_names_every_trigger() {
        let (ctx, _) = test_context(Arc::new(ManualClock::new(0)));
        let (probes, _) = stub_probes();
        let settings = Settings {
            metrics_interval: Duration::from_secs(3600),
            health_interval: Duration::from_secs(3600),
            benchmark_interval: Duration::from_secs(3600),
            ..Settings::default()
        };
        let handle = Monitor::new(probes, ctx, settings).start();
        assert_eq!(handle.task_names(), vec!["metrics", "health", "benchmarks"]);
        handle.shutdown();
    }
}
