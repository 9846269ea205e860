use std::sync::Arc;
use std::time::Duration;

use vigil_common::clock::{HOUR_MS, MINUTE_MS};
use vigil_common::{HealthStatus, ManualClock, Severity};
use vigil_monitor::alert::{AlertRule, Condition, RuleError, RuleUpdate};
use vigil_monitor::audit::AuditFilter;
use vigil_monitor::benchmark::BenchmarkStatus;
use vigil_monitor::collector::{AggregatedMetrics, AggregationPeriod};
use vigil_monitor::context::Context;
use vigil_monitor::metrics::MonitorMetrics;
use vigil_monitor::notifier::NotificationHub;
use vigil_monitor::store::{MemoryBackend, TtlStore};
use vigil_monitor::testing::{
    stub_probes, test_context, FailingNotifier, HangingNotifier, RecordingNotifier, Stubs,
};
use vigil_monitor::{Monitor, Settings};

fn monitor_at(start_ms: i64) -> (Monitor, Stubs, Arc<RecordingNotifier>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start_ms));
    let (ctx, recorder) = test_context(clock.clone());
    let (probes, stubs) = stub_probes();
    (Monitor::new(probes, ctx, Settings::default()), stubs, recorder, clock)
}

fn throughput_rule(cooldown_minutes: u32) -> AlertRule {
    AlertRule {
        id: "tps-floor".into(),
        name: "Throughput floor".into(),
        description: "Throughput under 1000".into(),
        metric: "ledger.throughput".into(),
        condition: Condition::LessThan,
        threshold: 1000.0,
        severity: Severity::Warning,
        enabled: true,
        cooldown_minutes,
        last_triggered_ms: None,
        channels: vec![],
    }
}

#[tokio::test]
async fn critical_throughput_notifies_once_and_persists() {
    let (monitor, stubs, recorder, _) = monitor_at(HOUR_MS);
    stubs.ledger.set_throughput(400);

    let report = monitor.metrics_tick().await;

    assert_eq!(report.snapshot.ledger.throughput, 400.0);
    let critical = recorder.titled("Critical");
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].title, "Critical Performance Alert");
    assert_eq!(critical[0].severity, Severity::Critical);

    let history = monitor.metrics_history(0, i64::MAX).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].ledger.throughput, 400.0);
    assert_eq!(history[0].timestamp_ms, HOUR_MS);
}

#[tokio::test]
async fn gas_overrun_fails_contract_benchmark() {
    let (monitor, stubs, recorder, _) = monitor_at(HOUR_MS);
    monitor.install_defaults(false, true).await;
    stubs.instruments.set("gas_usage", 6_000_000.0);

    let result = monitor.run_benchmark("contract-performance").await.unwrap();

    assert_eq!(result.status, BenchmarkStatus::Failure);
    let gas = result.metrics.iter().find(|m| m.name == "gas_usage").unwrap();
    assert_eq!(gas.deviation, 5.0);
    assert!(result.summary.contains("failed"));
    assert_eq!(recorder.titled("Benchmark Failure").len(), 1);

    let latest = monitor.latest_benchmark_result(None).await.unwrap();
    assert_eq!(latest.id, result.id);
}

#[tokio::test]
async fn rule_cooldown_suppresses_until_elapsed() {
    let (monitor, stubs, _, clock) = monitor_at(HOUR_MS);
    stubs.ledger.set_throughput(800);
    monitor.add_rule(throughput_rule(5)).await.unwrap();

    assert_eq!(monitor.metrics_tick().await.alerts.len(), 1);

    clock.advance(4 * MINUTE_MS);
    assert!(monitor.metrics_tick().await.alerts.is_empty());

    clock.advance(MINUTE_MS);
    let fired = monitor.metrics_tick().await.alerts;
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].value, 800.0);
}

#[tokio::test]
async fn ledger_outage_takes_system_down() {
    let (monitor, stubs, recorder, _) = monitor_at(HOUR_MS);

    let healthy = monitor.system_status().await;
    assert_eq!(healthy.overall, HealthStatus::Healthy);
    assert_eq!(healthy.services.len(), 3);

    stubs.ledger.set_failing(true);
    let status = monitor.health_tick().await;
    assert_eq!(status.overall, HealthStatus::Down);
    assert_eq!(status.services["ledger"].status, HealthStatus::Down);
    assert_eq!(status.services["store"].status, HealthStatus::Healthy);
    assert_eq!(recorder.titled("System Alert: ledger").len(), 1);

    let stored = monitor.service_health("ledger").await;
    assert_eq!(stored, vec![status.services["ledger"].clone()]);

    let audit = monitor.security_events(1).await;
    assert!(audit.iter().any(|e| e.action == "SYSTEM_ALERT"));
    let by_system = monitor
        .audit_logs(&AuditFilter {
            user_id: Some("system".into()),
            ..AuditFilter::default()
        })
        .await;
    assert_eq!(by_system.len(), audit.len());
}

#[tokio::test]
async fn aggregates_without_history_are_zero() {
    let (monitor, _, _, _) = monitor_at(HOUR_MS);
    for period in [
        AggregationPeriod::OneHour,
        AggregationPeriod::OneDay,
        AggregationPeriod::SevenDays,
    ] {
        assert_eq!(monitor.aggregated_metrics(period).await, AggregatedMetrics::default());
    }
}

#[tokio::test]
async fn rule_crud_through_facade() {
    let (monitor, _, _, _) = monitor_at(0);
    monitor.add_rule(throughput_rule(5)).await.unwrap();
    assert!(matches!(
        monitor.add_rule(throughput_rule(5)).await,
        Err(RuleError::Duplicate(_))
    ));

    let updated = monitor
        .update_rule(
            "tps-floor",
            RuleUpdate {
                threshold: Some(750.0),
                enabled: Some(false),
                ..RuleUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.threshold, 750.0);
    assert!(!updated.enabled);
    assert_eq!(updated.cooldown_minutes, 5);

    assert!(monitor.delete_rule("tps-floor").await);
    assert!(!monitor.delete_rule("tps-floor").await);
    assert!(matches!(
        monitor.update_rule("tps-floor", RuleUpdate::default()).await,
        Err(RuleError::NotFound(_))
    ));
    assert!(monitor.list_rules().is_empty());
}

#[tokio::test]
async fn broken_channel_does_not_block_others() {
    let clock = Arc::new(ManualClock::new(HOUR_MS));
    let metrics = MonitorMetrics::new();
    let recorder = Arc::new(RecordingNotifier::new("recorder"));
    let hub = NotificationHub::new(metrics.clone())
        .with_channel(Arc::new(FailingNotifier::new("pager")))
        .with_channel(recorder.clone());
    let store = TtlStore::new(Arc::new(MemoryBackend::new(clock.clone())), metrics.clone());
    let ctx = Context::new(store, hub, clock, metrics.clone());
    let (probes, stubs) = stub_probes();
    let monitor = Monitor::new(probes, ctx, Settings::default());
    stubs.ledger.set_throughput(400);

    monitor.metrics_tick().await;

    assert_eq!(recorder.titled("Critical Performance Alert").len(), 1);
    assert!(metrics.notifications_failed_val() >= 1);

    let channels = monitor.test_notification_channels().await;
    assert_eq!(channels.get("pager"), Some(&false));
    assert_eq!(channels.get("recorder"), Some(&true));
}

#[tokio::test]
async fn advisor_suggestions_are_kept_newest_first() {
    let (monitor, stubs, recorder, clock) = monitor_at(HOUR_MS);
    stubs.ledger.set_throughput(800);
    monitor.metrics_tick().await;
    clock.advance(MINUTE_MS);
    stubs.ledger.set_throughput(300);
    monitor.metrics_tick().await;

    let latest = monitor.latest_suggestions().await;
    assert!(latest.len() >= 2);
    assert!(latest[0].timestamp_ms > latest[latest.len() - 1].timestamp_ms);
    assert_eq!(recorder.titled("High Priority Optimization Required").len(), 1);
    assert_eq!(monitor.suggestion_history().await.len(), latest.len());
}

#[tokio::test(start_paused = true)]
async fn hung_channel_does_not_stall_the_tick() {
    let clock = Arc::new(ManualClock::new(HOUR_MS));
    let metrics = MonitorMetrics::new();
    let recorder = Arc::new(RecordingNotifier::new("recorder"));
    let hub = NotificationHub::new(metrics.clone())
        .with_timeout(Duration::from_secs(5))
        .with_channel(Arc::new(HangingNotifier::new("chat")))
        .with_channel(recorder.clone());
    let store = TtlStore::new(Arc::new(MemoryBackend::new(clock.clone())), metrics.clone());
    let ctx = Context::new(store, hub, clock, metrics.clone());
    let (probes, stubs) = stub_probes();
    let monitor = Monitor::new(probes, ctx, Settings::default());
    stubs.ledger.set_throughput(400);

    let report = tokio::time::timeout(Duration::from_secs(60), monitor.metrics_tick())
        .await
        .expect("tick finished");

    assert_eq!(report.snapshot.ledger.throughput, 400.0);
    assert_eq!(recorder.titled("Critical Performance Alert").len(), 1);
    assert!(metrics.notifications_failed_val() >= 1);
}
