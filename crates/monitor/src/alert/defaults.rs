use vigil_common::Severity;

use super::rule::{AlertRule, Condition};

#[allow(clippy::too_many_arguments)]
fn rule(
    id: &str,
    name: &str,
    description: &str,
    metric: &str,
    condition: Condition,
    threshold: f64,
    severity: Severity,
    cooldown_minutes: u32,
    channels: &[&str],
) -> AlertRule {
    AlertRule {
        id: id.into(),
        name: name.into(),
        description: description.into(),
        metric: metric.into(),
        condition,
        threshold,
        severity,
        enabled: true,
        cooldown_minutes,
        last_triggered_ms: None,
        channels: channels.iter().map(|c| c.to_string()).collect(),
    }
}

/// Starter rule set covering the ledger, application, resource and contract groups.
pub fn default_rules() -> Vec<AlertRule> {
    vec![
        rule(
            "low-throughput",
            "Low Ledger Throughput",
            "Alert when ledger throughput drops below threshold",
            "ledger.throughput",
            Condition::LessThan,
            1000.0,
            Severity::Warning,
            5,
            &["slack"],
        ),
        rule(
            "high-block-interval",
            "High Block Interval",
            "Alert when block interval exceeds threshold",
            "ledger.block_interval",
            Condition::GreaterThan,
            1500.0,
            Severity::Error,
            5,
            &["slack", "email"],
        ),
        rule(
            "high-error-rate",
            "High Application Error Rate",
            "Alert when application error rate exceeds threshold",
            "application.error_rate",
            Condition::GreaterThan,
            0.05,
            Severity::Critical,
            2,
            &["slack", "email"],
        ),
        rule(
            "high-latency",
            "High Request Latency",
            "Alert when average request latency exceeds threshold",
            "application.request_latency",
            Condition::GreaterThan,
            1000.0,
            Severity::Warning,
            5,
            &["slack"],
        ),
        rule(
            "high-memory",
            "High Memory Usage",
            "Alert when memory usage exceeds threshold",
            "application.memory_fraction",
            Condition::GreaterThan,
            0.85,
            Severity::Warning,
            10,
            &["slack"],
        ),
        rule(
            "high-cpu",
            "High CPU Usage",
            "Alert when CPU usage exceeds threshold",
            "application.cpu_fraction",
            Condition::GreaterThan,
            0.90,
            Severity::Warning,
            10,
            &["slack"],
        ),
        rule(
            "contract-failures",
            "High Contract Failure Rate",
            "Alert when contract failure rate exceeds threshold",
            "contract.failure_rate",
            Condition::GreaterThan,
            0.02,
            Severity::Critical,
            5,
            &["slack", "email"],
        ),
        rule(
            "high-gas",
            "High Gas Usage",
            "Alert when average gas usage exceeds threshold",
            "contract.gas_usage",
            Condition::GreaterThan,
            1_000_000.0,
            Severity::Warning,
            15,
            &["slack"],
        ),
        rule(
            "low-active-users",
            "Low Active Users",
            "Alert when active user count drops below threshold",
            "application.active_users",
            Condition::LessThan,
            100.0,
            Severity::Info,
            30,
            &["slack"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use vigil_common::MetricsSnapshot;

    #[test]
    fn defaults_are_valid_and_unique() {
        let rules = default_rules();
        let ids: HashSet<_> = rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), rules.len());
        for r in &rules {
            r.validate().unwrap();
        }
    }

    #[test]
    fn defaults_resolve_against_snapshots() {
        let snapshot = MetricsSnapshot::empty(0);
        for r in default_rules() {
            assert!(snapshot.resolve(&r.metric).is_some(), "{}", r.metric);
        }
    }
}
