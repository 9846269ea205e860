use serde::{Deserialize, Serialize};
use vigil_common::{AuditKind, AuditStatus, MetricsSnapshot, Severity};

use super::book::RuleBook;
use super::rule::{AlertRule, Condition};
use crate::audit::NewAuditEntry;
use crate::context::Context;
use crate::notifier::Notification;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub rule_id: String,
    pub rule_name: String,
    pub metric: String,
    pub condition: Condition,
    pub value: f64,
    pub threshold: f64,
    pub severity: Severity,
    pub timestamp_ms: i64,
}

/// Evaluates the rule book against each new snapshot. Cooldown is the only
/// de-duplication.
#[derive(Clone)]
pub struct AlertEngine {
    rules: RuleBook,
    ctx: Context,
}

impl AlertEngine {
    pub fn new(rules: RuleBook, ctx: Context) -> Self {
        Self { rules, ctx }
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    pub async fn evaluate(&self, snapshot: &MetricsSnapshot) -> Vec<AlertEvent> {
        let now_ms = self.ctx.now_ms();
        let mut events = Vec::new();

        for rule in self.rules.list_rules() {
            if !rule.enabled {
                continue;
            }
            let value = match snapshot.resolve(&rule.metric) {
                Some(v) => v,
                None => {
                    tracing::debug!(rule_id = %rule.id, metric = %rule.metric, "metric not in snapshot, skipping");
                    continue;
                }
            };
            if !rule.condition.evaluate(value, rule.threshold) {
                continue;
            }
            let Some(fired) = self.rules.try_fire(&rule.id, now_ms).await else {
                continue;
            };

            let event = AlertEvent {
                rule_id: fired.id.clone(),
                rule_name: fired.name.clone(),
                metric: fired.metric.clone(),
                condition: fired.condition,
                value,
                threshold: fired.threshold,
                severity: fired.severity,
                timestamp_ms: now_ms,
            };
            self.raise(&fired, &event).await;
            events.push(event);
        }

        if !events.is_empty() {
            self.ctx.metrics.add_alerts_fired(events.len() as u64);
        }
        events
    }

    async fn raise(&self, rule: &AlertRule, event: &AlertEvent) {
        tracing::warn!(
            rule_id = %event.rule_id,
            metric = %event.metric,
            value = event.value,
            threshold = event.threshold,
            "alert rule fired"
        );

        let details = serde_json::to_value(event).unwrap_or_default();
        self.ctx
            .audit
            .append(
                NewAuditEntry::new(AuditKind::Security, "ALERT_TRIGGERED", "system", AuditStatus::Success)
                    .with_details(details),
            )
            .await;

        let notification = Notification::new(format!("Alert: {}", rule.name), rule.message(event.value), rule.severity)
            .with_metadata(serde_json::json!({
                "rule_id": rule.id,
                "metric": rule.metric,
                "value": event.value,
                "threshold": rule.threshold,
            }));
        self.ctx.hub.send_to(&notification, &rule.channels).await;
    }
}
