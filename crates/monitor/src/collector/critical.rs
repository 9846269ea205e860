use serde::{Deserialize, Serialize};
use vigil_common::{split_metric_path, MetricsSnapshot};

use crate::alert::Condition;

/// Hard threshold checked on every collected snapshot, without cooldown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalThreshold {
    pub path: String,
    pub condition: Condition,
    pub threshold: f64,
    pub title: String,
}

impl CriticalThreshold {
    pub fn new(path: &str, condition: Condition, threshold: f64, title: &str) -> Self {
        Self {
            path: path.to_string(),
            condition,
            threshold,
            title: title.to_string(),
        }
    }

    /// The resolved value when the snapshot breaches this threshold.
    pub fn breached_by(&self, snapshot: &MetricsSnapshot) -> Option<f64> {
        let value = snapshot.resolve(&self.path)?;
        self.condition.evaluate(value, self.threshold).then_some(value)
    }

    pub fn message(&self, value: f64) -> String {
        format!(
            "{} is critical: {} (limit {} {})",
            self.path,
            value,
            self.condition.symbol(),
            self.threshold
        )
    }

    /// The breaching metric's whole group, attached as notification metadata.
    pub fn group_metadata(&self, snapshot: &MetricsSnapshot) -> serde_json::Value {
        let group = split_metric_path(&self.path).map(|(g, _)| g).unwrap_or_default();
        let value = match group {
            "ledger" => serde_json::to_value(&snapshot.ledger),
            "application" => serde_json::to_value(&snapshot.application),
            "contract" => serde_json::to_value(&snapshot.contract),
            _ => Ok(serde_json::Value::Null),
        };
        value.unwrap_or_default()
    }
}

pub fn default_critical_thresholds() -> Vec<CriticalThreshold> {
    vec![
        CriticalThreshold::new("ledger.throughput", Condition::LessThan, 500.0, "Critical Performance Alert"),
        CriticalThreshold::new("application.error_rate", Condition::GreaterThan, 0.10, "Critical Error Rate Alert"),
        CriticalThreshold::new("application.memory_fraction", Condition::GreaterThan, 0.95, "Critical Memory Usage Alert"),
        CriticalThreshold::new("application.cpu_fraction", Condition::GreaterThan, 0.90, "Critical CPU Usage Alert"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_throughput_breaches() {
        let thresholds = default_critical_thresholds();
        let mut s = MetricsSnapshot::empty(0);
        s.ledger.throughput = 400.0;
        let hits: Vec<_> = thresholds.iter().filter_map(|t| t.breached_by(&s)).collect();
        assert_eq!(hits, vec![400.0]);
    }

    #[test]
    fn boundary_values_do_not_breach() {
        let mut s = MetricsSnapshot::empty(0);
        s.ledger.throughput = 500.0;
        s.application.error_rate = 0.10;
        s.application.cpu_fraction = 0.90;
        assert!(default_critical_thresholds().iter().all(|t| t.breached_by(&s).is_none()));
    }

    #[test]
    fn metadata_is_the_group() {
        let mut s = MetricsSnapshot::empty(0);
        s.application.memory_fraction = 0.97;
        let t = &default_critical_thresholds()[2];
        let meta = t.group_metadata(&s);
        assert_eq!(meta["memory_fraction"], 0.97);
        assert!(meta.get("throughput").is_none());
    }

    #[test]
    fn unknown_path_never_breaches() {
        let t = CriticalThreshold::new("disk.usage", Condition::GreaterThan, 0.0, "x");
        assert!(t.breached_by(&MetricsSnapshot::empty(0)).is_none());
    }
}
