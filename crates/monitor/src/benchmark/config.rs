use serde::{Deserialize, Serialize};
use vigil_common::clock::{DAY_MS, HOUR_MS};

use super::BenchmarkError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkCategory {
    Network,
    Application,
    Contract,
}

impl BenchmarkCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Application => "application",
            Self::Contract => "contract",
        }
    }

    /// Metric names a benchmark in this category may declare.
    pub fn supported_metrics(&self) -> &'static [&'static str] {
        match self {
            Self::Network => &["throughput", "block_interval", "confirmation_time", "failure_rate"],
            Self::Application => &["request_latency", "error_rate", "active_users", "memory_fraction", "cpu_fraction"],
            Self::Contract => &["gas_usage", "call_count", "failure_rate", "average_confirmation_time"],
        }
    }

    /// Snapshot path the metric is sampled from. Network metrics come from
    /// the ledger group.
    pub fn metric_path(&self, metric: &str) -> Option<String> {
        if !self.supported_metrics().contains(&metric) {
            return None;
        }
        let group = match self {
            Self::Network => "ledger",
            Self::Application => "application",
            Self::Contract => "contract",
        };
        Some(format!("{group}.{metric}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Hourly,
    Daily,
    Weekly,
}

impl Frequency {
    pub fn interval_ms(&self) -> i64 {
        match self {
            Self::Hourly => HOUR_MS,
            Self::Daily => DAY_MS,
            Self::Weekly => 7 * DAY_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub name: String,
    pub baseline: f64,
    pub warning_threshold: f64,
    pub failure_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub frequency: Frequency,
    #[serde(default)]
    pub last_run_ms: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: BenchmarkCategory,
    pub metrics: Vec<MetricSpec>,
    pub schedule: Schedule,
}

impl BenchmarkConfig {
    pub fn validate(&self) -> Result<(), BenchmarkError> {
        if self.id.trim().is_empty() {
            return Err(BenchmarkError::Invalid("id must not be empty".into()));
        }
        if self.metrics.is_empty() {
            return Err(BenchmarkError::Invalid(format!("{}: no metrics declared", self.id)));
        }
        for m in &self.metrics {
            if self.category.metric_path(&m.name).is_none() {
                return Err(BenchmarkError::Invalid(format!(
                    "{}: unsupported metric {}.{}",
                    self.id,
                    self.category.as_str(),
                    m.name
                )));
            }
            if m.baseline == 0.0 {
                return Err(BenchmarkError::Invalid(format!("{}: {} has a zero baseline", self.id, m.name)));
            }
        }
        Ok(())
    }

    /// Due when it has never run or a full frequency interval has passed.
    pub fn is_due(&self, now_ms: i64) -> bool {
        match self.schedule.last_run_ms {
            None => true,
            Some(last) => now_ms - last >= self.schedule.frequency.interval_ms(),
        }
    }

    pub fn spec(&self, metric: &str) -> Option<&MetricSpec> {
        self.metrics.iter().find(|m| m.name == metric)
    }
}

fn metric(name: &str, baseline: f64, warning: f64, failure: f64) -> MetricSpec {
    MetricSpec {
        name: name.to_string(),
        baseline,
        warning_threshold: warning,
        failure_threshold: failure,
    }
}

fn config(id: &str, name: &str, description: &str, category: BenchmarkCategory, metrics: Vec<MetricSpec>, frequency: Frequency) -> BenchmarkConfig {
    BenchmarkConfig {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category,
        metrics,
        schedule: Schedule {
            frequency,
            last_run_ms: None,
        },
    }
}

pub fn default_benchmarks() -> Vec<BenchmarkConfig> {
    vec![
        config(
            "network-performance",
            "Network Performance Benchmark",
            "Measures ledger block interval and confirmation time",
            BenchmarkCategory::Network,
            vec![
                metric("block_interval", 400.0, 600.0, 1_000.0),
                metric("confirmation_time", 1_000.0, 2_000.0, 5_000.0),
            ],
            Frequency::Hourly,
        ),
        config(
            "application-performance",
            "Application Performance Benchmark",
            "Measures request latency and error rate",
            BenchmarkCategory::Application,
            vec![metric("request_latency", 100.0, 200.0, 500.0), metric("error_rate", 0.01, 0.05, 0.1)],
            Frequency::Hourly,
        ),
        config(
            "contract-performance",
            "Contract Performance Benchmark",
            "Measures contract gas usage and failure rate",
            BenchmarkCategory::Contract,
            vec![
                metric("gas_usage", 1_000_000.0, 2_000_000.0, 5_000_000.0),
                metric("failure_rate", 0.01, 0.05, 0.1),
            ],
            Frequency::Daily,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        for c in default_benchmarks() {
            c.validate().unwrap();
        }
    }

    #[test]
    fn network_maps_to_ledger() {
        assert_eq!(
            BenchmarkCategory::Network.metric_path("block_interval").as_deref(),
            Some("ledger.block_interval")
        );
        assert_eq!(BenchmarkCategory::Network.metric_path("slot_height"), None);
        assert_eq!(BenchmarkCategory::Contract.metric_path("request_latency"), None);
    }

    #[test]
    fn rejects_zero_baseline_and_unknown_metric() {
        let mut c = default_benchmarks().remove(1);
        c.metrics[0].baseline = 0.0;
        assert!(matches!(c.validate(), Err(BenchmarkError::Invalid(_))));

        let mut c = default_benchmarks().remove(1);
        c.metrics[0].name = "tps".into();
        assert!(matches!(c.validate(), Err(BenchmarkError::Invalid(_))));

        let mut c = default_benchmarks().remove(1);
        c.metrics.clear();
        assert!(c.validate().is_err());
    }

    #[test]
    fn due_after_interval() {
        let mut c = default_benchmarks().remove(0);
        assert!(c.is_due(0));
        c.schedule.last_run_ms = Some(1_000);
        assert!(!c.is_due(1_000 + HOUR_MS - 1));
        assert!(c.is_due(1_000 + HOUR_MS));
    }

    #[test]
    fn frequency_serde() {
        let s: Schedule = serde_json::from_str(r#"{"frequency":"weekly"}"#).unwrap();
        assert_eq!(s.frequency.interval_ms(), 7 * DAY_MS);
        assert_eq!(s.last_run_ms, None);
    }
}
