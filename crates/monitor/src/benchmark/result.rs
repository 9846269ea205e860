use std::fmt::Write;

use serde::{Deserialize, Serialize};

use super::config::{BenchmarkCategory, BenchmarkConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkStatus {
    Success,
    Warning,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricOutcome {
    pub name: String,
    pub value: f64,
    pub baseline: f64,
    pub deviation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub id: String,
    pub config_id: String,
    pub timestamp_ms: i64,
    pub category: BenchmarkCategory,
    pub metrics: Vec<MetricOutcome>,
    pub status: BenchmarkStatus,
    pub summary: String,
}

impl BenchmarkResult {
    /// Scores observed values against the config. Values for metrics the
    /// config does not declare are ignored.
    pub fn evaluate(config: &BenchmarkConfig, observed: &[(String, f64)], timestamp_ms: i64) -> Self {
        let mut status = BenchmarkStatus::Success;
        let mut metrics = Vec::with_capacity(observed.len());

        for (name, value) in observed {
            let Some(spec) = config.spec(name) else {
                continue;
            };
            let metric_status = if *value >= spec.failure_threshold {
                BenchmarkStatus::Failure
            } else if *value >= spec.warning_threshold {
                BenchmarkStatus::Warning
            } else {
                BenchmarkStatus::Success
            };
            status = worse(status, metric_status);
            metrics.push(MetricOutcome {
                name: name.clone(),
                value: *value,
                baseline: spec.baseline,
                deviation: (value - spec.baseline) / spec.baseline,
            });
        }

        let summary = summarize(&config.name, &metrics, status);
        Self {
            id: format!("{}-{}", config.id, timestamp_ms),
            config_id: config.id.clone(),
            timestamp_ms,
            category: config.category,
            metrics,
            status,
            summary,
        }
    }
}

fn worse(a: BenchmarkStatus, b: BenchmarkStatus) -> BenchmarkStatus {
    match (a, b) {
        (BenchmarkStatus::Failure, _) | (_, BenchmarkStatus::Failure) => BenchmarkStatus::Failure,
        (BenchmarkStatus::Warning, _) | (_, BenchmarkStatus::Warning) => BenchmarkStatus::Warning,
        _ => BenchmarkStatus::Success,
    }
}

fn summarize(name: &str, metrics: &[MetricOutcome], status: BenchmarkStatus) -> String {
    let verdict = match status {
        BenchmarkStatus::Success => "passed",
        BenchmarkStatus::Warning => "passed with warnings",
        BenchmarkStatus::Failure => "failed",
    };
    let mut out = format!("{name} {verdict}.\n\nMetrics:\n");
    for m in metrics {
        let direction = if m.deviation > 0.0 {
            "above"
        } else if m.deviation < 0.0 {
            "below"
        } else {
            "at"
        };
        let _ = writeln!(
            out,
            "- {}: {} ({:.2}% {} baseline)",
            m.name,
            m.value,
            m.deviation.abs() * 100.0,
            direction
        );
    }
    out
}
