use std::fmt::Write;

use serde::{Deserialize, Serialize};
use vigil_common::MetricsSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionCategory {
    Network,
    Application,
    Resource,
    Contract,
}

impl SuggestionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Application => "application",
            Self::Resource => "resource",
            Self::Contract => "contract",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// `high` above 2x the baseline, `medium` above 1.5x, else `low`.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > 2.0 {
            Self::High
        } else if ratio > 1.5 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReading {
    pub name: String,
    pub value: f64,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSuggestion {
    pub id: String,
    pub timestamp_ms: i64,
    pub category: SuggestionCategory,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub impact: String,
    pub recommendation: String,
    pub metrics: Vec<MetricReading>,
}

impl OptimizationSuggestion {
    pub fn notification_message(&self) -> String {
        let mut out = format!(
            "{}\n\nImpact: {}\n\nRecommended Actions:\n{}\n\nCurrent Metrics:\n",
            self.description, self.impact, self.recommendation
        );
        for m in &self.metrics {
            let _ = writeln!(out, "{}: {} (Threshold: {})", m.name, m.value, m.threshold);
        }
        out
    }
}

/// Expected values per metric. Throughput is the only one where lower is worse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baselines {
    pub throughput: f64,
    pub block_interval: f64,
    pub request_latency: f64,
    pub error_rate: f64,
    pub memory_fraction: f64,
    pub cpu_fraction: f64,
    pub gas_usage: f64,
    pub contract_failure_rate: f64,
}

impl Default for Baselines {
    fn default() -> Self {
        Self {
            throughput: 1_000.0,
            block_interval: 400.0,
            request_latency: 100.0,
            error_rate: 0.01,
            memory_fraction: 0.7,
            cpu_fraction: 0.6,
            gas_usage: 1_000_000.0,
            contract_failure_rate: 0.01,
        }
    }
}

struct Template {
    category: SuggestionCategory,
    title: &'static str,
    description: &'static str,
    impact: &'static str,
    actions: [&'static str; 4],
}

const NETWORK: Template = Template {
    category: SuggestionCategory::Network,
    title: "Network Performance Optimization",
    description: "Network performance is below optimal levels",
    impact: "Reduced transaction throughput and increased latency",
    actions: [
        "Batch transactions",
        "Rate-limit outgoing requests",
        "Review network configuration",
        "Use a dedicated RPC node",
    ],
};

const APPLICATION: Template = Template {
    category: SuggestionCategory::Application,
    title: "Application Performance Optimization",
    description: "Application performance metrics indicate potential issues",
    impact: "Degraded user experience and increased error rates",
    actions: [
        "Cache hot requests",
        "Optimize database queries",
        "Retry failed requests with exponential backoff",
        "Review error handling",
    ],
};

const RESOURCE: Template = Template {
    category: SuggestionCategory::Resource,
    title: "Resource Usage Optimization",
    description: "System resource usage is approaching critical levels",
    impact: "Potential system instability and performance degradation",
    actions: [
        "Look for memory leaks",
        "Review resource-intensive operations",
        "Trim background tasks",
        "Scale the infrastructure",
    ],
};

const CONTRACT: Template = Template {
    category: SuggestionCategory::Contract,
    title: "Smart Contract Optimization",
    description: "Smart contract performance can be improved",
    impact: "High gas costs and increased failure rates",
    actions: [
        "Optimize contract code for gas",
        "Handle contract errors explicitly",
        "Review contract state management",
        "Batch transactions",
    ],
};

impl Template {
    fn recommendation(&self) -> String {
        let mut out = String::from("Consider the following optimizations:");
        for (i, action) in self.actions.iter().enumerate() {
            let _ = write!(out, "\n{}. {}", i + 1, action);
        }
        out
    }

    fn build(&self, priority: Priority, metrics: Vec<MetricReading>, timestamp_ms: i64) -> OptimizationSuggestion {
        OptimizationSuggestion {
            id: format!("{}-{}", self.category.as_str(), timestamp_ms),
            timestamp_ms,
            category: self.category,
            priority,
            title: self.title.to_string(),
            description: self.description.to_string(),
            impact: self.impact.to_string(),
            recommendation: self.recommendation(),
            metrics,
        }
    }
}

fn reading(name: &str, value: f64, threshold: f64) -> MetricReading {
    MetricReading {
        name: name.to_string(),
        value,
        threshold,
    }
}

/// Priority is driven by the worst breaching metric of the category.
fn worst_ratio(pairs: &[(f64, f64)]) -> Option<f64> {
    pairs
        .iter()
        .filter(|(value, baseline)| value > baseline)
        .map(|(value, baseline)| value / baseline)
        .reduce(f64::max)
}

/// At most one suggestion per category whose metrics are off baseline.
pub fn suggest(snapshot: &MetricsSnapshot, b: &Baselines, timestamp_ms: i64) -> Vec<OptimizationSuggestion> {
    let mut out = Vec::new();
    let ledger = &snapshot.ledger;
    let app = &snapshot.application;
    let contract = &snapshot.contract;

    if ledger.throughput < b.throughput {
        let r = if ledger.throughput > 0.0 {
            b.throughput / ledger.throughput
        } else {
            f64::INFINITY
        };
        out.push(NETWORK.build(
            Priority::from_ratio(r),
            vec![
                reading("Throughput", ledger.throughput, b.throughput),
                reading("Block Interval", ledger.block_interval, b.block_interval),
            ],
            timestamp_ms,
        ));
    }

    let groups = [
        (
            &APPLICATION,
            [(app.request_latency, b.request_latency), (app.error_rate, b.error_rate)],
            ["Request Latency", "Error Rate"],
        ),
        (
            &RESOURCE,
            [(app.memory_fraction, b.memory_fraction), (app.cpu_fraction, b.cpu_fraction)],
            ["Memory Fraction", "CPU Fraction"],
        ),
        (
            &CONTRACT,
            [(contract.gas_usage, b.gas_usage), (contract.failure_rate, b.contract_failure_rate)],
            ["Gas Usage", "Failure Rate"],
        ),
    ];
    for (template, pairs, names) in groups {
        let Some(r) = worst_ratio(&pairs) else {
            continue;
        };
        let metrics = names
            .iter()
            .zip(pairs)
            .map(|(name, (value, baseline))| reading(name, value, baseline))
            .collect();
        out.push(template.build(Priority::from_ratio(r), metrics, timestamp_ms));
    }
    out
}
