mod config;
mod result;
mod runner;

pub use config::{default_benchmarks, BenchmarkCategory, BenchmarkConfig, Frequency, MetricSpec, Schedule};
pub use result::{BenchmarkResult, BenchmarkStatus, MetricOutcome};
pub use runner::{BenchmarkRunner, BenchmarkSampler, DEFAULT_RESULTS_LIMIT, RESULTS_CAP, RESULTS_TTL};

#[derive(Debug, Clone, PartialEq)]
pub enum BenchmarkError {
    Invalid(String),
    Duplicate(String),
    NotFound(String),
}

impl std::fmt::Display for BenchmarkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(msg) => write!(f, "invalid benchmark: {msg}"),
            Self::Duplicate(id) => write!(f, "benchmark already exists: {id}"),
            Self::NotFound(id) => write!(f, "benchmark config not found: {id}"),
        }
    }
}

impl std::error::Error for BenchmarkError {}
