use serde::{Deserialize, Serialize};
use vigil_common::clock::{DAY_MS, HOUR_MS};
use vigil_common::MetricsSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationPeriod {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "24h")]
    OneDay,
    #[serde(rename = "7d")]
    SevenDays,
}

impl AggregationPeriod {
    pub fn duration_ms(&self) -> i64 {
        match self {
            Self::OneHour => HOUR_MS,
            Self::OneDay => DAY_MS,
            Self::SevenDays => 7 * DAY_MS,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1h" => Some(Self::OneHour),
            "24h" => Some(Self::OneDay),
            "7d" => Some(Self::SevenDays),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedMetrics {
    pub average_throughput: f64,
    pub average_block_interval: f64,
    pub average_confirmation_time: f64,
    pub total_transactions: f64,
    pub failure_rate: f64,
    pub sample_count: usize,
}

/// Arithmetic means over the window. Transactions are estimated as
/// `sum(throughput) * tick_secs`. An empty window is all zeros.
pub fn aggregate(snapshots: &[MetricsSnapshot], tick_secs: f64) -> AggregatedMetrics {
    if snapshots.is_empty() {
        return AggregatedMetrics::default();
    }
    let n = snapshots.len() as f64;
    let throughput = sum(snapshots, |s| s.ledger.throughput);
    AggregatedMetrics {
        average_throughput: throughput / n,
        average_block_interval: sum(snapshots, |s| s.ledger.block_interval) / n,
        average_confirmation_time: sum(snapshots, |s| s.ledger.confirmation_time) / n,
        total_transactions: throughput * tick_secs,
        failure_rate: sum(snapshots, |s| s.ledger.failure_rate) / n,
        sample_count: snapshots.len(),
    }
}

fn sum(snapshots: &[MetricsSnapshot], field: impl Fn(&MetricsSnapshot) -> f64) -> f64 {
    snapshots.iter().map(field).sum()
}
