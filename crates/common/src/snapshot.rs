use serde::{Deserialize, Serialize};

/// One immutable bundle of sampled metrics, produced once per collector tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp_ms: i64,
    pub ledger: LedgerMetrics,
    pub application: ApplicationMetrics,
    pub contract: ContractMetrics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerMetrics {
    pub throughput: f64,
    pub block_interval: f64,
    pub slot_height: f64,
    pub confirmation_time: f64,
    pub failure_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationMetrics {
    pub request_latency: f64,
    pub error_rate: f64,
    pub active_users: f64,
    pub memory_fraction: f64,
    pub cpu_fraction: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractMetrics {
    pub gas_usage: f64,
    pub call_count: f64,
    pub failure_rate: f64,
    pub average_confirmation_time: f64,
}

/// Splits a dotted `group.field` path. Anything other than exactly two
/// non-empty segments is malformed.
pub fn split_metric_path(path: &str) -> Option<(&str, &str)> {
    let (group, field) = path.split_once('.')?;
    if group.is_empty() || field.is_empty() || field.contains('.') {
        return None;
    }
    Some((group, field))
}

impl MetricsSnapshot {
    pub fn empty(timestamp_ms: i64) -> Self {
        Self {
            timestamp_ms,
            ledger: LedgerMetrics::default(),
            application: ApplicationMetrics::default(),
            contract: ContractMetrics::default(),
        }
    }

    /// Resolves a dotted metric path such as `ledger.throughput`.
    pub fn resolve(&self, path: &str) -> Option<f64> {
        let (group, field) = split_metric_path(path)?;
        match group {
            "ledger" => self.ledger.field(field),
            "application" => self.application.field(field),
            "contract" => self.contract.field(field),
            _ => None,
        }
    }

    /// Mutable counterpart of [`resolve`](Self::resolve), used while a
    /// snapshot is being assembled.
    pub fn resolve_mut(&mut self, path: &str) -> Option<&mut f64> {
        let (group, field) = split_metric_path(path)?;
        match group {
            "ledger" => self.ledger.field_mut(field),
            "application" => self.application.field_mut(field),
            "contract" => self.contract.field_mut(field),
            _ => None,
        }
    }
}

impl LedgerMetrics {
    pub fn field(&self, name: &str) -> Option<f64> {
        match name {
            "throughput" => Some(self.throughput),
            "block_interval" => Some(self.block_interval),
            "slot_height" => Some(self.slot_height),
            "confirmation_time" => Some(self.confirmation_time),
            "failure_rate" => Some(self.failure_rate),
            _ => None,
        }
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut f64> {
        match name {
            "throughput" => Some(&mut self.throughput),
            "block_interval" => Some(&mut self.block_interval),
            "slot_height" => Some(&mut self.slot_height),
            "confirmation_time" => Some(&mut self.confirmation_time),
            "failure_rate" => Some(&mut self.failure_rate),
            _ => None,
        }
    }
}

impl ApplicationMetrics {
    pub fn field(&self, name: &str) -> Option<f64> {
        match name {
            "request_latency" => Some(self.request_latency),
            "error_rate" => Some(self.error_rate),
            "active_users" => Some(self.active_users),
            "memory_fraction" => Some(self.memory_fraction),
            "cpu_fraction" => Some(self.cpu_fraction),
            _ => None,
        }
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut f64> {
        match name {
            "request_latency" => Some(&mut self.request_latency),
            "error_rate" => Some(&mut self.error_rate),
            "active_users" => Some(&mut self.active_users),
            "memory_fraction" => Some(&mut self.memory_fraction),
            "cpu_fraction" => Some(&mut self.cpu_fraction),
            _ => None,
        }
    }
}

impl ContractMetrics {
    pub fn field(&self, name: &str) -> Option<f64> {
        match name {
            "gas_usage" => Some(self.gas_usage),
            "call_count" => Some(self.call_count),
            "failure_rate" => Some(self.failure_rate),
            "average_confirmation_time" => Some(self.average_confirmation_time),
            _ => None,
        }
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut f64> {
        match name {
            "gas_usage" => Some(&mut self.gas_usage),
            "call_count" => Some(&mut self.call_count),
            "failure_rate" => Some(&mut self.failure_rate),
            "average_confirmation_time" => Some(&mut self.average_confirmation_time),
            _ => None,
        }
    }
}
