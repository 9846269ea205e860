//! Persisted-key layout: `{category}:{identifier}:{timestamp}`.

pub const METRICS_SNAPSHOT_PREFIX: &str = "metrics:snapshot:";
pub const HEALTH_PREFIX: &str = "health:";
pub const AUDIT_PREFIX: &str = "audit:";
pub const BENCHMARK_RESULTS_KEY: &str = "benchmark:results:latest";
pub const SUGGESTIONS_KEY: &str = "optimization:suggestions:latest";
pub const INSTRUMENT_PREFIX: &str = "instrument:";

pub fn namespaced(category: &str, identifier: &str, timestamp_ms: i64) -> String {
    format!("{category}:{identifier}:{timestamp_ms}")
}

pub fn snapshot_key(timestamp_ms: i64) -> String {
    namespaced("metrics", "snapshot", timestamp_ms)
}

pub fn health_key(service: &str, timestamp_ms: i64) -> String {
    namespaced("health", service, timestamp_ms)
}

pub fn health_prefix(service: &str) -> String {
    format!("{HEALTH_PREFIX}{service}:")
}

/// The entry id rides in the identifier so same-millisecond entries of one
/// kind never collide.
pub fn audit_key(kind: &str, id: &str, timestamp_ms: i64) -> String {
    namespaced("audit", &format!("{kind}-{id}"), timestamp_ms)
}

pub fn audit_prefix(kind: &str) -> String {
    format!("{AUDIT_PREFIX}{kind}-")
}

pub fn instrument_key(name: &str) -> String {
    format!("{INSTRUMENT_PREFIX}{name}")
}

/// Parses the trailing `:{timestamp}` segment of a namespaced key.
pub fn trailing_timestamp(key: &str) -> Option<i64> {
    key.rsplit(':').next()?.parse().ok()
}
