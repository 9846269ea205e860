use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

/// Three-state classification of a single dependency. Variant order is
/// severity order, so the worst of several statuses is their maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Down,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Down => "down",
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// Worst-of-N: `down` if any is down, else `degraded` if any is degraded.
    /// An empty set is healthy.
    pub fn worst<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = HealthStatus>,
    {
        statuses.into_iter().max().unwrap_or(Self::Healthy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [HealthStatus; 3] = [HealthStatus::Healthy, HealthStatus::Degraded, HealthStatus::Down];

    #[test]
    fn worst_of_truth_table() {
        for a in ALL {
            for b in ALL {
                for c in ALL {
                    let set = [a, b, c];
                    let overall = HealthStatus::worst(set);
                    let any_down = set.contains(&HealthStatus::Down);
                    let all_healthy = set.iter().all(|s| s.is_healthy());
                    if any_down {
                        assert_eq!(overall, HealthStatus::Down, "{set:?}");
                    } else if all_healthy {
                        assert_eq!(overall, HealthStatus::Healthy, "{set:?}");
                    } else {
                        assert_eq!(overall, HealthStatus::Degraded, "{set:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn empty_is_healthy() {
        assert_eq!(HealthStatus::worst([]), HealthStatus::Healthy);
    }

    #[test]
    fn serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"critical\"");
        assert_eq!(serde_json::to_string(&HealthStatus::Down).unwrap(), "\"down\"");
    }
}
