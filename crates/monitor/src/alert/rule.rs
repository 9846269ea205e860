use serde::{Deserialize, Serialize};
use vigil_common::snapshot::split_metric_path;
use vigil_common::Severity;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Condition {
    #[serde(rename = "gt")]
    GreaterThan,
    #[serde(rename = "lt")]
    LessThan,
    #[serde(rename = "eq")]
    Equal,
    #[serde(rename = "gte")]
    GreaterOrEqual,
    #[serde(rename = "lte")]
    LessOrEqual,
}

impl Condition {
    pub fn evaluate(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::GreaterThan => value > threshold,
            Self::LessThan => value < threshold,
            Self::GreaterOrEqual => value >= threshold,
            Self::LessOrEqual => value <= threshold,
            Self::Equal => (value - threshold).abs() < f64::EPSILON,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::Equal => "=",
            Self::GreaterOrEqual => ">=",
            Self::LessOrEqual => "<=",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Dotted `group.field` path into a snapshot.
    pub metric: String,
    pub condition: Condition,
    pub threshold: f64,
    pub severity: Severity,
    #[serde(default = "yes")]
    pub enabled: bool,
    pub cooldown_minutes: u32,
    #[serde(default)]
    pub last_triggered_ms: Option<i64>,
    /// Hub channel names to notify. Empty means every channel.
    #[serde(default)]
    pub channels: Vec<String>,
}

fn yes() -> bool {
    true
}

impl AlertRule {
    pub fn cooldown_ms(&self) -> i64 {
        self.cooldown_minutes as i64 * 60 * 1000
    }

    pub fn cooldown_elapsed(&self, now_ms: i64) -> bool {
        match self.last_triggered_ms {
            None => true,
            Some(last) => now_ms - last >= self.cooldown_ms(),
        }
    }

    pub fn message(&self, value: f64) -> String {
        format!(
            "{}\n\nMetric: {}\nCurrent Value: {}\nThreshold: {} {}",
            self.description,
            self.metric,
            value,
            self.condition.symbol(),
            self.threshold
        )
    }

    pub fn validate(&self) -> Result<(), RuleError> {
        if self.id.trim().is_empty() {
            return Err(RuleError::Invalid("rule id must not be empty".into()));
        }
        if split_metric_path(&self.metric).is_none() {
            return Err(RuleError::Invalid(format!(
                "metric path '{}' must be group.field",
                self.metric
            )));
        }
        if !self.threshold.is_finite() {
            return Err(RuleError::Invalid("threshold must be finite".into()));
        }
        Ok(())
    }
}

/// Partial update. `None` leaves a field unchanged; the trigger timestamp is
/// owned by evaluation and cannot be patched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RuleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub metric: Option<String>,
    pub condition: Option<Condition>,
    pub threshold: Option<f64>,
    pub severity: Option<Severity>,
    pub enabled: Option<bool>,
    pub cooldown_minutes: Option<u32>,
    pub channels: Option<Vec<String>>,
}

impl RuleUpdate {
    pub fn apply(self, rule: &mut AlertRule) {
        if let Some(v) = self.name {
            rule.name = v;
        }
        if let Some(v) = self.description {
            rule.description = v;
        }
        if let Some(v) = self.metric {
            rule.metric = v;
        }
        if let Some(v) = self.condition {
            rule.condition = v;
        }
        if let Some(v) = self.threshold {
            rule.threshold = v;
        }
        if let Some(v) = self.severity {
            rule.severity = v;
        }
        if let Some(v) = self.enabled {
            rule.enabled = v;
        }
        if let Some(v) = self.cooldown_minutes {
            rule.cooldown_minutes = v;
        }
        if let Some(v) = self.channels {
            rule.channels = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuleError {
    Invalid(String),
    Duplicate(String),
    NotFound(String),
}

impl std::fmt::Display for RuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(msg) => write!(f, "invalid rule: {msg}"),
            Self::Duplicate(id) => write!(f, "rule already exists: {id}"),
            Self::NotFound(id) => write!(f, "rule not found: {id}"),
        }
    }
}

impl std::error::Error for RuleError {}
