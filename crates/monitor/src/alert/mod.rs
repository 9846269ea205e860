mod book;
mod defaults;
mod engine;
mod rule;

pub use book::RuleBook;
pub use defaults::default_rules;
pub use engine::{AlertEngine, AlertEvent};
pub use rule::{AlertRule, Condition, RuleError, RuleUpdate};
