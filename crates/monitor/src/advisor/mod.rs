mod engine;
mod suggestion;

pub use engine::{OptimizationAdvisor, LATEST_SUGGESTIONS, SUGGESTIONS_CAP, SUGGESTIONS_TTL};
pub use suggestion::{suggest, Baselines, MetricReading, OptimizationSuggestion, Priority, SuggestionCategory};
