use std::time::Duration;

use vigil_common::keys::SUGGESTIONS_KEY;
use vigil_common::{MetricsSnapshot, RollingHistory, Severity};

use super::suggestion::{suggest, Baselines, OptimizationSuggestion, Priority};
use crate::context::Context;
use crate::locks::KeyedLocks;
use crate::notifier::Notification;

pub const SUGGESTIONS_CAP: usize = 100;
pub const SUGGESTIONS_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const LATEST_SUGGESTIONS: usize = 10;

#[derive(Clone)]
pub struct OptimizationAdvisor {
    ctx: Context,
    baselines: Baselines,
    locks: KeyedLocks,
}

impl OptimizationAdvisor {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            baselines: Baselines::default(),
            locks: KeyedLocks::new(),
        }
    }

    pub fn with_baselines(mut self, baselines: Baselines) -> Self {
        self.baselines = baselines;
        self
    }

    /// Compares the snapshot to the baselines, prepends the findings to the
    /// rolling history and notifies on each high-priority one.
    pub async fn analyze(&self, snapshot: &MetricsSnapshot) -> Vec<OptimizationSuggestion> {
        let suggestions = suggest(snapshot, &self.baselines, self.ctx.now_ms());
        if suggestions.is_empty() {
            return suggestions;
        }
        self.ctx.metrics.add_suggestions_emitted(suggestions.len() as u64);
        self.store(&suggestions).await;

        for s in suggestions.iter().filter(|s| s.priority == Priority::High) {
            tracing::warn!(category = s.category.as_str(), title = %s.title, "high priority optimization");
            let metadata = serde_json::to_value(s).unwrap_or_default();
            let notification = Notification::new(
                format!("High Priority Optimization Required: {}", s.title),
                s.notification_message(),
                Severity::Warning,
            )
            .with_metadata(metadata);
            self.ctx.hub.send(&notification).await;
        }
        suggestions
    }

    pub async fn history(&self) -> Vec<OptimizationSuggestion> {
        self.ctx
            .store
            .get::<Vec<OptimizationSuggestion>>(SUGGESTIONS_KEY)
            .await
            .unwrap_or_default()
    }

    pub async fn latest_suggestions(&self) -> Vec<OptimizationSuggestion> {
        let mut all = self.history().await;
        all.truncate(LATEST_SUGGESTIONS);
        all
    }

    async fn store(&self, batch: &[OptimizationSuggestion]) {
        let _guard = self.locks.lock(SUGGESTIONS_KEY).await;
        let mut history = RollingHistory::from_items(self.history().await, SUGGESTIONS_CAP);
        history.extend_front(batch.iter().cloned());
        let items = history.into_vec();
        if !self.ctx.store.set(SUGGESTIONS_KEY, &items, Some(SUGGESTIONS_TTL)).await {
            tracing::error!(count = batch.len(), "failed to persist optimization suggestions");
        }
    }
}
