use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::rule::{AlertRule, RuleError, RuleUpdate};
use crate::locks::KeyedLocks;

/// Owned rule collection. Every mutation of a rule happens under that rule's lock.
#[derive(Clone, Default)]
pub struct RuleBook {
    rules: Arc<DashMap<String, AlertRule>>,
    locks: KeyedLocks,
}

impl RuleBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_rule(&self, rule: AlertRule) -> Result<(), RuleError> {
        rule.validate()?;
        let _guard = self.locks.lock(&rule.id).await;
        match self.rules.entry(rule.id.clone()) {
            Entry::Occupied(_) => Err(RuleError::Duplicate(rule.id)),
            Entry::Vacant(slot) => {
                tracing::info!(rule_id = %rule.id, metric = %rule.metric, "alert rule added");
                slot.insert(rule);
                Ok(())
            }
        }
    }

    pub async fn update_rule(&self, id: &str, update: RuleUpdate) -> Result<AlertRule, RuleError> {
        let _guard = self.locks.lock(id).await;
        let mut entry = self
            .rules
            .get_mut(id)
            .ok_or_else(|| RuleError::NotFound(id.to_string()))?;
        let mut patched = entry.clone();
        update.apply(&mut patched);
        patched.validate()?;
        *entry = patched.clone();
        Ok(patched)
    }

    pub async fn delete_rule(&self, id: &str) -> bool {
        let removed = {
            let _guard = self.locks.lock(id).await;
            self.rules.remove(id).is_some()
        };
        if removed {
            self.locks.forget(id);
        }
        removed
    }

    pub fn get_rule(&self, id: &str) -> Option<AlertRule> {
        self.rules.get(id).map(|r| r.clone())
    }

    pub fn list_rules(&self) -> Vec<AlertRule> {
        let mut rules: Vec<AlertRule> = self.rules.iter().map(|r| r.value().clone()).collect();
        rules.sort_by(|a, b| a.id.cmp(&b.id));
        rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Stamps `last_triggered_ms` if the rule is still enabled and out of
    /// cooldown. Returns the rule as it was fired, or `None` if suppressed.
    pub async fn try_fire(&self, id: &str, now_ms: i64) -> Option<AlertRule> {
        let _guard = self.locks.lock(id).await;
        let mut rule = self.rules.get_mut(id)?;
        if !rule.enabled || !rule.cooldown_elapsed(now_ms) {
            return None;
        }
        rule.last_triggered_ms = Some(now_ms);
        Some(rule.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::rule::Condition;
    use vigil_common::Severity;

    fn rule(id: &str) -> AlertRule {
        AlertRule {
            id: id.into(),
            name: format!("rule {id}"),
            description: String::new(),
            metric: "application.error_rate".into(),
            condition: Condition::GreaterThan,
            threshold: 0.05,
            severity: Severity::Critical,
            enabled: true,
            cooldown_minutes: 2,
            last_triggered_ms: None,
            channels: Vec::new(),
        }
    }

    #[tokio::test]
    async fn crud_cycle() {
        let book = RuleBook::new();
        book.add_rule(rule("b")).await.unwrap();
        book.add_rule(rule("a")).await.unwrap();
        assert_eq!(
            book.list_rules().iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );

        let updated = book
            .update_rule("a", RuleUpdate {
                threshold: Some(0.2),
                ..RuleUpdate::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.threshold, 0.2);
        assert_eq!(book.get_rule("a").unwrap().threshold, 0.2);

        assert!(book.delete_rule("a").await);
        assert!(!book.delete_rule("a").await);
        assert_eq!(book.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_and_missing_ids() {
        let book = RuleBook::new();
        book.add_rule(rule("a")).await.unwrap();
        assert_eq!(book.add_rule(rule("a")).await, Err(RuleError::Duplicate("a".into())));
        let err = book.update_rule("zzz", RuleUpdate::default()).await.unwrap_err();
        assert_eq!(err, RuleError::NotFound("zzz".into()));
    }

    #[tokio::test]
    async fn invalid_update_leaves_rule_untouched() {
        let book = RuleBook::new();
        book.add_rule(rule("a")).await.unwrap();
        let err = book
            .update_rule("a", RuleUpdate {
                metric: Some("nodots".into()),
                ..RuleUpdate::default()
            })
            .await;
        assert!(matches!(err, Err(RuleError::Invalid(_))));
        assert_eq!(book.get_rule("a").unwrap().metric, "application.error_rate");
    }

    #[tokio::test]
    async fn try_fire_respects_cooldown_and_enabled() {
        let book = RuleBook::new();
        book.add_rule(rule("a")).await.unwrap();
        assert!(book.try_fire("a", 0).await.is_some());
        assert!(book.try_fire("a", 60_000).await.is_none());
        assert!(book.try_fire("a", 120_000).await.is_some());
        assert_eq!(book.get_rule("a").unwrap().last_triggered_ms, Some(120_000));

        book.update_rule("a", RuleUpdate {
            enabled: Some(false),
            ..RuleUpdate::default()
        })
        .await
        .unwrap();
        assert!(book.try_fire("a", 10_000_000).await.is_none());
        assert!(book.try_fire("missing", 0).await.is_none());
    }
}
