//! RuleStore contract and an in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use steenbot_common::{Result, SteenBotError};

use super::rule::Rule;

/// Durable keyed storage of rules. The source of truth; the engine only
/// caches what it reads from here.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Insert or replace.
    async fn save(&self, rule: &Rule) -> Result<()>;

    /// Fails with `NotFound` if absent.
    async fn get(&self, id: &str) -> Result<Rule>;

    async fn get_all(&self) -> Result<Vec<Rule>>;

    /// Removing an absent id is a no-op.
    async fn delete(&self, id: &str) -> Result<()>;
}

#[async_trait]
impl<S: RuleStore + ?Sized> RuleStore for Arc<S> {
    async fn save(&self, rule: &Rule) -> Result<()> {
        (**self).save(rule).await
    }

    async fn get(&self, id: &str) -> Result<Rule> {
        (**self).get(id).await
    }

    async fn get_all(&self) -> Result<Vec<Rule>> {
        (**self).get_all().await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        (**self).delete(id).await
    }
}

/// In-memory rule store, insertion-ordered. Thread-safe.
#[derive(Default)]
pub struct MemoryRuleStore {
    rules: RwLock<Vec<Rule>>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with rules, e.g. loaded from a config file.
    pub fn with_rules(rules: impl IntoIterator<Item = Rule>) -> Self {
        let mut seeded: Vec<Rule> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for rule in rules {
            match positions.get(&rule.id) {
                Some(&pos) => seeded[pos] = rule,
                None => {
                    positions.insert(rule.id.clone(), seeded.len());
                    seeded.push(rule);
                }
            }
        }
        Self {
            rules: RwLock::new(seeded),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.rules.write().clear();
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn save(&self, rule: &Rule) -> Result<()> {
        let mut rules = self.rules.write();
        match rules.iter_mut().find(|r| r.id == rule.id) {
            Some(existing) => *existing = rule.clone(),
            None => rules.push(rule.clone()),
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Rule> {
        self.rules
            .read()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| SteenBotError::not_found("Rule", id))
    }

    async fn get_all(&self) -> Result<Vec<Rule>> {
        Ok(self.rules.read().clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.rules.write().retain(|r| r.id != id);
        Ok(())
    }
}
