//! Rule evaluation with per-rule fault isolation.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use steenbot_common::{with_timeout, Result};
use steenbot_events::Event;
use tracing::{debug, error, info};

use super::action::{ActionSink, LogActionSink};
use super::rule::Rule;
use super::store::RuleStore;

/// Holds a disposable cache of the enabled rules; the store stays authoritative.
///
/// Writes go to the store first, then the cache is reconciled. Reads
/// (`get_rule`, `get_rules`) pass straight through to the store so callers
/// see disabled rules too.
pub struct RuleEngine {
    store: Arc<dyn RuleStore>,
    sink: Arc<dyn ActionSink>,
    active: RwLock<Vec<Rule>>,
    call_timeout: Option<Duration>,
}

impl RuleEngine {
    /// Build an engine and seed the cache with the store's enabled rules.
    pub async fn load(store: Arc<dyn RuleStore>) -> Result<Self> {
        Self::load_with_sink(store, Arc::new(LogActionSink)).await
    }

    pub async fn load_with_sink(store: Arc<dyn RuleStore>, sink: Arc<dyn ActionSink>) -> Result<Self> {
        let engine = Self {
            store,
            sink,
            active: RwLock::new(Vec::new()),
            call_timeout: None,
        };
        engine.reload().await?;
        Ok(engine)
    }

    /// Bound each condition-matched action. Expiry counts as a rule failure.
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Discard the cache and re-seed it from the store.
    pub async fn reload(&self) -> Result<()> {
        let enabled: Vec<Rule> = self
            .store
            .get_all()
            .await?
            .into_iter()
            .filter(|r| r.enabled)
            .collect();
        info!(active = enabled.len(), "Rule cache loaded");
        *self.active.write() = enabled;
        Ok(())
    }

    pub async fn add_rule(&self, rule: Rule) -> Result<()> {
        self.store.save(&rule).await?;
        if rule.enabled {
            self.cache_insert(rule);
        }
        Ok(())
    }

    /// Persist, then cache if enabled or evict if disabled.
    pub async fn update_rule(&self, rule: Rule) -> Result<()> {
        self.store.save(&rule).await?;
        if rule.enabled {
            self.cache_insert(rule);
        } else {
            self.cache_evict(&rule.id);
        }
        Ok(())
    }

    pub async fn remove_rule(&self, rule_id: &str) -> Result<()> {
        self.store.delete(rule_id).await?;
        self.cache_evict(rule_id);
        Ok(())
    }

    pub async fn get_rule(&self, rule_id: &str) -> Result<Rule> {
        self.store.get(rule_id).await
    }

    pub async fn get_rules(&self) -> Result<Vec<Rule>> {
        self.store.get_all().await
    }

    pub async fn enable_rule(&self, rule_id: &str) -> Result<()> {
        self.set_enabled(rule_id, true).await
    }

    pub async fn disable_rule(&self, rule_id: &str) -> Result<()> {
        self.set_enabled(rule_id, false).await
    }

    async fn set_enabled(&self, rule_id: &str, enabled: bool) -> Result<()> {
        let mut rule = self.get_rule(rule_id).await?;
        rule.enabled = enabled;
        self.update_rule(rule).await
    }

    /// Ids of the cached rules in evaluation order.
    pub fn active_rule_ids(&self) -> Vec<String> {
        self.snapshot().into_iter().map(|r| r.id).collect()
    }

    /// Run every cached rule against `event`, highest priority first.
    ///
    /// A rule whose conditions all hold has its actions executed in order,
    /// each awaited before the next. Any failure inside a rule is logged and
    /// evaluation moves on; nothing is returned to the caller.
    pub async fn evaluate_event(&self, event: &Event) {
        for rule in self.snapshot() {
            match self.apply(&rule, event).await {
                Ok(true) => debug!(rule_id = %rule.id, event_id = %event.id, "Rule fired"),
                Ok(false) => {}
                Err(e) => error!(
                    rule_id = %rule.id,
                    event_id = %event.id,
                    error = %e,
                    "Error evaluating rule {}",
                    rule.id
                ),
            }
        }
    }

    async fn apply(&self, rule: &Rule, event: &Event) -> Result<bool> {
        if !rule.matches(event)? {
            return Ok(false);
        }
        for action in &rule.actions {
            let operation = format!("rule {} action {}", rule.id, action.kind());
            with_timeout(&operation, self.call_timeout, action.execute(event, self.sink.as_ref()))
                .await?;
        }
        Ok(true)
    }

    /// Cached rules sorted by priority, descending; ties keep cache order.
    fn snapshot(&self) -> Vec<Rule> {
        let mut rules = self.active.read().clone();
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        rules
    }

    fn cache_insert(&self, rule: Rule) {
        let mut active = self.active.write();
        match active.iter_mut().find(|r| r.id == rule.id) {
            Some(existing) => *existing = rule,
            None => active.push(rule),
        }
    }

    fn cache_evict(&self, rule_id: &str) {
        self.active.write().retain(|r| r.id != rule_id);
    }
}
