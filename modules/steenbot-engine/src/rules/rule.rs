use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use steenbot_common::Result;
use steenbot_events::Event;

use super::action::Action;
use super::condition::Condition;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleMetadata {
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// A named, prioritized unit of automation: every condition must hold for
/// the actions to run. Higher priority is evaluated first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<Action>,
    pub enabled: bool,
    pub metadata: RuleMetadata,
}

impl Rule {
    /// Enabled rule with priority 0, no conditions and no actions.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            priority: 0,
            conditions: Vec::new(),
            actions: Vec::new(),
            enabled: true,
            metadata: RuleMetadata {
                created: now,
                updated: now,
                created_by: "system".to_string(),
                tags: None,
            },
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn created_by(mut self, who: impl Into<String>) -> Self {
        self.metadata.created_by = who.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.metadata.tags.get_or_insert_with(Vec::new).push(tag.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Logical AND over the conditions; vacuously true when there are none.
    /// Stops at the first condition that fails or errors.
    pub fn matches(&self, event: &Event) -> Result<bool> {
        for condition in &self.conditions {
            if !condition.evaluate(event)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use steenbot_events::{EventSource, EventType};

    #[test]
    fn no_conditions_is_vacuously_true() {
        let rule = Rule::new("r", "empty");
        let event = Event::new(EventSource::User, EventType::Error, json!({}));
        assert!(rule.matches(&event).unwrap());
    }

    #[test]
    fn builder_collects_tags() {
        let rule = Rule::new("r", "tagged").with_tag("sprint").with_tag("alerts").disabled();
        assert_eq!(
            rule.metadata.tags,
            Some(vec!["sprint".to_string(), "alerts".to_string()])
        );
        assert!(!rule.enabled);
    }
}
