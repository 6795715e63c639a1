//! Prioritized, conditional automation rules.

pub mod action;
pub mod condition;
pub mod engine;
pub mod processor;
pub mod rule;
pub mod store;

pub use action::{Action, ActionSink, CustomAction, LogActionSink};
pub use condition::{Condition, CustomCondition};
pub use engine::RuleEngine;
pub use processor::RuleEvaluationProcessor;
pub use rule::{Rule, RuleMetadata};
pub use store::{MemoryRuleStore, RuleStore};
