//! Event routing, the ingest pipeline and the rule engine.
//!
//! The pipeline drives store → route → process → handle for each event,
//! strictly in that order and fail-fast. The rule engine evaluates a
//! prioritized rule set against an event and isolates failures per rule.
//! Both depend on stores only through the traits in `steenbot-events` and
//! [`rules::RuleStore`].

pub mod pipeline;
pub mod router;
pub mod rules;
pub mod traits;

pub use pipeline::{EventPipeline, ReplayPolicy, ReplaySummary};
pub use router::{DefaultEventRouter, LogNotifier, Route, RouteNotifier};
pub use rules::{
    Action, ActionSink, Condition, CustomAction, CustomCondition, LogActionSink, MemoryRuleStore,
    Rule, RuleEngine, RuleEvaluationProcessor, RuleMetadata, RuleStore,
};
pub use traits::{EventHandler, EventProcessor, EventRouter};
