use std::sync::Arc;

use async_trait::async_trait;
use steenbot_common::Result;
use steenbot_events::Event;

use super::engine::RuleEngine;
use crate::traits::EventProcessor;

/// Runs the rule engine as a pipeline processor. Rule failures stay inside
/// the engine, so this processor never fails an ingest.
pub struct RuleEvaluationProcessor {
    engine: Arc<RuleEngine>,
}

impl RuleEvaluationProcessor {
    pub fn new(engine: Arc<RuleEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl EventProcessor for RuleEvaluationProcessor {
    async fn process(&self, event: &Event) -> Result<()> {
        self.engine.evaluate_event(event).await;
        Ok(())
    }

    fn name(&self) -> &str {
        "rule-evaluation"
    }
}
