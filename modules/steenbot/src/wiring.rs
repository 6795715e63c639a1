//! Assembles stores, pipeline, rule engine, registry and bot from [`Config`].

use std::sync::Arc;

use async_trait::async_trait;
use steenbot_common::{Config, Result};
use steenbot_engine::{
    DefaultEventRouter, EventHandler, EventPipeline, EventProcessor, MemoryRuleStore, ReplayPolicy,
    RuleEngine, RuleEvaluationProcessor,
};
use steenbot_events::{Event, MemoryEventStore};
use steenbot_integrations::{CatalogAdapter, IntegrationAdapter, IntegrationConfig, IntegrationRegistry};
use tracing::info;

use crate::bot::{BotConfig, SteenBot};

pub struct Runtime {
    pub events: Arc<MemoryEventStore>,
    pub rules: Arc<RuleEngine>,
    pub pipeline: Arc<EventPipeline>,
    pub registry: Arc<IntegrationRegistry>,
    pub bot: SteenBot,
}

impl Runtime {
    /// Stop polling, then disconnect every adapter.
    pub async fn shutdown(&self) -> Result<()> {
        self.bot.stop().await?;
        self.registry.shutdown().await
    }
}

/// Inbound adapter events enter the pipeline like any other event.
struct IngestHandler {
    pipeline: Arc<EventPipeline>,
}

#[async_trait]
impl EventHandler for IngestHandler {
    async fn handle(&self, event: &Event) -> Result<()> {
        self.pipeline.ingest(event).await
    }
}

pub async fn build(config: &Config) -> Result<Runtime> {
    let events = Arc::new(MemoryEventStore::new());
    let rules = Arc::new(
        RuleEngine::load(Arc::new(MemoryRuleStore::new()))
            .await?
            .with_call_timeout(config.call_timeout),
    );

    let replay_policy = if config.replay_continue_on_error {
        ReplayPolicy::ContinueOnError
    } else {
        ReplayPolicy::StopOnError
    };
    let pipeline = Arc::new(
        EventPipeline::new(Arc::new(DefaultEventRouter::new()), events.clone())
            .with_processors(vec![
                Arc::new(RuleEvaluationProcessor::new(rules.clone())) as Arc<dyn EventProcessor>
            ])
            .with_replay_policy(replay_policy)
            .with_call_timeout(config.call_timeout),
    );

    let registry = Arc::new(IntegrationRegistry::new().with_call_timeout(config.call_timeout));
    let mut adapters: Vec<CatalogAdapter> = Vec::new();
    if config.github_enabled {
        let integration = with_credentials(
            IntegrationConfig::new("github", "github"),
            [
                ("token", &config.github_token),
                ("organization", &config.github_organization),
            ],
        );
        adapters.push(CatalogAdapter::github(integration));
    }
    if config.jira_enabled {
        let integration = with_credentials(
            IntegrationConfig::new("jira", "jira"),
            [
                ("url", &config.jira_url),
                ("username", &config.jira_username),
                ("token", &config.jira_token),
            ],
        );
        adapters.push(CatalogAdapter::jira(integration));
    }
    for adapter in adapters {
        let adapter: Arc<dyn IntegrationAdapter> = Arc::new(adapter);
        registry.register_adapter(adapter.clone()).await?;
        adapter
            .subscribe(Arc::new(IngestHandler {
                pipeline: pipeline.clone(),
            }))
            .await?;
    }
    info!(adapters = registry.len(), rules = rules.active_rule_ids().len(), "Runtime assembled");

    let bot = SteenBot::new(BotConfig::from(config), pipeline.clone());

    Ok(Runtime {
        events,
        rules,
        pipeline,
        registry,
        bot,
    })
}

/// Copy the credentials that are set; missing ones fail the adapter's validation.
fn with_credentials<const N: usize>(
    mut integration: IntegrationConfig,
    credentials: [(&str, &Option<String>); N],
) -> IntegrationConfig {
    for (key, value) in credentials {
        if let Some(value) = value {
            integration = integration.with_credential(key, value.clone());
        }
    }
    integration
}
