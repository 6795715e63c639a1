//! Capability-declaring adapters for the trackers the bot knows about.
//!
//! A `CatalogAdapter` carries no transport of its own: it declares what the
//! external system can do, tracks its connection state, and hands inbound
//! events to a subscribed handler. Wire-level clients plug in behind it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};
use steenbot_common::{Result, SteenBotError};
use steenbot_engine::EventHandler;
use steenbot_events::Event;
use tracing::{debug, info, warn};

use crate::adapter::{IntegrationAdapter, IntegrationCapability, IntegrationConfig};

const CATALOG_VERSION: &str = "1.0.0";

pub struct CatalogAdapter {
    config: IntegrationConfig,
    capabilities: Vec<IntegrationCapability>,
    required_credentials: Vec<&'static str>,
    initialized: AtomicBool,
    connected: AtomicBool,
    handler: RwLock<Option<Arc<dyn EventHandler>>>,
}

fn capability(name: &str, description: &str, operations: &[&str], events: &[&str]) -> IntegrationCapability {
    IntegrationCapability {
        name: name.to_string(),
        description: description.to_string(),
        operations: operations.iter().map(|s| s.to_string()).collect(),
        events: events.iter().map(|s| s.to_string()).collect(),
    }
}

impl CatalogAdapter {
    pub fn new(config: IntegrationConfig, capabilities: Vec<IntegrationCapability>) -> Self {
        Self {
            config,
            capabilities,
            required_credentials: Vec::new(),
            initialized: AtomicBool::new(false),
            connected: AtomicBool::new(false),
            handler: RwLock::new(None),
        }
    }

    /// Credential keys that must be present and non-empty for `validate` to pass.
    pub fn requiring(mut self, keys: &[&'static str]) -> Self {
        self.required_credentials = keys.to_vec();
        self
    }

    /// GitHub issues and pull requests. Needs `token` and `organization`.
    pub fn github(config: IntegrationConfig) -> Self {
        Self::new(
            config,
            vec![
                capability(
                    "issues",
                    "GitHub Issues management",
                    &["create", "update", "close", "comment"],
                    &["issue.created", "issue.updated", "issue.closed"],
                ),
                capability(
                    "pull_requests",
                    "GitHub Pull Requests management",
                    &["create", "update", "merge", "review"],
                    &["pr.created", "pr.updated", "pr.merged"],
                ),
            ],
        )
        .requiring(&["token", "organization"])
    }

    /// Jira issues and sprints. Needs `url`, `username` and `token`.
    pub fn jira(config: IntegrationConfig) -> Self {
        Self::new(
            config,
            vec![
                capability(
                    "issues",
                    "JIRA Issues management",
                    &["create", "update", "transition", "comment"],
                    &["issue.created", "issue.updated", "issue.transitioned"],
                ),
                capability(
                    "sprints",
                    "JIRA Sprint management",
                    &["create", "update", "start", "complete"],
                    &["sprint.created", "sprint.updated", "sprint.started"],
                ),
            ],
        )
        .requiring(&["url", "username", "token"])
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Feed an inbound event from the external system to the subscriber.
    /// Events arriving with no subscriber are dropped.
    pub async fn deliver(&self, event: &Event) -> Result<()> {
        let handler = self.handler.read().clone();
        match handler {
            Some(handler) => handler.handle(event).await,
            None => {
                debug!(adapter_id = %self.config.id, event_id = %event.id, "No subscriber, dropping inbound event");
                Ok(())
            }
        }
    }

    fn missing_credentials(&self) -> Vec<&'static str> {
        self.required_credentials
            .iter()
            .copied()
            .filter(|key| match self.config.credentials.get(*key) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            })
            .collect()
    }

    fn require_connected(&self, what: &str) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(SteenBotError::Connection(format!(
                "adapter {} is not connected; cannot {what}",
                self.config.id
            )))
        }
    }
}

#[async_trait]
impl IntegrationAdapter for CatalogAdapter {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn adapter_type(&self) -> &str {
        &self.config.adapter_type
    }

    fn version(&self) -> &str {
        CATALOG_VERSION
    }

    fn config(&self) -> &IntegrationConfig {
        &self.config
    }

    async fn initialize(&self) -> Result<()> {
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn connect(&self) -> Result<()> {
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(SteenBotError::Connection(format!(
                "adapter {} connected before initialize",
                self.config.id
            )));
        }
        self.connected.store(true, Ordering::SeqCst);
        info!(adapter_id = %self.config.id, adapter_type = %self.config.adapter_type, "Adapter connected");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        info!(adapter_id = %self.config.id, "Adapter disconnected");
        Ok(())
    }

    async fn validate(&self) -> Result<bool> {
        if !self.config.enabled {
            return Ok(false);
        }
        let missing = self.missing_credentials();
        if !missing.is_empty() {
            warn!(adapter_id = %self.config.id, missing = ?missing, "Adapter is missing required credentials");
            return Ok(false);
        }
        Ok(true)
    }

    async fn subscribe(&self, handler: Arc<dyn EventHandler>) -> Result<()> {
        *self.handler.write() = Some(handler);
        Ok(())
    }

    async fn unsubscribe(&self) -> Result<()> {
        *self.handler.write() = None;
        Ok(())
    }

    /// With no wire client behind it, a published event loops back to the
    /// subscriber.
    async fn publish(&self, event: &Event) -> Result<()> {
        self.require_connected("publish")?;
        debug!(adapter_id = %self.config.id, event_id = %event.id, event_type = %event.event_type, "Publishing event");
        self.deliver(event).await
    }

    fn capabilities(&self) -> Vec<IntegrationCapability> {
        self.capabilities.clone()
    }

    async fn execute_operation(&self, operation: &str, params: Value) -> Result<Value> {
        if !self.supports_operation(operation) {
            return Err(SteenBotError::Validation(format!(
                "Operation {operation} not supported by {}",
                self.config.id
            )));
        }
        self.require_connected(operation)?;
        debug!(adapter_id = %self.config.id, operation, "Executing operation");
        Ok(json!({
            "adapter": self.config.id,
            "operation": operation,
            "params": params,
            "accepted": true,
        }))
    }
}
