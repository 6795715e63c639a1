use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use steenbot_common::Result;
use steenbot_engine::EventHandler;
use steenbot_events::Event;

/// Connection settings for one adapter instance. Credentials live here and
/// are never logged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrationConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub adapter_type: String,
    #[serde(default)]
    pub credentials: HashMap<String, Value>,
    #[serde(default)]
    pub settings: HashMap<String, Value>,
    #[serde(default)]
    pub enabled: bool,
}

impl IntegrationConfig {
    pub fn new(id: impl Into<String>, adapter_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            adapter_type: adapter_type.into(),
            enabled: true,
            ..Default::default()
        }
    }

    pub fn with_credential(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.credentials.insert(key.into(), value.into());
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// A named group of operations and emitted events an adapter offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationCapability {
    pub name: String,
    pub description: String,
    pub operations: Vec<String>,
    pub events: Vec<String>,
}

/// A pluggable connector to an external system.
///
/// Lifecycle methods are driven by the registry, never by callers directly.
/// Methods take `&self`; adapters keep their own connection state internally.
#[async_trait]
pub trait IntegrationAdapter: Send + Sync {
    fn id(&self) -> &str;

    fn adapter_type(&self) -> &str;

    fn version(&self) -> &str;

    fn config(&self) -> &IntegrationConfig;

    async fn initialize(&self) -> Result<()>;

    async fn connect(&self) -> Result<()>;

    async fn disconnect(&self) -> Result<()>;

    /// `Ok(false)` means the adapter is misconfigured; `Err` means the check
    /// itself could not run.
    async fn validate(&self) -> Result<bool>;

    /// Deliver inbound events from the external system to `handler`.
    async fn subscribe(&self, handler: Arc<dyn EventHandler>) -> Result<()>;

    async fn unsubscribe(&self) -> Result<()>;

    /// Push an event out to the external system.
    async fn publish(&self, event: &Event) -> Result<()>;

    fn capabilities(&self) -> Vec<IntegrationCapability>;

    fn supports_operation(&self, operation: &str) -> bool {
        self.capabilities()
            .iter()
            .any(|cap| cap.operations.iter().any(|op| op == operation))
    }

    /// Fails if the operation is unsupported.
    async fn execute_operation(&self, operation: &str, params: Value) -> Result<Value>;
}
