use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use steenbot_common::{Result, SteenBotError};
use steenbot_events::Event;
use tracing::info;

type Callback = dyn Fn(Event) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync;

/// Caller-supplied side effect. Receives an owned copy of the event.
#[derive(Clone)]
pub struct CustomAction {
    name: String,
    callback: Arc<Callback>,
}

impl CustomAction {
    pub fn new<F, Fut>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            callback: Arc::new(move |event| callback(event).boxed()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, event: &Event) -> Result<()> {
        (self.callback)(event.clone())
            .await
            .map_err(|e| SteenBotError::Processing(format!("action {}: {e:#}", self.name)))
    }
}

impl fmt::Debug for CustomAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomAction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Serialize for CustomAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("CustomAction", 1)?;
        s.serialize_field("name", &self.name)?;
        s.end()
    }
}

/// A side effect triggered by a matching rule.
///
/// Built-in kinds are carried out by the engine's [`ActionSink`]. When a task
/// or sprint id is omitted the sink reads `task_id` / `sprint_id` from the
/// event payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Action {
    #[serde(rename = "send.notification")]
    SendNotification { channel: String, message: String },

    #[serde(rename = "update.task")]
    UpdateTask {
        #[serde(default)]
        task_id: Option<String>,
        #[serde(default)]
        fields: Value,
    },

    #[serde(rename = "create.task")]
    CreateTask {
        title: String,
        #[serde(default)]
        fields: Value,
    },

    #[serde(rename = "update.sprint")]
    UpdateSprint {
        #[serde(default)]
        sprint_id: Option<String>,
        #[serde(default)]
        fields: Value,
    },

    #[serde(rename = "custom", skip_deserializing)]
    Custom(CustomAction),
}

impl Action {
    pub fn notify(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SendNotification {
            channel: channel.into(),
            message: message.into(),
        }
    }

    pub fn custom<F, Fut>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::Custom(CustomAction::new(name, callback))
    }

    /// Short label for logs.
    pub fn kind(&self) -> &str {
        match self {
            Action::SendNotification { .. } => "send.notification",
            Action::UpdateTask { .. } => "update.task",
            Action::CreateTask { .. } => "create.task",
            Action::UpdateSprint { .. } => "update.sprint",
            Action::Custom(custom) => custom.name(),
        }
    }

    pub async fn execute(&self, event: &Event, sink: &dyn ActionSink) -> Result<()> {
        match self {
            Action::Custom(custom) => custom.run(event).await,
            builtin => sink.perform(builtin, event).await,
        }
    }
}

/// Carries out built-in actions against whatever systems the deployment
/// wires in (chat, trackers, adapters).
#[async_trait]
pub trait ActionSink: Send + Sync {
    async fn perform(&self, action: &Action, event: &Event) -> Result<()>;
}

#[async_trait]
impl<S: ActionSink + ?Sized> ActionSink for Arc<S> {
    async fn perform(&self, action: &Action, event: &Event) -> Result<()> {
        (**self).perform(action, event).await
    }
}

/// Default sink: logs what it would do.
pub struct LogActionSink;

#[async_trait]
impl ActionSink for LogActionSink {
    async fn perform(&self, action: &Action, event: &Event) -> Result<()> {
        match action {
            Action::SendNotification { channel, message } => {
                info!(event_id = %event.id, channel = %channel, message = %message, "Sending notification");
            }
            Action::UpdateTask { task_id, fields } => {
                let task_id = resolve_target(task_id, event, "task_id")?;
                info!(event_id = %event.id, task_id = %task_id, fields = %fields, "Updating task");
            }
            Action::CreateTask { title, fields } => {
                info!(event_id = %event.id, title = %title, fields = %fields, "Creating task");
            }
            Action::UpdateSprint { sprint_id, fields } => {
                let sprint_id = resolve_target(sprint_id, event, "sprint_id")?;
                info!(event_id = %event.id, sprint_id = %sprint_id, fields = %fields, "Updating sprint");
            }
            Action::Custom(custom) => {
                return Err(SteenBotError::Processing(format!(
                    "custom action {} cannot be performed by a sink",
                    custom.name()
                )))
            }
        }
        Ok(())
    }
}

/// Explicit id, else the string at `key` in the event payload.
pub fn resolve_target(explicit: &Option<String>, event: &Event, key: &str) -> Result<String> {
    if let Some(id) = explicit {
        return Ok(id.clone());
    }
    event
        .payload
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            SteenBotError::Processing(format!(
                "no {key} given and event {} payload has none",
                event.id
            ))
        })
}
