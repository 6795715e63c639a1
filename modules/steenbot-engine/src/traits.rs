//! Contracts the pipeline drives. Implemented by callers.

use async_trait::async_trait;
use steenbot_common::Result;
use steenbot_events::Event;

/// Runs for every ingested event regardless of type.
#[async_trait]
pub trait EventProcessor: Send + Sync {
    async fn process(&self, event: &Event) -> Result<()>;

    /// Name used in logs.
    fn name(&self) -> &str {
        "processor"
    }
}

/// Runs for events of the type it was registered under.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &Event) -> Result<()>;
}

/// Notifies interested routes about an event.
#[async_trait]
pub trait EventRouter: Send + Sync {
    async fn route(&self, event: &Event) -> Result<()>;
}
