//! The ingest pipeline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use steenbot_common::{with_timeout, Result};
use steenbot_events::{Event, EventFilter, EventStore, EventType};
use tracing::{error, info, warn};

use crate::traits::{EventHandler, EventProcessor, EventRouter};

/// What replay does when one event's ingest fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayPolicy {
    /// Return the first error; later matched events are not ingested.
    #[default]
    StopOnError,
    /// Ingest every matched event and report failures in the summary.
    ContinueOnError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub matched: usize,
    pub succeeded: usize,
    /// (event id, error message) for each failed ingest.
    pub failed: Vec<(String, String)>,
}

/// Store → route → process → handle, sequential and fail-fast.
///
/// Steps already completed are never undone: a failed ingest may still leave
/// the event persisted.
pub struct EventPipeline {
    router: Arc<dyn EventRouter>,
    store: Arc<dyn EventStore>,
    processors: RwLock<Vec<Arc<dyn EventProcessor>>>,
    handlers: RwLock<HashMap<EventType, Vec<Arc<dyn EventHandler>>>>,
    replay_policy: ReplayPolicy,
    call_timeout: Option<Duration>,
}

impl EventPipeline {
    pub fn new(router: Arc<dyn EventRouter>, store: Arc<dyn EventStore>) -> Self {
        Self {
            router,
            store,
            processors: RwLock::new(Vec::new()),
            handlers: RwLock::new(HashMap::new()),
            replay_policy: ReplayPolicy::default(),
            call_timeout: None,
        }
    }

    pub fn with_processors(self, processors: Vec<Arc<dyn EventProcessor>>) -> Self {
        *self.processors.write() = processors;
        self
    }

    pub fn with_replay_policy(mut self, policy: ReplayPolicy) -> Self {
        self.replay_policy = policy;
        self
    }

    /// Bound every awaited collaborator call. Expiry fails the ingest.
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    /// Append a handler for one event type. Handlers run in registration order.
    pub fn register_handler(&self, event_type: EventType, handler: Arc<dyn EventHandler>) {
        self.handlers
            .write()
            .entry(event_type)
            .or_default()
            .push(handler);
    }

    /// Append a processor that runs for every event.
    pub fn add_processor(&self, processor: Arc<dyn EventProcessor>) {
        self.processors.write().push(processor);
    }

    pub async fn ingest(&self, event: &Event) -> Result<()> {
        if let Err(e) = self.run_steps(event).await {
            error!(event_id = %event.id, event_type = %event.event_type, error = %e, "Error processing event");
            return Err(e);
        }
        Ok(())
    }

    async fn run_steps(&self, event: &Event) -> Result<()> {
        let limit = self.call_timeout;

        // 1. Persist
        with_timeout("event store save", limit, self.store.save(event)).await?;

        // 2. Route
        with_timeout("route", limit, self.router.route(event)).await?;

        // 3. Processors, registration order. Snapshot so no lock is held across awaits.
        let processors: Vec<_> = self.processors.read().clone();
        for processor in processors {
            with_timeout(processor.name(), limit, processor.process(event)).await?;
        }

        // 4. Handlers for this type, registration order
        let handlers = self
            .handlers
            .read()
            .get(&event.event_type)
            .cloned()
            .unwrap_or_default();
        for handler in handlers {
            with_timeout("event handler", limit, handler.handle(event)).await?;
        }

        Ok(())
    }

    /// Re-ingest stored events matching `filter`, one at a time, in query order.
    /// Every side effect runs again; replay is only as idempotent as the
    /// collaborators are.
    pub async fn replay_events(&self, filter: &EventFilter) -> Result<ReplaySummary> {
        let events = with_timeout("event store query", self.call_timeout, self.store.query(filter)).await?;

        let mut summary = ReplaySummary {
            matched: events.len(),
            ..Default::default()
        };
        info!(matched = summary.matched, policy = ?self.replay_policy, "Replaying events");

        for event in &events {
            match self.ingest(event).await {
                Ok(()) => summary.succeeded += 1,
                Err(e) => match self.replay_policy {
                    ReplayPolicy::StopOnError => return Err(e),
                    ReplayPolicy::ContinueOnError => {
                        warn!(event_id = %event.id, error = %e, "Replay continuing past failed event");
                        summary.failed.push((event.id.clone(), e.to_string()));
                    }
                },
            }
        }

        Ok(summary)
    }
}
