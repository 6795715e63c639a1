//! EventStore contract and an in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use steenbot_common::{Result, SteenBotError};
use tracing::debug;

use crate::filter::EventFilter;
use crate::types::Event;

// ---------------------------------------------------------------------------
// EventStore
// ---------------------------------------------------------------------------

/// Durable keyed storage of events.
///
/// Implemented by whatever persistence backend the deployment uses and by
/// [`MemoryEventStore`] for tests. Also implemented for `Arc<S>` so a store can
/// be shared with test assertions.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Write an event. Events are written once: re-saving an identical event
    /// is accepted, a different event under a known id is a `Validation` error.
    async fn save(&self, event: &Event) -> Result<()>;

    /// Read one event. Fails with `NotFound` if absent.
    async fn get(&self, id: &str) -> Result<Event>;

    /// Events matching `filter`, in store order. An empty filter returns all events.
    async fn query(&self, filter: &EventFilter) -> Result<Vec<Event>>;
}

#[async_trait]
impl<S: EventStore + ?Sized> EventStore for Arc<S> {
    async fn save(&self, event: &Event) -> Result<()> {
        (**self).save(event).await
    }

    async fn get(&self, id: &str) -> Result<Event> {
        (**self).get(id).await
    }

    async fn query(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        (**self).query(filter).await
    }
}

// ---------------------------------------------------------------------------
// MemoryEventStore (tests and local runs)
// ---------------------------------------------------------------------------

/// In-memory event store. Keeps insertion order; re-saving an identical
/// event is a no-op and a conflicting one is rejected. Thread-safe.
#[derive(Default)]
pub struct MemoryEventStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    events: Vec<Event>,
    index: HashMap<String, usize>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read all stored events (for test assertions).
    pub fn events(&self) -> Vec<Event> {
        self.inner.read().events.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.events.clear();
        inner.index.clear();
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn save(&self, event: &Event) -> Result<()> {
        let mut inner = self.inner.write();
        match inner.index.get(&event.id).copied() {
            Some(pos) if inner.events[pos] == *event => {}
            Some(_) => {
                return Err(SteenBotError::Validation(format!(
                    "event {} already stored with different content",
                    event.id
                )))
            }
            None => {
                let pos = inner.events.len();
                inner.index.insert(event.id.clone(), pos);
                inner.events.push(event.clone());
            }
        }
        debug!(event_id = %event.id, event_type = %event.event_type, "Event saved");
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Event> {
        let inner = self.inner.read();
        inner
            .index
            .get(id)
            .map(|&pos| inner.events[pos].clone())
            .ok_or_else(|| SteenBotError::not_found("Event", id))
    }

    async fn query(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        let inner = self.inner.read();
        let matches = inner.events.iter().filter(|e| filter.matches(e)).cloned();
        Ok(match filter.max_results() {
            Some(limit) => matches.take(limit).collect(),
            None => matches.collect(),
        })
    }
}
