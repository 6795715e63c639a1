use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::types::{Event, EventSource, EventType};

/// Query filter for [`crate::EventStore::query`]. The empty filter matches every event.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    event_types: Option<HashSet<EventType>>,
    sources: Option<HashSet<EventSource>>,
    correlation_id: Option<String>,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    limit: Option<usize>,
}

impl EventFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn event_types(mut self, types: impl IntoIterator<Item = EventType>) -> Self {
        self.event_types = Some(types.into_iter().collect());
        self
    }

    pub fn sources(mut self, sources: impl IntoIterator<Item = EventSource>) -> Self {
        self.sources = Some(sources.into_iter().collect());
        self
    }

    pub fn correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Inclusive lower bound on the event timestamp.
    pub fn since(mut self, ts: DateTime<Utc>) -> Self {
        self.since = Some(ts);
        self
    }

    /// Exclusive upper bound on the event timestamp.
    pub fn until(mut self, ts: DateTime<Utc>) -> Self {
        self.until = Some(ts);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn max_results(&self) -> Option<usize> {
        self.limit
    }

    pub fn matches(&self, event: &Event) -> bool {
        if let Some(ref types) = self.event_types {
            if !types.contains(&event.event_type) {
                return false;
            }
        }

        if let Some(ref sources) = self.sources {
            if !sources.contains(&event.source) {
                return false;
            }
        }

        if let Some(ref wanted) = self.correlation_id {
            if event.metadata.correlation_id.as_deref() != Some(wanted.as_str()) {
                return false;
            }
        }

        if let Some(since) = self.since {
            if event.timestamp < since {
                return false;
            }
        }

        if let Some(until) = self.until {
            if event.timestamp >= until {
                return false;
            }
        }

        true
    }

    pub fn is_wildcard(&self) -> bool {
        self.event_types.is_none()
            && self.sources.is_none()
            && self.correlation_id.is_none()
            && self.since.is_none()
            && self.until.is_none()
            && self.limit.is_none()
    }
}
