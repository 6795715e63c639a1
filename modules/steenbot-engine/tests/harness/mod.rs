//! Recording fakes shared by the engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use steenbot_common::{Result, SteenBotError};
use steenbot_engine::{Action, ActionSink, EventHandler, EventProcessor, Route, RouteNotifier};
use steenbot_events::{Event, EventSource, EventType};

pub fn test_event(id: &str, event_type: EventType) -> Event {
    Event::new(EventSource::System, event_type, json!({"test": "data"})).with_id(id)
}

/// Shared, ordered log of what happened, across every fake that writes to it.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().iter().filter(|e| e.as_str() == entry).count()
    }
}

// ---------------------------------------------------------------------------
// Route notifier
// ---------------------------------------------------------------------------

pub struct RecordingNotifier {
    pub journal: Journal,
    /// Processor names whose notification fails.
    pub failing: Vec<String>,
}

impl RecordingNotifier {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            failing: Vec::new(),
        }
    }
}

#[async_trait]
impl RouteNotifier for RecordingNotifier {
    async fn notify(&self, route: &Route, _event: &Event) -> Result<()> {
        if self.failing.contains(&route.processor) {
            return Err(SteenBotError::Processing(format!("{} unreachable", route.processor)));
        }
        self.journal.push(route.processor.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Processors / handlers
// ---------------------------------------------------------------------------

pub struct RecordingProcessor {
    pub label: String,
    pub journal: Journal,
    pub fail: bool,
}

impl RecordingProcessor {
    pub fn new(label: &str, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_string(),
            journal: journal.clone(),
            fail: false,
        })
    }

    pub fn failing(label: &str, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_string(),
            journal: journal.clone(),
            fail: true,
        })
    }
}

#[async_trait]
impl EventProcessor for RecordingProcessor {
    async fn process(&self, event: &Event) -> Result<()> {
        self.journal.push(format!("{}:{}", self.label, event.id));
        if self.fail {
            return Err(SteenBotError::Processing("Processing failed".into()));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.label
    }
}

pub struct RecordingHandler {
    pub label: String,
    pub journal: Journal,
    pub fail_on: Option<String>,
}

impl RecordingHandler {
    pub fn new(label: &str, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_string(),
            journal: journal.clone(),
            fail_on: None,
        })
    }

    /// Fails when handling the event with this id.
    pub fn failing_on(label: &str, journal: &Journal, event_id: &str) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_string(),
            journal: journal.clone(),
            fail_on: Some(event_id.to_string()),
        })
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn handle(&self, event: &Event) -> Result<()> {
        if self.fail_on.as_deref() == Some(event.id.as_str()) {
            return Err(SteenBotError::Processing(format!("{} rejected {}", self.label, event.id)));
        }
        self.journal.push(format!("{}:{}", self.label, event.id));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Action sink
// ---------------------------------------------------------------------------

/// Records `channel:message` for notifications, `kind` for everything else.
pub struct RecordingSink {
    pub journal: Journal,
}

#[async_trait]
impl ActionSink for RecordingSink {
    async fn perform(&self, action: &Action, _event: &Event) -> Result<()> {
        match action {
            Action::SendNotification { channel, message } => {
                self.journal.push(format!("{channel}:{message}"))
            }
            other => self.journal.push(other.kind().to_string()),
        }
        Ok(())
    }
}
