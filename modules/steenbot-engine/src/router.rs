//! Priority-ordered route notification.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use steenbot_common::Result;
use steenbot_events::{Event, EventType};
use tracing::{info, warn};

use crate::traits::EventRouter;

/// A declared interest in events of one type. Holds a processor name, not a
/// reference to the processor itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub event_type: EventType,
    pub processor: String,
    pub priority: i32,
}

/// Delivers a single route notification. Downstream infrastructure decides
/// what a notification means.
#[async_trait]
pub trait RouteNotifier: Send + Sync {
    async fn notify(&self, route: &Route, event: &Event) -> Result<()>;
}

/// Default notifier: one log line per route.
pub struct LogNotifier;

#[async_trait]
impl RouteNotifier for LogNotifier {
    async fn notify(&self, route: &Route, event: &Event) -> Result<()> {
        info!(
            event_id = %event.id,
            event_type = %event.event_type,
            processor = %route.processor,
            priority = route.priority,
            "Routing event to processor"
        );
        Ok(())
    }
}

pub struct DefaultEventRouter {
    routes: RwLock<HashMap<EventType, Vec<Route>>>,
    notifier: Arc<dyn RouteNotifier>,
}

impl Default for DefaultEventRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultEventRouter {
    pub fn new() -> Self {
        Self::with_notifier(Arc::new(LogNotifier))
    }

    pub fn with_notifier(notifier: Arc<dyn RouteNotifier>) -> Self {
        Self {
            routes: RwLock::new(HashMap::new()),
            notifier,
        }
    }

    pub fn add_route(&self, event_type: EventType, processor: impl Into<String>, priority: i32) {
        let route = Route {
            event_type: event_type.clone(),
            processor: processor.into(),
            priority,
        };
        self.routes.write().entry(event_type).or_default().push(route);
    }

    /// Remove every route for this exact (type, processor) pair.
    pub fn remove_route(&self, event_type: &EventType, processor: &str) {
        if let Some(routes) = self.routes.write().get_mut(event_type) {
            routes.retain(|r| r.processor != processor);
        }
    }

    /// Routes for a type, highest priority first. Ties keep insertion order.
    pub fn routes_for(&self, event_type: &EventType) -> Vec<Route> {
        let mut routes = self
            .routes
            .read()
            .get(event_type)
            .cloned()
            .unwrap_or_default();
        routes.sort_by(|a, b| b.priority.cmp(&a.priority));
        routes
    }
}

#[async_trait]
impl EventRouter for DefaultEventRouter {
    async fn route(&self, event: &Event) -> Result<()> {
        for route in self.routes_for(&event.event_type) {
            // One failing route never blocks the rest.
            if let Err(e) = self.notifier.notify(&route, event).await {
                warn!(
                    event_id = %event.id,
                    processor = %route.processor,
                    error = %e,
                    "Route notification failed"
                );
            }
        }
        Ok(())
    }
}
