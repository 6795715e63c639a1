//! Core event types. Immutable once built: a logical "update" is a new event.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use steenbot_common::{Result, SteenBotError};
use uuid::Uuid;

/// Where an event came from. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    Github,
    Jira,
    System,
    User,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::Github => "github",
            EventSource::Jira => "jira",
            EventSource::System => "system",
            EventSource::User => "user",
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Family an [`EventType`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    Task,
    Sprint,
    Team,
    Integration,
    Custom,
}

/// What happened. Open-ended: unknown names round-trip through `Custom`.
///
/// Payload shape by type (documented, not enforced):
/// - task events: `{ "task_id": string, "title"?: string, "status"?: string, ... }`
/// - sprint events: `{ "sprint_id": string, ... }`
/// - team events: `{ "member"?: string, ... }`
/// - integration events: `{ "service"?: string, "message"?: string, ... }`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    TaskCreated,
    TaskUpdated,
    TaskCompleted,
    TaskBlocked,
    SprintStarted,
    SprintEnded,
    SprintBlocked,
    SprintMetricsUpdated,
    TeamMemberAvailability,
    WorkloadChanged,
    BlockersIdentified,
    ServiceConnectionStatus,
    SyncStatus,
    Error,
    IntegrationEvent,
    Custom(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::TaskCreated => "task.created",
            EventType::TaskUpdated => "task.updated",
            EventType::TaskCompleted => "task.completed",
            EventType::TaskBlocked => "task.blocked",
            EventType::SprintStarted => "sprint.started",
            EventType::SprintEnded => "sprint.ended",
            EventType::SprintBlocked => "sprint.blocked",
            EventType::SprintMetricsUpdated => "sprint.metrics.updated",
            EventType::TeamMemberAvailability => "team.member.availability",
            EventType::WorkloadChanged => "workload.changed",
            EventType::BlockersIdentified => "blockers.identified",
            EventType::ServiceConnectionStatus => "service.connection.status",
            EventType::SyncStatus => "sync.status",
            EventType::Error => "error",
            EventType::IntegrationEvent => "integration.event",
            EventType::Custom(name) => name,
        }
    }

    pub fn category(&self) -> EventCategory {
        match self {
            EventType::TaskCreated
            | EventType::TaskUpdated
            | EventType::TaskCompleted
            | EventType::TaskBlocked => EventCategory::Task,
            EventType::SprintStarted
            | EventType::SprintEnded
            | EventType::SprintBlocked
            | EventType::SprintMetricsUpdated => EventCategory::Sprint,
            EventType::TeamMemberAvailability
            | EventType::WorkloadChanged
            | EventType::BlockersIdentified => EventCategory::Team,
            EventType::ServiceConnectionStatus
            | EventType::SyncStatus
            | EventType::Error
            | EventType::IntegrationEvent => EventCategory::Integration,
            EventType::Custom(_) => EventCategory::Custom,
        }
    }
}

impl From<&str> for EventType {
    fn from(name: &str) -> Self {
        match name {
            "task.created" => EventType::TaskCreated,
            "task.updated" => EventType::TaskUpdated,
            "task.completed" => EventType::TaskCompleted,
            "task.blocked" => EventType::TaskBlocked,
            "sprint.started" => EventType::SprintStarted,
            "sprint.ended" => EventType::SprintEnded,
            "sprint.blocked" => EventType::SprintBlocked,
            "sprint.metrics.updated" => EventType::SprintMetricsUpdated,
            "team.member.availability" => EventType::TeamMemberAvailability,
            "workload.changed" => EventType::WorkloadChanged,
            "blockers.identified" => EventType::BlockersIdentified,
            "service.connection.status" => EventType::ServiceConnectionStatus,
            "sync.status" => EventType::SyncStatus,
            "error" => EventType::Error,
            "integration.event" => EventType::IntegrationEvent,
            other => EventType::Custom(other.to_string()),
        }
    }
}

impl From<String> for EventType {
    fn from(name: String) -> Self {
        EventType::from(name.as_str())
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        match event_type {
            EventType::Custom(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
}

/// An immutable record of something that happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub source: EventSource,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub payload: serde_json::Value,
    #[serde(default)]
    pub metadata: EventMetadata,
}

impl Event {
    /// New event with a fresh UUID and the current time.
    pub fn new(source: EventSource, event_type: EventType, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            source,
            event_type,
            payload,
            metadata: EventMetadata::default(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.metadata.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.metadata.user_id = Some(user_id.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.metadata.priority = Some(priority);
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.metadata.retry_count = Some(retry_count);
        self
    }

    /// Deserialize the payload into the shape documented for this event type.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.payload.clone()).map_err(|e| {
            SteenBotError::Validation(format!(
                "payload of {} event {} does not match expected shape: {e}",
                self.event_type, self.id
            ))
        })
    }
}
