use std::fmt;
use std::sync::Arc;

use chrono::NaiveTime;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use steenbot_common::{Result, SteenBotError};
use steenbot_events::{Event, EventSource, EventType};

type Predicate = dyn Fn(&Event) -> anyhow::Result<bool> + Send + Sync;

/// Caller-supplied predicate. Serializes as its name only.
#[derive(Clone)]
pub struct CustomCondition {
    name: String,
    predicate: Arc<Predicate>,
}

impl CustomCondition {
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Event) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for CustomCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomCondition")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Serialize for CustomCondition {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("CustomCondition", 1)?;
        s.serialize_field("name", &self.name)?;
        s.end()
    }
}

/// A predicate over an event. Built-in kinds are data; `Custom` carries code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Condition {
    #[serde(rename = "event.type")]
    EventType { event_type: EventType },

    #[serde(rename = "event.source")]
    EventSource { source: EventSource },

    /// Equality at a JSON pointer into the payload (e.g. `/status`).
    #[serde(rename = "payload.match")]
    PayloadMatch { pointer: String, value: Value },

    /// Equality on one metadata field: `correlation_id`, `user_id`,
    /// `priority` or `retry_count`.
    #[serde(rename = "metadata.match")]
    MetadataMatch { field: String, value: Value },

    /// Event timestamp's UTC time of day falls in `[start, end)`.
    /// A window with `start > end` wraps past midnight.
    #[serde(rename = "time.based")]
    TimeWindow { start: NaiveTime, end: NaiveTime },

    #[serde(rename = "custom", skip_deserializing)]
    Custom(CustomCondition),
}

impl Condition {
    pub fn event_type(event_type: EventType) -> Self {
        Self::EventType { event_type }
    }

    pub fn source(source: EventSource) -> Self {
        Self::EventSource { source }
    }

    pub fn payload_match(pointer: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::PayloadMatch {
            pointer: pointer.into(),
            value: value.into(),
        }
    }

    pub fn metadata_match(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::MetadataMatch {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn time_window(start: NaiveTime, end: NaiveTime) -> Self {
        Self::TimeWindow { start, end }
    }

    pub fn custom<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Event) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        Self::Custom(CustomCondition::new(name, predicate))
    }

    pub fn evaluate(&self, event: &Event) -> Result<bool> {
        match self {
            Condition::EventType { event_type } => Ok(&event.event_type == event_type),
            Condition::EventSource { source } => Ok(&event.source == source),
            Condition::PayloadMatch { pointer, value } => {
                Ok(event.payload.pointer(pointer) == Some(value))
            }
            Condition::MetadataMatch { field, value } => {
                let meta = &event.metadata;
                let actual = match field.as_str() {
                    "correlation_id" => meta.correlation_id.clone().map(Value::from),
                    "user_id" => meta.user_id.clone().map(Value::from),
                    "priority" => meta.priority.map(Value::from),
                    "retry_count" => meta.retry_count.map(Value::from),
                    other => {
                        return Err(SteenBotError::Validation(format!(
                            "unknown metadata field: {other}"
                        )))
                    }
                };
                Ok(actual.as_ref() == Some(value))
            }
            Condition::TimeWindow { start, end } => {
                let t = event.timestamp.time();
                Ok(if start <= end {
                    *start <= t && t < *end
                } else {
                    t >= *start || t < *end
                })
            }
            Condition::Custom(custom) => (custom.predicate)(event).map_err(|e| {
                SteenBotError::Processing(format!("condition {}: {e:#}", custom.name))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn task_event() -> Event {
        Event::new(
            EventSource::Github,
            EventType::TaskCreated,
            json!({"task_id": "T-1", "labels": {"severity": "high"}}),
        )
        .with_user_id("ana")
        .with_priority(3)
    }

    #[test]
    fn type_and_source() {
        let event = task_event();
        assert!(Condition::event_type(EventType::TaskCreated).evaluate(&event).unwrap());
        assert!(!Condition::event_type(EventType::TaskUpdated).evaluate(&event).unwrap());
        assert!(Condition::source(EventSource::Github).evaluate(&event).unwrap());
        assert!(!Condition::source(EventSource::Jira).evaluate(&event).unwrap());
    }

    #[test]
    fn payload_pointer_equality() {
        let event = task_event();
        assert!(Condition::payload_match("/labels/severity", "high").evaluate(&event).unwrap());
        assert!(!Condition::payload_match("/labels/severity", "low").evaluate(&event).unwrap());
        assert!(!Condition::payload_match("/missing", "x").evaluate(&event).unwrap());
    }

    #[test]
    fn metadata_fields() {
        let event = task_event();
        assert!(Condition::metadata_match("user_id", "ana").evaluate(&event).unwrap());
        assert!(Condition::metadata_match("priority", 3).evaluate(&event).unwrap());
        assert!(!Condition::metadata_match("retry_count", 0).evaluate(&event).unwrap());
        assert!(Condition::metadata_match("colour", "red").evaluate(&event).is_err());
    }

    #[test]
    fn time_window_wraps_midnight() {
        let at = |h, m| {
            task_event().with_timestamp(Utc.with_ymd_and_hms(2026, 3, 1, h, m, 0).unwrap())
        };
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();

        let office = Condition::time_window(t(9, 0), t(17, 0));
        assert!(office.evaluate(&at(9, 0)).unwrap());
        assert!(!office.evaluate(&at(17, 0)).unwrap());

        let night = Condition::time_window(t(22, 0), t(6, 0));
        assert!(night.evaluate(&at(23, 30)).unwrap());
        assert!(night.evaluate(&at(2, 0)).unwrap());
        assert!(!night.evaluate(&at(12, 0)).unwrap());
    }

    #[test]
    fn custom_errors_become_processing_errors() {
        let cond = Condition::custom("explodes", |_| anyhow::bail!("bad input"));
        let err = cond.evaluate(&task_event()).unwrap_err();
        assert!(matches!(err, SteenBotError::Processing(msg) if msg.contains("explodes")));
    }

    #[test]
    fn serialized_form_uses_dotted_tags() {
        let value = serde_json::to_value(Condition::event_type(EventType::TaskBlocked)).unwrap();
        assert_eq!(value, json!({"type": "event.type", "event_type": "task.blocked"}));

        let custom = serde_json::to_value(Condition::custom("always", |_| Ok(true))).unwrap();
        assert_eq!(custom, json!({"type": "custom", "name": "always"}));

        let parsed: Condition =
            serde_json::from_value(json!({"type": "event.source", "source": "jira"})).unwrap();
        assert!(matches!(parsed, Condition::EventSource { source: EventSource::Jira }));

        assert!(serde_json::from_value::<Condition>(json!({"type": "custom", "name": "x"})).is_err());
    }
}
