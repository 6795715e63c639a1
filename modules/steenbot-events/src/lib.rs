//! Event data model and the event store contract.
//!
//! Events are immutable facts: id, timestamp, source, type, a JSON payload
//! and optional metadata. The store is an external collaborator; this crate
//! only defines its contract plus an in-memory implementation for tests and
//! local runs.

pub mod filter;
pub mod store;
pub mod types;

pub use filter::EventFilter;
pub use store::{EventStore, MemoryEventStore};
pub use types::{Event, EventCategory, EventMetadata, EventSource, EventType};
