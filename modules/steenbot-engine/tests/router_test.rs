//! DefaultEventRouter ordering, removal and isolation.

mod harness;

use std::sync::Arc;

use harness::{test_event, Journal, RecordingNotifier};
use steenbot_engine::{DefaultEventRouter, EventRouter};
use steenbot_events::EventType;

fn router_with_journal() -> (DefaultEventRouter, Journal) {
    let journal = Journal::new();
    let router = DefaultEventRouter::with_notifier(Arc::new(RecordingNotifier::new(journal.clone())));
    (router, journal)
}

#[tokio::test]
async fn routes_notify_highest_priority_first() {
    let (router, journal) = router_with_journal();
    router.add_route(EventType::TaskCreated, "low", 1);
    router.add_route(EventType::TaskCreated, "high", 2);

    router.route(&test_event("e1", EventType::TaskCreated)).await.unwrap();

    assert_eq!(journal.entries(), vec!["high", "low"]);
}

#[tokio::test]
async fn equal_priorities_keep_insertion_order() {
    let (router, journal) = router_with_journal();
    router.add_route(EventType::SprintStarted, "first", 5);
    router.add_route(EventType::SprintStarted, "second", 5);
    router.add_route(EventType::SprintStarted, "top", 9);
    router.add_route(EventType::SprintStarted, "third", 5);

    router.route(&test_event("e1", EventType::SprintStarted)).await.unwrap();

    assert_eq!(journal.entries(), vec!["top", "first", "second", "third"]);
}

#[tokio::test]
async fn removing_a_route_leaves_the_others() {
    let (router, journal) = router_with_journal();
    router.add_route(EventType::TaskCreated, "p1", 1);
    router.add_route(EventType::TaskCreated, "p2", 2);
    router.remove_route(&EventType::TaskCreated, "p1");

    router.route(&test_event("e1", EventType::TaskCreated)).await.unwrap();

    assert_eq!(journal.entries(), vec!["p2"]);
}

#[tokio::test]
async fn removal_is_scoped_to_the_event_type() {
    let (router, journal) = router_with_journal();
    router.add_route(EventType::TaskCreated, "shared", 1);
    router.add_route(EventType::TaskUpdated, "shared", 1);
    router.remove_route(&EventType::TaskCreated, "shared");

    router.route(&test_event("e1", EventType::TaskCreated)).await.unwrap();
    router.route(&test_event("e2", EventType::TaskUpdated)).await.unwrap();

    assert_eq!(journal.entries(), vec!["shared"]);
    assert!(router.routes_for(&EventType::TaskCreated).is_empty());
}

#[tokio::test]
async fn removing_a_name_drops_every_duplicate() {
    let (router, _journal) = router_with_journal();
    router.add_route(EventType::TaskCreated, "dup", 1);
    router.add_route(EventType::TaskCreated, "dup", 7);
    router.add_route(EventType::TaskCreated, "keep", 3);
    router.remove_route(&EventType::TaskCreated, "dup");

    let names: Vec<String> = router
        .routes_for(&EventType::TaskCreated)
        .into_iter()
        .map(|r| r.processor)
        .collect();
    assert_eq!(names, vec!["keep"]);
}

#[tokio::test]
async fn no_routes_is_a_silent_no_op() {
    let (router, journal) = router_with_journal();
    router.add_route(EventType::TaskUpdated, "elsewhere", 1);

    router.route(&test_event("e1", EventType::TaskCreated)).await.unwrap();

    assert!(journal.entries().is_empty());
}

#[tokio::test]
async fn a_failing_notification_does_not_stop_the_rest() {
    let journal = Journal::new();
    let mut notifier = RecordingNotifier::new(journal.clone());
    notifier.failing.push("broken".into());
    let router = DefaultEventRouter::with_notifier(Arc::new(notifier));

    router.add_route(EventType::TaskBlocked, "broken", 10);
    router.add_route(EventType::TaskBlocked, "healthy", 1);

    router.route(&test_event("e1", EventType::TaskBlocked)).await.unwrap();

    assert_eq!(journal.entries(), vec!["healthy"]);
}

#[tokio::test]
async fn default_router_logs_without_failing() {
    let router = DefaultEventRouter::new();
    router.add_route(EventType::TaskCreated, "logger", 1);
    router.route(&test_event("e1", EventType::TaskCreated)).await.unwrap();
}
