//! Integration tests for the dispatch hook against a fake transport.

use chrono::{TimeZone, Utc};
use logsink::transport::test_utils::FakeTransport;
use logsink::{
    Destination, DispatchHook, Fields, Hook, HookError, Level, LevelHooks, LogRecord,
    TransportError, ATTR_DATA, ATTR_LEVEL, ATTR_TIME,
};
use serde_json::json;
use std::collections::BTreeSet;
use std::error::Error;
use std::sync::Arc;
use std::thread;

mod helpers;
use helpers::{hook_with_fake, ALERTS_TOPIC, LOGS_QUEUE};

#[test]
fn test_alert_scenario_forwards_only_accepted_levels() {
    // Arrange
    let (hook, transport) = hook_with_fake(
        Destination::topic("alerts-topic"),
        Some("App Alert"),
        &[Level::Error, Level::Fatal],
    );
    let mut hooks = LevelHooks::new();
    let hook = Arc::new(hook);
    hooks.add(hook.clone());

    // Act
    let warning = LogRecord::new(Level::Warn, "disk almost full").with_field("host", "db1");
    let error = LogRecord::new(Level::Error, "disk full").with_field("host", "db1");
    hooks.fire(&warning).unwrap();
    hooks.fire(&error).unwrap();

    // Assert
    assert!(!hook.level_filter().contains(&Level::Warn));
    let published = transport.published();
    assert_eq!(published.len(), 1);

    let message = &published[0];
    assert_eq!(message.destination, Destination::topic("alerts-topic"));
    assert_eq!(message.body, "disk full");
    assert_eq!(message.subject.as_deref(), Some("App Alert"));
    assert_eq!(message.attributes[ATTR_LEVEL], "error");
    assert_eq!(message.attributes[ATTR_DATA], r#"{"host":"db1"}"#);
}

#[test]
fn test_explicit_levels_are_returned_exactly() {
    let levels = [Level::Info, Level::Panic, Level::Debug];
    let (hook, _) = hook_with_fake(Destination::topic(ALERTS_TOPIC), None, &levels);

    assert_eq!(hook.level_filter(), BTreeSet::from(levels));
}

#[test]
fn test_unset_levels_accept_everything() {
    let (hook, _) = hook_with_fake(Destination::topic(ALERTS_TOPIC), None, &[]);

    assert_eq!(hook.level_filter(), BTreeSet::from(Level::ALL));
}

#[test]
fn test_fire_publishes_once_with_all_attributes() {
    let (hook, transport) = hook_with_fake(Destination::topic(ALERTS_TOPIC), None, &[]);
    let time = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let record = LogRecord::new(Level::Debug, "cache miss")
        .with_time(time)
        .with_field("key", "user:42");

    hook.fire(&record).unwrap();

    assert_eq!(transport.publish_calls(), 1);
    let message = &transport.published()[0];
    assert_eq!(message.body, "cache miss");
    assert_eq!(message.subject, None);
    assert_eq!(message.attributes.len(), 3);
    assert_eq!(message.attributes[ATTR_LEVEL], "debug");
    assert_eq!(message.attributes[ATTR_TIME], "2024-01-02T03:04:05.000000000Z");
}

#[test]
fn test_data_attribute_round_trips_payload() {
    let (hook, transport) = hook_with_fake(Destination::queue(LOGS_QUEUE), Some("unused"), &[]);
    let payload = json!({
        "host": "db1",
        "pid": 4242,
        "load": 0.75,
        "healthy": false,
        "tags": ["primary", "eu-west"],
        "owner": null,
        "nested": { "disk": { "used": 97, "mount": "/var" } }
    });
    let data: Fields = payload.as_object().cloned().unwrap();
    let record = LogRecord::new(Level::Warn, "disk pressure").with_data(data.clone());

    hook.fire(&record).unwrap();

    let message = &transport.published()[0];
    assert_eq!(message.subject, None);
    assert_eq!(message.attributes[ATTR_LEVEL], "warning");
    let decoded: Fields = serde_json::from_str(&message.attributes[ATTR_DATA]).unwrap();
    assert_eq!(decoded, data);
}

#[test]
fn test_publish_failure_is_returned_without_retry() {
    let (hook, transport) = hook_with_fake(Destination::topic(ALERTS_TOPIC), None, &[]);
    transport.add_publish_error("endpoint unavailable");

    let result = hook.fire(&LogRecord::new(Level::Error, "lost"));

    let err = result.unwrap_err();
    assert!(matches!(err, HookError::Publish(TransportError::Request { .. })));
    let root = err.source().and_then(|e| e.source()).unwrap();
    assert_eq!(root.to_string(), "endpoint unavailable");
    assert_eq!(transport.publish_calls(), 1);
    assert!(transport.published().is_empty());

    // The next fire goes through normally; nothing was queued for retry.
    hook.fire(&LogRecord::new(Level::Error, "next")).unwrap();
    assert_eq!(transport.publish_calls(), 2);
    assert_eq!(transport.published()[0].body, "next");
}

#[test]
fn test_construction_fails_for_nonexistent_destination() {
    let transport = FakeTransport::with_destination(Destination::topic(ALERTS_TOPIC));

    let result = DispatchHook::builder(transport.clone(), Destination::topic("missing-topic"))
        .subject("App Alert")
        .build();

    match result {
        Err(HookError::TransportSetup(TransportError::DestinationNotFound { destination, .. })) => {
            assert!(destination.contains("missing-topic"));
        }
        other => panic!("expected setup failure, got {other:?}"),
    }
    assert_eq!(transport.publish_calls(), 0);
}

#[test]
fn test_same_id_with_other_kind_is_not_found() {
    let transport = FakeTransport::with_destination(Destination::topic("logs"));

    let result = DispatchHook::builder(transport, Destination::queue("logs")).build();

    assert!(matches!(result, Err(HookError::TransportSetup(_))));
}

#[test]
fn test_concurrent_fires_each_publish_once() {
    let (hook, transport) = hook_with_fake(Destination::topic(ALERTS_TOPIC), None, &[]);
    let hook = Arc::new(hook);

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let hook = hook.clone();
            thread::spawn(move || {
                for n in 0..25 {
                    let record = LogRecord::new(Level::Info, format!("worker {worker} record {n}"))
                        .with_field("worker", worker);
                    hook.fire(&record).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(transport.publish_calls(), 200);
    let bodies: BTreeSet<String> = transport
        .published()
        .into_iter()
        .map(|message| message.body)
        .collect();
    assert_eq!(bodies.len(), 200);
}
