//! Common fixtures for integration tests.

#![allow(dead_code)]

use logsink::transport::test_utils::FakeTransport;
use logsink::{Destination, DispatchHook, Level};

pub const ALERTS_TOPIC: &str = "arn:aws:sns:us-east-1:123456789012:alerts-topic";
pub const LOGS_QUEUE: &str = "https://sqs.us-east-1.amazonaws.com/123456789012/logs";

/// Builds a hook on a fake transport that knows `destination`.
pub fn hook_with_fake(
    destination: Destination,
    subject: Option<&str>,
    levels: &[Level],
) -> (DispatchHook<FakeTransport>, FakeTransport) {
    let transport = FakeTransport::with_destination(destination.clone());
    let mut builder = DispatchHook::builder(transport.clone(), destination)
        .accepted_levels(levels.iter().copied());
    if let Some(subject) = subject {
        builder = builder.subject(subject);
    }
    let hook = builder.build().expect("fake destination should validate");
    (hook, transport)
}
