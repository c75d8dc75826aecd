use crate::transport::{Destination, OutboundMessage, Transport, TransportError};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

/// Fake transport for testing.
///
/// Destinations must be registered with `add_destination` to pass
/// validation. Published messages are recorded, and queued errors are
/// returned by the next publish calls in order.
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    destinations: Arc<Mutex<HashSet<Destination>>>,
    published: Arc<Mutex<Vec<OutboundMessage>>>,
    publish_errors: Arc<Mutex<VecDeque<String>>>,
    publish_calls: Arc<Mutex<u32>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fake that already knows `destination`.
    pub fn with_destination(destination: Destination) -> Self {
        let transport = Self::new();
        transport.add_destination(destination);
        transport
    }

    pub fn add_destination(&self, destination: Destination) {
        self.destinations.lock().unwrap().insert(destination);
    }

    /// Makes the next publish call fail with `message`.
    pub fn add_publish_error(&self, message: &str) {
        self.publish_errors
            .lock()
            .unwrap()
            .push_back(message.to_string());
    }

    /// Messages that were accepted by `publish`.
    pub fn published(&self) -> Vec<OutboundMessage> {
        self.published.lock().unwrap().clone()
    }

    /// Number of times `publish` was called, failed calls included.
    pub fn publish_calls(&self) -> u32 {
        *self.publish_calls.lock().unwrap()
    }
}

impl Transport for FakeTransport {
    fn validate_destination(&self, destination: &Destination) -> Result<(), TransportError> {
        if self.destinations.lock().unwrap().contains(destination) {
            Ok(())
        } else {
            Err(TransportError::DestinationNotFound {
                destination: destination.to_string(),
                source: "no such destination".into(),
            })
        }
    }

    fn publish(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        *self.publish_calls.lock().unwrap() += 1;

        if let Some(error) = self.publish_errors.lock().unwrap().pop_front() {
            return Err(TransportError::Request {
                operation: "Publish",
                source: error.into(),
            });
        }

        self.published.lock().unwrap().push(message.clone());
        Ok(())
    }
}
