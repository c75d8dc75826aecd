//! The messaging transport a hook publishes through.
//!
//! A `Transport` is an already-configured client that can check a destination
//! exists and publish one message to it. The hook treats it as an opaque,
//! externally synchronized dependency.

pub mod aws;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub use aws::AwsTransport;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Whether a destination is a pub/sub topic or a point-to-point queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationKind {
    Topic,
    Queue,
}

impl DestinationKind {
    /// Only topics carry a subject line.
    pub fn supports_subject(&self) -> bool {
        matches!(self, DestinationKind::Topic)
    }
}

impl fmt::Display for DestinationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestinationKind::Topic => f.write_str("topic"),
            DestinationKind::Queue => f.write_str("queue"),
        }
    }
}

/// A named remote endpoint: a topic ARN or a queue URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination {
    pub kind: DestinationKind,
    pub id: String,
}

impl Destination {
    pub fn topic(id: impl Into<String>) -> Self {
        Self {
            kind: DestinationKind::Topic,
            id: id.into(),
        }
    }

    pub fn queue(id: impl Into<String>) -> Self {
        Self {
            kind: DestinationKind::Queue,
            id: id.into(),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// A message ready to hand to a transport. Built per dispatch, never kept.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub destination: Destination,
    pub body: String,
    pub subject: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to establish transport session: {0}")]
    Session(String),

    #[error("destination not found: {destination}")]
    DestinationNotFound {
        destination: String,
        #[source]
        source: BoxError,
    },

    #[error("transport for {expected} destinations cannot reach {actual} {id}")]
    KindMismatch {
        expected: DestinationKind,
        actual: DestinationKind,
        id: String,
    },

    #[error("{operation} request failed")]
    Request {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("transport runtime failure: {0}")]
    Runtime(String),
}

/// Client capable of publishing messages to a destination.
pub trait Transport: Send + Sync {
    /// Checks that the destination exists. Called once, when a hook is built.
    fn validate_destination(&self, destination: &Destination) -> Result<(), TransportError>;

    /// Publishes one message, blocking until the transport answers.
    fn publish(&self, message: &OutboundMessage) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn validate_destination(&self, destination: &Destination) -> Result<(), TransportError> {
        (**self).validate_destination(destination)
    }

    fn publish(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        (**self).publish(message)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn validate_destination(&self, destination: &Destination) -> Result<(), TransportError> {
        (**self).validate_destination(destination)
    }

    fn publish(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        (**self).publish(message)
    }
}
