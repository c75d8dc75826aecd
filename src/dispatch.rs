//! The dispatch hook: forwards accepted log records to a topic or queue.
//!
//! Each `fire` turns one record into one `OutboundMessage` and publishes it
//! synchronously. The hook holds no state that changes after construction,
//! so it can be fired from any number of threads without locking.

use crate::config::HookConfig;
use crate::hook::{Hook, HookError};
use crate::record::{Level, LogRecord};
use crate::transport::{AwsTransport, Destination, OutboundMessage, Transport};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Attribute carrying the record's level as text.
pub const ATTR_LEVEL: &str = "Level";
/// Attribute carrying the record's timestamp as text.
pub const ATTR_TIME: &str = "Time";
/// Attribute carrying the record's payload as a JSON object.
pub const ATTR_DATA: &str = "Data";

/// A hook that publishes log records through a `Transport`.
#[derive(Debug)]
pub struct DispatchHook<T: Transport> {
    accepted_levels: Option<BTreeSet<Level>>,
    transport: T,
    destination: Destination,
    subject: Option<String>,
}

impl DispatchHook<AwsTransport> {
    /// Builds an AWS session from `config` and validates the destination.
    pub fn connect(config: &HookConfig) -> Result<Self, HookError> {
        let destination = config
            .destination
            .clone()
            .ok_or(HookError::MissingDestination)?;
        let transport = AwsTransport::connect(&config.transport, destination.kind)
            .map_err(HookError::TransportSetup)?;

        let mut builder = DispatchHook::builder(transport, destination);
        if let Some(subject) = &config.subject {
            builder = builder.subject(subject.clone());
        }
        if let Some(levels) = &config.accepted_levels {
            builder = builder.accepted_levels(levels.iter().copied());
        }
        builder.build()
    }
}

impl<T: Transport> DispatchHook<T> {
    /// Starts building a hook around an existing transport client.
    pub fn builder(transport: T, destination: Destination) -> DispatchHookBuilder<T> {
        DispatchHookBuilder {
            transport,
            destination,
            subject: None,
            accepted_levels: None,
        }
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Builds the message `fire` would publish for `record`.
    pub fn build_message(&self, record: &LogRecord) -> Result<OutboundMessage, HookError> {
        let data = encode_data(&record.data)?;

        let mut attributes = BTreeMap::new();
        attributes.insert(ATTR_LEVEL.to_string(), record.level.to_string());
        attributes.insert(ATTR_TIME.to_string(), record.time_text());
        attributes.insert(ATTR_DATA.to_string(), data);

        let subject = if self.destination.kind.supports_subject() {
            self.subject.clone()
        } else {
            None
        };

        Ok(OutboundMessage {
            destination: self.destination.clone(),
            body: record.message.clone(),
            subject,
            attributes,
        })
    }
}

impl<T: Transport> Hook for DispatchHook<T> {
    fn level_filter(&self) -> BTreeSet<Level> {
        match &self.accepted_levels {
            Some(levels) => levels.clone(),
            None => BTreeSet::from(Level::ALL),
        }
    }

    fn fire(&self, record: &LogRecord) -> Result<(), HookError> {
        let message = self.build_message(record)?;

        match self.transport.publish(&message) {
            Ok(()) => {
                metrics::counter!("logsink_records_published_total").increment(1);
                Ok(())
            }
            Err(e) => {
                metrics::counter!("logsink_records_failed_total").increment(1);
                Err(HookError::Publish(e))
            }
        }
    }
}

/// Serializes a record payload into the text stored in the `Data` attribute.
pub fn encode_data<D: Serialize + ?Sized>(data: &D) -> Result<String, HookError> {
    serde_json::to_string(data).map_err(HookError::Serialization)
}

/// Builder for `DispatchHook`. The destination is validated in `build`.
pub struct DispatchHookBuilder<T: Transport> {
    transport: T,
    destination: Destination,
    subject: Option<String>,
    accepted_levels: Option<BTreeSet<Level>>,
}

impl<T: Transport> DispatchHookBuilder<T> {
    /// Subject line for topic destinations. Ignored for queues.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Restricts the hook to `levels`. An empty set accepts every level.
    pub fn accepted_levels(mut self, levels: impl IntoIterator<Item = Level>) -> Self {
        let levels: BTreeSet<Level> = levels.into_iter().collect();
        self.accepted_levels = if levels.is_empty() { None } else { Some(levels) };
        self
    }

    pub fn build(self) -> Result<DispatchHook<T>, HookError> {
        self.transport
            .validate_destination(&self.destination)
            .map_err(HookError::TransportSetup)?;

        Ok(DispatchHook {
            accepted_levels: self.accepted_levels,
            transport: self.transport,
            destination: self.destination,
            subject: self.subject,
        })
    }
}
