//! AWS-backed transport: SNS for topics, SQS for queues.
//!
//! The SDK is async, while hooks fire synchronously from logging call sites.
//! The transport owns a small Tokio runtime, spawns each SDK call onto it and
//! blocks the caller until the call finishes. This works from plain threads
//! and from inside another runtime alike.

use crate::config::TransportConfig;
use crate::transport::{
    BoxError, Destination, DestinationKind, OutboundMessage, Transport, TransportError,
};
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_sns::config::{Credentials, Region};
use std::collections::BTreeMap;
use std::future::Future;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, instrument};

const ATTRIBUTE_DATA_TYPE: &str = "String";

#[derive(Debug, Clone)]
enum Client {
    Sns(aws_sdk_sns::Client),
    Sqs(aws_sdk_sqs::Client),
}

/// A transport publishing to SNS topics or SQS queues.
#[derive(Debug)]
pub struct AwsTransport {
    kind: DestinationKind,
    client: Client,
    runtime: Option<Runtime>,
}

impl AwsTransport {
    /// Creates an AWS session and a client for `kind` destinations.
    #[instrument(skip(config), fields(region = ?config.region))]
    pub fn connect(config: &TransportConfig, kind: DestinationKind) -> Result<Self, TransportError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("logsink-transport")
            .enable_all()
            .build()
            .map_err(|e| TransportError::Session(e.to_string()))?;

        let sdk_config = run(&runtime, load_sdk_config(config.clone()))?;
        let client = match kind {
            DestinationKind::Topic => Client::Sns(aws_sdk_sns::Client::new(&sdk_config)),
            DestinationKind::Queue => Client::Sqs(aws_sdk_sqs::Client::new(&sdk_config)),
        };

        debug!(%kind, "AWS transport session established");

        Ok(Self {
            kind,
            client,
            runtime: Some(runtime),
        })
    }

    pub fn kind(&self) -> DestinationKind {
        self.kind
    }

    fn block_on<F>(&self, fut: F) -> Result<F::Output, TransportError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| TransportError::Runtime("transport runtime is shut down".to_string()))?;
        run(runtime, fut)
    }

    fn check_kind(&self, destination: &Destination) -> Result<(), TransportError> {
        if destination.kind == self.kind {
            Ok(())
        } else {
            Err(TransportError::KindMismatch {
                expected: self.kind,
                actual: destination.kind,
                id: destination.id.clone(),
            })
        }
    }
}

impl Transport for AwsTransport {
    fn validate_destination(&self, destination: &Destination) -> Result<(), TransportError> {
        self.check_kind(destination)?;

        let id = destination.id.clone();
        let result: Result<(), BoxError> = match self.client.clone() {
            Client::Sns(client) => self.block_on(async move {
                client
                    .get_topic_attributes()
                    .topic_arn(id)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(BoxError::from)
            })?,
            Client::Sqs(client) => self.block_on(async move {
                client
                    .get_queue_attributes()
                    .queue_url(id)
                    .attribute_names(aws_sdk_sqs::types::QueueAttributeName::QueueArn)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(BoxError::from)
            })?,
        };

        result.map_err(|source| TransportError::DestinationNotFound {
            destination: destination.to_string(),
            source,
        })
    }

    fn publish(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        self.check_kind(&message.destination)?;

        let (operation, result) = match self.client.clone() {
            Client::Sns(client) => {
                let attributes = sns_attributes(&message.attributes)?;
                let topic_arn = message.destination.id.clone();
                let body = message.body.clone();
                let subject = message.subject.clone();
                let result = self.block_on(async move {
                    client
                        .publish()
                        .topic_arn(topic_arn)
                        .message(body)
                        .set_subject(subject)
                        .set_message_attributes(Some(attributes))
                        .send()
                        .await
                        .map(|_| ())
                        .map_err(BoxError::from)
                })?;
                ("Publish", result)
            }
            Client::Sqs(client) => {
                let attributes = sqs_attributes(&message.attributes)?;
                let queue_url = message.destination.id.clone();
                let body = message.body.clone();
                let result = self.block_on(async move {
                    client
                        .send_message()
                        .queue_url(queue_url)
                        .message_body(body)
                        .set_message_attributes(Some(attributes))
                        .send()
                        .await
                        .map(|_| ())
                        .map_err(BoxError::from)
                })?;
                ("SendMessage", result)
            }
        };

        result.map_err(|source| TransportError::Request { operation, source })
    }
}

impl Drop for AwsTransport {
    fn drop(&mut self) {
        // Dropping a runtime blocks, which panics inside async contexts.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

fn run<F>(runtime: &Runtime, fut: F) -> Result<F::Output, TransportError>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let handle = runtime.spawn(fut);
    futures::executor::block_on(handle).map_err(|e| TransportError::Runtime(e.to_string()))
}

async fn load_sdk_config(config: TransportConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = config.region {
        loader = loader.region(Region::new(region));
    }
    if let Some(endpoint_url) = config.endpoint_url {
        loader = loader.endpoint_url(endpoint_url);
    }
    if let (Some(access_key_id), Some(secret_access_key)) =
        (config.access_key_id, config.secret_access_key)
    {
        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "logsink-static-credentials",
        );
        loader = loader.credentials_provider(credentials);
    }
    if let Some(max_attempts) = config.max_attempts {
        loader = loader.retry_config(RetryConfig::standard().with_max_attempts(max_attempts));
    }

    loader.load().await
}

fn sns_attributes(
    attributes: &BTreeMap<String, String>,
) -> Result<std::collections::HashMap<String, aws_sdk_sns::types::MessageAttributeValue>, TransportError>
{
    attributes
        .iter()
        .map(|(key, value)| {
            aws_sdk_sns::types::MessageAttributeValue::builder()
                .data_type(ATTRIBUTE_DATA_TYPE)
                .string_value(value)
                .build()
                .map(|attribute| (key.clone(), attribute))
                .map_err(|e| TransportError::Request {
                    operation: "Publish",
                    source: Box::new(e),
                })
        })
        .collect()
}

fn sqs_attributes(
    attributes: &BTreeMap<String, String>,
) -> Result<std::collections::HashMap<String, aws_sdk_sqs::types::MessageAttributeValue>, TransportError>
{
    attributes
        .iter()
        .map(|(key, value)| {
            aws_sdk_sqs::types::MessageAttributeValue::builder()
                .data_type(ATTRIBUTE_DATA_TYPE)
                .string_value(value)
                .build()
                .map(|attribute| (key.clone(), attribute))
                .map_err(|e| TransportError::Request {
                    operation: "SendMessage",
                    source: Box::new(e),
                })
        })
        .collect()
}
