//! Command-Line Interface (CLI) argument parsing.
//!
//! Arguments are parsed at startup and merged over the configuration file
//! and environment variables, so every flag here overrides a config key.

use crate::record::Level;
use crate::transport::Destination;
use clap::{Parser, Subcommand};
use figment::{
    providers::Serialized,
    value::{Dict, Map},
    Error, Figment, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Forwards log records to an SNS topic or an SQS queue.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Publish to this SNS topic ARN.
    #[arg(long, value_name = "ARN", conflicts_with = "queue")]
    pub topic: Option<String>,

    /// Publish to this SQS queue URL.
    #[arg(long, value_name = "URL")]
    pub queue: Option<String>,

    /// Subject line for topic messages.
    #[arg(long)]
    pub subject: Option<String>,

    /// AWS region.
    #[arg(long)]
    pub region: Option<String>,

    /// Override the AWS service endpoint.
    #[arg(long, value_name = "URL")]
    pub endpoint_url: Option<String>,

    /// Comma-separated levels to forward (default: all).
    #[arg(long, value_delimiter = ',')]
    pub levels: Option<Vec<Level>>,

    /// Filter for logsink's own diagnostics on stderr.
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fire a single record.
    Send {
        /// Severity of the record.
        #[arg(short, long, default_value = "info")]
        level: Level,

        /// Message text.
        #[arg(short, long)]
        message: String,

        /// Payload entries as KEY=VALUE. Values that parse as JSON keep
        /// their type, anything else is sent as a string.
        #[arg(short, long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
        fields: Vec<(String, serde_json::Value)>,
    },
    /// Read JSON log lines from stdin and fire each accepted record.
    Pipe,
}

impl Cli {
    /// The destination named on the command line, if any.
    pub fn destination(&self) -> Option<Destination> {
        match (&self.topic, &self.queue) {
            (Some(topic), _) => Some(Destination::topic(topic.clone())),
            (None, Some(queue)) => Some(Destination::queue(queue.clone())),
            (None, None) => None,
        }
    }
}

fn parse_field(s: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {s:?}"))?;
    if key.is_empty() {
        return Err(format!("empty key in {s:?}"));
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut figment = Figment::new();

        if let Some(log_level) = &self.log_level {
            figment = figment.merge(Serialized::default("log_level", log_level));
        }
        if let Some(destination) = self.destination() {
            figment = figment.merge(Serialized::default("hook.destination", destination));
        }
        if let Some(subject) = &self.subject {
            figment = figment.merge(Serialized::default("hook.subject", subject));
        }
        if let Some(levels) = &self.levels {
            figment = figment.merge(Serialized::default("hook.accepted_levels", levels));
        }
        if let Some(region) = &self.region {
            figment = figment.merge(Serialized::default("hook.transport.region", region));
        }
        if let Some(endpoint_url) = &self.endpoint_url {
            figment = figment.merge(Serialized::default(
                "hook.transport.endpoint_url",
                endpoint_url,
            ));
        }

        figment.data()
    }
}
