//! Configuration management for logsink
//!
//! This module defines the main `Config` struct and its sub-structs. It uses
//! the `figment` crate to layer defaults, an optional `logsink.toml` file,
//! `LOGSINK_`-prefixed environment variables and command-line arguments.

use crate::cli::Cli;
use crate::record::Level;
use crate::transport::Destination;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Filter for the application's own diagnostics, in `EnvFilter` syntax.
    pub log_level: String,
    /// Configuration for the dispatch hook.
    pub hook: HookConfig,
}

/// Configuration for the dispatch hook.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct HookConfig {
    /// The topic or queue records are published to.
    pub destination: Option<Destination>,
    /// Subject line for topic destinations.
    pub subject: Option<String>,
    /// Levels to forward. Unset or empty forwards every level.
    pub accepted_levels: Option<Vec<Level>>,
    /// AWS session settings.
    #[serde(default)]
    pub transport: TransportConfig,
}

/// AWS session settings. Anything unset falls back to the SDK's own
/// environment and profile conventions.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct TransportConfig {
    pub region: Option<String>,
    /// Overrides the service endpoint, e.g. for LocalStack.
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Maximum attempts per request, as enforced by the SDK's retry policy.
    pub max_attempts: Option<u32>,
}

impl Config {
    /// Loads the application configuration.
    ///
    /// Sources are merged in order: defaults, the TOML file named by
    /// `--config` (if any), environment variables, then CLI arguments.
    pub fn load(cli: &Cli) -> Result<Self, figment::Error> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if let Some(path) = &cli.config {
            figment = figment.merge(Toml::file(path));
        }
        figment
            // e.g. LOGSINK_HOOK__DESTINATION__ID=arn:aws:sns:...
            .merge(Env::prefixed("LOGSINK_").split("__"))
            .merge(cli.clone())
            .extract()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            hook: HookConfig::default(),
        }
    }
}
