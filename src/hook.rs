//! The hook interface and the per-level registry that drives it.

use crate::record::{Level, LogRecord};
use crate::transport::TransportError;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HookError {
    #[error("transport setup failed")]
    TransportSetup(#[source] TransportError),

    #[error("no destination configured")]
    MissingDestination,

    #[error("failed to serialize log data into JSON")]
    Serialization(#[source] serde_json::Error),

    #[error("failed to publish log record")]
    Publish(#[source] TransportError),
}

impl HookError {
    /// The error and its causes on one line, outermost first.
    pub fn report(&self) -> String {
        let mut text = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            text.push_str(": ");
            text.push_str(&cause.to_string());
            source = cause.source();
        }
        text
    }
}

/// A sink that receives log records from the logging framework.
///
/// The framework consults `level_filter` to decide which records reach
/// `fire`. Implementations are shared across logging call sites, so they
/// must be `Send + Sync`.
pub trait Hook: Send + Sync {
    /// The levels this hook accepts.
    fn level_filter(&self) -> BTreeSet<Level>;

    /// Handles one record. Errors are returned to the framework, never logged.
    fn fire(&self, record: &LogRecord) -> Result<(), HookError>;
}

/// Hooks indexed by the levels they accept.
#[derive(Clone, Default)]
pub struct LevelHooks {
    hooks: BTreeMap<Level, Vec<Arc<dyn Hook>>>,
}

impl LevelHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `hook` under every level in its filter.
    pub fn add(&mut self, hook: Arc<dyn Hook>) {
        for level in hook.level_filter() {
            self.hooks.entry(level).or_default().push(hook.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Whether any hook accepts `level`.
    pub fn accepts(&self, level: Level) -> bool {
        self.hooks.get(&level).is_some_and(|hooks| !hooks.is_empty())
    }

    pub fn hooks_for(&self, level: Level) -> &[Arc<dyn Hook>] {
        self.hooks.get(&level).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Fires every hook registered for the record's level, in registration
    /// order, stopping at the first error.
    pub fn fire(&self, record: &LogRecord) -> Result<(), HookError> {
        for hook in self.hooks_for(record.level) {
            hook.fire(record)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for LevelHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: BTreeMap<Level, usize> = self
            .hooks
            .iter()
            .map(|(level, hooks)| (*level, hooks.len()))
            .collect();
        f.debug_struct("LevelHooks").field("hooks", &counts).finish()
    }
}
