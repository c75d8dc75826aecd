//! Bridges `tracing` events into hooks.
//!
//! `HookLayer` is a `tracing_subscriber::Layer` that turns every event into a
//! `LogRecord` and fires it through a `LevelHooks` registry. Fire failures
//! go to stderr: reporting them through `tracing` would feed them straight
//! back into the hooks.

use crate::hook::{Hook, LevelHooks};
use crate::record::{Fields, Level, LogRecord};
use chrono::Utc;
use serde_json::Value;
use std::cell::Cell;
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Targets never forwarded: the transport stack's own diagnostics.
pub const DEFAULT_IGNORED_TARGETS: &[&str] = &[
    "aws_",
    "hyper",
    "h2",
    "rustls",
    "tower",
    "logsink::transport",
];

thread_local! {
    static FIRING: Cell<bool> = const { Cell::new(false) };
}

/// A `tracing` layer that forwards events to hooks.
#[derive(Debug, Clone)]
pub struct HookLayer {
    hooks: LevelHooks,
    ignored_targets: Vec<String>,
}

impl HookLayer {
    pub fn new(hooks: LevelHooks) -> Self {
        Self {
            hooks,
            ignored_targets: DEFAULT_IGNORED_TARGETS
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }

    /// Creates a layer around a single hook.
    pub fn with_hook(hook: Arc<dyn Hook>) -> Self {
        let mut hooks = LevelHooks::new();
        hooks.add(hook);
        Self::new(hooks)
    }

    /// Also skips events whose target starts with `prefix`.
    pub fn ignore_target(mut self, prefix: impl Into<String>) -> Self {
        self.ignored_targets.push(prefix.into());
        self
    }

    fn wants(&self, metadata: &Metadata<'_>) -> bool {
        self.hooks.accepts(Level::from(*metadata.level()))
            && !self
                .ignored_targets
                .iter()
                .any(|prefix| metadata.target().starts_with(prefix.as_str()))
    }
}

impl<S: Subscriber> Layer<S> for HookLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if !self.wants(event.metadata()) {
            return;
        }
        // Events emitted while a hook is firing on this thread are dropped.
        let Some(guard) = FiringGuard::enter() else {
            return;
        };

        let record = record_from_event(event);
        let result = self.hooks.fire(&record);
        drop(guard);

        if let Err(e) = result {
            let _ = writeln!(std::io::stderr(), "Failed to fire hook: {}", e.report());
        }
    }
}

/// Marks the current thread as firing until dropped, unwinding included.
struct FiringGuard;

impl FiringGuard {
    fn enter() -> Option<Self> {
        if FIRING.with(|firing| firing.replace(true)) {
            None
        } else {
            Some(FiringGuard)
        }
    }
}

impl Drop for FiringGuard {
    fn drop(&mut self) {
        FIRING.with(|firing| firing.set(false));
    }
}

/// Converts a `tracing` event into a `LogRecord` stamped with the current time.
pub fn record_from_event(event: &Event<'_>) -> LogRecord {
    let mut visitor = FieldVisitor::default();
    event.record(&mut visitor);

    let metadata = event.metadata();
    LogRecord {
        level: Level::from(*metadata.level()),
        message: visitor.message.unwrap_or_default(),
        time: Utc::now(),
        data: visitor.fields,
        target: Some(metadata.target().to_string()),
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Fields,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        } else {
            self.insert(field, Value::String(format!("{value:?}")));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.insert(field, Value::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::String(value.to_string()));
    }
}
