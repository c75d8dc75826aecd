//! Logging initialization for the logsink binary.

use crate::layer::HookLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Installs the global subscriber: human-readable diagnostics on stderr,
/// filtered by `RUST_LOG` or else `default_filter`, plus an optional hook
/// layer forwarding events to remote destinations.
pub fn init_logging(default_filter: &str, hook_layer: Option<HookLayer>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_filter))?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_filter(filter),
        )
        .with(hook_layer)
        .try_init()?;

    Ok(())
}
