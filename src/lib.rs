//! logsink - forwards log records to SNS topics and SQS queues
//!
//! The core is `DispatchHook`: it filters records by level, turns each one
//! into a message carrying `Level`, `Time` and `Data` attributes, and
//! publishes it through a `Transport`. `HookLayer` plugs hooks into any
//! application instrumented with `tracing`.

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod hook;
pub mod layer;
pub mod lines;
pub mod logging;
pub mod record;
pub mod run;
pub mod transport;

pub use dispatch::{DispatchHook, DispatchHookBuilder, ATTR_DATA, ATTR_LEVEL, ATTR_TIME};
pub use hook::{Hook, HookError, LevelHooks};
pub use layer::HookLayer;
pub use record::{Fields, Level, LogRecord};
pub use transport::{
    AwsTransport, Destination, DestinationKind, OutboundMessage, Transport, TransportError,
};
