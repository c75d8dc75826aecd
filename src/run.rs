//! The binary's two modes: forward one record, or forward JSON log lines.

use crate::hook::{Hook, HookError};
use crate::lines::parse_line;
use crate::record::LogRecord;
use std::io::BufRead;
use tracing::{debug, info, warn};

/// Counts reported when `pipe` reaches the end of its input.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PipeSummary {
    pub sent: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// Fires `record` if the hook accepts its level. Returns whether it was sent.
pub fn send(hook: &impl Hook, record: &LogRecord) -> Result<bool, HookError> {
    if !hook.level_filter().contains(&record.level) {
        info!(level = %record.level, "Record level not accepted; nothing sent");
        return Ok(false);
    }
    hook.fire(record)?;
    info!("Record sent");
    Ok(true)
}

/// Forwards every accepted line of `input`.
///
/// Malformed lines and failed publishes are logged and counted, and the
/// loop moves on. Only a read error on `input` stops it.
pub fn pipe(hook: &impl Hook, input: impl BufRead) -> std::io::Result<PipeSummary> {
    let accepted = hook.level_filter();
    let mut summary = PipeSummary::default();

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record = match parse_line(&line) {
            Ok(record) => record,
            Err(e) => {
                warn!(line = index + 1, error = %e, "Skipping malformed log line");
                summary.failed += 1;
                continue;
            }
        };

        if !accepted.contains(&record.level) {
            debug!(line = index + 1, level = %record.level, "Level not accepted");
            summary.skipped += 1;
            continue;
        }

        match hook.fire(&record) {
            Ok(()) => summary.sent += 1,
            Err(e) => {
                warn!(line = index + 1, error = %e.report(), "Failed to forward log line");
                summary.failed += 1;
            }
        }
    }

    info!(
        sent = summary.sent,
        skipped = summary.skipped,
        failed = summary.failed,
        "Input exhausted"
    );
    Ok(summary)
}
