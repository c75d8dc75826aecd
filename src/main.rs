//! logsink - forwards log records to an SNS topic or an SQS queue.

use anyhow::{Context, Result};
use clap::Parser;
use logsink::{
    cli::{Cli, Command},
    config::Config,
    logging::init_logging,
    run::{pipe, send},
    DispatchHook, LogRecord,
};
use tracing::info;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli).unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(1);
    });

    init_logging(&config.log_level, None)?;

    match &config.hook.destination {
        Some(destination) => info!(%destination, "Connecting dispatch hook"),
        None => anyhow::bail!("no destination configured; use --topic, --queue or hook.destination"),
    }
    if let Some(levels) = &config.hook.accepted_levels {
        info!(?levels, "Forwarding selected levels only");
    }

    let hook = DispatchHook::connect(&config.hook).context("failed to set up dispatch hook")?;

    match cli.command.unwrap_or(Command::Pipe) {
        Command::Send {
            level,
            message,
            fields,
        } => {
            let mut record = LogRecord::new(level, message);
            record.data.extend(fields);
            send(&hook, &record).context("failed to send record")?;
        }
        Command::Pipe => {
            pipe(&hook, std::io::stdin().lock()).context("failed to read stdin")?;
        }
    }
    Ok(())
}
