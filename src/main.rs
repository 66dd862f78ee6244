//! File Rotation Job
//!
//! One-shot retention enforcement: deletes objects older than the configured
//! threshold under each prefix of a bucket, then exits. Meant to be triggered
//! by an external scheduler.

use anyhow::{Context, Result};
use clap::Parser;
use common::cli::utils;
use common::cli::{CommonArgs, CommonCommands};
use common::event::InvocationEvent;
use rotator::{RotationError, RotationMetrics, Rotator};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    args: CommonArgs,

    #[command(subcommand)]
    command: Option<CommonCommands>,
}

/// Waits for a shutdown signal (SIGINT or SIGTERM)
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

        tokio::select! {
            _ = sigint.recv() => tracing::warn!("Received SIGINT"),
            _ = sigterm.recv() => tracing::warn!("Received SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for shutdown signal")?;
        tracing::warn!("Received Ctrl+C");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    utils::init_logging(&cli.args);

    match execute(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = format!("{e:#}"), "File rotation failed");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the invocation succeeded.
async fn execute(cli: Cli) -> Result<bool> {
    let command = cli.command.clone().unwrap_or_default();

    // Needs no configuration, so a broken environment cannot fail it
    if matches!(command, CommonCommands::Version) {
        println!(
            "{}",
            utils::version_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
        );
        return Ok(true);
    }

    let config = utils::load_config(&cli.args)
        .map_err(RotationError::from)
        .context("Failed to load configuration")?;

    match command {
        CommonCommands::Config { json } => {
            utils::display_config(&config, json).context("Failed to display configuration")?;
            return Ok(true);
        }
        CommonCommands::Validate => {
            config.validate().map_err(RotationError::from)?;
            tracing::info!("Configuration validation passed");
            return Ok(true);
        }
        CommonCommands::Run | CommonCommands::Version => {}
    }

    if let Some(path) = &cli.args.event {
        let event = InvocationEvent::read(path).map_err(RotationError::from)?;
        let date = event.date().map_err(RotationError::from)?;
        tracing::info!(event_date = ?date, "Received invocation event");
    }

    let metrics = RotationMetrics::new();
    let rotator = Rotator::from_config(&config, metrics.clone())
        .context("Failed to initialize rotation job")?;

    let report = tokio::select! {
        report = rotator.run() => report,
        signal = wait_for_shutdown_signal() => {
            signal?;
            anyhow::bail!("Rotation run interrupted before completion");
        }
    };

    report.log();
    metrics.summary().log();

    Ok(report.is_success())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING_CONFIG: &str = "/nonexistent/rotations.toml";

    #[tokio::test]
    async fn test_version_ignores_unloadable_configuration() {
        let cli = Cli::parse_from(["file-rotations", "--config", MISSING_CONFIG, "version"]);
        assert!(execute(cli).await.unwrap());
    }

    #[tokio::test]
    async fn test_validate_reports_unloadable_configuration() {
        let cli = Cli::parse_from(["file-rotations", "--config", MISSING_CONFIG, "validate"]);
        let error = execute(cli).await.unwrap_err();
        assert!(format!("{error:#}").contains("Failed to load configuration"));
    }
}
