use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Common CLI arguments for the rotation job
#[derive(Parser, Debug, Clone, Default)]
pub struct CommonArgs {
    #[arg(long, global = true, help = "Configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Enable quiet mode (minimal output)")]
    pub quiet: bool,

    #[arg(
        long,
        global = true,
        help = "Log candidates without deleting anything (overrides configuration)"
    )]
    pub dry_run: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Scheduler event payload as JSON ('-' reads stdin)"
    )]
    pub event: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, Default)]
pub enum CommonCommands {
    /// Run one rotation pass (default behavior)
    #[default]
    Run,
    /// Show current configuration and exit
    Config {
        #[arg(long, help = "Show configuration in JSON format")]
        json: bool,
    },
    /// Validate configuration and exit
    Validate,
    /// Show version information and exit
    Version,
}

/// Utility functions for CLI operations
pub mod utils {
    use super::*;
    use crate::config::{ConfigError, Configuration};
    use tracing_subscriber::EnvFilter;

    /// Initialize logging based on CLI arguments; `RUST_LOG` wins when set.
    pub fn init_logging(args: &CommonArgs) {
        let level = if args.quiet {
            "warn"
        } else if args.verbose {
            "debug"
        } else {
            "info"
        };

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    /// Load configuration, applying command-line overrides on top.
    pub fn load_config(args: &CommonArgs) -> Result<Configuration, ConfigError> {
        if let Some(path) = &args.config {
            tracing::info!(path = %path.display(), "Loading configuration");
        }

        let mut config = Configuration::load(args.config.as_deref())?;
        if args.dry_run {
            config.dry_run = true;
        }
        Ok(config)
    }

    /// Display configuration in human-readable or JSON format
    pub fn display_config(config: &Configuration, json: bool) -> Result<(), serde_json::Error> {
        if json {
            println!("{}", serde_json::to_string_pretty(config)?);
        } else {
            println!("File Rotation Configuration:");
            println!("============================");
            println!("Bucket: {}", config.bucket);
            println!("Prefixes: {}", config.prefixes.join(", "));
            println!(
                "Name filter: {}",
                config.effective_name_filter().unwrap_or("(none)")
            );
            println!("Threshold: {} days", config.threshold_days);
            println!("Dry run: {}", config.dry_run);
            println!("On prefix error: {:?}", config.on_prefix_error);
            println!("Concurrent prefixes: {}", config.max_concurrent_prefixes);
            println!("Storage backend: {:?}", config.storage.backend);
            if let Some(endpoint) = &config.storage.endpoint {
                println!("Storage endpoint: {endpoint}");
            }
            println!("Request timeout: {:?}", config.storage.request_timeout);
            println!(
                "Keys per delete request: {}",
                config.storage.max_keys_per_request
            );
        }
        Ok(())
    }

    /// Standard version information for a binary, with the shared library version
    pub fn version_info(name: &str, version: &str) -> String {
        format!(
            "{name} {version} (common {}, rust {})",
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_RUST_VERSION")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        args: CommonArgs,
        #[command(subcommand)]
        command: Option<CommonCommands>,
    }

    #[test]
    fn test_common_commands_default() {
        assert!(matches!(CommonCommands::default(), CommonCommands::Run));
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = TestCli::parse_from([
            "file-rotations",
            "--dry-run",
            "--event",
            "event.json",
            "-v",
        ]);
        assert!(cli.args.dry_run);
        assert!(cli.args.verbose);
        assert_eq!(cli.args.event, Some(PathBuf::from("event.json")));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_config_subcommand() {
        let cli = TestCli::parse_from(["file-rotations", "config", "--json"]);
        assert!(matches!(
            cli.command,
            Some(CommonCommands::Config { json: true })
        ));
    }

    #[test]
    fn test_version_info() {
        let version = utils::version_info("file-rotations", "9.9.9");
        assert!(version.starts_with("file-rotations 9.9.9"));
        assert!(version.contains(env!("CARGO_PKG_VERSION")));
    }
}
