//! Command-line interface definitions using clap.
//!
//! The CLI only tunes logging. Whether a process is the primary or a worker
//! is never chosen here; see [`crate::role`].

use std::path::PathBuf;

use clap::Parser;
use tracing::Level;

use crate::logging::{LogConfig, LogFormat, LogRotation};
use crate::version;

/// Multi-process HTTP server: one worker per CPU core, replaced when it dies.
#[derive(Parser, Debug)]
#[command(name = "corefork")]
#[command(author, version, long_version = version::long_version(), about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log filter directive (e.g. "corefork=debug,tower_http=info").
    #[arg(long, conflicts_with_all = ["verbose", "quiet"])]
    pub log_level: Option<String>,

    /// Log output format.
    #[arg(long, value_parser = clap::value_parser!(LogFormat))]
    pub log_format: Option<LogFormat>,

    /// Also write logs to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Rotation for --log-file.
    #[arg(long, value_parser = clap::value_parser!(LogRotation))]
    pub log_rotation: Option<LogRotation>,

    /// Disable colored output.
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,
}

impl Cli {
    /// Resolve the logging configuration: CLI flags first, then environment.
    pub fn log_config(&self) -> LogConfig {
        let mut config = LogConfig::new().with_ansi(!self.no_color);

        if let Some(filter) = &self.log_level {
            config = config.with_filter(filter.clone());
        } else if self.quiet {
            config = config.with_filter("error".to_string());
        } else if self.verbose > 0 {
            let level = if self.verbose == 1 {
                Level::DEBUG
            } else {
                Level::TRACE
            };
            config = config
                .with_level(level)
                .with_filter(level.to_string().to_lowercase());
            config.span_events = level == Level::TRACE;
        }

        config = config.with_env_overrides();

        if let Some(format) = self.log_format {
            config = config.with_format(format);
        }
        if let Some(path) = &self.log_file {
            config = config.with_file(path.clone());
        }
        if let Some(rotation) = self.log_rotation {
            config = config.with_rotation(rotation);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbose_maps_to_debug_then_trace() {
        let cli = Cli::parse_from(["corefork", "-v"]);
        assert_eq!(cli.log_config().filter_directive(), "debug");

        let cli = Cli::parse_from(["corefork", "-vv"]);
        let config = cli.log_config();
        assert_eq!(config.filter_directive(), "trace");
        assert!(config.span_events);
    }

    #[test]
    fn test_quiet_only_logs_errors() {
        let cli = Cli::parse_from(["corefork", "--quiet"]);
        assert_eq!(cli.log_config().filter_directive(), "error");
    }

    #[test]
    fn test_explicit_log_level_wins() {
        let cli = Cli::parse_from(["corefork", "--log-level", "corefork=trace"]);
        assert_eq!(cli.log_config().filter_directive(), "corefork=trace");
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["corefork", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_log_format_and_file_flags() {
        let cli = Cli::parse_from([
            "corefork",
            "--log-format",
            "json",
            "--log-file",
            "/tmp/corefork.log",
            "--log-rotation",
            "hourly",
        ]);
        let config = cli.log_config();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.file_path, Some(PathBuf::from("/tmp/corefork.log")));
        assert_eq!(config.rotation, LogRotation::Hourly);
    }

    #[test]
    fn test_invalid_log_format_rejected() {
        assert!(Cli::try_parse_from(["corefork", "--log-format", "xml"]).is_err());
    }

    #[test]
    fn test_no_color_disables_ansi() {
        let cli = Cli::parse_from(["corefork", "--no-color"]);
        assert!(!cli.log_config().ansi);
    }
}
