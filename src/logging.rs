//! Logging setup shared by the primary and its workers.
//!
//! Both roles call [`init`] once at startup. Workers receive the primary's
//! effective settings through the environment (see [`LogConfig::worker_env`]),
//! so a `-vv` on the primary also makes every worker verbose.
//!
//! # Environment Variables
//!
//! - `COREFORK_LOG` - Log filter (overrides RUST_LOG)
//! - `COREFORK_LOG_LEVEL` - Log level: error, warn, info, debug, trace
//! - `COREFORK_LOG_FORMAT` - Output format: pretty, compact, json
//! - `COREFORK_LOG_FILE` - Path to log file (in addition to stdout)
//! - `COREFORK_LOG_ROTATION` - File rotation: hourly, daily, never
//! - `COREFORK_LOG_SPANS` - `1` or `true` to log span close events
//! - `RUST_LOG` - Standard Rust log filter (fallback)

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, MakeWriter, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub const ENV_LOG: &str = "COREFORK_LOG";
pub const ENV_LOG_LEVEL: &str = "COREFORK_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "COREFORK_LOG_FORMAT";
pub const ENV_LOG_FILE: &str = "COREFORK_LOG_FILE";
pub const ENV_LOG_ROTATION: &str = "COREFORK_LOG_ROTATION";
pub const ENV_LOG_SPANS: &str = "COREFORK_LOG_SPANS";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-field format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
    /// JSON lines for log aggregation
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "full" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "Unknown log format: '{}'. Valid options: pretty, compact, json",
                s
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Compact => write!(f, "compact"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Rotation policy for the log file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogRotation {
    Hourly,
    #[default]
    Daily,
    Never,
}

impl FromStr for LogRotation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "never" => Ok(Self::Never),
            _ => Err(format!(
                "Unknown log rotation: '{}'. Valid options: hourly, daily, never",
                s
            )),
        }
    }
}

impl std::fmt::Display for LogRotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hourly => write!(f, "hourly"),
            Self::Daily => write!(f, "daily"),
            Self::Never => write!(f, "never"),
        }
    }
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Base log level (default: INFO)
    pub level: Level,
    /// Output format (default: Pretty)
    pub format: LogFormat,
    /// Log file written in addition to stdout
    pub file_path: Option<PathBuf>,
    /// Rotation for the log file (default: Daily)
    pub rotation: LogRotation,
    /// Log span timing on close (request and handler spans)
    pub span_events: bool,
    /// Custom filter string (overrides level if set)
    pub filter: Option<String>,
    /// Show target module in logs
    pub show_target: bool,
    /// Colored stdout output
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Pretty,
            file_path: None,
            rotation: LogRotation::Daily,
            span_events: false,
            filter: None,
            show_target: true,
            ansi: true,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_file(mut self, path: PathBuf) -> Self {
        self.file_path = Some(path);
        self
    }

    pub fn with_rotation(mut self, rotation: LogRotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_filter(mut self, filter: String) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// Apply environment variable overrides.
    ///
    /// CLI arguments take precedence: if a filter is already set (from `-v`
    /// or `--log-level`), `COREFORK_LOG`, `RUST_LOG` and `COREFORK_LOG_LEVEL`
    /// are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if self.filter.is_none() {
            if let Ok(filter) = std::env::var(ENV_LOG) {
                self.filter = Some(filter);
            } else if let Ok(filter) = std::env::var("RUST_LOG") {
                self.filter = Some(filter);
            }
        }

        if self.filter.is_none()
            && let Ok(level_str) = std::env::var(ENV_LOG_LEVEL)
        {
            self.level = parse_level(&level_str).unwrap_or(self.level);
        }

        if let Ok(format) = std::env::var(ENV_LOG_FORMAT)
            && let Ok(f) = format.parse()
        {
            self.format = f;
        }

        if self.file_path.is_none()
            && let Ok(path) = std::env::var(ENV_LOG_FILE)
        {
            self.file_path = Some(PathBuf::from(path));
        }

        if let Ok(rotation) = std::env::var(ENV_LOG_ROTATION)
            && let Ok(r) = rotation.parse()
        {
            self.rotation = r;
        }

        if let Ok(spans) = std::env::var(ENV_LOG_SPANS) {
            self.span_events = matches!(spans.as_str(), "1" | "true");
        }

        self
    }

    /// The filter directive string this configuration resolves to.
    pub fn filter_directive(&self) -> String {
        self.filter
            .clone()
            .unwrap_or_else(|| self.level.to_string().to_lowercase())
    }

    /// Environment a spawned worker needs to log exactly like this process.
    pub fn worker_env(&self) -> Vec<(&'static str, String)> {
        let mut env = vec![
            (ENV_LOG, self.filter_directive()),
            (ENV_LOG_FORMAT, self.format.to_string()),
            (ENV_LOG_ROTATION, self.rotation.to_string()),
        ];
        if let Some(path) = &self.file_path {
            env.push((ENV_LOG_FILE, path.display().to_string()));
        }
        if self.span_events {
            env.push((ENV_LOG_SPANS, "1".to_string()));
        }
        env
    }

    fn build_filter(&self) -> EnvFilter {
        let directive = self.filter_directive();
        EnvFilter::try_new(&directive).unwrap_or_else(|_| {
            eprintln!("Warning: Invalid log filter '{}', using default", directive);
            EnvFilter::new(self.level.to_string().to_lowercase())
        })
    }
}

/// Parse a log level string.
pub fn parse_level(s: &str) -> Option<Level> {
    match s.to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

fn fmt_layer<W>(config: &LogConfig, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let span_events = if config.span_events {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let layer = fmt::layer()
        .with_span_events(span_events)
        .with_target(config.show_target)
        .with_ansi(ansi)
        .with_writer(writer);

    match config.format {
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Pretty => layer.boxed(),
    }
}

fn file_appender(path: &Path, rotation: LogRotation) -> RollingFileAppender {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("corefork.log");

    RollingFileAppender::new(rotation.into(), parent, file_name)
}

/// Install the global subscriber: stdout, plus the log file when configured.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init(config: LogConfig) {
    let filter = config.build_filter();
    let ansi = config.ansi && std::io::stdout().is_terminal();

    let mut layers = vec![fmt_layer(&config, std::io::stdout, ansi)];
    if let Some(path) = &config.file_path {
        layers.push(fmt_layer(
            &config,
            file_appender(path, config.rotation),
            false,
        ));
    }

    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init();
}
