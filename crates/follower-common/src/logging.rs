//! Logging setup
//!
//! Every binary in the workspace installs its `tracing` subscriber through
//! [`init_logging`]. Records go to the console, a daily-rotated file, or
//! both, as text or JSON, filtered by a base level plus per-target
//! directives.
//!
//! Use the structured macros with fields rather than `println!`:
//!
//! ```rust,ignore
//! info!(analysis_id = %id, packages = names.len(), "Dispatch started");
//! warn!(error = %err, ecosystem = "php", "Batch import failed");
//! ```
//!
//! # Environment
//!
//! | Variable | Example |
//! |---|---|
//! | `LOG_LEVEL` | `debug` |
//! | `LOG_OUTPUT` | `console`, `file`, `console,file` |
//! | `LOG_FORMAT` | `text`, `json` |
//! | `LOG_DIR` | `/var/log/follower` |
//! | `LOG_FILE_PREFIX` | `package-follower` |
//! | `LOG_FILTER` | `sqlx=warn,lapin=info` |
//! | `LOG_INCLUDE_LOCATION` | `true` |
//!
//! # Example
//!
//! ```no_run
//! use follower_common::logging::{init_logging, LogConfig};
//!
//! # fn main() -> follower_common::Result<()> {
//! let config = LogConfig::new("package-follower").merge_env()?;
//! let _guard = init_logging(&config)?;
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{self, format::FmtSpan, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::error::{FollowerError, Result};

/// Where log records are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogTargets {
    pub console: bool,
    pub file: bool,
}

impl Default for LogTargets {
    fn default() -> Self {
        Self {
            console: true,
            file: false,
        }
    }
}

impl FromStr for LogTargets {
    type Err = FollowerError;

    /// Comma-separated list of `console`/`stdout`, `file`, or `both`
    fn from_str(s: &str) -> Result<Self> {
        let mut targets = LogTargets {
            console: false,
            file: false,
        };

        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.to_lowercase().as_str() {
                "console" | "stdout" => targets.console = true,
                "file" => targets.file = true,
                "both" | "all" => {
                    targets.console = true;
                    targets.file = true;
                },
                other => {
                    return Err(FollowerError::config(format!("Unknown log output '{other}'")));
                },
            }
        }

        if !targets.console && !targets.file {
            return Err(FollowerError::config("LOG_OUTPUT names no target"));
        }
        Ok(targets)
    }
}

/// Record layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = FollowerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(FollowerError::config(format!("Unknown log format '{other}'"))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LevelFilter,
    pub targets: LogTargets,
    pub format: LogFormat,
    /// Directory of the rotated files, used when `targets.file` is set
    pub log_dir: PathBuf,
    /// File name prefix; files are suffixed with the date
    pub log_file_prefix: String,
    /// Extra `target=level` directives, comma separated
    pub directives: Option<String>,
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new("package-follower")
    }
}

impl LogConfig {
    /// Console text logging at `info` with the given file prefix
    pub fn new(log_file_prefix: impl Into<String>) -> Self {
        Self {
            level: LevelFilter::INFO,
            targets: LogTargets::default(),
            format: LogFormat::Text,
            log_dir: PathBuf::from("./logs"),
            log_file_prefix: log_file_prefix.into(),
            directives: None,
            include_location: false,
        }
    }

    /// Defaults overlaid with the environment
    pub fn from_env() -> Result<Self> {
        Self::default().merge_env()
    }

    /// Overlay the `LOG_*` variables; set but invalid values are errors
    pub fn merge_env(mut self) -> Result<Self> {
        if let Some(level) = env_override("LOG_LEVEL")? {
            self.level = level;
        }
        if let Some(targets) = env_override("LOG_OUTPUT")? {
            self.targets = targets;
        }
        if let Some(format) = env_override("LOG_FORMAT")? {
            self.format = format;
        }
        if let Some(dir) = env_override::<String>("LOG_DIR")? {
            self.log_dir = PathBuf::from(dir);
        }
        if let Some(prefix) = env_override("LOG_FILE_PREFIX")? {
            self.log_file_prefix = prefix;
        }
        if let Some(directives) = env_override("LOG_FILTER")? {
            self.directives = Some(directives);
        }
        if let Some(include) = env_override("LOG_INCLUDE_LOCATION")? {
            self.include_location = include;
        }
        Ok(self)
    }

    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    pub fn with_targets(mut self, targets: LogTargets) -> Self {
        self.targets = targets;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    pub fn with_directives(mut self, directives: impl Into<String>) -> Self {
        self.directives = Some(directives.into());
        self
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        let mut filter = EnvFilter::builder()
            .with_default_directive(self.level.into())
            .from_env_lossy();

        for directive in self
            .directives
            .iter()
            .flat_map(|d| d.split(','))
            .map(str::trim)
            .filter(|d| !d.is_empty())
        {
            let parsed = directive.parse().map_err(|e| {
                FollowerError::config(format!("Invalid log directive '{directive}': {e}"))
            })?;
            filter = filter.add_directive(parsed);
        }

        Ok(filter)
    }
}

/// Parsed value of `key`; `None` when unset or empty
fn env_override<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| FollowerError::config(format!("Invalid {key} '{raw}': {e}"))),
        _ => Ok(None),
    }
}

/// Flushes the file writer on drop; hold it for the life of the process
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn fmt_layer<W>(config: &LogConfig, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_span_events(FmtSpan::CLOSE);

    match config.format {
        LogFormat::Text => layer.boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}

/// Install the global subscriber
///
/// Fails if a subscriber is already installed. Keep the returned guard alive.
pub fn init_logging(config: &LogConfig) -> Result<LoggingGuard> {
    let filter = config.env_filter()?;
    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(2);
    let mut file_guard = None;

    if config.targets.console {
        layers.push(fmt_layer(config, std::io::stdout, true));
    }

    if config.targets.file {
        std::fs::create_dir_all(&config.log_dir)?;
        let appender = tracing_appender::rolling::daily(&config.log_dir, &config.log_file_prefix);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        layers.push(fmt_layer(config, writer, false));
        file_guard = Some(guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| FollowerError::config(format!("Tracing subscriber already set: {e}")))?;

    Ok(LoggingGuard { _file: file_guard })
}
