//! # Logger
//!
//! Installs the process-wide `tracing` subscriber.
//!
//! * compact ANSI console output,
//! * an optional non-blocking rolling file (daily by default) in plain text or JSON,
//! * an [`EnvFilter`] built from the configured level, an optional directive string and
//!   `RUST_LOG`.
//!
//! ```rust,no_run
//! use whub_logger::{LevelFilter, Logger};
//!
//! let _logger = Logger::builder("whub-server")
//!     .level(LevelFilter::DEBUG)
//!     .filter("surrealdb=warn")
//!     .init()
//!     .unwrap();
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use std::path::PathBuf;
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

const DEFAULT_MAX_FILES: usize = 10;

/// Parses a level name such as `"info"` or `"DEBUG"`.
///
/// # Errors
///
/// [`LoggerError::InvalidConfiguration`] for unknown names.
pub fn parse_level(level: &str) -> Result<LevelFilter, LoggerError> {
    LevelFilter::from_str(level.trim()).map_err(|_| LoggerError::InvalidConfiguration {
        message: format!("unknown log level '{level}'").into(),
        context: None,
    })
}

/// Configures and installs the global subscriber.
#[derive(Debug)]
pub struct LoggerBuilder {
    name: String,
    console: bool,
    level: LevelFilter,
    filter: Option<String>,
    path: Option<PathBuf>,
    rotation: Rotation,
    max_files: usize,
    json: bool,
}

impl LoggerBuilder {
    #[must_use]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Extra directives such as `"whub=debug,hyper=warn"`. `RUST_LOG` still wins.
    #[must_use]
    pub fn filter(mut self, directives: impl Into<String>) -> Self {
        let directives = directives.into();
        self.filter = (!directives.trim().is_empty()).then_some(directives);
        self
    }

    #[must_use]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    /// Writes log files into `dir`, named `<name>.<date>.log`.
    #[must_use]
    pub fn path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.path = Some(dir.into());
        self
    }

    #[must_use]
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    #[must_use]
    pub const fn max_files(mut self, max: usize) -> Self {
        self.max_files = max;
        self
    }

    /// Emits file output as JSON lines.
    #[must_use]
    pub const fn json(mut self, enabled: bool) -> Self {
        self.json = enabled;
        self
    }

    /// Installs the subscriber.
    ///
    /// The returned [`Logger`] owns the file writer guard and must live as long as the process.
    ///
    /// # Errors
    ///
    /// * [`LoggerError::InvalidConfiguration`] for an empty name, zero `max_files`, a bad filter
    ///   or when neither console nor file output is enabled.
    /// * [`LoggerError::Io`] / [`LoggerError::Appender`] when the log directory is unusable.
    /// * [`LoggerError::Subscriber`] when a subscriber is already installed.
    pub fn init(self) -> Result<Logger, LoggerError> {
        self.validate()?;
        let env_filter = self.env_filter()?;

        let mut layers = Vec::new();
        if self.console {
            layers.push(fmt::layer().compact().with_ansi(true).boxed());
        }

        let guard = match &self.path {
            Some(dir) => {
                std::fs::create_dir_all(dir)
                    .context(format!("Creating log directory {}", dir.display()))?;

                let appender = RollingFileAppender::builder()
                    .rotation(self.rotation.clone())
                    .filename_prefix(&self.name)
                    .filename_suffix("log")
                    .max_log_files(self.max_files)
                    .build(dir)?;
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let file = fmt::layer().with_writer(writer).with_ansi(false);
                layers.push(if self.json { file.json().boxed() } else { file.boxed() });
                Some(guard)
            },
            None => None,
        };

        tracing_subscriber::registry().with(env_filter).with(layers).try_init()?;
        tracing::debug!(name = %self.name, level = %self.level, "Logger initialised");

        Ok(Logger { guard })
    }

    fn validate(&self) -> Result<(), LoggerError> {
        let problem = if self.name.trim().is_empty() {
            Some("logger name cannot be empty")
        } else if self.max_files == 0 {
            Some("max_files must be greater than zero")
        } else if !self.console && self.path.is_none() {
            Some("enable console output or set a log path")
        } else {
            None
        };

        problem.map_or(Ok(()), |message| {
            Err(LoggerError::InvalidConfiguration { message: message.into(), context: None })
        })
    }

    fn env_filter(&self) -> Result<EnvFilter, LoggerError> {
        let builder = EnvFilter::builder().with_default_directive(self.level.into());
        match &self.filter {
            None => Ok(builder.from_env_lossy()),
            Some(directives) => {
                let mut filter = builder.parse(directives).map_err(|e| {
                    LoggerError::InvalidConfiguration {
                        message: format!("invalid filter '{directives}': {e}").into(),
                        context: None,
                    }
                })?;
                if let Ok(env) = std::env::var(EnvFilter::DEFAULT_ENV) {
                    for directive in env.split(',').filter_map(|d| d.parse().ok()) {
                        filter = filter.add_directive(directive);
                    }
                }
                Ok(filter)
            },
        }
    }
}

/// Keeps the non-blocking file writer alive; drop it only at shutdown.
#[must_use = "dropping the logger stops the background file writer"]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Starts a builder; `name` prefixes the rolling file names.
    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder {
            name: name.into(),
            console: true,
            level: LevelFilter::INFO,
            filter: None,
            path: None,
            rotation: Rotation::DAILY,
            max_files: DEFAULT_MAX_FILES,
            json: false,
        }
    }

    #[must_use]
    pub const fn writes_files(&self) -> bool {
        self.guard.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let builder = Logger::builder("whub");
        assert!(builder.console);
        assert!(!builder.json);
        assert_eq!(builder.level, LevelFilter::INFO);
        assert_eq!(builder.max_files, DEFAULT_MAX_FILES);
        assert!(builder.path.is_none());
    }

    #[test]
    fn blank_filter_is_dropped() {
        assert!(Logger::builder("whub").filter("  ").filter.is_none());
        let builder = Logger::builder("whub").filter("whub=debug");
        assert_eq!(builder.filter.as_deref(), Some("whub=debug"));
    }

    #[test]
    fn parse_level_accepts_any_case() {
        assert_eq!(parse_level("debug").unwrap(), LevelFilter::DEBUG);
        assert_eq!(parse_level(" WARN ").unwrap(), LevelFilter::WARN);
        assert!(matches!(parse_level("loud"), Err(LoggerError::InvalidConfiguration { .. })));
    }

    #[test]
    fn validation_rejects_unusable_settings() {
        assert!(Logger::builder("").validate().is_err());
        assert!(Logger::builder("whub").max_files(0).validate().is_err());
        assert!(Logger::builder("whub").console(false).validate().is_err());
        assert!(Logger::builder("whub").console(false).path("logs").validate().is_ok());
    }

    #[test]
    fn bad_filter_is_reported() {
        let err = Logger::builder("whub").filter("whub=[").env_filter().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }
}
