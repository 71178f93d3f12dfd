//! # Logger
//!
//! Installs the process-wide `tracing` subscriber.
//!
//! * Console output (compact, or JSON for log collectors).
//! * Optional rolling file output through a non-blocking writer.
//! * Level and module directives, with `RUST_LOG` taking over when no explicit filter is set.
//!
//! ## Example
//!
//! ```rust
//! # use velaux_logger::{Logger, LevelFilter};
//!
//! let _logger = Logger::builder()
//!     .name("velaux")
//!     .console(true)
//!     .level(LevelFilter::DEBUG)
//!     .init()
//!     .unwrap();
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use private::Sealed;
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};
use velaux_domain::config::LoggingConfig;

const DEFAULT_MAX_FILES: usize = 10;
const LOG_FILE_SUFFIX: &str = "log";

#[derive(Debug)]
struct Settings {
    console: bool,
    path: Option<PathBuf>,
    level: LevelFilter,
    rotation: Rotation,
    max_files: usize,
    json: bool,
    env_filter: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            console: true,
            path: None,
            level: LevelFilter::INFO,
            rotation: Rotation::DAILY,
            max_files: DEFAULT_MAX_FILES,
            json: false,
            env_filter: None,
        }
    }
}

#[derive(Debug)]
pub struct NoName;
#[derive(Debug)]
pub struct WithName(String);

mod private {
    pub trait Sealed {}
}
impl Sealed for NoName {}
impl Sealed for WithName {}

/// A builder for configuring and initializing the global tracing subscriber.
#[derive(Debug)]
pub struct LoggerBuilder<N: Sealed = NoName> {
    settings: Settings,
    name: N,
}

impl LoggerBuilder<NoName> {
    /// Sets the name used in log file prefixes.
    pub fn name(self, name: impl Into<String>) -> LoggerBuilder<WithName> {
        LoggerBuilder { name: WithName(name.into()), settings: self.settings }
    }
}

impl LoggerBuilder<WithName> {
    /// Applies the `logging` section of the server configuration.
    ///
    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] if `level` is not a known level.
    pub fn configure(mut self, config: &LoggingConfig) -> Result<Self, LoggerError> {
        self.settings.level = config.level.parse().map_err(|_| LoggerError::InvalidConfiguration {
            message: format!("unknown log level '{}'", config.level).into(),
            context: None,
        })?;
        self.settings.env_filter.clone_from(&config.filter);
        self.settings.json = config.json;
        self.settings.path.clone_from(&config.dir);
        Ok(self)
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.settings.level = level;
        self
    }

    /// Adds an explicit filter (e.g., `velaux_cluster=debug,hyper=info`).
    ///
    /// Without one, `RUST_LOG` is honored on top of the configured level.
    /// Invalid filters make [`LoggerBuilder::init`] fail.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn env_filter(mut self, filter: impl Into<String>) -> Self {
        self.settings.env_filter = Some(filter.into());
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.settings.console = enabled;
        self
    }

    /// Emits JSON lines on every enabled output.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn json(mut self, enabled: bool) -> Self {
        self.settings.json = enabled;
        self
    }

    /// Writes rolling log files into `path`.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.path = Some(path.into());
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn rotation(mut self, rotation: Rotation) -> Self {
        self.settings.rotation = rotation;
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn max_files(mut self, max: usize) -> Self {
        self.settings.max_files = max;
        self
    }

    /// Consumes the builder and installs the global subscriber.
    ///
    /// The returned [`Logger`] owns the file writer's [`WorkerGuard`]; keep it alive
    /// until shutdown so buffered lines are flushed.
    ///
    /// # Errors
    /// * [`LoggerError::Subscriber`] if a global subscriber is already set.
    /// * [`LoggerError::InvalidConfiguration`] for invalid settings.
    /// * [`LoggerError::Io`] / [`LoggerError::Appender`] if the log directory is unusable.
    pub fn init(self) -> Result<Logger, LoggerError> {
        let Self { settings, name: WithName(name) } = self;
        validate(&settings, &name)?;

        let env_filter = build_env_filter(&settings)?;
        let mut layers = Vec::new();

        if settings.console {
            let console = layer().with_target(true);
            layers.push(if settings.json {
                console.json().boxed()
            } else {
                console.compact().with_ansi(true).boxed()
            });
        }

        let guard = if let Some(path) = &settings.path {
            fs::create_dir_all(path)
                .context(format!("Failed to create path: {}", path.display()))?;

            let appender = RollingFileAppender::builder()
                .rotation(settings.rotation.clone())
                .filename_prefix(&name)
                .filename_suffix(LOG_FILE_SUFFIX)
                .max_log_files(settings.max_files)
                .build(path)?;

            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file = layer().with_writer(writer).with_ansi(false);
            layers.push(if settings.json { file.json().boxed() } else { file.boxed() });
            Some(guard)
        } else {
            None
        };

        if layers.is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "No logging layers enabled. Enable console or file output.".into(),
                context: None,
            });
        }

        tracing_subscriber::registry().with(env_filter).with(layers).try_init()?;
        tracing::debug!(logger = %name, json = settings.json, "Logger initialized");

        Ok(Logger { guard })
    }
}

/// Handle to the installed logging system.
///
/// Holds the background writer guard; drop it only on shutdown.
#[must_use = "Dropping this handle will stop background logging threads."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder { settings: Settings::default(), name: NoName }
    }

    #[must_use]
    pub const fn guard(&self) -> Option<&WorkerGuard> {
        self.guard.as_ref()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::info!("Logging system shutting down, flushing buffers...");
        }
    }
}

fn validate(settings: &Settings, name: &str) -> Result<(), LoggerError> {
    if name.trim().is_empty() {
        return Err(LoggerError::InvalidConfiguration {
            message: "Logger name cannot be empty".into(),
            context: None,
        });
    }

    if settings.path.is_some() && settings.max_files == 0 {
        return Err(LoggerError::InvalidConfiguration {
            message: "max_files must be greater than zero".into(),
            context: None,
        });
    }

    Ok(())
}

fn build_env_filter(settings: &Settings) -> Result<EnvFilter, LoggerError> {
    let builder = EnvFilter::builder().with_default_directive(settings.level.into());
    settings.env_filter.as_ref().map_or_else(
        || Ok(builder.from_env_lossy()),
        |filter| {
            builder.parse(filter).map_err(|e| LoggerError::InvalidConfiguration {
                message: format!("Invalid env filter '{filter}': {e}").into(),
                context: None,
            })
        },
    )
}
