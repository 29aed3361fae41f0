//! Logging initialization for pipeline workers
//!
//! Every worker process calls [`init_logging`] once at startup. Use the
//! `tracing` macros with structured fields throughout; never `println!`.
//!
//! ```no_run
//! use bagflow_common::logging::{init_logging, LogConfig};
//! use tracing::info;
//!
//! let config = LogConfig::from_env();
//! init_logging(&config).unwrap();
//! info!(bag = "uc.edu/cin.675812", "starting fetch");
//! ```

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Minimum level emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
    /// Also write daily-rotated files into `log_dir` when set
    pub log_dir: Option<PathBuf>,
    pub file_prefix: String,
    /// Extra filter directives, e.g. "reqwest=warn"
    pub filter_directives: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            json: false,
            log_dir: None,
            file_prefix: "bagflow".to_string(),
            filter_directives: None,
        }
    }
}

impl LogConfig {
    /// Read `LOG_LEVEL`, `LOG_FORMAT`, `LOG_DIR`, `LOG_FILE_PREFIX` and
    /// `LOG_FILTER` from the environment, defaulting anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(level) = std::env::var("LOG_LEVEL").ok().and_then(|s| LogLevel::parse(&s)) {
            config.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            config.json = format.eq_ignore_ascii_case("json");
        }
        if let Ok(dir) = std::env::var("LOG_DIR") {
            config.log_dir = Some(PathBuf::from(dir));
        }
        if let Ok(prefix) = std::env::var("LOG_FILE_PREFIX") {
            config.file_prefix = prefix;
        }
        if let Ok(filter) = std::env::var("LOG_FILTER") {
            config.filter_directives = Some(filter);
        }

        config
    }
}

/// Install the global tracing subscriber. Call once at startup.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let mut filter =
        EnvFilter::from_default_env().add_directive(config.level.to_tracing_level().into());

    if let Some(ref directives) = config.filter_directives {
        for directive in directives.split(',') {
            filter = filter.add_directive(
                directive
                    .trim()
                    .parse()
                    .context("Failed to parse filter directive")?,
            );
        }
    }

    // Each subscriber stack below has its own layer type, so every branch
    // builds its layers in place rather than sharing one binding.
    match &config.log_dir {
        None => {
            if config.json {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(
                        fmt::layer()
                            .with_writer(std::io::stdout)
                            .with_target(true)
                            .with_span_events(FmtSpan::CLOSE)
                            .json(),
                    )
                    .try_init()?;
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(
                        fmt::layer()
                            .with_writer(std::io::stdout)
                            .with_target(true)
                            .with_span_events(FmtSpan::CLOSE),
                    )
                    .try_init()?;
            }
        },
        Some(dir) => {
            std::fs::create_dir_all(dir).context("Failed to create log directory")?;
            let appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            // keep the flush guard alive for the process lifetime
            std::mem::forget(guard);

            if config.json {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(
                        fmt::layer()
                            .with_writer(std::io::stdout)
                            .with_target(true)
                            .with_span_events(FmtSpan::CLOSE)
                            .json(),
                    )
                    .with(
                        fmt::layer()
                            .with_writer(non_blocking)
                            .with_target(true)
                            .with_span_events(FmtSpan::CLOSE)
                            .with_ansi(false)
                            .json(),
                    )
                    .try_init()?;
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(
                        fmt::layer()
                            .with_writer(std::io::stdout)
                            .with_target(true)
                            .with_span_events(FmtSpan::CLOSE),
                    )
                    .with(
                        fmt::layer()
                            .with_writer(non_blocking)
                            .with_target(true)
                            .with_span_events(FmtSpan::CLOSE)
                            .with_ansi(false),
                    )
                    .try_init()?;
            }
        },
    }

    Ok(())
}
