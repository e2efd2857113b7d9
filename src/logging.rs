//! Channel logging for the Card Package Manager
//!
//! Every component logs through three channels, each a `tracing` target:
//!
//! - audit (`cpm::audit`): the complete record, written to a rolling file
//! - user (`cpm::user`): short progress messages shown on the console
//! - error (`cpm::error`): failures with full context, written to a rolling file
//!
//! Components hold a [`ChannelLogger`] naming themselves. The subscriber built
//! by [`init`] routes each target to its destination with per-layer filters.

use std::fmt::{self, Display};
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::level_filters::LevelFilter;
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use crate::config::AppConfig;
use crate::constants::logging::{AUDIT_TARGET, ERROR_TARGET, USER_TARGET};
use crate::errors::ConfigResult;

const CRATE_TARGET: &str = "cpm";

/// Per-component handle on the three log channels
#[derive(Debug, Clone, Copy)]
pub struct ChannelLogger {
    component: &'static str,
}

impl ChannelLogger {
    /// Create a logger for the named component
    pub const fn new(component: &'static str) -> Self {
        Self { component }
    }

    /// Audit channel, debug level
    pub fn debug(&self, message: impl Display) {
        tracing::debug!(target: AUDIT_TARGET, "[{}] {}", self.component, message);
    }

    /// Audit channel, info level
    pub fn info(&self, message: impl Display) {
        tracing::info!(target: AUDIT_TARGET, "[{}] {}", self.component, message);
    }

    /// Audit channel, warn level
    pub fn warn(&self, message: impl Display) {
        tracing::warn!(target: AUDIT_TARGET, "[{}] {}", self.component, message);
    }

    /// User channel, also recorded by the audit file
    pub fn user(&self, message: impl Display) {
        tracing::info!(target: USER_TARGET, "{}", message);
    }

    /// User channel, warn level
    pub fn user_warn(&self, message: impl Display) {
        tracing::warn!(target: USER_TARGET, "{}", message);
    }

    /// Error channel
    pub fn error(&self, message: impl Display) {
        tracing::error!(target: ERROR_TARGET, "[{}] {}", self.component, message);
    }

    /// Error channel and user channel at once
    pub fn critical(&self, message: impl Display) {
        tracing::error!(target: ERROR_TARGET, critical = true, "[{}] {}", self.component, message);
        tracing::error!(target: USER_TARGET, "{}", message);
    }
}

/// File line format: `timestamp [LEVEL] -- target: message`
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelFormat;

impl<S, N> FormatEvent<S, N> for ChannelFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        SystemTime.format_time(&mut writer)?;
        write!(writer, " [{}] -- {}: ", metadata.level(), metadata.target())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Console verbosity selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only
    Quiet,
    /// User channel at info
    #[default]
    Normal,
    /// User channel plus crate internals at info
    Verbose,
    /// Everything at debug
    VeryVerbose,
}

/// Resolved logging destinations
#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Directory of the rolling files
    pub log_dir: PathBuf,
    /// Audit file prefix
    pub audit_file: String,
    /// Error file prefix
    pub error_file: String,
    /// Rotated files kept per channel
    pub max_log_files: usize,
    /// Console verbosity
    pub verbosity: Verbosity,
    /// Debug mode sends the audit channel to stderr
    pub debug: bool,
}

impl LogSettings {
    /// Resolve logging destinations from the application configuration
    pub fn from_config(config: &AppConfig, verbosity: Verbosity) -> ConfigResult<Self> {
        Ok(Self {
            log_dir: config.log_dir()?,
            audit_file: config.logging.audit_file.clone(),
            error_file: config.logging.error_file.clone(),
            max_log_files: config.logging.max_log_files.max(1),
            verbosity,
            debug: config.debug,
        })
    }

    /// Filter for the console layer
    pub fn console_filter(&self) -> Targets {
        let (crate_level, user_level) = match (self.verbosity, self.debug) {
            (Verbosity::Quiet, _) => (LevelFilter::OFF, LevelFilter::ERROR),
            (Verbosity::VeryVerbose, _) => (LevelFilter::DEBUG, LevelFilter::DEBUG),
            (Verbosity::Verbose, debug) => (
                LevelFilter::INFO,
                if debug { LevelFilter::DEBUG } else { LevelFilter::INFO },
            ),
            (Verbosity::Normal, true) => (LevelFilter::OFF, LevelFilter::DEBUG),
            (Verbosity::Normal, false) => (LevelFilter::OFF, LevelFilter::INFO),
        };

        Targets::new()
            .with_target(CRATE_TARGET, crate_level)
            .with_target(AUDIT_TARGET, crate_level)
            .with_target(ERROR_TARGET, crate_level)
            .with_target(USER_TARGET, user_level)
    }

    /// Filter for the audit layer: every event of this crate
    pub fn audit_filter(&self) -> Targets {
        Targets::new().with_target(CRATE_TARGET, LevelFilter::DEBUG)
    }

    /// Filter for the error layer
    pub fn error_filter(&self) -> Targets {
        Targets::new().with_target(ERROR_TARGET, LevelFilter::WARN)
    }

    fn rolling_appender(&self, prefix: &str) -> io::Result<RollingFileAppender> {
        RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(prefix)
            .max_log_files(self.max_log_files)
            .build(&self.log_dir)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}

/// Keeps the non-blocking writers flushing until dropped
#[must_use = "dropping the guards stops file logging"]
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

/// Initialize the logging system.
///
/// This sets up:
/// 1. A console layer (stderr) for the user channel.
/// 2. An audit layer recording everything, to a rolling file (stderr in debug mode).
/// 3. An error layer for the error channel, to a rolling file.
///
/// Returns guards which must be kept alive for the duration of the application
/// to ensure buffered logs are flushed on shutdown.
pub fn init(settings: &LogSettings) -> io::Result<LogGuards> {
    fs::create_dir_all(&settings.log_dir)?;
    let mut guards = Vec::new();

    let audit_writer = if settings.debug {
        BoxMakeWriter::new(io::stderr)
    } else {
        let appender = settings.rolling_appender(&settings.audit_file)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        guards.push(guard);
        BoxMakeWriter::new(non_blocking)
    };

    let error_appender = settings.rolling_appender(&settings.error_file)?;
    let (error_writer, guard) = tracing_appender::non_blocking(error_appender);
    guards.push(guard);

    let show_level = !matches!(settings.verbosity, Verbosity::Normal | Verbosity::Quiet);
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .without_time()
        .with_target(false)
        .with_level(show_level)
        .with_filter(settings.console_filter());

    let audit_layer = tracing_subscriber::fmt::layer()
        .event_format(ChannelFormat)
        .with_writer(audit_writer)
        .with_ansi(false)
        .with_filter(settings.audit_filter());

    let error_layer = tracing_subscriber::fmt::layer()
        .event_format(ChannelFormat)
        .with_writer(error_writer)
        .with_ansi(false)
        .with_filter(settings.error_filter());

    tracing_subscriber::registry()
        .with(console_layer)
        .with(audit_layer)
        .with(error_layer)
        .init();

    Ok(LogGuards { _guards: guards })
}

/// Most recently modified log file in `dir` whose name starts with `prefix`
pub fn latest_log_file(dir: &Path, prefix: &str) -> io::Result<Option<PathBuf>> {
    if !dir.exists() {
        return Ok(None);
    }

    let mut latest: Option<(std::time::SystemTime, PathBuf)> = None;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(prefix) || !entry.file_type()?.is_file() {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        if latest.as_ref().map_or(true, |(time, _)| modified >= *time) {
            latest = Some((modified, entry.path()));
        }
    }

    Ok(latest.map(|(_, path)| path))
}

/// Last `max_bytes` of a file, lossily decoded
pub fn tail(path: &Path, max_bytes: u64) -> io::Result<String> {
    let mut file = File::open(path)?;
    let len = file.seek(SeekFrom::End(0))?;
    file.seek(SeekFrom::Start(len.saturating_sub(max_bytes)))?;

    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
