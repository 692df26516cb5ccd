//! # Waypoint Logging
//!
//! Installs a global `tracing` subscriber built from a [`LogConfig`].
//!
//! - Console output as JSON lines (default) or pretty text
//! - Optional JSON-lines file output with daily or hourly rotation
//! - Spans opened under a [`StopContextGuard`] carry the stop they ran for
//!
//! `RUST_LOG`, when set, replaces the configured level.
//!
//! ```ignore
//! use waypoint_logging::{LogConfig, WaypointSubscriberBuilder};
//!
//! let _guard = WaypointSubscriberBuilder::new()
//!     .with_config(LogConfig::development().with_file("logs"))
//!     .init()?;
//! ```

pub mod config;
pub mod context;
pub mod layers;

pub use config::{
    ConsoleConfig, ConsoleFormat, FileConfig, JsonFields, LogConfig, RotationStrategy,
};
pub use context::{StopContextData, StopContextGuard};
pub use layers::{StopContextExtension, StopContextLayer, json_layer};

use std::fs;
use std::io;

use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, TestWriter};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt};

/// Why the subscriber could not be installed
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Bad level directive: {0}")]
    Directive(#[from] ParseError),

    #[error("Cannot open log file: {0}")]
    Io(#[from] io::Error),

    #[error("A global subscriber is already installed: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// Builds and installs the global subscriber
#[derive(Debug, Clone, Default)]
pub struct WaypointSubscriberBuilder {
    config: LogConfig,
}

impl WaypointSubscriberBuilder {
    /// Start from [`LogConfig::default`]: JSON lines on stdout at `info`
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.level = level.into();
        self
    }

    /// Turn the console sink on (keeping its settings) or off
    pub fn with_console(mut self, enabled: bool) -> Self {
        if !enabled {
            self.config.console = None;
        } else if self.config.console.is_none() {
            self.config.console = Some(ConsoleConfig::default());
        }
        self
    }

    pub fn with_file_output(mut self, file: FileConfig) -> Self {
        self.config.file = Some(file);
        self
    }

    fn env_filter(&self) -> Result<EnvFilter, LoggingError> {
        let mut filter = match EnvFilter::try_from_default_env() {
            Ok(from_env) => from_env,
            Err(_) => EnvFilter::try_new(&self.config.level)?,
        };
        for (target, level) in &self.config.targets {
            let directive: Directive = format!("{target}={level}").parse()?;
            filter = filter.add_directive(directive);
        }
        Ok(filter)
    }

    /// Install the subscriber for the whole process
    ///
    /// With a file sink configured the returned guard owns the background
    /// writer; lines still buffered are lost if it is dropped early.
    pub fn init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        let filter = self.env_filter()?;
        let LogConfig {
            console,
            file,
            json,
            ..
        } = self.config;

        let (file_sink, guard) = match file.as_ref().map(open_file).transpose()? {
            Some((writer, guard)) => (Some(writer), Some(guard)),
            None => (None, None),
        };

        let pretty = console
            .as_ref()
            .filter(|c| c.format == ConsoleFormat::Pretty)
            .map(|c| {
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_ansi(c.ansi)
                    .with_writer(console_writer(c.capture))
            });
        let console_json = console
            .as_ref()
            .filter(|c| c.format == ConsoleFormat::Json)
            .map(|c| json_layer(console_writer(c.capture), &json));
        let file_json = file_sink.map(|writer| json_layer(writer, &json));

        Registry::default()
            .with(filter)
            .with(StopContextLayer::new())
            .with(pretty)
            .with(console_json)
            .with(file_json)
            .try_init()?;

        Ok(guard)
    }
}

fn console_writer(capture: bool) -> BoxMakeWriter {
    if capture {
        BoxMakeWriter::new(TestWriter::default())
    } else {
        BoxMakeWriter::new(io::stdout)
    }
}

fn open_file(file: &FileConfig) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    let rotation = match file.rotation {
        RotationStrategy::Daily => Rotation::DAILY,
        RotationStrategy::Hourly => Rotation::HOURLY,
        RotationStrategy::Never => {
            fs::create_dir_all(&file.directory)?;
            let path = file.directory.join(format!("{}.log", file.prefix));
            return Ok(tracing_appender::non_blocking(fs::File::create(path)?));
        }
    };
    let appender = RollingFileAppender::new(rotation, &file.directory, &file.prefix);
    Ok(tracing_appender::non_blocking(appender))
}

/// JSON lines on stdout at `info`
pub fn init_default() -> Result<(), LoggingError> {
    WaypointSubscriberBuilder::new().init().map(drop)
}

/// Pretty console output at `debug`
pub fn init_development() -> Result<(), LoggingError> {
    WaypointSubscriberBuilder::new()
        .with_config(LogConfig::development())
        .init()
        .map(drop)
}

/// Captured warnings for tests; later calls are no-ops
pub fn init_testing() {
    let _ = WaypointSubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .init();
}
