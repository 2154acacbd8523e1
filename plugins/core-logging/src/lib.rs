//! # Core Logging
//!
//! The baseline `logger` unit every Rivet plan starts with.
//!
//! Configure registers `--debug`, `--verbose` and `--log-format`. Construct
//! installs a process-wide `tracing` subscriber (once), bridges records from
//! the `log` facade into it and hands out a [`Logger`] other units can look up.
use std::fmt;
use std::io;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use log::Level;
use rivet_core::kernel::constants::BASELINE_UNIT;
use rivet_core::kernel::error::{Error, Result};
use rivet_core::{FlagSet, Logger, Unit, UnitContext, UnitDescriptor};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt as tracing_fmt, EnvFilter, Registry};

pub const FLAG_DEBUG: &str = "debug";
pub const FLAG_VERBOSE: &str = "verbose";
pub const FLAG_LOG_FORMAT: &str = "log-format";

/// Set once the first subscriber install was attempted; holds whether it took
static INSTALLED: OnceLock<bool> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(Error::Other(format!(
                "unsupported log format '{}', expected 'text' or 'json'",
                other
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Logging options read from the parsed flags
#[derive(Debug, Clone, PartialEq)]
pub struct LogSettings {
    pub debug: bool,
    pub verbose: bool,
    pub format: LogFormat,
}

impl LogSettings {
    pub fn from_flags(flags: &FlagSet) -> Result<Self> {
        Ok(Self {
            debug: flags.get_bool(FLAG_DEBUG)?,
            verbose: flags.get_bool(FLAG_VERBOSE)?,
            format: flags.get_string(FLAG_LOG_FORMAT)?.parse()?,
        })
    }

    /// Filter directive used when `RUST_LOG` is not set
    pub fn directive(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.verbose {
            "info"
        } else {
            "warn"
        }
    }
}

/// Install the global subscriber. Only the first call per process has an
/// effect; returns whether a subscriber owned by this unit is active.
pub fn install(settings: &LogSettings) -> bool {
    *INSTALLED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(settings.directive()));
        let registry = Registry::default().with(filter);
        let result = match settings.format {
            LogFormat::Json => tracing::subscriber::set_global_default(
                registry.with(tracing_fmt::layer().json().with_target(true).with_writer(io::stderr)),
            ),
            LogFormat::Text => tracing::subscriber::set_global_default(
                registry.with(tracing_fmt::layer().with_target(true).with_writer(io::stderr)),
            ),
        };
        if let Err(e) = result {
            eprintln!("{}: a tracing subscriber is already installed: {}", BASELINE_UNIT, e);
            return false;
        }

        // Route `log` records from the core and other units into tracing
        if let Err(e) = tracing_log::LogTracer::init() {
            tracing::warn!("log records will not be captured: {}", e);
        }
        tracing::debug!(format = %settings.format, filter = settings.directive(), "Logging initialized");
        true
    })
}

/// The instance behind the `logger` unit
#[derive(Debug)]
pub struct LoggerUnit {
    settings: LogSettings,
}

impl LoggerUnit {
    pub fn new(settings: LogSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &LogSettings {
        &self.settings
    }
}

impl Unit for LoggerUnit {
    fn close(&self) -> Result<()> {
        tracing::debug!("Logger closed");
        Ok(())
    }

    fn as_logger(&self) -> Option<&(dyn Logger + 'static)> {
        Some(self)
    }
}

impl Logger for LoggerUnit {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::Error => tracing::error!(target: "rivet", "{}", message),
            Level::Warn => tracing::warn!(target: "rivet", "{}", message),
            Level::Info => tracing::info!(target: "rivet", "{}", message),
            Level::Debug => tracing::debug!(target: "rivet", "{}", message),
            Level::Trace => tracing::trace!(target: "rivet", "{}", message),
        }
    }

    fn is_debug(&self) -> bool {
        self.settings.debug
    }
}

pub fn configure(flags: &mut FlagSet) -> Result<()> {
    flags.flag_bool(FLAG_DEBUG, false, "Enable debug output")?;
    flags.flag_bool(FLAG_VERBOSE, false, "Enable informational output")?;
    flags.flag_string(FLAG_LOG_FORMAT, "text", "Log output format (text or json)")?;
    Ok(())
}

pub fn construct(ctx: &UnitContext<'_>) -> Result<Option<Arc<dyn Unit>>> {
    let settings = LogSettings::from_flags(ctx.flags())?;
    install(&settings);
    log::info!("Logger ready ({} output, filter '{}')", settings.format, settings.directive());
    let unit: Arc<dyn Unit> = Arc::new(LoggerUnit::new(settings));
    Ok(Some(unit))
}

/// Descriptor for the baseline `logger` unit
pub fn descriptor() -> UnitDescriptor {
    UnitDescriptor::new(BASELINE_UNIT)
        .on_configure(configure)
        .on_construct(construct)
}
