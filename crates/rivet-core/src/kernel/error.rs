//! # Rivet Core Kernel Errors
//!
//! Defines the primary [`Error`] enum returned by the lifecycle controller and
//! by unit hooks, plus [`CompoundError`], which aggregates the failures of the
//! close phase so that none of them is lost.
use std::fmt;
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::flags::error::FlagError;
use crate::unit_system::descriptor::UnitId;
use crate::unit_system::error::UnitSystemError;

#[derive(Debug, ThisError)]
pub enum Error {
    /// Registration or resolution failure (unknown unit, cycle, bad descriptor)
    #[error("Unit system error: {0}")]
    UnitSystem(#[from] UnitSystemError),

    /// Flag registration, lookup or parse failure
    #[error("Flag error: {0}")]
    Flags(#[from] FlagError),

    /// A unit's configure hook failed
    #[error("{unit}: configuration failed: {source}")]
    ConfigurationFailed {
        unit: String,
        #[source]
        source: Box<Error>,
    },

    /// A unit's construct hook failed
    #[error("{unit}: construction failed: {source}")]
    ConstructionFailed {
        unit: String,
        #[source]
        source: Box<Error>,
    },

    /// A unit instance failed to close; only ever found inside a [`CompoundError`]
    #[error("{unit}: close failed: {source}")]
    CloseFailed {
        unit: String,
        #[source]
        source: Box<Error>,
    },

    /// A descriptor was constructed twice
    #[error("Unit '{unit}' ({id}) already has an instance")]
    DuplicateRegistration { unit: String, id: UnitId },

    /// Name lookup with no match, or a match lacking the requested capability
    #[error("{}", not_found_message(.name, .capability))]
    NotFound {
        name: String,
        capability: Option<&'static str>,
    },

    /// Aggregate of close failures
    #[error(transparent)]
    Compound(#[from] CompoundError),

    /// A phase was entered from the wrong state
    #[error("Kernel lifecycle error during {phase}: {message}")]
    Lifecycle { phase: LifecyclePhase, message: String },

    /// Usage was requested on the command line
    #[error("Help requested")]
    HelpRequested,

    /// The version was requested on the command line
    #[error("Version requested")]
    VersionRequested,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

fn not_found_message(name: &str, capability: &Option<&'static str>) -> String {
    match capability {
        Some(capability) => format!("Unit '{}' does not provide capability '{}'", name, capability),
        None => format!("No unit instance named '{}'", name),
    }
}

/// Represents a specific phase in the application lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum LifecyclePhase {
    #[error("Init")]
    Init,
    #[error("Parse")]
    Parse,
    #[error("Construct")]
    Construct,
    #[error("Run")]
    Run,
    #[error("Close")]
    Close,
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl Error {
    pub fn not_found(name: impl Into<String>) -> Self {
        Error::NotFound {
            name: name.into(),
            capability: None,
        }
    }

    pub fn missing_capability(name: impl Into<String>, capability: &'static str) -> Self {
        Error::NotFound {
            name: name.into(),
            capability: Some(capability),
        }
    }

    /// Name of the unit a configure, construct or close failure is attributed to
    pub fn unit_name(&self) -> Option<&str> {
        match self {
            Error::ConfigurationFailed { unit, .. }
            | Error::ConstructionFailed { unit, .. }
            | Error::CloseFailed { unit, .. }
            | Error::DuplicateRegistration { unit, .. } => Some(unit),
            _ => None,
        }
    }
}

/// Zero or more errors collected while carrying on past failures
#[derive(Debug, Default)]
pub struct CompoundError {
    errors: Vec<Error>,
}

impl CompoundError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, error: Error) {
        self.errors.push(error);
    }

    /// Record the error of `result`, if any
    pub fn push_result(&mut self, result: Result<()>) {
        if let Err(error) = result {
            self.add(error);
        }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<Error> {
        self.errors
    }

    /// `Ok` when nothing was collected, otherwise `Err(Error::Compound)`
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Compound(self))
        }
    }
}

impl fmt::Display for CompoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => write!(f, "No errors"),
            [only] => write!(f, "{}", only),
            errors => {
                write!(f, "{} errors occurred:", errors.len())?;
                for (index, error) in errors.iter().enumerate() {
                    write!(f, " [{}] {}", index + 1, error)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for CompoundError {}
