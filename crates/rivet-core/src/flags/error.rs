//! # Rivet Core Flag Errors
//!
//! Errors raised by the [`FlagSet`](crate::flags::FlagSet): registration
//! problems, typed lookups, command-line parsing (including the help and
//! version short-circuits) and defaults files.
use std::path::PathBuf;

use thiserror::Error;

use crate::flags::flagset::FlagKind;

#[derive(Debug, Error)]
pub enum FlagError {
    #[error("Flag '--{0}' is already registered")]
    DuplicateFlag(String),

    #[error("Unknown flag '--{0}'")]
    UnknownFlag(String),

    #[error("Invalid flag name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Flag '--{name}' holds a {actual} value, not a {expected} value")]
    TypeMismatch {
        name: String,
        expected: FlagKind,
        actual: FlagKind,
    },

    #[error("Flags for '{0}' have already been parsed")]
    AlreadyParsed(String),

    #[error("Invalid value for flag '--{name}': {reason}")]
    InvalidValue { name: String, reason: String },

    /// Command-line parse failure, message as rendered by the parser
    #[error("{0}")]
    Parse(String),

    #[error("Help requested")]
    HelpRequested,

    #[error("Version requested")]
    VersionRequested,

    #[error("I/O error reading defaults file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported defaults file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Deserialization from '{format}' failed: {message}")]
    Deserialization { format: String, message: String },
}
