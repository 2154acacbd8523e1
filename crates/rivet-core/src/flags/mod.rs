//! # Rivet Core Flags
//!
//! The shared command-line surface every unit configures against.
//!
//! Units register typed flags from their configure hooks; the application
//! parses the process arguments once, after every configure hook has run, and
//! construct hooks read the parsed values. Defaults for registered flags can
//! be overridden from a JSON, TOML or YAML file before parsing.
pub mod defaults;
pub mod error;
pub mod flagset;

pub use defaults::{DefaultsFormat, FlagDefaults};
pub use error::FlagError;
pub use flagset::{Flag, FlagKind, FlagSet, FlagValue};
