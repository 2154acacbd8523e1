//! # Rivet Core Unit System Errors
//!
//! Errors raised while registering descriptors and resolving a build plan.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UnitSystemError {
    /// A requested or depended-upon name has no descriptor in the registry
    #[error("Unknown unit '{name}'{}", .required_by.as_ref().map(|r| format!(" (required by '{}')", r)).unwrap_or_default())]
    UnknownUnit {
        name: String,
        required_by: Option<String>,
    },

    /// Dependency cycle detected, path includes the repeated unit at both ends
    #[error("Circular dependency detected: {}", .0.join(" -> "))]
    CircularDependency(Vec<String>),

    #[error("Invalid unit descriptor '{name}': {reason}")]
    InvalidDescriptor { name: String, reason: String },
}

impl UnitSystemError {
    pub fn unknown(name: impl Into<String>, required_by: Option<&str>) -> Self {
        UnitSystemError::UnknownUnit {
            name: name.into(),
            required_by: required_by.map(str::to_string),
        }
    }
}
