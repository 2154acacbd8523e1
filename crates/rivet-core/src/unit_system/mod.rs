//! # Rivet Core Unit System
//!
//! Everything needed to describe units and turn a set of requested unit names
//! into an ordered build plan.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`descriptor`]**: The immutable [`UnitDescriptor`] record (name, dependencies,
//!   priority, configure and construct hooks) and the [`UnitContext`] handed to
//!   construct hooks.
//! - **[`registry`]**: The [`UnitRegistry`] catalogue. Several descriptors may share
//!   a name, for example alternate back-ends of the same logical unit.
//! - **[`resolver`]**: Depth-first expansion of requested names into a
//!   [`ResolvedPlan`], with unknown-name and cycle detection.
//! - **[`traits`]**: The [`Unit`] instance trait and the capability interfaces
//!   ([`Logger`], [`Server`]) instances may expose.
//! - **[`error`]**: [`UnitSystemError`](error::UnitSystemError).
pub mod descriptor;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod traits;

pub use descriptor::{ConfigureHook, ConstructHook, RegisteredUnit, UnitContext, UnitDescriptor, UnitId};
pub use error::UnitSystemError;
pub use registry::UnitRegistry;
pub use resolver::{resolve, ResolvedPlan};
pub use traits::{Capability, Logger, Server, Unit};
