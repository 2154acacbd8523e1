pub mod flags;
pub mod kernel;
pub mod unit_system;

// Re-export key public types/traits for easier use by the binary and unit crates
pub use flags::FlagSet;
pub use kernel::error::Error as KernelError;
pub use kernel::{Application, CompoundError, InstanceRegistry, LifecycleState, UnitHandle};
pub use unit_system::{
    Capability, Logger, ResolvedPlan, Server, Unit, UnitContext, UnitDescriptor, UnitRegistry,
};
