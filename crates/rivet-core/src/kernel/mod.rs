//! # Rivet Core Kernel
//!
//! The `kernel` module drives an application through its lifecycle: resolve
//! the requested units, configure them, parse the command line, construct
//! instances and finally close them.
//!
//! ## Key Responsibilities & Components:
//!
//! - **Lifecycle Control**: The [`Application`](bootstrap::Application) struct from the
//!   `bootstrap` submodule owns the flag set, the resolved plan and the live instances,
//!   and tracks its [`LifecycleState`](bootstrap::LifecycleState).
//! - **Instance Registry**: [`InstanceRegistry`](component::InstanceRegistry) holds the
//!   constructed instances and answers name lookups by priority. Results are
//!   [`UnitHandle`](component::UnitHandle)s.
//! - **Application Flavours**: [`CommandTool`](tool::CommandTool) and
//!   [`ServerTool`](tool::ServerTool) in the `tool` submodule wrap a full run.
//! - **Core Constants**: Baseline unit name and exit statuses, in `constants`.
//! - **Error Handling**: The kernel [`Error`](error::Error), the `Result` alias and
//!   [`CompoundError`](error::CompoundError), in the `error` submodule.
pub mod bootstrap;
pub mod component;
pub mod constants;
pub mod error;
pub mod tool;

pub use bootstrap::{exit_status, Application, LifecycleState};
pub use component::{InstanceRegistry, UnitHandle};
pub use error::{CompoundError, Error, LifecyclePhase, Result};
pub use tool::{CommandTool, ServerTool};
