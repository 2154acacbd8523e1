use std::ffi::OsString;
use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use crate::flags::{FlagDefaults, FlagError, FlagSet};
use crate::kernel::component::InstanceRegistry;
use crate::kernel::constants::{self, BASELINE_UNIT, EXIT_FAILURE, EXIT_HELP, EXIT_SUCCESS, EXIT_VERSION};
use crate::kernel::error::{CompoundError, Error, LifecyclePhase, Result};
use crate::unit_system::descriptor::UnitContext;
use crate::unit_system::registry::UnitRegistry;
use crate::unit_system::resolver::{resolve, ResolvedPlan};
use crate::unit_system::traits::Logger;

/// Where an [`Application`] is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    /// Plan resolved and every configure hook ran
    Configured,
    /// Command line parsed
    Parsed,
    /// Every construct hook ran, instances are frozen
    Running,
    Closed,
    Failed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Lifecycle controller: resolves the requested units, configures them,
/// parses the command line, constructs instances in plan order and closes
/// them in reverse.
pub struct Application {
    name: String,
    registry: Arc<UnitRegistry>,
    flags: FlagSet,
    defaults: Option<FlagDefaults>,
    plan: ResolvedPlan,
    instances: InstanceRegistry,
    state: LifecycleState,
}

impl Application {
    /// Creates a new application named `name` over the given unit catalogue.
    pub fn new(name: impl Into<String>, registry: Arc<UnitRegistry>) -> Self {
        let name = name.into();
        let flags = FlagSet::new(name.clone()).with_version(constants::APP_VERSION);
        Self {
            name,
            registry,
            flags,
            defaults: None,
            plan: ResolvedPlan::default(),
            instances: InstanceRegistry::new(),
            state: LifecycleState::Created,
        }
    }

    /// Version printed by `--version`
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.flags = self.flags.with_version(version);
        self
    }

    /// Description shown in the usage text
    pub fn with_about(mut self, about: impl Into<String>) -> Self {
        self.flags = self.flags.with_about(about);
        self
    }

    /// Flag defaults applied after the configure phase
    pub fn with_defaults(mut self, defaults: FlagDefaults) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Load flag defaults from a JSON, TOML or YAML file
    pub fn with_defaults_file(self, path: &Path) -> Result<Self> {
        let defaults = FlagDefaults::load(path)?;
        Ok(self.with_defaults(defaults))
    }

    /// Resolve the plan for `units` (plus the baseline unit) and run every
    /// configure hook in plan order. Stops at the first failure.
    pub fn init<S: AsRef<str>>(&mut self, units: &[S]) -> Result<()> {
        self.expect_state(LifecycleState::Created, LifecyclePhase::Init)?;
        log::info!("Initializing {}", self.name);

        let plan = match resolve(&self.registry, units) {
            Ok(plan) => plan,
            Err(e) => {
                log::error!("Failed to resolve units for {}: {}", self.name, e);
                return self.fail(e.into());
            }
        };

        for unit in plan.iter() {
            let Some(hook) = unit.descriptor().configure_hook() else {
                continue;
            };
            log::debug!("Configuring unit: {}", unit);
            if let Err(source) = hook(&mut self.flags) {
                log::error!("Error configuring unit {}: {}", unit.name(), source);
                return self.fail(Error::ConfigurationFailed {
                    unit: unit.name().to_string(),
                    source: Box::new(source),
                });
            }
        }

        if let Some(defaults) = &self.defaults {
            if let Err(e) = self.flags.apply_defaults(defaults) {
                return self.fail(e.into());
            }
        }

        log::info!("Configured {} units: {}", plan.len(), plan);
        self.plan = plan;
        self.state = LifecycleState::Configured;
        Ok(())
    }

    /// Parse `args` (program name first) and construct every unit in plan
    /// order. On a construction failure the instances built so far stay in
    /// the registry; call [`close`](Application::close) to release them.
    pub fn start<I, T>(&mut self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        self.expect_state(LifecycleState::Configured, LifecyclePhase::Parse)?;

        match self.flags.parse(args) {
            Ok(()) => {}
            Err(FlagError::HelpRequested) => return self.fail(Error::HelpRequested),
            Err(FlagError::VersionRequested) => return self.fail(Error::VersionRequested),
            Err(e) => return self.fail(e.into()),
        }
        self.state = LifecycleState::Parsed;

        log::info!("Constructing units...");
        let plan = self.plan.clone();
        for unit in plan.iter() {
            let Some(hook) = unit.descriptor().construct_hook() else {
                log::debug!("Unit {} has no constructor, skipping", unit);
                continue;
            };
            log::debug!("Constructing unit: {}", unit);
            let built = {
                let context = UnitContext::new(unit, &self.flags, &self.instances);
                hook(&context)
            };
            match built {
                Ok(Some(instance)) => {
                    if let Err(e) = self.instances.insert(Arc::clone(unit), instance) {
                        return self.fail(e);
                    }
                }
                Ok(None) => log::debug!("Unit {} produced no instance", unit),
                Err(source) => {
                    log::error!("Error constructing unit {}: {}", unit.name(), source);
                    return self.fail(Error::ConstructionFailed {
                        unit: unit.name().to_string(),
                        source: Box::new(source),
                    });
                }
            }
        }

        self.state = LifecycleState::Running;
        log::info!("{} running with {} unit instances", self.name, self.instances.len());
        Ok(())
    }

    /// [`start`](Application::start) mapped onto an exit status. Usage,
    /// version and errors are written to stderr.
    pub fn run<I, T>(&mut self, args: I) -> i32
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match self.start(args) {
            Ok(()) => EXIT_SUCCESS,
            Err(e) => self.report(&e, &mut io::stderr()),
        }
    }

    /// Write the message appropriate to `error` and return its exit status
    pub fn report(&self, error: &Error, out: &mut dyn Write) -> i32 {
        // Best effort, a closed stderr must not mask the status
        let _ = match error {
            Error::HelpRequested => write!(out, "{}", self.flags.usage()),
            Error::VersionRequested => write!(out, "{}", self.flags.version().unwrap_or_default()),
            other => writeln!(out, "{}: {}", self.name, other),
        };
        exit_status(error)
    }

    /// Close every instance in reverse construction order. Every instance is
    /// closed even when some fail; the failures are returned together.
    pub fn close(&mut self) -> Result<()> {
        if self.state == LifecycleState::Closed {
            return Ok(());
        }

        log::info!("Closing {} unit instances...", self.instances.len());
        let mut errors = CompoundError::new();
        for handle in self.instances.drain_reverse() {
            log::debug!("Closing unit: {}", handle.unit());
            if let Err(e) = handle.instance().close() {
                log::error!("Error closing unit {}: {}", handle.name(), e);
                errors.add(Error::CloseFailed {
                    unit: handle.name().to_string(),
                    source: Box::new(e),
                });
            }
        }
        self.state = LifecycleState::Closed;

        if errors.is_empty() {
            log::info!("{} closed", self.name);
        }
        errors.into_result()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    pub fn plan(&self) -> &ResolvedPlan {
        &self.plan
    }

    pub fn instances(&self) -> &InstanceRegistry {
        &self.instances
    }

    pub fn registry(&self) -> &Arc<UnitRegistry> {
        &self.registry
    }

    /// The baseline unit's logger
    pub fn logger(&self) -> Result<&dyn Logger> {
        self.instances.capability::<dyn Logger>(BASELINE_UNIT)
    }

    fn expect_state(&mut self, expected: LifecycleState, phase: LifecyclePhase) -> Result<()> {
        if self.state == expected {
            return Ok(());
        }
        Err(Error::Lifecycle {
            phase,
            message: format!("expected state {}, application is {}", expected, self.state),
        })
    }

    fn fail<T>(&mut self, error: Error) -> Result<T> {
        self.state = LifecycleState::Failed;
        Err(error)
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("plan", &self.plan.names())
            .field("instances", &self.instances)
            .finish()
    }
}

/// Exit status for an error returned by the lifecycle
pub fn exit_status(error: &Error) -> i32 {
    match error {
        Error::HelpRequested => EXIT_HELP,
        Error::VersionRequested => EXIT_VERSION,
        _ => EXIT_FAILURE,
    }
}
