use std::fmt;
use std::sync::Arc;

use crate::flags::FlagSet;
use crate::kernel::component::{InstanceRegistry, UnitHandle};
use crate::kernel::error::Result;
use crate::unit_system::traits::{Capability, Unit};

/// Hook run during the configure phase, usually to register flags
pub type ConfigureHook = Arc<dyn Fn(&mut FlagSet) -> Result<()> + Send + Sync>;

/// Hook run during the construct phase. Returning `Ok(None)` means the unit
/// contributes configuration only and has no instance.
pub type ConstructHook = Arc<dyn Fn(&UnitContext<'_>) -> Result<Option<Arc<dyn Unit>>> + Send + Sync>;

/// Static metadata for one registrable unit type
#[derive(Clone)]
pub struct UnitDescriptor {
    name: String,
    dependencies: Vec<String>,
    priority: i32,
    configure: Option<ConfigureHook>,
    construct: Option<ConstructHook>,
}

impl UnitDescriptor {
    /// Create a descriptor with no dependencies, priority 0 and no hooks
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            priority: 0,
            configure: None,
            construct: None,
        }
    }

    /// Add dependency names. Repeated names are kept once, in first-seen order.
    pub fn depends_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.dependencies.contains(&name) {
                self.dependencies.push(name);
            }
        }
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn on_configure<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut FlagSet) -> Result<()> + Send + Sync + 'static,
    {
        self.configure = Some(Arc::new(hook));
        self
    }

    pub fn on_construct<F>(mut self, hook: F) -> Self
    where
        F: Fn(&UnitContext<'_>) -> Result<Option<Arc<dyn Unit>>> + Send + Sync + 'static,
    {
        self.construct = Some(Arc::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn configure_hook(&self) -> Option<&ConfigureHook> {
        self.configure.as_ref()
    }

    pub fn construct_hook(&self) -> Option<&ConstructHook> {
        self.construct.as_ref()
    }
}

// Manual Debug implementation, hooks are opaque
impl fmt::Debug for UnitDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitDescriptor")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("priority", &self.priority)
            .field("configure", &self.configure.is_some())
            .field("construct", &self.construct.is_some())
            .finish()
    }
}

/// Identity of a registered descriptor: its registration sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub(crate) usize);

impl UnitId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A descriptor owned by a [`UnitRegistry`](crate::unit_system::UnitRegistry).
/// Never mutated after registration.
#[derive(Debug)]
pub struct RegisteredUnit {
    id: UnitId,
    descriptor: UnitDescriptor,
}

impl RegisteredUnit {
    pub(crate) fn new(id: UnitId, descriptor: UnitDescriptor) -> Self {
        Self { id, descriptor }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn dependencies(&self) -> &[String] {
        self.descriptor.dependencies()
    }

    pub fn priority(&self) -> i32 {
        self.descriptor.priority()
    }

    pub fn descriptor(&self) -> &UnitDescriptor {
        &self.descriptor
    }
}

impl fmt::Display for RegisteredUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{} (priority {})", self.name(), self.id, self.priority())
    }
}

/// View of the runtime handed to a construct hook: the parsed flags and the
/// instances built so far, which always include the unit's dependencies.
pub struct UnitContext<'a> {
    unit: &'a RegisteredUnit,
    flags: &'a FlagSet,
    instances: &'a InstanceRegistry,
}

impl<'a> UnitContext<'a> {
    pub(crate) fn new(unit: &'a RegisteredUnit, flags: &'a FlagSet, instances: &'a InstanceRegistry) -> Self {
        Self { unit, flags, instances }
    }

    /// The descriptor being constructed
    pub fn unit(&self) -> &RegisteredUnit {
        self.unit
    }

    pub fn flags(&self) -> &FlagSet {
        self.flags
    }

    pub fn instances(&self) -> &InstanceRegistry {
        self.instances
    }

    /// Look up an already-constructed unit by name
    pub fn lookup(&self, name: &str) -> Result<UnitHandle> {
        self.instances.lookup(name)
    }

    /// Look up an already-constructed unit and view it through capability `C`
    pub fn capability<C: Capability + ?Sized>(&self, name: &str) -> Result<&'a C> {
        self.instances.capability::<C>(name)
    }
}
