use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::unit_system::descriptor::{RegisteredUnit, UnitDescriptor, UnitId};
use crate::unit_system::error::UnitSystemError;

/// Catalogue of every known unit descriptor.
///
/// Registration is additive only. The registry is filled before any plan is
/// resolved and is shared read-only (usually as `Arc<UnitRegistry>`) afterwards.
#[derive(Default)]
pub struct UnitRegistry {
    /// All descriptors in registration order, indexed by `UnitId`
    units: Vec<Arc<RegisteredUnit>>,
    /// Name -> ids in registration order
    by_name: HashMap<String, Vec<UnitId>>,
}

impl UnitRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor and return the id assigned to it
    pub fn register(&mut self, descriptor: UnitDescriptor) -> Result<UnitId, UnitSystemError> {
        let name = descriptor.name().trim();
        if name.is_empty() {
            return Err(UnitSystemError::InvalidDescriptor {
                name: descriptor.name().to_string(),
                reason: "unit name must not be empty".to_string(),
            });
        }
        if descriptor.dependencies().iter().any(|dep| dep == descriptor.name()) {
            return Err(UnitSystemError::InvalidDescriptor {
                name: descriptor.name().to_string(),
                reason: "unit cannot depend on its own name".to_string(),
            });
        }

        let id = UnitId(self.units.len());
        log::debug!(
            "Registering unit '{}' as {} (dependencies: [{}], priority {})",
            descriptor.name(),
            id,
            descriptor.dependencies().join(", "),
            descriptor.priority()
        );
        self.by_name.entry(descriptor.name().to_string()).or_default().push(id);
        self.units.push(Arc::new(RegisteredUnit::new(id, descriptor)));
        Ok(id)
    }

    /// All descriptors registered under `name`, in registration order
    pub fn lookup(&self, name: &str) -> Vec<Arc<RegisteredUnit>> {
        self.by_name
            .get(name)
            .map(|ids| ids.iter().filter_map(|id| self.get(*id)).collect())
            .unwrap_or_default()
    }

    /// Get a descriptor by id
    pub fn get(&self, id: UnitId) -> Option<Arc<RegisteredUnit>> {
        self.units.get(id.0).cloned()
    }

    /// Check if at least one descriptor is registered under `name`
    pub fn has_unit(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.keys().cloned().collect();
        names.sort();
        names
    }

    /// Iterate over every descriptor in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RegisteredUnit>> {
        self.units.iter()
    }

    /// Number of registered descriptors
    pub fn count(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

// Manual Debug implementation, lists names only
impl fmt::Debug for UnitRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.units.iter().map(|u| u.name()).collect();
        f.debug_struct("UnitRegistry").field("units", &names).finish()
    }
}
