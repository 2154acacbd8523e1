use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::kernel::error::{Error, Result};
use crate::unit_system::descriptor::{RegisteredUnit, UnitId};
use crate::unit_system::traits::{Capability, Unit};

/// A constructed instance together with the descriptor that built it.
/// Cloning is cheap; handles may outlive a borrow of the registry.
#[derive(Clone, Debug)]
pub struct UnitHandle {
    unit: Arc<RegisteredUnit>,
    instance: Arc<dyn Unit>,
}

impl UnitHandle {
    pub fn id(&self) -> UnitId {
        self.unit.id()
    }

    pub fn name(&self) -> &str {
        self.unit.name()
    }

    pub fn priority(&self) -> i32 {
        self.unit.priority()
    }

    pub fn unit(&self) -> &Arc<RegisteredUnit> {
        &self.unit
    }

    pub fn instance(&self) -> &Arc<dyn Unit> {
        &self.instance
    }

    /// View the instance through capability `C`
    pub fn capability<C: Capability + ?Sized>(&self) -> Result<&C> {
        C::view(self.instance.as_ref()).ok_or_else(|| Error::missing_capability(self.name(), C::NAME))
    }
}

struct Slot {
    unit: Arc<RegisteredUnit>,
    instance: Arc<dyn Unit>,
    /// Position in construction order
    sequence: usize,
}

impl Slot {
    fn handle(&self) -> UnitHandle {
        UnitHandle {
            unit: Arc::clone(&self.unit),
            instance: Arc::clone(&self.instance),
        }
    }
}

/// Live instances keyed by descriptor, indexed by name.
///
/// Populated during the construct phase only; read-only while the application
/// is running, so shared references can be used from any thread without locking.
#[derive(Default)]
pub struct InstanceRegistry {
    slots: HashMap<UnitId, Slot>,
    /// Construction order
    order: Vec<UnitId>,
    /// Name -> ids, highest priority first, then earliest constructed
    by_name: HashMap<String, Vec<UnitId>>,
}

impl InstanceRegistry {
    /// Create a new empty instance registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the instance built for `unit`. Each descriptor may have at most one.
    pub fn insert(&mut self, unit: Arc<RegisteredUnit>, instance: Arc<dyn Unit>) -> Result<()> {
        let id = unit.id();
        if self.slots.contains_key(&id) {
            return Err(Error::DuplicateRegistration {
                unit: unit.name().to_string(),
                id,
            });
        }

        let name = unit.name().to_string();
        let sequence = self.order.len();
        self.order.push(id);
        self.slots.insert(id, Slot { unit, instance, sequence });

        let slots = &self.slots;
        let ids = self.by_name.entry(name).or_default();
        ids.push(id);
        ids.sort_by_key(|id| {
            let slot = &slots[id];
            (Reverse(slot.unit.priority()), slot.sequence)
        });
        Ok(())
    }

    /// The preferred instance registered under `name`
    pub fn lookup(&self, name: &str) -> Result<UnitHandle> {
        self.first_slot(name).map(Slot::handle)
    }

    /// Every instance registered under `name`, highest priority first
    pub fn lookup_all(&self, name: &str) -> Vec<UnitHandle> {
        self.by_name
            .get(name)
            .map(|ids| ids.iter().filter_map(|id| self.slots.get(id)).map(Slot::handle).collect())
            .unwrap_or_default()
    }

    /// The preferred instance under `name`, viewed through capability `C`
    pub fn capability<C: Capability + ?Sized>(&self, name: &str) -> Result<&C> {
        let slot = self.first_slot(name)?;
        C::view(slot.instance.as_ref()).ok_or_else(|| Error::missing_capability(name, C::NAME))
    }

    /// Get the instance built for a specific descriptor
    pub fn get(&self, id: UnitId) -> Option<UnitHandle> {
        self.slots.get(&id).map(Slot::handle)
    }

    pub fn contains(&self, id: UnitId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Ids in construction order
    pub fn construction_order(&self) -> &[UnitId] {
        &self.order
    }

    /// All handles in construction order
    pub fn handles(&self) -> Vec<UnitHandle> {
        self.order.iter().filter_map(|id| self.get(*id)).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Remove every instance, returning them in reverse construction order
    pub(crate) fn drain_reverse(&mut self) -> Vec<UnitHandle> {
        let handles = self.order.iter().rev().filter_map(|id| self.get(*id)).collect();
        self.clear();
        handles
    }

    /// Clear all instances without closing them.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.order.clear();
        self.by_name.clear();
    }

    fn first_slot(&self, name: &str) -> Result<&Slot> {
        self.by_name
            .get(name)
            .and_then(|ids| ids.first())
            .and_then(|id| self.slots.get(id))
            .ok_or_else(|| Error::not_found(name))
    }
}

// Manual Debug implementation listing instances in construction order
impl fmt::Debug for InstanceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units: Vec<String> = self
            .order
            .iter()
            .filter_map(|id| self.slots.get(id))
            .map(|slot| slot.unit.to_string())
            .collect();
        f.debug_struct("InstanceRegistry").field("instances", &units).finish()
    }
}
