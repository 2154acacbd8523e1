use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::kernel::constants::BASELINE_UNIT;
use crate::unit_system::descriptor::{RegisteredUnit, UnitId};
use crate::unit_system::error::UnitSystemError;
use crate::unit_system::registry::UnitRegistry;

/// Dependency-ordered sequence of descriptors for one application run.
///
/// Every descriptor appears after all descriptors matching its dependency
/// names, and appears only once. The baseline unit is always first.
#[derive(Debug, Clone, Default)]
pub struct ResolvedPlan {
    units: Vec<Arc<RegisteredUnit>>,
}

impl ResolvedPlan {
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Arc<RegisteredUnit>> {
        self.units.iter()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Names in plan order; same-named descriptors repeat
    pub fn names(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.name()).collect()
    }

    /// Ids in plan order
    pub fn ids(&self) -> Vec<UnitId> {
        self.units.iter().map(|u| u.id()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units.iter().any(|u| u.name() == name)
    }

    /// Position of a descriptor within the plan
    pub fn position(&self, id: UnitId) -> Option<usize> {
        self.units.iter().position(|u| u.id() == id)
    }
}

impl fmt::Display for ResolvedPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.names().join(", "))
    }
}

/// Resolve the requested names (plus the baseline unit) into a build plan.
///
/// Expansion is depth-first in request order. All descriptors sharing a name
/// are included, in registration order.
pub fn resolve<S: AsRef<str>>(registry: &UnitRegistry, requested: &[S]) -> Result<ResolvedPlan, UnitSystemError> {
    if let Some(baseline) = registry.lookup(BASELINE_UNIT).iter().find(|u| !u.dependencies().is_empty()) {
        return Err(UnitSystemError::InvalidDescriptor {
            name: baseline.name().to_string(),
            reason: "the baseline unit cannot declare dependencies".to_string(),
        });
    }

    let mut resolver = Resolver::new(registry);
    resolver.visit_name(BASELINE_UNIT, None)?;
    for name in requested {
        resolver.visit_name(name.as_ref(), None)?;
    }

    log::debug!("Resolved plan: {}", resolver.plan.iter().map(|u| u.name()).collect::<Vec<_>>().join(" -> "));
    Ok(ResolvedPlan { units: resolver.plan })
}

struct Resolver<'r> {
    registry: &'r UnitRegistry,
    /// Descriptors already placed in the plan
    placed: HashSet<UnitId>,
    /// Descriptors currently being expanded
    stack: Vec<Arc<RegisteredUnit>>,
    plan: Vec<Arc<RegisteredUnit>>,
}

impl<'r> Resolver<'r> {
    fn new(registry: &'r UnitRegistry) -> Self {
        Self {
            registry,
            placed: HashSet::new(),
            stack: Vec::new(),
            plan: Vec::new(),
        }
    }

    fn visit_name(&mut self, name: &str, required_by: Option<&str>) -> Result<(), UnitSystemError> {
        let matches = self.registry.lookup(name);
        if matches.is_empty() {
            return Err(UnitSystemError::unknown(name, required_by));
        }
        for unit in matches {
            self.visit_unit(unit)?;
        }
        Ok(())
    }

    fn visit_unit(&mut self, unit: Arc<RegisteredUnit>) -> Result<(), UnitSystemError> {
        if self.placed.contains(&unit.id()) {
            return Ok(());
        }
        if let Some(start) = self.stack.iter().position(|u| u.id() == unit.id()) {
            let mut cycle: Vec<String> = self.stack[start..].iter().map(|u| u.name().to_string()).collect();
            cycle.push(unit.name().to_string());
            return Err(UnitSystemError::CircularDependency(cycle));
        }

        self.stack.push(Arc::clone(&unit));
        for dependency in unit.dependencies() {
            self.visit_name(dependency, Some(unit.name()))?;
        }
        self.stack.pop();

        self.placed.insert(unit.id());
        self.plan.push(unit);
        Ok(())
    }
}
