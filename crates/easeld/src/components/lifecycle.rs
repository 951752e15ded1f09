//! Dependency-ordered component initialisation.

use std::sync::Arc;

use tracing::debug;

use super::{
    COMPONENTS_TARGET, ComponentError, ComponentId, ComponentRecord, ComponentRegistry,
    ServiceLocator,
};
use crate::health::HealthReporter;

/// Initialises every registered component after its dependencies.
pub struct LifecycleManager<'a> {
    locator: ServiceLocator<'a>,
    registry: &'a ComponentRegistry,
    reporter: &'a dyn HealthReporter,
}

impl<'a> LifecycleManager<'a> {
    /// Builds a manager that wires components through `locator`.
    #[must_use]
    pub fn new(
        registry: &'a ComponentRegistry,
        locator: ServiceLocator<'a>,
        reporter: &'a dyn HealthReporter,
    ) -> Self {
        Self {
            locator,
            registry,
            reporter,
        }
    }

    /// Injects and initiates every component exactly once.
    ///
    /// Components are visited in registration order; each one first injects
    /// its collaborators, then recursively initiates its declared
    /// dependencies, then runs its own `initiate`.
    ///
    /// # Errors
    ///
    /// Fails on an unregistered dependency, a dependency cycle, or the first
    /// hook error. Components initiated before the failure stay initiated.
    pub fn init_all(&self) -> Result<(), ComponentError> {
        let mut visiting = Vec::new();
        for record in self.registry.records() {
            self.ensure_initialized(&record, &mut visiting)?;
        }
        Ok(())
    }

    fn ensure_initialized(
        &self,
        record: &Arc<ComponentRecord>,
        visiting: &mut Vec<ComponentId>,
    ) -> Result<(), ComponentError> {
        if record.is_initialized() {
            return Ok(());
        }
        let id = record.id();
        if let Some(position) = visiting.iter().position(|visited| *visited == id) {
            let cycle = visiting
                .iter()
                .skip(position)
                .chain(std::iter::once(&id))
                .map(ComponentId::name)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(ComponentError::Cyclic { cycle });
        }

        visiting.push(id);
        let component = record.component();
        component.inject(&self.locator)?;
        for dependency in component.dependencies() {
            let dependency_record =
                self.registry
                    .record(dependency)
                    .ok_or(ComponentError::NotFound {
                        component: dependency.name(),
                    })?;
            self.ensure_initialized(&dependency_record, visiting)?;
        }
        component
            .initiate()
            .map_err(|source| ComponentError::Initiate {
                component: id.name(),
                source,
            })?;
        record.mark_initialized();
        visiting.pop();

        debug!(
            target: COMPONENTS_TARGET,
            component = %id,
            "component initiated"
        );
        self.reporter.component_initiated(id);
        Ok(())
    }
}
