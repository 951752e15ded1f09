//! Component runtime.
//!
//! Components are the backend's unit of functionality. Each one is listed
//! explicitly in a [`ComponentRegistration`], instantiated once by
//! [`ComponentRegistry::discover`], wired to its collaborators through a
//! [`ServiceLocator`], and initialised by the [`LifecycleManager`] strictly
//! after everything it declares in [`BackendComponent::dependencies`].
//!
//! Once running, the watchdog drives periodic [`BackendComponent::safety_check`]
//! calls and a final [`BackendComponent::unload`] at shutdown.

mod builtin;
mod errors;
mod lifecycle;
mod locator;
mod registry;

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use crate::dispatch::MessageHandler;

pub use self::builtin::{ServerConfigComponent, StorageComponent, builtin_components};
pub use self::errors::{ComponentError, HookError};
pub use self::lifecycle::LifecycleManager;
pub use self::locator::ServiceLocator;
pub use self::registry::{ComponentRecord, ComponentRegistration, ComponentRegistry};

pub(crate) const COMPONENTS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::components");

/// Identity of a component type.
///
/// Two ids are equal exactly when they name the same Rust type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentId {
    type_id: TypeId,
    name: &'static str,
}

impl ComponentId {
    /// Identifies component type `T`.
    #[must_use]
    pub fn of<T: BackendComponent>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: short_type_name(type_name::<T>()),
        }
    }

    /// Unqualified type name, used in logs and errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn type_id(&self) -> TypeId {
        self.type_id
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name)
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// A unit of backend functionality managed by the runtime.
///
/// Every hook has a no-op default so components implement only what they
/// need. Hooks take `&self`; components keep injected collaborators in
/// interior-mutable fields such as [`std::sync::OnceLock`].
pub trait BackendComponent: Any + Send + Sync {
    /// Components that must be initiated before this one.
    fn dependencies(&self) -> Vec<ComponentId> {
        Vec::new()
    }

    /// Resolves collaborators. Runs before any dependency is initiated, so
    /// implementations should only store what they look up.
    ///
    /// # Errors
    ///
    /// Propagates lookup failures from the locator.
    fn inject(&self, _locator: &ServiceLocator<'_>) -> Result<(), ComponentError> {
        Ok(())
    }

    /// One-time start-up work, run after every dependency has initiated.
    ///
    /// # Errors
    ///
    /// Any error aborts backend start-up.
    fn initiate(&self) -> Result<(), HookError> {
        Ok(())
    }

    /// Periodic self-check run by the watchdog.
    ///
    /// # Errors
    ///
    /// Failures are logged and do not stop the backend.
    fn safety_check(&self) -> Result<(), HookError> {
        Ok(())
    }

    /// Releases resources at shutdown.
    ///
    /// # Errors
    ///
    /// Failures are logged and do not stop the remaining unloads.
    fn unload(&self) -> Result<(), HookError> {
        Ok(())
    }

    /// Message handlers this component serves.
    fn handlers(self: Arc<Self>) -> Vec<Arc<dyn MessageHandler>> {
        Vec::new()
    }
}
