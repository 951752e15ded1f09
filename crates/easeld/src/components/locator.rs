//! Typed collaborator lookup handed to components during wiring.

use std::sync::Arc;

use super::{BackendComponent, ComponentError, ComponentRegistry};
use crate::backend::BackendHandle;

/// Resolves the collaborators a component asks for in
/// [`BackendComponent::inject`].
#[derive(Clone, Copy)]
pub struct ServiceLocator<'a> {
    registry: &'a ComponentRegistry,
    backend: &'a BackendHandle,
}

impl<'a> ServiceLocator<'a> {
    /// Builds a locator over `registry` exposing `backend` as the facade.
    #[must_use]
    pub fn new(registry: &'a ComponentRegistry, backend: &'a BackendHandle) -> Self {
        Self { registry, backend }
    }

    /// Returns the registered instance of `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::NotFound`] when `T` is not registered.
    pub fn get<T: BackendComponent>(&self) -> Result<Arc<T>, ComponentError> {
        self.registry.get::<T>()
    }

    /// The backend facade.
    #[must_use]
    pub fn backend(&self) -> BackendHandle {
        self.backend.clone()
    }
}
