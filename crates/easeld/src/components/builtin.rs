//! Components every backend runs.

use std::sync::{Arc, OnceLock};

use easel_config::StorageRoot;
use easel_protocol::MessageType;
use tracing::{debug, warn};

use super::{
    BackendComponent, COMPONENTS_TARGET, ComponentError, ComponentRegistration, HookError,
    ServiceLocator,
};
use crate::dispatch::{HandlerError, HandlerReply, MessageHandler, RequestContext};

/// The built-in component list, in registration order.
#[must_use]
pub fn builtin_components() -> Vec<ComponentRegistration> {
    vec![
        ComponentRegistration::of::<StorageComponent>(),
        ComponentRegistration::of::<ServerConfigComponent>(),
    ]
}

/// Answers get-config requests with the backend's mode.
///
/// The reply payload is a single byte: `1` in multiplayer mode, `0`
/// otherwise. No session is required.
#[derive(Debug, Default)]
pub struct ServerConfigComponent {
    multiplayer: OnceLock<bool>,
}

impl BackendComponent for ServerConfigComponent {
    fn inject(&self, locator: &ServiceLocator<'_>) -> Result<(), ComponentError> {
        let _ = self.multiplayer.set(locator.backend().is_multiplayer());
        Ok(())
    }

    fn handlers(self: Arc<Self>) -> Vec<Arc<dyn MessageHandler>> {
        vec![self as Arc<dyn MessageHandler>]
    }
}

impl MessageHandler for ServerConfigComponent {
    fn message_type(&self) -> MessageType {
        MessageType::GET_CONFIG
    }

    fn handle(
        &self,
        _context: &RequestContext<'_>,
        _payload: &[u8],
    ) -> Result<HandlerReply, HandlerError> {
        let multiplayer = self
            .multiplayer
            .get()
            .ok_or_else(|| HandlerError::new("server configuration was never injected"))?;
        Ok(HandlerReply::success(vec![u8::from(*multiplayer)]))
    }
}

/// Owns the storage root directory.
///
/// Creates the directory on start-up and recreates it if a safety check
/// finds it missing.
#[derive(Debug, Default)]
pub struct StorageComponent {
    root: OnceLock<StorageRoot>,
}

impl StorageComponent {
    /// The storage root, once injected.
    #[must_use]
    pub fn root(&self) -> Option<&StorageRoot> {
        self.root.get()
    }

    fn prepare(&self) -> Result<(), HookError> {
        let root = self.root.get().ok_or("storage root was never injected")?;
        root.prepare()?;
        Ok(())
    }
}

impl BackendComponent for StorageComponent {
    fn inject(&self, locator: &ServiceLocator<'_>) -> Result<(), ComponentError> {
        let _ = self.root.set(locator.backend().storage_root().clone());
        Ok(())
    }

    fn initiate(&self) -> Result<(), HookError> {
        self.prepare()?;
        debug!(
            target: COMPONENTS_TARGET,
            root = ?self.root.get().map(ToString::to_string),
            "storage root ready"
        );
        Ok(())
    }

    fn safety_check(&self) -> Result<(), HookError> {
        if self.root.get().is_some_and(|root| !root.path().is_dir()) {
            warn!(target: COMPONENTS_TARGET, "storage root vanished; recreating");
        }
        self.prepare()
    }
}
