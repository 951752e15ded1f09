//! The Easel game backend.
//!
//! `easeld` hosts the game's server-side components behind a small binary
//! TCP protocol. A backend is assembled from an explicit list of
//! [`ComponentRegistration`]s: each component is instantiated once, wired to
//! its collaborators through a [`ServiceLocator`], and initiated after the
//! components it depends on. Components contribute [`MessageHandler`]s that
//! the [`MessageDispatcher`] routes requests to by message type.
//!
//! Every client connection is served on its own thread. Requests on one
//! connection are answered strictly in order; broadcasts can be pushed to
//! every connected client at any time through the [`BackendHandle`].
//!
//! A watchdog thread runs periodic component safety checks, renews the
//! backend's identity-service session, and executes queued
//! [`UtilityTask`]s. [`Backend::shutdown`] notifies clients, stops the
//! listener, and blocks until every component has run a final safety check
//! and unloaded.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use easel_config::StorageRoot;
//! use easeld::{
//!     Backend, BackendOptions, LocalIdentity, StructuredHealthReporter, builtin_components,
//! };
//!
//! # fn main() -> Result<(), easeld::BackendError> {
//! let options = BackendOptions::new(StorageRoot::new("/tmp/easel"));
//! let mut backend = Backend::new(
//!     options,
//!     builtin_components(),
//!     Arc::new(LocalIdentity),
//!     Arc::new(StructuredHealthReporter::new()),
//! )?;
//! let addr = backend.listen()?;
//! println!("listening on {addr}");
//! backend.shutdown("maintenance")?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod bootstrap;
mod components;
mod dispatch;
mod health;
mod identity;
mod process;
pub mod telemetry;
mod transport;
mod watchdog;

pub use backend::{Backend, BackendError, BackendHandle, BackendOptions};
pub use bootstrap::{
    BootstrapError, Bootstrapped, ConfigLoader, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use components::{
    BackendComponent, ComponentError, ComponentId, ComponentRecord, ComponentRegistration,
    ComponentRegistry, HookError, LifecycleManager, ServerConfigComponent, ServiceLocator,
    StorageComponent, builtin_components,
};
pub use dispatch::{
    DispatchError, HandlerError, HandlerReply, MessageDispatcher, MessageHandler, RequestContext,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use identity::{
    IdentityError, IdentityProvider, LOCAL_USER_ID, LocalIdentity, Session, SessionTable,
};
pub use process::{
    LaunchError, SHUTDOWN_MESSAGE, ShutdownError, ShutdownSignal, SystemShutdownSignal,
    run_daemon,
};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{BroadcastReport, Connection, ConnectionId, ConnectionSet, ListenerError};
pub use watchdog::{
    DEFAULT_RENEWAL_INTERVAL, DEFAULT_SAFETY_INTERVAL, UtilityTask, Watchdog, WatchdogError,
    WatchdogHandle, WatchdogQueue, WatchdogSettings,
};

#[cfg(test)]
mod tests;
