//! The backend facade: owns the component runtime, the listener, and the
//! watchdog, and sequences start-up and shutdown across them.

use std::net::SocketAddr;
use std::sync::Arc;

use easel_config::{Config, DEFAULT_HOST, DEFAULT_PORT, StorageRoot};
use easel_protocol::wire::write_string;
use easel_protocol::{BroadcastType, FrameError};
use thiserror::Error;
use tracing::{info, warn};

use crate::components::{
    ComponentError, ComponentRegistration, ComponentRegistry, LifecycleManager, ServiceLocator,
};
use crate::dispatch::{DispatchConnectionHandler, DispatchError, MessageDispatcher};
use crate::health::HealthReporter;
use crate::identity::IdentityProvider;
use crate::transport::{
    BroadcastReport, ConnectionSet, ListenerError, ListenerHandle, SocketListener,
};
use crate::watchdog::{
    UtilityTask, Watchdog, WatchdogError, WatchdogHandle, WatchdogQueue, WatchdogSettings,
};

const BACKEND_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::backend");

/// Settings a backend is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendOptions {
    /// Interface to listen on.
    pub host: String,
    /// Port to listen on; `0` picks an ephemeral port.
    pub port: u16,
    /// Whether remote players are served.
    pub multiplayer: bool,
    /// Directory under which components keep their data.
    pub storage_root: StorageRoot,
    /// Watchdog timer periods.
    pub watchdog: WatchdogSettings,
}

impl BackendOptions {
    /// Single-player options with default host, port, and timers.
    #[must_use]
    pub fn new(storage_root: StorageRoot) -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            multiplayer: false,
            storage_root,
            watchdog: WatchdogSettings::default(),
        }
    }

    /// Options resolved from loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            host: config.host().to_owned(),
            port: config.port(),
            multiplayer: config.is_multiplayer(),
            storage_root: config.storage_root(),
            watchdog: WatchdogSettings {
                safety_interval: config.safety_interval(),
                renewal_interval: config.session_renewal_interval(),
            },
        }
    }
}

/// Errors raised while starting or stopping the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Component registration or initialisation failed.
    #[error(transparent)]
    Component(#[from] ComponentError),
    /// The dispatch table could not be built.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    /// The listener failed.
    #[error(transparent)]
    Listener(#[from] ListenerError),
    /// The watchdog failed.
    #[error(transparent)]
    Watchdog(#[from] WatchdogError),
    /// `listen` was called twice.
    #[error("the backend is already listening on {addr}")]
    AlreadyListening {
        /// Address already bound.
        addr: SocketAddr,
    },
}

/// The backend as seen by its components.
///
/// Cheap to clone; every clone refers to the same backend.
#[derive(Debug, Clone)]
pub struct BackendHandle {
    inner: Arc<HandleInner>,
}

#[derive(Debug)]
struct HandleInner {
    connections: ConnectionSet,
    tasks: WatchdogQueue,
    multiplayer: bool,
    storage_root: StorageRoot,
}

impl BackendHandle {
    /// Sends a broadcast to every connected client.
    ///
    /// # Errors
    ///
    /// Fails only when the payload exceeds the protocol size limit.
    pub fn broadcast(
        &self,
        broadcast_type: BroadcastType,
        payload: Vec<u8>,
    ) -> Result<BroadcastReport, FrameError> {
        self.inner.connections.broadcast(broadcast_type, payload)
    }

    /// Queues work for the watchdog thread.
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::Stopped`] after shutdown.
    pub fn enqueue(&self, task: UtilityTask) -> Result<(), WatchdogError> {
        self.inner.tasks.enqueue(task)
    }

    /// Whether the backend serves remote players.
    #[must_use]
    pub fn is_multiplayer(&self) -> bool {
        self.inner.multiplayer
    }

    /// Directory under which components keep their data.
    #[must_use]
    pub fn storage_root(&self) -> &StorageRoot {
        &self.inner.storage_root
    }

    /// Number of connected clients.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }
}

/// A running backend.
pub struct Backend {
    options: BackendOptions,
    handle: BackendHandle,
    registry: Arc<ComponentRegistry>,
    dispatcher: Arc<MessageDispatcher>,
    identity: Arc<dyn IdentityProvider>,
    reporter: Arc<dyn HealthReporter>,
    listener: Option<(ListenerHandle, SocketAddr)>,
    watchdog: Option<WatchdogHandle>,
}

impl Backend {
    /// Instantiates and initialises every registered component, builds the
    /// dispatch table, and starts the watchdog.
    ///
    /// # Errors
    ///
    /// Fails on duplicate or cyclic components, a missing dependency, a
    /// failing `initiate`, duplicate message handlers, or a watchdog spawn
    /// failure.
    pub fn new(
        options: BackendOptions,
        registrations: Vec<ComponentRegistration>,
        identity: Arc<dyn IdentityProvider>,
        reporter: Arc<dyn HealthReporter>,
    ) -> Result<Self, BackendError> {
        let registry = Arc::new(ComponentRegistry::discover(registrations)?);
        let (watchdog, tasks) = Watchdog::new(options.watchdog);
        let handle = BackendHandle {
            inner: Arc::new(HandleInner {
                connections: ConnectionSet::new(),
                tasks,
                multiplayer: options.multiplayer,
                storage_root: options.storage_root.clone(),
            }),
        };

        let locator = ServiceLocator::new(&registry, &handle);
        LifecycleManager::new(&registry, locator, &*reporter).init_all()?;
        let dispatcher = Arc::new(MessageDispatcher::from_registry(&registry)?);
        let watchdog = watchdog.start(Arc::clone(&registry), Arc::clone(&identity))?;

        info!(
            target: BACKEND_TARGET,
            components = registry.len(),
            multiplayer = options.multiplayer,
            "backend initialised"
        );
        Ok(Self {
            options,
            handle,
            registry,
            dispatcher,
            identity,
            reporter,
            listener: None,
            watchdog: Some(watchdog),
        })
    }

    /// Binds the configured address and starts accepting clients.
    ///
    /// # Errors
    ///
    /// Fails when the address cannot be bound or the backend is already
    /// listening.
    pub fn listen(&mut self) -> Result<SocketAddr, BackendError> {
        if let Some((_, addr)) = &self.listener {
            return Err(BackendError::AlreadyListening { addr: *addr });
        }
        let listener = SocketListener::bind(&self.options.host, self.options.port)?;
        let addr = listener.local_addr();
        let handler = Arc::new(DispatchConnectionHandler::new(
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.identity),
        ));
        let running = listener.start(self.handle.inner.connections.clone(), handler)?;
        self.listener = Some((running, addr));
        self.reporter.listener_ready(addr);
        Ok(addr)
    }

    /// Address the backend listens on, once [`Backend::listen`] succeeded.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(|(_, addr)| *addr)
    }

    /// The facade handed to components.
    #[must_use]
    pub fn handle(&self) -> BackendHandle {
        self.handle.clone()
    }

    /// The component table.
    #[must_use]
    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    /// Notifies clients, stops accepting, and blocks until every component
    /// has run its final safety check and unloaded.
    ///
    /// Every step runs even if an earlier one fails; the first failure is
    /// returned.
    ///
    /// # Errors
    ///
    /// Reports a panicked listener or watchdog thread.
    pub fn shutdown(mut self, message: &str) -> Result<(), BackendError> {
        self.reporter.shutdown_starting(message);
        self.announce_shutdown(message);

        let listener_result = match self.listener.take() {
            Some((listener, _)) => {
                listener.shutdown();
                listener.join()
            }
            None => Ok(()),
        };
        let watchdog_result = match self.watchdog.take() {
            Some(watchdog) => watchdog.stop(),
            None => Ok(()),
        };
        self.handle.inner.connections.close_all();

        listener_result?;
        watchdog_result?;
        self.reporter.shutdown_completed();
        Ok(())
    }

    fn announce_shutdown(&self, message: &str) {
        let mut payload = Vec::new();
        let sent = write_string(&mut payload, message, "shutdown message")
            .and_then(|()| self.handle.broadcast(BroadcastType::SHUTDOWN, payload));
        match sent {
            Ok(report) => info!(
                target: BACKEND_TARGET,
                delivered = report.delivered,
                failed = report.failed.len(),
                "shutdown notice sent"
            ),
            Err(error) => warn!(
                target: BACKEND_TARGET,
                error = %error,
                "failed to send shutdown notice"
            ),
        }
    }
}
