//! Process entry point: bootstrap, serve until signalled, shut down.

mod shutdown;

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::backend::{Backend, BackendError, BackendOptions};
use crate::bootstrap::{BootstrapError, ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::components::builtin_components;
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::identity::{IdentityProvider, LocalIdentity, SessionTable};

pub use self::shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};

const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Message broadcast to clients when the process is asked to stop.
pub const SHUTDOWN_MESSAGE: &str = "server is shutting down";

/// Errors surfaced while running the backend process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Bootstrap failed.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// The backend failed to start or stop.
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// Waiting for a termination signal failed.
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
}

/// Runs the backend with the production collaborators until a termination
/// signal arrives.
///
/// # Errors
///
/// Returns the first bootstrap, start-up, signal, or shutdown failure.
pub fn run_daemon() -> Result<(), LaunchError> {
    let reporter: Arc<dyn HealthReporter> = Arc::new(StructuredHealthReporter::new());
    run_daemon_with(&SystemConfigLoader, reporter, &SystemShutdownSignal)
}

/// Runs the backend with injected collaborators.
pub(crate) fn run_daemon_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    shutdown: &dyn ShutdownSignal,
) -> Result<(), LaunchError> {
    let config = bootstrap_with(loader, &*reporter)?.into_config();
    let identity: Arc<dyn IdentityProvider> = if config.is_multiplayer() {
        Arc::new(SessionTable::new())
    } else {
        Arc::new(LocalIdentity)
    };
    let mut backend = Backend::new(
        BackendOptions::from_config(&config),
        builtin_components(),
        identity,
        reporter,
    )?;
    let addr = backend.listen()?;
    info!(
        target: PROCESS_TARGET,
        addr = %addr,
        multiplayer = config.is_multiplayer(),
        "backend running"
    );

    let waited = shutdown.wait();
    backend.shutdown(SHUTDOWN_MESSAGE)?;
    waited?;
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}
