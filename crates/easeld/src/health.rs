//! Structured health reporting for backend lifecycle events.

use std::net::SocketAddr;
use std::sync::Arc;

use easel_config::Config;

use crate::bootstrap::BootstrapError;
use crate::components::ComponentId;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked after a component's `initiate` hook succeeds.
    fn component_initiated(&self, component: ComponentId);

    /// Invoked once the listener accepts connections.
    fn listener_ready(&self, addr: SocketAddr);

    /// Invoked when shutdown begins.
    fn shutdown_starting(&self, message: &str);

    /// Invoked after every component has unloaded.
    fn shutdown_completed(&self);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn component_initiated(&self, component: ComponentId) {
        (**self).component_initiated(component);
    }

    fn listener_ready(&self, addr: SocketAddr) {
        (**self).listener_ready(addr);
    }

    fn shutdown_starting(&self, message: &str) {
        (**self).shutdown_starting(message);
    }

    fn shutdown_completed(&self) {
        (**self).shutdown_completed();
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting backend bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            host = %config.host(),
            port = config.port(),
            multiplayer = config.is_multiplayer(),
            storage_root = %config.storage_root(),
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            "backend bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "backend bootstrap failed"
        );
    }

    fn component_initiated(&self, component: ComponentId) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "component_initiated",
            component = %component,
            "component initiated"
        );
    }

    fn listener_ready(&self, addr: SocketAddr) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "listener_ready",
            addr = %addr,
            "accepting connections"
        );
    }

    fn shutdown_starting(&self, message: &str) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "shutdown_starting",
            message,
            "backend shutting down"
        );
    }

    fn shutdown_completed(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "shutdown_completed",
            "backend shutdown completed"
        );
    }
}
