//! Test double for [`HealthReporter`] that records structured events.

use std::net::SocketAddr;
use std::sync::Mutex;

use easel_config::Config;

use crate::bootstrap::BootstrapError;
use crate::components::ComponentId;
use crate::health::HealthReporter;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    ComponentInitiated(&'static str),
    ListenerReady(SocketAddr),
    ShutdownStarting(String),
    ShutdownCompleted,
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub(crate) struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    pub(crate) fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Address from the most recent listener-ready event.
    pub(crate) fn listener_addr(&self) -> Option<SocketAddr> {
        self.events().iter().rev().find_map(|event| match event {
            HealthEvent::ListenerReady(addr) => Some(*addr),
            _ => None,
        })
    }

    /// Names of initiated components, in order.
    pub(crate) fn initiated(&self) -> Vec<&'static str> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HealthEvent::ComponentInitiated(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn component_initiated(&self, component: ComponentId) {
        self.record(HealthEvent::ComponentInitiated(component.name()));
    }

    fn listener_ready(&self, addr: SocketAddr) {
        self.record(HealthEvent::ListenerReady(addr));
    }

    fn shutdown_starting(&self, message: &str) {
        self.record(HealthEvent::ShutdownStarting(message.to_owned()));
    }

    fn shutdown_completed(&self) {
        self.record(HealthEvent::ShutdownCompleted);
    }
}
