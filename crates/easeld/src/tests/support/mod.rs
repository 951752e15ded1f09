//! Shared fixtures and test doubles for the backend suites.

mod client;
mod components;
mod config_loader;
mod identity;
mod reporter;
mod world;

pub(crate) use client::TestClient;
pub(crate) use components::{
    Alpha, Beta, ChatComponent, EventLog, FaultyComponent, Gamma, ProbeBehaviour,
    SHADOW_CONFIG_TYPE, ShadowConfigComponent, probe_id,
};
pub(crate) use config_loader::{FailingConfigLoader, TestConfigLoader};
pub(crate) use identity::MockIdentity;
pub(crate) use reporter::{HealthEvent, RecordingHealthReporter};
pub(crate) use world::{BackendWorld, world};

use std::thread;
use std::time::{Duration, Instant};

/// Polls `condition` for up to two seconds.
pub(crate) fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}
