//! BDD world: assembles a backend from probe components and drives it over
//! real sockets.

use std::cell::RefCell;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use easel_config::StorageRoot;
use easel_protocol::ResponseFrame;
use tempfile::TempDir;

use crate::backend::{Backend, BackendError, BackendOptions};
use crate::components::{ComponentId, ComponentRegistration, builtin_components};
use crate::identity::{IdentityProvider, LocalIdentity, Session, SessionTable};

use super::client::TestClient;
use super::components::{Alpha, Beta, ChatComponent, EventLog, Gamma, ProbeBehaviour};
use super::reporter::RecordingHealthReporter;

/// Session token the multiplayer world issues up front.
pub(crate) const VALID_TOKEN: &str = "valid-token";

/// Scenario world shared across BDD steps.
pub(crate) struct BackendWorld {
    storage: TempDir,
    pub(crate) log: EventLog,
    pub(crate) reporter: Arc<RecordingHealthReporter>,
    dependencies: HashMap<&'static str, Vec<ComponentId>>,
    backend: Option<Backend>,
    pub(crate) start_error: Option<BackendError>,
    pub(crate) addr: Option<SocketAddr>,
    pub(crate) client: Option<TestClient>,
    pub(crate) response: Option<ResponseFrame>,
    pub(crate) shutdown_result: Option<Result<(), BackendError>>,
}

impl BackendWorld {
    pub(crate) fn new() -> Self {
        Self {
            storage: TempDir::new().expect("temporary storage directory"),
            log: EventLog::default(),
            reporter: Arc::new(RecordingHealthReporter::default()),
            dependencies: HashMap::new(),
            backend: None,
            start_error: None,
            addr: None,
            client: None,
            response: None,
            shutdown_result: None,
        }
    }

    /// Declares that probe `dependant` depends on `dependency`.
    pub(crate) fn add_dependency(&mut self, dependant: &'static str, dependency: ComponentId) {
        self.dependencies
            .entry(dependant)
            .or_default()
            .push(dependency);
    }

    fn probe_behaviour(&self, name: &str) -> ProbeBehaviour {
        ProbeBehaviour::depends_on(self.dependencies.get(name).cloned().unwrap_or_default())
    }

    fn registrations(&self) -> Vec<ComponentRegistration> {
        let mut registrations = builtin_components();
        registrations.push(Alpha::registration(&self.log, self.probe_behaviour("Alpha")));
        registrations.push(Beta::registration(&self.log, self.probe_behaviour("Beta")));
        registrations.push(Gamma::registration(&self.log, self.probe_behaviour("Gamma")));
        registrations.push(ComponentRegistration::of::<ChatComponent>());
        registrations
    }

    fn options(&self, multiplayer: bool) -> BackendOptions {
        let root = self.storage.path().join("data");
        let mut options = BackendOptions::new(StorageRoot::new(
            root.to_str().expect("utf8 storage path"),
        ));
        options.host = "127.0.0.1".to_owned();
        options.port = 0;
        options.multiplayer = multiplayer;
        options
    }

    /// Builds the backend without listening.
    pub(crate) fn start(&mut self, multiplayer: bool) {
        let identity: Arc<dyn IdentityProvider> = if multiplayer {
            let table = SessionTable::new();
            table.issue(Session::new(
                VALID_TOKEN,
                "ada",
                SystemTime::now() + Duration::from_secs(600),
            ));
            Arc::new(table)
        } else {
            Arc::new(LocalIdentity)
        };
        match Backend::new(
            self.options(multiplayer),
            self.registrations(),
            identity,
            self.reporter.clone(),
        ) {
            Ok(backend) => self.backend = Some(backend),
            Err(error) => self.start_error = Some(error),
        }
    }

    /// Builds the backend and starts listening.
    pub(crate) fn start_listening(&mut self, multiplayer: bool) {
        self.start(multiplayer);
        let backend = self
            .backend
            .as_mut()
            .unwrap_or_else(|| panic!("backend failed to start: {:?}", self.start_error));
        self.addr = Some(backend.listen().expect("listen"));
    }

    pub(crate) fn is_running(&self) -> bool {
        self.backend.is_some()
    }

    /// The scenario's client, connecting on first use.
    pub(crate) fn client(&mut self) -> &mut TestClient {
        let addr = self.addr.expect("backend is not listening");
        self.client.get_or_insert_with(|| TestClient::connect(addr))
    }

    pub(crate) fn shutdown(&mut self, message: &str) {
        if let Some(backend) = self.backend.take() {
            self.shutdown_result = Some(backend.shutdown(message));
        }
    }
}

impl Drop for BackendWorld {
    fn drop(&mut self) {
        if let Some(backend) = self.backend.take() {
            let _ = backend.shutdown("test finished");
        }
    }
}

/// Builds a fresh world for a scenario.
pub(crate) fn world() -> RefCell<BackendWorld> {
    RefCell::new(BackendWorld::new())
}
