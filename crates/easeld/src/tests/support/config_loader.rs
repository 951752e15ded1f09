//! Configuration loaders for success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use camino::Utf8PathBuf;
use easel_config::{Config, LogFormat};
use ortho_config::OrthoError;
use tempfile::TempDir;

use crate::bootstrap::ConfigLoader;

/// Loader that binds loopback on an ephemeral port and keeps storage in a
/// temporary directory.
pub(crate) struct TestConfigLoader {
    storage: TempDir,
    multiplayer: bool,
}

impl TestConfigLoader {
    pub(crate) fn new() -> Self {
        Self {
            storage: TempDir::new().expect("failed to create temporary storage directory"),
            multiplayer: false,
        }
    }

    pub(crate) fn multiplayer(mut self) -> Self {
        self.multiplayer = true;
        self
    }

    /// Storage root the loaded configuration points at.
    pub(crate) fn storage_root(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.storage.path().join("data"))
            .expect("temporary storage path was not valid UTF-8")
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            host: "127.0.0.1".to_owned(),
            port: 0,
            multiplayer: Some(self.multiplayer),
            storage_root: self.storage_root(),
            log_format: LogFormat::Compact,
            ..Config::default()
        })
    }
}

/// Loader that fails by passing an invalid CLI argument.
pub(crate) struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("easeld"),
            OsString::from("--port"),
            OsString::from("not-a-port"),
        ];
        Config::load_from_iter(args)
    }
}
