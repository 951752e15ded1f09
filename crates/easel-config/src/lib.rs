//! Shared configuration for the Easel backend.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults are
//! overridden by an optional TOML file (`--config-path`), then by `EASEL_*`
//! environment variables, then by command-line flags. The daemon and any test
//! harness load the same [`Config`] so they agree on ports, storage layout,
//! and watchdog cadence.

mod defaults;
mod logging;
mod storage;

use std::ffi::OsString;
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_HOST, DEFAULT_LOG_FILTER, DEFAULT_PORT, DEFAULT_SAFETY_INTERVAL_SECS,
    DEFAULT_SESSION_RENEWAL_SECS, default_host, default_log_filter, default_log_filter_string,
    default_log_format, default_port, default_safety_interval_secs,
    default_session_renewal_secs, default_storage_root,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use storage::{StoragePreparationError, StorageRoot};

/// Resolved backend configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "EASEL")]
pub struct Config {
    /// Interface the backend listens on.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port the backend listens on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Whether the backend serves remote players through the identity service.
    ///
    /// Unset means single-player. Left optional so an absent CLI flag does
    /// not mask a value from the file or environment.
    #[serde(default)]
    pub multiplayer: Option<bool>,
    /// Root directory under which components keep their data.
    #[serde(default = "default_storage_root")]
    pub storage_root: Utf8PathBuf,
    /// `tracing` filter expression.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Output format for structured logs.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// Seconds between periodic component safety checks.
    #[serde(default = "default_safety_interval_secs")]
    pub safety_interval_secs: u64,
    /// Seconds between renewals of the backend's external session.
    #[serde(default = "default_session_renewal_secs")]
    pub session_renewal_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            multiplayer: None,
            storage_root: default_storage_root(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            safety_interval_secs: default_safety_interval_secs(),
            session_renewal_secs: default_session_renewal_secs(),
        }
    }
}

impl Config {
    /// Loads configuration from defaults, the config file, `EASEL_*`
    /// environment variables, and the process arguments.
    ///
    /// # Errors
    ///
    /// Returns the loader error when a layer fails to parse or merge.
    pub fn load() -> Result<Self, Arc<OrthoError>> {
        <Self as OrthoConfig>::load()
    }

    /// Loads configuration using `args` in place of the process arguments.
    /// The first item is the program name.
    ///
    /// # Errors
    ///
    /// Returns the loader error when a layer fails to parse or merge.
    pub fn load_from_iter<I>(args: I) -> Result<Self, Arc<OrthoError>>
    where
        I: IntoIterator,
        I::Item: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        <Self as OrthoConfig>::load_from_iter(args)
    }

    /// Interface the backend binds to.
    #[must_use]
    pub fn host(&self) -> &str {
        self.host.as_str()
    }

    /// TCP port the backend binds to.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns `true` when the backend runs in multiplayer mode.
    #[must_use]
    pub fn is_multiplayer(&self) -> bool {
        self.multiplayer.unwrap_or(false)
    }

    /// Storage root wrapper used to prepare the data directory.
    #[must_use]
    pub fn storage_root(&self) -> StorageRoot {
        StorageRoot::new(self.storage_root.clone())
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Interval between periodic safety checks.
    #[must_use]
    pub const fn safety_interval(&self) -> Duration {
        Duration::from_secs(self.safety_interval_secs)
    }

    /// Interval between external session renewals.
    #[must_use]
    pub const fn session_renewal_interval(&self) -> Duration {
        Duration::from_secs(self.session_renewal_secs)
    }
}
