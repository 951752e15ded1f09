use camino::Utf8PathBuf;
use std::env;

use crate::logging::LogFormat;

/// Default interface the backend listens on.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default TCP port for the backend.
pub const DEFAULT_PORT: u16 = 7777;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default interval between component safety checks (30 minutes).
pub const DEFAULT_SAFETY_INTERVAL_SECS: u64 = 30 * 60;

/// Default interval between external session renewals.
pub const DEFAULT_SESSION_RENEWAL_SECS: u64 = 60;

/// Owned default host used where allocation is required (e.g. serde).
#[must_use]
pub fn default_host() -> String {
    DEFAULT_HOST.to_owned()
}

/// Default TCP port.
#[must_use]
pub const fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default safety-check interval in seconds.
#[must_use]
pub const fn default_safety_interval_secs() -> u64 {
    DEFAULT_SAFETY_INTERVAL_SECS
}

/// Default session-renewal interval in seconds.
#[must_use]
pub const fn default_session_renewal_secs() -> u64 {
    DEFAULT_SESSION_RENEWAL_SECS
}

/// Computes the default storage root: the platform data directory, falling
/// back to the temporary directory when none is available.
#[must_use]
pub fn default_storage_root() -> Utf8PathBuf {
    let mut base = dirs::data_dir()
        .and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
        .unwrap_or_else(fallback_base_directory);
    base.push("easel");
    base
}

fn fallback_base_directory() -> Utf8PathBuf {
    let candidate = env::temp_dir();
    Utf8PathBuf::from_path_buf(candidate).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}
