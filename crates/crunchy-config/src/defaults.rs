//! Default values shared by the configuration loader and its callers.

use crate::logging::LogFormat;

/// Default bind address. Loopback keeps the server reachable only locally.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default TCP port the server listens on.
pub const DEFAULT_PORT: u16 = 8001;

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Username accepted by the Basic-Auth gate unless overridden.
pub const DEFAULT_USERNAME: &str = "crunchy";

/// Password accepted by the Basic-Auth gate unless overridden.
pub const DEFAULT_PASSWORD: &str = "crunchypassword";

/// Largest request body accepted by default (16 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Owned default host used where allocation is required (e.g. serde).
#[must_use]
pub fn default_host() -> String {
    DEFAULT_HOST.to_owned()
}

/// Default log filter expression used by the daemon.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the daemon.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Owned default username.
#[must_use]
pub fn default_username() -> String {
    DEFAULT_USERNAME.to_owned()
}

/// Owned default password.
#[must_use]
pub fn default_password() -> String {
    DEFAULT_PASSWORD.to_owned()
}
