//! Shared configuration for the Crunchy server.
//!
//! [`Config`] is assembled by `ortho_config` from, in increasing order of
//! precedence: built-in defaults, a TOML configuration file, `CRUNCHY_*`
//! environment variables, and command-line flags. The daemon reads it once
//! during bootstrap and never mutates it afterwards.

mod credentials;
mod defaults;
mod logging;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use self::credentials::Credentials;
pub use self::defaults::{
    DEFAULT_HOST, DEFAULT_LOG_FILTER, DEFAULT_MAX_BODY_BYTES, DEFAULT_PASSWORD, DEFAULT_PORT,
    DEFAULT_USERNAME, default_host, default_log_filter, default_log_filter_string,
    default_log_format, default_password, default_username,
};
pub use self::logging::{LogFormat, LogFormatParseError};

/// Runtime configuration for the server process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "CRUNCHY")]
pub struct Config {
    /// Address the HTTP listener binds to.
    #[ortho_config(default = defaults::default_host())]
    pub host: String,
    /// TCP port the HTTP listener binds to; `0` selects an ephemeral port.
    #[ortho_config(default = defaults::DEFAULT_PORT)]
    pub port: u16,
    /// `tracing` filter expression.
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Telemetry output format.
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
    /// Basic-Auth username.
    #[ortho_config(default = defaults::default_username())]
    pub username: String,
    /// Basic-Auth password.
    #[ortho_config(default = defaults::default_password())]
    pub password: String,
    /// Directory served by the static file handler, if any.
    pub server_root: Option<Utf8PathBuf>,
    /// Largest request body the server will read.
    #[ortho_config(default = defaults::DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: DEFAULT_PORT,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            username: default_username(),
            password: default_password(),
            server_root: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Config {
    /// Host and port pair for the listener.
    #[must_use]
    pub fn bind_address(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Telemetry output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Credential pair enforced by the Basic-Auth gate.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }

    /// Static file root, when configured.
    #[must_use]
    pub fn server_root(&self) -> Option<&camino::Utf8Path> {
        self.server_root.as_deref()
    }

    /// Upper bound on accepted request bodies.
    #[must_use]
    pub const fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_binds_loopback() {
        let config = Config::default();
        assert_eq!(config.bind_address(), ("127.0.0.1", DEFAULT_PORT));
        assert_eq!(config.log_format(), LogFormat::Json);
        assert!(config.server_root().is_none());
    }

    #[test]
    fn default_credentials_match_shared_pair() {
        let credentials = Config::default().credentials();
        assert!(credentials.matches(DEFAULT_USERNAME, DEFAULT_PASSWORD));
    }
}
