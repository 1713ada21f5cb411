//! Turns configuration and plugin declarations into a ready [`Server`].
//!
//! Stages run in a fixed order: configuration, telemetry, session token,
//! then plugin resolution. The first failure stops the sequence.

use std::sync::Arc;

use ortho_config::{OrthoConfig as _, OrthoError};
use thiserror::Error;

use crunchy_config::Config;
use crunchy_plugins::{CapabilityError, Plugin, PluginLoader, Registries, SessionToken, TokenError};

use crate::builtin::builtin_plugins;
use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Source of the server configuration.
pub trait ConfigLoader: Send + Sync {
    /// Loads the server configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader's error when no valid configuration is available.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Reads the process arguments, environment and configuration files.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Hands out a configuration that was assembled in code.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Failure of one bootstrap stage.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// No usable configuration.
    #[error("configuration error: {source}")]
    Configuration {
        /// Error from the loader.
        #[source]
        source: Arc<OrthoError>,
    },
    /// The subscriber could not be installed.
    #[error("telemetry error: {source}")]
    Telemetry {
        /// Error from [`telemetry::initialise`].
        #[source]
        source: TelemetryError,
    },
    /// No session token could be generated.
    #[error("failed to generate the session token: {source}")]
    Token {
        /// Underlying entropy error.
        #[source]
        source: TokenError,
    },
    /// Plugin declaration, resolution or registration failed.
    #[error("failed to load plugins: {source}")]
    Plugins {
        /// Underlying capability error naming the plugin.
        #[source]
        source: CapabilityError,
    },
}

/// Result of a successful bootstrap: configuration plus frozen registries.
pub struct Server {
    config: Config,
    registries: Arc<Registries>,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl Server {
    /// Resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Registries shared with every connection.
    #[must_use]
    pub const fn registries(&self) -> &Arc<Registries> {
        &self.registries
    }

    /// Telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    pub(crate) fn reporter(&self) -> &dyn HealthReporter {
        self.reporter.as_ref()
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Server")
            .field("config", &self.config)
            .field("load_order", &self.registries.load_order())
            .finish_non_exhaustive()
    }
}

/// Bootstraps the server with the built-in plugins followed by `plugins`.
///
/// # Errors
///
/// Returns the first failing stage; the reporter sees the same error.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    plugins: Vec<Box<dyn Plugin>>,
) -> Result<Server, BootstrapError> {
    reporter.bootstrap_starting();
    let fail = |error: BootstrapError| {
        reporter.bootstrap_failed(&error);
        error
    };

    let config = loader
        .load()
        .map_err(|source| fail(BootstrapError::Configuration { source }))?;
    let telemetry = telemetry::initialise(&config)
        .map_err(|source| fail(BootstrapError::Telemetry { source }))?;
    let token = SessionToken::current()
        .cloned()
        .map_err(|source| fail(BootstrapError::Token { source }))?;

    let mut loader = PluginLoader::new();
    for plugin in builtin_plugins(&config).into_iter().chain(plugins) {
        loader.add(plugin);
    }
    let registries = loader
        .load(token)
        .map_err(|source| fail(BootstrapError::Plugins { source }))?;

    reporter.plugins_loaded(registries.load_order());
    reporter.bootstrap_succeeded(&config);
    Ok(Server {
        config,
        registries: Arc::new(registries),
        telemetry,
        reporter,
    })
}
