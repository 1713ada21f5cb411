//! Lifecycle events emitted while the server starts, serves and stops.

use std::net::SocketAddr;
use std::sync::Arc;

use crunchy_config::Config;

use crate::bootstrap::BootstrapError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Receives a callback at each lifecycle milestone.
///
/// Bootstrap and the launcher call these in order; a failed bootstrap ends
/// with `bootstrap_failed` and no further events.
pub trait HealthReporter: Send + Sync {
    /// Configuration is about to be read.
    fn bootstrap_starting(&self);

    /// Configuration, telemetry and plugins are all in place.
    fn bootstrap_succeeded(&self, config: &Config);

    /// A bootstrap stage returned `error`.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Every plugin registered; `order` is the resolved load order.
    fn plugins_loaded(&self, order: &[String]);

    /// The listener is bound to `addr`.
    fn listener_ready(&self, addr: SocketAddr);

    /// The accept thread has exited.
    fn shutdown_complete(&self);
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

    fn plugins_loaded(&self, order: &[String]) {
        (**self).plugins_loaded(order);
    }

    fn listener_ready(&self, addr: SocketAddr) {
        (**self).listener_ready(addr);
    }

    fn shutdown_complete(&self) {
        (**self).shutdown_complete();
    }
}

/// Emits each milestone as an `info` or `error` event on the `health` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Returns the reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "loading configuration"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        let (host, port) = config.bind_address();
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            host,
            port,
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            server_root = ?config.server_root(),
            "server bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %format_args!("{error:#}"),
            "server bootstrap failed"
        );
    }

    fn plugins_loaded(&self, order: &[String]) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "plugins_loaded",
            count = order.len(),
            order = ?order,
            "plugins registered"
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

    fn shutdown_complete(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "shutdown_complete",
            "server stopped"
        );
    }
}
