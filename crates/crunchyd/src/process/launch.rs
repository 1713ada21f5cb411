//! Sequences bootstrap, listener startup and shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use crunchy_plugins::Plugin;
use tracing::{debug, info};

use crate::bootstrap::{ConfigLoader, Server, SystemConfigLoader, bootstrap_with};
use crate::dispatch::HttpRequestHandler;
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::transport::{HttpListener, ListenerHandle};

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Runs the server with the production collaborators until a signal arrives.
///
/// Signal handlers are installed before bootstrap starts.
///
/// # Errors
///
/// Returns the first bootstrap, listener or signal failure.
pub fn run_daemon() -> Result<(), LaunchError> {
    let shutdown = SystemShutdownSignal::install()?;
    let reporter: Arc<dyn HealthReporter> = Arc::new(StructuredHealthReporter::new());
    run_daemon_with(&SystemConfigLoader, reporter, Vec::new(), &shutdown)
}

/// Runs the server with injected collaborators and extra plugins.
///
/// # Errors
///
/// Returns the first bootstrap, listener or signal failure.
pub fn run_daemon_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    plugins: Vec<Box<dyn Plugin>>,
    shutdown: &dyn ShutdownSignal,
) -> Result<(), LaunchError> {
    info!(target: PROCESS_TARGET, "starting server runtime");
    let server = bootstrap_with(loader, reporter, plugins)?;
    let running = start(&server)?;
    shutdown.wait()?;
    running.stop()?;
    server.reporter().shutdown_complete();
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}

/// Listener serving a bootstrapped [`Server`].
pub struct RunningServer {
    addr: SocketAddr,
    handle: ListenerHandle,
}

impl RunningServer {
    /// Address the listener is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stops receiving requests and joins the receive thread.
    ///
    /// Requests already received finish on their own threads.
    ///
    /// # Errors
    ///
    /// Fails when the receive thread panicked.
    pub fn stop(self) -> Result<(), LaunchError> {
        self.handle.shutdown();
        self.handle.join()?;
        Ok(())
    }
}

impl std::fmt::Debug for RunningServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunningServer")
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}

/// Binds the configured address and starts serving `server`.
///
/// # Errors
///
/// Fails when the address cannot be resolved or bound.
pub fn start(server: &Server) -> Result<RunningServer, LaunchError> {
    let (host, port) = server.config().bind_address();
    let listener = HttpListener::bind(host, port)?;
    let addr = listener.local_addr();

    let routes = server.registries().routes();
    debug!(
        target: PROCESS_TARGET,
        paths = ?routes.paths(),
        prefixes = ?routes.prefixes(),
        default = routes.has_default(),
        "routes registered"
    );

    let handler = Arc::new(HttpRequestHandler::new(
        Arc::clone(server.registries()),
        server.config(),
    ));
    let handle = listener.start(handler)?;
    server.reporter().listener_ready(addr);
    Ok(RunningServer { addr, handle })
}
