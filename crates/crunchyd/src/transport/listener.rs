//! Request receive loop.
//!
//! The receive thread waits on the server with a timeout so it can notice the
//! shutdown flag between waits. Each request is served on its own named
//! thread; the server finishes the response when the handler answers it.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tiny_http::{Request, Server};
use tracing::{debug, info, warn};

use super::{LISTENER_TARGET, ListenerError};

/// Longest wait for a request before the stop flag is checked again.
const IDLE_POLL: Duration = Duration::from_millis(25);
/// Sleep after a failed receive.
const ERROR_POLL: Duration = Duration::from_millis(150);

/// Answers requests received by the listener.
pub(crate) trait RequestHandler: Send + Sync + 'static {
    /// Handles and responds to a single request. Implementations should
    /// avoid panicking; an unanswered request is closed with a `500`.
    fn handle(&self, request: Request);
}

/// Bound HTTP server that is not yet receiving requests.
pub(crate) struct HttpListener {
    server: Server,
    addr: SocketAddr,
}

impl HttpListener {
    /// Resolves `host` and binds the first address it yields.
    pub(crate) fn bind(host: &str, port: u16) -> Result<Self, ListenerError> {
        let requested = resolve(host, port)?;
        let server = Server::http(requested).map_err(|source| ListenerError::Bind {
            addr: requested,
            source,
        })?;
        let addr = server
            .server_addr()
            .to_ip()
            .ok_or(ListenerError::NoIpAddress { addr: requested })?;
        Ok(Self { server, addr })
    }

    /// Bound address; carries the real port when bound to port `0`.
    pub(crate) const fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Starts the receive thread, handing each request to `handler`.
    pub(crate) fn start(
        self,
        handler: Arc<dyn RequestHandler>,
    ) -> Result<ListenerHandle, ListenerError> {
        let stop = Arc::new(AtomicBool::new(false));
        let receive_loop = ReceiveLoop {
            server: self.server,
            addr: self.addr,
            stop: Arc::clone(&stop),
            handler,
        };
        let thread = thread::Builder::new()
            .name("crunchy-accept".to_owned())
            .spawn(move || receive_loop.run())
            .map_err(|source| ListenerError::Spawn { source })?;
        Ok(ListenerHandle {
            stop,
            thread: Some(thread),
        })
    }
}

impl std::fmt::Debug for HttpListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpListener")
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}

/// Owner of the receive thread. Dropping it requests a stop without joining.
#[derive(Debug)]
pub(crate) struct ListenerHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    /// Asks the receive thread to exit after its current wait.
    pub(crate) fn shutdown(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Waits for the receive thread to exit.
    pub(crate) fn join(mut self) -> Result<(), ListenerError> {
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| ListenerError::ThreadPanic),
            None => Ok(()),
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct ReceiveLoop {
    server: Server,
    addr: SocketAddr,
    stop: Arc<AtomicBool>,
    handler: Arc<dyn RequestHandler>,
}

impl ReceiveLoop {
    fn run(self) {
        info!(target: LISTENER_TARGET, addr = %self.addr, "http listener accepting");
        let mut reported = None::<io::ErrorKind>;
        while !self.stop.load(Ordering::SeqCst) {
            match self.server.recv_timeout(IDLE_POLL) {
                Ok(Some(request)) => {
                    reported = None;
                    self.serve(request);
                }
                Ok(None) => {}
                Err(error) => {
                    // Repeats of the same failure are logged once.
                    if reported.replace(error.kind()) != Some(error.kind()) {
                        warn!(target: LISTENER_TARGET, %error, "receive failed");
                    }
                    thread::sleep(ERROR_POLL);
                }
            }
        }
        info!(target: LISTENER_TARGET, addr = %self.addr, "http listener stopped");
    }

    fn serve(&self, request: Request) {
        let peer = request.remote_addr().copied();
        let handler = Arc::clone(&self.handler);
        let spawned = thread::Builder::new()
            .name("crunchy-request".to_owned())
            .spawn(move || handler.handle(request));
        match spawned {
            Ok(_) => debug!(target: LISTENER_TARGET, ?peer, "request received"),
            Err(error) => {
                warn!(target: LISTENER_TARGET, ?peer, %error, "cannot spawn request thread");
            }
        }
    }
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr, ListenerError> {
    (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?
        .next()
        .ok_or_else(|| ListenerError::ResolveEmpty {
            host: host.to_owned(),
            port,
        })
}
