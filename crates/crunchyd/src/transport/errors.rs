//! Failures of the HTTP listener.

use std::error::Error as StdError;
use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors raised while binding the listener or running its receive thread.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Name resolution for the configured host failed.
    #[error("cannot resolve {host}:{port}: {source}")]
    Resolve {
        /// Configured host.
        host: String,
        /// Configured port.
        port: u16,
        /// Resolver error.
        #[source]
        source: io::Error,
    },
    /// Resolution succeeded but produced no address.
    #[error("{host}:{port} resolved to no addresses")]
    ResolveEmpty {
        /// Configured host.
        host: String,
        /// Configured port.
        port: u16,
    },
    /// The server could not be bound, usually because the port is taken.
    #[error("cannot bind {addr}: {source}")]
    Bind {
        /// Address that was tried.
        addr: SocketAddr,
        /// Error reported by the HTTP server.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    /// The bound server reported a non-IP listening address.
    #[error("listener bound to {addr} reports no IP address")]
    NoIpAddress {
        /// Address that was bound.
        addr: SocketAddr,
    },
    /// The receive thread could not be started.
    #[error("cannot spawn receive thread: {source}")]
    Spawn {
        /// OS error.
        #[source]
        source: io::Error,
    },
    /// The receive thread panicked before it could be joined.
    #[error("receive thread panicked")]
    ThreadPanic,
}
