//! Request handler used by the listener tests.

use std::net::SocketAddr;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use tiny_http::{Request, Response};

use super::RequestHandler;

/// Records the peer of every request and answers with a single byte.
#[derive(Default)]
pub(crate) struct RecordingHandler {
    peers: Mutex<Vec<Option<SocketAddr>>>,
    arrived: Condvar,
}

impl RecordingHandler {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Blocks until `expected` requests arrived or two seconds pass.
    pub(crate) fn wait_for(&self, expected: usize) -> Vec<Option<SocketAddr>> {
        let peers = self.peers.lock().expect("peer list lock");
        let (peers, _) = self
            .arrived
            .wait_timeout_while(peers, Duration::from_secs(2), |peers| peers.len() < expected)
            .expect("peer list lock");
        peers.clone()
    }
}

impl RequestHandler for RecordingHandler {
    fn handle(&self, request: Request) {
        let peer = request.remote_addr().copied();
        let _ = request.respond(Response::from_data(b"!".to_vec()));
        self.peers.lock().expect("peer list lock").push(peer);
        self.arrived.notify_all();
    }
}
