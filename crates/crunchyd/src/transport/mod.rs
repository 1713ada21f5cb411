//! HTTP listener.
//!
//! The transport module binds a `tiny_http` server on the configured address
//! and receives requests on a background thread, handing each one to its own
//! worker thread.

mod errors;
mod listener;
#[cfg(test)]
mod test_utils;

pub(crate) use self::errors::ListenerError;
pub(crate) use self::listener::{HttpListener, ListenerHandle, RequestHandler};
#[cfg(test)]
pub(crate) use self::test_utils::RecordingHandler;

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
