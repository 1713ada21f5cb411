//! HTTP request and response plumbing around `tiny_http`.
//!
//! Snapshots the parts of a received request the dispatcher needs, reads
//! the body against the configured limit, decodes the request target, checks
//! Basic-Auth credentials and converts plugin responses for the wire. Every
//! response closes the connection, so no keep-alive state exists here.

pub(crate) mod auth;
mod exchange;
mod target;

pub(crate) use self::exchange::{BodyError, Incoming, into_wire, read_body};
pub(crate) use self::target::{RequestTarget, parse_target};
