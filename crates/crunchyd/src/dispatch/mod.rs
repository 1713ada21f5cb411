//! Request dispatch for received HTTP requests.
//!
//! Each request is answered on its own thread. The handler authenticates
//! it, parses the target, routes it through the frozen route table and
//! converts handler failures, panics included, into `500` responses so a
//! failing request never affects its siblings.

mod handler;

pub(crate) use self::handler::HttpRequestHandler;

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Path families whose suffix is ignored by their handlers.
pub(crate) const CANONICAL_PREFIXES: &[&str] = &["/generated_image"];
