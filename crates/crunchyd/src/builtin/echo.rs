//! Session-scoped round-trip endpoint.

use crunchy_plugins::{CapabilitySet, Plugin, PluginHost, Request, Response};
use tracing::debug;

use super::BUILTIN_TARGET;

/// Base path of the echo endpoint; the session token is appended.
pub const ECHO_PATH: &str = "/echo";

/// Returns the request body unchanged, or `204` when it is empty.
///
/// Browser code uses it to confirm it can reach session-scoped endpoints.
#[derive(Debug, Default, Clone, Copy)]
pub struct Echo;

impl Plugin for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    fn provides(&self) -> CapabilitySet {
        CapabilitySet::from_iter([ECHO_PATH])
    }

    fn register(&self, host: &mut PluginHost<'_>) -> anyhow::Result<()> {
        let path = host.register_session_handler(ECHO_PATH, echo)?;
        debug!(target: BUILTIN_TARGET, %path, "echo endpoint registered");
        Ok(())
    }
}

fn echo(request: &Request) -> anyhow::Result<Response> {
    if request.body().is_empty() {
        return Ok(Response::no_content());
    }
    let response = Response::ok(request.body().to_vec());
    Ok(match request.header("content-type") {
        Some(content_type) => response.with_content_type(content_type),
        None => response.with_content_type("application/octet-stream"),
    })
}
