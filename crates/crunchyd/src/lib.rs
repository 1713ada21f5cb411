//! The Crunchy HTTP server.
//!
//! `crunchyd` loads its configuration through [`crunchy_config`], installs
//! structured telemetry, then hands the built-in and caller-supplied plugins
//! to the [`crunchy_plugins`] loader. Once every plugin has registered in
//! dependency order the registries are frozen and shared with a `tiny_http`
//! listener that serves each request on its own thread.
//!
//! Every request must carry the configured Basic-Auth credentials. Requests
//! are routed by path, with session-scoped endpoints carrying the per-process
//! [`crunchy_plugins::SessionToken`]. Handler errors and panics become `500`
//! responses whose body holds the error chain, which is only acceptable
//! because the server is meant for one trusted local user.
//!
//! Health hooks report each lifecycle stage through `tracing` so operators
//! can see where a start-up failed, and configuration errors (a missing or
//! cyclic plugin capability, a duplicate route) stop the process before it
//! binds a socket.

mod bootstrap;
mod builtin;
mod dispatch;
mod health;
mod http;
mod process;
pub mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Server, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use builtin::{ECHO_PATH, Echo, StaticFiles, builtin_plugins};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{
    LaunchError, RunningServer, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_daemon,
    run_daemon_with, start,
};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
