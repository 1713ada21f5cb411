//! Capability-scoped plugin services and request routing for Crunchy.
//!
//! The `crunchy-plugins` crate implements the registration protocol that the
//! `crunchyd` server is assembled from. Plugins declare which capability
//! names they *provide* and *require*; the [`PluginLoader`] resolves an order
//! in which every requirement is registered before its consumer runs, lets
//! each plugin publish services, VLAM keyword handlers, end-of-page handlers,
//! and HTTP routes through a [`PluginHost`], and finally returns the
//! [`Registries`], which are read-only from then on.
//!
//! # Session scoping
//!
//! Endpoints that only same-session browser code should reach are registered
//! under `base + token`, where the token is a per-process random
//! [`SessionToken`]. The router does no token validation of its own: a
//! request carrying the wrong token simply fails to match. This is
//! capability-by-obscurity for a single trusted local user, not
//! authorisation.
//!
//! # Example
//!
//! ```
//! use crunchy_plugins::{
//!     CapabilitySet, Plugin, PluginHost, PluginLoader, Request, Response, SessionToken,
//! };
//!
//! struct Exec;
//!
//! impl Plugin for Exec {
//!     fn name(&self) -> &str {
//!         "exec"
//!     }
//!
//!     fn provides(&self) -> CapabilitySet {
//!         CapabilitySet::from_iter(["/exec"])
//!     }
//!
//!     fn register(&self, host: &mut PluginHost<'_>) -> anyhow::Result<()> {
//!         host.register_session_handler("/exec", |request: &Request| -> anyhow::Result<Response> {
//!             Ok(Response::ok(request.body().to_vec()))
//!         })?;
//!         Ok(())
//!     }
//! }
//!
//! let token = SessionToken::generate().expect("entropy available");
//! let path = token.scope("/exec");
//! let registries = PluginLoader::new()
//!     .with_plugin(Exec)
//!     .load(token)
//!     .expect("plugins load");
//! assert!(registries.routes().route(&path).is_ok());
//! ```

pub mod capability;
pub mod error;
pub mod host;
pub mod http;
pub mod page;
mod registry;
pub mod routes;
pub mod services;
pub mod session;
pub mod vlam;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod tests;

pub use self::capability::{CapabilityRegistry, CapabilitySet, RegistrationCallback};
pub use self::error::{CapabilityError, RegistrationError, RegistryError, RouteError, TokenError};
pub use self::host::{Plugin, PluginHost, PluginLoader, Registries};
pub use self::http::{Method, Request, Response, Status, UnsupportedMethod};
pub use self::page::{
    Element, ElementHandler, Invocation, Page, PageHandler, PageHandlers, PageId,
};
pub use self::routes::{HttpHandler, RequestRouter, RouteKind, RouteMatch};
pub use self::services::ServiceRegistry;
pub use self::session::SessionToken;
pub use self::vlam::{Keywords, VlamDispatchTable, VlamOutcome};

/// Tracing target for plugin registration and dispatch events.
pub const PLUGINS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::plugins");
