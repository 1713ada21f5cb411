//! Path-based request routing.
//!
//! Resolution order is exact path, then the longest registered prefix, then
//! the default handler. The router performs no check on session tokens:
//! a session-scoped path is just an exact path that happens to end with the
//! token, so a request carrying the wrong token simply misses.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::RouteError;
use crate::http::{Request, Response};

/// Path used in [`RouteError::Conflict`] for the default slot.
pub const DEFAULT_ROUTE: &str = "*";

/// Handler bound to a route.
pub trait HttpHandler: Send + Sync {
    /// Produces the response for `request`.
    ///
    /// # Errors
    ///
    /// Any error is turned into a `500` response at the dispatch boundary.
    fn handle(&self, request: &Request) -> anyhow::Result<Response>;
}

impl<F> HttpHandler for F
where
    F: Fn(&Request) -> anyhow::Result<Response> + Send + Sync,
{
    fn handle(&self, request: &Request) -> anyhow::Result<Response> {
        self(request)
    }
}

/// How a path was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// Registered with [`RequestRouter::register`].
    Exact,
    /// Matched a prefix registered with [`RequestRouter::register_prefix`].
    Prefix,
    /// Fell through to the default handler.
    Default,
}

/// Handler selected for a path.
#[derive(Clone)]
pub struct RouteMatch<'a> {
    kind: RouteKind,
    handler: &'a Arc<dyn HttpHandler>,
}

impl<'a> RouteMatch<'a> {
    /// How the path was resolved.
    #[must_use]
    pub const fn kind(&self) -> RouteKind {
        self.kind
    }

    /// Selected handler.
    #[must_use]
    pub const fn handler(&self) -> &'a Arc<dyn HttpHandler> {
        self.handler
    }
}

impl fmt::Debug for RouteMatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Routing table built during startup and read concurrently afterwards.
#[derive(Default)]
pub struct RequestRouter {
    exact: HashMap<String, Arc<dyn HttpHandler>>,
    prefixes: Vec<(String, Arc<dyn HttpHandler>)>,
    default: Option<Arc<dyn HttpHandler>>,
}

impl RequestRouter {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `handler` to exactly `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Conflict`] when `path` is already bound.
    pub fn register(
        &mut self,
        path: impl Into<String>,
        handler: Arc<dyn HttpHandler>,
    ) -> Result<(), RouteError> {
        let path = path.into();
        if self.exact.contains_key(&path) {
            return Err(RouteError::Conflict { path });
        }
        self.exact.insert(path, handler);
        Ok(())
    }

    /// Binds `handler` to every path starting with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Conflict`] when the same prefix is already bound.
    pub fn register_prefix(
        &mut self,
        prefix: impl Into<String>,
        handler: Arc<dyn HttpHandler>,
    ) -> Result<(), RouteError> {
        let prefix = prefix.into();
        if self.prefixes.iter().any(|(existing, _)| *existing == prefix) {
            return Err(RouteError::Conflict { path: prefix });
        }
        self.prefixes.push((prefix, handler));
        Ok(())
    }

    /// Sets the fallback handler.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Conflict`] with path [`DEFAULT_ROUTE`] when a
    /// default is already set.
    pub fn register_default(&mut self, handler: Arc<dyn HttpHandler>) -> Result<(), RouteError> {
        if self.default.is_some() {
            return Err(RouteError::Conflict {
                path: DEFAULT_ROUTE.to_owned(),
            });
        }
        self.default = Some(handler);
        Ok(())
    }

    /// Selects the handler for `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::NoHandler`] when nothing matches and no default
    /// is set.
    pub fn route(&self, path: &str) -> Result<RouteMatch<'_>, RouteError> {
        if let Some(handler) = self.exact.get(path) {
            return Ok(RouteMatch {
                kind: RouteKind::Exact,
                handler,
            });
        }
        let longest = self
            .prefixes
            .iter()
            .filter(|(prefix, _)| path.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len());
        if let Some((_, handler)) = longest {
            return Ok(RouteMatch {
                kind: RouteKind::Prefix,
                handler,
            });
        }
        self.default
            .as_ref()
            .map(|handler| RouteMatch {
                kind: RouteKind::Default,
                handler,
            })
            .ok_or_else(|| RouteError::NoHandler {
                path: path.to_owned(),
            })
    }

    /// Exact paths in lexical order.
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.exact.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// Registered prefixes in registration order.
    #[must_use]
    pub fn prefixes(&self) -> Vec<&str> {
        self.prefixes
            .iter()
            .map(|(prefix, _)| prefix.as_str())
            .collect()
    }

    /// Returns `true` when a default handler is set.
    #[must_use]
    pub const fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

impl fmt::Debug for RequestRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestRouter")
            .field("exact", &self.paths())
            .field("prefixes", &self.prefixes())
            .field("default", &self.default.is_some())
            .finish()
    }
}
