//! Named services shared between plugins.
//!
//! A service is an [`ElementHandler`] published under a globally unique name
//! so that other plugins can insert widgets they do not implement
//! themselves. Renderers assume a fixed set of services, so a lookup miss is
//! usually fatal for the caller.

use std::sync::Arc;

use tracing::warn;

use crate::PLUGINS_TARGET;
use crate::error::RegistryError;
use crate::page::{ElementHandler, Invocation};
use crate::registry::HandlerTable;

/// Mapping from service name to handler.
#[derive(Debug)]
pub struct ServiceRegistry {
    table: HandlerTable<String, dyn ElementHandler>,
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self {
            table: HandlerTable::new("service"),
        }
    }
}

impl ServiceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `handler` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateRegistration`] when the name is
    /// taken; the first handler remains authoritative.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn ElementHandler>,
    ) -> Result<(), RegistryError> {
        self.table.register(name.into(), handler)
    }

    /// Publishes `handler` under `name`, displacing any existing handler.
    pub fn replace(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn ElementHandler>,
    ) -> Option<Arc<dyn ElementHandler>> {
        let name = name.into();
        let previous = self.table.replace(name.clone(), handler);
        if previous.is_some() {
            warn!(target: PLUGINS_TARGET, service = %name, "service replaced");
        }
        previous
    }

    /// Finds the handler published under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for an unknown name.
    pub fn lookup(&self, name: &str) -> Result<&Arc<dyn ElementHandler>, RegistryError> {
        self.table.lookup(&name.to_owned())
    }

    /// Returns `true` when `name` is published.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.table.contains(&name.to_owned())
    }

    /// Looks up `name` and runs it with `invocation`.
    ///
    /// # Errors
    ///
    /// Fails when the name is unknown or the handler fails.
    pub fn invoke(&self, name: &str, invocation: Invocation<'_>) -> anyhow::Result<()> {
        self.lookup(name)?.handle(invocation)
    }

    /// Published names in lexical order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.table.keys()
    }

    /// Number of published services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` when nothing is published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }
}
