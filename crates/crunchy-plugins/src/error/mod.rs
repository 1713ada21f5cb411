//! Domain errors raised while building and querying the plugin registries.
//!
//! Configuration-time failures ([`CapabilityError`], [`RegistryError`],
//! [`RouteError`]) are fatal: the server must not start serving when any of
//! them surfaces. Lookup misses reuse the same enums so callers can decide
//! whether a miss is fatal or soft.

use thiserror::Error;

/// Errors raised while declaring plugins and resolving their load order.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// The same plugin name was declared twice, either by two plugin objects
    /// or with different capability sets.
    #[error("plugin '{name}' is already declared")]
    DuplicatePlugin {
        /// Plugin name.
        name: String,
    },

    /// Two providers claimed the same capability name.
    #[error("capability '{capability}' is provided by both '{provider}' and '{claimant}'")]
    DuplicateCapability {
        /// Capability name.
        capability: String,
        /// Provider that declared the capability first.
        provider: String,
        /// Plugin whose declaration was rejected.
        claimant: String,
    },

    /// A required capability is not provided by any declared plugin or built-in.
    #[error("plugin '{plugin}' requires '{capability}', which nothing provides")]
    UnsatisfiedRequirement {
        /// Plugin that declared the requirement.
        plugin: String,
        /// Missing capability name.
        capability: String,
    },

    /// Requirements form a cycle; the first and last names are the same plugin.
    #[error("cyclic plugin dependency: {}", .cycle.join(" -> "))]
    CyclicDependency {
        /// Plugins along the cycle.
        cycle: Vec<String>,
    },

    /// The resolved order names a plugin for which no registration was supplied.
    #[error("no registration callback supplied for plugin '{plugin}'")]
    MissingRegistration {
        /// Plugin name.
        plugin: String,
    },

    /// A plugin registration callback failed.
    #[error("plugin '{plugin}' failed to register: {source:#}")]
    RegistrationFailed {
        /// Plugin name.
        plugin: String,
        /// Error returned by the callback.
        #[source]
        source: anyhow::Error,
    },
}

/// Errors raised by keyed handler tables.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A handler is already registered under the key.
    #[error("{kind} '{key}' is already registered")]
    DuplicateRegistration {
        /// Table description, for example `service`.
        kind: &'static str,
        /// Rendered key.
        key: String,
    },

    /// No handler is registered under the key.
    #[error("{kind} '{key}' is not registered")]
    NotFound {
        /// Table description, for example `service`.
        kind: &'static str,
        /// Rendered key.
        key: String,
    },
}

impl RegistryError {
    /// Creates a duplicate registration error.
    pub fn duplicate(kind: &'static str, key: impl Into<String>) -> Self {
        Self::DuplicateRegistration {
            kind,
            key: key.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }
}

/// Errors raised by the request router.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// The path (or prefix, or the default slot) is already bound.
    #[error("route '{path}' is already registered")]
    Conflict {
        /// Conflicting path; `*` denotes the default handler.
        path: String,
    },

    /// No exact, prefix, or default handler matched.
    #[error("no handler for '{path}'")]
    NoHandler {
        /// Requested path.
        path: String,
    },
}

/// Errors raised while producing the session token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The operating system entropy source failed.
    #[error("failed to read OS entropy for the session token: {message}")]
    Entropy {
        /// Description reported by the entropy source.
        message: String,
    },
}

/// Errors raised by [`crate::PluginHost`] registration calls, tagged with the
/// registering plugin.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// A service or VLAM handler table rejected the registration.
    #[error("plugin '{plugin}': {source}")]
    Registry {
        /// Registering plugin.
        plugin: String,
        /// Underlying table error.
        #[source]
        source: RegistryError,
    },

    /// The router rejected the registration.
    #[error("plugin '{plugin}': {source}")]
    Route {
        /// Registering plugin.
        plugin: String,
        /// Underlying router error.
        #[source]
        source: RouteError,
    },
}

#[cfg(test)]
mod tests;
