//! Keyed handler table shared by the service and VLAM registries.
//!
//! The table stores reference-counted trait objects so a frozen registry can
//! hand out cheap clones to concurrent callers. Registration is
//! duplicate-rejecting; overriding an entry is a separate, explicit call.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::error::RegistryError;

/// Handler table keyed by `K`, storing `Arc<H>` values.
pub(crate) struct HandlerTable<K, H: ?Sized> {
    kind: &'static str,
    entries: HashMap<K, Arc<H>>,
}

impl<K, H> HandlerTable<K, H>
where
    K: Eq + Hash + fmt::Display,
    H: ?Sized,
{
    /// Creates an empty table; `kind` names the table in error messages.
    pub(crate) fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
        }
    }

    /// Adds `handler` under `key`, rejecting an occupied key.
    pub(crate) fn register(&mut self, key: K, handler: Arc<H>) -> Result<(), RegistryError> {
        if self.entries.contains_key(&key) {
            return Err(RegistryError::duplicate(self.kind, key.to_string()));
        }
        self.entries.insert(key, handler);
        Ok(())
    }

    /// Stores `handler` under `key`, returning the handler it displaced.
    pub(crate) fn replace(&mut self, key: K, handler: Arc<H>) -> Option<Arc<H>> {
        self.entries.insert(key, handler)
    }

    pub(crate) fn lookup(&self, key: &K) -> Result<&Arc<H>, RegistryError> {
        self.entries
            .get(key)
            .ok_or_else(|| RegistryError::not_found(self.kind, key.to_string()))
    }

    pub(crate) fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Rendered keys in lexical order.
    pub(crate) fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().map(ToString::to_string).collect();
        keys.sort_unstable();
        keys
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<K, H> fmt::Debug for HandlerTable<K, H>
where
    K: Eq + Hash + fmt::Display,
    H: ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerTable")
            .field("kind", &self.kind)
            .field("keys", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests;
