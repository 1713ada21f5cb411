//! Capability declarations and plugin load-order resolution.
//!
//! Every plugin declares the capability names it *provides* and the names it
//! *requires*. [`CapabilityRegistry::resolve_order`] computes an order in
//! which each plugin appears strictly after the providers of everything it
//! requires, so no registration callback ever runs against a missing
//! service. Capabilities supplied by the host itself are registered as
//! built-ins and count as satisfied from the start.
//!
//! Resolution is all-or-nothing: a missing capability or a cycle is reported
//! before any callback has run.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::debug;

use crate::PLUGINS_TARGET;
use crate::error::CapabilityError;

/// Callback invoked for a plugin once its requirements are satisfied.
pub type RegistrationCallback<'a, C> = Box<dyn FnOnce(&mut C) -> anyhow::Result<()> + 'a>;

// ---------------------------------------------------------------------------
// CapabilitySet
// ---------------------------------------------------------------------------

/// Ordered set of capability names.
///
/// # Example
///
/// ```
/// use crunchy_plugins::CapabilitySet;
///
/// let set = CapabilitySet::from_iter(["io_widget", "/exec"]);
/// assert!(set.contains("/exec"));
/// assert_eq!(set.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet(BTreeSet<String>);

impl CapabilitySet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Adds a capability name, returning `false` if it was already present.
    pub fn insert(&mut self, capability: impl Into<String>) -> bool {
        self.0.insert(capability.into())
    }

    /// Returns `true` when the set holds `capability`.
    #[must_use]
    pub fn contains(&self, capability: &str) -> bool {
        self.0.contains(capability)
    }

    /// Iterates the names in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of names in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for the empty set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

// ---------------------------------------------------------------------------
// CapabilityRegistry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
struct Declaration {
    name: String,
    provides: CapabilitySet,
    requires: CapabilitySet,
}

/// Dependency graph between plugins, keyed by capability name.
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    builtins: CapabilitySet,
    declarations: Vec<Declaration>,
    providers: HashMap<String, String>,
}

impl CapabilityRegistry {
    /// Creates a registry with no built-in capabilities.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry whose `builtins` are satisfied before any plugin runs.
    #[must_use]
    pub fn with_builtins(builtins: CapabilitySet) -> Self {
        Self {
            builtins,
            ..Self::default()
        }
    }

    /// Declares a plugin and its capability sets.
    ///
    /// Re-declaring a plugin with identical sets is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::DuplicatePlugin`] when `name` was declared
    /// with different sets, and [`CapabilityError::DuplicateCapability`] when
    /// a provided name already belongs to another plugin or to the built-ins.
    pub fn declare(
        &mut self,
        name: &str,
        provides: CapabilitySet,
        requires: CapabilitySet,
    ) -> Result<(), CapabilityError> {
        if let Some(existing) = self.declarations.iter().find(|decl| decl.name == name) {
            if existing.provides == provides && existing.requires == requires {
                return Ok(());
            }
            return Err(CapabilityError::DuplicatePlugin {
                name: name.to_owned(),
            });
        }

        for capability in provides.iter() {
            let provider = if self.builtins.contains(capability) {
                Some("<builtin>")
            } else {
                self.providers.get(capability).map(String::as_str)
            };
            if let Some(provider) = provider {
                return Err(CapabilityError::DuplicateCapability {
                    capability: capability.to_owned(),
                    provider: provider.to_owned(),
                    claimant: name.to_owned(),
                });
            }
        }

        for capability in provides.iter() {
            self.providers
                .insert(capability.to_owned(), name.to_owned());
        }
        debug!(
            target: PLUGINS_TARGET,
            plugin = name,
            provides = provides.len(),
            requires = requires.len(),
            "plugin declared"
        );
        self.declarations.push(Declaration {
            name: name.to_owned(),
            provides,
            requires,
        });
        Ok(())
    }

    /// Number of declared plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Returns `true` when nothing has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Computes a registration order honouring every requirement.
    ///
    /// Among plugins that are ready at the same time, the one declared first
    /// wins, so the result is reproducible across runs.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::UnsatisfiedRequirement`] when a required
    /// name is provided by nothing, or [`CapabilityError::CyclicDependency`]
    /// when the remaining plugins wait on each other.
    pub fn resolve_order(&self) -> Result<Vec<String>, CapabilityError> {
        self.check_requirements_exist()?;

        let mut satisfied: HashSet<&str> = self.builtins.iter().collect();
        let mut placed: BTreeSet<usize> = BTreeSet::new();
        let mut order = Vec::with_capacity(self.declarations.len());

        while order.len() < self.declarations.len() {
            let ready = self
                .declarations
                .iter()
                .enumerate()
                .find(|(index, decl)| {
                    !placed.contains(index)
                        && decl.requires.iter().all(|cap| satisfied.contains(cap))
                });
            let Some((index, decl)) = ready else {
                return Err(CapabilityError::CyclicDependency {
                    cycle: self.find_cycle(&placed, &satisfied),
                });
            };
            placed.insert(index);
            satisfied.extend(decl.provides.iter());
            order.push(decl.name.clone());
        }

        Ok(order)
    }

    /// Runs each plugin's callback in `order`, stopping at the first failure.
    ///
    /// Every name in `order` must have a callback; this is checked before any
    /// callback runs.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::MissingRegistration`] for an ordered plugin
    /// without a callback, and [`CapabilityError::RegistrationFailed`] carrying
    /// the plugin name when a callback fails.
    pub fn run<C>(
        &self,
        order: &[String],
        mut callbacks: BTreeMap<String, RegistrationCallback<'_, C>>,
        context: &mut C,
    ) -> Result<(), CapabilityError> {
        if let Some(missing) = order.iter().find(|name| !callbacks.contains_key(*name)) {
            return Err(CapabilityError::MissingRegistration {
                plugin: missing.clone(),
            });
        }

        for name in order {
            let Some(callback) = callbacks.remove(name) else {
                return Err(CapabilityError::MissingRegistration {
                    plugin: name.clone(),
                });
            };
            debug!(target: PLUGINS_TARGET, plugin = %name, "registering plugin");
            callback(context).map_err(|source| CapabilityError::RegistrationFailed {
                plugin: name.clone(),
                source,
            })?;
        }
        Ok(())
    }

    fn check_requirements_exist(&self) -> Result<(), CapabilityError> {
        for decl in &self.declarations {
            let missing = decl
                .requires
                .iter()
                .find(|cap| !self.builtins.contains(cap) && !self.providers.contains_key(*cap));
            if let Some(capability) = missing {
                return Err(CapabilityError::UnsatisfiedRequirement {
                    plugin: decl.name.clone(),
                    capability: capability.to_owned(),
                });
            }
        }
        Ok(())
    }

    /// Follows unmet requirements from the first blocked plugin until a
    /// plugin repeats. Every requirement has a provider at this point, and a
    /// blocked plugin's unmet requirement is always provided by another
    /// blocked plugin, so the walk must revisit a node.
    fn find_cycle(&self, placed: &BTreeSet<usize>, satisfied: &HashSet<&str>) -> Vec<String> {
        let blocked: Vec<&Declaration> = self
            .declarations
            .iter()
            .enumerate()
            .filter(|(index, _)| !placed.contains(index))
            .map(|(_, decl)| decl)
            .collect();

        let mut path: Vec<&str> = Vec::new();
        let mut current = blocked.first().map(|decl| decl.name.as_str());
        while let Some(name) = current {
            if let Some(start) = path.iter().position(|seen| *seen == name) {
                let mut cycle: Vec<String> = path
                    .iter()
                    .skip(start)
                    .map(|seen| (*seen).to_owned())
                    .collect();
                cycle.push(name.to_owned());
                return cycle;
            }
            path.push(name);
            current = blocked
                .iter()
                .find(|decl| decl.name == name)
                .and_then(|decl| decl.requires.iter().find(|cap| !satisfied.contains(cap)))
                .and_then(|cap| self.providers.get(cap))
                .map(String::as_str);
        }
        path.into_iter().map(str::to_owned).collect()
    }
}
