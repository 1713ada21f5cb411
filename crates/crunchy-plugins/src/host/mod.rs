//! Plugin registration protocol.
//!
//! A [`Plugin`] declares the capabilities it provides and requires, then
//! registers its handlers through a [`PluginHost`] when the loader reaches it
//! in dependency order. The loader owns every table while plugins register
//! and hands back [`Registries`], which only offers shared access. Wrapping
//! that value in an `Arc` is what lets connection threads read it without
//! locks.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::PLUGINS_TARGET;
use crate::capability::{CapabilityRegistry, CapabilitySet, RegistrationCallback};
use crate::error::{CapabilityError, RegistrationError, RegistryError, RouteError};
use crate::page::{Element, ElementHandler, Page, PageHandler, PageHandlers};
use crate::routes::{DEFAULT_ROUTE, HttpHandler, RequestRouter};
use crate::services::ServiceRegistry;
use crate::session::SessionToken;
use crate::vlam::{VlamDispatchTable, VlamOutcome};

/// Unit of functionality loaded at startup.
pub trait Plugin: Send + Sync {
    /// Unique plugin name.
    fn name(&self) -> &str;

    /// Capabilities this plugin makes available.
    fn provides(&self) -> CapabilitySet {
        CapabilitySet::new()
    }

    /// Capabilities that must be registered before this plugin runs.
    fn requires(&self) -> CapabilitySet {
        CapabilitySet::new()
    }

    /// Registers the plugin's handlers.
    ///
    /// # Errors
    ///
    /// Any error aborts startup with the plugin's name attached.
    fn register(&self, host: &mut PluginHost<'_>) -> anyhow::Result<()>;
}

/// Mutable tables filled while plugins register.
#[derive(Debug)]
struct RegistryBuilder {
    token: SessionToken,
    services: ServiceRegistry,
    vlam: VlamDispatchTable,
    page_handlers: PageHandlers,
    routes: RequestRouter,
}

impl RegistryBuilder {
    fn new(token: SessionToken) -> Self {
        Self {
            token,
            services: ServiceRegistry::new(),
            vlam: VlamDispatchTable::new(),
            page_handlers: PageHandlers::new(),
            routes: RequestRouter::new(),
        }
    }

    fn freeze(self, order: Vec<String>) -> Registries {
        Registries {
            token: self.token,
            services: self.services,
            vlam: self.vlam,
            page_handlers: self.page_handlers,
            routes: self.routes,
            order,
        }
    }
}

/// Registration surface handed to one plugin.
///
/// Every error is tagged with the registering plugin's name.
pub struct PluginHost<'a> {
    plugin: &'a str,
    builder: &'a mut RegistryBuilder,
}

impl<'a> PluginHost<'a> {
    fn new(plugin: &'a str, builder: &'a mut RegistryBuilder) -> Self {
        Self { plugin, builder }
    }

    /// Name of the plugin currently registering.
    #[must_use]
    pub const fn plugin(&self) -> &str {
        self.plugin
    }

    /// Process session token.
    #[must_use]
    pub fn session_token(&self) -> &SessionToken {
        &self.builder.token
    }

    /// `base` with the session token appended.
    #[must_use]
    pub fn scoped_path(&self, base: &str) -> String {
        self.builder.token.scope(base)
    }

    /// Services registered by earlier plugins.
    #[must_use]
    pub fn services(&self) -> &ServiceRegistry {
        &self.builder.services
    }

    /// Publishes a named service.
    ///
    /// # Errors
    ///
    /// Fails when the name is already taken.
    pub fn register_service(
        &mut self,
        name: &str,
        handler: impl ElementHandler + 'static,
    ) -> Result<(), RegistrationError> {
        let result = self.builder.services.register(name, Arc::new(handler));
        self.registry_result(result, "service", name)
    }

    /// Publishes a named service, displacing any existing one.
    pub fn replace_service(&mut self, name: &str, handler: impl ElementHandler + 'static) {
        debug!(target: PLUGINS_TARGET, plugin = self.plugin, service = name, "replacing service");
        self.builder.services.replace(name, Arc::new(handler));
    }

    /// Binds a handler to the VLAM pair `(tag, keyword)`.
    ///
    /// # Errors
    ///
    /// Fails when the pair is already bound.
    pub fn register_vlam_handler(
        &mut self,
        tag: &str,
        keyword: &str,
        handler: impl ElementHandler + 'static,
    ) -> Result<(), RegistrationError> {
        let result = self.builder.vlam.register(tag, keyword, Arc::new(handler));
        self.registry_result(result, "vlam handler", keyword)
    }

    /// Binds a handler to an exact path.
    ///
    /// # Errors
    ///
    /// Fails when the path is already bound.
    pub fn register_http_handler(
        &mut self,
        path: &str,
        handler: impl HttpHandler + 'static,
    ) -> Result<(), RegistrationError> {
        let result = self.builder.routes.register(path, Arc::new(handler));
        self.route_result(result, path)
    }

    /// Binds a handler to `base` + session token and returns the full path.
    ///
    /// # Errors
    ///
    /// Fails when the scoped path is already bound.
    pub fn register_session_handler(
        &mut self,
        base: &str,
        handler: impl HttpHandler + 'static,
    ) -> Result<String, RegistrationError> {
        let path = self.scoped_path(base);
        let result = self.builder.routes.register(path.as_str(), Arc::new(handler));
        self.route_result(result, base)?;
        Ok(path)
    }

    /// Binds a handler to every path starting with `prefix`.
    ///
    /// # Errors
    ///
    /// Fails when the prefix is already bound.
    pub fn register_prefix_handler(
        &mut self,
        prefix: &str,
        handler: impl HttpHandler + 'static,
    ) -> Result<(), RegistrationError> {
        let result = self.builder.routes.register_prefix(prefix, Arc::new(handler));
        self.route_result(result, prefix)
    }

    /// Sets the fallback route handler.
    ///
    /// # Errors
    ///
    /// Fails when another plugin already set it.
    pub fn register_default_handler(
        &mut self,
        handler: impl HttpHandler + 'static,
    ) -> Result<(), RegistrationError> {
        let result = self.builder.routes.register_default(Arc::new(handler));
        self.route_result(result, DEFAULT_ROUTE)
    }

    /// Appends a handler run after each page is interpreted.
    pub fn register_end_page_handler(&mut self, handler: impl PageHandler + 'static) {
        debug!(target: PLUGINS_TARGET, plugin = self.plugin, "end-of-page handler registered");
        self.builder.page_handlers.push(Arc::new(handler));
    }

    fn registry_result(
        &self,
        result: Result<(), RegistryError>,
        kind: &str,
        key: &str,
    ) -> Result<(), RegistrationError> {
        result.map_err(|source| RegistrationError::Registry {
            plugin: self.plugin.to_owned(),
            source,
        })?;
        debug!(target: PLUGINS_TARGET, plugin = self.plugin, kind, key, "handler registered");
        Ok(())
    }

    fn route_result(
        &self,
        result: Result<(), RouteError>,
        path: &str,
    ) -> Result<(), RegistrationError> {
        result.map_err(|source| RegistrationError::Route {
            plugin: self.plugin.to_owned(),
            source,
        })?;
        debug!(target: PLUGINS_TARGET, plugin = self.plugin, path, "route registered");
        Ok(())
    }
}

impl fmt::Debug for PluginHost<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginHost")
            .field("plugin", &self.plugin)
            .finish_non_exhaustive()
    }
}

/// Read-only tables produced by [`PluginLoader::load`].
#[derive(Debug)]
pub struct Registries {
    token: SessionToken,
    services: ServiceRegistry,
    vlam: VlamDispatchTable,
    page_handlers: PageHandlers,
    routes: RequestRouter,
    order: Vec<String>,
}

impl Registries {
    /// Process session token.
    #[must_use]
    pub const fn session_token(&self) -> &SessionToken {
        &self.token
    }

    /// Published services.
    #[must_use]
    pub const fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    /// VLAM keyword table.
    #[must_use]
    pub const fn vlam(&self) -> &VlamDispatchTable {
        &self.vlam
    }

    /// End-of-page handlers.
    #[must_use]
    pub const fn page_handlers(&self) -> &PageHandlers {
        &self.page_handlers
    }

    /// Route table.
    #[must_use]
    pub const fn routes(&self) -> &RequestRouter {
        &self.routes
    }

    /// Plugin names in the order they registered.
    #[must_use]
    pub fn load_order(&self) -> &[String] {
        &self.order
    }

    /// Offers `element` to the VLAM table.
    ///
    /// # Errors
    ///
    /// Returns the bound handler's failure; unknown keywords are not errors.
    pub fn interpret(
        &self,
        page: &mut dyn Page,
        element: &mut dyn Element,
        uid: &str,
    ) -> anyhow::Result<VlamOutcome> {
        self.vlam.dispatch(&self.services, page, element, uid)
    }

    /// Runs the end-of-page handlers against `page`.
    ///
    /// # Errors
    ///
    /// Returns the first handler failure.
    pub fn finish_page(&self, page: &mut dyn Page) -> anyhow::Result<()> {
        self.page_handlers.run_all(page)
    }
}

/// Collects plugins and registers them in dependency order.
#[derive(Default)]
pub struct PluginLoader {
    builtins: CapabilitySet,
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginLoader {
    /// Creates a loader with no built-in capabilities.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Capabilities the host supplies before any plugin runs.
    #[must_use]
    pub fn with_builtins(mut self, builtins: CapabilitySet) -> Self {
        self.builtins = builtins;
        self
    }

    /// Adds a plugin; declaration order breaks ties in the load order.
    #[must_use]
    pub fn with_plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Adds a boxed plugin.
    pub fn add(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Declares every plugin, resolves the order, runs each registration,
    /// and freezes the result.
    ///
    /// # Errors
    ///
    /// Returns the first [`CapabilityError`]. Declaration and resolution
    /// failures surface before any plugin's `register` runs, including
    /// [`CapabilityError::DuplicatePlugin`] when two plugins share a name.
    pub fn load(self, token: SessionToken) -> Result<Registries, CapabilityError> {
        let mut capabilities = CapabilityRegistry::with_builtins(self.builtins);
        let mut seen = BTreeSet::new();
        for plugin in &self.plugins {
            // Callbacks are keyed by name, so each name maps to one plugin.
            if !seen.insert(plugin.name()) {
                return Err(CapabilityError::DuplicatePlugin {
                    name: plugin.name().to_owned(),
                });
            }
            capabilities.declare(plugin.name(), plugin.provides(), plugin.requires())?;
        }
        let order = capabilities.resolve_order()?;

        let callbacks: BTreeMap<String, RegistrationCallback<'_, RegistryBuilder>> = self
            .plugins
            .iter()
            .map(|plugin| {
                let callback: RegistrationCallback<'_, RegistryBuilder> =
                    Box::new(move |builder: &mut RegistryBuilder| {
                        let mut host = PluginHost::new(plugin.name(), builder);
                        plugin.register(&mut host)
                    });
                (plugin.name().to_owned(), callback)
            })
            .collect();

        let mut builder = RegistryBuilder::new(token);
        capabilities.run(&order, callbacks, &mut builder)?;
        info!(
            target: PLUGINS_TARGET,
            order = ?order,
            services = builder.services.len(),
            vlam = builder.vlam.len(),
            routes = builder.routes.paths().len(),
            "plugins registered"
        );
        Ok(builder.freeze(order))
    }
}

impl fmt::Debug for PluginLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.plugins.iter().map(|plugin| plugin.name()).collect();
        f.debug_struct("PluginLoader")
            .field("builtins", &self.builtins)
            .field("plugins", &names)
            .finish()
    }
}
