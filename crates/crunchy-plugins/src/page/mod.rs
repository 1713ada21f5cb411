//! Contracts of the page-rendering collaborator and the handler signatures
//! that operate on them.
//!
//! The core never renders markup. It sees a page only through the [`Page`]
//! and [`Element`] traits, and passes them to handlers inside an
//! [`Invocation`], which fixes the parameter contract every element handler
//! receives.

use std::fmt;
use std::sync::Arc;

use anyhow::Context as _;

use crate::services::ServiceRegistry;
use crate::vlam::Keywords;

/// Identity of one rendered browser tab.
///
/// A request's `uid` argument has the form `pageid:counter`; the part before
/// the first `:` correlates the request with per-tab interpreter state owned
/// by an external store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(String);

impl PageId {
    /// Wraps a page identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Extracts the page identifier from a `pageid:counter` uid.
    ///
    /// Returns `None` for an empty prefix.
    #[must_use]
    pub fn from_uid(uid: &str) -> Option<Self> {
        uid.split(':')
            .next()
            .filter(|prefix| !prefix.is_empty())
            .map(Self::new)
    }

    /// Borrows the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle on a page being rendered.
pub trait Page {
    /// Identity of the page.
    fn page_id(&self) -> &PageId;

    /// Returns `true` when the page already carries the named include, such
    /// as a script or stylesheet marker.
    fn includes(&self, marker: &str) -> bool;

    /// Records an include so later handlers can skip duplicating it.
    fn add_include(&mut self, marker: &str);
}

/// Handle on a single markup element.
pub trait Element {
    /// Lower-case tag name.
    fn tag(&self) -> &str;

    /// Reads an attribute value.
    fn attribute(&self, name: &str) -> Option<&str>;

    /// Writes an attribute value.
    fn set_attribute(&mut self, name: &str, value: &str);
}

/// Arguments handed to an [`ElementHandler`].
///
/// `keywords` is present when the call came from VLAM dispatch and absent
/// when a service was invoked directly. `services` lets a handler compose
/// other registered services.
pub struct Invocation<'a> {
    /// Page being rendered.
    pub page: &'a mut dyn Page,
    /// Element being interpreted.
    pub element: &'a mut dyn Element,
    /// Correlation id of the element, `pageid:counter`.
    pub uid: &'a str,
    /// Parsed VLAM attribute, when dispatched by keyword.
    pub keywords: Option<&'a Keywords>,
    /// Services available to the handler.
    pub services: &'a ServiceRegistry,
}

impl<'a> Invocation<'a> {
    /// Builds an invocation without keywords.
    pub fn new(
        page: &'a mut dyn Page,
        element: &'a mut dyn Element,
        uid: &'a str,
        services: &'a ServiceRegistry,
    ) -> Self {
        Self {
            page,
            element,
            uid,
            keywords: None,
            services,
        }
    }

    /// Attaches parsed VLAM keywords.
    #[must_use]
    pub fn with_keywords(mut self, keywords: &'a Keywords) -> Self {
        self.keywords = Some(keywords);
        self
    }

    /// Page identity derived from the uid, if any.
    #[must_use]
    pub fn page_id(&self) -> Option<PageId> {
        PageId::from_uid(self.uid)
    }

    /// Invokes another registered service on the same page and element.
    ///
    /// # Errors
    ///
    /// Fails when the service is not registered or the service itself fails.
    pub fn call_service(&mut self, name: &str) -> anyhow::Result<()> {
        let services = self.services;
        services.invoke(
            name,
            Invocation::new(&mut *self.page, &mut *self.element, self.uid, services),
        )
    }
}

impl fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("page", self.page.page_id())
            .field("tag", &self.element.tag())
            .field("uid", &self.uid)
            .field("keywords", &self.keywords)
            .finish_non_exhaustive()
    }
}

/// Handler invoked for a service name or a VLAM `(tag, keyword)` pair.
pub trait ElementHandler: Send + Sync {
    /// Interprets the element described by `invocation`.
    ///
    /// # Errors
    ///
    /// Returns any failure raised while interpreting the element.
    fn handle(&self, invocation: Invocation<'_>) -> anyhow::Result<()>;
}

impl<F> ElementHandler for F
where
    F: Fn(Invocation<'_>) -> anyhow::Result<()> + Send + Sync,
{
    fn handle(&self, invocation: Invocation<'_>) -> anyhow::Result<()> {
        self(invocation)
    }
}

/// Handler run once a page has been fully interpreted.
pub trait PageHandler: Send + Sync {
    /// Finalises `page`.
    ///
    /// # Errors
    ///
    /// Returns any failure raised while finalising the page.
    fn handle(&self, page: &mut dyn Page) -> anyhow::Result<()>;
}

impl<F> PageHandler for F
where
    F: Fn(&mut dyn Page) -> anyhow::Result<()> + Send + Sync,
{
    fn handle(&self, page: &mut dyn Page) -> anyhow::Result<()> {
        self(page)
    }
}

/// End-of-page handlers in registration order.
#[derive(Default, Clone)]
pub struct PageHandlers {
    handlers: Vec<Arc<dyn PageHandler>>,
}

impl PageHandlers {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler.
    pub fn push(&mut self, handler: Arc<dyn PageHandler>) {
        self.handlers.push(handler);
    }

    /// Runs every handler against `page` in registration order.
    ///
    /// # Errors
    ///
    /// Stops at the first failing handler and returns its error with the
    /// handler's zero-based index attached.
    pub fn run_all(&self, page: &mut dyn Page) -> anyhow::Result<()> {
        for (index, handler) in self.handlers.iter().enumerate() {
            handler
                .handle(page)
                .with_context(|| format!("end-of-page handler #{index} failed"))?;
        }
        Ok(())
    }

    /// Number of handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` when no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for PageHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageHandlers")
            .field("len", &self.handlers.len())
            .finish()
    }
}
