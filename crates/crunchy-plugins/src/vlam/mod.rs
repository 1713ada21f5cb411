//! VLAM keyword dispatch.
//!
//! A VLAM element carries its interpretation in the `title` attribute, for
//! example `<pre title="editor no-pre">`. The first word selects the handler
//! registered for the element's tag; the remaining words are options the
//! handler may consult. Unknown keywords are ignored so that page rendering
//! never fails on markup it does not understand.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::PLUGINS_TARGET;
use crate::error::RegistryError;
use crate::page::{Element, ElementHandler, Invocation, Page};
use crate::registry::HandlerTable;
use crate::services::ServiceRegistry;

/// Attribute holding the VLAM keywords.
pub const VLAM_ATTRIBUTE: &str = "title";

/// Parsed VLAM attribute.
///
/// # Example
///
/// ```
/// use crunchy_plugins::Keywords;
///
/// let keywords = Keywords::parse("Editor no-pre  linenumber").expect("keyword present");
/// assert_eq!(keywords.keyword(), "editor");
/// assert!(keywords.contains("no-pre"));
/// assert!(!keywords.contains("external"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keywords {
    keyword: String,
    options: BTreeSet<String>,
}

impl Keywords {
    /// Splits `text` on whitespace; returns `None` when it holds no words.
    ///
    /// The dispatch keyword is lower-cased; options are kept verbatim.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let mut words = text.split_whitespace();
        let keyword = words.next()?.to_ascii_lowercase();
        Some(Self {
            keyword,
            options: words.map(str::to_owned).collect(),
        })
    }

    /// Dispatch keyword.
    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Returns `true` when `word` is the keyword or one of the options.
    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.keyword == word || self.options.contains(word)
    }

    /// Options following the keyword, in lexical order.
    pub fn options(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(String::as_str)
    }
}

/// Table key: lower-cased tag and keyword.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct VlamKey {
    tag: String,
    keyword: String,
}

impl VlamKey {
    fn new(tag: &str, keyword: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            keyword: keyword.to_ascii_lowercase(),
        }
    }
}

impl fmt::Display for VlamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} {}=\"{}\">", self.tag, VLAM_ATTRIBUTE, self.keyword)
    }
}

/// Result of offering an element to the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VlamOutcome {
    /// A handler interpreted the element.
    Handled,
    /// The element carried no VLAM attribute or an unknown keyword.
    Ignored,
}

/// Mapping from `(tag, keyword)` to the handler interpreting such elements.
#[derive(Debug)]
pub struct VlamDispatchTable {
    table: HandlerTable<VlamKey, dyn ElementHandler>,
}

impl Default for VlamDispatchTable {
    fn default() -> Self {
        Self {
            table: HandlerTable::new("vlam handler"),
        }
    }
}

impl VlamDispatchTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `handler` to `(tag, keyword)`; both are matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateRegistration`] when the pair is
    /// already bound; the existing handler stays in place.
    pub fn register(
        &mut self,
        tag: &str,
        keyword: &str,
        handler: Arc<dyn ElementHandler>,
    ) -> Result<(), RegistryError> {
        self.table.register(VlamKey::new(tag, keyword), handler)
    }

    /// Binds `handler` to `(tag, keyword)`, displacing any existing handler.
    pub fn replace(
        &mut self,
        tag: &str,
        keyword: &str,
        handler: Arc<dyn ElementHandler>,
    ) -> Option<Arc<dyn ElementHandler>> {
        let key = VlamKey::new(tag, keyword);
        let previous = self.table.replace(key.clone(), handler);
        if previous.is_some() {
            warn!(target: PLUGINS_TARGET, key = %key, "vlam handler replaced");
        }
        previous
    }

    /// Finds the handler bound to `(tag, keyword)`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when nothing is bound.
    pub fn lookup(
        &self,
        tag: &str,
        keyword: &str,
    ) -> Result<&Arc<dyn ElementHandler>, RegistryError> {
        self.table.lookup(&VlamKey::new(tag, keyword))
    }

    /// Interprets `element` if its VLAM attribute names a bound keyword.
    ///
    /// # Errors
    ///
    /// Only a failing handler produces an error; unknown keywords and
    /// elements without the attribute yield [`VlamOutcome::Ignored`].
    pub fn dispatch(
        &self,
        services: &ServiceRegistry,
        page: &mut dyn Page,
        element: &mut dyn Element,
        uid: &str,
    ) -> anyhow::Result<VlamOutcome> {
        let Some(keywords) = element.attribute(VLAM_ATTRIBUTE).and_then(Keywords::parse) else {
            return Ok(VlamOutcome::Ignored);
        };
        let key = VlamKey::new(element.tag(), keywords.keyword());
        let Ok(handler) = self.table.lookup(&key) else {
            debug!(target: PLUGINS_TARGET, key = %key, uid, "unknown vlam keyword ignored");
            return Ok(VlamOutcome::Ignored);
        };
        handler.handle(Invocation::new(page, element, uid, services).with_keywords(&keywords))?;
        Ok(VlamOutcome::Handled)
    }

    /// Bound pairs, rendered as `<tag title="keyword">`, in lexical order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.table.keys()
    }

    /// Number of bound pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` when nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }
}
