//! In-memory page and element doubles shared by unit tests.

use std::collections::{BTreeMap, BTreeSet};

use crate::page::{Element, Page, PageId};

#[derive(Debug)]
pub(crate) struct TestPage {
    id: PageId,
    includes: BTreeSet<String>,
}

impl TestPage {
    pub(crate) fn new(id: &str) -> Self {
        Self {
            id: PageId::new(id),
            includes: BTreeSet::new(),
        }
    }
}

impl Page for TestPage {
    fn page_id(&self) -> &PageId {
        &self.id
    }

    fn includes(&self, marker: &str) -> bool {
        self.includes.contains(marker)
    }

    fn add_include(&mut self, marker: &str) {
        self.includes.insert(marker.to_owned());
    }
}

#[derive(Debug)]
pub(crate) struct TestElement {
    tag: String,
    attributes: BTreeMap<String, String>,
}

impl TestElement {
    pub(crate) fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_owned(),
            attributes: BTreeMap::new(),
        }
    }

    pub(crate) fn with_title(mut self, title: &str) -> Self {
        self.set_attribute("title", title);
        self
    }
}

impl Element for TestElement {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        self.attributes.insert(name.to_owned(), value.to_owned());
    }
}
