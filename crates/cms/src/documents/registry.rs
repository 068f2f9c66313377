//! Content-type registry.
//!
//! Every document carries a type tag. The registry maps each tag to a
//! [`ContentTypeHandler`] describing how documents of that type behave:
//! whether they are webpages (tree nodes with URLs and sibling order) and
//! how their paging links are built. The registry is populated at startup;
//! documents of unregistered types are rejected on add.

use std::collections::HashMap;
use std::sync::Arc;

use folio_persistence::site::Site;
use folio_persistence::types::{Document, DocumentType};

use super::rel_links::{PageMetadata, RelLinks, default_rel_links};
use crate::error::{CmsResult, RegistryError};

/// Type name of the built-in generic webpage.
pub const TEXT_PAGE: &str = "TextPage";

/// Type name of the built-in layout document.
pub const LAYOUT: &str = "Layout";

/// Behavior shared by every document of one content type.
pub trait ContentTypeHandler: Send + Sync {
    /// The type tag this handler serves.
    fn type_name(&self) -> &str;

    /// Whether documents of this type are webpages.
    fn is_webpage(&self) -> bool;

    /// Builds the `prev`/`next` links of a paged webpage.
    ///
    /// Returns empty links for documents without a URL.
    fn rel_links(
        &self,
        site: &Site,
        webpage: &Document,
        page: &PageMetadata,
    ) -> CmsResult<RelLinks> {
        match webpage.absolute_url(site) {
            Some(base_url) => default_rel_links(&base_url, page),
            None => Ok(RelLinks::default()),
        }
    }
}

/// A handler using the default behavior for its kind.
#[derive(Debug, Clone)]
pub struct StandardContentType {
    type_name: DocumentType,
    is_webpage: bool,
}

impl StandardContentType {
    /// A webpage type.
    pub fn webpage(type_name: impl Into<DocumentType>) -> Self {
        Self {
            type_name: type_name.into(),
            is_webpage: true,
        }
    }

    /// A plain document type.
    pub fn plain(type_name: impl Into<DocumentType>) -> Self {
        Self {
            type_name: type_name.into(),
            is_webpage: false,
        }
    }
}

impl ContentTypeHandler for StandardContentType {
    fn type_name(&self) -> &str {
        self.type_name.as_str()
    }

    fn is_webpage(&self) -> bool {
        self.is_webpage
    }
}

/// Maps content type tags to their handlers.
#[derive(Default)]
pub struct ContentTypeRegistry {
    handlers: HashMap<String, Arc<dyn ContentTypeHandler>>,
}

impl ContentTypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in `TextPage` and `Layout` types.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .handlers
            .insert(TEXT_PAGE.to_string(), Arc::new(StandardContentType::webpage(TEXT_PAGE)));
        registry
            .handlers
            .insert(LAYOUT.to_string(), Arc::new(StandardContentType::plain(LAYOUT)));
        registry
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registers a handler.
    pub fn register<H>(&mut self, handler: H) -> Result<(), RegistryError>
    where
        H: ContentTypeHandler + 'static,
    {
        let name = handler.type_name().to_string();
        if self.handlers.contains_key(&name) {
            return Err(RegistryError::DuplicateContentType {
                document_type: name,
            });
        }
        self.handlers.insert(name, Arc::new(handler));
        Ok(())
    }

    /// Registers a handler, builder style.
    pub fn with<H>(mut self, handler: H) -> Result<Self, RegistryError>
    where
        H: ContentTypeHandler + 'static,
    {
        self.register(handler)?;
        Ok(self)
    }

    /// Looks up the handler for a type.
    pub fn get(&self, document_type: &str) -> Option<Arc<dyn ContentTypeHandler>> {
        self.handlers.get(document_type).cloned()
    }

    /// Looks up the handler for a type, failing when it is unknown.
    pub fn require(&self, document_type: &str) -> Result<Arc<dyn ContentTypeHandler>, RegistryError> {
        self.get(document_type)
            .ok_or_else(|| RegistryError::UnknownContentType {
                document_type: document_type.to_string(),
            })
    }

    /// Checks a document against its registered type.
    ///
    /// Webpage types require webpage fields and plain types forbid them.
    pub fn check(&self, document: &Document) -> Result<Arc<dyn ContentTypeHandler>, RegistryError> {
        let handler = self.require(document.document_type().as_str())?;
        match (handler.is_webpage(), document.is_webpage()) {
            (true, false) => Err(RegistryError::KindMismatch {
                document_type: handler.type_name().to_string(),
                expectation: "requires webpage fields",
            }),
            (false, true) => Err(RegistryError::KindMismatch {
                document_type: handler.type_name().to_string(),
                expectation: "does not accept webpage fields",
            }),
            _ => Ok(handler),
        }
    }

    /// Returns the registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for ContentTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentTypeRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}
