//! Documents and webpages.
//!
//! This module defines [`Document`], the single persisted shape behind every
//! content type. Concrete types are distinguished by a [`DocumentType`] tag;
//! type-specific fields live in the JSON payload.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TenantError;
use crate::site::Site;
use crate::tenant::SiteId;

/// Identifier of a persisted document.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(i64);

impl DocumentId {
    /// Creates a document ID from its raw value.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.0)
    }
}

/// The concrete content type of a document, e.g. `TextPage` or `Layout`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentType(String);

impl DocumentType {
    /// Creates a type tag.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentType {
    fn from(s: &str) -> Self {
        DocumentType::new(s)
    }
}

impl From<String> for DocumentType {
    fn from(s: String) -> Self {
        DocumentType::new(s)
    }
}

impl AsRef<str> for DocumentType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Tree and publication attributes carried by webpages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebpageFields {
    /// Parent webpage; `None` places the page at root level.
    pub parent_id: Option<DocumentId>,
    /// Path segment, unique among live siblings.
    pub url_segment: String,
    /// Position among siblings. `None` asks the store to append.
    pub display_order: Option<i32>,
    /// Publication time; `None` means unpublished.
    pub publish_on: Option<DateTime<Utc>>,
}

impl WebpageFields {
    /// Root-level, unordered, unpublished fields for the given segment.
    pub fn new(url_segment: impl Into<String>) -> Self {
        Self {
            parent_id: None,
            url_segment: url_segment.into(),
            display_order: None,
            publish_on: None,
        }
    }

    /// Places the page under `parent`.
    pub fn with_parent(mut self, parent: DocumentId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    /// Pins the sibling position.
    pub fn with_display_order(mut self, display_order: i32) -> Self {
        self.display_order = Some(display_order);
        self
    }

    /// Sets the publication time.
    pub fn with_publish_on(mut self, publish_on: DateTime<Utc>) -> Self {
        self.publish_on = Some(publish_on);
        self
    }

    /// Returns `true` if the page is published at `now`.
    pub fn is_published_at(&self, now: DateTime<Utc>) -> bool {
        self.publish_on.is_some_and(|at| at <= now)
    }
}

/// A content document.
///
/// A document is created detached (no id, no site) and gains both on its
/// first insert. After that the owning site never changes. The deleted flag
/// is owned by the store: it can be observed, and it can be raised by a
/// delete, but no public API lowers it.
///
/// # Examples
///
/// ```
/// use folio_persistence::types::{Document, WebpageFields};
/// use serde_json::json;
///
/// let mut page = Document::webpage("TextPage", "Home", WebpageFields::new("home"))
///     .with_data(json!({"body": "<p>Welcome</p>"}));
///
/// assert_eq!(page.url_segment(), Some("home"));
/// assert!(!page.is_published());
///
/// page.webpage_mut().unwrap().display_order = Some(2);
/// assert_eq!(page.display_order(), Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    id: Option<DocumentId>,
    site_id: Option<SiteId>,
    document_type: DocumentType,
    /// Display name.
    pub name: String,
    is_deleted: bool,
    created_on: DateTime<Utc>,
    updated_on: DateTime<Utc>,
    webpage: Option<WebpageFields>,
    /// Type-specific payload.
    pub data: Value,
}

impl Document {
    /// Creates a plain (non-webpage) document.
    pub fn new(document_type: impl Into<DocumentType>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            site_id: None,
            document_type: document_type.into(),
            name: name.into(),
            is_deleted: false,
            created_on: now,
            updated_on: now,
            webpage: None,
            data: Value::Object(Default::default()),
        }
    }

    /// Creates a webpage.
    pub fn webpage(
        document_type: impl Into<DocumentType>,
        name: impl Into<String>,
        fields: WebpageFields,
    ) -> Self {
        let mut document = Self::new(document_type, name);
        document.webpage = Some(fields);
        document
    }

    /// Replaces the JSON payload.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Rebuilds a document from stored columns.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_storage(
        id: DocumentId,
        site_id: SiteId,
        document_type: DocumentType,
        name: String,
        is_deleted: bool,
        created_on: DateTime<Utc>,
        updated_on: DateTime<Utc>,
        webpage: Option<WebpageFields>,
        data: Value,
    ) -> Self {
        Self {
            id: Some(id),
            site_id: Some(site_id),
            document_type,
            name,
            is_deleted,
            created_on,
            updated_on,
            webpage,
            data,
        }
    }

    /// Records the identity assigned by a successful insert.
    pub(crate) fn assign_identity(&mut self, id: DocumentId, site_id: SiteId, at: DateTime<Utc>) {
        self.id = Some(id);
        self.site_id = Some(site_id);
        self.created_on = at;
        self.updated_on = at;
    }

    /// Records the modification time of a successful update.
    pub(crate) fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_on = at;
    }

    /// Returns the identifier, `None` before the first save.
    pub fn id(&self) -> Option<DocumentId> {
        self.id
    }

    /// Returns the owning site, `None` before the first save.
    pub fn site_id(&self) -> Option<SiteId> {
        self.site_id
    }

    /// Binds the document to `site_id`.
    ///
    /// Binding is a no-op when the document already belongs to that site and
    /// fails when it belongs to another one.
    pub fn bind_to_site(&mut self, site_id: SiteId) -> Result<(), TenantError> {
        match self.site_id {
            None => {
                self.site_id = Some(site_id);
                Ok(())
            }
            Some(current) if current == site_id => Ok(()),
            Some(current) => Err(TenantError::TenantMismatch {
                expected: site_id,
                actual: current,
            }),
        }
    }

    /// Returns the concrete type tag.
    pub fn document_type(&self) -> &DocumentType {
        &self.document_type
    }

    /// Returns `true` if the document has been logically deleted.
    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    /// Marks this in-memory copy as deleted after a delete went through.
    pub fn mark_deleted(&mut self) {
        self.is_deleted = true;
    }

    /// Returns the creation time.
    pub fn created_on(&self) -> DateTime<Utc> {
        self.created_on
    }

    /// Returns the last modification time.
    pub fn updated_on(&self) -> DateTime<Utc> {
        self.updated_on
    }

    /// Returns `true` if the document carries webpage attributes.
    pub fn is_webpage(&self) -> bool {
        self.webpage.is_some()
    }

    /// Returns the webpage attributes.
    pub fn webpage_fields(&self) -> Option<&WebpageFields> {
        self.webpage.as_ref()
    }

    /// Returns the webpage attributes for editing.
    pub fn webpage_mut(&mut self) -> Option<&mut WebpageFields> {
        self.webpage.as_mut()
    }

    /// Returns the parent webpage, if any.
    pub fn parent_id(&self) -> Option<DocumentId> {
        self.webpage.as_ref().and_then(|w| w.parent_id)
    }

    /// Returns the URL segment of a webpage.
    pub fn url_segment(&self) -> Option<&str> {
        self.webpage.as_ref().map(|w| w.url_segment.as_str())
    }

    /// Returns the sibling position of a webpage.
    pub fn display_order(&self) -> Option<i32> {
        self.webpage.as_ref().and_then(|w| w.display_order)
    }

    /// Returns the publication time of a webpage.
    pub fn publish_on(&self) -> Option<DateTime<Utc>> {
        self.webpage.as_ref().and_then(|w| w.publish_on)
    }

    /// Returns `true` if the document is a webpage published now.
    pub fn is_published(&self) -> bool {
        self.webpage
            .as_ref()
            .is_some_and(|w| w.is_published_at(Utc::now()))
    }

    /// Computes the absolute URL of a webpage under `site`.
    pub fn absolute_url(&self, site: &Site) -> Option<String> {
        self.url_segment().map(|segment| site.absolute_url(segment))
    }
}
