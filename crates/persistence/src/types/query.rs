//! Document query predicates.

use serde::{Deserialize, Serialize};

use super::document::{DocumentId, DocumentType};

/// Restricts a query by position in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParentFilter {
    /// No restriction.
    #[default]
    Any,
    /// Root-level webpages only.
    Root,
    /// Direct children of the given webpage.
    Parent(DocumentId),
}

impl ParentFilter {
    /// The filter selecting the siblings of a page whose parent is `parent`.
    pub fn siblings_of(parent: Option<DocumentId>) -> Self {
        match parent {
            Some(id) => ParentFilter::Parent(id),
            None => ParentFilter::Root,
        }
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QueryOrder {
    /// Ascending id. Required for keyset paging.
    #[default]
    Id,
    /// Ascending display order, then id.
    DisplayOrder,
}

/// A predicate over the documents of one site.
///
/// Queries always run inside the site of the supplied tenant context and
/// skip deleted documents unless [`including_deleted`](Self::including_deleted)
/// is set. The type filter is an exact match on the type tag.
///
/// # Examples
///
/// ```
/// use folio_persistence::types::{DocumentId, DocumentQuery, ParentFilter, QueryOrder};
///
/// let siblings = DocumentQuery::new()
///     .with_parent(ParentFilter::Root)
///     .with_url_segment("about")
///     .excluding(DocumentId::new(4));
/// assert_eq!(siblings.exclude_id, Some(DocumentId::new(4)));
///
/// let page = DocumentQuery::new().of_type("TextPage").after(DocumentId::new(100)).with_limit(50);
/// assert_eq!(page.order, QueryOrder::Id);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentQuery {
    /// Exact type tag.
    pub document_type: Option<DocumentType>,
    /// Tree position.
    pub parent: ParentFilter,
    /// Exact URL segment.
    pub url_segment: Option<String>,
    /// A document to leave out, typically the one being saved.
    pub exclude_id: Option<DocumentId>,
    /// Include logically deleted documents.
    pub include_deleted: bool,
    /// Keyset cursor: only ids greater than this.
    pub after_id: Option<DocumentId>,
    /// Maximum number of rows.
    pub limit: Option<u32>,
    /// Result ordering.
    pub order: QueryOrder,
}

impl DocumentQuery {
    /// A query matching every live document of the site.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to one exact type.
    pub fn of_type(mut self, document_type: impl Into<DocumentType>) -> Self {
        self.document_type = Some(document_type.into());
        self
    }

    /// Restricts by tree position.
    pub fn with_parent(mut self, parent: ParentFilter) -> Self {
        self.parent = parent;
        self
    }

    /// Restricts to one URL segment.
    pub fn with_url_segment(mut self, url_segment: impl Into<String>) -> Self {
        self.url_segment = Some(url_segment.into());
        self
    }

    /// Leaves one document out.
    pub fn excluding(mut self, id: DocumentId) -> Self {
        self.exclude_id = Some(id);
        self
    }

    /// Includes logically deleted documents.
    pub fn including_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    /// Continues after the given id.
    pub fn after(mut self, id: DocumentId) -> Self {
        self.after_id = Some(id);
        self
    }

    /// Caps the number of rows.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the ordering.
    pub fn ordered_by(mut self, order: QueryOrder) -> Self {
        self.order = order;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_siblings_of() {
        assert_eq!(ParentFilter::siblings_of(None), ParentFilter::Root);
        assert_eq!(
            ParentFilter::siblings_of(Some(DocumentId::new(2))),
            ParentFilter::Parent(DocumentId::new(2))
        );
    }

    #[test]
    fn test_default_query() {
        let q = DocumentQuery::new();
        assert_eq!(q.parent, ParentFilter::Any);
        assert!(!q.include_deleted);
        assert_eq!(q.limit, None);
        assert_eq!(q.order, QueryOrder::Id);
    }
}
