//! Entity kinds and the dependent records that hang off documents.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::DocumentId;

/// The kinds of persisted entity a delete can reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A document or webpage.
    Document,
    /// A previous URL segment of a webpage.
    UrlHistory,
    /// A tag link row.
    DocumentTag,
}

impl EntityKind {
    /// Returns `true` if entities of this kind carry a deleted flag.
    pub fn is_soft_deletable(self) -> bool {
        match self {
            EntityKind::Document | EntityKind::UrlHistory => true,
            EntityKind::DocumentTag => false,
        }
    }

    /// Short lowercase name used in logs and messages.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Document => "document",
            EntityKind::UrlHistory => "url_history",
            EntityKind::DocumentTag => "document_tag",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one entity: its kind plus its row id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    /// Entity kind.
    pub kind: EntityKind,
    /// Row id within that kind.
    pub id: i64,
}

impl EntityKey {
    /// Creates a key.
    pub fn new(kind: EntityKind, id: i64) -> Self {
        Self { kind, id }
    }

    /// Key of a document.
    pub fn document(id: DocumentId) -> Self {
        Self::new(EntityKind::Document, id.get())
    }

    /// Key of a URL history row.
    pub fn url_history(id: i64) -> Self {
        Self::new(EntityKind::UrlHistory, id)
    }

    /// Key of a tag link row.
    pub fn document_tag(id: i64) -> Self {
        Self::new(EntityKind::DocumentTag, id)
    }

    /// Returns the document id if this key names a document.
    pub fn as_document(self) -> Option<DocumentId> {
        (self.kind == EntityKind::Document).then(|| DocumentId::new(self.id))
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// A previous URL segment of a webpage, kept so old links can be redirected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlHistory {
    /// Row id.
    pub id: i64,
    /// The webpage that used to live at this segment.
    pub document_id: DocumentId,
    /// The old segment.
    pub url_segment: String,
    /// Logical deletion flag.
    pub is_deleted: bool,
    /// When the segment was retired.
    pub created_on: DateTime<Utc>,
}

/// A tag attached to a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTag {
    /// Row id.
    pub id: i64,
    /// The tagged document.
    pub document_id: DocumentId,
    /// Tag name.
    pub name: String,
}
