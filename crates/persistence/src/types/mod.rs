//! Core types for the persistence layer.
//!
//! - [`Document`], [`WebpageFields`] - Content documents and their tree attributes
//! - [`DocumentQuery`] - Predicates for tenant-scoped queries
//! - [`EntityKey`], [`EntityKind`] - Addressing for deletes and cascades
//! - [`UrlHistory`], [`DocumentTag`] - Records that depend on a document

mod document;
mod entity;
mod query;

pub use document::{Document, DocumentId, DocumentType, WebpageFields};
pub use entity::{DocumentTag, EntityKey, EntityKind, UrlHistory};
pub use query::{DocumentQuery, ParentFilter, QueryOrder};
