//! Document lifecycle services.
//!
//! [`DocumentService`] is the tenant-scoped entry point for creating,
//! reading, publishing and deleting documents. Type-specific behavior is
//! looked up in a [`ContentTypeRegistry`] populated at startup.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use folio_cms::documents::{ContentTypeRegistry, DocumentService};
//! use folio_persistence::types::{Document, WebpageFields};
//!
//! let service = DocumentService::new(
//!     Arc::new(backend),
//!     Arc::new(ContentTypeRegistry::with_defaults()),
//! );
//!
//! let mut page = Document::webpage("TextPage", "About", WebpageFields::new("about"));
//! service.add_document(&tenant, &mut page).await?;
//! service.publish_now(&tenant, &mut page).await?;
//! ```

mod registry;
mod rel_links;
mod service;

pub use registry::{
    ContentTypeHandler, ContentTypeRegistry, LAYOUT, StandardContentType, TEXT_PAGE,
};
pub use rel_links::{PAGE_PARAM, PageMetadata, RelLinks, default_rel_links};
pub use service::{DocumentService, DocumentServiceConfig};
