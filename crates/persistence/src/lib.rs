//! Folio Persistence Layer
//!
//! This crate provides the storage side of the Folio content repository: the
//! site directory, the tenant-scoped document store, and the soft-delete
//! interceptor that turns deletes into logical removals across declared
//! cascade edges.
//!
//! # Features
//!
//! - **Multi-site**: every document belongs to exactly one site, and every
//!   store operation requires a [`TenantContext`](tenant::TenantContext)
//! - **Tree ordering**: sibling display orders are assigned inside the insert
//!   transaction and protected by a unique index
//! - **Soft delete**: deletes are intercepted and cascaded over an explicit
//!   edge list, with a visited-set guard against cycles
//!
//! Enable backends with feature flags in `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! folio-persistence = { version = "0.1", features = ["sqlite"] }
//! ```
//!
//! # Architecture
//!
//! - [`tenant`] - Site identifiers and the tenant context required for all operations
//! - [`site`] - Site records and the site directory
//! - [`types`] - Documents, dependent entities, and query predicates
//! - [`error`] - Error types for all operations
//! - [`core`] - The document store trait and the soft-delete interceptor
//! - [`backends`] - Backend implementations (SQLite)
//!
//! # Quick Start
//!
//! ```
//! use folio_persistence::tenant::{SiteId, TenantContext};
//! use folio_persistence::types::{Document, WebpageFields};
//!
//! let tenant = TenantContext::new(SiteId::new(1));
//!
//! let page = Document::webpage("TextPage", "About us", WebpageFields::new("about-us"));
//! assert!(page.id().is_none());
//! assert!(page.is_webpage());
//! assert_eq!(tenant.site_id(), Some(SiteId::new(1)));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod core;
pub mod error;
pub mod site;
pub mod tenant;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{StorageError, StorageResult};
pub use site::{CachedSiteDirectory, NewSite, RedirectedDomain, Site, SiteDirectory};
pub use tenant::{SiteId, TenantContext};
pub use types::{Document, DocumentId, DocumentQuery, DocumentType, WebpageFields};

// Re-export core traits
pub use core::{CascadeReport, DocumentStore, OrderAssignment, SoftDeleteInterceptor};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
