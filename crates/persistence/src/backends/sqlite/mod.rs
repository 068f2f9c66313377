//! SQLite backend implementation.
//!
//! This module provides the SQLite implementation of [`DocumentStore`] and
//! [`SiteDirectory`]. It supports both in-memory databases (great for
//! testing) and file-based databases.
//!
//! [`DocumentStore`]: crate::core::DocumentStore
//! [`SiteDirectory`]: crate::site::SiteDirectory
//!
//! # Features
//!
//! - In-memory and file-based modes
//! - Write transactions opened with `BEGIN IMMEDIATE`
//! - Sibling order and URL uniqueness enforced by partial unique indexes
//! - Deletes routed through the soft-delete interceptor
//!
//! # Example
//!
//! ```no_run
//! use folio_persistence::backends::sqlite::SqliteBackend;
//! use folio_persistence::site::NewSite;
//! use folio_persistence::tenant::TenantContext;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SqliteBackend::in_memory()?;
//! backend.init_schema()?;
//!
//! let site = backend.create_site(NewSite::new("Main", "www.example.com")).await?;
//! let tenant = TenantContext::for_site(&site);
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE documents (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     site_id INTEGER NOT NULL REFERENCES sites(id),
//!     document_type TEXT NOT NULL,
//!     name TEXT NOT NULL,
//!     is_webpage INTEGER NOT NULL DEFAULT 0,
//!     parent_id INTEGER REFERENCES documents(id),
//!     url_segment TEXT,
//!     display_order INTEGER,
//!     publish_on TEXT,
//!     data TEXT NOT NULL,          -- JSON payload
//!     is_deleted INTEGER NOT NULL DEFAULT 0,
//!     created_on TEXT NOT NULL,
//!     updated_on TEXT NOT NULL,
//!     deleted_on TEXT
//! );
//!
//! -- Live siblings never share an order or a segment
//! CREATE UNIQUE INDEX idx_documents_sibling_order
//!     ON documents(site_id, IFNULL(parent_id, 0), display_order)
//!     WHERE is_deleted = 0 AND display_order IS NOT NULL;
//! CREATE UNIQUE INDEX idx_documents_sibling_url
//!     ON documents(site_id, IFNULL(parent_id, 0), url_segment)
//!     WHERE is_deleted = 0 AND url_segment IS NOT NULL;
//! ```

mod backend;
mod cascade;
mod schema;
mod sites;
mod storage;

pub use backend::{SqliteBackend, SqliteBackendConfig};
pub use schema::SCHEMA_VERSION;
