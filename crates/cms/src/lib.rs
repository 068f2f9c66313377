//! # folio-cms
//!
//! Site resolution and document services for Folio.
//!
//! This crate sits on top of [`folio_persistence`] and provides:
//!
//! - **Site resolution**: mapping a request authority to the site that
//!   serves it, with a per-request memoizing [`SiteLocator`]
//! - **Document services**: tenant-scoped add, save, lookup, streaming,
//!   publication and deletion of documents and webpages
//! - **Content types**: a registry of type handlers used for validation
//!   and type-specific behavior such as paging links
//! - **Configuration**: environment and CLI driven [`FolioConfig`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use folio_cms::{ContentTypeRegistry, DocumentService, FolioConfig, SiteResolver, init_logging};
//! use folio_persistence::backends::sqlite::SqliteBackend;
//!
//! let config = FolioConfig::from_env();
//! init_logging(&config.log_level);
//!
//! let backend = Arc::new(SqliteBackend::with_config(&config.database_url, config.sqlite_config())?);
//! backend.init_schema()?;
//!
//! let resolver = SiteResolver::new(backend.clone(), config.resolver_options());
//! let documents = DocumentService::with_config(
//!     backend,
//!     Arc::new(ContentTypeRegistry::with_defaults()),
//!     config.service_config(),
//! );
//!
//! let tenant = resolver.locator("www.example.com").tenant_context().await?;
//! let pages = documents.children(&tenant, None).await?;
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod documents;
pub mod error;
pub mod resolver;

pub use config::FolioConfig;
pub use documents::{ContentTypeHandler, ContentTypeRegistry, DocumentService, DocumentServiceConfig};
pub use error::{CmsError, CmsResult, ErrorKind, RegistryError, SiteError};
pub use resolver::{ResolvedSite, ResolverOptions, SiteLocator, SiteMatch, SiteResolver, UnmatchedHostPolicy};

/// Initializes logging for Folio.
///
/// `RUST_LOG` takes precedence; otherwise `level` applies to the Folio crates.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "folio={},folio_cms={},folio_persistence={}",
            level, level, level
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
