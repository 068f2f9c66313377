//! Configuration for the Folio CMS core.
//!
//! This module provides the configuration shared by the site resolver, the
//! document service and the SQLite backend, supporting both programmatic
//! configuration and environment variable overrides.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `FOLIO_DATABASE_URL` | folio.db | SQLite path, or `:memory:` |
//! | `FOLIO_LOG_LEVEL` | info | Log level |
//! | `FOLIO_DEBUG_SITE_ID` | (unset) | Site served regardless of host |
//! | `FOLIO_UNMATCHED_HOST` | first-site | `first-site` or `reject` |
//! | `FOLIO_ORDER_RETRY_ATTEMPTS` | 3 | Display-order conflict retries |
//! | `FOLIO_STREAM_PAGE_SIZE` | 100 | Page size for document streams |
//! | `FOLIO_BUSY_TIMEOUT_MS` | 5000 | SQLite busy timeout (milliseconds) |
//!
//! # Example
//!
//! ```rust
//! use folio_cms::FolioConfig;
//!
//! // Create from environment
//! let config = FolioConfig::from_env();
//!
//! // Or create programmatically
//! let config = FolioConfig {
//!     database_url: ":memory:".to_string(),
//!     debug_site_id: Some(2),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use clap::Parser;

use crate::documents::DocumentServiceConfig;
use crate::resolver::{ResolverOptions, UnmatchedHostPolicy};

/// Configuration for the Folio CMS core.
///
/// This struct can be constructed from environment variables using [`FolioConfig::from_env`],
/// from command line arguments using [`FolioConfig::parse`], or programmatically.
#[derive(Debug, Clone, Parser)]
#[command(name = "folio")]
#[command(about = "Multi-site content management core")]
pub struct FolioConfig {
    /// SQLite database path, or `:memory:`.
    #[arg(long, env = "FOLIO_DATABASE_URL", default_value = "folio.db")]
    pub database_url: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "FOLIO_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Serve this site for every request, whatever the host.
    #[arg(long, env = "FOLIO_DEBUG_SITE_ID")]
    pub debug_site_id: Option<i64>,

    /// What to do when no site matches the request host.
    #[arg(
        long,
        env = "FOLIO_UNMATCHED_HOST",
        value_enum,
        default_value_t = UnmatchedHostPolicy::FirstSite
    )]
    pub unmatched_host: UnmatchedHostPolicy,

    /// Retries of a sibling display-order conflict before it is reported.
    #[arg(long, env = "FOLIO_ORDER_RETRY_ATTEMPTS", default_value = "3")]
    pub order_retry_attempts: u32,

    /// Documents fetched per page when streaming a content type.
    #[arg(long, env = "FOLIO_STREAM_PAGE_SIZE", default_value = "100")]
    pub stream_page_size: u32,

    /// SQLite busy timeout in milliseconds.
    #[arg(long, env = "FOLIO_BUSY_TIMEOUT_MS", default_value = "5000")]
    pub busy_timeout_ms: u32,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            database_url: "folio.db".to_string(),
            log_level: "info".to_string(),
            debug_site_id: None,
            unmatched_host: UnmatchedHostPolicy::FirstSite,
            order_retry_attempts: 3,
            stream_page_size: 100,
            busy_timeout_ms: 5000,
        }
    }
}

impl FolioConfig {
    /// Creates a new FolioConfig from environment variables.
    ///
    /// This is a convenience method that parses environment variables without
    /// requiring command line arguments.
    pub fn from_env() -> Self {
        // Try to parse from environment, falling back to defaults
        Self::try_parse().unwrap_or_default()
    }

    /// Returns `true` if the database lives in memory.
    pub fn is_memory(&self) -> bool {
        self.database_url == ":memory:"
    }

    /// Returns the resolver options carried by this configuration.
    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions::from(self)
    }

    /// Returns the document service settings carried by this configuration.
    pub fn service_config(&self) -> DocumentServiceConfig {
        DocumentServiceConfig {
            order_retry_attempts: self.order_retry_attempts,
            stream_page_size: self.stream_page_size,
        }
    }

    /// Returns the SQLite backend settings carried by this configuration.
    #[cfg(feature = "sqlite")]
    pub fn sqlite_config(&self) -> folio_persistence::backends::sqlite::SqliteBackendConfig {
        folio_persistence::backends::sqlite::SqliteBackendConfig {
            busy_timeout_ms: self.busy_timeout_ms,
            ..Default::default()
        }
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.database_url.trim().is_empty() {
            errors.push("Database URL cannot be empty".to_string());
        }

        if self.stream_page_size == 0 {
            errors.push("Stream page size cannot be 0".to_string());
        }

        if let Some(id) = self.debug_site_id {
            if id <= 0 {
                errors.push(format!("Debug site id must be positive, got {}", id));
            }
        }

        if self.busy_timeout_ms == 0 {
            errors.push("Busy timeout cannot be 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
