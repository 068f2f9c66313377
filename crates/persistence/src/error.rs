//! Error types for the persistence layer.
//!
//! This module defines all error types used throughout the persistence layer,
//! following a hierarchy that separates document errors, tenant errors,
//! concurrency errors, cascade errors and backend failures.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::tenant::SiteId;
use crate::types::{DocumentId, EntityKey};

/// The primary error type for all storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Document state errors
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Tenant isolation errors
    #[error(transparent)]
    Tenant(#[from] TenantError),

    /// Concurrency errors (retryable)
    #[error(transparent)]
    Concurrency(#[from] ConcurrencyError),

    /// Cascade errors raised by the soft-delete interceptor
    #[error(transparent)]
    Cascade(#[from] CascadeError),

    /// Validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl StorageError {
    /// Returns `true` if retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StorageError::Concurrency(ConcurrencyError::OrderConflict { .. })
        )
    }

    /// Returns `true` if this error reports a missing entity.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::Document(DocumentError::NotFound { .. })
                | StorageError::Document(DocumentError::EntityNotFound { .. })
        )
    }
}

/// Errors related to document state.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The requested document was not found (or was logically deleted).
    #[error("document not found: {id}")]
    NotFound { id: DocumentId },

    /// A dependent entity was not found.
    #[error("entity not found: {key}")]
    EntityNotFound { key: EntityKey },

    /// A sibling with the same URL segment already exists.
    #[error("duplicate url '{url_segment}' under parent {parent_id:?} in site {site_id}")]
    DuplicateUrl {
        site_id: SiteId,
        parent_id: Option<DocumentId>,
        url_segment: String,
    },

    /// The document already has an identifier and cannot be added again.
    #[error("document {id} has already been saved")]
    AlreadyPersisted { id: DocumentId },

    /// The document has never been saved.
    #[error("document has not been saved yet")]
    NotPersisted,

    /// A webpage-only operation was attempted on a plain document.
    #[error("document of type {document_type} is not a webpage")]
    NotAWebpage { document_type: String },
}

/// Errors related to tenant isolation.
#[derive(Error, Debug)]
pub enum TenantError {
    /// The operation requires a site-bound context.
    #[error("no tenant context: operation requires a resolved site")]
    NoTenantContext,

    /// The entity belongs to a different site than the current context.
    #[error("tenant mismatch: entity belongs to site {actual}, context is site {expected}")]
    TenantMismatch { expected: SiteId, actual: SiteId },

    /// The referenced site does not exist.
    #[error("site not found: {site_id}")]
    SiteNotFound { site_id: SiteId },

    /// The authority is already registered, ignoring case.
    #[error("authority '{authority}' is already registered")]
    DuplicateAuthority { authority: String },
}

/// Errors related to concurrent writers.
#[derive(Error, Debug)]
pub enum ConcurrencyError {
    /// Another writer claimed the same display order among the same siblings.
    #[error("display order {display_order} already taken under parent {parent_id:?} in site {site_id}")]
    OrderConflict {
        site_id: SiteId,
        parent_id: Option<DocumentId>,
        display_order: i32,
    },
}

/// Errors raised while walking cascade edges.
#[derive(Error, Debug)]
pub enum CascadeError {
    /// The same entity was reached twice during one cascade pass.
    #[error("cascade cycle detected at {entity}")]
    CycleDetected { entity: EntityKey },

    /// The store was asked to mark an entity that cannot carry a deleted flag.
    #[error("{entity} is not soft-deletable")]
    NotSoftDeletable { entity: EntityKey },
}

/// Errors related to input validation.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Missing required field.
    #[error("missing required field: {field}")]
    MissingRequiredField { field: String },

    /// A field holds a value the store cannot accept.
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors from the underlying database driver.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Failed to obtain a connection.
    #[error("connection failed for {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Internal backend error.
    #[error("{backend_name} error: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Stored data could not be (de)serialized.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
