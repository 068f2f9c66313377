//! Error types for the CMS layer.
//!
//! [`CmsError`] wraps the storage error hierarchy and adds the failures that
//! only exist above the store: site resolution and content-type dispatch.
//! Callers that only need to branch on the category use [`CmsError::kind`].

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use folio_persistence::error::{
    CascadeError, ConcurrencyError, DocumentError, StorageError, TenantError, ValidationError,
};
use thiserror::Error;

/// Site resolution failures.
#[derive(Error, Debug)]
pub enum SiteError {
    /// The directory holds no sites at all.
    #[error("tenant not resolved: no sites are configured")]
    NoSitesConfigured,

    /// No site answers to the authority and the policy forbids falling back.
    #[error("tenant not resolved: no site matches authority '{authority}'")]
    UnmatchedAuthority { authority: String },
}

/// Content-type registry failures.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No handler is registered for the type.
    #[error("unknown content type: {document_type}")]
    UnknownContentType { document_type: String },

    /// A handler for the type is already registered.
    #[error("content type already registered: {document_type}")]
    DuplicateContentType { document_type: String },

    /// The document's shape does not match its registered type.
    #[error("content type {document_type} {expectation}")]
    KindMismatch {
        document_type: String,
        expectation: &'static str,
    },
}

/// The primary error type for CMS operations.
#[derive(Error, Debug)]
pub enum CmsError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Site(#[from] SiteError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

impl From<TenantError> for CmsError {
    fn from(err: TenantError) -> Self {
        CmsError::Storage(err.into())
    }
}

impl From<DocumentError> for CmsError {
    fn from(err: DocumentError) -> Self {
        CmsError::Storage(err.into())
    }
}

impl From<ValidationError> for CmsError {
    fn from(err: ValidationError) -> Self {
        CmsError::Storage(err.into())
    }
}

/// Coarse error categories callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No site could be resolved for the request.
    TenantNotResolved,
    /// The operation was issued without a site-bound context.
    NoTenantContext,
    /// A live sibling already uses the URL segment.
    DuplicateUrl,
    /// A live sibling already holds the display order. Retryable.
    OrderConflict,
    /// A cascade reached the same entity twice.
    CascadeCycleDetected,
    /// The mutation target does not exist.
    NotFound,
    /// The input was rejected.
    Invalid,
    /// Anything else.
    Internal,
}

impl CmsError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CmsError::Site(_) => ErrorKind::TenantNotResolved,
            CmsError::Registry(_) | CmsError::Url(_) => ErrorKind::Invalid,
            CmsError::Storage(err) => match err {
                StorageError::Tenant(TenantError::NoTenantContext) => ErrorKind::NoTenantContext,
                StorageError::Tenant(TenantError::SiteNotFound { .. }) => ErrorKind::NotFound,
                StorageError::Tenant(
                    TenantError::TenantMismatch { .. } | TenantError::DuplicateAuthority { .. },
                ) => ErrorKind::Invalid,
                StorageError::Document(DocumentError::DuplicateUrl { .. }) => ErrorKind::DuplicateUrl,
                StorageError::Document(
                    DocumentError::NotFound { .. } | DocumentError::EntityNotFound { .. },
                ) => ErrorKind::NotFound,
                StorageError::Document(_) => ErrorKind::Invalid,
                StorageError::Concurrency(ConcurrencyError::OrderConflict { .. }) => {
                    ErrorKind::OrderConflict
                }
                StorageError::Cascade(CascadeError::CycleDetected { .. }) => {
                    ErrorKind::CascadeCycleDetected
                }
                StorageError::Cascade(_) | StorageError::Backend(_) => ErrorKind::Internal,
                StorageError::Validation(_) => ErrorKind::Invalid,
            },
        }
    }

    /// Returns `true` if retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CmsError::Storage(err) if err.is_retryable())
    }
}

/// Result type alias for CMS operations.
pub type CmsResult<T> = Result<T, CmsError>;

#[cfg(test)]
mod tests {
    use folio_persistence::tenant::SiteId;
    use folio_persistence::types::{DocumentId, EntityKey};

    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            CmsError::from(SiteError::NoSitesConfigured).kind(),
            ErrorKind::TenantNotResolved
        );
        assert_eq!(
            CmsError::from(TenantError::NoTenantContext).kind(),
            ErrorKind::NoTenantContext
        );
        assert_eq!(
            CmsError::from(TenantError::DuplicateAuthority {
                authority: "www.a.com".to_string()
            })
            .kind(),
            ErrorKind::Invalid
        );
        assert_eq!(
            CmsError::from(DocumentError::NotFound {
                id: DocumentId::new(1)
            })
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CmsError::from(StorageError::from(CascadeError::CycleDetected {
                entity: EntityKey::document(DocumentId::new(1))
            }))
            .kind(),
            ErrorKind::CascadeCycleDetected
        );
    }

    #[test]
    fn test_only_order_conflicts_retry() {
        let conflict = CmsError::from(StorageError::from(ConcurrencyError::OrderConflict {
            site_id: SiteId::new(1),
            parent_id: None,
            display_order: 0,
        }));
        assert!(conflict.is_retryable());
        assert_eq!(conflict.kind(), ErrorKind::OrderConflict);

        let dup = CmsError::from(DocumentError::DuplicateUrl {
            site_id: SiteId::new(1),
            parent_id: None,
            url_segment: "x".into(),
        });
        assert!(!dup.is_retryable());
        assert_eq!(dup.kind(), ErrorKind::DuplicateUrl);
    }
}
