//! Core document storage trait.
//!
//! This module defines the [`DocumentStore`] trait, the transactional
//! primitives the document service is built on. All storage operations
//! require a [`TenantContext`] bound to a site.

use async_trait::async_trait;

use super::cascade::CascadeReport;
use crate::error::StorageResult;
use crate::tenant::TenantContext;
use crate::types::{
    Document, DocumentId, DocumentQuery, DocumentTag, EntityKey, ParentFilter, UrlHistory,
};

/// How an insert chooses the display order of a webpage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAssignment {
    /// Keep whatever order the document carries (possibly none).
    Explicit,
    /// Append after the current last live sibling, inside the insert
    /// transaction. Root pages are scoped to the site only.
    NextSibling,
}

/// Tenant-scoped storage for documents and their dependents.
///
/// Every method takes a [`TenantContext`] first and fails with
/// `TenantError::NoTenantContext` when it is not bound to a site. Each call
/// is one transaction: it either commits entirely or leaves no trace.
///
/// # Deleted documents
///
/// Reads skip logically deleted documents unless the method says otherwise.
/// No method lowers the deleted flag: `update` never writes it and refuses
/// documents that are already deleted.
///
/// # Example
///
/// ```ignore
/// use folio_persistence::core::{DocumentStore, OrderAssignment};
/// use folio_persistence::tenant::{SiteId, TenantContext};
/// use folio_persistence::types::{Document, EntityKey, WebpageFields};
///
/// async fn example<S: DocumentStore>(store: &S) -> StorageResult<()> {
///     let tenant = TenantContext::new(SiteId::new(1));
///
///     let mut page = Document::webpage("TextPage", "News", WebpageFields::new("news"));
///     store.insert(&tenant, &mut page, OrderAssignment::NextSibling).await?;
///     let id = page.id().unwrap();
///
///     page.name = "Latest news".into();
///     store.update(&tenant, &mut page).await?;
///
///     let report = store.delete(&tenant, EntityKey::document(id)).await?;
///     assert_eq!(report.soft_deleted.len(), 1);
///     assert!(store.get(&tenant, id).await?.is_none());
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns a human-readable name for this storage backend.
    fn backend_name(&self) -> &'static str;

    /// Inserts a new document and records its assigned identity.
    ///
    /// On success the document carries its id, site, timestamps and, for
    /// [`OrderAssignment::NextSibling`], its display order.
    ///
    /// # Errors
    ///
    /// * `DocumentError::AlreadyPersisted` - If the document already has an id
    /// * `TenantError::TenantMismatch` - If the document belongs to another site
    /// * `DocumentError::DuplicateUrl` - If a live sibling uses the same segment
    /// * `ConcurrencyError::OrderConflict` - If a live sibling holds the same order
    async fn insert(
        &self,
        tenant: &TenantContext,
        document: &mut Document,
        order: OrderAssignment,
    ) -> StorageResult<()>;

    /// Persists changes to an existing document.
    ///
    /// When the URL segment of a webpage changes, the old segment is written
    /// to its URL history in the same transaction.
    ///
    /// # Errors
    ///
    /// * `DocumentError::NotPersisted` - If the document has never been inserted
    /// * `DocumentError::NotFound` - If it does not exist in this site or is deleted
    /// * `TenantError::TenantMismatch` - If the document belongs to another site
    /// * `DocumentError::DuplicateUrl`, `ConcurrencyError::OrderConflict`
    async fn update(&self, tenant: &TenantContext, document: &mut Document) -> StorageResult<()>;

    /// Reads a live document.
    async fn get(&self, tenant: &TenantContext, id: DocumentId)
    -> StorageResult<Option<Document>>;

    /// Reads a document whether or not it has been deleted.
    async fn get_including_deleted(
        &self,
        tenant: &TenantContext,
        id: DocumentId,
    ) -> StorageResult<Option<Document>>;

    /// Runs a predicate query.
    async fn query(
        &self,
        tenant: &TenantContext,
        query: &DocumentQuery,
    ) -> StorageResult<Vec<Document>>;

    /// Returns the highest display order among live siblings.
    async fn max_display_order(
        &self,
        tenant: &TenantContext,
        parent: ParentFilter,
    ) -> StorageResult<Option<i32>>;

    /// Deletes an entity through the soft-delete interceptor.
    ///
    /// # Errors
    ///
    /// * `DocumentError::NotFound` / `EntityNotFound` - If the root does not exist
    /// * `CascadeError::CycleDetected` - If the cascade revisits an entity;
    ///   nothing is changed
    async fn delete(&self, tenant: &TenantContext, key: EntityKey)
    -> StorageResult<CascadeReport>;

    /// Attaches a tag to a live document.
    async fn add_tag(
        &self,
        tenant: &TenantContext,
        document_id: DocumentId,
        name: &str,
    ) -> StorageResult<DocumentTag>;

    /// Lists the tags of a document.
    async fn tags(
        &self,
        tenant: &TenantContext,
        document_id: DocumentId,
    ) -> StorageResult<Vec<DocumentTag>>;

    /// Lists the previous URL segments of a webpage, oldest first.
    async fn url_history(
        &self,
        tenant: &TenantContext,
        document_id: DocumentId,
        include_deleted: bool,
    ) -> StorageResult<Vec<UrlHistory>>;
}
