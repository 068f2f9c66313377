//! Display-order conflict handling in the document service.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use folio_cms::documents::{DocumentService, DocumentServiceConfig};
use folio_cms::error::ErrorKind;
use folio_persistence::backends::sqlite::SqliteBackend;
use folio_persistence::core::{CascadeReport, DocumentStore, OrderAssignment};
use folio_persistence::error::{ConcurrencyError, StorageResult};
use folio_persistence::tenant::TenantContext;
use folio_persistence::types::{
    Document, DocumentId, DocumentQuery, DocumentTag, EntityKey, ParentFilter, UrlHistory,
};

use common::{create_backend, create_site, registry, text_page};

/// Fails the first `conflicts` sibling-ordered inserts with an order
/// conflict, then delegates to SQLite.
struct ConflictingStore {
    inner: Arc<SqliteBackend>,
    conflicts: AtomicU32,
    inserts: AtomicU32,
}

impl ConflictingStore {
    fn new(inner: Arc<SqliteBackend>, conflicts: u32) -> Self {
        Self {
            inner,
            conflicts: AtomicU32::new(conflicts),
            inserts: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl DocumentStore for ConflictingStore {
    fn backend_name(&self) -> &'static str {
        "conflicting"
    }

    async fn insert(
        &self,
        tenant: &TenantContext,
        document: &mut Document,
        order: OrderAssignment,
    ) -> StorageResult<()> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.conflicts.load(Ordering::SeqCst);
        if order == OrderAssignment::NextSibling && remaining > 0 {
            self.conflicts.store(remaining - 1, Ordering::SeqCst);
            return Err(ConcurrencyError::OrderConflict {
                site_id: tenant.require_site()?,
                parent_id: document.parent_id(),
                display_order: 0,
            }
            .into());
        }
        self.inner.insert(tenant, document, order).await
    }

    async fn update(&self, tenant: &TenantContext, document: &mut Document) -> StorageResult<()> {
        self.inner.update(tenant, document).await
    }

    async fn get(
        &self,
        tenant: &TenantContext,
        id: DocumentId,
    ) -> StorageResult<Option<Document>> {
        self.inner.get(tenant, id).await
    }

    async fn get_including_deleted(
        &self,
        tenant: &TenantContext,
        id: DocumentId,
    ) -> StorageResult<Option<Document>> {
        self.inner.get_including_deleted(tenant, id).await
    }

    async fn query(
        &self,
        tenant: &TenantContext,
        query: &DocumentQuery,
    ) -> StorageResult<Vec<Document>> {
        self.inner.query(tenant, query).await
    }

    async fn max_display_order(
        &self,
        tenant: &TenantContext,
        parent: ParentFilter,
    ) -> StorageResult<Option<i32>> {
        self.inner.max_display_order(tenant, parent).await
    }

    async fn delete(
        &self,
        tenant: &TenantContext,
        key: EntityKey,
    ) -> StorageResult<CascadeReport> {
        self.inner.delete(tenant, key).await
    }

    async fn add_tag(
        &self,
        tenant: &TenantContext,
        document_id: DocumentId,
        name: &str,
    ) -> StorageResult<DocumentTag> {
        self.inner.add_tag(tenant, document_id, name).await
    }

    async fn tags(
        &self,
        tenant: &TenantContext,
        document_id: DocumentId,
    ) -> StorageResult<Vec<DocumentTag>> {
        self.inner.tags(tenant, document_id).await
    }

    async fn url_history(
        &self,
        tenant: &TenantContext,
        document_id: DocumentId,
        include_deleted: bool,
    ) -> StorageResult<Vec<UrlHistory>> {
        self.inner
            .url_history(tenant, document_id, include_deleted)
            .await
    }
}

async fn setup(conflicts: u32) -> (Arc<ConflictingStore>, DocumentService, TenantContext) {
    let backend = create_backend();
    let site = create_site(&backend, "Main", "www.example.com").await;
    let store = Arc::new(ConflictingStore::new(backend, conflicts));
    let service = DocumentService::with_config(
        store.clone(),
        registry(),
        DocumentServiceConfig {
            order_retry_attempts: 3,
            ..Default::default()
        },
    );
    (store, service, TenantContext::for_site(&site))
}

#[tokio::test]
async fn test_conflicts_are_retried() {
    let (store, service, tenant) = setup(3).await;

    let mut page = text_page("retried", None);
    service.add_document(&tenant, &mut page).await.unwrap();

    assert!(page.id().is_some());
    assert_eq!(page.display_order(), Some(0));
    assert_eq!(store.inserts.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_conflict_surfaces_after_retries() {
    let (store, service, tenant) = setup(4).await;

    let mut page = text_page("unlucky", None);
    let err = service.add_document(&tenant, &mut page).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::OrderConflict);
    assert!(err.is_retryable());
    assert!(page.id().is_none());
    assert_eq!(store.inserts.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_explicit_order_is_not_retried() {
    let (store, service, tenant) = setup(1).await;

    let mut snippet = Document::new(common::SNIPPET, "Footer");
    service.add_document(&tenant, &mut snippet).await.unwrap();

    // Plain documents never ask for sibling ordering.
    assert_eq!(store.inserts.load(Ordering::SeqCst), 1);
    assert_eq!(store.conflicts.load(Ordering::SeqCst), 1);
}
