//! The document service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use folio_persistence::core::{CascadeReport, DocumentStore, OrderAssignment};
use folio_persistence::error::{DocumentError, StorageError};
use folio_persistence::site::Site;
use folio_persistence::tenant::TenantContext;
use folio_persistence::types::{
    Document, DocumentId, DocumentQuery, DocumentType, EntityKey, ParentFilter, QueryOrder,
    WebpageFields,
};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

use super::registry::ContentTypeRegistry;
use super::rel_links::{PageMetadata, RelLinks};
use crate::error::{CmsError, CmsResult};

/// Tuning for [`DocumentService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentServiceConfig {
    /// Retries of a sibling display-order conflict before it is reported.
    pub order_retry_attempts: u32,
    /// Documents fetched per page by [`DocumentService::get_all_documents`].
    pub stream_page_size: u32,
}

impl Default for DocumentServiceConfig {
    fn default() -> Self {
        Self {
            order_retry_attempts: 3,
            stream_page_size: 100,
        }
    }
}

/// Tenant-scoped document operations.
///
/// The service is stateless and cheap to clone; every operation takes the
/// [`TenantContext`] of the request explicitly. It validates content types
/// and sibling URL uniqueness, assigns display order for webpages and
/// delegates persistence to a [`DocumentStore`].
#[derive(Clone)]
pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
    registry: Arc<ContentTypeRegistry>,
    config: DocumentServiceConfig,
}

impl DocumentService {
    /// Creates a service with default settings.
    pub fn new(store: Arc<dyn DocumentStore>, registry: Arc<ContentTypeRegistry>) -> Self {
        Self::with_config(store, registry, DocumentServiceConfig::default())
    }

    /// Creates a service with custom settings.
    pub fn with_config(
        store: Arc<dyn DocumentStore>,
        registry: Arc<ContentTypeRegistry>,
        config: DocumentServiceConfig,
    ) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Returns the content-type registry.
    pub fn registry(&self) -> &ContentTypeRegistry {
        &self.registry
    }

    /// Returns the service settings.
    pub fn config(&self) -> &DocumentServiceConfig {
        &self.config
    }

    /// Adds a new document to the tenant's site.
    ///
    /// Webpages without an explicit display order are appended after their
    /// last live sibling. A concurrent writer taking the same order causes a
    /// retry, up to `order_retry_attempts` times.
    ///
    /// Returns the same document, now carrying its id, site and order.
    ///
    /// # Errors
    ///
    /// * `TenantError::NoTenantContext` - If the context is not bound to a site
    /// * `DocumentError::AlreadyPersisted` - If the document already has an id
    /// * `RegistryError` - If the type is unknown or its shape is wrong
    /// * `DocumentError::DuplicateUrl` - If a live sibling uses the URL segment
    /// * `ConcurrencyError::OrderConflict` - If retries are exhausted
    pub async fn add_document<'a>(
        &self,
        tenant: &TenantContext,
        document: &'a mut Document,
    ) -> CmsResult<&'a mut Document> {
        let site_id = tenant.require_site()?;
        if let Some(id) = document.id() {
            return Err(DocumentError::AlreadyPersisted { id }.into());
        }
        document.bind_to_site(site_id)?;

        let handler = self.registry.check(document)?;
        self.check_url_unique(tenant, document).await?;

        let order = if handler.is_webpage() && document.display_order().is_none() {
            OrderAssignment::NextSibling
        } else {
            OrderAssignment::Explicit
        };

        let mut attempt = 0;
        loop {
            match self.store.insert(tenant, document, order).await {
                Ok(()) => break,
                Err(err)
                    if order == OrderAssignment::NextSibling
                        && err.is_retryable()
                        && attempt < self.config.order_retry_attempts =>
                {
                    attempt += 1;
                    warn!(
                        site_id = %site_id,
                        attempt,
                        error = %err,
                        "Display order conflict, retrying insert"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        info!(
            site_id = %site_id,
            document_id = ?document.id(),
            document_type = %document.document_type(),
            display_order = ?document.display_order(),
            "Added document"
        );
        Ok(document)
    }

    /// Persists changes to an existing document and returns the same instance.
    ///
    /// # Errors
    ///
    /// * `DocumentError::NotPersisted` - If the document was never added
    /// * `DocumentError::NotFound` - If it no longer exists or was deleted
    /// * `DocumentError::DuplicateUrl` - If a live sibling uses the URL segment
    pub async fn save_document<'a>(
        &self,
        tenant: &TenantContext,
        document: &'a mut Document,
    ) -> CmsResult<&'a mut Document> {
        tenant.require_site()?;
        if document.id().is_none() {
            return Err(DocumentError::NotPersisted.into());
        }

        self.registry.check(document)?;
        self.check_url_unique(tenant, document).await?;
        self.store.update(tenant, document).await?;

        debug!(document_id = ?document.id(), "Saved document");
        Ok(document)
    }

    /// Reads a live document of exactly the given type.
    ///
    /// Returns `None` when the document is absent, deleted, owned by another
    /// site or of a different type.
    pub async fn get_document(
        &self,
        tenant: &TenantContext,
        document_type: &str,
        id: DocumentId,
    ) -> CmsResult<Option<Document>> {
        let document = self.store.get(tenant, id).await?;
        Ok(document.filter(|doc| doc.document_type().as_str() == document_type))
    }

    /// Streams every live document of exactly the given type.
    ///
    /// The stream is lazy and finite. Documents are fetched in pages of
    /// `stream_page_size`, ordered by id, and each call starts a fresh scan.
    pub fn get_all_documents(
        &self,
        tenant: &TenantContext,
        document_type: impl Into<DocumentType>,
    ) -> BoxStream<'static, CmsResult<Document>> {
        let store = Arc::clone(&self.store);
        let tenant = tenant.clone();
        let document_type = document_type.into();
        let page_size = self.config.stream_page_size.max(1);

        // State is the keyset cursor; `None` ends the stream.
        stream::try_unfold(Some(None::<DocumentId>), move |cursor| {
            let store = Arc::clone(&store);
            let tenant = tenant.clone();
            let document_type = document_type.clone();
            async move {
                let Some(after) = cursor else {
                    return Ok(None);
                };
                let page = fetch_page(store.as_ref(), &tenant, document_type, after, page_size)
                    .await?;
                if page.is_empty() {
                    return Ok(None);
                }

                let next = if page.len() < page_size as usize {
                    None
                } else {
                    page.last().and_then(Document::id).map(Some)
                };
                let items = stream::iter(page.into_iter().map(Ok::<_, CmsError>));
                Ok::<_, CmsError>(Some((items, next)))
            }
        })
        .try_flatten()
        .boxed()
    }

    /// Finds a live webpage of exactly the given type by URL segment.
    ///
    /// The match is exact. When several parents hold the segment, the oldest
    /// document wins.
    pub async fn get_document_by_url(
        &self,
        tenant: &TenantContext,
        document_type: &str,
        url_segment: &str,
    ) -> CmsResult<Option<Document>> {
        let query = DocumentQuery::new()
            .with_url_segment(url_segment)
            .ordered_by(QueryOrder::Id);
        let matches = self.store.query(tenant, &query).await?;
        Ok(matches
            .into_iter()
            .find(|doc| doc.document_type().as_str() == document_type))
    }

    /// Publishes a webpage now, unless it already has a publish time.
    ///
    /// An existing publish time, past or future, is never changed. If the
    /// save fails the webpage keeps its previous publish time.
    pub async fn publish_now<'a>(
        &self,
        tenant: &TenantContext,
        webpage: &'a mut Document,
    ) -> CmsResult<&'a mut Document> {
        if webpage_fields_mut(webpage)?.publish_on.is_none() {
            self.save_publish_on(tenant, webpage, Some(Utc::now())).await?;
            info!(document_id = ?webpage.id(), "Published webpage");
        }
        Ok(webpage)
    }

    /// Clears the publish time of a webpage and persists it.
    ///
    /// If the save fails the webpage keeps its previous publish time.
    pub async fn unpublish<'a>(
        &self,
        tenant: &TenantContext,
        webpage: &'a mut Document,
    ) -> CmsResult<&'a mut Document> {
        self.save_publish_on(tenant, webpage, None).await?;
        info!(document_id = ?webpage.id(), "Unpublished webpage");
        Ok(webpage)
    }

    /// Saves `webpage` with a new publish time, restoring the old one on
    /// failure.
    async fn save_publish_on(
        &self,
        tenant: &TenantContext,
        webpage: &mut Document,
        publish_on: Option<DateTime<Utc>>,
    ) -> CmsResult<()> {
        let previous = std::mem::replace(&mut webpage_fields_mut(webpage)?.publish_on, publish_on);
        let saved = self.save_document(tenant, webpage).await.map(|_| ());
        if saved.is_err() {
            if let Some(fields) = webpage.webpage_mut() {
                fields.publish_on = previous;
            }
        }
        saved
    }

    /// Deletes a document through the store's delete path.
    ///
    /// Unless the context disables soft delete, the document and its
    /// descendants are only marked deleted. The in-memory copy is marked to
    /// match.
    pub async fn delete_document(
        &self,
        tenant: &TenantContext,
        document: &mut Document,
    ) -> CmsResult<CascadeReport> {
        let id = document.id().ok_or(DocumentError::NotPersisted)?;
        let report = self.store.delete(tenant, EntityKey::document(id)).await?;
        document.mark_deleted();

        info!(
            document_id = %id,
            soft_deleted = report.soft_deleted.len(),
            removed = report.removed.len(),
            "Deleted document"
        );
        Ok(report)
    }

    /// Lists the live children of a webpage, or the root webpages, in
    /// display order. Publication state is ignored.
    pub async fn children(
        &self,
        tenant: &TenantContext,
        parent: Option<DocumentId>,
    ) -> CmsResult<Vec<Document>> {
        let query = DocumentQuery::new()
            .with_parent(ParentFilter::siblings_of(parent))
            .ordered_by(QueryOrder::DisplayOrder);
        Ok(self.store.query(tenant, &query).await?)
    }

    /// Builds the `prev`/`next` links of a paged webpage through its
    /// content-type handler.
    pub fn rel_links(
        &self,
        site: &Site,
        webpage: &Document,
        page: &PageMetadata,
    ) -> CmsResult<RelLinks> {
        let handler = self.registry.require(webpage.document_type().as_str())?;
        handler.rel_links(site, webpage, page)
    }

    /// Fails when a live sibling other than `document` uses its URL segment.
    async fn check_url_unique(
        &self,
        tenant: &TenantContext,
        document: &Document,
    ) -> CmsResult<()> {
        let Some(fields) = document.webpage_fields() else {
            return Ok(());
        };

        let mut query = DocumentQuery::new()
            .with_parent(ParentFilter::siblings_of(fields.parent_id))
            .with_url_segment(fields.url_segment.as_str())
            .with_limit(1);
        if let Some(id) = document.id() {
            query = query.excluding(id);
        }

        if self.store.query(tenant, &query).await?.is_empty() {
            Ok(())
        } else {
            Err(DocumentError::DuplicateUrl {
                site_id: tenant.require_site()?,
                parent_id: fields.parent_id,
                url_segment: fields.url_segment.clone(),
            }
            .into())
        }
    }
}

impl std::fmt::Debug for DocumentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentService")
            .field("backend", &self.store.backend_name())
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}

/// Reads one keyset page of live documents of a type.
async fn fetch_page(
    store: &dyn DocumentStore,
    tenant: &TenantContext,
    document_type: DocumentType,
    after: Option<DocumentId>,
    page_size: u32,
) -> CmsResult<Vec<Document>> {
    let mut query = DocumentQuery::new()
        .of_type(document_type)
        .with_limit(page_size)
        .ordered_by(QueryOrder::Id);
    if let Some(after) = after {
        query = query.after(after);
    }
    Ok(store.query(tenant, &query).await?)
}

fn webpage_fields_mut(document: &mut Document) -> Result<&mut WebpageFields, StorageError> {
    let document_type = document.document_type().to_string();
    document
        .webpage_mut()
        .ok_or_else(|| DocumentError::NotAWebpage { document_type }.into())
}
