//! Shared fixtures for folio-cms integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use folio_cms::documents::{ContentTypeRegistry, DocumentService, StandardContentType};
use folio_persistence::backends::sqlite::SqliteBackend;
use folio_persistence::site::{NewSite, Site};
use folio_persistence::tenant::TenantContext;
use folio_persistence::types::{Document, DocumentId, WebpageFields};

/// Plain content type registered by [`registry`].
pub const SNIPPET: &str = "Snippet";

/// Webpage content type registered by [`registry`].
pub const ARTICLE: &str = "Article";

/// Creates an in-memory backend with the schema applied.
pub fn create_backend() -> Arc<SqliteBackend> {
    let backend = SqliteBackend::in_memory().expect("Failed to create SQLite backend");
    backend.init_schema().expect("Failed to initialize schema");
    Arc::new(backend)
}

/// Registers a site.
pub async fn create_site(backend: &SqliteBackend, name: &str, base_url: &str) -> Site {
    backend
        .create_site(NewSite::new(name, base_url))
        .await
        .expect("Failed to create site")
}

/// The default types plus an extra webpage type and an extra plain type.
pub fn registry() -> Arc<ContentTypeRegistry> {
    let registry = ContentTypeRegistry::with_defaults()
        .with(StandardContentType::webpage(ARTICLE))
        .and_then(|r| r.with(StandardContentType::plain(SNIPPET)))
        .expect("Failed to build registry");
    Arc::new(registry)
}

/// A backend holding one site, a service over it and the site's context.
pub async fn setup() -> (Arc<SqliteBackend>, DocumentService, TenantContext) {
    let backend = create_backend();
    let site = create_site(&backend, "Main", "www.example.com").await;
    let service = DocumentService::new(backend.clone(), registry());
    (backend, service, TenantContext::for_site(&site))
}

/// An unsaved `TextPage`.
pub fn text_page(segment: &str, parent: Option<DocumentId>) -> Document {
    let mut fields = WebpageFields::new(segment);
    fields.parent_id = parent;
    Document::webpage("TextPage", segment, fields)
}

/// Adds a `TextPage` and returns its id.
pub async fn add_page(
    service: &DocumentService,
    tenant: &TenantContext,
    segment: &str,
    parent: Option<DocumentId>,
) -> DocumentId {
    let mut page = text_page(segment, parent);
    service
        .add_document(tenant, &mut page)
        .await
        .expect("Failed to add page");
    page.id().expect("added page has an id")
}
