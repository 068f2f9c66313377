//! Document service tests against the SQLite backend.

mod common;

use chrono::{Duration, Utc};
use futures::TryStreamExt;

use folio_cms::documents::{DocumentService, DocumentServiceConfig, PageMetadata};
use folio_cms::error::{ErrorKind, RegistryError};
use folio_cms::CmsError;
use folio_persistence::core::DocumentStore;
use folio_persistence::site::SiteDirectory;
use folio_persistence::tenant::TenantContext;
use folio_persistence::types::{Document, DocumentId, EntityKey, EntityKind, WebpageFields};

use common::{ARTICLE, SNIPPET, add_page, create_site, registry, setup, text_page};

async fn all_ids(
    service: &DocumentService,
    tenant: &TenantContext,
    document_type: &str,
) -> Vec<DocumentId> {
    service
        .get_all_documents(tenant, document_type)
        .map_ok(|doc| doc.id().unwrap())
        .try_collect()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_add_appends_after_last_sibling() {
    let (_backend, service, tenant) = setup().await;
    for i in 0..4 {
        add_page(&service, &tenant, &format!("page-{}", i), None).await;
    }

    let mut fifth = text_page("page-4", None);
    let added = service.add_document(&tenant, &mut fifth).await.unwrap();
    assert_eq!(added.display_order(), Some(4));
    assert_eq!(added.site_id(), tenant.site_id());

    let orders: Vec<_> = service
        .children(&tenant, None)
        .await
        .unwrap()
        .iter()
        .map(|doc| doc.display_order().unwrap())
        .collect();
    assert_eq!(orders, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_child_order_is_scoped_to_parent() {
    let (_backend, service, tenant) = setup().await;
    let blog = add_page(&service, &tenant, "blog", None).await;
    add_page(&service, &tenant, "about", None).await;

    let mut post = text_page("hello", Some(blog));
    service.add_document(&tenant, &mut post).await.unwrap();
    assert_eq!(post.display_order(), Some(0));

    let children = service.children(&tenant, Some(blog)).await.unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].id(), post.id());
}

#[tokio::test]
async fn test_explicit_order_is_kept() {
    let (_backend, service, tenant) = setup().await;
    let mut page = Document::webpage(
        "TextPage",
        "Pinned",
        WebpageFields::new("pinned").with_display_order(10),
    );
    service.add_document(&tenant, &mut page).await.unwrap();
    assert_eq!(page.display_order(), Some(10));

    let mut next = text_page("after", None);
    service.add_document(&tenant, &mut next).await.unwrap();
    assert_eq!(next.display_order(), Some(11));
}

#[tokio::test]
async fn test_save_returns_same_instance() {
    let (_backend, service, tenant) = setup().await;
    let mut page = text_page("same", None);
    let added: *const Document = service.add_document(&tenant, &mut page).await.unwrap();

    page.name = "Renamed".to_string();
    let saved = service.save_document(&tenant, &mut page).await.unwrap();
    assert!(std::ptr::eq(added, &*saved));
    assert_eq!(saved.name, "Renamed");
    assert!(saved.id().is_some());
    assert_eq!(saved.display_order(), Some(0));

    let stored = service
        .get_document(&tenant, "TextPage", page.id().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "Renamed");
}

#[tokio::test]
async fn test_add_rejects_persisted_document() {
    let (_backend, service, tenant) = setup().await;
    let mut page = text_page("twice", None);
    service.add_document(&tenant, &mut page).await.unwrap();

    let err = service.add_document(&tenant, &mut page).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invalid);
}

#[tokio::test]
async fn test_add_rejects_unregistered_type() {
    let (_backend, service, tenant) = setup().await;
    let mut doc = Document::new("Unknown", "Mystery");
    let err = service.add_document(&tenant, &mut doc).await.unwrap_err();
    assert!(matches!(
        err,
        CmsError::Registry(RegistryError::UnknownContentType { .. })
    ));
    assert!(doc.id().is_none());
}

#[tokio::test]
async fn test_duplicate_url_among_siblings() {
    let (_backend, service, tenant) = setup().await;
    let blog = add_page(&service, &tenant, "blog", None).await;
    add_page(&service, &tenant, "news", None).await;

    let mut root_dup = text_page("news", None);
    let err = service.add_document(&tenant, &mut root_dup).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateUrl);

    // The same segment under another parent is fine.
    let mut nested = text_page("news", Some(blog));
    service.add_document(&tenant, &mut nested).await.unwrap();

    // Saving a page without changing its segment never collides with itself.
    service.save_document(&tenant, &mut nested).await.unwrap();
}

#[tokio::test]
async fn test_get_document_requires_exact_type() {
    let (_backend, service, tenant) = setup().await;
    let id = add_page(&service, &tenant, "typed", None).await;

    assert!(
        service
            .get_document(&tenant, "TextPage", id)
            .await
            .unwrap()
            .is_some()
    );
    assert!(service.get_document(&tenant, ARTICLE, id).await.unwrap().is_none());
    assert!(
        service
            .get_document(&tenant, "TextPage", DocumentId::new(9999))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_get_document_by_url() {
    let (_backend, service, tenant) = setup().await;
    let id = add_page(&service, &tenant, "contact", None).await;

    let found = service
        .get_document_by_url(&tenant, "TextPage", "contact")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id(), Some(id));

    assert!(
        service
            .get_document_by_url(&tenant, ARTICLE, "contact")
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        service
            .get_document_by_url(&tenant, "TextPage", "Contact")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_publish_now_is_idempotent() {
    let (_backend, service, tenant) = setup().await;
    let mut page = text_page("news", None);
    service.add_document(&tenant, &mut page).await.unwrap();
    assert!(!page.is_published());

    service.publish_now(&tenant, &mut page).await.unwrap();
    let first = page.publish_on().unwrap();
    assert!(page.is_published());

    service.publish_now(&tenant, &mut page).await.unwrap();
    assert_eq!(page.publish_on(), Some(first));

    let stored = service
        .get_document(&tenant, "TextPage", page.id().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.publish_on(), Some(first));
}

#[tokio::test]
async fn test_publish_now_keeps_scheduled_time() {
    let (_backend, service, tenant) = setup().await;
    let scheduled = Utc::now() + Duration::days(7);
    let mut page = Document::webpage(
        "TextPage",
        "Later",
        WebpageFields::new("later").with_publish_on(scheduled),
    );
    service.add_document(&tenant, &mut page).await.unwrap();

    service.publish_now(&tenant, &mut page).await.unwrap();
    assert_eq!(page.publish_on(), Some(scheduled));
    assert!(!page.is_published());
}

#[tokio::test]
async fn test_unpublish_clears_publish_time() {
    let (_backend, service, tenant) = setup().await;
    let mut page = text_page("gone-dark", None);
    service.add_document(&tenant, &mut page).await.unwrap();
    service.publish_now(&tenant, &mut page).await.unwrap();

    service.unpublish(&tenant, &mut page).await.unwrap();
    assert_eq!(page.publish_on(), None);

    // Unpublishing an unpublished page is fine too.
    service.unpublish(&tenant, &mut page).await.unwrap();
    let stored = service
        .get_document(&tenant, "TextPage", page.id().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.publish_on(), None);
}

#[tokio::test]
async fn test_failed_publish_keeps_previous_time() {
    let (_backend, service, tenant) = setup().await;
    let mut page = text_page("stale", None);
    service.add_document(&tenant, &mut page).await.unwrap();

    let mut stale = page.clone();
    service.delete_document(&tenant, &mut page).await.unwrap();

    let err = service.publish_now(&tenant, &mut stale).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(stale.publish_on(), None);

    // A retry still tries to write instead of reporting success.
    let err = service.publish_now(&tenant, &mut stale).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_failed_unpublish_keeps_previous_time() {
    let (_backend, service, tenant) = setup().await;
    let mut page = text_page("still-live", None);
    service.add_document(&tenant, &mut page).await.unwrap();
    service.publish_now(&tenant, &mut page).await.unwrap();
    let published = page.publish_on();

    let mut stale = page.clone();
    service.delete_document(&tenant, &mut page).await.unwrap();

    let err = service.unpublish(&tenant, &mut stale).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(stale.publish_on(), published);
}

#[tokio::test]
async fn test_publish_requires_webpage() {
    let (_backend, service, tenant) = setup().await;
    let mut snippet = Document::new(SNIPPET, "Footer");
    service.add_document(&tenant, &mut snippet).await.unwrap();
    assert_eq!(snippet.display_order(), None);

    let err = service.publish_now(&tenant, &mut snippet).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invalid);
}

#[tokio::test]
async fn test_stream_pages_through_all_documents() {
    let (backend, _, tenant) = setup().await;
    let service = DocumentService::with_config(
        backend.clone(),
        registry(),
        DocumentServiceConfig {
            stream_page_size: 2,
            ..Default::default()
        },
    );

    let mut expected = Vec::new();
    for i in 0..5 {
        expected.push(add_page(&service, &tenant, &format!("p{}", i), None).await);
    }
    let mut article = Document::webpage(ARTICLE, "Article", WebpageFields::new("article"));
    service.add_document(&tenant, &mut article).await.unwrap();

    assert_eq!(all_ids(&service, &tenant, "TextPage").await, expected);
    assert_eq!(
        all_ids(&service, &tenant, ARTICLE).await,
        vec![article.id().unwrap()]
    );
    assert!(all_ids(&service, &tenant, SNIPPET).await.is_empty());
}

#[tokio::test]
async fn test_stream_requeries_each_call() {
    let (_backend, service, tenant) = setup().await;
    add_page(&service, &tenant, "one", None).await;
    assert_eq!(all_ids(&service, &tenant, "TextPage").await.len(), 1);

    add_page(&service, &tenant, "two", None).await;
    assert_eq!(all_ids(&service, &tenant, "TextPage").await.len(), 2);
}

#[tokio::test]
async fn test_delete_leaves_document_addressable() {
    let (backend, service, tenant) = setup().await;
    let mut ids = Vec::new();
    for i in 0..4 {
        ids.push(add_page(&service, &tenant, &format!("page-{}", i), None).await);
    }

    let mut victim = service
        .get_document(&tenant, "TextPage", ids[2])
        .await
        .unwrap()
        .unwrap();
    let report = service.delete_document(&tenant, &mut victim).await.unwrap();
    assert!(victim.is_deleted());
    assert!(report.soft_deleted_contains(EntityKey::document(ids[2])));
    assert!(report.removed.is_empty());

    let live = all_ids(&service, &tenant, "TextPage").await;
    assert_eq!(live, vec![ids[0], ids[1], ids[3]]);
    assert!(
        service
            .get_document(&tenant, "TextPage", ids[2])
            .await
            .unwrap()
            .is_none()
    );

    let kept = backend
        .get_including_deleted(&tenant, ids[2])
        .await
        .unwrap()
        .unwrap();
    assert!(kept.is_deleted());
}

#[tokio::test]
async fn test_delete_cascades_to_descendants() {
    let (backend, service, tenant) = setup().await;
    let blog = add_page(&service, &tenant, "blog", None).await;
    let post = add_page(&service, &tenant, "post", Some(blog)).await;
    let comment = add_page(&service, &tenant, "comment", Some(post)).await;
    backend.add_tag(&tenant, post, "rust").await.unwrap();

    let mut root = service
        .get_document(&tenant, "TextPage", blog)
        .await
        .unwrap()
        .unwrap();
    let report = service.delete_document(&tenant, &mut root).await.unwrap();

    for id in [blog, post, comment] {
        assert!(report.soft_deleted_contains(EntityKey::document(id)));
    }
    assert_eq!(report.removed.len(), 1);
    assert_eq!(report.removed[0].kind, EntityKind::DocumentTag);
    assert!(all_ids(&service, &tenant, "TextPage").await.is_empty());
}

#[tokio::test]
async fn test_delete_unsaved_document() {
    let (_backend, service, tenant) = setup().await;
    let mut page = text_page("never-saved", None);
    let err = service.delete_document(&tenant, &mut page).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invalid);
    assert!(!page.is_deleted());
}

#[tokio::test]
async fn test_operations_require_tenant() {
    let (_backend, service, _tenant) = setup().await;
    let detached = TenantContext::detached();

    let mut page = text_page("orphan", None);
    let err = service.add_document(&detached, &mut page).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoTenantContext);

    let err = service
        .get_document(&detached, "TextPage", DocumentId::new(1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoTenantContext);

    let err = service
        .get_all_documents(&detached, "TextPage")
        .try_collect::<Vec<_>>()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoTenantContext);
}

#[tokio::test]
async fn test_sites_are_isolated() {
    let (backend, service, tenant) = setup().await;
    let other_site = create_site(&backend, "Other", "www.other.com").await;
    let other = TenantContext::for_site(&other_site);

    let id = add_page(&service, &tenant, "home", None).await;
    assert!(service.get_document(&other, "TextPage", id).await.unwrap().is_none());

    // Each site keeps its own root order and URL space.
    let mut home = text_page("home", None);
    service.add_document(&other, &mut home).await.unwrap();
    assert_eq!(home.display_order(), Some(0));
    assert_eq!(
        all_ids(&service, &other, "TextPage").await,
        vec![home.id().unwrap()]
    );
}

#[tokio::test]
async fn test_rel_links() {
    let (backend, service, tenant) = setup().await;
    let site = backend
        .get_site(tenant.site_id().unwrap())
        .await
        .unwrap()
        .unwrap();
    let blog = add_page(&service, &tenant, "blog", None).await;
    let blog = service
        .get_document(&tenant, "TextPage", blog)
        .await
        .unwrap()
        .unwrap();

    let links = service
        .rel_links(&site, &blog, &PageMetadata::new(2, 5))
        .unwrap();
    assert_eq!(links.prev.as_deref(), Some("https://www.example.com/blog"));
    assert_eq!(
        links.next.as_deref(),
        Some("https://www.example.com/blog?Page=3")
    );
}
