//! Soft-delete interceptor tests against the SQLite backend.

use folio_persistence::backends::sqlite::SqliteBackend;
use folio_persistence::core::{DocumentStore, OrderAssignment};
use folio_persistence::error::{DocumentError, StorageError};
use folio_persistence::site::NewSite;
use folio_persistence::tenant::TenantContext;
use folio_persistence::types::{
    Document, DocumentId, DocumentQuery, EntityKey, EntityKind, WebpageFields,
};

async fn setup() -> (SqliteBackend, TenantContext) {
    let backend = SqliteBackend::in_memory().expect("Failed to create SQLite backend");
    backend.init_schema().expect("Failed to initialize schema");
    let site = backend
        .create_site(NewSite::new("Main", "www.example.com"))
        .await
        .unwrap();
    (backend, TenantContext::for_site(&site))
}

async fn insert_page(
    backend: &SqliteBackend,
    tenant: &TenantContext,
    segment: &str,
    parent: Option<DocumentId>,
) -> DocumentId {
    let mut fields = WebpageFields::new(segment);
    fields.parent_id = parent;
    let mut doc = Document::webpage("TextPage", segment, fields);
    backend
        .insert(tenant, &mut doc, OrderAssignment::NextSibling)
        .await
        .unwrap();
    doc.id().unwrap()
}

/// Builds `blog -> post -> comment`, with a retired URL on `post` and a tag
/// on `blog`.
async fn build_tree(backend: &SqliteBackend, tenant: &TenantContext) -> [DocumentId; 3] {
    let blog = insert_page(backend, tenant, "blog", None).await;
    let post = insert_page(backend, tenant, "post", Some(blog)).await;
    let comment = insert_page(backend, tenant, "comment", Some(post)).await;

    let mut doc = backend.get(tenant, post).await.unwrap().unwrap();
    doc.webpage_mut().unwrap().url_segment = "first-post".to_string();
    backend.update(tenant, &mut doc).await.unwrap();

    backend.add_tag(tenant, blog, "news").await.unwrap();
    [blog, post, comment]
}

#[tokio::test]
async fn test_delete_soft_deletes_subtree() {
    let (backend, tenant) = setup().await;
    let [blog, post, comment] = build_tree(&backend, &tenant).await;

    let report = backend
        .delete(&tenant, EntityKey::document(blog))
        .await
        .unwrap();

    assert_eq!(report.soft_deleted[0], EntityKey::document(blog));
    assert!(report.soft_deleted.contains(&EntityKey::document(post)));
    assert!(report.soft_deleted.contains(&EntityKey::document(comment)));
    assert!(
        report
            .soft_deleted
            .iter()
            .any(|k| k.kind == EntityKind::UrlHistory)
    );
    assert_eq!(report.removed.len(), 1);
    assert_eq!(report.removed[0].kind, EntityKind::DocumentTag);

    for id in [blog, post, comment] {
        assert!(backend.get(&tenant, id).await.unwrap().is_none());
        let kept = backend
            .get_including_deleted(&tenant, id)
            .await
            .unwrap()
            .expect("row must survive a soft delete");
        assert!(kept.is_deleted());
    }

    let history = backend.url_history(&tenant, post, true).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].is_deleted);
    assert!(backend.url_history(&tenant, post, false).await.unwrap().is_empty());

    assert!(backend.tags(&tenant, blog).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_deleted_documents_leave_queries() {
    let (backend, tenant) = setup().await;
    let ids: Vec<_> = insert_pages(&backend, &tenant, 4).await;

    backend
        .delete(&tenant, EntityKey::document(ids[1]))
        .await
        .unwrap();

    let live = backend
        .query(&tenant, &DocumentQuery::new().of_type("TextPage"))
        .await
        .unwrap();
    assert_eq!(live.len(), 3);
    assert!(live.iter().all(|d| d.id() != Some(ids[1])));

    let all = backend
        .query(
            &tenant,
            &DocumentQuery::new().of_type("TextPage").including_deleted(),
        )
        .await
        .unwrap();
    assert_eq!(all.len(), 4);
}

async fn insert_pages(backend: &SqliteBackend, tenant: &TenantContext, n: usize) -> Vec<DocumentId> {
    let mut ids = Vec::with_capacity(n);
    for i in 0..n {
        ids.push(insert_page(backend, tenant, &format!("page-{}", i), None).await);
    }
    ids
}

#[tokio::test]
async fn test_deleted_order_and_url_can_be_reused() {
    let (backend, tenant) = setup().await;
    let first = insert_page(&backend, &tenant, "reuse", None).await;
    backend
        .delete(&tenant, EntityKey::document(first))
        .await
        .unwrap();

    let mut again = Document::webpage("TextPage", "reuse", WebpageFields::new("reuse"));
    backend
        .insert(&tenant, &mut again, OrderAssignment::NextSibling)
        .await
        .unwrap();
    assert_eq!(again.display_order(), Some(0));
}

#[tokio::test]
async fn test_save_never_revives_deleted_document() {
    let (backend, tenant) = setup().await;
    let id = insert_page(&backend, &tenant, "gone", None).await;
    let mut stale = backend.get(&tenant, id).await.unwrap().unwrap();

    backend.delete(&tenant, EntityKey::document(id)).await.unwrap();

    stale.name = "revived?".to_string();
    let err = backend.update(&tenant, &mut stale).await.unwrap_err();
    assert!(matches!(
        err,
        StorageError::Document(DocumentError::NotFound { .. })
    ));

    let row = backend
        .get_including_deleted(&tenant, id)
        .await
        .unwrap()
        .unwrap();
    assert!(row.is_deleted());
    assert_eq!(row.name, "gone");
}

#[tokio::test]
async fn test_deleting_twice_is_not_found() {
    let (backend, tenant) = setup().await;
    let id = insert_page(&backend, &tenant, "once", None).await;
    backend.delete(&tenant, EntityKey::document(id)).await.unwrap();

    let err = backend
        .delete(&tenant, EntityKey::document(id))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_report_skips_previously_deleted_dependents() {
    let (backend, tenant) = setup().await;
    let blog = insert_page(&backend, &tenant, "blog", None).await;
    let old = insert_page(&backend, &tenant, "old", Some(blog)).await;
    let fresh = insert_page(&backend, &tenant, "fresh", Some(blog)).await;
    backend.delete(&tenant, EntityKey::document(old)).await.unwrap();

    let report = backend
        .delete(&tenant, EntityKey::document(blog))
        .await
        .unwrap();

    assert_eq!(
        report.soft_deleted,
        vec![EntityKey::document(blog), EntityKey::document(fresh)]
    );
    assert!(
        backend
            .get_including_deleted(&tenant, old)
            .await
            .unwrap()
            .unwrap()
            .is_deleted()
    );
}

#[tokio::test]
async fn test_disabled_soft_delete_removes_rows() {
    let (backend, tenant) = setup().await;
    let [blog, post, comment] = build_tree(&backend, &tenant).await;

    let hard = tenant.clone().with_soft_delete_disabled();
    let report = backend.delete(&hard, EntityKey::document(blog)).await.unwrap();

    assert!(report.soft_deleted.is_empty());
    assert_eq!(report.removed.last(), Some(&EntityKey::document(blog)));
    for id in [blog, post, comment] {
        assert!(
            backend
                .get_including_deleted(&tenant, id)
                .await
                .unwrap()
                .is_none()
        );
    }
    assert!(backend.url_history(&tenant, post, true).await.unwrap().is_empty());

    // The switch only applied to the cloned context.
    let other = insert_page(&backend, &tenant, "other", None).await;
    backend.delete(&tenant, EntityKey::document(other)).await.unwrap();
    assert!(
        backend
            .get_including_deleted(&tenant, other)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_purge_after_soft_delete() {
    let (backend, tenant) = setup().await;
    let id = insert_page(&backend, &tenant, "purge-me", None).await;
    backend.delete(&tenant, EntityKey::document(id)).await.unwrap();

    let hard = tenant.clone().with_soft_delete_disabled();
    backend.delete(&hard, EntityKey::document(id)).await.unwrap();
    assert!(backend.get_including_deleted(&tenant, id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_is_scoped_to_site() {
    let (backend, tenant) = setup().await;
    let id = insert_page(&backend, &tenant, "mine", None).await;

    let other_site = backend
        .create_site(NewSite::new("Other", "other.example.com"))
        .await
        .unwrap();
    let other = TenantContext::for_site(&other_site);

    let err = backend
        .delete(&other, EntityKey::document(id))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(backend.get(&tenant, id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_deleting_a_tag_removes_it() {
    let (backend, tenant) = setup().await;
    let id = insert_page(&backend, &tenant, "tagged", None).await;
    let tag = backend.add_tag(&tenant, id, "old").await.unwrap();

    let report = backend
        .delete(&tenant, EntityKey::document_tag(tag.id))
        .await
        .unwrap();
    assert_eq!(report.removed, vec![EntityKey::document_tag(tag.id)]);
    assert!(backend.tags(&tenant, id).await.unwrap().is_empty());
    assert!(backend.get(&tenant, id).await.unwrap().is_some());
}
