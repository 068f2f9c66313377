//! DocumentStore implementation for SQLite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior, params};
use tracing::{debug, info};

use crate::core::{CascadeReport, DocumentStore, OrderAssignment};
use crate::error::{
    ConcurrencyError, DocumentError, StorageError, StorageResult, ValidationError,
};
use crate::tenant::{SiteId, TenantContext};
use crate::types::{
    Document, DocumentId, DocumentQuery, DocumentTag, DocumentType, EntityKey, EntityKind,
    ParentFilter, QueryOrder, UrlHistory, WebpageFields,
};

use super::backend::{BACKEND_NAME, internal_error, serialization_error};
use super::cascade::SqliteCascadeTarget;
use super::schema::{SIBLING_ORDER_INDEX, SIBLING_URL_INDEX};
use super::SqliteBackend;

const DOCUMENT_COLUMNS: &str = "id, site_id, document_type, name, is_webpage, parent_id, \
     url_segment, display_order, publish_on, data, is_deleted, created_on, updated_on";

pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

pub(crate) fn parse_timestamp(value: &str, field: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| internal_error(format!("Failed to parse {}: {}", field, e)))
}

/// Raw column values of a `documents` row.
struct DocumentRow {
    id: i64,
    site_id: i64,
    document_type: String,
    name: String,
    is_webpage: bool,
    parent_id: Option<i64>,
    url_segment: Option<String>,
    display_order: Option<i32>,
    publish_on: Option<String>,
    data: String,
    is_deleted: bool,
    created_on: String,
    updated_on: String,
}

impl DocumentRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            site_id: row.get(1)?,
            document_type: row.get(2)?,
            name: row.get(3)?,
            is_webpage: row.get(4)?,
            parent_id: row.get(5)?,
            url_segment: row.get(6)?,
            display_order: row.get(7)?,
            publish_on: row.get(8)?,
            data: row.get(9)?,
            is_deleted: row.get(10)?,
            created_on: row.get(11)?,
            updated_on: row.get(12)?,
        })
    }

    fn into_document(self) -> StorageResult<Document> {
        let webpage = if self.is_webpage {
            Some(WebpageFields {
                parent_id: self.parent_id.map(DocumentId::new),
                url_segment: self.url_segment.unwrap_or_default(),
                display_order: self.display_order,
                publish_on: self
                    .publish_on
                    .as_deref()
                    .map(|v| parse_timestamp(v, "publish_on"))
                    .transpose()?,
            })
        } else {
            None
        };

        let data = serde_json::from_str(&self.data)
            .map_err(|e| serialization_error(format!("Failed to parse document data: {}", e)))?;

        Ok(Document::from_storage(
            DocumentId::new(self.id),
            SiteId::new(self.site_id),
            DocumentType::new(self.document_type),
            self.name,
            self.is_deleted,
            parse_timestamp(&self.created_on, "created_on")?,
            parse_timestamp(&self.updated_on, "updated_on")?,
            webpage,
            data,
        ))
    }
}

/// Translates a write failure into the storage error it stands for.
fn write_error(
    e: rusqlite::Error,
    site_id: SiteId,
    document: &Document,
    display_order: Option<i32>,
) -> StorageError {
    if let rusqlite::Error::SqliteFailure(failure, Some(message)) = &e {
        if failure.code == ErrorCode::ConstraintViolation {
            if message.contains(SIBLING_ORDER_INDEX) || message.contains("display_order") {
                return ConcurrencyError::OrderConflict {
                    site_id,
                    parent_id: document.parent_id(),
                    display_order: display_order.unwrap_or_default(),
                }
                .into();
            }
            if message.contains(SIBLING_URL_INDEX) || message.contains("url_segment") {
                return DocumentError::DuplicateUrl {
                    site_id,
                    parent_id: document.parent_id(),
                    url_segment: document.url_segment().unwrap_or_default().to_string(),
                }
                .into();
            }
            if message.contains("FOREIGN KEY") {
                return ValidationError::InvalidValue {
                    field: "parent_id".to_string(),
                    message: message.clone(),
                }
                .into();
            }
        }
    }
    internal_error(format!("Failed to write document: {}", e))
}

fn validate_document(document: &Document) -> StorageResult<()> {
    if document.document_type().as_str().is_empty() {
        return Err(ValidationError::MissingRequiredField {
            field: "document_type".to_string(),
        }
        .into());
    }
    if let Some(fields) = document.webpage_fields() {
        if fields.url_segment.trim().is_empty() {
            return Err(ValidationError::MissingRequiredField {
                field: "url_segment".to_string(),
            }
            .into());
        }
    }
    Ok(())
}

/// Appends the SQL for a parent filter.
fn push_parent_filter(sql: &mut String, values: &mut Vec<SqlValue>, parent: ParentFilter) {
    match parent {
        ParentFilter::Any => {}
        ParentFilter::Root => sql.push_str(" AND is_webpage = 1 AND parent_id IS NULL"),
        ParentFilter::Parent(id) => {
            sql.push_str(" AND parent_id = ?");
            values.push(SqlValue::Integer(id.get()));
        }
    }
}

fn max_order(conn: &Connection, site_id: SiteId, parent: ParentFilter) -> StorageResult<Option<i32>> {
    let mut sql = String::from(
        "SELECT MAX(display_order) FROM documents WHERE site_id = ? AND is_webpage = 1 AND is_deleted = 0",
    );
    let mut values = vec![SqlValue::Integer(site_id.get())];
    push_parent_filter(&mut sql, &mut values, parent);

    conn.query_row(&sql, rusqlite::params_from_iter(values), |row| row.get(0))
        .map_err(|e| internal_error(format!("Failed to read max display order: {}", e)))
}

/// The order after `max`, or 0 for the first sibling.
fn next_order(max: Option<i32>) -> StorageResult<i32> {
    match max {
        None => Ok(0),
        Some(max) => max.checked_add(1).ok_or_else(|| {
            ValidationError::InvalidValue {
                field: "display_order".to_string(),
                message: format!("no display order follows {}", max),
            }
            .into()
        }),
    }
}

/// Checks that `parent` is a live webpage of the same site and is not
/// `document` itself or one of its descendants.
fn check_parent(
    conn: &Connection,
    site_id: SiteId,
    parent: Option<DocumentId>,
    document: Option<DocumentId>,
) -> StorageResult<()> {
    let mut cursor = parent;
    let mut first = true;

    while let Some(current) = cursor {
        if Some(current) == document {
            return Err(ValidationError::InvalidValue {
                field: "parent_id".to_string(),
                message: format!("document {} cannot be placed under itself", current),
            }
            .into());
        }

        let row: Option<(Option<i64>, bool, bool)> = conn
            .query_row(
                "SELECT parent_id, is_webpage, is_deleted FROM documents WHERE id = ?1 AND site_id = ?2",
                params![current.get(), site_id.get()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(|e| internal_error(format!("Failed to read parent: {}", e)))?;

        match row {
            Some((next, true, false)) => cursor = next.map(DocumentId::new),
            _ if first => {
                return Err(ValidationError::InvalidValue {
                    field: "parent_id".to_string(),
                    message: format!("parent {} is not a live webpage of site {}", current, site_id),
                }
                .into());
            }
            _ => cursor = None,
        }
        first = false;
    }

    Ok(())
}

pub(crate) fn fetch_document(
    conn: &Connection,
    site_id: SiteId,
    id: DocumentId,
    include_deleted: bool,
) -> StorageResult<Option<Document>> {
    let sql = if include_deleted {
        format!(
            "SELECT {} FROM documents WHERE id = ?1 AND site_id = ?2",
            DOCUMENT_COLUMNS
        )
    } else {
        format!(
            "SELECT {} FROM documents WHERE id = ?1 AND site_id = ?2 AND is_deleted = 0",
            DOCUMENT_COLUMNS
        )
    };

    conn.query_row(&sql, params![id.get(), site_id.get()], DocumentRow::read)
        .optional()
        .map_err(|e| internal_error(format!("Failed to read document: {}", e)))?
        .map(DocumentRow::into_document)
        .transpose()
}

fn require_live_document(conn: &Connection, site_id: SiteId, id: DocumentId) -> StorageResult<()> {
    let live: Option<bool> = conn
        .query_row(
            "SELECT is_deleted FROM documents WHERE id = ?1 AND site_id = ?2",
            params![id.get(), site_id.get()],
            |row| row.get::<_, bool>(0).map(|deleted| !deleted),
        )
        .optional()
        .map_err(|e| internal_error(format!("Failed to check document: {}", e)))?;

    match live {
        Some(true) => Ok(()),
        _ => Err(DocumentError::NotFound { id }.into()),
    }
}

/// Fails unless `key` names an entity of `site_id` that a delete can start
/// from. Already-deleted entities can only be purged.
fn require_delete_root(
    conn: &Connection,
    site_id: SiteId,
    key: EntityKey,
    soft_delete: bool,
) -> StorageResult<()> {
    let table = match key.kind {
        EntityKind::Document => "documents",
        EntityKind::UrlHistory => "url_history",
        EntityKind::DocumentTag => "document_tags",
    };
    let sql = if key.kind.is_soft_deletable() {
        format!("SELECT is_deleted FROM {} WHERE id = ?1 AND site_id = ?2", table)
    } else {
        format!("SELECT 0 FROM {} WHERE id = ?1 AND site_id = ?2", table)
    };

    let deleted: Option<bool> = conn
        .query_row(&sql, params![key.id, site_id.get()], |row| row.get(0))
        .optional()
        .map_err(|e| internal_error(format!("Failed to check {}: {}", key, e)))?;

    match (deleted, key.as_document()) {
        (Some(false), _) => Ok(()),
        (Some(true), _) if !soft_delete => Ok(()),
        (_, Some(id)) => Err(DocumentError::NotFound { id }.into()),
        (_, None) => Err(DocumentError::EntityNotFound { key }.into()),
    }
}

#[async_trait]
impl DocumentStore for SqliteBackend {
    fn backend_name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn insert(
        &self,
        tenant: &TenantContext,
        document: &mut Document,
        order: OrderAssignment,
    ) -> StorageResult<()> {
        let site_id = tenant.require_site()?;
        if let Some(id) = document.id() {
            return Err(DocumentError::AlreadyPersisted { id }.into());
        }
        if let Some(owner) = document.site_id() {
            tenant.check_access(owner)?;
        }
        validate_document(document)?;

        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        let parent_id = document.parent_id();
        if document.is_webpage() {
            check_parent(&tx, site_id, parent_id, None)?;
        }

        let display_order = match (order, document.webpage_fields()) {
            (OrderAssignment::NextSibling, Some(fields)) => {
                let siblings = ParentFilter::siblings_of(fields.parent_id);
                Some(next_order(max_order(&tx, site_id, siblings)?)?)
            }
            (_, fields) => fields.and_then(|f| f.display_order),
        };

        let now = Utc::now();
        let data = serde_json::to_string(&document.data)
            .map_err(|e| serialization_error(format!("Failed to serialize document data: {}", e)))?;
        let fields = document.webpage_fields();

        tx.execute(
            "INSERT INTO documents (site_id, document_type, name, is_webpage, parent_id, url_segment,
                                    display_order, publish_on, data, is_deleted, created_on, updated_on)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, ?10, ?10)",
            params![
                site_id.get(),
                document.document_type().as_str(),
                document.name,
                fields.is_some(),
                parent_id.map(DocumentId::get),
                fields.map(|f| f.url_segment.as_str()),
                display_order,
                fields.and_then(|f| f.publish_on).map(format_timestamp),
                data,
                format_timestamp(now),
            ],
        )
        .map_err(|e| write_error(e, site_id, document, display_order))?;

        let id = DocumentId::new(tx.last_insert_rowid());
        tx.commit()
            .map_err(|e| internal_error(format!("Failed to commit insert: {}", e)))?;

        if let Some(fields) = document.webpage_mut() {
            fields.display_order = display_order;
        }
        document.assign_identity(id, site_id, now);

        debug!(
            site_id = %site_id,
            document_id = %id,
            document_type = %document.document_type(),
            display_order = ?display_order,
            "Inserted document"
        );

        Ok(())
    }

    async fn update(&self, tenant: &TenantContext, document: &mut Document) -> StorageResult<()> {
        let site_id = tenant.require_site()?;
        let id = document.id().ok_or(DocumentError::NotPersisted)?;
        if let Some(owner) = document.site_id() {
            tenant.check_access(owner)?;
        }
        validate_document(document)?;

        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        let current: Option<(Option<String>, bool)> = tx
            .query_row(
                "SELECT url_segment, is_deleted FROM documents WHERE id = ?1 AND site_id = ?2",
                params![id.get(), site_id.get()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| internal_error(format!("Failed to read document: {}", e)))?;

        let previous_url = match current {
            Some((url, false)) => url,
            _ => return Err(DocumentError::NotFound { id }.into()),
        };

        if document.is_webpage() {
            check_parent(&tx, site_id, document.parent_id(), Some(id))?;
        }

        let now = Utc::now();
        let fields = document.webpage_fields();

        if let (Some(old), Some(new)) = (previous_url.as_deref(), document.url_segment()) {
            if old != new {
                tx.execute(
                    "INSERT INTO url_history (site_id, document_id, url_segment, is_deleted, created_on)
                     VALUES (?1, ?2, ?3, 0, ?4)",
                    params![site_id.get(), id.get(), old, format_timestamp(now)],
                )
                .map_err(|e| internal_error(format!("Failed to record url history: {}", e)))?;
                debug!(document_id = %id, from = old, to = new, "Recorded url change");
            }
        }

        let data = serde_json::to_string(&document.data)
            .map_err(|e| serialization_error(format!("Failed to serialize document data: {}", e)))?;
        let display_order = document.display_order();

        // is_deleted is never written here.
        tx.execute(
            "UPDATE documents
             SET name = ?1, parent_id = ?2, url_segment = ?3, display_order = ?4,
                 publish_on = ?5, data = ?6, updated_on = ?7
             WHERE id = ?8 AND site_id = ?9 AND is_deleted = 0",
            params![
                document.name,
                document.parent_id().map(DocumentId::get),
                fields.map(|f| f.url_segment.as_str()),
                display_order,
                fields.and_then(|f| f.publish_on).map(format_timestamp),
                data,
                format_timestamp(now),
                id.get(),
                site_id.get(),
            ],
        )
        .map_err(|e| write_error(e, site_id, document, display_order))?;

        tx.commit()
            .map_err(|e| internal_error(format!("Failed to commit update: {}", e)))?;
        document.touch(now);

        debug!(site_id = %site_id, document_id = %id, "Updated document");
        Ok(())
    }

    async fn get(
        &self,
        tenant: &TenantContext,
        id: DocumentId,
    ) -> StorageResult<Option<Document>> {
        let site_id = tenant.require_site()?;
        let conn = self.get_connection()?;
        fetch_document(&conn, site_id, id, false)
    }

    async fn get_including_deleted(
        &self,
        tenant: &TenantContext,
        id: DocumentId,
    ) -> StorageResult<Option<Document>> {
        let site_id = tenant.require_site()?;
        let conn = self.get_connection()?;
        fetch_document(&conn, site_id, id, true)
    }

    async fn query(
        &self,
        tenant: &TenantContext,
        query: &DocumentQuery,
    ) -> StorageResult<Vec<Document>> {
        let site_id = tenant.require_site()?;

        let mut sql = format!(
            "SELECT {} FROM documents WHERE site_id = ?",
            DOCUMENT_COLUMNS
        );
        let mut values = vec![SqlValue::Integer(site_id.get())];

        if !query.include_deleted {
            sql.push_str(" AND is_deleted = 0");
        }
        if let Some(document_type) = &query.document_type {
            sql.push_str(" AND document_type = ?");
            values.push(SqlValue::Text(document_type.as_str().to_string()));
        }
        push_parent_filter(&mut sql, &mut values, query.parent);
        if let Some(url_segment) = &query.url_segment {
            sql.push_str(" AND url_segment = ?");
            values.push(SqlValue::Text(url_segment.clone()));
        }
        if let Some(exclude) = query.exclude_id {
            sql.push_str(" AND id <> ?");
            values.push(SqlValue::Integer(exclude.get()));
        }
        if let Some(after) = query.after_id {
            sql.push_str(" AND id > ?");
            values.push(SqlValue::Integer(after.get()));
        }
        match query.order {
            QueryOrder::Id => sql.push_str(" ORDER BY id"),
            QueryOrder::DisplayOrder => {
                sql.push_str(" ORDER BY display_order IS NULL, display_order, id")
            }
        }
        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            values.push(SqlValue::Integer(i64::from(limit)));
        }

        debug!(site_id = %site_id, sql = %sql, "Querying documents");

        let conn = self.get_connection()?;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| internal_error(format!("Failed to prepare query: {}", e)))?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(values), DocumentRow::read)
            .map_err(|e| internal_error(format!("Failed to query documents: {}", e)))?;

        let mut documents = Vec::new();
        for row in rows {
            let row = row.map_err(|e| internal_error(format!("Failed to read row: {}", e)))?;
            documents.push(row.into_document()?);
        }
        Ok(documents)
    }

    async fn max_display_order(
        &self,
        tenant: &TenantContext,
        parent: ParentFilter,
    ) -> StorageResult<Option<i32>> {
        let site_id = tenant.require_site()?;
        let conn = self.get_connection()?;
        max_order(&conn, site_id, parent)
    }

    async fn delete(
        &self,
        tenant: &TenantContext,
        key: EntityKey,
    ) -> StorageResult<CascadeReport> {
        let site_id = tenant.require_site()?;

        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        require_delete_root(&tx, site_id, key, !tenant.is_soft_delete_disabled())?;

        let report = {
            let mut target = SqliteCascadeTarget::new(&tx, site_id);
            self.interceptor().delete(&mut target, key, tenant)?
        };

        tx.commit()
            .map_err(|e| internal_error(format!("Failed to commit delete: {}", e)))?;

        info!(
            site_id = %site_id,
            root = %key,
            soft_deleted = report.soft_deleted.len(),
            removed = report.removed.len(),
            correlation_id = tenant.correlation_id().unwrap_or("-"),
            "Deleted entity"
        );
        Ok(report)
    }

    async fn add_tag(
        &self,
        tenant: &TenantContext,
        document_id: DocumentId,
        name: &str,
    ) -> StorageResult<DocumentTag> {
        let site_id = tenant.require_site()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingRequiredField {
                field: "name".to_string(),
            }
            .into());
        }

        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        require_live_document(&tx, site_id, document_id)?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM document_tags WHERE document_id = ?1 AND name = ?2",
                params![document_id.get(), name],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| internal_error(format!("Failed to read tag: {}", e)))?;

        let id = match existing {
            Some(id) => id,
            None => {
                tx.execute(
                    "INSERT INTO document_tags (site_id, document_id, name) VALUES (?1, ?2, ?3)",
                    params![site_id.get(), document_id.get(), name],
                )
                .map_err(|e| internal_error(format!("Failed to insert tag: {}", e)))?;
                tx.last_insert_rowid()
            }
        };

        tx.commit()
            .map_err(|e| internal_error(format!("Failed to commit tag: {}", e)))?;

        Ok(DocumentTag {
            id,
            document_id,
            name: name.to_string(),
        })
    }

    async fn tags(
        &self,
        tenant: &TenantContext,
        document_id: DocumentId,
    ) -> StorageResult<Vec<DocumentTag>> {
        let site_id = tenant.require_site()?;
        let conn = self.get_connection()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, name FROM document_tags
                 WHERE document_id = ?1 AND site_id = ?2 ORDER BY id",
            )
            .map_err(|e| internal_error(format!("Failed to prepare tag query: {}", e)))?;

        let rows = stmt
            .query_map(params![document_id.get(), site_id.get()], |row| {
                Ok(DocumentTag {
                    id: row.get(0)?,
                    document_id,
                    name: row.get(1)?,
                })
            })
            .map_err(|e| internal_error(format!("Failed to query tags: {}", e)))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| internal_error(format!("Failed to read tag row: {}", e)))
    }

    async fn url_history(
        &self,
        tenant: &TenantContext,
        document_id: DocumentId,
        include_deleted: bool,
    ) -> StorageResult<Vec<UrlHistory>> {
        let site_id = tenant.require_site()?;
        let conn = self.get_connection()?;
        let sql = if include_deleted {
            "SELECT id, url_segment, is_deleted, created_on FROM url_history
             WHERE document_id = ?1 AND site_id = ?2 ORDER BY id"
        } else {
            "SELECT id, url_segment, is_deleted, created_on FROM url_history
             WHERE document_id = ?1 AND site_id = ?2 AND is_deleted = 0 ORDER BY id"
        };

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| internal_error(format!("Failed to prepare url history query: {}", e)))?;
        let rows = stmt
            .query_map(params![document_id.get(), site_id.get()], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, bool>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(|e| internal_error(format!("Failed to query url history: {}", e)))?;

        let mut history = Vec::new();
        for row in rows {
            let (id, url_segment, is_deleted, created_on) =
                row.map_err(|e| internal_error(format!("Failed to read url history row: {}", e)))?;
            history.push(UrlHistory {
                id,
                document_id,
                url_segment,
                is_deleted,
                created_on: parse_timestamp(&created_on, "created_on")?,
            });
        }
        Ok(history)
    }
}
