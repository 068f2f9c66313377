//! Cascade target over an open SQLite transaction.

use chrono::{DateTime, Utc};
use rusqlite::{Transaction, params};

use crate::core::{CascadeEdge, CascadeTarget, Relation};
use crate::error::{CascadeError, StorageResult};
use crate::tenant::SiteId;
use crate::types::{EntityKey, EntityKind};

use super::backend::internal_error;
use super::storage::format_timestamp;

/// Runs interceptor steps inside the delete transaction.
pub(crate) struct SqliteCascadeTarget<'a> {
    tx: &'a Transaction<'a>,
    site_id: SiteId,
}

impl<'a> SqliteCascadeTarget<'a> {
    pub(crate) fn new(tx: &'a Transaction<'a>, site_id: SiteId) -> Self {
        Self { tx, site_id }
    }

    fn ids(&self, sql: &str, owner: i64) -> StorageResult<Vec<i64>> {
        let mut stmt = self
            .tx
            .prepare(sql)
            .map_err(|e| internal_error(format!("Failed to prepare dependents query: {}", e)))?;
        let rows = stmt
            .query_map(params![owner, self.site_id.get()], |row| row.get(0))
            .map_err(|e| internal_error(format!("Failed to query dependents: {}", e)))?;
        rows.collect::<Result<Vec<i64>, _>>()
            .map_err(|e| internal_error(format!("Failed to read dependent row: {}", e)))
    }
}

fn table_for(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Document => "documents",
        EntityKind::UrlHistory => "url_history",
        EntityKind::DocumentTag => "document_tags",
    }
}

impl CascadeTarget for SqliteCascadeTarget<'_> {
    fn dependents(&mut self, owner: EntityKey, edge: &CascadeEdge) -> StorageResult<Vec<EntityKey>> {
        let sql = match edge.relation {
            Relation::ChildWebpages => {
                "SELECT id FROM documents WHERE parent_id = ?1 AND site_id = ?2 ORDER BY id"
            }
            Relation::UrlHistory => {
                "SELECT id FROM url_history WHERE document_id = ?1 AND site_id = ?2 ORDER BY id"
            }
            Relation::Tags => {
                "SELECT id FROM document_tags WHERE document_id = ?1 AND site_id = ?2 ORDER BY id"
            }
        };

        Ok(self
            .ids(sql, owner.id)?
            .into_iter()
            .map(|id| EntityKey::new(edge.to, id))
            .collect())
    }

    fn mark_deleted(&mut self, key: EntityKey, at: DateTime<Utc>) -> StorageResult<bool> {
        let at = format_timestamp(at);
        // Rows that are already deleted keep their original timestamps.
        let result = match key.kind {
            EntityKind::Document => self.tx.execute(
                "UPDATE documents SET is_deleted = 1, deleted_on = ?1, updated_on = ?1
                 WHERE id = ?2 AND site_id = ?3 AND is_deleted = 0",
                params![at, key.id, self.site_id.get()],
            ),
            EntityKind::UrlHistory => self.tx.execute(
                "UPDATE url_history SET is_deleted = 1, deleted_on = ?1
                 WHERE id = ?2 AND site_id = ?3 AND is_deleted = 0",
                params![at, key.id, self.site_id.get()],
            ),
            EntityKind::DocumentTag => {
                return Err(CascadeError::NotSoftDeletable { entity: key }.into());
            }
        };

        result
            .map(|changed| changed > 0)
            .map_err(|e| internal_error(format!("Failed to mark {} deleted: {}", key, e)))
    }

    fn remove(&mut self, key: EntityKey) -> StorageResult<()> {
        let sql = format!(
            "DELETE FROM {} WHERE id = ?1 AND site_id = ?2",
            table_for(key.kind)
        );
        self.tx
            .execute(&sql, params![key.id, self.site_id.get()])
            .map(|_| ())
            .map_err(|e| internal_error(format!("Failed to remove {}: {}", key, e)))
    }
}
