//! SQLite schema definitions and migrations.

use rusqlite::Connection;

use super::backend::internal_error;
use crate::error::StorageResult;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 3;

/// Unique index backing sibling display-order uniqueness.
pub(crate) const SIBLING_ORDER_INDEX: &str = "idx_documents_sibling_order";

/// Unique index backing sibling URL uniqueness.
pub(crate) const SIBLING_URL_INDEX: &str = "idx_documents_sibling_url";

/// Initialize the database schema.
pub fn initialize_schema(conn: &Connection) -> StorageResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        create_schema_v1(conn)?;
        set_schema_version(conn, 1)?;
        migrate_schema(conn, 1)?;
    } else if current_version < SCHEMA_VERSION {
        migrate_schema(conn, current_version)?;
    }

    Ok(())
}

/// Get the current schema version.
fn get_schema_version(conn: &Connection) -> StorageResult<i32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| internal_error(format!("Failed to create schema_version table: {}", e)))?;

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .ok();

    Ok(version.unwrap_or(0))
}

/// Set the schema version.
fn set_schema_version(conn: &Connection, version: i32) -> StorageResult<()> {
    conn.execute("DELETE FROM schema_version", [])
        .map_err(|e| internal_error(format!("Failed to clear schema_version: {}", e)))?;

    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )
    .map_err(|e| internal_error(format!("Failed to set schema_version: {}", e)))?;

    Ok(())
}

/// Create the initial schema (version 1): sites and documents.
fn create_schema_v1(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS sites (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            base_url TEXT NOT NULL,
            staging_url TEXT,
            created_on TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS redirected_domains (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            site_id INTEGER NOT NULL REFERENCES sites(id) ON DELETE CASCADE,
            url TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_redirected_domains_site
            ON redirected_domains(site_id);

        CREATE TABLE IF NOT EXISTS documents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            site_id INTEGER NOT NULL REFERENCES sites(id),
            document_type TEXT NOT NULL,
            name TEXT NOT NULL,
            is_webpage INTEGER NOT NULL DEFAULT 0,
            parent_id INTEGER REFERENCES documents(id),
            url_segment TEXT,
            display_order INTEGER,
            publish_on TEXT,
            data TEXT NOT NULL,
            is_deleted INTEGER NOT NULL DEFAULT 0,
            created_on TEXT NOT NULL,
            updated_on TEXT NOT NULL,
            deleted_on TEXT
        );

        CREATE UNIQUE INDEX IF NOT EXISTS {order_index}
            ON documents(site_id, IFNULL(parent_id, 0), display_order)
            WHERE is_deleted = 0 AND display_order IS NOT NULL;

        CREATE UNIQUE INDEX IF NOT EXISTS {url_index}
            ON documents(site_id, IFNULL(parent_id, 0), url_segment)
            WHERE is_deleted = 0 AND url_segment IS NOT NULL;

        CREATE INDEX IF NOT EXISTS idx_documents_type
            ON documents(site_id, document_type, is_deleted, id);

        CREATE INDEX IF NOT EXISTS idx_documents_parent
            ON documents(parent_id);",
        order_index = SIBLING_ORDER_INDEX,
        url_index = SIBLING_URL_INDEX,
    ))
    .map_err(|e| internal_error(format!("Failed to create documents schema: {}", e)))?;

    Ok(())
}

/// Run migrations from `from_version` to the current version.
fn migrate_schema(conn: &Connection, from_version: i32) -> StorageResult<()> {
    let mut version = from_version;

    while version < SCHEMA_VERSION {
        match version {
            1 => migrate_v1_to_v2(conn)?,
            2 => migrate_v2_to_v3(conn)?,
            other => {
                return Err(internal_error(format!(
                    "No migration from schema version {}",
                    other
                )));
            }
        }
        version += 1;
        set_schema_version(conn, version)?;
    }

    Ok(())
}

/// Version 2: URL history and tags.
fn migrate_v1_to_v2(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS url_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            site_id INTEGER NOT NULL REFERENCES sites(id),
            document_id INTEGER NOT NULL REFERENCES documents(id),
            url_segment TEXT NOT NULL,
            is_deleted INTEGER NOT NULL DEFAULT 0,
            created_on TEXT NOT NULL,
            deleted_on TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_url_history_document
            ON url_history(document_id);

        CREATE TABLE IF NOT EXISTS document_tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            site_id INTEGER NOT NULL REFERENCES sites(id),
            document_id INTEGER NOT NULL REFERENCES documents(id),
            name TEXT NOT NULL,
            UNIQUE(document_id, name)
        );",
    )
    .map_err(|e| internal_error(format!("Failed to migrate schema to v2: {}", e)))?;

    Ok(())
}

/// Version 3: each authority maps to at most one site.
fn migrate_v2_to_v3(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_sites_base_url
            ON sites(base_url COLLATE NOCASE);

        CREATE UNIQUE INDEX IF NOT EXISTS idx_redirected_domains_url
            ON redirected_domains(url COLLATE NOCASE);",
    )
    .map_err(|e| internal_error(format!("Failed to migrate schema to v3: {}", e)))?;

    Ok(())
}
