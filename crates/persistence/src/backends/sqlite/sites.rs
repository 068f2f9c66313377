//! SiteDirectory implementation and site administration for SQLite.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{ErrorCode, OptionalExtension, params};
use tracing::info;

use crate::error::{StorageError, StorageResult, TenantError, ValidationError};
use crate::site::{NewSite, RedirectedDomain, Site, SiteDirectory};
use crate::tenant::SiteId;

use super::backend::internal_error;
use super::storage::{format_timestamp, parse_timestamp};
use super::SqliteBackend;

fn required(field: &str, value: &str) -> StorageResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingRequiredField {
            field: field.to_string(),
        }
        .into());
    }
    Ok(value.to_string())
}

/// Maps a unique-index violation on an authority column to `DuplicateAuthority`.
fn authority_error(e: rusqlite::Error, authority: &str, table: &str) -> StorageError {
    if let rusqlite::Error::SqliteFailure(failure, Some(message)) = &e {
        if failure.code == ErrorCode::ConstraintViolation && message.contains("UNIQUE") {
            return TenantError::DuplicateAuthority {
                authority: authority.to_string(),
            }
            .into();
        }
    }
    internal_error(format!("Failed to insert {}: {}", table, e))
}

impl SqliteBackend {
    /// Registers a site.
    ///
    /// Fails with `TenantError::DuplicateAuthority` if another site already
    /// uses the base URL, ignoring case.
    pub async fn create_site(&self, site: NewSite) -> StorageResult<Site> {
        let name = required("name", &site.name)?;
        let base_url = required("base_url", &site.base_url)?;
        let staging_url = site
            .staging_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        let conn = self.get_connection()?;
        let now = Utc::now();
        conn.execute(
            "INSERT INTO sites (name, base_url, staging_url, created_on) VALUES (?1, ?2, ?3, ?4)",
            params![name, base_url, staging_url, format_timestamp(now)],
        )
        .map_err(|e| authority_error(e, &base_url, "site"))?;

        let id = SiteId::new(conn.last_insert_rowid());
        info!(site_id = %id, base_url = %base_url, "Registered site");

        Ok(Site {
            id,
            name,
            base_url,
            staging_url,
            redirected_domains: Vec::new(),
            created_on: now,
        })
    }

    /// Adds an alias authority to a site.
    ///
    /// An alias belongs to exactly one site; registering it again, in any
    /// case, fails with `TenantError::DuplicateAuthority`.
    pub async fn add_redirected_domain(
        &self,
        site_id: SiteId,
        authority: &str,
    ) -> StorageResult<RedirectedDomain> {
        let url = required("url", authority)?;
        let conn = self.get_connection()?;

        let exists = conn
            .query_row(
                "SELECT 1 FROM sites WHERE id = ?1",
                [site_id.get()],
                |_| Ok(()),
            )
            .optional()
            .map_err(|e| internal_error(format!("Failed to read site: {}", e)))?
            .is_some();
        if !exists {
            return Err(TenantError::SiteNotFound { site_id }.into());
        }

        conn.execute(
            "INSERT INTO redirected_domains (site_id, url) VALUES (?1, ?2)",
            params![site_id.get(), url],
        )
        .map_err(|e| authority_error(e, &url, "redirected domain"))?;

        let id = conn.last_insert_rowid();
        info!(site_id = %site_id, authority = %url, "Added redirected domain");

        Ok(RedirectedDomain { id, site_id, url })
    }
}

#[async_trait]
impl SiteDirectory for SqliteBackend {
    async fn list_sites(&self) -> StorageResult<Vec<Site>> {
        let conn = self.get_connection()?;

        let mut domains: HashMap<SiteId, Vec<RedirectedDomain>> = HashMap::new();
        {
            let mut stmt = conn
                .prepare("SELECT id, site_id, url FROM redirected_domains ORDER BY id")
                .map_err(|e| internal_error(format!("Failed to prepare domain query: {}", e)))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(RedirectedDomain {
                        id: row.get(0)?,
                        site_id: SiteId::new(row.get(1)?),
                        url: row.get(2)?,
                    })
                })
                .map_err(|e| internal_error(format!("Failed to query domains: {}", e)))?;
            for row in rows {
                let domain =
                    row.map_err(|e| internal_error(format!("Failed to read domain row: {}", e)))?;
                domains.entry(domain.site_id).or_default().push(domain);
            }
        }

        let mut stmt = conn
            .prepare("SELECT id, name, base_url, staging_url, created_on FROM sites ORDER BY id")
            .map_err(|e| internal_error(format!("Failed to prepare site query: {}", e)))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(|e| internal_error(format!("Failed to query sites: {}", e)))?;

        let mut sites = Vec::new();
        for row in rows {
            let (id, name, base_url, staging_url, created_on) =
                row.map_err(|e| internal_error(format!("Failed to read site row: {}", e)))?;
            let id = SiteId::new(id);
            sites.push(Site {
                id,
                name,
                base_url,
                staging_url,
                redirected_domains: domains.remove(&id).unwrap_or_default(),
                created_on: parse_timestamp(&created_on, "created_on")?,
            });
        }

        Ok(sites)
    }

    async fn get_site(&self, id: SiteId) -> StorageResult<Option<Site>> {
        // The directory is small; reuse the full load so aliases come along.
        Ok(self
            .list_sites()
            .await?
            .into_iter()
            .find(|site| site.id == id))
    }
}
