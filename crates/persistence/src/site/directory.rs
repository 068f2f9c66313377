//! The site directory.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use super::model::Site;
use crate::error::StorageResult;
use crate::tenant::SiteId;

/// Read access to the set of registered sites.
///
/// Sites are returned in registration order. The directory is read-only at
/// request time; administrative writes go through the backend directly.
#[async_trait]
pub trait SiteDirectory: Send + Sync {
    /// Returns every site, ordered by ascending id.
    async fn list_sites(&self) -> StorageResult<Vec<Site>>;

    /// Returns a single site.
    async fn get_site(&self, id: SiteId) -> StorageResult<Option<Site>> {
        Ok(self
            .list_sites()
            .await?
            .into_iter()
            .find(|site| site.id == id))
    }
}

#[async_trait]
impl<T: SiteDirectory + ?Sized> SiteDirectory for Arc<T> {
    async fn list_sites(&self) -> StorageResult<Vec<Site>> {
        (**self).list_sites().await
    }

    async fn get_site(&self, id: SiteId) -> StorageResult<Option<Site>> {
        (**self).get_site(id).await
    }
}

/// A per-process cache over another directory.
///
/// The first read loads the full directory; later reads are served from
/// memory until [`invalidate`](Self::invalidate) is called.
pub struct CachedSiteDirectory {
    inner: Arc<dyn SiteDirectory>,
    sites: RwLock<Option<Arc<Vec<Site>>>>,
}

impl CachedSiteDirectory {
    /// Wraps a directory.
    pub fn new(inner: Arc<dyn SiteDirectory>) -> Self {
        Self {
            inner,
            sites: RwLock::new(None),
        }
    }

    /// Drops the cached snapshot so the next read reloads it.
    pub fn invalidate(&self) {
        debug!("Invalidating cached site directory");
        *self.sites.write() = None;
    }

    async fn snapshot(&self) -> StorageResult<Arc<Vec<Site>>> {
        let cached = self.sites.read().clone();
        if let Some(sites) = cached {
            return Ok(sites);
        }

        let loaded = Arc::new(self.inner.list_sites().await?);
        debug!(count = loaded.len(), "Loaded site directory");
        *self.sites.write() = Some(Arc::clone(&loaded));
        Ok(loaded)
    }
}

#[async_trait]
impl SiteDirectory for CachedSiteDirectory {
    async fn list_sites(&self) -> StorageResult<Vec<Site>> {
        Ok(self.snapshot().await?.as_ref().clone())
    }

    async fn get_site(&self, id: SiteId) -> StorageResult<Option<Site>> {
        Ok(self
            .snapshot()
            .await?
            .iter()
            .find(|site| site.id == id)
            .cloned())
    }
}
