//! Per-request site lookup.

use folio_persistence::site::Site;
use folio_persistence::tenant::TenantContext;
use tokio::sync::OnceCell;

use super::site_resolver::{ResolvedSite, SiteResolver};
use crate::error::CmsResult;

/// Resolves the current site for one request and remembers the answer.
///
/// Create one locator per request and drop it with the request. The first
/// successful lookup is cached; failures are not, so a later call retries.
#[derive(Debug)]
pub struct SiteLocator {
    resolver: SiteResolver,
    authority: String,
    resolved: OnceCell<ResolvedSite>,
}

impl SiteLocator {
    pub(crate) fn new(resolver: SiteResolver, authority: String) -> Self {
        Self {
            resolver,
            authority,
            resolved: OnceCell::new(),
        }
    }

    /// Returns the request authority.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Returns the resolved site and the rule that matched it.
    pub async fn resolved(&self) -> CmsResult<&ResolvedSite> {
        self.resolved
            .get_or_try_init(|| self.resolver.resolve(&self.authority))
            .await
    }

    /// Returns the current site.
    pub async fn current_site(&self) -> CmsResult<&Site> {
        Ok(&self.resolved().await?.site)
    }

    /// Returns a tenant context bound to the current site.
    pub async fn tenant_context(&self) -> CmsResult<TenantContext> {
        Ok(self.resolved().await?.tenant_context())
    }
}
