//! Authority-to-site resolution.

use std::sync::Arc;

use clap::ValueEnum;
use folio_persistence::site::{Site, SiteDirectory};
use folio_persistence::tenant::{SiteId, TenantContext};
use tracing::{debug, info, warn};

use super::locator::SiteLocator;
use super::source::SiteMatch;
use crate::config::FolioConfig;
use crate::error::{CmsResult, SiteError};

/// What to do with a request whose authority matches no site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum UnmatchedHostPolicy {
    /// Serve the first registered site and log a warning.
    #[default]
    FirstSite,
    /// Fail with `UnmatchedAuthority`.
    Reject,
}

/// Options controlling resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolverOptions {
    /// Site returned for every authority, when it exists.
    pub debug_site_id: Option<SiteId>,
    /// Behavior for unknown authorities.
    pub unmatched_host: UnmatchedHostPolicy,
}

impl ResolverOptions {
    /// Sets the debug override.
    pub fn with_debug_site(mut self, site_id: SiteId) -> Self {
        self.debug_site_id = Some(site_id);
        self
    }

    /// Sets the unmatched-host policy.
    pub fn with_unmatched_host(mut self, policy: UnmatchedHostPolicy) -> Self {
        self.unmatched_host = policy;
        self
    }
}

impl From<&FolioConfig> for ResolverOptions {
    fn from(config: &FolioConfig) -> Self {
        Self {
            debug_site_id: config.debug_site_id.map(SiteId::new),
            unmatched_host: config.unmatched_host,
        }
    }
}

/// A site together with the rule that selected it.
#[derive(Debug, Clone)]
pub struct ResolvedSite {
    /// The resolved site.
    pub site: Site,
    /// The rule that matched.
    pub source: SiteMatch,
}

impl ResolvedSite {
    /// Returns the site id.
    pub fn site_id(&self) -> SiteId {
        self.site.id
    }

    /// Returns true if the site was the first-site fallback.
    pub fn is_fallback(&self) -> bool {
        self.source.is_fallback()
    }

    /// Returns a tenant context bound to the resolved site.
    pub fn tenant_context(&self) -> TenantContext {
        TenantContext::for_site(&self.site)
    }
}

/// Resolves request authorities to sites.
///
/// The resolver holds no per-request state and is shared across requests.
/// Per-request memoization lives in [`SiteLocator`].
///
/// Resolution order:
///
/// 1. The debug override, when configured and present in the directory
/// 2. A site whose base or staging authority equals the request authority
/// 3. The owner of a redirected domain equal to the request authority
/// 4. The unmatched-host policy
///
/// Authority comparison is ASCII case-insensitive and includes the port.
#[derive(Clone)]
pub struct SiteResolver {
    directory: Arc<dyn SiteDirectory>,
    options: ResolverOptions,
}

impl SiteResolver {
    /// Creates a resolver over a site directory.
    pub fn new(directory: Arc<dyn SiteDirectory>, options: ResolverOptions) -> Self {
        Self { directory, options }
    }

    /// Returns the resolver options.
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Creates a per-request locator for the given authority.
    pub fn locator(&self, authority: impl Into<String>) -> SiteLocator {
        SiteLocator::new(self.clone(), authority.into())
    }

    /// Resolves the site serving `authority`.
    ///
    /// # Errors
    ///
    /// * `SiteError::NoSitesConfigured` - If the directory is empty
    /// * `SiteError::UnmatchedAuthority` - If nothing matches under
    ///   [`UnmatchedHostPolicy::Reject`]
    pub async fn resolve(&self, authority: &str) -> CmsResult<ResolvedSite> {
        if let Some(site_id) = self.options.debug_site_id {
            match self.directory.get_site(site_id).await? {
                Some(site) => {
                    debug!(site_id = %site.id, "Resolved site from debug override");
                    return Ok(ResolvedSite {
                        site,
                        source: SiteMatch::DebugOverride,
                    });
                }
                None => {
                    warn!(
                        site_id = %site_id,
                        "Debug site override names no site, matching the authority instead"
                    );
                }
            }
        }

        let sites = self.directory.list_sites().await?;
        if sites.is_empty() {
            return Err(SiteError::NoSitesConfigured.into());
        }

        let resolved = match match_authority(&sites, authority) {
            Some(resolved) => resolved,
            None => match self.options.unmatched_host {
                UnmatchedHostPolicy::FirstSite => {
                    let site = sites.into_iter().next().ok_or(SiteError::NoSitesConfigured)?;
                    warn!(
                        authority = %authority,
                        site_id = %site.id,
                        "No site matches authority, falling back to the first site"
                    );
                    ResolvedSite {
                        site,
                        source: SiteMatch::Fallback,
                    }
                }
                UnmatchedHostPolicy::Reject => {
                    return Err(SiteError::UnmatchedAuthority {
                        authority: authority.to_string(),
                    }
                    .into());
                }
            },
        };

        info!(
            authority = %authority,
            site_id = %resolved.site.id,
            source = %resolved.source,
            "Resolved site"
        );
        Ok(resolved)
    }
}

impl std::fmt::Debug for SiteResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteResolver")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Applies the base/staging pass and then the redirect pass.
fn match_authority(sites: &[Site], authority: &str) -> Option<ResolvedSite> {
    for site in sites {
        if site.matches_base(authority) {
            return Some(ResolvedSite {
                site: site.clone(),
                source: SiteMatch::BaseUrl,
            });
        }
        if site.matches_staging(authority) {
            return Some(ResolvedSite {
                site: site.clone(),
                source: SiteMatch::StagingUrl,
            });
        }
    }

    sites
        .iter()
        .find(|site| site.redirect_for(authority).is_some())
        .map(|site| ResolvedSite {
            site: site.clone(),
            source: SiteMatch::RedirectedDomain,
        })
}
