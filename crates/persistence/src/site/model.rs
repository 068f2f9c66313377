//! Site records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tenant::SiteId;

/// Compares two request authorities the way resolution does: ASCII
/// case-insensitive, no other normalization.
pub fn authority_matches(configured: &str, requested: &str) -> bool {
    configured.eq_ignore_ascii_case(requested)
}

/// A tenant of the content repository.
///
/// A site is reachable through its base authority, its optional staging
/// authority, and any number of redirected-domain aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    /// Identifier assigned on creation.
    pub id: SiteId,
    /// Display name.
    pub name: String,
    /// Canonical authority, e.g. `www.example.com`.
    pub base_url: String,
    /// Authority used by the staging deployment.
    pub staging_url: Option<String>,
    /// Alias authorities, in registration order.
    pub redirected_domains: Vec<RedirectedDomain>,
    /// When the site was registered.
    pub created_on: DateTime<Utc>,
}

impl Site {
    /// Returns `true` if `authority` is this site's base authority.
    pub fn matches_base(&self, authority: &str) -> bool {
        authority_matches(&self.base_url, authority)
    }

    /// Returns `true` if `authority` is this site's staging authority.
    pub fn matches_staging(&self, authority: &str) -> bool {
        self.staging_url
            .as_deref()
            .is_some_and(|staging| authority_matches(staging, authority))
    }

    /// Returns the first alias that matches `authority`.
    pub fn redirect_for(&self, authority: &str) -> Option<&RedirectedDomain> {
        self.redirected_domains
            .iter()
            .find(|domain| domain.matches(authority))
    }

    /// Absolute URL for a path segment under this site's base authority.
    pub fn absolute_url(&self, url_segment: &str) -> String {
        let segment = url_segment.trim_start_matches('/');
        format!("https://{}/{}", self.base_url, segment)
    }
}

/// An alias authority that resolves to its owning site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectedDomain {
    /// Identifier assigned on creation.
    pub id: i64,
    /// The owning site.
    pub site_id: SiteId,
    /// The alias authority.
    pub url: String,
}

impl RedirectedDomain {
    /// Returns `true` if `authority` is this alias.
    pub fn matches(&self, authority: &str) -> bool {
        authority_matches(&self.url, authority)
    }
}

/// Input for registering a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSite {
    /// Display name.
    pub name: String,
    /// Canonical authority.
    pub base_url: String,
    /// Staging authority.
    #[serde(default)]
    pub staging_url: Option<String>,
}

impl NewSite {
    /// Creates a site registration without a staging authority.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            staging_url: None,
        }
    }

    /// Sets the staging authority.
    pub fn with_staging_url(mut self, staging_url: impl Into<String>) -> Self {
        self.staging_url = Some(staging_url.into());
        self
    }
}
