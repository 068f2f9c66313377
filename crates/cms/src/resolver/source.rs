//! How a site was matched.

use std::fmt;

/// Which rule produced the resolved site.
///
/// Rules are listed in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteMatch {
    /// The configured debug override.
    DebugOverride,
    /// The site's base authority.
    BaseUrl,
    /// The site's staging authority.
    StagingUrl,
    /// One of the site's redirected domains.
    RedirectedDomain,
    /// Nothing matched; the first registered site was used.
    Fallback,
}

impl SiteMatch {
    /// Returns `true` if the authority itself identified the site.
    pub fn is_authority_match(&self) -> bool {
        matches!(
            self,
            SiteMatch::BaseUrl | SiteMatch::StagingUrl | SiteMatch::RedirectedDomain
        )
    }

    /// Returns `true` if this is the first-site fallback.
    pub fn is_fallback(&self) -> bool {
        matches!(self, SiteMatch::Fallback)
    }
}

impl fmt::Display for SiteMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteMatch::DebugOverride => write!(f, "debug_override"),
            SiteMatch::BaseUrl => write!(f, "base_url"),
            SiteMatch::StagingUrl => write!(f, "staging_url"),
            SiteMatch::RedirectedDomain => write!(f, "redirected_domain"),
            SiteMatch::Fallback => write!(f, "fallback"),
        }
    }
}
