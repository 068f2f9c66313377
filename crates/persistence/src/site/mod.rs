//! Sites and the site directory.
//!
//! A [`Site`] is a tenant: a content partition reachable through one or more
//! request authorities. The [`SiteDirectory`] trait is the read side used by
//! request-time resolution; [`CachedSiteDirectory`] keeps a process-wide
//! snapshot in front of any directory.

mod directory;
mod model;

pub use directory::{CachedSiteDirectory, SiteDirectory};
pub use model::{NewSite, RedirectedDomain, Site, authority_matches};
