//! Site resolution from request authorities.
//!
//! Every request is served by exactly one site. The site is chosen from the
//! request authority (host and optional port):
//!
//! - **Debug override**: `FOLIO_DEBUG_SITE_ID` pins every request to one site
//! - **Base URL**: the site's primary authority
//! - **Staging URL**: the site's secondary authority
//! - **Redirected domain**: an alias owned by a site
//! - **Fallback**: the first registered site, unless the policy is `Reject`
//!
//! # Lifetimes
//!
//! [`SiteResolver`] is process-wide and holds no request state.
//! [`SiteLocator`] belongs to a single request and memoizes its answer, so
//! the directory is consulted at most once per request.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use folio_cms::resolver::{ResolverOptions, SiteResolver};
//!
//! let resolver = SiteResolver::new(Arc::new(backend), ResolverOptions::default());
//!
//! let locator = resolver.locator("www.example.com");
//! let site = locator.current_site().await?;
//! let tenant = locator.tenant_context().await?;
//! ```

mod locator;
mod site_resolver;
mod source;

pub use locator::SiteLocator;
pub use site_resolver::{ResolvedSite, ResolverOptions, SiteResolver, UnmatchedHostPolicy};
pub use source::SiteMatch;
