//! Tenant context for storage operations.
//!
//! This module defines [`TenantContext`], the per-operation value every store
//! call receives. It carries the resolved site, the per-operation soft-delete
//! switch, and optional tracing metadata.

use super::id::SiteId;
use crate::error::TenantError;
use crate::site::Site;

/// The tenant context required for all storage operations.
///
/// A context is normally bound to the site resolved for the current request.
/// A detached context (see [`TenantContext::detached`]) exists for callers
/// that have not resolved a site yet; every document operation rejects it
/// with [`TenantError::NoTenantContext`].
///
/// Contexts are plain values: cloning one and flipping the soft-delete switch
/// affects only the operations that receive the clone.
///
/// ```
/// use folio_persistence::tenant::{SiteId, TenantContext};
///
/// let ctx = TenantContext::new(SiteId::new(1)).with_correlation_id("req-9");
/// assert_eq!(ctx.require_site().unwrap(), SiteId::new(1));
/// assert!(!ctx.is_soft_delete_disabled());
///
/// let hard = ctx.clone().with_soft_delete_disabled();
/// assert!(hard.is_soft_delete_disabled());
/// assert!(!ctx.is_soft_delete_disabled());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    site_id: Option<SiteId>,
    soft_delete_disabled: bool,
    /// Optional correlation ID for request tracing.
    correlation_id: Option<String>,
}

impl TenantContext {
    /// Creates a context bound to the given site.
    pub fn new(site_id: SiteId) -> Self {
        Self {
            site_id: Some(site_id),
            soft_delete_disabled: false,
            correlation_id: None,
        }
    }

    /// Creates a context bound to a resolved site record.
    pub fn for_site(site: &Site) -> Self {
        Self::new(site.id)
    }

    /// Creates a context that is not bound to any site.
    pub fn detached() -> Self {
        Self {
            site_id: None,
            soft_delete_disabled: false,
            correlation_id: None,
        }
    }

    /// Turns deletes issued with this context into physical removals.
    pub fn with_soft_delete_disabled(mut self) -> Self {
        self.soft_delete_disabled = true;
        self
    }

    /// Creates a context with the specified correlation ID for tracing.
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Returns the bound site, if any.
    pub fn site_id(&self) -> Option<SiteId> {
        self.site_id
    }

    /// Returns the bound site or [`TenantError::NoTenantContext`].
    pub fn require_site(&self) -> Result<SiteId, TenantError> {
        self.site_id.ok_or(TenantError::NoTenantContext)
    }

    /// Returns `true` if deletes should bypass the soft-delete interceptor.
    pub fn is_soft_delete_disabled(&self) -> bool {
        self.soft_delete_disabled
    }

    /// Returns the correlation ID, if set.
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// Checks that an entity owned by `owner` is visible from this context.
    ///
    /// There is no cross-site access: the owner must be the bound site.
    pub fn check_access(&self, owner: SiteId) -> Result<(), TenantError> {
        let expected = self.require_site()?;
        if expected == owner {
            Ok(())
        } else {
            Err(TenantError::TenantMismatch {
                expected,
                actual: owner,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_creation() {
        let ctx = TenantContext::new(SiteId::new(2));
        assert_eq!(ctx.site_id(), Some(SiteId::new(2)));
        assert!(!ctx.is_soft_delete_disabled());
        assert_eq!(ctx.correlation_id(), None);
    }

    #[test]
    fn test_detached_context_requires_site() {
        let ctx = TenantContext::detached();
        assert!(matches!(
            ctx.require_site(),
            Err(TenantError::NoTenantContext)
        ));
        assert!(ctx.check_access(SiteId::new(1)).is_err());
    }

    #[test]
    fn test_with_correlation_id() {
        let ctx = TenantContext::new(SiteId::new(1)).with_correlation_id("req-123");
        assert_eq!(ctx.correlation_id(), Some("req-123"));
        assert_eq!(TenantContext::new(SiteId::new(1)).correlation_id(), None);
    }

    #[test]
    fn test_soft_delete_switch_is_per_value() {
        let ctx = TenantContext::new(SiteId::new(1));
        let hard = ctx.clone().with_soft_delete_disabled();
        assert!(hard.is_soft_delete_disabled());
        assert!(!ctx.is_soft_delete_disabled());
    }

    #[test]
    fn test_check_access() {
        let ctx = TenantContext::new(SiteId::new(1));
        assert!(ctx.check_access(SiteId::new(1)).is_ok());
        match ctx.check_access(SiteId::new(2)) {
            Err(TenantError::TenantMismatch { expected, actual }) => {
                assert_eq!(expected, SiteId::new(1));
                assert_eq!(actual, SiteId::new(2));
            }
            other => panic!("expected mismatch, got {:?}", other),
        }
    }
}
