//! Site identity and tenant context.
//!
//! Folio is multi-site: one store holds the documents of many sites, and each
//! operation is scoped to one of them through a [`TenantContext`].
//!
//! # Key Types
//!
//! - [`SiteId`] - Opaque site identifier
//! - [`TenantContext`] - Per-operation context carrying the resolved site and
//!   the soft-delete switch

mod context;
mod id;

pub use context::TenantContext;
pub use id::SiteId;
