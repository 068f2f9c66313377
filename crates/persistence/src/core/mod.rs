//! Core storage traits and abstractions.
//!
//! - [`DocumentStore`] - Tenant-scoped, transactional document operations
//! - [`SoftDeleteInterceptor`] - The delete hook that cascades logical
//!   removal over [`CASCADE_EDGES`]
//!
//! Backends implement [`DocumentStore`] and route their delete path through
//! the interceptor by implementing [`CascadeTarget`] over their open
//! transaction.

pub mod cascade;
mod storage;

pub use cascade::{
    CASCADE_EDGES, CascadeAction, CascadeEdge, CascadeReport, CascadeStep, CascadeTarget,
    Relation, SoftDeleteInterceptor,
};
pub use storage::{DocumentStore, OrderAssignment};
