//! The soft-delete interceptor.
//!
//! Every delete issued against the store is routed through
//! [`SoftDeleteInterceptor::delete`]. Instead of removing a soft-deletable
//! entity it raises the entity's deleted flag, then follows the declared
//! [`CASCADE_EDGES`] to its dependents and applies the same rule to each.
//! Entities that cannot carry the flag are physically removed together with
//! everything below them. A context created with
//! `TenantContext::with_soft_delete_disabled` removes everything reachable.
//!
//! The walk is iterative with a visited set. Reaching an entity twice aborts
//! the pass with [`CascadeError::CycleDetected`] before anything is written,
//! so the caller's transaction can simply be dropped.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::{CascadeError, StorageResult};
use crate::tenant::TenantContext;
use crate::types::{EntityKey, EntityKind};

/// The relation a cascade edge follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Webpages whose parent is the owner.
    ChildWebpages,
    /// URL history rows of the owner.
    UrlHistory,
    /// Tag link rows of the owner.
    Tags,
}

/// A declared ownership edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeEdge {
    /// Owner kind.
    pub from: EntityKind,
    /// Dependent kind.
    pub to: EntityKind,
    /// How dependents are found.
    pub relation: Relation,
}

/// The ownership edges deletes follow.
pub const CASCADE_EDGES: &[CascadeEdge] = &[
    CascadeEdge {
        from: EntityKind::Document,
        to: EntityKind::Document,
        relation: Relation::ChildWebpages,
    },
    CascadeEdge {
        from: EntityKind::Document,
        to: EntityKind::UrlHistory,
        relation: Relation::UrlHistory,
    },
    CascadeEdge {
        from: EntityKind::Document,
        to: EntityKind::DocumentTag,
        relation: Relation::Tags,
    },
];

/// Store operations the interceptor needs, run inside the caller's
/// transaction.
pub trait CascadeTarget {
    /// Returns the dependents of `owner` along `edge`.
    fn dependents(&mut self, owner: EntityKey, edge: &CascadeEdge) -> StorageResult<Vec<EntityKey>>;

    /// Raises the deleted flag of `key`.
    ///
    /// Returns `false` if the flag was already raised.
    fn mark_deleted(&mut self, key: EntityKey, at: DateTime<Utc>) -> StorageResult<bool>;

    /// Physically removes `key`.
    fn remove(&mut self, key: EntityKey) -> StorageResult<()>;
}

/// What happens to one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeAction {
    /// Raise the deleted flag.
    MarkDeleted,
    /// Remove the row.
    Remove,
}

/// One step of a cascade plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeStep {
    /// The entity.
    pub key: EntityKey,
    /// What to do with it.
    pub action: CascadeAction,
}

/// The outcome of a delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    /// Entities whose deleted flag was raised by this pass, owners first.
    pub soft_deleted: Vec<EntityKey>,
    /// Entities physically removed, dependents first.
    pub removed: Vec<EntityKey>,
}

impl CascadeReport {
    /// Total number of entities affected.
    pub fn len(&self) -> usize {
        self.soft_deleted.len() + self.removed.len()
    }

    /// Returns `true` if nothing was affected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `key` was soft-deleted by this pass.
    pub fn soft_deleted_contains(&self, key: EntityKey) -> bool {
        self.soft_deleted.contains(&key)
    }
}

/// Turns deletes into cascaded logical removals.
#[derive(Debug, Clone)]
pub struct SoftDeleteInterceptor {
    edges: Vec<CascadeEdge>,
}

impl Default for SoftDeleteInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftDeleteInterceptor {
    /// An interceptor following [`CASCADE_EDGES`].
    pub fn new() -> Self {
        Self::with_edges(CASCADE_EDGES.to_vec())
    }

    /// An interceptor following a custom edge list.
    pub fn with_edges(edges: Vec<CascadeEdge>) -> Self {
        Self { edges }
    }

    /// Returns the edges this interceptor follows.
    pub fn edges(&self) -> &[CascadeEdge] {
        &self.edges
    }

    /// Computes the cascade plan for deleting `root`, owners first.
    ///
    /// Nothing is written. Fails if any entity is reached twice.
    pub fn plan<T: CascadeTarget + ?Sized>(
        &self,
        target: &mut T,
        root: EntityKey,
        soft_delete: bool,
    ) -> StorageResult<Vec<CascadeStep>> {
        let mut visited = HashSet::new();
        let mut stack = vec![(root, soft_delete)];
        let mut plan = Vec::new();

        while let Some((key, soft)) = stack.pop() {
            if !visited.insert(key) {
                return Err(CascadeError::CycleDetected { entity: key }.into());
            }

            let action = if soft && key.kind.is_soft_deletable() {
                CascadeAction::MarkDeleted
            } else {
                CascadeAction::Remove
            };
            let soft_below = action == CascadeAction::MarkDeleted;

            for edge in self.edges.iter().filter(|edge| edge.from == key.kind) {
                for dependent in target.dependents(key, edge)? {
                    stack.push((dependent, soft_below));
                }
            }

            plan.push(CascadeStep { key, action });
        }

        Ok(plan)
    }

    /// Deletes `root` and its dependents according to `tenant`'s soft-delete
    /// setting.
    ///
    /// Flags are raised owners-first; removals run dependents-first so no
    /// row is removed while something still references it.
    pub fn delete<T: CascadeTarget + ?Sized>(
        &self,
        target: &mut T,
        root: EntityKey,
        tenant: &TenantContext,
    ) -> StorageResult<CascadeReport> {
        let soft_delete = !tenant.is_soft_delete_disabled();
        let plan = self.plan(target, root, soft_delete)?;
        debug!(
            root = %root,
            soft_delete,
            steps = plan.len(),
            "Planned cascade"
        );

        let now = Utc::now();
        let mut report = CascadeReport::default();

        for step in plan.iter().filter(|s| s.action == CascadeAction::MarkDeleted) {
            if target.mark_deleted(step.key, now)? {
                report.soft_deleted.push(step.key);
            }
        }

        for step in plan.iter().rev().filter(|s| s.action == CascadeAction::Remove) {
            target.remove(step.key)?;
            report.removed.push(step.key);
        }

        Ok(report)
    }
}
