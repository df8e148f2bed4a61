//! Two-level reconciliation between snapshots.
//!
//! ```text
//! sections:  deleted  = old parents  \ new parents   (old indices)
//!            inserted = new parents  \ old parents   (new indices)
//! items:     for every parent in both snapshots, at old index i / new index j
//!            deleted  += (i, k) for old children absent from the new section
//!            inserted += (j, k) for new children absent from the old section
//! ```
//!
//! Both levels are set differences over identity. Position changes produce
//! no entries.

use crate::delta::Delta;
use std::collections::HashSet;
use std::sync::Arc;
use tiered_core::{Entity, IndexPath, Section, Snapshot};

/// Compute the delta from `old` to `new`.
pub fn diff<P: Entity, C: Entity>(old: &Snapshot<P, C>, new: &Snapshot<P, C>) -> Delta {
    let mut delta = Delta::new();

    for (i, old_section) in old.sections().enumerate() {
        match new.section_index_of(&old_section.parent_id()) {
            None => {
                delta.deleted_sections.insert(i);
            }
            Some(j) => {
                let shared = match (old.section_handle(i), new.section_handle(j)) {
                    (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                    _ => false,
                };
                if !shared {
                    if let Some(new_section) = new.section(j) {
                        diff_items(i, old_section, j, new_section, &mut delta);
                    }
                }
            }
        }
    }

    for (j, new_section) in new.sections().enumerate() {
        if !old.contains_parent(&new_section.parent_id()) {
            delta.inserted_sections.insert(j);
        }
    }

    tracing::trace!(
        deleted_sections = delta.deleted_sections.len(),
        inserted_sections = delta.inserted_sections.len(),
        deleted_items = delta.deleted_items.len(),
        inserted_items = delta.inserted_items.len(),
        "snapshot diff computed"
    );

    delta
}

/// Compute the delta against an optional previous snapshot.
///
/// With no previous snapshot the new one is the baseline and the delta is
/// empty; it is never reported as "everything inserted".
pub fn reconcile<P: Entity, C: Entity>(old: Option<&Snapshot<P, C>>, new: &Snapshot<P, C>) -> Delta {
    match old {
        Some(old) => diff(old, new),
        None => Delta::new(),
    }
}

fn diff_items<P: Entity, C: Entity>(
    old_index: usize,
    old: &Section<P, C>,
    new_index: usize,
    new: &Section<P, C>,
    delta: &mut Delta,
) {
    let old_ids: HashSet<C::Id> = old.children().iter().map(Entity::id).collect();
    let new_ids: HashSet<C::Id> = new.children().iter().map(Entity::id).collect();

    for (k, child) in old.children().iter().enumerate() {
        if !new_ids.contains(&child.id()) {
            delta.deleted_items.insert(IndexPath::new(old_index, k));
        }
    }
    for (k, child) in new.children().iter().enumerate() {
        if !old_ids.contains(&child.id()) {
            delta.inserted_items.insert(IndexPath::new(new_index, k));
        }
    }
}
