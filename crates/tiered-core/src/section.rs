//! Sections: one parent entity and its ordered children.

use crate::entity::Entity;
use crate::sort::SortKey;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// A parent entity together with its children, sorted by the item sort key.
///
/// Children never repeat an identity. When the source supplies the same child
/// twice, the first occurrence is kept.
#[derive(Clone, Debug)]
pub struct Section<P: Entity, C: Entity> {
    parent: P,
    children: Vec<C>,
}

impl<P: Entity, C: Entity> Section<P, C> {
    /// Build a section from an unordered collection of children.
    pub fn build(parent: P, children: impl IntoIterator<Item = C>, item_sort: &SortKey) -> Self {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for child in children {
            if seen.insert(child.id()) {
                unique.push(child);
            } else {
                tracing::trace!(
                    parent = ?parent.id(),
                    child = ?child.id(),
                    "duplicate child discarded"
                );
            }
        }
        item_sort.sort(&mut unique);

        Self {
            parent,
            children: unique,
        }
    }

    /// A section with no items.
    pub fn empty(parent: P) -> Self {
        Self {
            parent,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> &P {
        &self.parent
    }

    pub fn parent_id(&self) -> P::Id {
        self.parent.id()
    }

    pub fn children(&self) -> &[C] {
        &self.children
    }

    pub fn child(&self, index: usize) -> Option<&C> {
        self.children.get(index)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Position of a child by identity (linear scan).
    pub fn position_of(&self, id: &C::Id) -> Option<usize> {
        self.children.iter().position(|c| &c.id() == id)
    }

    /// Identity -> position map over the children.
    pub fn child_positions(&self) -> HashMap<C::Id, usize> {
        self.children
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id(), i))
            .collect()
    }

    /// Order two sections by their parents.
    pub fn compare(&self, other: &Self, section_sort: &SortKey) -> Ordering {
        section_sort.compare(&self.parent, &other.parent)
    }
}
