//! Immutable snapshots of the full two-level view.
//!
//! A snapshot owns frozen copies of every section. Sections are held behind
//! `Arc` so a rebuilt snapshot can share the sections that did not change
//! with its predecessor.

use crate::entity::Entity;
use crate::section::Section;
use crate::sort::SortKey;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// A (section, item) coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IndexPath {
    pub section: usize,
    pub item: usize,
}

impl IndexPath {
    pub fn new(section: usize, item: usize) -> Self {
        Self { section, item }
    }
}

impl fmt::Display for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.section, self.item)
    }
}

/// An ordered sequence of sections, fully materialized at a point in time.
#[derive(Clone, Debug)]
pub struct Snapshot<P: Entity, C: Entity> {
    sections: Vec<Arc<Section<P, C>>>,
    /// Parent identity -> section index.
    section_index: HashMap<P::Id, usize>,
    /// Child identity -> every coordinate it occupies, in section order.
    item_index: HashMap<C::Id, Vec<IndexPath>>,
    total_items: usize,
}

impl<P: Entity, C: Entity> Snapshot<P, C> {
    /// A snapshot with no sections.
    pub fn empty() -> Self {
        Self {
            sections: Vec::new(),
            section_index: HashMap::new(),
            item_index: HashMap::new(),
            total_items: 0,
        }
    }

    /// Build a snapshot, ordering sections by `section_sort`.
    ///
    /// Sections repeating a parent identity are dropped (first seen wins)
    /// before sorting. The sort is stable, so tied parents keep input order.
    pub fn build(sections: impl IntoIterator<Item = Section<P, C>>, section_sort: &SortKey) -> Self {
        Self::build_shared(sections.into_iter().map(Arc::new), section_sort)
    }

    fn build_shared(
        sections: impl IntoIterator<Item = Arc<Section<P, C>>>,
        section_sort: &SortKey,
    ) -> Self {
        let mut sections = dedup_parents(sections);
        sections.sort_by(|a, b| a.compare(b, section_sort));
        Self::index(sections)
    }

    /// Build a snapshot from sections already in display order.
    pub fn from_ordered(sections: impl IntoIterator<Item = Section<P, C>>) -> Self {
        Self::index(dedup_parents(sections.into_iter().map(Arc::new)))
    }

    /// A new snapshot where the sections for `removed` parents are dropped and
    /// `rebuilt` sections are merged in.
    ///
    /// Untouched sections are shared with `self` and keep their relative
    /// order; the result is re-sorted by `section_sort`.
    pub fn replace_sections(
        &self,
        removed: &HashSet<P::Id>,
        rebuilt: Vec<Section<P, C>>,
        section_sort: &SortKey,
    ) -> Self {
        let rebuilt_ids: HashSet<P::Id> = rebuilt.iter().map(|s| s.parent_id()).collect();
        let survivors = self
            .sections
            .iter()
            .filter(|s| {
                let id = s.parent_id();
                !removed.contains(&id) && !rebuilt_ids.contains(&id)
            })
            .cloned();

        Self::build_shared(
            survivors.chain(rebuilt.into_iter().map(Arc::new)),
            section_sort,
        )
    }

    fn index(sections: Vec<Arc<Section<P, C>>>) -> Self {
        let mut section_index = HashMap::with_capacity(sections.len());
        let mut item_index: HashMap<C::Id, Vec<IndexPath>> = HashMap::new();
        let mut total_items = 0;

        for (s, section) in sections.iter().enumerate() {
            section_index.insert(section.parent_id(), s);
            for (i, child) in section.children().iter().enumerate() {
                item_index
                    .entry(child.id())
                    .or_default()
                    .push(IndexPath::new(s, i));
            }
            total_items += section.len();
        }

        Self {
            sections,
            section_index,
            item_index,
            total_items,
        }
    }

    // === Queries ===

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Sum of the item counts of all sections.
    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn section(&self, index: usize) -> Option<&Section<P, C>> {
        self.sections.get(index).map(|s| s.as_ref())
    }

    /// The shared handle for a section, used to detect sections carried over
    /// unchanged between snapshots.
    pub fn section_handle(&self, index: usize) -> Option<&Arc<Section<P, C>>> {
        self.sections.get(index)
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section<P, C>> + '_ {
        self.sections.iter().map(|s| s.as_ref())
    }

    /// Number of items in a section, `None` when out of range.
    pub fn item_count(&self, section: usize) -> Option<usize> {
        self.section(section).map(Section::len)
    }

    /// The parent entity for a section.
    pub fn parent(&self, section: usize) -> Option<&P> {
        self.section(section).map(Section::parent)
    }

    pub fn section_index_of(&self, parent: &P::Id) -> Option<usize> {
        self.section_index.get(parent).copied()
    }

    pub fn contains_parent(&self, parent: &P::Id) -> bool {
        self.section_index.contains_key(parent)
    }

    /// The item at a coordinate.
    pub fn item(&self, path: IndexPath) -> Option<&C> {
        self.section(path.section)?.child(path.item)
    }

    /// All items of a section in order.
    pub fn items(&self, section: usize) -> Option<&[C]> {
        self.section(section).map(Section::children)
    }

    /// The first coordinate of a child, in section order.
    pub fn index_path_of(&self, child: &C::Id) -> Option<IndexPath> {
        self.index_paths_of(child).first().copied()
    }

    /// Every coordinate a child occupies. A child related to several parents
    /// appears once per section.
    pub fn index_paths_of(&self, child: &C::Id) -> &[IndexPath] {
        self.item_index
            .get(child)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The parent identities in display order.
    pub fn parent_ids(&self) -> Vec<P::Id> {
        self.sections.iter().map(|s| s.parent_id()).collect()
    }

    /// Parent and child identities in display order.
    pub fn layout(&self) -> Vec<(P::Id, Vec<C::Id>)> {
        self.sections
            .iter()
            .map(|s| (s.parent_id(), s.children().iter().map(Entity::id).collect()))
            .collect()
    }
}

impl<P: Entity, C: Entity> Default for Snapshot<P, C> {
    fn default() -> Self {
        Self::empty()
    }
}

fn dedup_parents<P: Entity, C: Entity>(
    sections: impl IntoIterator<Item = Arc<Section<P, C>>>,
) -> Vec<Arc<Section<P, C>>> {
    let mut seen = HashSet::new();
    sections
        .into_iter()
        .filter(|s| {
            let fresh = seen.insert(s.parent_id());
            if !fresh {
                tracing::trace!(parent = ?s.parent_id(), "duplicate section discarded");
            }
            fresh
        })
        .collect()
}
