//! The four-set structural delta and its canonical apply order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tiered_core::IndexPath;

/// Difference between two snapshots.
///
/// Deletions carry coordinates in the old snapshot, insertions carry
/// coordinates in the new snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    pub deleted_sections: BTreeSet<usize>,
    pub inserted_sections: BTreeSet<usize>,
    pub deleted_items: BTreeSet<IndexPath>,
    pub inserted_items: BTreeSet<IndexPath>,
}

/// One stage of applying a delta, yielded in canonical order by
/// [`Delta::steps`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeltaStep<'a> {
    DeleteSections(&'a BTreeSet<usize>),
    InsertSections(&'a BTreeSet<usize>),
    DeleteItems(&'a BTreeSet<IndexPath>),
    InsertItems(&'a BTreeSet<IndexPath>),
}

impl DeltaStep<'_> {
    pub fn is_empty(&self) -> bool {
        match self {
            DeltaStep::DeleteSections(s) | DeltaStep::InsertSections(s) => s.is_empty(),
            DeltaStep::DeleteItems(p) | DeltaStep::InsertItems(p) => p.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DeltaStep::DeleteSections(s) | DeltaStep::InsertSections(s) => s.len(),
            DeltaStep::DeleteItems(p) | DeltaStep::InsertItems(p) => p.len(),
        }
    }
}

impl Delta {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when all four sets are empty.
    pub fn is_empty(&self) -> bool {
        self.deleted_sections.is_empty()
            && self.inserted_sections.is_empty()
            && self.deleted_items.is_empty()
            && self.inserted_items.is_empty()
    }

    /// Total number of entries across the four sets.
    pub fn len(&self) -> usize {
        self.deleted_sections.len()
            + self.inserted_sections.len()
            + self.deleted_items.len()
            + self.inserted_items.len()
    }

    /// Non-empty stages in the order consumers must apply them:
    /// deleted sections, inserted sections, deleted items, inserted items.
    pub fn steps(&self) -> impl Iterator<Item = DeltaStep<'_>> + '_ {
        [
            DeltaStep::DeleteSections(&self.deleted_sections),
            DeltaStep::InsertSections(&self.inserted_sections),
            DeltaStep::DeleteItems(&self.deleted_items),
            DeltaStep::InsertItems(&self.inserted_items),
        ]
        .into_iter()
        .filter(|step| !step.is_empty())
    }

    /// Whether item entries stay clear of sections changed as a whole:
    /// no deleted item lives in a deleted section and no inserted item lives
    /// in an inserted section.
    pub fn is_disjoint(&self) -> bool {
        self.deleted_items
            .iter()
            .all(|p| !self.deleted_sections.contains(&p.section))
            && self
                .inserted_items
                .iter()
                .all(|p| !self.inserted_sections.contains(&p.section))
    }

    /// Deleted item coordinates within one old section.
    pub fn deleted_in_section(&self, section: usize) -> impl Iterator<Item = usize> + '_ {
        items_in(&self.deleted_items, section)
    }

    /// Inserted item coordinates within one new section.
    pub fn inserted_in_section(&self, section: usize) -> impl Iterator<Item = usize> + '_ {
        items_in(&self.inserted_items, section)
    }
}

fn items_in(paths: &BTreeSet<IndexPath>, section: usize) -> impl Iterator<Item = usize> + '_ {
    paths
        .range(IndexPath::new(section, 0)..=IndexPath::new(section, usize::MAX))
        .map(|p| p.item)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Delta {
        Delta {
            deleted_sections: [1].into_iter().collect(),
            inserted_sections: [3].into_iter().collect(),
            deleted_items: [IndexPath::new(0, 2), IndexPath::new(2, 0)].into_iter().collect(),
            inserted_items: [IndexPath::new(0, 1)].into_iter().collect(),
        }
    }

    #[test]
    fn test_empty() {
        let delta = Delta::new();
        assert!(delta.is_empty());
        assert_eq!(delta.len(), 0);
        assert_eq!(delta.steps().count(), 0);
        assert!(delta.is_disjoint());
    }

    #[test]
    fn test_steps_in_canonical_order() {
        let delta = sample();
        let kinds: Vec<_> = delta
            .steps()
            .map(|s| match s {
                DeltaStep::DeleteSections(_) => "delete_sections",
                DeltaStep::InsertSections(_) => "insert_sections",
                DeltaStep::DeleteItems(_) => "delete_items",
                DeltaStep::InsertItems(_) => "insert_items",
            })
            .collect();

        assert_eq!(
            kinds,
            vec!["delete_sections", "insert_sections", "delete_items", "insert_items"]
        );
        assert_eq!(delta.len(), 5);
    }

    #[test]
    fn test_steps_skip_empty_sets() {
        let delta = Delta {
            inserted_items: [IndexPath::new(0, 0)].into_iter().collect(),
            ..Default::default()
        };
        let steps: Vec<_> = delta.steps().collect();
        assert_eq!(steps.len(), 1);
        assert!(matches!(steps[0], DeltaStep::InsertItems(_)));
    }

    #[test]
    fn test_disjointness() {
        assert!(sample().is_disjoint());

        let mut overlapping = sample();
        overlapping.deleted_items.insert(IndexPath::new(1, 0));
        assert!(!overlapping.is_disjoint());

        let mut overlapping = sample();
        overlapping.inserted_items.insert(IndexPath::new(3, 4));
        assert!(!overlapping.is_disjoint());
    }

    #[test]
    fn test_per_section_ranges() {
        let delta = sample();
        assert_eq!(delta.deleted_in_section(0).collect::<Vec<_>>(), vec![2]);
        assert_eq!(delta.deleted_in_section(2).collect::<Vec<_>>(), vec![0]);
        assert_eq!(delta.inserted_in_section(1).count(), 0);
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["deleted_sections"], serde_json::json!([1]));
        assert_eq!(
            json["inserted_items"],
            serde_json::json!([{ "section": 0, "item": 1 }])
        );
    }
}
