//! Property-based tests that MUST hold for every computed delta
//!
//! These tests verify:
//!  - Idempotence: diff(s, s) is empty
//!  - Reorder invisibility: changing only sort fields yields an empty delta
//!  - Section/item disjointness
//!  - Count conservation, per section and in total
//!  - Replay: applying the delta to the old identities yields the new ones

use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};
use tiered_core::{Entity, FieldValue, Section, Snapshot, SortKey};
use tiered_delta::{diff, Delta};

#[derive(Clone, Debug)]
struct Obj {
    id: u8,
    rank: i32,
}

impl Entity for Obj {
    type Id = u8;

    fn id(&self) -> u8 {
        self.id
    }

    fn field(&self, key: &str) -> FieldValue {
        match key {
            "rank" => self.rank.into(),
            "id" => FieldValue::Int(self.id.into()),
            _ => FieldValue::Null,
        }
    }
}

type Layout = BTreeMap<u8, (i32, BTreeMap<u8, i32>)>;

fn key() -> SortKey {
    SortKey::ascending("rank").then_ascending("id")
}

fn layout_strategy() -> impl Strategy<Value = Layout> {
    prop::collection::btree_map(
        0u8..8,
        (
            -5i32..5,
            prop::collection::btree_map(0u8..24, -5i32..5, 0..8),
        ),
        0..6,
    )
}

fn build(layout: &Layout) -> Snapshot<Obj, Obj> {
    let sections = layout.iter().map(|(&pid, (rank, children))| {
        let children = children.iter().map(|(&id, &rank)| Obj { id, rank });
        Section::build(Obj { id: pid, rank: *rank }, children, &key())
    });
    Snapshot::build(sections, &key())
}

/// Remaps every rank while keeping all identities.
fn rerank(layout: &Layout, salt: i32) -> Layout {
    layout
        .iter()
        .map(|(&pid, (rank, children))| {
            let children = children
                .iter()
                .map(|(&id, &r)| (id, (r * 7 + salt) % 11))
                .collect();
            (pid, ((rank * 3 - salt) % 13, children))
        })
        .collect()
}

fn items_in_sections(snapshot: &Snapshot<Obj, Obj>, sections: impl Iterator<Item = usize>) -> usize {
    sections.filter_map(|s| snapshot.item_count(s)).sum()
}

/// Applies `delta` the way a list view would and returns the resulting
/// parent -> child identity sets.
fn replay(
    old: &Snapshot<Obj, Obj>,
    new: &Snapshot<Obj, Obj>,
    delta: &Delta,
) -> BTreeMap<u8, HashSet<u8>> {
    let mut survivors: BTreeMap<u8, HashSet<u8>> = BTreeMap::new();
    for (i, section) in old.sections().enumerate() {
        if delta.deleted_sections.contains(&i) {
            continue;
        }
        let deleted: HashSet<usize> = delta.deleted_in_section(i).collect();
        let kept = section
            .children()
            .iter()
            .enumerate()
            .filter(|(k, _)| !deleted.contains(k))
            .map(|(_, c)| c.id)
            .collect();
        survivors.insert(section.parent_id(), kept);
    }

    let mut result = BTreeMap::new();
    for (j, section) in new.sections().enumerate() {
        let ids: HashSet<u8> = if delta.inserted_sections.contains(&j) {
            section.children().iter().map(|c| c.id).collect()
        } else {
            let mut ids = survivors.remove(&section.parent_id()).unwrap_or_default();
            for k in delta.inserted_in_section(j) {
                ids.insert(section.children()[k].id);
            }
            ids
        };
        result.insert(section.parent_id(), ids);
    }
    result
}

proptest! {
    #[test]
    fn diff_is_idempotent(layout in layout_strategy()) {
        let snapshot = build(&layout);
        prop_assert!(diff(&snapshot, &build(&layout)).is_empty());
    }

    #[test]
    fn reorder_only_is_invisible(layout in layout_strategy(), salt in 0i32..5) {
        let old = build(&layout);
        let new = build(&rerank(&layout, salt));
        prop_assert!(diff(&old, &new).is_empty());
    }

    #[test]
    fn delta_is_disjoint(old in layout_strategy(), new in layout_strategy()) {
        let delta = diff(&build(&old), &build(&new));
        prop_assert!(delta.is_disjoint());
    }

    #[test]
    fn counts_are_conserved(old in layout_strategy(), new in layout_strategy()) {
        let old = build(&old);
        let new = build(&new);
        let delta = diff(&old, &new);

        let lost = items_in_sections(&old, delta.deleted_sections.iter().copied());
        let gained = items_in_sections(&new, delta.inserted_sections.iter().copied());

        prop_assert_eq!(
            new.total_items() + delta.deleted_items.len() + lost,
            old.total_items() + delta.inserted_items.len() + gained
        );
        prop_assert_eq!(
            new.section_count() + delta.deleted_sections.len(),
            old.section_count() + delta.inserted_sections.len()
        );

        for (j, section) in new.sections().enumerate() {
            if delta.inserted_sections.contains(&j) {
                continue;
            }
            let i = old.section_index_of(&section.parent_id()).unwrap();
            let before = old.item_count(i).unwrap();
            prop_assert_eq!(
                section.len() + delta.deleted_in_section(i).count(),
                before + delta.inserted_in_section(j).count()
            );
        }
    }

    #[test]
    fn replay_reaches_new_identities(old in layout_strategy(), new in layout_strategy()) {
        let old = build(&old);
        let new = build(&new);
        let delta = diff(&old, &new);

        let replayed = replay(&old, &new, &delta);
        let expected: BTreeMap<u8, HashSet<u8>> = new
            .sections()
            .map(|s| (s.parent_id(), s.children().iter().map(|c| c.id).collect()))
            .collect();

        prop_assert_eq!(replayed, expected);
    }

    #[test]
    fn indices_are_in_bounds(old in layout_strategy(), new in layout_strategy()) {
        let old = build(&old);
        let new = build(&new);
        let delta = diff(&old, &new);

        for &s in &delta.deleted_sections {
            prop_assert!(s < old.section_count());
        }
        for &s in &delta.inserted_sections {
            prop_assert!(s < new.section_count());
        }
        for p in &delta.deleted_items {
            prop_assert!(old.item(*p).is_some());
        }
        for p in &delta.inserted_items {
            prop_assert!(new.item(*p).is_some());
        }
    }
}
