//! Integration tests for a controller backed by the memory store.
//!
//! These tests verify:
//! - Section removal and item insertion in one pass yield only those entries
//! - Reordering without identity change is invisible
//! - The first fetch is a baseline
//! - Empty sections, failures, single-parent mode and observer delivery

use parking_lot::{Mutex, RwLock};
use std::collections::BTreeSet;
use std::sync::Arc;
use tiered_controller::{
    ChangeEvent, Controller, ControllerConfig, Delta, DeltaStep, FetchRequest, IndexPath, Scope,
    Snapshot, SortKey,
};
use tiered_store::{MemoryStore, Record, RecordId, StoreError};

type Shared = Arc<RwLock<MemoryStore>>;

fn config() -> ControllerConfig {
    ControllerConfig::builder()
        .child_key("children")
        .section_sort(SortKey::ascending("outer_sort_key"))
        .item_sort(SortKey::ascending("inner_sort_key"))
        .build()
}

fn id(s: &str) -> RecordId {
    RecordId::from(s)
}

fn parent(name: &str, key: i64) -> Record {
    Record::parent().with_id(name).with_field("outer_sort_key", key)
}

fn child(name: &str, key: i64) -> Record {
    Record::child().with_id(name).with_field("inner_sort_key", key)
}

/// `[P1:[a,b], P2:[c]]`
fn sample() -> Shared {
    let mut store = MemoryStore::new();
    store.insert_parent(parent("p1", 1));
    store.insert_parent(parent("p2", 2));
    store.insert_child(&id("p1"), child("a", 1)).unwrap();
    store.insert_child(&id("p1"), child("b", 2)).unwrap();
    store.insert_child(&id("p2"), child("c", 1)).unwrap();
    store.take_changes();
    Arc::new(RwLock::new(store))
}

fn fetched(store: &Shared) -> Controller<Shared> {
    let mut controller = Controller::new(store.clone(), Scope::all(), config()).unwrap();
    controller.perform_fetch().unwrap();
    controller
}

fn apply_pending(controller: &mut Controller<Shared>, store: &Shared) -> Delta {
    let event = store.write().take_event();
    event.map_or_else(Delta::default, |event| controller.apply(event).unwrap())
}

#[test]
fn test_remove_section_and_insert_item() {
    let store = sample();
    let mut incremental = fetched(&store);
    let mut full = fetched(&store);

    {
        let mut store = store.write();
        store.remove(&id("p2")).unwrap();
        store.insert_child(&id("p1"), child("d", 3)).unwrap();
    }

    let expected = Delta {
        deleted_sections: BTreeSet::from([1]),
        inserted_items: BTreeSet::from([IndexPath::new(0, 2)]),
        ..Delta::default()
    };
    assert_eq!(full.perform_fetch().unwrap(), expected);

    let passes = incremental.passes();
    assert_eq!(apply_pending(&mut incremental, &store), expected);
    assert_eq!(incremental.passes(), passes + 1);
    assert_eq!(incremental.snapshot().layout(), full.snapshot().layout());
    assert_eq!(incremental.number_of_sections(), 1);
}

#[test]
fn test_parent_replacing_child_leaves_old_section() {
    let store = sample();
    let mut incremental = fetched(&store);
    let mut full = fetched(&store);

    store.write().insert_parent(parent("a", 0));

    let delta = apply_pending(&mut incremental, &store);
    assert_eq!(delta, full.perform_fetch().unwrap());
    assert_eq!(delta.deleted_items, BTreeSet::from([IndexPath::new(0, 0)]));
    assert_eq!(delta.inserted_sections, BTreeSet::from([0]));
    assert_eq!(incremental.snapshot().layout(), full.snapshot().layout());
}

#[test]
fn test_reorder_is_invisible() {
    let store = sample();
    let mut controller = fetched(&store);

    {
        let mut store = store.write();
        store.set_field(&id("a"), "inner_sort_key", 5).unwrap();
        store.set_field(&id("p1"), "outer_sort_key", 9).unwrap();
    }

    assert!(apply_pending(&mut controller, &store).is_empty());
    assert_eq!(controller.section_index_of(&id("p1")), Some(1));
    assert_eq!(controller.index_path_of(&id("a")), Some(IndexPath::new(1, 1)));
}

#[test]
fn test_first_fetch_is_baseline() {
    let store = sample();
    let mut controller = Controller::new(store, Scope::all(), config()).unwrap();

    assert!(controller.perform_fetch().unwrap().is_empty());
    assert_eq!(controller.number_of_sections(), 2);
}

#[test]
fn test_empty_section() {
    let store = sample();
    store.write().insert_parent(parent("p3", 3));
    let controller = fetched(&store);

    assert_eq!(controller.number_of_objects_in_section(2), Some(0));
    assert_eq!(controller.all_objects_in_section(2).map(<[Record]>::len), Some(0));
    assert_eq!(controller.number_of_objects_in_section(3), None);
}

#[test]
fn test_failure_keeps_snapshot() {
    let store = sample();
    let mut controller = fetched(&store);
    let before = controller.snapshot();

    {
        let mut store = store.write();
        store.remove(&id("p2")).unwrap();
        store.set_unavailable(true);
    }
    let err = controller.apply(ChangeEvent::Parents(vec![id("p2")])).unwrap_err();

    assert!(err.is_data_source());
    assert!(Arc::ptr_eq(&before, &controller.snapshot()));
    assert_eq!(controller.number_of_sections(), 2);

    store.write().set_unavailable(false);
    let delta = controller.apply(ChangeEvent::Reload).unwrap();
    assert_eq!(delta.deleted_sections, BTreeSet::from([1]));
}

#[test]
fn test_unknown_relationship_fails_at_fetch() {
    let store = sample();
    let config = ControllerConfig {
        child_key: "tags".into(),
        ..config()
    };
    let mut controller = Controller::new(store, Scope::all(), config).unwrap();

    let err = controller.perform_fetch().unwrap_err();
    let source = std::error::Error::source(&err)
        .and_then(|e| e.downcast_ref::<StoreError>())
        .cloned();
    assert_eq!(source, Some(StoreError::UnknownRelationship("tags".into())));
    assert!(!controller.has_fetched());
}

#[test]
fn test_config_from_json() {
    let config = ControllerConfig::from_json(
        r#"{
            "child_key": "children",
            "section_sort": [{ "key": "outer_sort_key", "direction": "descending" }],
            "item_sort": [{ "key": "inner_sort_key" }]
        }"#,
    )
    .unwrap();
    let mut controller = Controller::new(sample(), Scope::all(), config).unwrap();
    controller.perform_fetch().unwrap();

    assert_eq!(controller.object_for_section(0).map(|p| p.id.clone()), Some(id("p2")));
}

#[test]
fn test_missing_item_sort_is_rejected() {
    let config = ControllerConfig {
        item_sort: None,
        ..config()
    };
    let err = Controller::new(sample(), Scope::all(), config).err().unwrap();
    assert!(err.is_configuration());
}

#[test]
fn test_filtered_query() {
    let store = sample();
    let request = FetchRequest::all().with_filter(|r: &Record| r.id != id("p1"));
    let mut controller = Controller::with_query(store.clone(), request, config()).unwrap();
    controller.perform_fetch().unwrap();

    assert_eq!(controller.number_of_sections(), 1);
    assert_eq!(controller.index_path_of(&id("a")), None);

    store.write().move_child(&id("a"), &id("p2")).unwrap();
    let delta = apply_pending(&mut controller, &store);
    assert_eq!(delta.inserted_items, BTreeSet::from([IndexPath::new(0, 0)]));
}

#[test]
fn test_single_parent_mode() {
    let store = sample();
    let config = ControllerConfig::builder()
        .child_key("children")
        .item_sort(SortKey::descending("inner_sort_key"))
        .build();
    let mut controller = Controller::with_parent(store.clone(), id("p1"), config).unwrap();
    controller.perform_fetch().unwrap();

    assert_eq!(controller.number_of_sections(), 1);
    assert_eq!(controller.object_at(IndexPath::new(0, 0)).map(|c| c.id.clone()), Some(id("b")));

    store.write().insert_child(&id("p2"), child("x", 0)).unwrap();
    assert!(apply_pending(&mut controller, &store).is_empty());

    store.write().move_child(&id("c"), &id("p1")).unwrap();
    let delta = apply_pending(&mut controller, &store);
    assert_eq!(delta.inserted_items, BTreeSet::from([IndexPath::new(0, 2)]));
}

#[test]
fn test_observer_receives_canonical_steps() {
    let store = sample();
    let mut controller = fetched(&store);

    let steps = Arc::new(Mutex::new(Vec::new()));
    let sink = steps.clone();
    let observer = Arc::new(Mutex::new(move |snapshot: &Snapshot<Record, Record>, delta: &Delta| {
        let mut sink = sink.lock();
        for step in delta.steps() {
            let name = match step {
                DeltaStep::DeleteSections(_) => "delete sections",
                DeltaStep::InsertSections(_) => "insert sections",
                DeltaStep::DeleteItems(_) => "delete items",
                DeltaStep::InsertItems(_) => "insert items",
            };
            sink.push((name, snapshot.section_count()));
        }
    }));
    let token = controller.register_observer(&observer);

    {
        let mut store = store.write();
        store.remove(&id("p2")).unwrap();
        store.insert_parent(parent("p0", 0));
        store.remove(&id("a")).unwrap();
        store.insert_child(&id("p1"), child("d", 0)).unwrap();
    }
    store.write().take_changes();
    controller.apply(ChangeEvent::Reload).unwrap();

    assert_eq!(
        *steps.lock(),
        vec![
            ("delete sections", 2),
            ("insert sections", 2),
            ("delete items", 2),
            ("insert items", 2),
        ]
    );

    assert!(controller.unregister_observer(token));
    controller.apply(ChangeEvent::Reload).unwrap();
    assert_eq!(steps.lock().len(), 4);
}

#[test]
fn test_dropped_observer_is_ignored() {
    let store = sample();
    let mut controller = fetched(&store);
    let calls = Arc::new(Mutex::new(0));
    let sink = calls.clone();
    let observer = Arc::new(Mutex::new(move |_: &Snapshot<Record, Record>, _: &Delta| {
        *sink.lock() += 1;
    }));
    controller.register_observer(&observer);

    controller.apply(ChangeEvent::Reload).unwrap();
    drop(observer);
    controller.apply(ChangeEvent::Reload).unwrap();

    assert_eq!(*calls.lock(), 1);
}
