//! Memory Store - an in-memory parent/child record store.
//!
//! Provides:
//! - Parent and child records with keyed field values
//! - One named parent -> children relationship
//! - A pending change log that converts into controller events
//! - An availability switch for exercising failure handling

use crate::error::{Result, StoreError};
use crate::record::{Record, RecordId, RecordKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tiered_controller::{ChangeEvent, DataSource, FetchRequest};
use tiered_core::FieldValue;

/// Relationship name used by [`MemoryStore::new`].
pub const DEFAULT_RELATIONSHIP: &str = "children";

/// A change to the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreChange {
    /// A record was inserted.
    Insert { id: RecordId, kind: RecordKind },
    /// A field of a record was set.
    Update {
        id: RecordId,
        kind: RecordKind,
        key: String,
    },
    /// A child moved to another parent.
    Move {
        id: RecordId,
        from: RecordId,
        to: RecordId,
    },
    /// A record was removed.
    Remove { id: RecordId, kind: RecordKind },
}

impl StoreChange {
    pub fn id(&self) -> &RecordId {
        match self {
            StoreChange::Insert { id, .. }
            | StoreChange::Update { id, .. }
            | StoreChange::Move { id, .. }
            | StoreChange::Remove { id, .. } => id,
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            StoreChange::Insert { kind, .. }
            | StoreChange::Update { kind, .. }
            | StoreChange::Remove { kind, .. } => *kind,
            StoreChange::Move { .. } => RecordKind::Child,
        }
    }

    /// The controller event for this single change.
    pub fn into_event(self) -> ChangeEvent<RecordId, RecordId> {
        let kind = self.kind();
        let id = match self {
            StoreChange::Insert { id, .. }
            | StoreChange::Update { id, .. }
            | StoreChange::Move { id, .. }
            | StoreChange::Remove { id, .. } => id,
        };
        match kind {
            RecordKind::Parent => ChangeEvent::Parents(vec![id]),
            RecordKind::Child => ChangeEvent::Children(vec![id]),
        }
    }

    /// Fold a batch of changes into one event naming every touched parent
    /// and child, so the batch is reconciled in a single pass. Ids keep the
    /// order they were first changed in; `None` for an empty batch.
    pub fn coalesce(
        changes: impl IntoIterator<Item = StoreChange>,
    ) -> Option<ChangeEvent<RecordId, RecordId>> {
        let mut seen = HashSet::new();
        let mut parents = Vec::new();
        let mut children = Vec::new();

        for change in changes {
            let kind = change.kind();
            let id = change.id().clone();
            if !seen.insert((id.clone(), kind)) {
                continue;
            }
            match kind {
                RecordKind::Parent => parents.push(id),
                RecordKind::Child => children.push(id),
            }
        }

        ChangeEvent::scoped(parents, children)
    }
}

/// An in-memory store of parent and child records.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    /// Name of the parent -> children relationship.
    relationship: String,
    /// All records indexed by ID.
    records: BTreeMap<RecordId, Record>,
    /// Parent -> child ids.
    children: BTreeMap<RecordId, BTreeSet<RecordId>>,
    /// Pending changes for the controller.
    pending_changes: Vec<StoreChange>,
    unavailable: bool,
}

impl MemoryStore {
    /// Create an empty store using [`DEFAULT_RELATIONSHIP`].
    pub fn new() -> Self {
        Self::with_relationship(DEFAULT_RELATIONSHIP)
    }

    pub fn with_relationship(relationship: impl Into<String>) -> Self {
        Self {
            relationship: relationship.into(),
            records: BTreeMap::new(),
            children: BTreeMap::new(),
            pending_changes: Vec::new(),
            unavailable: false,
        }
    }

    pub fn relationship(&self) -> &str {
        &self.relationship
    }

    // === Record CRUD ===

    /// Insert a parent record, replacing any record with the same id.
    pub fn insert_parent(&mut self, mut record: Record) -> RecordId {
        record.kind = RecordKind::Parent;
        record.owner = None;
        let id = record.id.clone();

        if let Some(previous) = self.records.insert(id.clone(), record) {
            self.unlink(&previous);
            if !previous.is_parent() {
                tracing::trace!(id = %id, "child record replaced by a parent");
                self.pending_changes.push(StoreChange::Remove {
                    id: id.clone(),
                    kind: RecordKind::Child,
                });
            }
        }
        self.children.entry(id.clone()).or_default();
        self.pending_changes.push(StoreChange::Insert {
            id: id.clone(),
            kind: RecordKind::Parent,
        });

        id
    }

    /// Insert a child record owned by `parent`, replacing any child with the
    /// same id.
    pub fn insert_child(&mut self, parent: &RecordId, mut record: Record) -> Result<RecordId> {
        self.expect_parent(parent)?;
        if self.records.get(&record.id).map_or(false, Record::is_parent) {
            return Err(StoreError::NotAChild(record.id));
        }
        record.kind = RecordKind::Child;
        record.owner = Some(parent.clone());
        let id = record.id.clone();

        if let Some(previous) = self.records.insert(id.clone(), record) {
            self.unlink(&previous);
        }
        self.children.entry(parent.clone()).or_default().insert(id.clone());
        self.pending_changes.push(StoreChange::Insert {
            id: id.clone(),
            kind: RecordKind::Child,
        });

        Ok(id)
    }

    /// Set a field on a record.
    pub fn set_field(
        &mut self,
        id: &RecordId,
        key: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Result<()> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let key = key.into();
        record.fields.insert(key.clone(), value.into());

        self.pending_changes.push(StoreChange::Update {
            id: id.clone(),
            kind: record.kind,
            key,
        });
        Ok(())
    }

    /// Move a child under another parent.
    pub fn move_child(&mut self, child: &RecordId, to: &RecordId) -> Result<()> {
        self.expect_parent(to)?;
        let record = self
            .records
            .get_mut(child)
            .ok_or_else(|| StoreError::NotFound(child.clone()))?;
        let from = match (&record.kind, &record.owner) {
            (RecordKind::Child, Some(owner)) => owner.clone(),
            _ => return Err(StoreError::NotAChild(child.clone())),
        };
        if &from == to {
            return Ok(());
        }
        record.owner = Some(to.clone());

        if let Some(ids) = self.children.get_mut(&from) {
            ids.remove(child);
        }
        self.children.entry(to.clone()).or_default().insert(child.clone());
        self.pending_changes.push(StoreChange::Move {
            id: child.clone(),
            from,
            to: to.clone(),
        });
        Ok(())
    }

    /// Remove a record. Removing a parent removes its children too.
    pub fn remove(&mut self, id: &RecordId) -> Result<Record> {
        let record = self
            .records
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        self.unlink(&record);

        if record.is_parent() {
            let orphans = self.children.remove(id).unwrap_or_default();
            tracing::trace!(parent = %id, children = orphans.len(), "removing parent with children");
            for child in orphans {
                self.records.remove(&child);
                self.pending_changes.push(StoreChange::Remove {
                    id: child,
                    kind: RecordKind::Child,
                });
            }
        }

        self.pending_changes.push(StoreChange::Remove {
            id: id.clone(),
            kind: record.kind,
        });
        Ok(record)
    }

    fn unlink(&mut self, record: &Record) {
        if let Some(owner) = &record.owner {
            if let Some(ids) = self.children.get_mut(owner) {
                ids.remove(&record.id);
            }
        }
    }

    fn expect_parent(&self, id: &RecordId) -> Result<()> {
        match self.records.get(id) {
            Some(record) if record.is_parent() => Ok(()),
            Some(_) => Err(StoreError::NotAParent(id.clone())),
            None => Err(StoreError::NotFound(id.clone())),
        }
    }

    // === Queries ===

    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.records.contains_key(id)
    }

    /// Number of records of both kinds.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn parent_ids(&self) -> impl Iterator<Item = &RecordId> + '_ {
        self.children.keys()
    }

    pub fn child_ids(&self, parent: &RecordId) -> impl Iterator<Item = &RecordId> + '_ {
        self.children.get(parent).into_iter().flatten()
    }

    /// All child ids, in id order.
    pub fn all_child_ids(&self) -> impl Iterator<Item = &RecordId> + '_ {
        self.children.values().flatten()
    }

    // === Changes ===

    /// Take pending changes.
    pub fn take_changes(&mut self) -> Vec<StoreChange> {
        std::mem::take(&mut self.pending_changes)
    }

    /// Take pending changes as one coalesced controller event.
    pub fn take_event(&mut self) -> Option<ChangeEvent<RecordId, RecordId>> {
        StoreChange::coalesce(self.take_changes())
    }

    /// Make every read fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable {
            Err(StoreError::Unavailable)
        } else {
            Ok(())
        }
    }

    fn check_relationship(&self, relationship: &str) -> Result<()> {
        if relationship == self.relationship {
            Ok(())
        } else {
            Err(StoreError::UnknownRelationship(relationship.to_string()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DataSource for MemoryStore {
    type Parent = Record;
    type Child = Record;
    type Error = StoreError;

    fn fetch_parents(&self, request: &FetchRequest<Record>) -> Result<Vec<Record>> {
        self.check_available()?;
        Ok(self
            .children
            .keys()
            .filter_map(|id| self.records.get(id))
            .filter(|r| r.is_parent() && request.matches(r))
            .cloned()
            .collect())
    }

    fn fetch_parent(&self, id: &RecordId) -> Result<Option<Record>> {
        self.check_available()?;
        Ok(self.records.get(id).filter(|r| r.is_parent()).cloned())
    }

    fn fetch_children(&self, parent: &Record, relationship: &str) -> Result<Vec<Record>> {
        self.check_available()?;
        self.check_relationship(relationship)?;
        Ok(self
            .child_ids(&parent.id)
            .filter_map(|id| self.records.get(id))
            .cloned()
            .collect())
    }

    fn owners_of(&self, child: &RecordId, relationship: &str) -> Result<Vec<RecordId>> {
        self.check_available()?;
        self.check_relationship(relationship)?;
        Ok(self
            .records
            .get(child)
            .and_then(|r| r.owner.clone())
            .into_iter()
            .collect())
    }
}
