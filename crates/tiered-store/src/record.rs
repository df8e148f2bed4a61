//! Records held by the in-memory store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tiered_core::{Entity, FieldValue};
use ulid::Ulid;

/// Unique identifier for a record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self::from_string(s)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Which level of the hierarchy a record lives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Parent,
    Child,
}

/// A record with string-keyed field values.
///
/// The reserved field `"id"` reads the record id as text, so sort keys can
/// use it as a final tie-break.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub kind: RecordKind,
    pub fields: BTreeMap<String, FieldValue>,
    /// Owning parent, for child records.
    pub owner: Option<RecordId>,
}

impl Record {
    fn new(kind: RecordKind) -> Self {
        Self {
            id: RecordId::new(),
            kind,
            fields: BTreeMap::new(),
            owner: None,
        }
    }

    /// A parent record with a fresh id.
    pub fn parent() -> Self {
        Self::new(RecordKind::Parent)
    }

    /// A child record with a fresh id. The owner is set on insertion.
    pub fn child() -> Self {
        Self::new(RecordKind::Child)
    }

    pub fn with_id(mut self, id: impl Into<RecordId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn is_parent(&self) -> bool {
        self.kind == RecordKind::Parent
    }
}

impl Entity for Record {
    type Id = RecordId;

    fn id(&self) -> RecordId {
        self.id.clone()
    }

    fn field(&self, key: &str) -> FieldValue {
        match key {
            "id" => FieldValue::Text(self.id.0.clone()),
            _ => self.fields.get(key).cloned().unwrap_or_default(),
        }
    }
}
