//! Sort keys: ordered lists of (field, direction) comparison rules.
//!
//! Comparison is lexicographic over the descriptors and short-circuits on the
//! first field that differs. Entities equal on every field are a tie; the
//! comparator reports `Ordering::Equal` and callers keep insertion order.

use crate::entity::Entity;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sort direction for a single descriptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// One comparison rule: a field key and a direction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortDescriptor {
    pub key: String,
    #[serde(default)]
    pub direction: Direction,
}

impl SortDescriptor {
    pub fn new(key: impl Into<String>, direction: Direction) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }

    pub fn ascending(key: impl Into<String>) -> Self {
        Self::new(key, Direction::Ascending)
    }

    pub fn descending(key: impl Into<String>) -> Self {
        Self::new(key, Direction::Descending)
    }

    /// Compare two entities on this descriptor only.
    pub fn compare<E: Entity>(&self, a: &E, b: &E) -> Ordering {
        let natural = a.field(&self.key).cmp(&b.field(&self.key));
        match self.direction {
            Direction::Ascending => natural,
            Direction::Descending => natural.reverse(),
        }
    }
}

/// A non-empty, ordered list of sort descriptors.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<SortDescriptor>", into = "Vec<SortDescriptor>")]
pub struct SortKey {
    descriptors: Vec<SortDescriptor>,
}

impl SortKey {
    /// Create a sort key. Fails when `descriptors` is empty or a key is blank.
    pub fn new(descriptors: Vec<SortDescriptor>) -> Result<Self, CoreError> {
        if descriptors.is_empty() {
            return Err(CoreError::EmptySortKey);
        }
        if descriptors.iter().any(|d| d.key.is_empty()) {
            return Err(CoreError::EmptyFieldKey);
        }
        Ok(Self { descriptors })
    }

    /// Single ascending field.
    pub fn ascending(key: impl Into<String>) -> Self {
        Self {
            descriptors: vec![SortDescriptor::ascending(key)],
        }
    }

    /// Single descending field.
    pub fn descending(key: impl Into<String>) -> Self {
        Self {
            descriptors: vec![SortDescriptor::descending(key)],
        }
    }

    pub fn then_ascending(mut self, key: impl Into<String>) -> Self {
        self.descriptors.push(SortDescriptor::ascending(key));
        self
    }

    pub fn then_descending(mut self, key: impl Into<String>) -> Self {
        self.descriptors.push(SortDescriptor::descending(key));
        self
    }

    pub fn descriptors(&self) -> &[SortDescriptor] {
        &self.descriptors
    }

    /// Compare two entities, field by field.
    pub fn compare<E: Entity>(&self, a: &E, b: &E) -> Ordering {
        for descriptor in &self.descriptors {
            match descriptor.compare(a, b) {
                Ordering::Equal => continue,
                decided => return decided,
            }
        }
        Ordering::Equal
    }

    /// Stable sort in place; ties keep their relative order.
    pub fn sort<E: Entity>(&self, entities: &mut [E]) {
        entities.sort_by(|a, b| self.compare(a, b));
    }
}

impl TryFrom<Vec<SortDescriptor>> for SortKey {
    type Error = CoreError;

    fn try_from(descriptors: Vec<SortDescriptor>) -> Result<Self, Self::Error> {
        SortKey::new(descriptors)
    }
}

impl From<SortKey> for Vec<SortDescriptor> {
    fn from(key: SortKey) -> Self {
        key.descriptors
    }
}
