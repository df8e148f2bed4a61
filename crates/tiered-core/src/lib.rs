//! # tiered-core
//!
//! Building blocks for a two-level hierarchical view (sections containing
//! ordered items) over an external dataset.
//!
//! This crate provides:
//! - [`Entity`]: the capability a domain object exposes (stable identity plus keyed fields)
//! - [`SortKey`]: lexicographic, direction-aware comparison over entity fields
//! - [`Section`]: one parent entity with its deduplicated, sorted children
//! - [`Snapshot`]: an immutable, ordered materialization of all sections
//!
//! ## Example
//!
//! ```rust,ignore
//! use tiered_core::{Section, Snapshot, SortKey};
//!
//! let item_sort = SortKey::ascending("title");
//! let section_sort = SortKey::descending("priority");
//!
//! let section = Section::build(project, tasks, &item_sort);
//! let snapshot = Snapshot::build(vec![section], &section_sort);
//!
//! assert_eq!(snapshot.section_count(), 1);
//! ```

pub mod entity;
pub mod error;
pub mod field;
pub mod section;
pub mod snapshot;
pub mod sort;

pub use entity::Entity;
pub use error::{CoreError, Result};
pub use field::FieldValue;
pub use section::Section;
pub use snapshot::{IndexPath, Snapshot};
pub use sort::{Direction, SortDescriptor, SortKey};
