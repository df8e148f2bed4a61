//! Tiered Delta - structural differences between snapshots
//!
//! This crate computes the minimal set of section and item insertions and
//! deletions that turn one [`Snapshot`](tiered_core::Snapshot) into another.
//!
//! ## Identity, not position
//!
//! Sections are matched by parent identity and items by child identity. An
//! entity that only moved produces no entry at all: consumers keep the
//! element they already display.
//!
//! ## Canonical apply order
//!
//! ```text
//! 1. delete sections   (old coordinates)
//! 2. insert sections   (new coordinates)
//! 3. delete items      (old coordinates)
//! 4. insert items      (new coordinates)
//! ```
//!
//! Item entries only ever refer to sections present in both snapshots.
//!
//! # Example
//!
//! ```rust,ignore
//! use tiered_delta::{reconcile, DeltaStep};
//!
//! let delta = reconcile(Some(&old), &new);
//! for step in delta.steps() {
//!     match step {
//!         DeltaStep::DeleteSections(s) => view.delete_sections(s),
//!         DeltaStep::InsertSections(s) => view.insert_sections(s),
//!         DeltaStep::DeleteItems(p) => view.delete_items(p),
//!         DeltaStep::InsertItems(p) => view.insert_items(p),
//!     }
//! }
//! ```

pub mod delta;
pub mod diff;

pub use delta::{Delta, DeltaStep};
pub use diff::{diff, reconcile};
