//! # tiered-store
//!
//! An in-memory record store implementing
//! [`DataSource`](tiered_controller::DataSource).
//!
//! It is the reference source for tests and the stress driver: records carry
//! keyed [`FieldValue`](tiered_core::FieldValue)s, every mutation is logged
//! as a [`StoreChange`], and pending changes coalesce into the
//! [`ChangeEvent`](tiered_controller::ChangeEvent) a controller consumes.
//!
//! ```rust,ignore
//! let mut store = MemoryStore::new();
//! let inbox = store.insert_parent(Record::parent().with_field("name", "Inbox"));
//! store.insert_child(&inbox, Record::child().with_field("title", "Reply"))?;
//!
//! if let Some(event) = store.take_event() {
//!     controller.apply(event)?;
//! }
//! ```

pub mod error;
pub mod record;
pub mod store;

pub use error::{Result, StoreError};
pub use record::{Record, RecordId, RecordKind};
pub use store::{MemoryStore, StoreChange, DEFAULT_RELATIONSHIP};
