//! Tiered Controller - a hierarchical results controller
//!
//! The controller sits between a mutable data source and a list or grid
//! view. It keeps the view's two-level layout (one section per parent, the
//! parent's children as items) and, whenever the data changes, reports the
//! section and item insertions and deletions the view has to animate.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tiered_controller::prelude::*;
//!
//! let config = ControllerConfig::builder()
//!     .child_key("tasks")
//!     .section_sort(SortKey::ascending("name"))
//!     .item_sort(SortKey::descending("priority").then_ascending("title"))
//!     .build();
//!
//! let mut controller = Controller::new(store, Scope::all(), config)?;
//!
//! let view = Arc::new(Mutex::new(move |snapshot: &Snapshot<_, _>, delta: &Delta| {
//!     for step in delta.steps() {
//!         table.apply(step);
//!     }
//! }));
//! controller.register_observer(&view);
//!
//! controller.perform_fetch()?;
//! controller.apply(ChangeEvent::Children(vec![task_id]))?;
//! ```
//!
//! # Architecture
//!
//! - [`source`] - The [`DataSource`] trait, fetch requests, scopes and change events
//! - [`config`] - Controller configuration and its builder
//! - [`controller`] - Full and incremental passes, lookups
//! - [`observer`] - Weakly held observer and token-based registration
//! - [`shared`] - Lock-guarded handle for use across threads
//! - [`error`] - Error types

pub mod config;
pub mod controller;
pub mod error;
pub mod observer;
pub mod shared;
pub mod source;

pub use config::{ControllerConfig, ControllerConfigBuilder};
pub use controller::Controller;
pub use error::{ControllerError, Result};
pub use observer::{ChangeNotifier, ObserverToken, ResultsObserver};
pub use shared::SharedController;
pub use source::{ChangeEvent, ChildId, DataSource, FetchRequest, Filter, ParentId, Scope};

// Re-export the view types so most users only depend on this crate.
pub use tiered_core::{Entity, FieldValue, IndexPath, Section, Snapshot, SortKey};
pub use tiered_delta::{Delta, DeltaStep};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::ControllerConfig;
    pub use crate::controller::Controller;
    pub use crate::error::ControllerError;
    pub use crate::observer::ResultsObserver;
    pub use crate::shared::SharedController;
    pub use crate::source::{ChangeEvent, DataSource, FetchRequest, Scope};
    pub use tiered_core::{Entity, FieldValue, IndexPath, Snapshot, SortKey};
    pub use tiered_delta::{Delta, DeltaStep};
}
