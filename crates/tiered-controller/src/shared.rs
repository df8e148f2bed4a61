//! Thread-safe handle around a controller.

use crate::controller::Controller;
use crate::error::Result;
use crate::observer::{ObserverToken, ResultsObserver};
use crate::source::{ChangeEvent, ChildId, DataSource, ParentId};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use std::sync::Arc;
use tiered_core::Snapshot;
use tiered_delta::Delta;

/// A cloneable handle that serializes passes across threads.
///
/// Passes take the write lock, so at most one runs at a time. Readers see
/// either the snapshot before a pass or the one after it, never a mix.
pub struct SharedController<S: DataSource> {
    inner: Arc<RwLock<Controller<S>>>,
}

impl<S: DataSource> SharedController<S> {
    pub fn new(controller: Controller<S>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(controller)),
        }
    }

    pub fn perform_fetch(&self) -> Result<Delta> {
        self.inner.write().perform_fetch()
    }

    pub fn apply(&self, event: ChangeEvent<ParentId<S>, ChildId<S>>) -> Result<Delta> {
        self.inner.write().apply(event)
    }

    /// Read access for lookups. Holding the guard blocks passes.
    pub fn read(&self) -> RwLockReadGuard<'_, Controller<S>> {
        self.inner.read()
    }

    /// The current snapshot, detached from the lock.
    pub fn snapshot(&self) -> Arc<Snapshot<S::Parent, S::Child>> {
        self.inner.read().snapshot()
    }

    /// Register the observer for every pass made through this handle.
    ///
    /// The observer runs while the write lock is held. It must read the
    /// `snapshot` it is given; calling [`read`](Self::read), [`snapshot`](Self::snapshot)
    /// or a pass on this handle from inside the callback deadlocks.
    pub fn register_observer<O>(&self, observer: &Arc<Mutex<O>>) -> ObserverToken
    where
        O: ResultsObserver<S::Parent, S::Child> + Send + 'static,
    {
        self.inner.write().register_observer(observer)
    }

    pub fn unregister_observer(&self, token: ObserverToken) -> bool {
        self.inner.write().unregister_observer(token)
    }

    /// Run `f` with exclusive access, e.g. to mutate an owned source.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Controller<S>) -> R) -> R {
        f(&mut self.inner.write())
    }
}

impl<S: DataSource> Clone for SharedController<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: DataSource> From<Controller<S>> for SharedController<S> {
    fn from(controller: Controller<S>) -> Self {
        Self::new(controller)
    }
}
