//! Delivery of deltas to the presentation layer.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tiered_core::{Entity, Snapshot};
use tiered_delta::Delta;

/// Receives the outcome of every successful pass.
///
/// `snapshot` is the newly installed snapshot. Apply `delta` in the order
/// given by [`Delta::steps`]: deleted sections, inserted sections, deleted
/// items, inserted items. Deleted coordinates address the previous snapshot,
/// inserted ones address `snapshot`.
pub trait ResultsObserver<P: Entity, C: Entity> {
    fn controller_did_update(&mut self, snapshot: &Snapshot<P, C>, delta: &Delta);
}

impl<P, C, F> ResultsObserver<P, C> for F
where
    P: Entity,
    C: Entity,
    F: FnMut(&Snapshot<P, C>, &Delta),
{
    fn controller_did_update(&mut self, snapshot: &Snapshot<P, C>, delta: &Delta) {
        self(snapshot, delta)
    }
}

/// Handle returned by registration, needed to unregister.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverToken(u64);

type WeakObserver<P, C> = Weak<Mutex<dyn ResultsObserver<P, C> + Send>>;

/// Holds at most one observer, weakly.
///
/// The caller keeps the observer alive. Once its last `Arc` is dropped,
/// notifications are skipped silently.
pub struct ChangeNotifier<P: Entity, C: Entity> {
    current: Option<(ObserverToken, WeakObserver<P, C>)>,
    next_token: u64,
}

impl<P: Entity, C: Entity> ChangeNotifier<P, C> {
    pub fn new() -> Self {
        Self {
            current: None,
            next_token: 0,
        }
    }

    /// Register `observer`, replacing any previous one.
    pub fn register<O>(&mut self, observer: &Arc<Mutex<O>>) -> ObserverToken
    where
        O: ResultsObserver<P, C> + Send + 'static,
    {
        let shared: Arc<Mutex<dyn ResultsObserver<P, C> + Send>> = observer.clone();
        self.next_token += 1;
        let token = ObserverToken(self.next_token);
        self.current = Some((token, Arc::downgrade(&shared)));
        token
    }

    /// Remove the observer registered under `token`. Stale tokens are a no-op;
    /// returns whether anything was removed.
    pub fn unregister(&mut self, token: ObserverToken) -> bool {
        match &self.current {
            Some((current, _)) if *current == token => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    /// Whether an observer is registered and still alive.
    pub fn is_registered(&self) -> bool {
        self.current
            .as_ref()
            .map_or(false, |(_, weak)| weak.strong_count() > 0)
    }

    /// Call the observer, if any. Returns whether it was called.
    pub fn notify(&mut self, snapshot: &Snapshot<P, C>, delta: &Delta) -> bool {
        let Some((_, weak)) = &self.current else {
            return false;
        };
        match weak.upgrade() {
            Some(observer) => {
                observer.lock().controller_did_update(snapshot, delta);
                true
            }
            None => {
                tracing::trace!("observer dropped, clearing registration");
                self.current = None;
                false
            }
        }
    }
}

impl<P: Entity, C: Entity> Default for ChangeNotifier<P, C> {
    fn default() -> Self {
        Self::new()
    }
}
