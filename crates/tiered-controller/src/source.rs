//! The data source seam and the events it emits.
//!
//! The controller never owns data. It asks a [`DataSource`] for parents
//! matching its scope and for the children of each parent, and it learns
//! about changes through [`ChangeEvent`] values handed to
//! [`Controller::apply`](crate::Controller::apply).

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tiered_core::{Entity, SortKey};

/// A store of parent and child entities.
///
/// `fetch_children` resolves the configured relationship for one parent.
/// `owners_of` is the reverse direction, used by incremental passes to find
/// sections a changed child has just joined.
pub trait DataSource {
    type Parent: Entity;
    type Child: Entity;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Every parent matching the request. Order is irrelevant.
    fn fetch_parents(
        &self,
        request: &FetchRequest<Self::Parent>,
    ) -> Result<Vec<Self::Parent>, Self::Error>;

    /// A single parent by identity, `None` if it no longer exists.
    fn fetch_parent(
        &self,
        id: &<Self::Parent as Entity>::Id,
    ) -> Result<Option<Self::Parent>, Self::Error>;

    /// The children reached from `parent` through `relationship`.
    fn fetch_children(
        &self,
        parent: &Self::Parent,
        relationship: &str,
    ) -> Result<Vec<Self::Child>, Self::Error>;

    /// Parents currently related to `child` through `relationship`.
    fn owners_of(
        &self,
        child: &<Self::Child as Entity>::Id,
        relationship: &str,
    ) -> Result<Vec<<Self::Parent as Entity>::Id>, Self::Error>;
}

/// Parent identity type of a source.
pub type ParentId<S> = <<S as DataSource>::Parent as Entity>::Id;

/// Child identity type of a source.
pub type ChildId<S> = <<S as DataSource>::Child as Entity>::Id;

impl<T: DataSource + ?Sized> DataSource for Arc<T> {
    type Parent = T::Parent;
    type Child = T::Child;
    type Error = T::Error;

    fn fetch_parents(&self, request: &FetchRequest<T::Parent>) -> Result<Vec<T::Parent>, T::Error> {
        (**self).fetch_parents(request)
    }

    fn fetch_parent(&self, id: &<T::Parent as Entity>::Id) -> Result<Option<T::Parent>, T::Error> {
        (**self).fetch_parent(id)
    }

    fn fetch_children(&self, parent: &T::Parent, relationship: &str) -> Result<Vec<T::Child>, T::Error> {
        (**self).fetch_children(parent, relationship)
    }

    fn owners_of(
        &self,
        child: &<T::Child as Entity>::Id,
        relationship: &str,
    ) -> Result<Vec<<T::Parent as Entity>::Id>, T::Error> {
        (**self).owners_of(child, relationship)
    }
}

/// A lock-guarded source reads under the shared lock, so writers can keep
/// mutating it between passes.
impl<T: DataSource> DataSource for RwLock<T> {
    type Parent = T::Parent;
    type Child = T::Child;
    type Error = T::Error;

    fn fetch_parents(&self, request: &FetchRequest<T::Parent>) -> Result<Vec<T::Parent>, T::Error> {
        self.read().fetch_parents(request)
    }

    fn fetch_parent(&self, id: &<T::Parent as Entity>::Id) -> Result<Option<T::Parent>, T::Error> {
        self.read().fetch_parent(id)
    }

    fn fetch_children(&self, parent: &T::Parent, relationship: &str) -> Result<Vec<T::Child>, T::Error> {
        self.read().fetch_children(parent, relationship)
    }

    fn owners_of(
        &self,
        child: &<T::Child as Entity>::Id,
        relationship: &str,
    ) -> Result<Vec<<T::Parent as Entity>::Id>, T::Error> {
        self.read().owners_of(child, relationship)
    }
}

/// Predicate over parents.
pub type Filter<P> = Arc<dyn Fn(&P) -> bool + Send + Sync>;

/// Which parents a query controller shows.
///
/// The controller re-checks `matches` itself when a parent changes, so a
/// source may ignore the filter and return a superset.
pub struct FetchRequest<P> {
    filter: Option<Filter<P>>,
    sort_key: Option<SortKey>,
}

impl<P> FetchRequest<P> {
    /// Every parent in the source.
    pub fn all() -> Self {
        Self {
            filter: None,
            sort_key: None,
        }
    }

    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&P) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Attach the section order. Sources may use it as a hint.
    pub fn with_sort_key(mut self, sort_key: SortKey) -> Self {
        self.sort_key = Some(sort_key);
        self
    }

    pub fn matches(&self, parent: &P) -> bool {
        self.filter.as_ref().map_or(true, |f| f(parent))
    }

    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    pub fn sort_key(&self) -> Option<&SortKey> {
        self.sort_key.as_ref()
    }
}

impl<P> Default for FetchRequest<P> {
    fn default() -> Self {
        Self::all()
    }
}

impl<P> Clone for FetchRequest<P> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            sort_key: self.sort_key.clone(),
        }
    }
}

impl<P> fmt::Debug for FetchRequest<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchRequest")
            .field("filtered", &self.filter.is_some())
            .field("sort_key", &self.sort_key)
            .finish()
    }
}

/// The root of the view.
pub enum Scope<P: Entity> {
    /// One section per parent matching the request.
    Query(FetchRequest<P>),
    /// Exactly one section, for this parent.
    Single(P::Id),
}

impl<P: Entity> Scope<P> {
    pub fn all() -> Self {
        Scope::Query(FetchRequest::all())
    }

    pub fn is_single(&self) -> bool {
        matches!(self, Scope::Single(_))
    }
}

impl<P: Entity> Clone for Scope<P> {
    fn clone(&self) -> Self {
        match self {
            Scope::Query(request) => Scope::Query(request.clone()),
            Scope::Single(id) => Scope::Single(id.clone()),
        }
    }
}

impl<P: Entity> fmt::Debug for Scope<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Query(request) => f.debug_tuple("Query").field(request).finish(),
            Scope::Single(id) => f.debug_tuple("Single").field(id).finish(),
        }
    }
}

/// A change notification from the data source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeEvent<PId, CId> {
    /// Anything may have changed; rebuild from scratch.
    Reload,
    /// These parents were inserted, updated or removed.
    Parents(Vec<PId>),
    /// These children were inserted, updated, removed or re-parented.
    Children(Vec<CId>),
    /// One batch touching both levels, reconciled in a single pass.
    Scoped { parents: Vec<PId>, children: Vec<CId> },
}

impl<PId, CId> ChangeEvent<PId, CId> {
    /// The narrowest event naming `parents` and `children`, `None` when both
    /// are empty.
    pub fn scoped(parents: Vec<PId>, children: Vec<CId>) -> Option<Self> {
        match (parents.is_empty(), children.is_empty()) {
            (true, true) => None,
            (false, true) => Some(ChangeEvent::Parents(parents)),
            (true, false) => Some(ChangeEvent::Children(children)),
            (false, false) => Some(ChangeEvent::Scoped { parents, children }),
        }
    }

    pub fn is_reload(&self) -> bool {
        matches!(self, ChangeEvent::Reload)
    }

    /// Number of identities named by the event; zero for `Reload`.
    pub fn len(&self) -> usize {
        match self {
            ChangeEvent::Reload => 0,
            ChangeEvent::Parents(ids) => ids.len(),
            ChangeEvent::Children(ids) => ids.len(),
            ChangeEvent::Scoped { parents, children } => parents.len() + children.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.is_reload() && self.len() == 0
    }
}
