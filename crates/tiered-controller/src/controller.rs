//! The reconciliation engine.
//!
//! A [`Controller`] owns a data source, a scope and exactly one current
//! [`Snapshot`]. Each pass builds the next snapshot, either from scratch or
//! by rebuilding only the sections an event touches, diffs it against the
//! current one and installs it.

use crate::config::ControllerConfig;
use crate::error::{ControllerError, Result};
use crate::observer::{ChangeNotifier, ObserverToken, ResultsObserver};
use crate::source::{ChangeEvent, ChildId, DataSource, FetchRequest, ParentId, Scope};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tiered_core::{IndexPath, Section, Snapshot, SortKey};
use tiered_delta::{reconcile, Delta};

type SnapshotOf<S> = Snapshot<<S as DataSource>::Parent, <S as DataSource>::Child>;
type SectionOf<S> = Section<<S as DataSource>::Parent, <S as DataSource>::Child>;

enum Mode<S: DataSource> {
    Query {
        request: FetchRequest<S::Parent>,
        section_sort: SortKey,
    },
    Single(ParentId<S>),
}

/// Keeps a two-level view of a [`DataSource`] and reports how it changes.
///
/// # Example
///
/// ```rust,ignore
/// use tiered_controller::{ChangeEvent, Controller, ControllerConfig, Scope};
///
/// let config = ControllerConfig::builder()
///     .child_key("tasks")
///     .section_sort(SortKey::ascending("name"))
///     .item_sort(SortKey::descending("priority"))
///     .build();
///
/// let mut controller = Controller::new(store, Scope::all(), config)?;
/// controller.perform_fetch()?;
///
/// let delta = controller.apply(ChangeEvent::Children(vec![task_id]))?;
/// ```
pub struct Controller<S: DataSource> {
    source: S,
    mode: Mode<S>,
    config: ControllerConfig,
    item_sort: SortKey,
    current: Option<Arc<SnapshotOf<S>>>,
    notifier: ChangeNotifier<S::Parent, S::Child>,
    passes: u64,
}

impl<S: DataSource> Controller<S> {
    /// Create a controller. Nothing is fetched until the first pass.
    pub fn new(source: S, scope: Scope<S::Parent>, config: ControllerConfig) -> Result<Self> {
        config.validate(!scope.is_single())?;
        let item_sort = required(&config.item_sort, "item_sort")?;

        let mode = match scope {
            Scope::Query(request) => {
                let section_sort = required(&config.section_sort, "section_sort")?;
                let request = match request.sort_key() {
                    Some(_) => request,
                    None => request.with_sort_key(section_sort.clone()),
                };
                Mode::Query {
                    request,
                    section_sort,
                }
            }
            Scope::Single(id) => Mode::Single(id),
        };

        Ok(Self {
            source,
            mode,
            config,
            item_sort,
            current: None,
            notifier: ChangeNotifier::new(),
            passes: 0,
        })
    }

    /// A controller over every parent matching `request`.
    pub fn with_query(
        source: S,
        request: FetchRequest<S::Parent>,
        config: ControllerConfig,
    ) -> Result<Self> {
        Self::new(source, Scope::Query(request), config)
    }

    /// A controller showing one section for `parent`.
    pub fn with_parent(source: S, parent: ParentId<S>, config: ControllerConfig) -> Result<Self> {
        Self::new(source, Scope::Single(parent), config)
    }

    // === Passes ===

    /// Build the view from scratch. The first pass is the baseline and
    /// reports an empty delta.
    pub fn perform_fetch(&mut self) -> Result<Delta> {
        self.apply(ChangeEvent::Reload)
    }

    /// Run one pass for `event` and return the delta it produced.
    ///
    /// On error the current snapshot is left exactly as it was and the
    /// observer is not called.
    pub fn apply(&mut self, event: ChangeEvent<ParentId<S>, ChildId<S>>) -> Result<Delta> {
        let next = match (self.current.clone(), event) {
            (None, _) | (_, ChangeEvent::Reload) => self.build_full(),
            (Some(current), ChangeEvent::Parents(ids)) => self.rebuild(&current, ids),
            (Some(current), ChangeEvent::Children(ids)) => self
                .owners_of_children(&current, &ids)
                .and_then(|parents| self.rebuild(&current, parents)),
            (Some(current), ChangeEvent::Scoped { parents, children }) => self
                .owners_of_children(&current, &children)
                .and_then(|owners| {
                    let affected = parents.into_iter().chain(owners).collect();
                    self.rebuild(&current, affected)
                }),
        };

        match next {
            Ok(snapshot) => Ok(self.install(snapshot)),
            Err(err) => {
                tracing::warn!(pass = self.passes + 1, error = %err, "pass failed, keeping current snapshot");
                Err(err)
            }
        }
    }

    fn build_full(&self) -> Result<SnapshotOf<S>> {
        match &self.mode {
            Mode::Query {
                request,
                section_sort,
            } => {
                let parents = self
                    .source
                    .fetch_parents(request)
                    .map_err(ControllerError::data_source)?;
                let sections = parents
                    .into_iter()
                    .filter(|p| request.matches(p))
                    .map(|p| self.build_section(p))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Snapshot::build(sections, section_sort))
            }
            Mode::Single(id) => Ok(Snapshot::from_ordered(self.single_section(id)?)),
        }
    }

    /// Rebuild only the sections for `affected`, sharing every other section
    /// with `current`.
    fn rebuild(&self, current: &SnapshotOf<S>, affected: Vec<ParentId<S>>) -> Result<SnapshotOf<S>> {
        let mut seen = HashSet::with_capacity(affected.len());
        let affected: Vec<_> = affected.into_iter().filter(|id| seen.insert(id.clone())).collect();

        match &self.mode {
            Mode::Query {
                request,
                section_sort,
            } => {
                let mut rebuilt = Vec::with_capacity(affected.len());
                for id in &affected {
                    let parent = self
                        .source
                        .fetch_parent(id)
                        .map_err(ControllerError::data_source)?;
                    match parent {
                        Some(parent) if request.matches(&parent) => {
                            rebuilt.push(self.build_section(parent)?);
                        }
                        _ => tracing::trace!(parent = ?id, "parent left the scope"),
                    }
                }
                Ok(current.replace_sections(&seen, rebuilt, section_sort))
            }
            Mode::Single(id) if seen.contains(id) => {
                Ok(Snapshot::from_ordered(self.single_section(id)?))
            }
            Mode::Single(_) => Ok(current.clone()),
        }
    }

    /// Parents whose sections may change because `children` changed: the
    /// sections holding them now plus the parents the source relates them to.
    fn owners_of_children(
        &self,
        current: &SnapshotOf<S>,
        children: &[ChildId<S>],
    ) -> Result<Vec<ParentId<S>>> {
        let mut parents = Vec::new();
        for child in children {
            for path in current.index_paths_of(child) {
                if let Some(parent) = current.section(path.section) {
                    parents.push(parent.parent_id());
                }
            }
            let owners = self
                .source
                .owners_of(child, &self.config.child_key)
                .map_err(ControllerError::data_source)?;
            parents.extend(owners);
        }
        Ok(parents)
    }

    fn single_section(&self, id: &ParentId<S>) -> Result<Option<SectionOf<S>>> {
        let parent = self
            .source
            .fetch_parent(id)
            .map_err(ControllerError::data_source)?;
        parent.map(|p| self.build_section(p)).transpose()
    }

    fn build_section(&self, parent: S::Parent) -> Result<SectionOf<S>> {
        let children = self
            .source
            .fetch_children(&parent, &self.config.child_key)
            .map_err(ControllerError::data_source)?;
        Ok(Section::build(parent, children, &self.item_sort))
    }

    fn install(&mut self, next: SnapshotOf<S>) -> Delta {
        let delta = reconcile(self.current.as_deref(), &next);
        let next = Arc::new(next);
        self.current = Some(next.clone());
        self.passes += 1;

        tracing::debug!(
            pass = self.passes,
            sections = next.section_count(),
            items = next.total_items(),
            deleted_sections = delta.deleted_sections.len(),
            inserted_sections = delta.inserted_sections.len(),
            deleted_items = delta.deleted_items.len(),
            inserted_items = delta.inserted_items.len(),
            "pass reconciled"
        );

        if !delta.is_empty() || self.config.notify_when_empty {
            self.notifier.notify(&next, &delta);
        }
        delta
    }

    // === Lookups ===

    /// The current snapshot; empty before the first pass.
    pub fn snapshot(&self) -> Arc<SnapshotOf<S>> {
        self.current
            .clone()
            .unwrap_or_else(|| Arc::new(Snapshot::empty()))
    }

    pub fn number_of_sections(&self) -> usize {
        self.current.as_ref().map_or(0, |s| s.section_count())
    }

    pub fn number_of_objects_in_section(&self, section: usize) -> Option<usize> {
        self.current.as_ref()?.item_count(section)
    }

    /// The parent entity shown as `section`.
    pub fn object_for_section(&self, section: usize) -> Option<&S::Parent> {
        self.current.as_ref()?.parent(section)
    }

    pub fn section_index_of(&self, parent: &ParentId<S>) -> Option<usize> {
        self.current.as_ref()?.section_index_of(parent)
    }

    pub fn object_at(&self, path: IndexPath) -> Option<&S::Child> {
        self.current.as_ref()?.item(path)
    }

    /// First coordinate of `child` in section order.
    pub fn index_path_of(&self, child: &ChildId<S>) -> Option<IndexPath> {
        self.current.as_ref()?.index_path_of(child)
    }

    pub fn all_objects_in_section(&self, section: usize) -> Option<&[S::Child]> {
        self.current.as_ref()?.items(section)
    }

    // === Observer ===

    /// Register the observer, replacing any previous one. Only a weak
    /// reference is kept.
    pub fn register_observer<O>(&mut self, observer: &Arc<Mutex<O>>) -> ObserverToken
    where
        O: ResultsObserver<S::Parent, S::Child> + Send + 'static,
    {
        self.notifier.register(observer)
    }

    pub fn unregister_observer(&mut self, token: ObserverToken) -> bool {
        self.notifier.unregister(token)
    }

    // === Accessors ===

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access to the source. Changes become visible on the next pass.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn has_fetched(&self) -> bool {
        self.current.is_some()
    }

    /// Number of successful passes so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }
}

fn required(sort: &Option<SortKey>, name: &str) -> Result<SortKey> {
    sort.clone()
        .ok_or_else(|| ControllerError::Configuration(format!("{} is required", name)))
}
