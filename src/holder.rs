//! Service nodes and their embedded lifecycle state machine.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::ReentrantMutex;

use crate::error::{LifecycleError, LifecycleResult};
use crate::internal::{cascade, cycle};
use crate::lifecycle::LifecycleState;
use crate::observer::LifecycleObserver;
use crate::qualified_id::{Origin, QualifiedServiceId};
use crate::traits::{Injection, SatisfyHook, ServiceRef};

/// One declared dependency slot.
///
/// Starts unbound; bound exactly once to a service whose qualified id
/// edge-matches the key. Duplicate keys are allowed — each slot binds
/// independently.
#[derive(Clone)]
struct DependencyEdge {
    key: QualifiedServiceId,
    bound: Option<ServiceHolder>,
}

/// Everything guarded by the per-node lock.
struct HolderState {
    edges: Vec<DependencyEdge>,
    watchers: Vec<WeakHolder>,
    observers: Vec<Arc<dyn LifecycleObserver>>,
    started: bool,
    state: LifecycleState,
    advancing: bool,
    dependency_ready: HashMap<QualifiedServiceId, bool>,
    injected: HashSet<usize>,
    failure: Option<LifecycleError>,
}

pub(crate) struct HolderInner {
    object: ServiceRef,
    qualified_id: QualifiedServiceId,
    satisfy_hook: Arc<dyn SatisfyHook>,
    // Reentrant so the cascade re-entry path can reach the `advancing`
    // short-circuit instead of self-deadlocking; cross-thread callers are
    // serialized for the whole transition attempt.
    state: ReentrantMutex<RefCell<HolderState>>,
}

pub(crate) type WeakHolder = Weak<HolderInner>;

/// Handle to one service node.
///
/// A node owns one service object, the dependency edges the service
/// declared, and the state machine driving it from `Unresolved` to
/// `Initialized`. Handles are cheap clones of a shared node; equality is
/// node identity.
///
/// The registry-facing surface is [`add_dependency`](Self::add_dependency),
/// [`set_dependency`](Self::set_dependency), [`start`](Self::start),
/// [`is_depends_on`](Self::is_depends_on),
/// [`try_advance`](Self::try_advance) and
/// [`is_initialized`](Self::is_initialized); watched nodes deliver
/// readiness through [`on_ready`](Self::on_ready).
#[derive(Clone)]
pub struct ServiceHolder {
    inner: Arc<HolderInner>,
}

impl ServiceHolder {
    /// Creates a node with no declared dependencies.
    pub fn new(
        qualified_id: QualifiedServiceId,
        object: ServiceRef,
        satisfy_hook: Arc<dyn SatisfyHook>,
    ) -> Self {
        Self::with_dependencies(qualified_id, object, Vec::new(), satisfy_hook)
    }

    /// Creates a node with declared dependency edges, all unbound.
    pub fn with_dependencies(
        qualified_id: QualifiedServiceId,
        object: ServiceRef,
        dependencies: Vec<QualifiedServiceId>,
        satisfy_hook: Arc<dyn SatisfyHook>,
    ) -> Self {
        let mut dependency_ready = HashMap::new();
        let edges = dependencies
            .into_iter()
            .map(|key| {
                dependency_ready.entry(key.clone()).or_insert(false);
                DependencyEdge { key, bound: None }
            })
            .collect();
        Self {
            inner: Arc::new(HolderInner {
                object,
                qualified_id,
                satisfy_hook,
                state: ReentrantMutex::new(RefCell::new(HolderState {
                    edges,
                    watchers: Vec::new(),
                    observers: Vec::new(),
                    started: false,
                    state: LifecycleState::Unresolved,
                    advancing: false,
                    dependency_ready,
                    injected: HashSet::new(),
                    failure: None,
                })),
            }),
        }
    }

    /// The logical service id.
    pub fn id(&self) -> &str {
        self.inner.qualified_id.id()
    }

    /// The origin this service was registered from.
    pub fn origin(&self) -> &Origin {
        self.inner.qualified_id.origin()
    }

    /// The full qualified id.
    pub fn qualified_id(&self) -> &QualifiedServiceId {
        &self.inner.qualified_id
    }

    /// The hosted service object.
    pub fn service(&self) -> ServiceRef {
        self.inner.object.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        let guard = self.inner.state.lock();
        let state = guard.borrow().state;
        state
    }

    /// Whether the node has reached its terminal state.
    pub fn is_initialized(&self) -> bool {
        self.state() == LifecycleState::Initialized
    }

    /// Registers a diagnostic observer for this node's transitions.
    pub fn add_observer(&self, observer: Arc<dyn LifecycleObserver>) {
        let guard = self.inner.state.lock();
        guard.borrow_mut().observers.push(observer);
    }

    /// Declares one more dependency edge. Only allowed before [`start`].
    ///
    /// [`start`]: Self::start
    pub fn add_dependency(&self, key: QualifiedServiceId) -> LifecycleResult<()> {
        let guard = self.inner.state.lock();
        let mut state = guard.borrow_mut();
        if state.started {
            return Err(LifecycleError::PreconditionViolation(format!(
                "cannot declare dependency {} on service {} after start",
                key, self.inner.qualified_id
            )));
        }
        state.dependency_ready.entry(key.clone()).or_insert(false);
        state.edges.push(DependencyEdge { key, bound: None });
        Ok(())
    }

    /// True when any declared edge equals or edge-matches `key`.
    pub fn is_depends_on(&self, key: &QualifiedServiceId) -> bool {
        let guard = self.inner.state.lock();
        let result = guard.borrow().edges.iter().any(|edge| edge.key.matches(key));
        result
    }

    /// Binds `dependency` to the first unbound edge matching its qualified
    /// id and registers this node as a watcher on it.
    ///
    /// Fails with [`LifecycleError::UnrelatedDependency`] when no declared
    /// edge matches, with [`LifecycleError::PreconditionViolation`] when
    /// every matching edge is already bound, and with
    /// [`LifecycleError::Circular`] when the bind would close a dependency
    /// cycle. After a successful bind on a started node, the state machine
    /// advances as far as it can before this call returns.
    pub fn set_dependency(&self, dependency: &ServiceHolder) -> LifecycleResult<()> {
        cascade::with_frame(|| {
            let dependency_id = dependency.qualified_id().clone();
            if let Some(path) = cycle::find_path(dependency, self) {
                let mut cycle_path = vec![self.inner.qualified_id.to_string()];
                cycle_path.extend(path);
                return Err(LifecycleError::Circular(cycle_path));
            }
            let started = {
                let guard = self.inner.state.lock();
                let mut state = guard.borrow_mut();
                let slot = state
                    .edges
                    .iter()
                    .position(|edge| edge.bound.is_none() && edge.key.matches(&dependency_id));
                match slot {
                    Some(index) => state.edges[index].bound = Some(dependency.clone()),
                    None => {
                        return if state.edges.iter().any(|edge| edge.key.matches(&dependency_id)) {
                            Err(LifecycleError::PreconditionViolation(format!(
                                "dependency {} of service {} is already bound",
                                dependency_id, self.inner.qualified_id
                            )))
                        } else {
                            Err(LifecycleError::UnrelatedDependency(
                                self.inner.qualified_id.clone(),
                                dependency_id,
                            ))
                        };
                    }
                }
                state.started
            };
            dependency.add_watcher(self);
            if started {
                self.try_advance()?;
            }
            Ok(())
        })
    }

    /// Marks the node started and performs its first autonomous advance.
    ///
    /// Idempotent; repeated calls return the current terminality.
    pub fn start(&self) -> LifecycleResult<bool> {
        {
            let guard = self.inner.state.lock();
            guard.borrow_mut().started = true;
        }
        self.try_advance()
    }

    /// Attempts one forward transition and reports terminality.
    ///
    /// Safe to call repeatedly and from watchers' cascades: a call made
    /// while this node is already advancing on the same call stack returns
    /// the current terminality without recursing, and concurrent callers
    /// are serialized per node. Pending conditions return `Ok(false)`.
    pub fn try_advance(&self) -> LifecycleResult<bool> {
        cascade::with_frame(|| self.advance())
    }

    /// Delivers a readiness notification from a watched dependency.
    ///
    /// Marks the matching `dependency_ready` entry true; a wildcard entry is
    /// rekeyed to the first concrete origin that reports in. Once every
    /// entry is true the node re-attempts its own advance. A notification
    /// from a qualified id with neither an exact nor a wildcard entry is a
    /// protocol violation.
    pub fn on_ready(&self, from: &QualifiedServiceId) -> LifecycleResult<()> {
        cascade::with_frame(|| {
            let all_ready = {
                let guard = self.inner.state.lock();
                let mut state = guard.borrow_mut();
                if let Some(ready) = state.dependency_ready.get_mut(from) {
                    *ready = true;
                } else {
                    let wildcard = QualifiedServiceId::any(from.id());
                    if state.dependency_ready.remove(&wildcard).is_some() {
                        state.dependency_ready.insert(from.clone(), true);
                    } else {
                        return Err(LifecycleError::UnexpectedNotification(
                            self.inner.qualified_id.clone(),
                            from.clone(),
                        ));
                    }
                }
                state.dependency_ready.values().all(|ready| *ready)
            };
            if all_ready {
                self.try_advance()?;
            }
            Ok(())
        })
    }

    /// True when an unbound edge matching `key` remains.
    pub(crate) fn has_unbound_dependency(&self, key: &QualifiedServiceId) -> bool {
        let guard = self.inner.state.lock();
        let result = guard
            .borrow()
            .edges
            .iter()
            .any(|edge| edge.bound.is_none() && edge.key.matches(key));
        result
    }

    /// Snapshot of currently bound dependencies, for cycle walks.
    pub(crate) fn bound_dependencies(&self) -> Vec<ServiceHolder> {
        let guard = self.inner.state.lock();
        let bound = guard
            .borrow()
            .edges
            .iter()
            .filter_map(|edge| edge.bound.clone())
            .collect();
        bound
    }

    pub(crate) fn node_ptr(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    pub(crate) fn from_weak(weak: &WeakHolder) -> Option<ServiceHolder> {
        weak.upgrade().map(|inner| ServiceHolder { inner })
    }

    /// Registers `watcher` for the single-shot readiness publication. A
    /// watcher arriving after the node already published is caught up with
    /// an immediate synthetic notification instead.
    fn add_watcher(&self, watcher: &ServiceHolder) {
        let guard = self.inner.state.lock();
        let mut state = guard.borrow_mut();
        if state.state == LifecycleState::Initialized {
            cascade::enqueue(
                Arc::downgrade(&watcher.inner),
                self.inner.qualified_id.clone(),
            );
        } else {
            state.watchers.push(Arc::downgrade(&watcher.inner));
        }
    }

    /// One transition attempt plus watcher publication.
    ///
    /// Must run inside a cascade frame; queued notifications are delivered
    /// by the outermost frame once no node lock is held.
    fn advance(&self) -> LifecycleResult<bool> {
        let guard = self.inner.state.lock();
        {
            let state = guard.borrow();
            if state.advancing {
                return Ok(state.state == LifecycleState::Initialized);
            }
            if let Some(error) = &state.failure {
                return Err(error.clone());
            }
        }
        guard.borrow_mut().advancing = true;
        let current = guard.borrow().state;
        let attempt = match current {
            LifecycleState::Unresolved => self.try_resolve(&guard),
            LifecycleState::Resolved => self.try_inject(&guard),
            LifecycleState::Injected => self.try_satisfy(&guard),
            LifecycleState::Satisfied => self.try_init(&guard),
            LifecycleState::Initialized => Ok(true),
        };
        let mut state = guard.borrow_mut();
        state.advancing = false;
        match attempt {
            Ok(reached_terminal) => {
                let watchers = std::mem::take(&mut state.watchers);
                let terminal = state.state == LifecycleState::Initialized;
                let blocked = (!reached_terminal).then(|| (state.state, state.observers.clone()));
                drop(state);
                for watcher in watchers {
                    cascade::enqueue(watcher, self.inner.qualified_id.clone());
                }
                if let Some((stalled_at, observers)) = blocked {
                    for observer in observers {
                        observer.advance_blocked(&self.inner.qualified_id, stalled_at);
                    }
                }
                Ok(terminal)
            }
            Err(error) => Err(error),
        }
    }

    fn try_resolve(&self, cell: &RefCell<HolderState>) -> LifecycleResult<bool> {
        let edges = cell.borrow().edges.clone();
        // Unbound edges block unless the injectable capability reports them
        // optional; an object without the capability has no optional slots.
        for edge in edges.iter().filter(|edge| edge.bound.is_none()) {
            let optional = self
                .inner
                .object
                .read()
                .as_injectable()
                .map_or(false, |injectable| injectable.is_optional(edge.key.id()));
            if !optional {
                return Ok(false);
            }
        }
        // Every bound dependency must itself reach terminal state; asking
        // may recursively advance it.
        for edge in edges.iter() {
            if let Some(dependency) = &edge.bound {
                if !dependency.try_advance()? {
                    return Ok(false);
                }
            }
        }
        self.transition(cell, LifecycleState::Resolved);
        self.try_inject(cell)
    }

    fn try_inject(&self, cell: &RefCell<HolderState>) -> LifecycleResult<bool> {
        let edges = cell.borrow().edges.clone();
        if !edges.is_empty() {
            if self.inner.object.read().as_injectable().is_none() {
                return Err(LifecycleError::NotInjectable(self.inner.qualified_id.clone()));
            }
            for (index, edge) in edges.iter().enumerate() {
                let Some(dependency) = &edge.bound else {
                    continue;
                };
                if cell.borrow().injected.contains(&index) {
                    continue;
                }
                let value = self.resolve_injection_value(dependency);
                {
                    let mut object = self.inner.object.write();
                    match object.as_injectable_mut() {
                        Some(injectable) => injectable
                            .inject_object(Injection::new(edge.key.id().to_string(), value))?,
                        None => {
                            return Err(LifecycleError::NotInjectable(
                                self.inner.qualified_id.clone(),
                            ))
                        }
                    }
                }
                cell.borrow_mut().injected.insert(index);
            }
        }
        // Injection bookkeeping is scoped to one pass.
        cell.borrow_mut().injected.clear();
        self.transition(cell, LifecycleState::Injected);
        self.try_satisfy(cell)
    }

    fn try_satisfy(&self, cell: &RefCell<HolderState>) -> LifecycleResult<bool> {
        if !self.inner.satisfy_hook.is_satisfied(&*self.inner.object.read()) {
            return Ok(false);
        }
        self.transition(cell, LifecycleState::Satisfied);
        self.try_init(cell)
    }

    fn try_init(&self, cell: &RefCell<HolderState>) -> LifecycleResult<bool> {
        let outcome = {
            let mut object = self.inner.object.write();
            match object.as_initializable() {
                Some(initializable) => initializable.init(),
                None => Ok(()),
            }
        };
        if let Err(source) = outcome {
            let error =
                LifecycleError::InitFailed(self.inner.qualified_id.clone(), source.to_string());
            cell.borrow_mut().failure = Some(error.clone());
            return Err(error);
        }
        self.transition(cell, LifecycleState::Initialized);
        Ok(true)
    }

    /// Resolves the value to inject for one bound edge: the dependency's
    /// object, or whatever its factory capability builds for this consumer.
    fn resolve_injection_value(&self, dependency: &ServiceHolder) -> ServiceRef {
        let dependency_object = dependency.service();
        let created = {
            let object = dependency_object.read();
            object
                .as_factory()
                .map(|factory| factory.create_service(&*self.inner.object.read()))
        };
        created.unwrap_or(dependency_object)
    }

    fn transition(&self, cell: &RefCell<HolderState>, next: LifecycleState) {
        let observers = {
            let mut state = cell.borrow_mut();
            debug_assert!(state.state <= next);
            state.state = next;
            state.observers.clone()
        };
        for observer in observers {
            observer.state_changed(&self.inner.qualified_id, next);
        }
    }
}

impl PartialEq for ServiceHolder {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ServiceHolder {}

impl fmt::Debug for ServiceHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.inner.state.lock();
        let state = guard.borrow();
        f.debug_struct("ServiceHolder")
            .field("id", &self.inner.qualified_id.to_string())
            .field("state", &state.state)
            .field(
                "dependencies",
                &state.edges.iter().map(|edge| edge.key.to_string()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
