//! A minimal registry driving service nodes.
//!
//! The registry owns the satisfaction hook and the set of live nodes. It
//! creates nodes from textual dependency declarations and auto-wires each
//! new registration into the existing graph in both directions, so
//! registration order does not matter: a consumer registered before its
//! dependency picks it up when the dependency arrives.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::LifecycleResult;
use crate::holder::ServiceHolder;
use crate::observer::LifecycleObserver;
use crate::qualified_id::{Origin, QualifiedServiceId, LOCAL};
use crate::traits::{AlwaysSatisfied, SatisfyHook, ServiceRef};

/// Registry of service nodes with wildcard-aware auto-wiring.
///
/// # Examples
///
/// ```rust
/// use ferrous_lifecycle::{Service, ServiceRegistry, service_ref};
///
/// struct Database;
/// impl Service for Database {}
///
/// let registry = ServiceRegistry::new();
/// let database = registry.register("database", service_ref(Database), &[]).unwrap();
/// registry.start_all().unwrap();
/// assert!(database.is_initialized());
/// ```
pub struct ServiceRegistry {
    satisfy_hook: Arc<dyn SatisfyHook>,
    observers: Mutex<Vec<Arc<dyn LifecycleObserver>>>,
    holders: Mutex<Vec<ServiceHolder>>,
}

impl ServiceRegistry {
    /// Creates a registry whose nodes are always satisfied.
    pub fn new() -> Self {
        Self::with_hook(Arc::new(AlwaysSatisfied))
    }

    /// Creates a registry with a custom satisfaction hook, applied to every
    /// node it registers.
    pub fn with_hook(satisfy_hook: Arc<dyn SatisfyHook>) -> Self {
        Self {
            satisfy_hook,
            observers: Mutex::new(Vec::new()),
            holders: Mutex::new(Vec::new()),
        }
    }

    /// Attaches an observer to every current and future node.
    pub fn add_observer(&self, observer: Arc<dyn LifecycleObserver>) {
        for holder in self.holders.lock().iter() {
            holder.add_observer(observer.clone());
        }
        self.observers.lock().push(observer);
    }

    /// Registers a service from the default `local` origin.
    ///
    /// Dependencies are textual `id@origin` declarations (`"db"`,
    /// `"cache@*"`, `"auth@remote"`).
    pub fn register(
        &self,
        id: &str,
        object: ServiceRef,
        dependencies: &[&str],
    ) -> LifecycleResult<ServiceHolder> {
        self.register_from(LOCAL, id, object, dependencies)
    }

    /// Registers a service from an explicit origin and wires it into the
    /// existing graph.
    ///
    /// Every existing node with a matching unbound edge is bound to the new
    /// service, and the new service's edges are bound to matching existing
    /// nodes. A bind that would close a dependency cycle fails the
    /// registration.
    pub fn register_from(
        &self,
        origin: &str,
        id: &str,
        object: ServiceRef,
        dependencies: &[&str],
    ) -> LifecycleResult<ServiceHolder> {
        let qualified_id = QualifiedServiceId::new(id, Origin::named(origin));
        let keys = dependencies
            .iter()
            .map(|declaration| QualifiedServiceId::parse(declaration))
            .collect::<LifecycleResult<Vec<_>>>()?;
        let holder = ServiceHolder::with_dependencies(
            qualified_id,
            object,
            keys,
            self.satisfy_hook.clone(),
        );
        for observer in self.observers.lock().iter() {
            holder.add_observer(observer.clone());
        }
        let existing = self.holders.lock().clone();
        for other in &existing {
            if other.has_unbound_dependency(holder.qualified_id()) {
                other.set_dependency(&holder)?;
            }
            if holder.has_unbound_dependency(other.qualified_id()) {
                holder.set_dependency(other)?;
            }
        }
        self.holders.lock().push(holder.clone());
        Ok(holder)
    }

    /// Finds the first node whose qualified id matches `key` under the
    /// wildcard rule.
    pub fn find(&self, key: &QualifiedServiceId) -> Option<ServiceHolder> {
        self.holders
            .lock()
            .iter()
            .find(|holder| holder.qualified_id().matches(key))
            .cloned()
    }

    /// Starts every registered node. Nodes blocked on missing bindings or
    /// unsatisfied hooks stay pending; see [`pending`](Self::pending).
    pub fn start_all(&self) -> LifecycleResult<()> {
        let holders = self.holders.lock().clone();
        for holder in holders {
            holder.start()?;
        }
        Ok(())
    }

    /// Qualified ids of nodes that have not reached their terminal state.
    ///
    /// The engine never times out a stuck node; detecting a graph that can
    /// no longer make progress is the registry caller's concern.
    pub fn pending(&self) -> Vec<QualifiedServiceId> {
        self.holders
            .lock()
            .iter()
            .filter(|holder| !holder.is_initialized())
            .map(|holder| holder.qualified_id().clone())
            .collect()
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
