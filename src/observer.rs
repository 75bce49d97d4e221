//! Diagnostic observers for lifecycle traceability.
//!
//! Observers hook the state machine without participating in it: they see
//! every transition a node makes and every attempt that stalls, which is
//! usually enough to spot a graph stuck on a missing binding or an
//! unsatisfied hook.

use crate::lifecycle::LifecycleState;
use crate::qualified_id::QualifiedServiceId;

/// Observer for service node lifecycle events.
///
/// Callbacks run synchronously on the advancing thread; keep
/// implementations lightweight.
///
/// # Examples
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use ferrous_lifecycle::{
///     LifecycleObserver, LifecycleState, QualifiedServiceId, ServiceRegistry,
/// };
///
/// struct Recorder(Mutex<Vec<(String, LifecycleState)>>);
///
/// impl LifecycleObserver for Recorder {
///     fn state_changed(&self, id: &QualifiedServiceId, state: LifecycleState) {
///         self.0.lock().unwrap().push((id.to_string(), state));
///     }
/// }
///
/// let registry = ServiceRegistry::new();
/// registry.add_observer(Arc::new(Recorder(Mutex::new(Vec::new()))));
/// ```
pub trait LifecycleObserver: Send + Sync {
    /// Called after a node enters `state`.
    fn state_changed(&self, id: &QualifiedServiceId, state: LifecycleState);

    /// Called when an advance attempt leaves the node stalled at `state`
    /// (a pending condition, not an error).
    fn advance_blocked(&self, id: &QualifiedServiceId, state: LifecycleState) {
        let _ = (id, state);
    }
}

/// Observer that prints lifecycle events to stdout.
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    /// Creates a logging observer with the default prefix.
    pub fn new() -> Self {
        Self {
            prefix: "[ferrous-lifecycle]".to_string(),
        }
    }

    /// Creates a logging observer with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleObserver for LoggingObserver {
    fn state_changed(&self, id: &QualifiedServiceId, state: LifecycleState) {
        println!("{} {} entered {:?}", self.prefix, id, state);
    }

    fn advance_blocked(&self, id: &QualifiedServiceId, state: LifecycleState) {
        println!("{} {} stalled at {:?}", self.prefix, id, state);
    }
}
