//! External satisfaction hooks.

use crate::traits::Service;

/// Readiness predicate consulted between injection and initialization.
///
/// The hook is supplied by the owning registry and is opaque to the engine;
/// it typically checks externally populated state such as configuration
/// values. A false answer is a pending condition, retried on the next
/// advance attempt.
///
/// Any `Fn(&dyn Service) -> bool` closure is a hook:
///
/// ```rust
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
/// use ferrous_lifecycle::{SatisfyHook, Service, ServiceRegistry};
///
/// let ready = Arc::new(AtomicBool::new(false));
/// let flag = ready.clone();
/// let hook: Arc<dyn SatisfyHook> =
///     Arc::new(move |_: &dyn Service| flag.load(Ordering::SeqCst));
/// let registry = ServiceRegistry::with_hook(hook);
/// # let _ = registry;
/// ```
pub trait SatisfyHook: Send + Sync {
    /// Whether `service` is ready to be initialized.
    fn is_satisfied(&self, service: &dyn Service) -> bool;
}

impl<F> SatisfyHook for F
where
    F: Fn(&dyn Service) -> bool + Send + Sync,
{
    fn is_satisfied(&self, service: &dyn Service) -> bool {
        self(service)
    }
}

/// Hook that reports every service as satisfied.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysSatisfied;

impl SatisfyHook for AlwaysSatisfied {
    fn is_satisfied(&self, _service: &dyn Service) -> bool {
        true
    }
}
