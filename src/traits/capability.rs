//! Service object capabilities.
//!
//! A node treats its owned object as opaque except for a small closed set of
//! optional capabilities, discovered through the query methods on
//! [`Service`]. An object opts into a capability by overriding the matching
//! query to return itself; everything defaults to "not supported".

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::LifecycleResult;

/// Shared handle to a hosted service object.
///
/// The node owns the handle; dependents receive clones of it (or a
/// factory-produced replacement) at injection time.
pub type ServiceRef = Arc<RwLock<dyn Service>>;

/// Error type returned by init callbacks.
pub type InitError = Box<dyn std::error::Error + Send + Sync>;

/// Wraps a service object into a [`ServiceRef`].
pub fn service_ref<S: Service + 'static>(service: S) -> ServiceRef {
    Arc::new(RwLock::new(service))
}

/// Base trait for objects hosted by a service node.
///
/// The query methods form the closed capability set of the lifecycle engine;
/// no downcasting or runtime type inspection is used anywhere in resolution.
///
/// # Examples
///
/// ```rust
/// use ferrous_lifecycle::{Injectable, Injection, LifecycleResult, Service, ServiceRef};
///
/// #[derive(Default)]
/// struct UserService {
///     database: Option<ServiceRef>,
/// }
///
/// impl Service for UserService {
///     fn as_injectable(&self) -> Option<&dyn Injectable> {
///         Some(self)
///     }
///     fn as_injectable_mut(&mut self) -> Option<&mut dyn Injectable> {
///         Some(self)
///     }
/// }
///
/// impl Injectable for UserService {
///     fn is_optional(&self, _id: &str) -> bool {
///         false
///     }
///     fn inject_object(&mut self, injection: Injection) -> LifecycleResult<()> {
///         self.database = Some(injection.into_object());
///         Ok(())
///     }
/// }
/// ```
pub trait Service: Send + Sync {
    /// Injection capability, read-only view (optionality queries).
    fn as_injectable(&self) -> Option<&dyn Injectable> {
        None
    }

    /// Injection capability, mutable view (value delivery).
    fn as_injectable_mut(&mut self) -> Option<&mut dyn Injectable> {
        None
    }

    /// Init capability, invoked once at the Satisfied → Initialized
    /// transition.
    fn as_initializable(&mut self) -> Option<&mut dyn Initializable> {
        None
    }

    /// Factory capability: this object produces per-consumer instances
    /// instead of being injected directly.
    fn as_factory(&self) -> Option<&dyn ServiceFactory> {
        None
    }
}

/// One dependency value delivered to an injectable object.
#[derive(Clone)]
pub struct Injection {
    id: String,
    object: ServiceRef,
}

impl Injection {
    /// Pairs a dependency id with the value resolved for it.
    pub fn new(id: impl Into<String>, object: ServiceRef) -> Self {
        Self { id: id.into(), object }
    }

    /// The declared dependency id this value satisfies.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Borrows the delivered value.
    pub fn object(&self) -> &ServiceRef {
        &self.object
    }

    /// Consumes the injection, keeping the delivered value.
    pub fn into_object(self) -> ServiceRef {
        self.object
    }

    /// Splits into id and value.
    pub fn into_parts(self) -> (String, ServiceRef) {
        (self.id, self.object)
    }
}

/// Implemented by service objects that accept dependency injection.
pub trait Injectable {
    /// Whether the dependency with this id may stay unbound without
    /// blocking resolution.
    fn is_optional(&self, id: &str) -> bool;

    /// Stores one resolved dependency value. Called at most once per
    /// dependency per injection pass.
    fn inject_object(&mut self, injection: Injection) -> LifecycleResult<()>;
}

/// Implemented by service objects with a one-shot init step.
pub trait Initializable {
    /// Runs after injection and satisfaction. A failure is fatal for the
    /// node; the transition is never retried.
    fn init(&mut self) -> Result<(), InitError>;
}

/// Implemented by dependency values that produce per-consumer instances.
pub trait ServiceFactory {
    /// Builds the value to inject into `consumer` in place of this object.
    fn create_service(&self, consumer: &dyn Service) -> ServiceRef;
}
