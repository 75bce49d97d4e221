//! Error types for the lifecycle engine.

use std::fmt;

use crate::qualified_id::QualifiedServiceId;

/// Fatal conditions raised by node operations.
///
/// Pending conditions — an unbound required edge, a dependency that is not
/// yet initialized, a satisfaction hook reporting false — are *not* errors;
/// blocked operations return `Ok(false)` and are retried by later bindings
/// or notifications. Everything here is a configuration or user-code error
/// that propagates synchronously to the caller of the triggering operation.
///
/// # Examples
///
/// ```rust
/// use ferrous_lifecycle::{LifecycleError, QualifiedServiceId};
///
/// let service = QualifiedServiceId::local("users");
/// let dependency = QualifiedServiceId::local("metrics");
/// let err = LifecycleError::UnrelatedDependency(service, dependency);
/// assert_eq!(
///     err.to_string(),
///     "Service users@local does not depend on service metrics@local",
/// );
/// ```
#[derive(Debug, Clone)]
pub enum LifecycleError {
    /// Text that does not parse as an `id@origin` identifier
    InvalidServiceId(String),
    /// A bind attempt for a service no declared edge matches
    UnrelatedDependency(QualifiedServiceId, QualifiedServiceId),
    /// Rebinding a bound edge, or declaring edges after start
    PreconditionViolation(String),
    /// A service with dependency edges whose object cannot accept injection
    NotInjectable(QualifiedServiceId),
    /// A readiness notification from a dependency the node never declared
    UnexpectedNotification(QualifiedServiceId, QualifiedServiceId),
    /// Binding would close a dependency cycle (includes the path)
    Circular(Vec<String>),
    /// The init callback failed; the node never retries initialization
    InitFailed(QualifiedServiceId, String),
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleError::InvalidServiceId(text) => {
                write!(f, "Invalid qualified service id: {}", text)
            }
            LifecycleError::UnrelatedDependency(service, dependency) => {
                write!(f, "Service {} does not depend on service {}", service, dependency)
            }
            LifecycleError::PreconditionViolation(message) => {
                write!(f, "Precondition violated: {}", message)
            }
            LifecycleError::NotInjectable(service) => {
                write!(f, "Service {} declares dependencies but is not injectable", service)
            }
            LifecycleError::UnexpectedNotification(service, notifier) => {
                write!(
                    f,
                    "Service {} received a readiness notification from undeclared dependency {}",
                    service, notifier
                )
            }
            LifecycleError::Circular(path) => {
                write!(f, "Circular dependency: {}", path.join(" -> "))
            }
            LifecycleError::InitFailed(service, message) => {
                write!(f, "Initialization of service {} failed: {}", service, message)
            }
        }
    }
}

impl std::error::Error for LifecycleError {}

/// Result type for lifecycle operations
pub type LifecycleResult<T> = Result<T, LifecycleError>;
