//! # ferrous-lifecycle
//!
//! Incremental service lifecycle resolution for dependency injection graphs.
//!
//! Services arrive one at a time, declare dependencies on ids that may not
//! be registered yet, and still have to come up in dependency order. Each
//! service lives in a [`ServiceHolder`]: a node owning the service object,
//! its declared dependency edges, and a state machine that walks
//! `Unresolved → Resolved → Injected → Satisfied → Initialized` as bindings
//! and upstream readiness allow. When a node initializes it notifies the
//! nodes watching it, rippling readiness through the graph until it reaches
//! a fixed point.
//!
//! ## Features
//!
//! - **Qualified ids with wildcard origins**: depend on `cache@remote`, or
//!   on `cache@*` to accept the first matching origin that shows up
//! - **Incremental binding**: edges bind as services appear, in any
//!   registration order
//! - **Capability-based contracts**: injection, one-shot init, and
//!   per-consumer factories are optional traits on the service object
//! - **Re-entrant, thread-safe advancement**: one lock per node for the
//!   whole transition attempt, with a logical short-circuit for cascade
//!   re-entry
//! - **Fail-fast configuration errors**: unrelated bindings, rebinds,
//!   post-start declarations, and dependency cycles are rejected with
//!   descriptive errors
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_lifecycle::{
//!     Injectable, Injection, LifecycleResult, Service, ServiceRef, ServiceRegistry,
//!     service_ref,
//! };
//!
//! struct Database;
//! impl Service for Database {}
//!
//! #[derive(Default)]
//! struct UserService {
//!     database: Option<ServiceRef>,
//! }
//!
//! impl Service for UserService {
//!     fn as_injectable(&self) -> Option<&dyn Injectable> {
//!         Some(self)
//!     }
//!     fn as_injectable_mut(&mut self) -> Option<&mut dyn Injectable> {
//!         Some(self)
//!     }
//! }
//!
//! impl Injectable for UserService {
//!     fn is_optional(&self, _id: &str) -> bool {
//!         false
//!     }
//!     fn inject_object(&mut self, injection: Injection) -> LifecycleResult<()> {
//!         self.database = Some(injection.into_object());
//!         Ok(())
//!     }
//! }
//!
//! let registry = ServiceRegistry::new();
//! // The consumer can be registered before its dependency exists.
//! let users = registry
//!     .register("users", service_ref(UserService::default()), &["database"])
//!     .unwrap();
//! registry.register("database", service_ref(Database), &[]).unwrap();
//!
//! registry.start_all().unwrap();
//! assert!(users.is_initialized());
//! ```
//!
//! ## Driving nodes directly
//!
//! The registry is a thin driver; nodes can be wired by hand with the same
//! semantics:
//!
//! ```rust
//! use std::sync::Arc;
//! use ferrous_lifecycle::{
//!     AlwaysSatisfied, QualifiedServiceId, Service, ServiceHolder, service_ref,
//! };
//!
//! struct Config;
//! impl Service for Config {}
//!
//! let hook = Arc::new(AlwaysSatisfied);
//! let config = ServiceHolder::new(
//!     QualifiedServiceId::local("config"),
//!     service_ref(Config),
//!     hook.clone(),
//! );
//!
//! assert!(config.start().unwrap());
//! assert!(config.is_initialized());
//! ```
//!
//! ## Pending is not failure
//!
//! A node whose required edge is unbound, whose dependency has not
//! initialized, or whose [`SatisfyHook`] still answers false simply stays
//! where it is; the next binding or notification retries it. Only
//! configuration errors (unrelated bindings, rebinds, cycles, non-injectable
//! objects, undeclared notifications) and init failures surface as
//! [`LifecycleError`]s.

// Module declarations
pub mod error;
pub mod holder;
pub mod lifecycle;
pub mod observer;
pub mod qualified_id;
pub mod registry;
pub mod traits;

// Internal modules
mod internal;

// Re-export core types
pub use error::{LifecycleError, LifecycleResult};
pub use holder::ServiceHolder;
pub use lifecycle::LifecycleState;
pub use observer::{LifecycleObserver, LoggingObserver};
pub use qualified_id::{Origin, QualifiedServiceId};
pub use registry::ServiceRegistry;
pub use traits::{
    service_ref, AlwaysSatisfied, InitError, Initializable, Injectable, Injection, SatisfyHook,
    Service, ServiceFactory, ServiceRef,
};
