/// Error taxonomy: display formats and fatal configuration errors.
///
/// Pending conditions are covered in `basics.rs`; everything here must
/// surface as a `LifecycleError` and leave node state untouched (or, for
/// init failures, permanently stuck).
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use ferrous_lifecycle::{
    service_ref, AlwaysSatisfied, InitError, Initializable, Injectable, Injection,
    LifecycleError, LifecycleResult, LifecycleState, QualifiedServiceId, Service, ServiceHolder,
};

struct Leaf;

impl Service for Leaf {}

/// Has dependencies but deliberately no injectable capability.
struct Opaque;

impl Service for Opaque {}

struct Wired;

impl Service for Wired {
    fn as_injectable(&self) -> Option<&dyn Injectable> {
        Some(self)
    }
    fn as_injectable_mut(&mut self) -> Option<&mut dyn Injectable> {
        Some(self)
    }
}

impl Injectable for Wired {
    fn is_optional(&self, _id: &str) -> bool {
        false
    }
    fn inject_object(&mut self, _injection: Injection) -> LifecycleResult<()> {
        Ok(())
    }
}

struct FailingInit {
    attempts: Arc<AtomicU32>,
}

impl Service for FailingInit {
    fn as_initializable(&mut self) -> Option<&mut dyn Initializable> {
        Some(self)
    }
}

impl Initializable for FailingInit {
    fn init(&mut self) -> Result<(), InitError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err("connection pool exhausted".into())
    }
}

fn hook() -> Arc<AlwaysSatisfied> {
    Arc::new(AlwaysSatisfied)
}

// ===== Display =====

#[test]
fn test_error_display_invalid_service_id() {
    let error = LifecycleError::InvalidServiceId("@remote".to_string());
    assert_eq!(format!("{}", error), "Invalid qualified service id: @remote");
}

#[test]
fn test_error_display_unrelated_dependency() {
    let error = LifecycleError::UnrelatedDependency(
        QualifiedServiceId::local("users"),
        QualifiedServiceId::local("metrics"),
    );
    assert_eq!(
        format!("{}", error),
        "Service users@local does not depend on service metrics@local"
    );
}

#[test]
fn test_error_display_precondition_violation() {
    let error = LifecycleError::PreconditionViolation("edge already bound".to_string());
    assert_eq!(format!("{}", error), "Precondition violated: edge already bound");
}

#[test]
fn test_error_display_not_injectable() {
    let error = LifecycleError::NotInjectable(QualifiedServiceId::local("users"));
    assert_eq!(
        format!("{}", error),
        "Service users@local declares dependencies but is not injectable"
    );
}

#[test]
fn test_error_display_unexpected_notification() {
    let error = LifecycleError::UnexpectedNotification(
        QualifiedServiceId::local("users"),
        QualifiedServiceId::local("metrics"),
    );
    assert_eq!(
        format!("{}", error),
        "Service users@local received a readiness notification from undeclared dependency metrics@local"
    );
}

#[test]
fn test_error_display_circular() {
    let path = vec!["a@local".to_string(), "b@local".to_string(), "a@local".to_string()];
    let error = LifecycleError::Circular(path);
    assert_eq!(
        format!("{}", error),
        "Circular dependency: a@local -> b@local -> a@local"
    );
}

#[test]
fn test_error_display_init_failed() {
    let error = LifecycleError::InitFailed(
        QualifiedServiceId::local("db"),
        "connection pool exhausted".to_string(),
    );
    assert_eq!(
        format!("{}", error),
        "Initialization of service db@local failed: connection pool exhausted"
    );
}

#[test]
fn test_errors_implement_std_error() {
    let error: Box<dyn std::error::Error> =
        Box::new(LifecycleError::InvalidServiceId("".to_string()));
    assert!(!error.to_string().is_empty());
}

// ===== Configuration errors =====

#[test]
fn unrelated_dependency_is_rejected_and_state_unchanged() {
    let app = ServiceHolder::with_dependencies(
        QualifiedServiceId::local("app"),
        service_ref(Wired),
        vec![QualifiedServiceId::local("db")],
        hook(),
    );
    let metrics =
        ServiceHolder::new(QualifiedServiceId::local("metrics"), service_ref(Leaf), hook());

    let err = app.set_dependency(&metrics).unwrap_err();
    assert!(matches!(err, LifecycleError::UnrelatedDependency(_, _)));
    assert_eq!(app.state(), LifecycleState::Unresolved);
    assert!(app.is_depends_on(&QualifiedServiceId::local("db")));
}

#[test]
fn rebinding_a_bound_edge_is_a_precondition_violation() {
    let app = ServiceHolder::with_dependencies(
        QualifiedServiceId::local("app"),
        service_ref(Wired),
        vec![QualifiedServiceId::local("db")],
        hook(),
    );
    let first = ServiceHolder::new(QualifiedServiceId::local("db"), service_ref(Leaf), hook());
    let second = ServiceHolder::new(QualifiedServiceId::local("db"), service_ref(Leaf), hook());

    app.set_dependency(&first).unwrap();
    let err = app.set_dependency(&second).unwrap_err();
    assert!(matches!(err, LifecycleError::PreconditionViolation(_)));
}

#[test]
fn declaring_edges_after_start_is_a_precondition_violation() {
    let holder = ServiceHolder::new(QualifiedServiceId::local("app"), service_ref(Leaf), hook());
    holder.start().unwrap();

    let err = holder.add_dependency(QualifiedServiceId::local("late")).unwrap_err();
    assert!(matches!(err, LifecycleError::PreconditionViolation(_)));
}

#[test]
fn edges_declared_before_start_participate_in_resolution() {
    let app = ServiceHolder::new(QualifiedServiceId::local("app"), service_ref(Wired), hook());
    app.add_dependency(QualifiedServiceId::local("db")).unwrap();

    assert!(!app.start().unwrap());
    let db = ServiceHolder::new(QualifiedServiceId::local("db"), service_ref(Leaf), hook());
    app.set_dependency(&db).unwrap();
    assert!(app.is_initialized());
}

#[test]
fn non_injectable_service_with_dependencies_fails_fatally() {
    let app = ServiceHolder::with_dependencies(
        QualifiedServiceId::local("app"),
        service_ref(Opaque),
        vec![QualifiedServiceId::local("db")],
        hook(),
    );
    let db = ServiceHolder::new(QualifiedServiceId::local("db"), service_ref(Leaf), hook());
    app.set_dependency(&db).unwrap();

    let err = app.start().unwrap_err();
    match err {
        LifecycleError::NotInjectable(service) => assert_eq!(service.id(), "app"),
        other => panic!("expected NotInjectable, got {:?}", other),
    }
    // Resolution succeeded; the failure hit at injection.
    assert_eq!(app.state(), LifecycleState::Resolved);
    assert!(db.is_initialized());
}

#[test]
fn init_failure_is_fatal_and_never_retried() {
    let attempts = Arc::new(AtomicU32::new(0));
    let holder = ServiceHolder::new(
        QualifiedServiceId::local("db"),
        service_ref(FailingInit { attempts: attempts.clone() }),
        hook(),
    );

    let err = holder.start().unwrap_err();
    assert!(matches!(err, LifecycleError::InitFailed(_, _)));
    assert_eq!(holder.state(), LifecycleState::Satisfied);
    assert!(!holder.is_initialized());

    // Later attempts re-report the recorded failure without calling init.
    let err = holder.try_advance().unwrap_err();
    match err {
        LifecycleError::InitFailed(service, message) => {
            assert_eq!(service.id(), "db");
            assert_eq!(message, "connection pool exhausted");
        }
        other => panic!("expected InitFailed, got {:?}", other),
    }
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[test]
fn parse_rejects_malformed_identifiers() {
    for text in ["", "@remote", "db@"] {
        let err = QualifiedServiceId::parse(text).unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidServiceId(_)), "{:?}", text);
    }
}
