//! Lifecycle state definitions.

/// Readiness stages a service node moves through.
///
/// The state is strictly monotonic: no operation ever moves a node
/// backwards, and `Initialized` is terminal. The derived ordering follows
/// the progression, so monotonicity can be asserted with `<=`.
///
/// # Stages
///
/// - **Unresolved**: declared dependency edges may be unbound, or bound to
///   services that are not yet initialized themselves
/// - **Resolved**: every required edge is bound and every bound dependency
///   is initialized
/// - **Injected**: all bound dependency values have been delivered to the
///   owned object's injectable capability
/// - **Satisfied**: the external satisfaction hook has accepted the object
/// - **Initialized**: the init callback (if any) has run; terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    /// Waiting for dependency bindings or upstream initialization
    Unresolved,
    /// Dependencies bound and initialized, injection not yet performed
    Resolved,
    /// Dependency values delivered to the owned object
    Injected,
    /// External readiness confirmed by the satisfaction hook
    Satisfied,
    /// Init callback completed; the node is terminal
    Initialized,
}

impl LifecycleState {
    /// True only for `Initialized`.
    pub fn is_terminal(self) -> bool {
        self == LifecycleState::Initialized
    }
}
