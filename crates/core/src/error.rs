//! Error types for building a flow graph.

/// Result type for graph construction.
pub type FlowResult<T> = Result<T, FlowGraphError>;

/// Errors raised when a flow definition violates its own invariants.
///
/// Dangling trigger references are not errors; the analyses ignore them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowGraphError {
    /// A step, listener or router was registered without a name.
    #[error("Empty {kind} name")]
    EmptyName { kind: &'static str },

    /// Two steps share a name.
    #[error("Duplicate step: {0}")]
    DuplicateStep(String),

    /// Two listeners share a name.
    #[error("Duplicate listener: {0}")]
    DuplicateListener(String),

    /// Two routers share a name.
    #[error("Duplicate router: {0}")]
    DuplicateRouter(String),

    /// A listener has nothing to listen to.
    #[error("Listener {0} has no triggers")]
    EmptyTriggers(String),
}
