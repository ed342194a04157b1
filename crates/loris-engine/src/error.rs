use thiserror::Error;

/// Failures surfaced by transition generation and exploration.
///
/// Register capacity and the exploration budget are not errors; they are
/// recorded on the returned [`crate::lts::Lts`]. Everything here is a hard
/// stop: either the input environment is incomplete or a structural
/// invariant of the engine has been violated.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("free name '{name}' is not tracked by the register in {state}")]
    UnregisteredName { name: String, state: String },

    #[error("unknown process constant '{name}'")]
    UnknownConstant { name: String },

    #[error("process constant '{name}' never reaches a prefix (unguarded recursion)")]
    UnguardedRecursion { name: String },

    #[error("'{name}' takes {expected} parameter(s), invoked with {actual}")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("derivation path does not resolve in {state}")]
    PathMismatch { state: String },
}
