//! Error kinds surfaced by the order engine.

use crate::types::Type;
use thiserror::Error;

/// Failures raised by order queries and integrity checks.
///
/// `Untracked` may be caught by internal callers (the constraint solver and
/// the lattice operations degrade gracefully); the other variants indicate
/// misuse or a corrupted graph and abort the query.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TypeOrderError {
    #[error("type `{0}` is not tracked by the order")]
    Untracked(Type),

    #[error("the order contains a cycle")]
    Cyclic,

    #[error("the order is incomplete: {0}")]
    Incomplete(String),

    #[error("inconsistent method resolution order for `{0}`")]
    InconsistentMethodResolutionOrder(Type),
}
