//! Errors reported by a [`Session`](crate::Session).
use std::io;

use thiserror::Error;

use crate::formula::LitIdx;

/// Possible errors of session operations.
///
/// [`Status::Unknown`](crate::Status::Unknown) is not an error: it is the expected outcome of a
/// solve call that hit the propagation limit.
#[derive(Debug, Error)]
pub enum Error {
    /// The session's engine was released by [`Session::delete`](crate::Session::delete).
    #[error("Session is not ready: its engine has been released")]
    NotReady,
    /// An engine call panicked while holding the session lock.
    ///
    /// The engine may be in any state, so only [`Session::delete`](crate::Session::delete)
    /// still works.
    #[error("Session is poisoned: an earlier call panicked")]
    Poisoned,
    /// A raw literal outside the range of [`Lit`](crate::Lit).
    #[error("{} is not a valid literal", lit)]
    InvalidLiteral { lit: LitIdx },
    #[error(
        "Solution has length {} but the formula has {} variables (expected length {})",
        actual,
        variables,
        variables + 1
    )]
    SolutionLength { actual: usize, variables: usize },
    #[error("Variable {} is unassigned in a satisfying assignment", var)]
    UnassignedVariable { var: usize },
    #[error("No terminator within the first {} literals of an engine result buffer", max_len)]
    UnterminatedBuffer { max_len: usize },
    #[error("Report requires the last solve call to be unsatisfiable")]
    NotUnsatisfiable,
    #[error("Report requires trace generation to be enabled when the session is created")]
    TracingDisabled,
    #[error("Upper bound {} is less than lower bound {}", upper, lower)]
    InvalidBounds { lower: i64, upper: i64 },
    #[error("Error redirecting engine output: {}", cause)]
    Io {
        #[from]
        cause: io::Error,
    },
    #[error("Engine error: {}", cause)]
    Engine {
        #[source]
        cause: anyhow::Error,
    },
}

impl Error {
    /// Wraps an error reported by an engine, keeping I/O errors distinguishable.
    pub(crate) fn engine(cause: impl Into<anyhow::Error>) -> Error {
        match cause.into().downcast::<io::Error>() {
            Ok(cause) => Error::Io { cause },
            Err(cause) => Error::Engine { cause },
        }
    }
}
