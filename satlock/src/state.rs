//! Mirror of the engine's solve state.
//!
//! Engines abort on some queries unless they are in a specific state (e.g. failed assumptions
//! are only available right after an unsatisfiable solve call). The session keeps a copy of that
//! state and checks it before forwarding such queries.
use crate::formula::Status;

/// Whether the engine still holds the refutation of its last solve call.
///
/// Only meaningful inside [`SolveState::Unsatisfiable`], which is why it is nested there: the
/// window can never be open while the last result is anything else.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum UnsatWindow {
    /// Failed assumption queries, cores and traces may reach the engine.
    Open,
    /// Something changed the engine's clauses or assumptions since the refutation.
    Closed,
}

/// Outcome of the last solve call.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SolveState {
    NoResultYet,
    Satisfiable,
    Unknown,
    Unsatisfiable(UnsatWindow),
}

/// Session calls that affect the solve state.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Event {
    /// Clauses were added, including blocking clauses.
    Ingest,
    /// An assumption was added.
    Assume,
    /// A solve call returned.
    Solved(Status),
    /// A maximal satisfiable subset was computed, which runs the engine internally.
    SubsetQuery,
}

impl Default for SolveState {
    fn default() -> SolveState {
        SolveState::NoResultYet
    }
}

impl SolveState {
    /// The state after `event`.
    ///
    /// The last reported status survives everything but another solve call, only the window
    /// closes.
    pub fn next(self, event: Event) -> SolveState {
        match (self, event) {
            (_, Event::Solved(Status::Satisfiable)) => SolveState::Satisfiable,
            (_, Event::Solved(Status::Unknown)) => SolveState::Unknown,
            (_, Event::Solved(Status::Unsatisfiable)) => {
                SolveState::Unsatisfiable(UnsatWindow::Open)
            }
            (SolveState::Unsatisfiable(_), Event::Ingest)
            | (SolveState::Unsatisfiable(_), Event::Assume)
            | (SolveState::Unsatisfiable(_), Event::SubsetQuery) => {
                SolveState::Unsatisfiable(UnsatWindow::Closed)
            }
            (state, Event::Ingest) | (state, Event::Assume) | (state, Event::SubsetQuery) => state,
        }
    }

    /// Status of the last solve call, if any.
    pub fn status(self) -> Option<Status> {
        match self {
            SolveState::NoResultYet => None,
            SolveState::Satisfiable => Some(Status::Satisfiable),
            SolveState::Unknown => Some(Status::Unknown),
            SolveState::Unsatisfiable(_) => Some(Status::Unsatisfiable),
        }
    }

    /// Whether failed assumption queries are currently meaningful.
    pub fn assumptions_valid(self) -> bool {
        self == SolveState::Unsatisfiable(UnsatWindow::Open)
    }
}
