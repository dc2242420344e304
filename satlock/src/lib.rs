//! Thread safe sessions over a stateful, non-reentrant SAT engine.
//!
//! An [`Engine`] is driven through a narrow call boundary with preconditions that are easy to
//! violate: some queries are only defined directly after an unsatisfiable solve call, results
//! come back in terminated buffers and reports are written into file-like sinks. A [`Session`]
//! owns an engine, serializes access to it, tracks its solve state to answer out-of-state queries
//! itself and streams reports into any [`Write`](std::io::Write) implementation.
//!
//! The bundled [`VarisatEngine`] implements the boundary on top of the [Varisat] solver.
//!
//! ```
//! use satlock::{Session, SessionConfig, Status};
//!
//! let session = Session::new(SessionConfig::default())?;
//! session.add_clauses(&[vec![1, 2, -3], vec![3, 4]])?;
//!
//! let (status, solution) = session.solve()?;
//! assert_eq!(status, Status::Satisfiable);
//! assert_eq!(solution.map(|solution| solution.len()), Some(5));
//! # Ok::<(), satlock::Error>(())
//! ```
//!
//! [Varisat]: https://crates.io/crates/varisat

pub mod bridge;
pub mod buffer;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod minimize;
pub mod session;
pub mod state;
pub mod varisat_engine;

#[cfg(test)]
mod test;

pub mod formula {
    //! Literals, formulas and solutions.
    pub use satlock_formula::*;
}

pub mod dimacs {
    //! DIMACS CNF parser and writer.
    pub use satlock_dimacs::*;
}

pub use config::{Output, SessionConfig};
pub use engine::Engine;
pub use error::Error;
pub use formula::{CnfFormula, Lit, LitIdx, Solution, Status, Var};
pub use minimize::{minimize, Minimizer, Minimum};
pub use session::{Session, Solutions};
pub use varisat_engine::VarisatEngine;
