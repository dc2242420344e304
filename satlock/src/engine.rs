//! The call boundary of a solving engine.
//!
//! An [`Engine`] is a stateful, single threaded solver instance. Its methods mirror the narrow
//! foreign interface such engines usually expose: literals and terminators are plain integers,
//! multi-literal results come back as `0`-terminated buffers owned by the engine, and several
//! queries have preconditions that an engine is free to enforce by panicking. The
//! [`Session`](crate::Session) is responsible for never violating them; engines do not need to be
//! defensive.
use std::io::Write;

use anyhow::Error;

use crate::config::Output;
use crate::formula::{LitIdx, Status};

/// A stateful solver instance.
pub trait Engine {
    /// Add a literal to the clause under construction, `0` terminates the clause.
    ///
    /// Invalidates assumptions that were already used by a solve call.
    fn add(&mut self, lit: LitIdx);

    /// Assume a literal for the next solve call.
    ///
    /// Assumptions stay valid after that solve call until the next call to `add`, `assume` or
    /// `solve`. The first `assume` after a solve call starts a new set of assumptions.
    fn assume(&mut self, lit: LitIdx);

    /// Solve the formula under the current assumptions.
    fn solve(&mut self) -> Result<Status, Error>;

    /// Value of a literal in the last satisfying assignment: `1` true, `-1` false, `0` unassigned.
    ///
    /// Precondition: the last solve call returned [`Status::Satisfiable`].
    fn deref(&self, lit: LitIdx) -> i32;

    /// Largest variable number seen in clauses or assumptions.
    fn variables(&self) -> usize;

    /// Number of clauses added through [`add`](Engine::add) or internal blocking.
    fn added_original_clauses(&self) -> usize;

    /// Whether the literal was an assumption needed to derive the last unsatisfiable result.
    ///
    /// Precondition: the last solve call returned [`Status::Unsatisfiable`] and neither `add` nor
    /// `assume` were called since.
    fn failed_assumption(&self, lit: LitIdx) -> bool;

    /// All failed assumptions as a `0`-terminated buffer.
    ///
    /// Same precondition as [`failed_assumption`](Engine::failed_assumption). The buffer is
    /// overwritten by the next call that returns one.
    fn failed_assumptions(&mut self) -> &[LitIdx];

    /// Whether the formula without assumptions is known to be unsatisfiable.
    fn inconsistent(&self) -> bool;

    /// A maximal satisfiable subset of the current assumptions as a `0`-terminated buffer.
    ///
    /// Precondition: the formula is not [`inconsistent`](Engine::inconsistent).
    fn maximal_satisfiable_subset_of_assumptions(&mut self) -> Result<&[LitIdx], Error>;

    /// Like [`maximal_satisfiable_subset_of_assumptions`], but afterwards blocks the returned
    /// subset by adding a clause over the assumptions outside of it, keeping the assumptions.
    ///
    /// Repeated calls enumerate all maximal satisfiable subsets. Same precondition.
    ///
    /// [`maximal_satisfiable_subset_of_assumptions`]:
    ///     Engine::maximal_satisfiable_subset_of_assumptions
    fn next_maximal_satisfiable_subset_of_assumptions(&mut self) -> Result<&[LitIdx], Error>;

    /// Bound the work of each solve call, `0` removes the bound.
    fn set_propagation_limit(&mut self, limit: u64) -> Result<(), Error>;

    fn set_verbosity(&mut self, verbosity: u32);

    fn set_prefix(&mut self, prefix: &str);

    fn set_output(&mut self, output: Output);

    /// Retain the data needed for clausal cores and traces.
    ///
    /// Must be called before the first clause is added.
    fn enable_trace_generation(&mut self) -> Result<(), Error>;

    /// Write the formula as DIMACS CNF.
    fn print(&mut self, sink: &mut dyn Write) -> Result<(), Error>;

    /// Write a subset of the original clauses that is unsatisfiable on its own (together with the
    /// failed assumptions) as DIMACS CNF.
    ///
    /// Precondition: trace generation is enabled and the engine is still in the state left by an
    /// unsatisfiable solve call.
    fn write_clausal_core(&mut self, sink: &mut dyn Write) -> Result<(), Error>;

    /// Write a compact proof trace of the last unsatisfiable result.
    ///
    /// Same precondition as [`write_clausal_core`](Engine::write_clausal_core).
    fn write_compact_trace(&mut self, sink: &mut dyn Write) -> Result<(), Error>;

    /// Write an extended, human readable proof trace of the last unsatisfiable result.
    ///
    /// Same precondition as [`write_clausal_core`](Engine::write_clausal_core).
    fn write_extended_trace(&mut self, sink: &mut dyn Write) -> Result<(), Error>;
}
