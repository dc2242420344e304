//! Scripted engine for testing sessions.
use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Error;

use crate::config::Output;
use crate::engine::Engine;
use crate::formula::{LitIdx, Status};

/// Engine calls in the order they happened.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Call {
    Add(LitIdx),
    Assume(LitIdx),
    Solve,
    FailedAssumption(LitIdx),
    FailedAssumptions,
    Subset,
    NextSubset,
    PropagationLimit(u64),
    TraceGeneration,
    Print,
    ClausalCore,
    CompactTrace,
    ExtendedTrace,
    Dropped,
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

/// An engine returning scripted results.
///
/// It panics whenever a query is made outside of the state in which it is defined, like a real
/// engine aborting, so a test fails if a session lets such a query through.
pub struct ScriptedEngine {
    pub calls: CallLog,
    /// Results of the next solve calls.
    pub statuses: VecDeque<Status>,
    /// Result of `deref` for each variable, index 0 unused.
    pub model: Vec<i32>,
    /// Buffer returned for failed assumptions.
    pub failed: Vec<LitIdx>,
    /// Buffer returned for subset queries.
    pub subset: Vec<LitIdx>,
    pub inconsistent: bool,
    variables: usize,
    clauses: usize,
    last: Option<Status>,
    changed: bool,
    tracing: bool,
}

impl ScriptedEngine {
    pub fn new() -> (ScriptedEngine, CallLog) {
        let calls = CallLog::default();
        let engine = ScriptedEngine {
            calls: calls.clone(),
            statuses: VecDeque::new(),
            model: vec![],
            failed: vec![0],
            subset: vec![0],
            inconsistent: false,
            variables: 0,
            clauses: 0,
            last: None,
            changed: false,
            tracing: false,
        };
        (engine, calls)
    }

    fn log(&self, call: Call) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn require_result(&self, status: Status) {
        assert!(
            self.last == Some(status) && !self.changed,
            "engine aborted: expected to be in {} state",
            status
        );
    }

    fn require_refutation(&self) {
        self.require_result(Status::Unsatisfiable);
        assert!(self.tracing, "engine aborted: tracing not enabled");
    }
}

impl Drop for ScriptedEngine {
    fn drop(&mut self) {
        self.log(Call::Dropped);
    }
}

impl Engine for ScriptedEngine {
    fn add(&mut self, lit: LitIdx) {
        self.log(Call::Add(lit));
        self.changed = true;
        if lit == 0 {
            self.clauses += 1;
        }
        self.variables = self.variables.max(lit.unsigned_abs() as usize);
    }

    fn assume(&mut self, lit: LitIdx) {
        self.log(Call::Assume(lit));
        self.changed = true;
        self.variables = self.variables.max(lit.unsigned_abs() as usize);
    }

    fn solve(&mut self) -> Result<Status, Error> {
        self.log(Call::Solve);
        let status = self
            .statuses
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted status left"))?;
        self.last = Some(status);
        self.changed = false;
        Ok(status)
    }

    fn deref(&self, lit: LitIdx) -> i32 {
        self.require_result(Status::Satisfiable);
        let value = self.model[lit.unsigned_abs() as usize];
        if lit < 0 {
            -value
        } else {
            value
        }
    }

    fn variables(&self) -> usize {
        self.variables
    }

    fn added_original_clauses(&self) -> usize {
        self.clauses
    }

    fn failed_assumption(&self, lit: LitIdx) -> bool {
        self.log(Call::FailedAssumption(lit));
        self.require_result(Status::Unsatisfiable);
        self.failed.contains(&lit)
    }

    fn failed_assumptions(&mut self) -> &[LitIdx] {
        self.log(Call::FailedAssumptions);
        self.require_result(Status::Unsatisfiable);
        &self.failed
    }

    fn inconsistent(&self) -> bool {
        self.inconsistent
    }

    fn maximal_satisfiable_subset_of_assumptions(&mut self) -> Result<&[LitIdx], Error> {
        self.log(Call::Subset);
        assert!(!self.inconsistent, "engine aborted: formula is inconsistent");
        self.changed = true;
        Ok(&self.subset)
    }

    fn next_maximal_satisfiable_subset_of_assumptions(&mut self) -> Result<&[LitIdx], Error> {
        self.log(Call::NextSubset);
        assert!(!self.inconsistent, "engine aborted: formula is inconsistent");
        self.changed = true;
        self.clauses += 1;
        Ok(&self.subset)
    }

    fn set_propagation_limit(&mut self, limit: u64) -> Result<(), Error> {
        self.log(Call::PropagationLimit(limit));
        Ok(())
    }

    fn set_verbosity(&mut self, _verbosity: u32) {}

    fn set_prefix(&mut self, _prefix: &str) {}

    fn set_output(&mut self, _output: Output) {}

    fn enable_trace_generation(&mut self) -> Result<(), Error> {
        self.log(Call::TraceGeneration);
        self.tracing = true;
        Ok(())
    }

    fn print(&mut self, sink: &mut dyn Write) -> Result<(), Error> {
        self.log(Call::Print);
        writeln!(sink, "p cnf {} {}", self.variables, self.clauses)?;
        Ok(())
    }

    fn write_clausal_core(&mut self, sink: &mut dyn Write) -> Result<(), Error> {
        self.log(Call::ClausalCore);
        self.require_refutation();
        sink.write_all(b"p cnf 0 1\n0\n")?;
        Ok(())
    }

    fn write_compact_trace(&mut self, sink: &mut dyn Write) -> Result<(), Error> {
        self.log(Call::CompactTrace);
        self.require_refutation();
        sink.write_all(b"a\0")?;
        Ok(())
    }

    fn write_extended_trace(&mut self, sink: &mut dyn Write) -> Result<(), Error> {
        self.log(Call::ExtendedTrace);
        self.require_refutation();
        sink.write_all(b"0\n")?;
        Ok(())
    }
}
