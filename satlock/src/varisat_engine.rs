//! [`Engine`] implementation backed by the Varisat CDCL solver.
//!
//! Varisat's solver borrows its proof targets and is neither `Send` nor `Sync`, so no solver
//! instance outlives a single call. The engine keeps the clause log instead and replays it into a
//! fresh solver whenever a result is needed. This keeps the engine plain data that a
//! [`Session`](crate::Session) can move between threads.
use std::fmt;
use std::io::Write;

use anyhow::{anyhow, bail, Error};
use log::info;

use varisat::checker::{CheckedProofStep, CheckerData, ProofProcessor};
use varisat::ProofFormat;

use satlock_dimacs::{write_dimacs_clauses, write_dimacs_header, DimacsHeader};

use crate::config::Output;
use crate::engine::Engine;
use crate::formula::{CnfFormula, Lit, LitIdx, Status};

fn to_varisat(lit: Lit) -> varisat::Lit {
    varisat::Lit::from_index(lit.index(), lit.is_positive())
}

fn from_varisat(lit: varisat::Lit) -> Lit {
    Lit::from_index(lit.index(), lit.is_positive())
}

/// Stops a solver after a fixed number of derived clauses.
struct Budget {
    remaining: u64,
    exhausted: bool,
}

impl ProofProcessor for Budget {
    fn process_step(&mut self, step: &CheckedProofStep, _data: CheckerData) -> Result<(), Error> {
        if let CheckedProofStep::AtClause { .. } = step {
            if self.remaining == 0 {
                self.exhausted = true;
                bail!("propagation limit reached");
            }
            self.remaining -= 1;
        }
        Ok(())
    }
}

/// Result of a single solver run.
enum Run {
    Model(Vec<varisat::Lit>),
    Refuted(Vec<varisat::Lit>),
    Exhausted,
}

/// Solve `formula` under `assumptions` in a fresh solver, `limit` of 0 means unbounded.
fn run(
    formula: &varisat::CnfFormula,
    assumptions: &[varisat::Lit],
    limit: u64,
) -> Result<Run, Error> {
    let mut budget = Budget {
        remaining: limit,
        exhausted: false,
    };

    let result = {
        let mut solver = varisat::Solver::new();
        if limit > 0 {
            solver.add_proof_processor(&mut budget);
        }
        solver.add_formula(formula);
        solver.assume(assumptions);

        match solver.solve() {
            Ok(true) => Ok(Run::Model(solver.model().unwrap_or_default())),
            Ok(false) => Ok(Run::Refuted(
                solver.failed_core().map(<[_]>::to_vec).unwrap_or_default(),
            )),
            Err(err) => Err(err),
        }
    };

    match result {
        Ok(run) => Ok(run),
        Err(_) if budget.exhausted => Ok(Run::Exhausted),
        Err(err) => Err(err.into()),
    }
}

/// What the engine remembers of its last solve call.
enum Outcome {
    /// No solve call since the last change.
    Cleared,
    /// Values indexed by variable number, slot 0 unused.
    Satisfiable(Vec<bool>),
    /// Assumptions needed for the refutation.
    Unsatisfiable(Vec<Lit>),
    Unknown,
}

/// A clause subset refuting the formula under a subset of the assumptions.
struct Core {
    clauses: Vec<Vec<Lit>>,
    failed_assumptions: Vec<Lit>,
}

/// Varisat backed engine.
///
/// Assumptions follow the usual incremental interface semantics: they hold for the next solve
/// call only, but stay queryable afterwards until the next `add`, `assume` or `solve`.
pub struct VarisatEngine {
    formula: CnfFormula,
    clause: Vec<Lit>,
    var_count: usize,
    assumptions: Vec<Lit>,
    assumptions_consumed: bool,
    outcome: Outcome,
    inconsistent: bool,
    buffer: Vec<LitIdx>,
    propagation_limit: u64,
    tracing: bool,
    verbosity: u32,
    prefix: String,
    output: Output,
}

impl Default for VarisatEngine {
    fn default() -> VarisatEngine {
        VarisatEngine {
            formula: CnfFormula::new(),
            clause: vec![],
            var_count: 0,
            assumptions: vec![],
            assumptions_consumed: false,
            outcome: Outcome::Cleared,
            inconsistent: false,
            buffer: vec![0],
            propagation_limit: 0,
            tracing: false,
            verbosity: 0,
            prefix: "c ".to_owned(),
            output: Output::default(),
        }
    }
}

impl VarisatEngine {
    /// Create an engine without clauses.
    pub fn new() -> VarisatEngine {
        VarisatEngine::default()
    }

    fn message(&self, level: u32, args: fmt::Arguments) {
        if self.verbosity < level {
            return;
        }
        match self.output {
            Output::Log => info!("{}{}", self.prefix, args),
            Output::Stdout => println!("{}{}", self.prefix, args),
            Output::Stderr => eprintln!("{}{}", self.prefix, args),
        }
    }

    fn touch(&mut self, lit: LitIdx) {
        self.var_count = self.var_count.max(lit.unsigned_abs() as usize);
    }

    /// Start a new assumption set if the current one was used by a solve call.
    fn reset_consumed_assumptions(&mut self) {
        if self.assumptions_consumed {
            self.assumptions.clear();
            self.assumptions_consumed = false;
        }
    }

    fn push_clause(&mut self, clause: &[Lit]) {
        if clause.is_empty() {
            self.inconsistent = true;
        }
        self.formula.add_clause(clause);
    }

    fn solver_formula(&self) -> varisat::CnfFormula {
        let mut formula = varisat::CnfFormula::from(
            self.formula
                .iter()
                .map(|clause| clause.iter().cloned().map(to_varisat).collect::<Vec<_>>()),
        );
        formula.set_var_count(self.var_count);
        formula
    }

    fn fill_buffer(&mut self, lits: impl IntoIterator<Item = Lit>) -> &[LitIdx] {
        self.buffer.clear();
        self.buffer.extend(lits.into_iter().map(Lit::to_dimacs));
        self.buffer.push(0);
        &self.buffer
    }

    /// Greedily extend the empty set by the current assumptions in their order.
    fn maximal_subset(&mut self) -> Result<Vec<Lit>, Error> {
        assert!(
            !self.inconsistent,
            "maximal satisfiable subset of an inconsistent formula"
        );
        let formula = self.solver_formula();

        match run(&formula, &[], self.propagation_limit)? {
            Run::Model(_) => (),
            Run::Refuted(_) => {
                self.inconsistent = true;
                self.message(2, format_args!("formula is inconsistent"));
                return Ok(vec![]);
            }
            Run::Exhausted => bail!("propagation limit reached during subset search"),
        }

        let mut subset: Vec<Lit> = vec![];
        for &lit in self.assumptions.iter() {
            if subset.contains(&lit) {
                continue;
            }
            let mut candidate: Vec<_> = subset.iter().cloned().map(to_varisat).collect();
            candidate.push(to_varisat(lit));
            match run(&formula, &candidate, self.propagation_limit)? {
                Run::Model(_) => subset.push(lit),
                Run::Refuted(_) => (),
                Run::Exhausted => bail!("propagation limit reached during subset search"),
            }
        }

        self.message(
            2,
            format_args!(
                "maximal satisfiable subset of {} assumptions: {:?}",
                self.assumptions.len(),
                subset
            ),
        );
        Ok(subset)
    }

    /// Re-solve the clause log with one selector per clause to find a refuting clause subset.
    fn clausal_core(&self) -> Result<Core, Error> {
        assert!(
            self.tracing,
            "clausal core requires trace generation to be enabled"
        );
        assert!(
            matches!(self.outcome, Outcome::Unsatisfiable(_)),
            "clausal core requires an unsatisfiable result"
        );

        let clauses: Vec<&[Lit]> = self.formula.iter().collect();
        let base = self.var_count;
        let selector = |index: usize| varisat::Lit::from_index(base + index, true);

        let mut formula =
            varisat::CnfFormula::from(clauses.iter().enumerate().map(|(index, clause)| {
                clause
                    .iter()
                    .cloned()
                    .map(to_varisat)
                    .chain(Some(!selector(index)))
                    .collect::<Vec<_>>()
            }));
        formula.set_var_count(base + clauses.len());

        let mut assumptions: Vec<_> = (0..clauses.len()).map(selector).collect();
        assumptions.extend(self.assumptions.iter().cloned().map(to_varisat));

        let failed = match run(&formula, &assumptions, 0)? {
            Run::Refuted(failed) => failed,
            _ => bail!("clause log is satisfiable under the failed assumptions"),
        };

        let mut selected = vec![false; clauses.len()];
        let mut failed_assumptions = vec![];
        for lit in failed {
            if lit.index() >= base {
                selected[lit.index() - base] = true;
            } else {
                failed_assumptions.push(from_varisat(lit));
            }
        }

        let core = Core {
            clauses: clauses
                .iter()
                .zip(selected)
                .filter(|&(_, selected)| selected)
                .map(|(clause, _)| clause.to_vec())
                .collect(),
            failed_assumptions,
        };

        self.message(
            2,
            format_args!(
                "clausal core of {} out of {} clauses",
                core.clauses.len(),
                clauses.len()
            ),
        );
        Ok(core)
    }

    fn write_trace(&self, sink: &mut dyn Write, format: ProofFormat) -> Result<(), Error> {
        let core = self.clausal_core()?;

        let formula = varisat::CnfFormula::from(
            core.clauses
                .iter()
                .map(|clause| clause.iter().cloned().map(to_varisat).collect::<Vec<_>>())
                .chain(
                    core.failed_assumptions
                        .iter()
                        .map(|&lit| vec![to_varisat(lit)]),
                ),
        );

        let mut solver = varisat::Solver::new();
        solver.write_proof(sink, format);
        solver.add_formula(&formula);
        if solver.solve()? {
            bail!("clausal core is satisfiable");
        }
        solver.close_proof()?;
        Ok(())
    }
}

impl Engine for VarisatEngine {
    fn add(&mut self, lit: LitIdx) {
        self.reset_consumed_assumptions();
        self.outcome = Outcome::Cleared;
        if lit == 0 {
            let clause = std::mem::take(&mut self.clause);
            self.push_clause(&clause);
        } else {
            self.touch(lit);
            self.clause.push(Lit::from_dimacs(lit));
        }
    }

    fn assume(&mut self, lit: LitIdx) {
        self.reset_consumed_assumptions();
        self.outcome = Outcome::Cleared;
        self.touch(lit);
        self.assumptions.push(Lit::from_dimacs(lit));
    }

    fn solve(&mut self) -> Result<Status, Error> {
        assert!(self.clause.is_empty(), "solve with an unterminated clause");
        self.reset_consumed_assumptions();
        self.assumptions_consumed = true;

        let assumptions: Vec<_> = self.assumptions.iter().cloned().map(to_varisat).collect();
        let result = run(&self.solver_formula(), &assumptions, self.propagation_limit)?;

        let status = match result {
            Run::Model(model) => {
                let mut values = vec![false; self.var_count + 1];
                for lit in model {
                    if let Some(value) = values.get_mut(lit.index() + 1) {
                        *value = lit.is_positive();
                    }
                }
                self.outcome = Outcome::Satisfiable(values);
                Status::Satisfiable
            }
            Run::Refuted(failed) => {
                if failed.is_empty() {
                    self.inconsistent = true;
                }
                let failed: Vec<_> = failed.into_iter().map(from_varisat).collect();
                let mut failed_assumptions: Vec<Lit> = vec![];
                for &lit in self.assumptions.iter() {
                    if failed.contains(&lit) && !failed_assumptions.contains(&lit) {
                        failed_assumptions.push(lit);
                    }
                }
                self.outcome = Outcome::Unsatisfiable(failed_assumptions);
                Status::Unsatisfiable
            }
            Run::Exhausted => {
                self.outcome = Outcome::Unknown;
                Status::Unknown
            }
        };

        self.message(
            1,
            format_args!(
                "{} with {} assumptions, {} variables, {} clauses",
                status,
                self.assumptions.len(),
                self.var_count,
                self.formula.len()
            ),
        );
        Ok(status)
    }

    fn deref(&self, lit: LitIdx) -> i32 {
        let values = match &self.outcome {
            Outcome::Satisfiable(values) => values,
            _ => panic!("deref requires a satisfiable result"),
        };
        let lit = Lit::from_dimacs(lit);
        let value = values[lit.var().to_dimacs() as usize] ^ lit.is_negative();
        if value {
            1
        } else {
            -1
        }
    }

    fn variables(&self) -> usize {
        self.var_count
    }

    fn added_original_clauses(&self) -> usize {
        self.formula.len()
    }

    fn failed_assumption(&self, lit: LitIdx) -> bool {
        match &self.outcome {
            Outcome::Unsatisfiable(failed) => failed.contains(&Lit::from_dimacs(lit)),
            _ => panic!("failed assumption query requires an unsatisfiable result"),
        }
    }

    fn failed_assumptions(&mut self) -> &[LitIdx] {
        let failed = match &self.outcome {
            Outcome::Unsatisfiable(failed) => failed.clone(),
            _ => panic!("failed assumption query requires an unsatisfiable result"),
        };
        self.fill_buffer(failed)
    }

    fn inconsistent(&self) -> bool {
        self.inconsistent
    }

    fn maximal_satisfiable_subset_of_assumptions(&mut self) -> Result<&[LitIdx], Error> {
        let subset = self.maximal_subset()?;
        self.outcome = Outcome::Cleared;
        Ok(self.fill_buffer(subset))
    }

    fn next_maximal_satisfiable_subset_of_assumptions(&mut self) -> Result<&[LitIdx], Error> {
        let subset = self.maximal_subset()?;
        self.outcome = Outcome::Cleared;

        if !self.inconsistent {
            let mut blocking: Vec<Lit> = vec![];
            for &lit in self.assumptions.iter() {
                if !subset.contains(&lit) && !blocking.contains(&lit) {
                    blocking.push(lit);
                }
            }
            self.message(2, format_args!("blocking subset with {:?}", blocking));
            self.push_clause(&blocking);
        }

        Ok(self.fill_buffer(subset))
    }

    fn set_propagation_limit(&mut self, limit: u64) -> Result<(), Error> {
        self.propagation_limit = limit;
        Ok(())
    }

    fn set_verbosity(&mut self, verbosity: u32) {
        self.verbosity = verbosity;
    }

    fn set_prefix(&mut self, prefix: &str) {
        self.prefix = prefix.to_owned();
    }

    fn set_output(&mut self, output: Output) {
        self.output = output;
    }

    fn enable_trace_generation(&mut self) -> Result<(), Error> {
        if !self.formula.is_empty() || !self.clause.is_empty() {
            return Err(anyhow!(
                "trace generation must be enabled before adding clauses"
            ));
        }
        self.tracing = true;
        Ok(())
    }

    fn print(&mut self, mut sink: &mut dyn Write) -> Result<(), Error> {
        write_dimacs_header(
            &mut sink,
            DimacsHeader {
                var_count: self.var_count,
                clause_count: self.formula.len(),
            },
        )?;
        write_dimacs_clauses(&mut sink, self.formula.iter())?;
        Ok(())
    }

    fn write_clausal_core(&mut self, mut sink: &mut dyn Write) -> Result<(), Error> {
        let core = self.clausal_core()?;
        write_dimacs_header(
            &mut sink,
            DimacsHeader {
                var_count: self.var_count,
                clause_count: core.clauses.len(),
            },
        )?;
        write_dimacs_clauses(&mut sink, core.clauses.iter())?;
        Ok(())
    }

    fn write_compact_trace(&mut self, sink: &mut dyn Write) -> Result<(), Error> {
        self.write_trace(sink, ProofFormat::BinaryDrat)
    }

    fn write_extended_trace(&mut self, sink: &mut dyn Write) -> Result<(), Error> {
        self.write_trace(sink, ProofFormat::Drat)
    }
}
