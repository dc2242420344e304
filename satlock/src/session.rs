//! Thread safe access to an engine.
use std::cmp::Ordering;
use std::io::Write;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use log::{debug, info, trace};

use crate::bridge::redirect;
use crate::buffer::lits_from_buffer;
use crate::config::SessionConfig;
use crate::engine::Engine;
use crate::error::Error;
use crate::formula::{CnfFormula, Lit, LitIdx, Solution, Status};
use crate::ingest::{blocking_clause, encode_clause, encode_lits};
use crate::state::{Event, SolveState};
use crate::varisat_engine::VarisatEngine;

/// The reports an engine can write.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Report {
    Formula,
    ClausalCore,
    CompactTrace,
    ExtendedTrace,
}

/// Bound for engine buffers of literals: each variable in both polarities.
fn distinct_lits(variables: usize) -> usize {
    2 * variables
}

/// State protected by the session lock.
struct Inner<E> {
    /// `None` once the session was deleted.
    engine: Option<E>,
    state: SolveState,
    tracing: bool,
    measure_all_calls: bool,
    elapsed: Duration,
    /// Scratch space for the literal stream sent to the engine.
    stream: Vec<LitIdx>,
}

impl<E: Engine> Inner<E> {
    fn engine(&self) -> Result<&E, Error> {
        self.engine.as_ref().ok_or(Error::NotReady)
    }

    fn engine_mut(&mut self) -> Result<&mut E, Error> {
        self.engine.as_mut().ok_or(Error::NotReady)
    }

    /// Forward the literal stream to the engine.
    fn flush_stream(&mut self) -> Result<(), Error> {
        let engine = self.engine.as_mut().ok_or(Error::NotReady)?;
        trace!("adding {} literals", self.stream.len());
        for &lit in self.stream.iter() {
            engine.add(lit);
        }
        self.stream.clear();
        self.state = self.state.next(Event::Ingest);
        Ok(())
    }

    fn add_clauses<C: AsRef<[LitIdx]>>(
        &mut self,
        clauses: impl IntoIterator<Item = C>,
    ) -> Result<(), Error> {
        self.engine()?;
        for clause in clauses {
            encode_clause(clause.as_ref(), &mut self.stream);
        }
        let invalid = self
            .stream
            .iter()
            .find(|&&lit| lit != 0 && Lit::try_from_dimacs(lit).is_none());
        if let Some(&lit) = invalid {
            self.stream.clear();
            return Err(Error::InvalidLiteral { lit });
        }
        self.flush_stream()
    }

    fn add_formula(&mut self, formula: &CnfFormula) -> Result<(), Error> {
        self.engine()?;
        for clause in formula.iter() {
            encode_lits(clause, &mut self.stream);
        }
        self.flush_stream()
    }

    fn add_clause(&mut self, clause: &[Lit]) -> Result<(), Error> {
        self.engine()?;
        encode_lits(clause, &mut self.stream);
        self.flush_stream()
    }

    fn block_solution(&mut self, solution: &Solution) -> Result<(), Error> {
        let variables = self.engine()?.variables();
        if solution.len() != variables + 1 {
            return Err(Error::SolutionLength {
                actual: solution.len(),
                variables,
            });
        }
        blocking_clause(solution.as_slice(), &mut self.stream);
        self.flush_stream()
    }

    /// Values of all variables after a satisfiable solve call.
    fn solution(&self) -> Result<Solution, Error> {
        let engine = self.engine()?;
        let mut values = vec![false; engine.variables() + 1];
        for (var, value) in values.iter_mut().enumerate().skip(1) {
            *value = match engine.deref(var as LitIdx).cmp(&0) {
                Ordering::Greater => true,
                Ordering::Less => false,
                Ordering::Equal => return Err(Error::UnassignedVariable { var }),
            };
        }
        Ok(Solution::from(values))
    }

    fn solve(&mut self) -> Result<(Status, Option<Solution>), Error> {
        let status = match self.engine_mut()?.solve() {
            Ok(status) => status,
            Err(err) => {
                // A failed call leaves no result to query.
                self.state = self.state.next(Event::Solved(Status::Unknown));
                return Err(Error::engine(err));
            }
        };
        self.state = self.state.next(Event::Solved(status));
        debug!("solve returned {}", status);

        match status {
            Status::Satisfiable => Ok((status, Some(self.solution()?))),
            _ => Ok((status, None)),
        }
    }

    /// One step of solution enumeration.
    fn next_solution(&mut self) -> Result<Option<Solution>, Error> {
        match self.solve()? {
            (Status::Satisfiable, Some(solution)) => {
                self.block_solution(&solution)?;
                Ok(Some(solution))
            }
            _ => Ok(None),
        }
    }

    fn assume(&mut self, lit: Lit) -> Result<(), Error> {
        let engine = self.engine_mut()?;
        trace!("assuming {}", lit);
        engine.assume(lit.to_dimacs());
        self.state = self.state.next(Event::Assume);
        Ok(())
    }

    fn failed_assumptions(&mut self) -> Result<Vec<Lit>, Error> {
        let valid = self.state.assumptions_valid();
        let engine = self.engine_mut()?;
        if !valid {
            return Ok(vec![]);
        }
        let max_len = distinct_lits(engine.variables());
        lits_from_buffer(engine.failed_assumptions(), max_len)
    }

    fn satisfiable_subset(&mut self, next: bool) -> Result<Vec<Lit>, Error> {
        let engine = self.engine_mut()?;
        if engine.inconsistent() {
            return Ok(vec![]);
        }
        let max_len = distinct_lits(engine.variables());
        let buffer = if next {
            engine.next_maximal_satisfiable_subset_of_assumptions()
        } else {
            engine.maximal_satisfiable_subset_of_assumptions()
        };
        let subset = buffer
            .map_err(Error::engine)
            .and_then(|buffer| lits_from_buffer(buffer, max_len));

        self.state = self.state.next(Event::SubsetQuery);
        subset
    }

    fn write_report(
        &mut self,
        report: Report,
        out: &mut (impl Write + Send),
    ) -> Result<(), Error> {
        self.engine()?;
        match report {
            Report::Formula => {
                if self.state.status() != Some(Status::Unsatisfiable) {
                    return Err(Error::NotUnsatisfiable);
                }
            }
            _ => {
                if !self.state.assumptions_valid() {
                    return Err(Error::NotUnsatisfiable);
                }
                if !self.tracing {
                    return Err(Error::TracingDisabled);
                }
            }
        }

        debug!("writing {:?}", report);
        let engine = self.engine_mut()?;
        redirect(out, |sink| {
            let written = match report {
                Report::Formula => engine.print(sink),
                Report::ClausalCore => engine.write_clausal_core(sink),
                Report::CompactTrace => engine.write_compact_trace(sink),
                Report::ExtendedTrace => engine.write_extended_trace(sink),
            };
            written.map_err(Error::engine)
        })
    }
}

/// A solver session that can be shared between threads.
///
/// The engine behind a session is stateful and not synchronized at all. A session serializes
/// every call that changes or depends on that state, while plain counters can be read
/// concurrently. It also tracks the engine's solve state so queries that are only defined in
/// some states are answered without calling the engine.
///
/// All methods fail with [`Error::NotReady`] after [`delete`](Session::delete).
pub struct Session<E = VarisatEngine> {
    inner: RwLock<Inner<E>>,
}

impl Session<VarisatEngine> {
    /// Create a session using the bundled Varisat engine.
    pub fn new(config: SessionConfig) -> Result<Session, Error> {
        Session::with_engine(VarisatEngine::new(), config)
    }
}

impl<E: Engine> Session<E> {
    /// Create a session around an engine that has no clauses yet.
    pub fn with_engine(mut engine: E, config: SessionConfig) -> Result<Session<E>, Error> {
        if config.propagation_limit > 0 {
            engine
                .set_propagation_limit(config.propagation_limit)
                .map_err(Error::engine)?;
        }
        engine.set_verbosity(config.verbosity);
        engine.set_prefix(&config.prefix);
        engine.set_output(config.output);
        if config.enable_trace_generation {
            engine.enable_trace_generation().map_err(Error::engine)?;
        }

        debug!("created session with {:?}", config);

        Ok(Session {
            inner: RwLock::new(Inner {
                engine: Some(engine),
                state: SolveState::default(),
                tracing: config.enable_trace_generation,
                measure_all_calls: config.measure_all_calls,
                elapsed: Duration::default(),
                stream: vec![],
            }),
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<Inner<E>>, Error> {
        self.inner.read().map_err(|_| Error::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<Inner<E>>, Error> {
        self.inner.write().map_err(|_| Error::Poisoned)
    }

    /// Run `action` under the exclusive lock, timing it if requested.
    fn exclusive<T>(
        &self,
        timed: bool,
        action: impl FnOnce(&mut Inner<E>) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut inner = self.write()?;
        let start = Instant::now();
        let result = action(&mut inner);
        if timed || inner.measure_all_calls {
            inner.elapsed += start.elapsed();
        }
        result
    }

    /// Add clauses given as DIMACS literals.
    ///
    /// A clause ends at its first `0` or at the end of its slice. Clauses that are empty, or that
    /// start with `0`, are added as the empty clause, which makes the formula unsatisfiable.
    ///
    /// Fails with [`Error::InvalidLiteral`] and adds nothing if any literal is `i32::MIN`.
    pub fn add_clauses<C: AsRef<[LitIdx]>>(
        &self,
        clauses: impl IntoIterator<Item = C>,
    ) -> Result<(), Error> {
        self.exclusive(false, |inner| inner.add_clauses(clauses))
    }

    /// Add all clauses of a formula.
    pub fn add_formula(&self, formula: &CnfFormula) -> Result<(), Error> {
        self.exclusive(false, |inner| inner.add_formula(formula))
    }

    /// Add a single clause.
    pub fn add_clause(&self, clause: &[Lit]) -> Result<(), Error> {
        self.exclusive(false, |inner| inner.add_clause(clause))
    }

    /// Check the satisfiability of the current formula under the current assumptions.
    ///
    /// Returns the satisfying assignment if there is one. The assignment is not blocked; use
    /// [`block_solution`](Session::block_solution) or [`solutions`](Session::solutions) to
    /// enumerate assignments.
    pub fn solve(&self) -> Result<(Status, Option<Solution>), Error> {
        self.exclusive(true, Inner::solve)
    }

    /// Add a clause ruling out exactly the given assignment.
    ///
    /// The solution must cover every variable of the formula, i.e. have length `variables() + 1`,
    /// otherwise nothing is added.
    pub fn block_solution(&self, solution: &Solution) -> Result<(), Error> {
        self.exclusive(false, |inner| inner.block_solution(solution))
    }

    /// Iterator over all remaining satisfying assignments.
    ///
    /// Each step solves and blocks the found assignment, so the clauses grow with every item.
    /// The iterator ends after the first solve call that is not satisfiable or after an error.
    pub fn solutions(&self) -> Solutions<E> {
        Solutions {
            session: self,
            done: false,
        }
    }

    /// Assume a literal for the next solve call.
    ///
    /// The assumption stays queryable after that call until the next call that adds clauses,
    /// assumes or solves.
    pub fn assume(&self, lit: Lit) -> Result<(), Error> {
        self.exclusive(false, |inner| inner.assume(lit))
    }

    /// Whether `lit` was an assumption used to refute the formula in the last solve call.
    ///
    /// Always false unless the last solve call was unsatisfiable and nothing changed since.
    pub fn failed_assumption(&self, lit: Lit) -> Result<bool, Error> {
        let inner = self.read()?;
        let engine = inner.engine()?;
        Ok(inner.state.assumptions_valid() && engine.failed_assumption(lit.to_dimacs()))
    }

    /// All assumptions for which [`failed_assumption`](Session::failed_assumption) is true.
    pub fn failed_assumptions(&self) -> Result<Vec<Lit>, Error> {
        self.exclusive(false, Inner::failed_assumptions)
    }

    /// A maximal subset of the current assumptions that is satisfiable together with the
    /// formula.
    ///
    /// Empty if the formula is unsatisfiable without any assumptions.
    pub fn max_satisfiable_assumptions(&self) -> Result<Vec<Lit>, Error> {
        self.exclusive(false, |inner| inner.satisfiable_subset(false))
    }

    /// Like [`max_satisfiable_assumptions`](Session::max_satisfiable_assumptions) but returns a
    /// different subset on each call.
    ///
    /// Each call adds a clause excluding the returned subset, which is visible in
    /// [`added_original_clauses`](Session::added_original_clauses). Once every maximal subset was
    /// returned the result is empty.
    pub fn next_max_satisfiable_assumptions(&self) -> Result<Vec<Lit>, Error> {
        self.exclusive(false, |inner| inner.satisfiable_subset(true))
    }

    /// Write the formula as DIMACS CNF.
    ///
    /// Only available after an unsatisfiable solve call. Clause order may differ from the order
    /// the clauses were added in.
    pub fn print(&self, mut out: impl Write + Send) -> Result<(), Error> {
        self.exclusive(false, |inner| inner.write_report(Report::Formula, &mut out))
    }

    /// Write a subset of the clauses that is unsatisfiable under the failed assumptions.
    ///
    /// Needs trace generation and must directly follow an unsatisfiable solve call.
    pub fn write_clausal_core(&self, mut out: impl Write + Send) -> Result<(), Error> {
        self.exclusive(false, |inner| {
            inner.write_report(Report::ClausalCore, &mut out)
        })
    }

    /// Write a compact proof of the last unsatisfiable result.
    ///
    /// Same requirements as [`write_clausal_core`](Session::write_clausal_core).
    pub fn write_compact_trace(&self, mut out: impl Write + Send) -> Result<(), Error> {
        self.exclusive(false, |inner| {
            inner.write_report(Report::CompactTrace, &mut out)
        })
    }

    /// Write a human readable proof of the last unsatisfiable result.
    ///
    /// Same requirements as [`write_clausal_core`](Session::write_clausal_core).
    pub fn write_extended_trace(&self, mut out: impl Write + Send) -> Result<(), Error> {
        self.exclusive(false, |inner| {
            inner.write_report(Report::ExtendedTrace, &mut out)
        })
    }

    /// Largest variable number used in clauses or assumptions.
    pub fn variables(&self) -> Result<usize, Error> {
        Ok(self.read()?.engine()?.variables())
    }

    /// Number of clauses added, including blocking clauses.
    pub fn added_original_clauses(&self) -> Result<usize, Error> {
        Ok(self.read()?.engine()?.added_original_clauses())
    }

    /// Time spent in solve calls, or in all calls if `measure_all_calls` is set.
    pub fn elapsed(&self) -> Result<Duration, Error> {
        let inner = self.read()?;
        inner.engine()?;
        Ok(inner.elapsed)
    }

    /// Status of the last solve call, `None` before the first one.
    pub fn last_status(&self) -> Result<Option<Status>, Error> {
        let inner = self.read()?;
        inner.engine()?;
        Ok(inner.state.status())
    }

    /// Release the engine.
    ///
    /// Every later call fails with [`Error::NotReady`]. Deleting again does nothing.
    pub fn delete(&self) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(engine) = inner.engine.take() {
            drop(engine);
            info!("session deleted");
        }
    }
}

impl<E> Drop for Session<E> {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
        if inner.engine.take().is_some() {
            debug!("session dropped without delete");
        }
    }
}

/// Iterator returned by [`Session::solutions`].
pub struct Solutions<'a, E: Engine = VarisatEngine> {
    session: &'a Session<E>,
    done: bool,
}

impl<'a, E: Engine> Iterator for Solutions<'a, E> {
    type Item = Result<Solution, Error>;

    fn next(&mut self) -> Option<Result<Solution, Error>> {
        if self.done {
            return None;
        }
        match self.session.exclusive(true, Inner::next_solution) {
            Ok(Some(solution)) => Some(Ok(solution)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
