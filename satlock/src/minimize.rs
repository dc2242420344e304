//! Bisection search for the smallest feasible parameter of a family of formulas.
use std::panic;
use std::thread;

use crossbeam::channel;
use log::debug;

use crate::error::Error;
use crate::formula::{Solution, Status};

/// A monotone family of problems parameterized by an integer `k`.
///
/// There must be a threshold `K` such that [`is_feasible`](Minimizer::is_feasible) is
/// satisfiable for all `k >= K` and not satisfiable for all `k < K`.
pub trait Minimizer: Sync {
    /// A lower bound for the threshold.
    fn lower_bound(&self) -> i64;

    /// An upper bound for the threshold.
    fn upper_bound(&self) -> i64;

    /// Solve the problem for parameter `k`.
    ///
    /// Any status other than [`Status::Satisfiable`] counts as infeasible.
    fn is_feasible(&self, k: i64) -> Result<(Status, Option<Solution>), Error>;

    /// Receives the result of every [`is_feasible`](Minimizer::is_feasible) call.
    ///
    /// Runs on a separate thread, concurrently with the next feasibility check.
    fn record_solution(&self, k: i64, status: Status, solution: Option<Solution>);
}

/// Result of [`minimize`].
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Minimum {
    /// The smallest feasible parameter found, or the upper bound if that is infeasible.
    pub value: i64,
    /// Whether `value - 1` was shown to be infeasible.
    pub optimal: bool,
    /// Whether the upper bound is feasible.
    pub feasible: bool,
}

/// Find the smallest feasible parameter of `minimizer` between its bounds.
///
/// Every feasibility check is passed to [`Minimizer::record_solution`] exactly once; all of them
/// have completed when this returns.
pub fn minimize<M: Minimizer + ?Sized>(minimizer: &M) -> Result<Minimum, Error> {
    let lower = minimizer.lower_bound();
    let upper = minimizer.upper_bound();
    if upper < lower {
        return Err(Error::InvalidBounds { lower, upper });
    }

    thread::scope(|scope| {
        let (sender, receiver) = channel::unbounded::<(i64, Status, Option<Solution>)>();

        let recorder = scope.spawn(move || {
            for (k, status, solution) in receiver {
                minimizer.record_solution(k, status, solution);
            }
        });

        let check = |k: i64| -> Result<bool, Error> {
            let (status, solution) = minimizer.is_feasible(k)?;
            debug!("parameter {} is {}", k, status);
            // Only fails once the recorder panicked, which joining it reports.
            let _ = sender.send((k, status, solution));
            Ok(status == Status::Satisfiable)
        };

        let result = bisect(lower, upper, check);

        drop(sender);
        if let Err(payload) = recorder.join() {
            panic::resume_unwind(payload);
        }
        result
    })
}

fn bisect(
    mut lo: i64,
    mut hi: i64,
    mut check: impl FnMut(i64) -> Result<bool, Error>,
) -> Result<Minimum, Error> {
    if !check(hi)? {
        return Ok(Minimum {
            value: hi,
            optimal: false,
            feasible: false,
        });
    }

    let mut optimal = false;
    while hi > lo {
        let k = lo + (hi - lo) / 2;
        if check(k)? {
            hi = k;
        } else {
            lo = k + 1;
            optimal = true;
        }
    }

    Ok(Minimum {
        value: hi,
        optimal,
        feasible: true,
    })
}
