//! Solve outcomes.
use std::{fmt, ops::Index};

use crate::lit::{Lit, Var};

/// Outcome of a solve call.
///
/// The discriminants are the exit codes conventionally used by SAT solvers.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Status {
    /// The effort limit was reached before the solver could decide the formula.
    Unknown = 0,
    Satisfiable = 10,
    Unsatisfiable = 20,
}

impl Status {
    /// The conventional exit code for this status.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Inverse of [`code`](Status::code).
    pub fn from_code(code: i32) -> Option<Status> {
        match code {
            0 => Some(Status::Unknown),
            10 => Some(Status::Satisfiable),
            20 => Some(Status::Unsatisfiable),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Status::Unknown => "Unknown",
            Status::Satisfiable => "Satisfiable",
            Status::Unsatisfiable => "Unsatisfiable",
        })
    }
}

/// A satisfying assignment indexed by DIMACS variable number.
///
/// Index 0 does not belong to any variable and is always `false`, so a solution for a formula
/// over `n` variables has length `n + 1`.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Solution {
    values: Vec<bool>,
}

impl Solution {
    /// An all-false assignment for `var_count` variables.
    pub fn new(var_count: usize) -> Solution {
        Solution {
            values: vec![false; var_count + 1],
        }
    }

    /// Number of variables covered by this assignment.
    pub fn var_count(&self) -> usize {
        self.values.len().saturating_sub(1)
    }

    /// Length including the unused slot 0.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the solution does not even contain the unused slot 0.
    ///
    /// Never the case for solutions produced by a solver.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, var: Var) -> bool {
        self.values[var.to_dimacs() as usize]
    }

    pub fn set(&mut self, var: Var, value: bool) {
        self.values[var.to_dimacs() as usize] = value;
    }

    /// Whether the given literal is true under this assignment.
    pub fn lit_is_true(&self, lit: Lit) -> bool {
        self.value(lit.var()) == lit.is_positive()
    }

    /// The assignment as one true literal per variable.
    pub fn lits(&self) -> impl Iterator<Item = Lit> + '_ {
        self.values
            .iter()
            .enumerate()
            .skip(1)
            .map(|(number, &value)| Var::from_index(number - 1).lit(value))
    }

    /// Whether every clause has a literal that is true under this assignment.
    ///
    /// Empty clauses are never satisfied.
    pub fn satisfies<'a>(&self, clauses: impl IntoIterator<Item = &'a [Lit]>) -> bool {
        clauses
            .into_iter()
            .all(|clause| clause.iter().any(|&lit| self.lit_is_true(lit)))
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.values
    }
}

/// Takes the raw values including the unused slot 0.
impl From<Vec<bool>> for Solution {
    fn from(values: Vec<bool>) -> Solution {
        Solution { values }
    }
}

impl Index<usize> for Solution {
    type Output = bool;

    fn index(&self, number: usize) -> &bool {
        &self.values[number]
    }
}

impl fmt::Debug for Solution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map()
            .entries(self.values.iter().enumerate().skip(1))
            .finish()
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        for &status in [Status::Unknown, Status::Satisfiable, Status::Unsatisfiable].iter() {
            assert_eq!(Status::from_code(status.code()), Some(status));
        }
        assert_eq!(Status::from_code(-1), None);
    }

    #[test]
    fn lits_skip_slot_zero() {
        let solution = Solution::from(vec![false, true, false, true]);
        assert_eq!(solution.var_count(), 3);
        let lits: Vec<_> = solution.lits().map(Lit::to_dimacs).collect();
        assert_eq!(lits, vec![1, -2, 3]);
        assert_eq!(format!("{:?}", solution), "{1: true, 2: false, 3: true}");
    }

    #[test]
    fn satisfies_checks_every_clause() {
        let solution = Solution::from(vec![false, true, false]);
        let sat = cnf![1; -2, 1; -2;];
        let unsat = cnf![1; 2;];
        assert!(solution.satisfies(sat.iter().cloned()));
        assert!(!solution.satisfies(unsat.iter().cloned()));
        let empty_clause: &[Lit] = &[];
        assert!(!solution.satisfies(Some(empty_clause)));
    }
}
