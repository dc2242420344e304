//! CNF formulas.
use std::fmt;
use std::iter::Extend;
use std::ops::Index;

use crate::lit::Lit;

/// A formula in conjunctive normal form (CNF).
///
/// This is the clause log kept by engines and passed to sessions. All literals share one buffer,
/// clause `i` ends at `ends[i]` and starts where clause `i - 1` ended. Clauses can only be
/// appended.
#[derive(Default, Eq, Clone)]
pub struct CnfFormula {
    var_count: usize,
    literals: Vec<Lit>,
    ends: Vec<usize>,
}

impl CnfFormula {
    pub fn new() -> CnfFormula {
        CnfFormula::default()
    }

    /// Largest variable number in the formula, or the count set with
    /// [`set_var_count`](CnfFormula::set_var_count) if that is larger.
    pub fn var_count(&self) -> usize {
        self.var_count
    }

    /// Count variables up to `count` even if they do not occur in any clause.
    ///
    /// Never decreases the variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.var_count = self.var_count.max(count);
    }

    /// Number of clauses.
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// Total number of literals over all clauses.
    pub fn literal_count(&self) -> usize {
        self.literals.len()
    }

    /// Appends a clause.
    ///
    /// `literals` can be an `IntoIterator<Item = Lit>` or `IntoIterator<Item = &Lit>`. An empty
    /// clause is kept as such.
    pub fn add_clause<L>(&mut self, literals: impl IntoIterator<Item = L>)
    where
        Vec<Lit>: Extend<L>,
    {
        let begin = self.literals.len();
        self.literals.extend(literals);
        if let Some(max_var) = self.literals[begin..].iter().map(|lit| lit.index() + 1).max() {
            self.set_var_count(max_var);
        }
        self.ends.push(self.literals.len());
    }

    /// The clause at `index` in insertion order.
    pub fn clause(&self, index: usize) -> &[Lit] {
        let begin = match index {
            0 => 0,
            _ => self.ends[index - 1],
        };
        &self.literals[begin..self.ends[index]]
    }

    /// Iterator over all clauses in insertion order.
    pub fn iter(&self) -> Clauses {
        Clauses {
            formula: self,
            next: 0,
        }
    }
}

/// Iterator returned by [`CnfFormula::iter`].
#[derive(Clone)]
pub struct Clauses<'a> {
    formula: &'a CnfFormula,
    next: usize,
}

impl<'a> Iterator for Clauses<'a> {
    type Item = &'a [Lit];

    fn next(&mut self) -> Option<&'a [Lit]> {
        if self.next == self.formula.len() {
            return None;
        }
        let clause = self.formula.clause(self.next);
        self.next += 1;
        Some(clause)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.formula.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for Clauses<'a> {}

impl<'a> IntoIterator for &'a CnfFormula {
    type Item = &'a [Lit];
    type IntoIter = Clauses<'a>;

    fn into_iter(self) -> Clauses<'a> {
        self.iter()
    }
}

impl Index<usize> for CnfFormula {
    type Output = [Lit];

    fn index(&self, index: usize) -> &[Lit] {
        self.clause(index)
    }
}

/// Convert any iterable of [`Lit`] iterables into a CnfFormula
impl<F, I, L> From<F> for CnfFormula
where
    F: IntoIterator<Item = I>,
    I: IntoIterator<Item = L>,
    Vec<Lit>: Extend<L>,
{
    fn from(clauses: F) -> CnfFormula {
        let mut formula = CnfFormula::new();
        formula.extend(clauses);
        formula
    }
}

impl<I, L> Extend<I> for CnfFormula
where
    I: IntoIterator<Item = L>,
    Vec<Lit>: Extend<L>,
{
    fn extend<F: IntoIterator<Item = I>>(&mut self, clauses: F) {
        for clause in clauses {
            self.add_clause(clause);
        }
    }
}

impl fmt::Debug for CnfFormula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} vars ", self.var_count)?;
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Formulas are equal if they have the same variable count and the same clauses in the same
/// order.
impl PartialEq for CnfFormula {
    fn eq(&self, other: &CnfFormula) -> bool {
        self.var_count == other.var_count
            && self.ends == other.ends
            && self.literals == other.literals
    }
}

#[cfg(any(test, feature = "proptest-strategies"))]
#[doc(hidden)]
pub mod strategy {
    use super::*;

    use proptest::{collection::SizeRange, prelude::*, *};

    use crate::lit::strategy::lit;

    /// Random formulas over `vars` variables; the variable count is set even if some are unused.
    pub fn cnf_formula(
        vars: impl Strategy<Value = usize>,
        clauses: impl Into<SizeRange>,
        clause_len: impl Into<SizeRange>,
    ) -> impl Strategy<Value = CnfFormula> {
        let clauses = clauses.into();
        let clause_len = clause_len.into();

        vars.prop_ind_flat_map(move |vars| {
            collection::vec(
                collection::vec(lit(0..vars), clause_len.clone()),
                clauses.clone(),
            )
            .prop_map(move |clauses| {
                let mut formula = CnfFormula::from(clauses);
                formula.set_var_count(vars);
                formula
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{strategy::*, *};

    use proptest::*;

    #[test]
    fn clauses_by_index() {
        let mut formula = cnf_formula![
            1, 2, 3;
            -1, -2;
            7, 2;
        ];
        formula.add_clause(Vec::<Lit>::new());
        formula.add_clause(&lits![4, 5]);

        assert_eq!(formula.len(), 5);
        assert_eq!(formula.literal_count(), 9);
        assert_eq!(formula.var_count(), 7);

        assert_eq!(&formula[0], &lits![1, 2, 3]);
        assert_eq!(formula.clause(2), &lits![7, 2]);
        assert!(formula[3].is_empty());
        assert_eq!(&formula[4], &lits![4, 5]);

        let iter = formula.iter();
        assert_eq!(iter.len(), 5);
        assert_eq!(iter.clone().nth(1), Some(&lits![-1, -2][..]));
        assert_eq!(iter.skip(4).next(), Some(&lits![4, 5][..]));
    }

    #[test]
    fn unused_variables_are_counted() {
        let mut formula = cnf_formula![
            2, -3;
        ];
        assert_eq!(formula.var_count(), 3);
        formula.set_var_count(10);
        formula.set_var_count(5);
        assert_eq!(formula.var_count(), 10);
        assert_ne!(formula, cnf_formula![2, -3;]);
    }

    proptest! {
        #[test]
        fn var_count_covers_every_literal(input in cnf_formula(1..50usize, 0..100, 0..6)) {
            for clause in &input {
                for lit in clause {
                    prop_assert!(lit.index() < input.var_count());
                }
            }

            let copy = CnfFormula::from(input.iter());
            prop_assert!(copy.var_count() <= input.var_count());
            prop_assert_eq!(copy.len(), input.len());
            prop_assert_eq!(copy.literal_count(), input.literal_count());
        }
    }
}
