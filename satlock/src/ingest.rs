//! Translation of clauses into the engine's terminated literal stream.
use crate::formula::{Lit, LitIdx};

/// Appends the engine encoding of a clause to `stream`.
///
/// The clause ends at its first `0` or at the end of the slice, whichever comes first, and is
/// always followed by exactly one `0`. An empty clause therefore becomes a lone terminator, which
/// the engine reads as the unsatisfiable empty clause.
pub fn encode_clause(clause: &[LitIdx], stream: &mut Vec<LitIdx>) {
    stream.extend(clause.iter().take_while(|&&lit| lit != 0));
    stream.push(0);
}

/// Same as [`encode_clause`] for typed literals, which never contain a terminator.
pub fn encode_lits(clause: &[Lit], stream: &mut Vec<LitIdx>) {
    stream.extend(clause.iter().map(|lit| lit.to_dimacs()));
    stream.push(0);
}

/// The clause ruling out exactly the given assignment.
///
/// Slot 0 of `values` is skipped.
pub fn blocking_clause(values: &[bool], stream: &mut Vec<LitIdx>) {
    stream.extend(
        values
            .iter()
            .enumerate()
            .skip(1)
            .map(|(var, &value)| if value { -(var as LitIdx) } else { var as LitIdx }),
    );
    stream.push(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_all(clauses: &[&[LitIdx]]) -> Vec<LitIdx> {
        let mut stream = vec![];
        for clause in clauses {
            encode_clause(clause, &mut stream);
        }
        stream
    }

    #[test]
    fn implicit_and_explicit_terminators() {
        assert_eq!(encode_all(&[&[1, 2, -3], &[3, 4, 0]]), vec![1, 2, -3, 0, 3, 4, 0]);
    }

    #[test]
    fn input_after_terminator_is_ignored() {
        assert_eq!(
            encode_all(&[&[1, -5, 4, 0, 9], &[-1, 5, 3, 4, 0, 100]]),
            vec![1, -5, 4, 0, -1, 5, 3, 4, 0]
        );
    }

    #[test]
    fn empty_clauses_become_a_lone_terminator() {
        assert_eq!(encode_all(&[&[], &[0], &[0, 7]]), vec![0, 0, 0]);
    }

    #[test]
    fn blocking_negates_every_assignment() {
        let mut stream = vec![];
        blocking_clause(&[false, true, false, true], &mut stream);
        assert_eq!(stream, vec![-1, 2, -3, 0]);

        stream.clear();
        blocking_clause(&[false], &mut stream);
        assert_eq!(stream, vec![0]);
    }

    #[test]
    fn typed_literals() {
        let mut stream = vec![];
        encode_lits(&satlock_formula::lits![-2, 7], &mut stream);
        assert_eq!(stream, vec![-2, 7, 0]);
    }
}
