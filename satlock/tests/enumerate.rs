//! Enumerating all satisfying assignments.
use std::collections::HashSet;

use proptest::prelude::*;

use satlock::{Error, Lit, LitIdx, Session, SessionConfig, Solution, Status};
use satlock_formula::cnf::strategy::cnf_formula;

const FORMULA: &[&[LitIdx]] = &[&[1, -5, 4], &[-1, 5, 3, 4], &[-3, -4]];

fn session() -> Result<Session, Error> {
    let session = Session::new(SessionConfig::default())?;
    session.add_clauses(FORMULA)?;
    Ok(session)
}

/// Number of assignments to `variables` variables satisfying `clauses`.
fn brute_force(variables: usize, clauses: &[&[Lit]]) -> usize {
    (0..1u32 << variables)
        .filter(|&bits| {
            let values: Vec<bool> = (0..=variables)
                .map(|number| number > 0 && bits & (1 << (number - 1)) != 0)
                .collect();
            Solution::from(values).satisfies(clauses.iter().cloned())
        })
        .count()
}

#[test]
fn block_every_solution() -> Result<(), Error> {
    let session = session()?;
    let mut seen = HashSet::new();

    loop {
        let (status, solution) = session.solve()?;
        if status != Status::Satisfiable {
            assert_eq!(status, Status::Unsatisfiable);
            break;
        }
        let solution = solution.unwrap();
        assert!(seen.insert(solution.clone()), "{} found twice", solution);
        session.block_solution(&solution)?;
    }

    assert_eq!(seen.len(), 18);
    assert_eq!(session.added_original_clauses()?, 3 + 18);
    Ok(())
}

#[test]
fn solutions_iterator() -> Result<(), Error> {
    let session = session()?;

    let solutions = session.solutions().collect::<Result<Vec<_>, _>>()?;
    assert_eq!(solutions.len(), 18);
    assert_eq!(solutions.iter().collect::<HashSet<_>>().len(), 18);
    assert_eq!(
        solutions.iter().filter(|solution| solution[1]).count(),
        10
    );

    // Every solution is blocked now.
    assert_eq!(session.solutions().count(), 0);
    assert_eq!(session.last_status()?, Some(Status::Unsatisfiable));
    Ok(())
}

#[test]
fn solutions_under_assumptions() -> Result<(), Error> {
    let session = session()?;
    session.assume(Lit::from_dimacs(-1))?;

    // Only the first solve call sees the assumption.
    let first = session.solutions().next().unwrap()?;
    assert!(!first[1]);
    assert_eq!(session.solutions().count(), 17);
    Ok(())
}

#[test]
fn blocking_requires_full_assignment() -> Result<(), Error> {
    let session = session()?;
    let (_, solution) = session.solve()?;
    let solution = solution.unwrap();

    let mut values = solution.as_slice().to_vec();
    values.push(false);

    match session.block_solution(&Solution::from(values)) {
        Err(Error::SolutionLength {
            actual: 7,
            variables: 5,
        }) => (),
        other => panic!("expected a solution length error, got {:?}", other),
    }
    match session.block_solution(&Solution::from(vec![false, true])) {
        Err(Error::SolutionLength {
            actual: 2,
            variables: 5,
        }) => (),
        other => panic!("expected a solution length error, got {:?}", other),
    }

    assert_eq!(session.added_original_clauses()?, 3);
    assert_eq!(session.variables()?, 5);
    assert_eq!(session.solutions().count(), 18);
    Ok(())
}

proptest! {
    #[test]
    fn counts_match_brute_force(formula in cnf_formula(1..7usize, 0..12, 1..4)) {
        let session = Session::new(SessionConfig::default())?;
        session.add_formula(&formula)?;
        let variables = session.variables()?;

        let mut seen = HashSet::new();
        for solution in session.solutions() {
            let solution = solution?;
            prop_assert!(solution.satisfies(formula.iter()));
            prop_assert!(seen.insert(solution));
        }

        prop_assert_eq!(seen.len(), brute_force(variables, &formula.iter().collect::<Vec<_>>()));
    }
}
