//! DIMACS CNF reading and writing for the satlock crates.
//!
//! The engine reports formulas in this format and the command line tool reads its input with
//! it. Only plain `p cnf` input is understood. A line holding a single `%` ends the input, as in
//! the SATLIB benchmark files.

use std::borrow::Borrow;
use std::convert::TryFrom;
use std::io::{self, BufRead};

use satlock_formula::{CnfFormula, Lit, LitIdx};

use thiserror::Error;

/// Possible errors while parsing a DIMACS CNF formula.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("line {line}: expected a literal, found '{token}'")]
    Syntax { line: usize, token: String },
    #[error("line {line}: literal {token} is out of range")]
    LiteralOutOfRange { line: usize, token: String },
    #[error("line {line}: malformed header '{header}', expected 'p cnf <variables> <clauses>'")]
    Header { line: usize, header: String },
    #[error("line {line}: header after the first clause or a second header")]
    MisplacedHeader { line: usize },
    #[error("line {line}: last clause is missing its terminating 0")]
    UnterminatedClause { line: usize },
    #[error("header declares {declared} {counted} but the input has {found}")]
    HeaderMismatch {
        counted: Counted,
        declared: usize,
        found: usize,
    },
}

/// What a [`ParserError::HeaderMismatch`] is about.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Counted {
    Variables,
    Clauses,
}

impl std::fmt::Display for Counted {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(match self {
            Counted::Variables => "variables",
            Counted::Clauses => "clauses",
        })
    }
}

/// Variable and clause count of a `p cnf` line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DimacsHeader {
    pub var_count: usize,
    pub clause_count: usize,
}

impl DimacsHeader {
    /// The header describing `formula`.
    pub fn of(formula: &CnfFormula) -> DimacsHeader {
        DimacsHeader {
            var_count: formula.var_count(),
            clause_count: formula.len(),
        }
    }
}

/// Incremental DIMACS CNF parser, fed one line at a time.
///
/// A clause may span lines and a line may hold several clauses; only `0` ends a clause.
#[derive(Default)]
pub struct DimacsParser {
    formula: CnfFormula,
    clause: Vec<Lit>,
    header: Option<DimacsHeader>,
    line: usize,
    done: bool,
}

impl DimacsParser {
    pub fn new() -> DimacsParser {
        DimacsParser::default()
    }

    /// Reads a whole formula and checks it against its header, if there is one.
    ///
    /// A header raises the variable count of the result to the declared count.
    pub fn parse(input: impl io::Read) -> Result<CnfFormula, anyhow::Error> {
        let (_, formula) = DimacsParser::parse_with_header(input)?;
        Ok(formula)
    }

    /// Like [`parse`](DimacsParser::parse) but also returns the header.
    pub fn parse_with_header(
        input: impl io::Read,
    ) -> Result<(Option<DimacsHeader>, CnfFormula), anyhow::Error> {
        let mut parser = DimacsParser::new();
        let mut reader = io::BufReader::new(input);
        let mut line = String::new();
        while !parser.done && reader.read_line(&mut line)? != 0 {
            parser.feed_line(&line)?;
            line.clear();
        }
        Ok(parser.finish()?)
    }

    /// Parses one line of input. Lines after the `%` end marker are ignored.
    pub fn feed_line(&mut self, line: &str) -> Result<(), ParserError> {
        if self.done {
            return Ok(());
        }
        self.line += 1;

        let first = match line.split_ascii_whitespace().next() {
            Some(first) => first,
            None => return Ok(()),
        };
        if first == "%" {
            self.done = true;
            Ok(())
        } else if first.starts_with('c') {
            Ok(())
        } else if first.starts_with('p') {
            self.header_line(line)
        } else {
            line.split_ascii_whitespace()
                .try_for_each(|token| self.token(token))
        }
    }

    /// Checks that the input ended cleanly and returns the header and formula.
    pub fn finish(self) -> Result<(Option<DimacsHeader>, CnfFormula), ParserError> {
        if !self.clause.is_empty() {
            return Err(ParserError::UnterminatedClause { line: self.line });
        }
        if let Some(header) = self.header {
            let found = DimacsHeader::of(&self.formula);
            if found.var_count != header.var_count {
                return Err(ParserError::HeaderMismatch {
                    counted: Counted::Variables,
                    declared: header.var_count,
                    found: found.var_count,
                });
            }
            if found.clause_count != header.clause_count {
                return Err(ParserError::HeaderMismatch {
                    counted: Counted::Clauses,
                    declared: header.clause_count,
                    found: found.clause_count,
                });
            }
        }
        Ok((self.header, self.formula))
    }

    fn token(&mut self, token: &str) -> Result<(), ParserError> {
        let number: i64 = token.parse().map_err(|_| ParserError::Syntax {
            line: self.line,
            token: token.to_owned(),
        })?;
        if number == 0 {
            self.formula.add_clause(self.clause.drain(..));
            return Ok(());
        }
        let lit = LitIdx::try_from(number)
            .ok()
            .and_then(Lit::try_from_dimacs)
            .ok_or_else(|| ParserError::LiteralOutOfRange {
                line: self.line,
                token: token.to_owned(),
            })?;
        self.clause.push(lit);
        Ok(())
    }

    fn header_line(&mut self, line: &str) -> Result<(), ParserError> {
        if self.header.is_some() || !self.formula.is_empty() || !self.clause.is_empty() {
            return Err(ParserError::MisplacedHeader { line: self.line });
        }

        let fields: Vec<&str> = line.split_ascii_whitespace().collect();
        let header = match fields[..] {
            ["p", "cnf", vars, clauses] => match (vars.parse(), clauses.parse()) {
                (Ok(var_count), Ok(clause_count)) => Some(DimacsHeader {
                    var_count,
                    clause_count,
                }),
                _ => None,
            },
            _ => None,
        };
        let header = header.ok_or_else(|| ParserError::Header {
            line: self.line,
            header: line.trim().to_owned(),
        })?;

        if LitIdx::try_from(header.var_count).is_err() {
            return Err(ParserError::LiteralOutOfRange {
                line: self.line,
                token: header.var_count.to_string(),
            });
        }

        self.formula.set_var_count(header.var_count);
        self.header = Some(header);
        Ok(())
    }
}

/// Writes a `p cnf` line.
///
/// Together with [`write_dimacs_clauses`] this writes a formula that is not held in memory as a
/// [`CnfFormula`].
pub fn write_dimacs_header(target: &mut impl io::Write, header: DimacsHeader) -> io::Result<()> {
    writeln!(target, "p cnf {} {}", header.var_count, header.clause_count)
}

/// Writes clauses, one per line and each terminated by `0`, without a header.
pub fn write_dimacs_clauses(
    target: &mut impl io::Write,
    clauses: impl IntoIterator<Item = impl IntoIterator<Item = impl Borrow<Lit>>>,
) -> io::Result<()> {
    for clause in clauses {
        for lit in clause {
            itoa::write(&mut *target, lit.borrow().to_dimacs())?;
            target.write_all(b" ")?;
        }
        target.write_all(b"0\n")?;
    }
    Ok(())
}

/// Writes a formula with its header.
pub fn write_dimacs(target: &mut impl io::Write, formula: &CnfFormula) -> io::Result<()> {
    write_dimacs_header(&mut *target, DimacsHeader::of(formula))?;
    write_dimacs_clauses(&mut *target, formula)
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::{test_runner::TestCaseError, *};

    use satlock_formula::{cnf::strategy::*, cnf_formula};

    fn parse_err(input: &str) -> ParserError {
        match DimacsParser::parse(input.as_bytes()) {
            Ok(formula) => panic!("parsed {:?} from {:?}", formula, input),
            Err(err) => match err.downcast() {
                Ok(err) => err,
                Err(err) => panic!("not a parser error: {}", err),
            },
        }
    }

    #[test]
    fn clauses_ignore_line_breaks() -> Result<(), anyhow::Error> {
        let input = "c two\nc comments\n\np cnf 5 3\n1 -2\n  3 0 -4 0\n\t5\n0\n";
        let (header, formula) = DimacsParser::parse_with_header(input.as_bytes())?;

        assert_eq!(
            header,
            Some(DimacsHeader {
                var_count: 5,
                clause_count: 3
            })
        );
        assert_eq!(
            formula,
            cnf_formula![
                1, -2, 3;
                -4;
                5;
            ]
        );
        Ok(())
    }

    #[test]
    fn headerless_input() -> Result<(), anyhow::Error> {
        let (header, formula) = DimacsParser::parse_with_header(&b"-3 0\n0\n"[..])?;
        assert_eq!(header, None);
        assert_eq!(formula.var_count(), 3);
        assert_eq!(formula.len(), 2);
        assert!(formula[1].is_empty());
        Ok(())
    }

    #[test]
    fn header_declares_unused_variables() -> Result<(), anyhow::Error> {
        let formula = DimacsParser::parse(&b"p cnf 9 1\n2 0\n"[..])?;
        assert_eq!(formula.var_count(), 9);
        Ok(())
    }

    #[test]
    fn percent_ends_the_input() -> Result<(), anyhow::Error> {
        let input = "p cnf 3 2\n1 2 0\n-3 0\n%\n0\n\n";
        let formula = DimacsParser::parse(input.as_bytes())?;
        assert_eq!(formula, cnf_formula![1, 2; -3;]);
        Ok(())
    }

    #[test]
    fn malformed_headers() {
        for &header in ["p", "p cnf", "p cnf 3", "p cnf 3 4 5", "p dnf 3 4", "pcnf 3 4"].iter() {
            match parse_err(header) {
                ParserError::Header { line: 1, .. } => (),
                other => panic!("{:?} gave {:?}", header, other),
            }
        }
        match parse_err("p cnf -1 2") {
            ParserError::Header { header, .. } => assert_eq!(header, "p cnf -1 2"),
            other => panic!("{:?}", other),
        }
        match parse_err("p cnf 3000000000 1") {
            ParserError::LiteralOutOfRange { .. } => (),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn headers_come_first_and_once() {
        match parse_err("p cnf 1 1\np cnf 1 1\n1 0\n") {
            ParserError::MisplacedHeader { line: 2 } => (),
            other => panic!("{:?}", other),
        }
        match parse_err("1\np cnf 1 1\n0\n") {
            ParserError::MisplacedHeader { line: 2 } => (),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn counts_must_match_the_header() {
        match parse_err("p cnf 2 1\n3 0\n") {
            ParserError::HeaderMismatch {
                counted: Counted::Variables,
                declared: 2,
                found: 3,
            } => (),
            other => panic!("{:?}", other),
        }
        let err = parse_err("p cnf 2 1\n1 0 2 0\n");
        assert_eq!(
            err.to_string(),
            "header declares 1 clauses but the input has 2"
        );
    }

    #[test]
    fn bad_literals() {
        for &(input, line) in [("1 x 0", 1), ("\n2 -\n0", 2), ("1 --2 0", 1), ("0.5 0", 1)].iter() {
            match parse_err(input) {
                ParserError::Syntax { line: found, .. } => assert_eq!(found, line),
                other => panic!("{:?} gave {:?}", input, other),
            }
        }
        for &input in ["2147483648 0", "-2147483648 0", "99999999999999 0"].iter() {
            match parse_err(input) {
                ParserError::LiteralOutOfRange { token, .. } => {
                    assert_eq!(format!("{} 0", token), input)
                }
                other => panic!("{:?} gave {:?}", input, other),
            }
        }
    }

    #[test]
    fn unterminated_clause() {
        match parse_err("p cnf 2 1\n1\n2\n") {
            ParserError::UnterminatedClause { line: 3 } => (),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn io_errors_pass_through() {
        struct Unreadable;

        impl io::Read for Unreadable {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "unreadable"))
            }
        }

        let err = DimacsParser::parse(Unreadable).unwrap_err();
        assert_eq!(err.downcast::<io::Error>().unwrap().to_string(), "unreadable");
    }

    #[test]
    fn written_format() -> Result<(), anyhow::Error> {
        let mut formula = cnf_formula![-1, 20;];
        formula.add_clause(Vec::<Lit>::new());
        formula.add_clause(&[Lit::from_dimacs(3)]);

        let mut written = vec![];
        write_dimacs(&mut written, &formula)?;
        assert_eq!(&written[..], &b"p cnf 20 3\n-1 20 0\n0\n3 0\n"[..]);
        Ok(())
    }

    proptest! {
        #[test]
        fn written_formulas_parse_back(formula in cnf_formula(1..60usize, 0..80, 0..8)) {
            let mut written = vec![];
            write_dimacs(&mut written, &formula)?;

            let parsed = DimacsParser::parse(&written[..])
                .map_err(|err| TestCaseError::fail(err.to_string()))?;
            prop_assert_eq!(parsed, formula);
        }
    }
}
