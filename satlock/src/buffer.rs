//! Reading `0`-terminated literal buffers handed out by an engine.
use crate::error::Error;
use crate::formula::{Lit, LitIdx};

/// Converts a `0`-terminated literal buffer into literals.
///
/// At most `max_len` literals are accepted before the terminator; the variable count is a safe
/// bound for every buffer an engine returns. A buffer without a terminator within that bound is
/// an error rather than being truncated, as it means the buffer is not what it is assumed to be.
pub fn lits_from_buffer(buffer: &[LitIdx], max_len: usize) -> Result<Vec<Lit>, Error> {
    let mut lits = vec![];
    for &number in buffer {
        match Lit::try_from_dimacs(number) {
            None if number == 0 => return Ok(lits),
            _ if lits.len() >= max_len => break,
            Some(lit) => lits.push(lit),
            None => break,
        }
    }
    Err(Error::UnterminatedBuffer { max_len })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_up_to_the_terminator() {
        for max_len in 3..=10 {
            let lits = lits_from_buffer(&[1, -2, 3, 0, 4], max_len).unwrap();
            assert_eq!(lits, satlock_formula::lits![1, -2, 3]);
        }
    }

    #[test]
    fn empty_buffer_is_just_a_terminator() {
        for max_len in 0..=2 {
            assert!(lits_from_buffer(&[0], max_len).unwrap().is_empty());
        }
    }

    #[test]
    fn missing_terminator_fails() {
        for max_len in 0..=5 {
            match lits_from_buffer(&[1, 2, 3], max_len) {
                Err(Error::UnterminatedBuffer { max_len: reported }) => {
                    assert_eq!(reported, max_len)
                }
                other => panic!("expected an unterminated buffer error, got {:?}", other),
            }
        }
    }

    #[test]
    fn terminator_beyond_the_bound_fails() {
        assert!(lits_from_buffer(&[1, 2, 3, 0], 2).is_err());
        assert!(lits_from_buffer(&[], 4).is_err());
        assert!(lits_from_buffer(&[1, LitIdx::min_value(), 0], 4).is_err());
    }
}
