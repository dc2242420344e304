//! Literals and variables.
use std::{fmt, num::NonZeroI32, ops};

/// The backing type used at the engine boundary for literals.
pub type LitIdx = i32;

/// A boolean variable.
///
/// Variables are numbered starting at 1, as in the DIMACS CNF format. Internally the 0-based
/// index is stored, so that a `Var` can directly index per-variable vectors that skip index 0.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Var {
    index: u32,
}

impl Var {
    /// Creates a variable from a 1-based index as used in the DIMACS CNF encoding.
    ///
    /// Panics if the number is not positive.
    #[inline]
    pub fn from_dimacs(number: LitIdx) -> Var {
        assert!(number > 0, "variable numbers are positive, got {}", number);
        Var {
            index: (number - 1) as u32,
        }
    }

    /// Creates a variable from a 0-based index.
    #[inline]
    pub fn from_index(index: usize) -> Var {
        debug_assert!(index <= Var::max_var().index());
        Var {
            index: index as u32,
        }
    }

    /// The 1-based number representing this variable in the DIMACS CNF encoding.
    #[inline]
    pub fn to_dimacs(self) -> LitIdx {
        (self.index + 1) as LitIdx
    }

    /// The 0-based index representing this variable.
    #[inline]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// The variable with largest index that is supported.
    ///
    /// Its negation must still fit into a [`LitIdx`].
    pub const fn max_var() -> Var {
        Var {
            index: (LitIdx::max_value() - 1) as u32,
        }
    }

    /// Creates a literal from this var and a `bool` that is `true` when the literal is positive.
    #[inline]
    pub fn lit(self, polarity: bool) -> Lit {
        Lit::from_var(self, polarity)
    }

    /// Creates a positive literal from this var.
    #[inline]
    pub fn positive(self) -> Lit {
        Lit::from_var(self, true)
    }

    /// Creates a negative literal from this var.
    #[inline]
    pub fn negative(self) -> Lit {
        Lit::from_var(self, false)
    }
}

/// Uses the 1-based DIMACS CNF encoding.
impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}

/// Uses the 1-based DIMACS CNF encoding.
impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A boolean literal.
///
/// A literal is a variable or the negation of a variable. It is stored as the signed DIMACS
/// number, which is also what the engine boundary exchanges. Zero is the clause terminator of
/// that encoding and therefore never a literal, which also gives `Option<Lit>` a free niche.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Lit {
    number: NonZeroI32,
}

impl Lit {
    /// Creates a literal from a `Var` and a `bool` that is `true` when the literal is positive.
    #[inline]
    pub fn from_var(var: Var, polarity: bool) -> Lit {
        let number = var.to_dimacs();
        Lit::from_dimacs(if polarity { number } else { -number })
    }

    /// Create a literal from a 0-based variable index and a polarity.
    #[inline]
    pub fn from_index(index: usize, polarity: bool) -> Lit {
        Lit::from_var(Var::from_index(index), polarity)
    }

    /// Creates a literal from a nonzero integer.
    ///
    /// The absolute value is used as 1-based index, the sign of the integer is used as sign of the
    /// literal. Panics on zero, use [`try_from_dimacs`](Lit::try_from_dimacs) for untrusted input.
    #[inline]
    pub fn from_dimacs(number: LitIdx) -> Lit {
        match Lit::try_from_dimacs(number) {
            Some(lit) => lit,
            None => panic!("{} is not a literal", number),
        }
    }

    /// Creates a literal from an integer, returning `None` for the terminator `0`.
    #[inline]
    pub fn try_from_dimacs(number: LitIdx) -> Option<Lit> {
        if number == LitIdx::min_value() {
            return None;
        }
        NonZeroI32::new(number).map(|number| Lit { number })
    }

    /// 1-based integer representation of the literal, opposite of `from_dimacs`.
    #[inline]
    pub fn to_dimacs(self) -> LitIdx {
        self.number.get()
    }

    /// 0-based index of the literal's _variable_.
    #[inline]
    pub fn index(self) -> usize {
        self.var().index()
    }

    /// The literal's variable.
    #[inline]
    pub fn var(self) -> Var {
        Var::from_dimacs(self.number.get().abs())
    }

    /// Whether the literal is negative, i.e. a negated variable.
    #[inline]
    pub fn is_negative(self) -> bool {
        self.number.get() < 0
    }

    /// Whether the literal is positive, i.e. a non-negated variable.
    #[inline]
    pub fn is_positive(self) -> bool {
        !self.is_negative()
    }
}

impl ops::Not for Lit {
    type Output = Lit;

    #[inline]
    fn not(self) -> Lit {
        Lit::from_dimacs(-self.number.get())
    }
}

impl ops::BitXor<bool> for Lit {
    type Output = Lit;

    #[inline]
    fn bitxor(self, rhs: bool) -> Lit {
        if rhs {
            !self
        } else {
            self
        }
    }
}

/// Uses the 1-based DIMACS CNF encoding.
impl fmt::Debug for Lit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}

/// Uses the 1-based DIMACS CNF encoding.
impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(any(test, feature = "proptest-strategies"))]
#[doc(hidden)]
pub mod strategy {
    use super::*;
    use proptest::{prelude::*, *};

    pub fn var(index: impl Strategy<Value = usize>) -> impl Strategy<Value = Var> {
        index.prop_map(Var::from_index)
    }

    pub fn lit(index: impl Strategy<Value = usize>) -> impl Strategy<Value = Lit> {
        (var(index), bool::ANY).prop_map(|(var, polarity)| var.lit(polarity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimacs_numbering() {
        let lit = Lit::from_dimacs(-3);
        assert!(lit.is_negative());
        assert_eq!(lit.var(), Var::from_dimacs(3));
        assert_eq!(lit.index(), 2);
        assert_eq!((!lit).to_dimacs(), 3);
        assert_eq!(lit ^ true, !lit);
        assert_eq!(lit ^ false, lit);
        assert_eq!(Var::from_index(0).positive(), Lit::from_dimacs(1));
    }

    #[test]
    fn terminator_is_not_a_literal() {
        assert_eq!(Lit::try_from_dimacs(0), None);
        assert_eq!(Lit::try_from_dimacs(LitIdx::min_value()), None);
        assert_eq!(Lit::try_from_dimacs(7), Some(Lit::from_dimacs(7)));
        assert_eq!(std::mem::size_of::<Option<Lit>>(), 4);
    }

    #[test]
    #[should_panic]
    fn zero_literal_panics() {
        Lit::from_dimacs(0);
    }

    #[test]
    fn max_var_roundtrip() {
        let var = Var::max_var();
        assert_eq!(var.to_dimacs(), LitIdx::max_value());
        assert_eq!(var.negative().to_dimacs(), -LitIdx::max_value());
    }
}
