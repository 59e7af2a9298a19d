//! Exact rational numbers backed by 64-bit integers.

use num_traits::{CheckedAdd, CheckedDiv, CheckedMul, CheckedSub, One, Zero};
use std::{
    cmp::Ordering,
    convert::TryFrom,
    error::Error,
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
    iter::{Product, Sum},
    ops::{
        Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Range, Sub,
        SubAssign,
    },
    str::FromStr,
};

/// A rational number, `numerator / denominator`.
///
/// A [`Fraction`] may be created in any form (e.g. `6/-8`), but every
/// arithmetic operation hands back the canonical form, where the numerator
/// and denominator share no common factor and the sign lives in the
/// numerator. A zero denominator is treated as an error state and collapses
/// to `0/1` when simplified.
///
/// Comparisons look at the value being represented, not the raw fields, so
/// `Fraction::new(1, 2) == Fraction::new(-2, -4)`.
///
/// The operator impls (`+`, `-`, `*`, `/`) panic when the divisor is zero or
/// when a result can't be represented with 64-bit integers. Use the
/// `checked_*()` methods when that needs to be handled.
#[derive(Debug, Copy, Clone)]
pub struct Fraction {
    numerator: i64,
    denominator: i64,
}

impl Fraction {
    pub const ONE: Fraction = Fraction::new(1, 1);
    pub const ZERO: Fraction = Fraction::new(0, 1);

    /// Create a [`Fraction`] from its raw parts, without simplifying it.
    pub const fn new(numerator: i64, denominator: i64) -> Self {
        Fraction {
            numerator,
            denominator,
        }
    }

    pub const fn from_integer(value: i64) -> Self { Fraction::new(value, 1) }

    pub const fn numerator(self) -> i64 { self.numerator }

    pub const fn denominator(self) -> i64 { self.denominator }

    /// Reduce the fraction to its canonical form in place.
    ///
    /// # Panics
    ///
    /// Only when the canonical form doesn't fit in an `i64` (e.g.
    /// `i64::MIN / -1`). See [`Fraction::try_simplify()`].
    pub fn simplify(&mut self) { *self = unwrap_arithmetic(self.try_simplify()); }

    /// Get a simplified copy of this fraction.
    pub fn simplified(self) -> Fraction {
        let mut copy = self;
        copy.simplify();
        copy
    }

    /// Reduce the fraction to its canonical form.
    pub fn try_simplify(self) -> Result<Fraction, ArithmeticError> {
        let Fraction {
            numerator,
            denominator,
        } = self;

        if denominator == 0 {
            return Ok(Fraction::ZERO);
        }

        let divisor = match i64::try_from(gcd(numerator, denominator)) {
            Ok(divisor) => divisor,
            // the gcd is only 2^63 when both sides are i64::MIN (or the
            // numerator is 0)
            Err(_) if numerator == 0 => return Ok(Fraction::ZERO),
            Err(_) => return Ok(Fraction::ONE),
        };

        let mut numerator = numerator / divisor;
        let mut denominator = denominator / divisor;

        if denominator < 0 {
            numerator = numerator.checked_neg().ok_or(ArithmeticError::Overflow)?;
            denominator =
                denominator.checked_neg().ok_or(ArithmeticError::Overflow)?;
        }

        Ok(Fraction::new(numerator, denominator))
    }

    /// Is this fraction equal to zero?
    ///
    /// A zero denominator counts as zero, matching what
    /// [`Fraction::simplify()`] turns it into.
    pub fn is_zero(self) -> bool {
        self.numerator == 0 || self.denominator == 0
    }

    pub fn is_integer(self) -> bool { self.canonical().1 == 1 }

    pub fn is_negative(self) -> bool { self.canonical().0 < 0 }

    pub fn is_positive(self) -> bool { self.canonical().0 > 0 }

    /// The absolute value.
    ///
    /// # Panics
    ///
    /// If the numerator is `i64::MIN`.
    pub fn abs(self) -> Fraction { unwrap_arithmetic(self.checked_abs()) }

    pub fn checked_abs(self) -> Result<Fraction, ArithmeticError> {
        let Fraction {
            numerator,
            denominator,
        } = self.try_simplify()?;

        numerator
            .checked_abs()
            .map(|numerator| Fraction::new(numerator, denominator))
            .ok_or(ArithmeticError::Overflow)
    }

    /// Get `1 / self`.
    ///
    /// # Panics
    ///
    /// If this fraction is zero.
    pub fn recip(self) -> Fraction { unwrap_arithmetic(self.checked_recip()) }

    pub fn checked_recip(self) -> Result<Fraction, ArithmeticError> {
        let Fraction {
            numerator,
            denominator,
        } = self.try_simplify()?;

        if numerator == 0 {
            return Err(ArithmeticError::DivisionByZero);
        }

        Fraction::new(denominator, numerator).try_simplify()
    }

    pub fn checked_neg(self) -> Result<Fraction, ArithmeticError> {
        let Fraction {
            numerator,
            denominator,
        } = self.try_simplify()?;

        numerator
            .checked_neg()
            .map(|numerator| Fraction::new(numerator, denominator))
            .ok_or(ArithmeticError::Overflow)
    }

    pub fn checked_add(
        self,
        other: Fraction,
    ) -> Result<Fraction, ArithmeticError> {
        let left = self.try_simplify()?;
        let right = other.try_simplify()?;

        // bounded by a positive denominator, so it always fits
        let divisor = gcd(left.denominator, right.denominator) as i64;
        let left_scale = right.denominator / divisor;
        let right_scale = left.denominator / divisor;

        let numerator = left
            .numerator
            .checked_mul(left_scale)
            .and_then(|l| {
                right
                    .numerator
                    .checked_mul(right_scale)
                    .and_then(|r| l.checked_add(r))
            })
            .ok_or(ArithmeticError::Overflow)?;
        let denominator = left
            .denominator
            .checked_mul(left_scale)
            .ok_or(ArithmeticError::Overflow)?;

        Fraction::new(numerator, denominator).try_simplify()
    }

    pub fn checked_sub(
        self,
        other: Fraction,
    ) -> Result<Fraction, ArithmeticError> {
        self.checked_add(other.checked_neg()?)
    }

    pub fn checked_mul(
        self,
        other: Fraction,
    ) -> Result<Fraction, ArithmeticError> {
        let left = self.try_simplify()?;
        let right = other.try_simplify()?;

        // cross-cancel first so the intermediate products stay small
        let a = gcd(left.numerator, right.denominator) as i64;
        let b = gcd(right.numerator, left.denominator) as i64;

        let numerator = (left.numerator / a)
            .checked_mul(right.numerator / b)
            .ok_or(ArithmeticError::Overflow)?;
        let denominator = (left.denominator / b)
            .checked_mul(right.denominator / a)
            .ok_or(ArithmeticError::Overflow)?;

        Fraction::new(numerator, denominator).try_simplify()
    }

    pub fn checked_div(
        self,
        other: Fraction,
    ) -> Result<Fraction, ArithmeticError> {
        self.checked_mul(other.checked_recip()?)
    }

    pub fn checked_add_int(self, other: i64) -> Result<Fraction, ArithmeticError> {
        let Fraction {
            numerator,
            denominator,
        } = self.try_simplify()?;

        other
            .checked_mul(denominator)
            .and_then(|scaled| scaled.checked_add(numerator))
            .ok_or(ArithmeticError::Overflow)
            .and_then(|numerator| {
                Fraction::new(numerator, denominator).try_simplify()
            })
    }

    pub fn checked_sub_int(self, other: i64) -> Result<Fraction, ArithmeticError> {
        match other.checked_neg() {
            Some(negated) => self.checked_add_int(negated),
            None => self.checked_sub(Fraction::from_integer(other)),
        }
    }

    /// Multiply by an integer, dividing it out of the denominator when the
    /// denominator is a multiple of it. Otherwise their common factor is
    /// cancelled before multiplying.
    pub fn checked_mul_int(self, other: i64) -> Result<Fraction, ArithmeticError> {
        let Fraction {
            numerator,
            denominator,
        } = self.try_simplify()?;

        if other == 0 {
            return Ok(Fraction::ZERO);
        }

        let exact = match denominator.checked_rem(other) {
            Some(0) => denominator.checked_div(other),
            _ => None,
        };

        let product = match exact {
            Some(denominator) => Fraction::new(numerator, denominator),
            None => {
                // the denominator is positive, so the gcd always fits
                let divisor = gcd(denominator, other) as i64;
                Fraction::new(
                    numerator
                        .checked_mul(other / divisor)
                        .ok_or(ArithmeticError::Overflow)?,
                    denominator / divisor,
                )
            },
        };

        product.try_simplify()
    }

    /// Divide by an integer, dividing the numerator directly when it is a
    /// multiple of `other` and folding what's left of `other` (after
    /// cancelling the common factor) into the denominator otherwise.
    pub fn checked_div_int(self, other: i64) -> Result<Fraction, ArithmeticError> {
        if other == 0 {
            return Err(ArithmeticError::DivisionByZero);
        }

        let Fraction {
            numerator,
            denominator,
        } = self.try_simplify()?;

        let exact = match numerator.checked_rem(other) {
            Some(0) => numerator.checked_div(other),
            _ => None,
        };

        let quotient = match exact {
            Some(numerator) => Fraction::new(numerator, denominator),
            None => {
                // only i64::MIN / i64::MIN has a gcd of 2^63, and that
                // divides evenly
                let divisor = gcd(numerator, other) as i64;
                Fraction::new(
                    numerator / divisor,
                    denominator
                        .checked_mul(other / divisor)
                        .ok_or(ArithmeticError::Overflow)?,
                )
            },
        };

        quotient.try_simplify()
    }

    /// Parse a fraction, rejecting anything other than `-?digits`,
    /// optionally followed by `/` and another `-?digits`.
    ///
    /// Unlike the lenient [`FromStr`] impl, stray characters and zero
    /// denominators are errors.
    pub fn parse_strict(s: &str) -> Result<Fraction, ParseFractionError> {
        let (numerator, denominator) = match s.find('/') {
            Some(index) => (
                strict_integer(s, 0..index)?,
                Some(strict_integer(s, index + 1..s.len())?),
            ),
            None => (strict_integer(s, 0..s.len())?, None),
        };

        match denominator {
            None => Ok(Fraction::from_integer(numerator)),
            Some(0) => Err(ParseFractionError::ZeroDenominator),
            Some(denominator) => Fraction::new(numerator, denominator)
                .try_simplify()
                .map_err(|_| ParseFractionError::Overflow),
        }
    }

    /// The canonical `(numerator, denominator)` pair, computed with enough
    /// headroom that it can never overflow.
    fn canonical(self) -> (i128, i128) {
        let mut numerator = i128::from(self.numerator);
        let mut denominator = i128::from(self.denominator);

        if denominator == 0 {
            return (0, 1);
        }
        if denominator < 0 {
            numerator = -numerator;
            denominator = -denominator;
        }

        let (mut a, mut b) = (numerator.unsigned_abs(), denominator as u128);
        while b != 0 {
            let r = a % b;
            a = b;
            b = r;
        }
        let divisor = a as i128;

        (numerator / divisor, denominator / divisor)
    }
}

fn gcd(a: i64, b: i64) -> u64 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());

    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }

    a
}

fn strict_integer(
    src: &str,
    span: Range<usize>,
) -> Result<i64, ParseFractionError> {
    let text = &src[span.clone()];
    let start = span.start + (text.len() - text.trim_start().len());
    let text = text.trim();

    let digits = text.strip_prefix('-').unwrap_or(text);
    let digits_start = start + (text.len() - digits.len());

    if let Some((offset, character)) =
        digits.char_indices().find(|(_, c)| !c.is_ascii_digit())
    {
        return Err(ParseFractionError::InvalidCharacter {
            character,
            index: digits_start + offset,
        });
    }

    if digits.is_empty() {
        return Err(ParseFractionError::Empty);
    }

    text.parse().map_err(|_| ParseFractionError::Overflow)
}

fn unwrap_arithmetic(result: Result<Fraction, ArithmeticError>) -> Fraction {
    match result {
        Ok(value) => value,
        Err(e) => panic!("{}", e),
    }
}

impl Default for Fraction {
    fn default() -> Self { Fraction::ZERO }
}

impl From<i64> for Fraction {
    fn from(value: i64) -> Self { Fraction::from_integer(value) }
}

impl From<i32> for Fraction {
    fn from(value: i32) -> Self { Fraction::from_integer(i64::from(value)) }
}

impl From<(i64, i64)> for Fraction {
    fn from((numerator, denominator): (i64, i64)) -> Self {
        Fraction::new(numerator, denominator).simplified()
    }
}

impl PartialEq for Fraction {
    fn eq(&self, other: &Fraction) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for Fraction {}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Fraction) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Fraction) -> Ordering {
        // a/b < c/d <=> a*d < c*b, for positive b and d
        let (a, b) = self.canonical();
        let (c, d) = other.canonical();

        (a * d).cmp(&(c * b))
    }
}

impl Hash for Fraction {
    fn hash<H: Hasher>(&self, state: &mut H) { self.canonical().hash(state); }
}

impl Display for Fraction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let (numerator, denominator) = self.canonical();

        if denominator == 1 {
            write!(f, "{}", numerator)
        } else {
            write!(f, "{}/{}", numerator, denominator)
        }
    }
}

/// Leniently parse a fraction from text.
///
/// Digits go into the numerator until the first `/`, then into the
/// denominator. A `-` before a part's first digit makes that part negative,
/// and every other character is skipped, so `"3 / 4"` and `"x3/4"` both
/// parse as `3/4`. Without a `/` the denominator is `1`.
///
/// The only failure is a number too big for an `i64`. Use
/// [`Fraction::parse_strict()`] to reject malformed input.
impl FromStr for Fraction {
    type Err = ParseFractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // [numerator, denominator]
        let mut parts = [LenientPart::default(); 2];
        let mut found_slash = false;

        for c in s.chars() {
            let part = &mut parts[found_slash as usize];

            match c {
                '/' => found_slash = true,
                '-' if !part.seen_digit => part.negative = true,
                '0'..='9' => part.push(c as i64 - '0' as i64)?,
                _ => {},
            }
        }

        let [numerator, denominator] = parts;
        let denominator = if found_slash { denominator.value } else { 1 };

        Fraction::new(numerator.value, denominator)
            .try_simplify()
            .map_err(|_| ParseFractionError::Overflow)
    }
}

#[derive(Debug, Default, Copy, Clone)]
struct LenientPart {
    value: i64,
    negative: bool,
    seen_digit: bool,
}

impl LenientPart {
    fn push(&mut self, digit: i64) -> Result<(), ParseFractionError> {
        let digit = if self.negative { -digit } else { digit };

        self.value = self
            .value
            .checked_mul(10)
            .and_then(|v| v.checked_add(digit))
            .ok_or(ParseFractionError::Overflow)?;
        self.seen_digit = true;

        Ok(())
    }
}

macro_rules! arithmetic_impls {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $checked:ident, $checked_int:ident) => {
        impl $trait for Fraction {
            type Output = Fraction;

            fn $method(self, rhs: Fraction) -> Fraction {
                unwrap_arithmetic(self.$checked(rhs))
            }
        }

        impl $trait<i64> for Fraction {
            type Output = Fraction;

            fn $method(self, rhs: i64) -> Fraction {
                unwrap_arithmetic(self.$checked_int(rhs))
            }
        }

        impl $assign_trait for Fraction {
            fn $assign_method(&mut self, rhs: Fraction) {
                *self = $trait::$method(*self, rhs);
            }
        }

        impl $assign_trait<i64> for Fraction {
            fn $assign_method(&mut self, rhs: i64) {
                *self = $trait::$method(*self, rhs);
            }
        }
    };
}

arithmetic_impls!(Add, add, AddAssign, add_assign, checked_add, checked_add_int);
arithmetic_impls!(Sub, sub, SubAssign, sub_assign, checked_sub, checked_sub_int);
arithmetic_impls!(Mul, mul, MulAssign, mul_assign, checked_mul, checked_mul_int);
arithmetic_impls!(Div, div, DivAssign, div_assign, checked_div, checked_div_int);

impl Neg for Fraction {
    type Output = Fraction;

    fn neg(self) -> Fraction { unwrap_arithmetic(self.checked_neg()) }
}

impl Zero for Fraction {
    fn zero() -> Self { Fraction::ZERO }

    fn is_zero(&self) -> bool { Fraction::is_zero(*self) }
}

impl One for Fraction {
    fn one() -> Self { Fraction::ONE }
}

impl CheckedAdd for Fraction {
    fn checked_add(&self, v: &Fraction) -> Option<Fraction> {
        Fraction::checked_add(*self, *v).ok()
    }
}

impl CheckedSub for Fraction {
    fn checked_sub(&self, v: &Fraction) -> Option<Fraction> {
        Fraction::checked_sub(*self, *v).ok()
    }
}

impl CheckedMul for Fraction {
    fn checked_mul(&self, v: &Fraction) -> Option<Fraction> {
        Fraction::checked_mul(*self, *v).ok()
    }
}

impl CheckedDiv for Fraction {
    fn checked_div(&self, v: &Fraction) -> Option<Fraction> {
        Fraction::checked_div(*self, *v).ok()
    }
}

impl Sum for Fraction {
    fn sum<I: Iterator<Item = Fraction>>(iter: I) -> Fraction {
        iter.fold(Fraction::ZERO, |acc, item| acc + item)
    }
}

impl<'a> Sum<&'a Fraction> for Fraction {
    fn sum<I: Iterator<Item = &'a Fraction>>(iter: I) -> Fraction {
        iter.copied().sum()
    }
}

impl Product for Fraction {
    fn product<I: Iterator<Item = Fraction>>(iter: I) -> Fraction {
        iter.fold(Fraction::ONE, |acc, item| acc * item)
    }
}

/// Something went wrong while doing arithmetic with [`Fraction`]s.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ArithmeticError {
    DivisionByZero,
    /// The result doesn't fit in a 64-bit numerator and denominator.
    Overflow,
}

impl Display for ArithmeticError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ArithmeticError::DivisionByZero => {
                write!(f, "attempt to divide a fraction by zero")
            },
            ArithmeticError::Overflow => {
                write!(f, "fraction arithmetic overflowed")
            },
        }
    }
}

impl Error for ArithmeticError {}

/// Errors that may occur while parsing a [`Fraction`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParseFractionError {
    /// The number doesn't fit in an `i64`.
    Overflow,
    Empty,
    InvalidCharacter {
        character: char,
        index: usize,
    },
    ZeroDenominator,
}

impl Display for ParseFractionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ParseFractionError::Overflow => {
                write!(f, "the number is too large")
            },
            ParseFractionError::Empty => write!(f, "expected a number"),
            ParseFractionError::InvalidCharacter { character, index } => {
                write!(f, "invalid character {:?} at index {}", character, index)
            },
            ParseFractionError::ZeroDenominator => {
                write!(f, "the denominator can't be zero")
            },
        }
    }
}

impl Error for ParseFractionError {}
