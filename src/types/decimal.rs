//! Types related to [`Decimal`], the in-memory representation of an Ion decimal value.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Neg;

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, BigUint, Sign as BigSign};

use crate::result::{illegal_operation_raw, IonError};
use crate::types::integer::{Int, UInt};

/// Indicates whether a [`Coefficient`]'s magnitude is less than 0 (negative) or not (positive).
/// When the magnitude is zero, the sign distinguishes `-0` from `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sign {
    Negative,
    Positive,
}

/// A signed integer that can be used as the coefficient of a [`Decimal`]. Unlike [`Int`], this
/// type considers `0` and `-0` to be distinct values, as the Ion data model requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coefficient {
    sign: Sign,
    magnitude: UInt,
}

impl Coefficient {
    pub(crate) fn new<I: Into<UInt>>(sign: Sign, magnitude: I) -> Self {
        Coefficient {
            sign,
            magnitude: magnitude.into(),
        }
    }

    /// Constructs a new Coefficient that represents negative zero.
    pub fn negative_zero() -> Self {
        Coefficient {
            sign: Sign::Negative,
            magnitude: UInt::U64(0),
        }
    }

    pub fn sign(&self) -> Sign {
        self.sign
    }

    pub fn magnitude(&self) -> &UInt {
        &self.magnitude
    }

    pub fn is_negative(&self) -> bool {
        self.sign == Sign::Negative
    }

    /// Returns true if the Coefficient represents a zero of either sign.
    pub fn is_zero(&self) -> bool {
        self.magnitude.is_zero()
    }

    /// Returns true if the Coefficient represents negative zero.
    pub fn is_negative_zero(&self) -> bool {
        self.sign == Sign::Negative && self.magnitude.is_zero()
    }

    /// Returns the number of digits in the base-10 representation of the coefficient.
    pub(crate) fn number_of_decimal_digits(&self) -> u64 {
        self.magnitude.number_of_decimal_digits()
    }

    /// If the value fits in an i64, returns it as one. Note that this cannot represent `-0`;
    /// callers that care must check [`Coefficient::is_negative_zero`] first.
    pub(crate) fn as_i64(&self) -> Option<i64> {
        let magnitude = self.magnitude.as_u64()?;
        match self.sign {
            // Widen to i128 before negating so that a magnitude of 2^63 (i64::MIN) survives.
            Sign::Negative => i64::try_from(-(magnitude as i128)).ok(),
            Sign::Positive => i64::try_from(magnitude).ok(),
        }
    }
}

// These macros make it possible to turn integers into a Coefficient using `.into()`.
// A generic `impl<I: Into<Int>> From<I> for Coefficient` would collide with the standard
// library's reflexive From impl, so each conversion is spelled out instead.
macro_rules! impl_coefficient_from_unsigned_int_types {
    ($($t:ty),*) => ($(
        impl From<$t> for Coefficient {
            fn from(value: $t) -> Coefficient {
                Coefficient::new(Sign::Positive, UInt::from(value))
            }
        }
    )*)
}
impl_coefficient_from_unsigned_int_types!(u8, u16, u32, u64, usize, UInt);

macro_rules! impl_coefficient_from_signed_int_types {
    ($($t:ty),*) => ($(
        impl From<$t> for Coefficient {
            fn from(value: $t) -> Coefficient {
                let value: Int = value.into();
                let sign = if value.is_negative() { Sign::Negative } else { Sign::Positive };
                Coefficient::new(sign, value.unsigned_abs())
            }
        }
    )*)
}
impl_coefficient_from_signed_int_types!(i8, i16, i32, i64, isize, Int);

impl TryFrom<&Coefficient> for BigInt {
    type Error = IonError;

    /// Fails if the Coefficient is a negative zero, which BigInt cannot represent.
    fn try_from(value: &Coefficient) -> Result<Self, Self::Error> {
        if value.is_negative_zero() {
            return Err(illegal_operation_raw(
                "cannot convert a negative zero Coefficient to a BigInt",
            ));
        }
        let magnitude: BigUint = match &value.magnitude {
            UInt::U64(magnitude) => BigUint::from(*magnitude),
            UInt::BigUInt(magnitude) => magnitude.clone(),
        };
        let big_sign = match value.sign {
            Sign::Negative => BigSign::Minus,
            Sign::Positive => BigSign::Plus,
        };
        Ok(BigInt::from_biguint(big_sign, magnitude))
    }
}

impl fmt::Display for Coefficient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sign == Sign::Negative {
            write!(f, "-")?;
        }
        write!(f, "{}", self.magnitude)
    }
}

/// An arbitrary-precision decimal with a distinct representation of negative zero (`-0`).
///
/// A `Decimal` is a `(coefficient, exponent)` pair whose value is `coefficient * 10^exponent`.
/// The coefficient's trailing zeros are significant: `1.0` and `1.00` are different `Decimal`
/// values (their [`scale`](Decimal::scale)s differ) that compare as numerically equal.
#[derive(Debug, Clone)]
pub struct Decimal {
    pub(crate) coefficient: Coefficient,
    pub(crate) exponent: i64,
}

impl Decimal {
    /// Constructs a new Decimal with the provided components. The value of the decimal is:
    ///    `coefficient * 10^exponent`
    pub fn new<C: Into<Coefficient>, E: Into<i64>>(coefficient: C, exponent: E) -> Decimal {
        Decimal {
            coefficient: coefficient.into(),
            exponent: exponent.into(),
        }
    }

    /// Constructs a Decimal with the value `-0d0`. This is provided as a convenience method
    /// because Rust will ignore a unary minus when it is applied to a zero literal (`-0`).
    pub fn negative_zero() -> Decimal {
        Decimal::negative_zero_with_exponent(0)
    }

    /// Constructs a Decimal with a coefficient of `-0` and the specified exponent.
    pub fn negative_zero_with_exponent(exponent: i64) -> Decimal {
        Decimal {
            coefficient: Coefficient::negative_zero(),
            exponent,
        }
    }

    /// Returns this Decimal's coefficient.
    pub fn coefficient(&self) -> &Coefficient {
        &self.coefficient
    }

    /// Returns this Decimal's exponent.
    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    /// Returns the scale of this Decimal: the number of digits to the right of the decimal
    /// point. A negative scale means the coefficient is multiplied by a power of ten.
    /// `1.00` has a scale of 2; `1.0` has a scale of 1; they are numerically equal.
    pub fn scale(&self) -> i64 {
        self.exponent.neg()
    }

    /// Returns the number of significant digits in this Decimal's coefficient.
    pub fn precision(&self) -> u64 {
        self.coefficient.number_of_decimal_digits()
    }

    /// Returns `true` if this Decimal is a zero of any sign or exponent.
    pub fn is_zero(&self) -> bool {
        self.coefficient.is_zero()
    }

    /// Returns `true` if this Decimal's coefficient is a negative zero.
    pub fn is_negative_zero(&self) -> bool {
        self.coefficient.is_negative_zero()
    }

    // Numerically compares two decimals, ignoring differences in precision.
    fn compare(d1: &Decimal, d2: &Decimal) -> Ordering {
        if d1.is_zero() && d2.is_zero() {
            // All zeros are numerically equal regardless of sign or exponent.
            return Ordering::Equal;
        }
        // Disagreement in the coefficients' signs settles the comparison no matter what the
        // exponents are.
        let sign_cmp = d1.coefficient.sign().cmp(&d2.coefficient.sign());
        if sign_cmp != Ordering::Equal {
            return sign_cmp;
        }

        let magnitude_cmp = Decimal::compare_magnitudes(d1, d2);
        if d1.coefficient.sign() == Sign::Positive {
            magnitude_cmp
        } else {
            // -100 has a greater magnitude than -99, but -99 is the larger number.
            magnitude_cmp.reverse()
        }
    }

    // Compares the absolute values of the provided decimals, scaling one coefficient to match
    // the other's exponent when they differ.
    fn compare_magnitudes(d1: &Decimal, d2: &Decimal) -> Ordering {
        if d1.exponent == d2.exponent {
            return d1.coefficient.magnitude().cmp(d2.coefficient.magnitude());
        }
        // To compare (16, e: 3) and (1600, e: 1), multiply 16 by 10^2 to equalize the exponents
        // and compare the resulting magnitudes.
        let (larger_exponent, smaller_exponent) = if d1.exponent > d2.exponent {
            (d1, d2)
        } else {
            (d2, d1)
        };
        let mut scaled: BigUint = match larger_exponent.coefficient.magnitude() {
            UInt::U64(magnitude) => BigUint::from(*magnitude),
            UInt::BigUInt(magnitude) => magnitude.clone(),
        };
        let power = (larger_exponent.exponent - smaller_exponent.exponent) as u32;
        scaled *= BigUint::from(10u64).pow(power);
        let scaled = UInt::from(scaled);
        let ordering = scaled.cmp(smaller_exponent.coefficient.magnitude());
        if std::ptr::eq(larger_exponent, d1) {
            ordering
        } else {
            ordering.reverse()
        }
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Decimal {}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        Decimal::compare(self, other)
    }
}

macro_rules! impl_decimal_from_integer_types {
    ($($t:ty),*) => ($(
        impl From<$t> for Decimal {
            fn from(value: $t) -> Decimal {
                Decimal::new(value, 0)
            }
        }
    )*)
}
impl_decimal_from_integer_types!(i8, i16, i32, i64, Int);

impl TryFrom<&Decimal> for BigDecimal {
    type Error = IonError;

    /// Fails if the Decimal's coefficient is a negative zero, which BigDecimal cannot represent.
    fn try_from(value: &Decimal) -> Result<Self, Self::Error> {
        let coefficient: BigInt = (&value.coefficient).try_into()?;
        Ok(BigDecimal::new(coefficient, value.scale()))
    }
}

impl From<BigDecimal> for Decimal {
    fn from(value: BigDecimal) -> Self {
        let (coefficient, scale) = value.into_bigint_and_exponent();
        let sign = if coefficient.sign() == BigSign::Minus {
            Sign::Negative
        } else {
            Sign::Positive
        };
        let magnitude = UInt::from(coefficient.magnitude().clone());
        Decimal::new(Coefficient::new(sign, magnitude), -scale)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.coefficient, self.exponent)
    }
}

#[cfg(test)]
mod decimal_tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::cmp::Ordering;
    use std::str::FromStr;

    #[test]
    fn differing_precision_is_numerically_equal() {
        // 1.0 and 1.00 are distinct representations of the same number.
        let one_tenths = Decimal::new(10, -1);
        let one_hundredths = Decimal::new(100, -2);
        assert_eq!(one_tenths, one_hundredths);
        assert_eq!(one_tenths.scale(), 1);
        assert_eq!(one_hundredths.scale(), 2);
    }

    #[test]
    fn zeros_compare_equal_regardless_of_sign_and_exponent() {
        assert_eq!(Decimal::new(0, 0), Decimal::negative_zero());
        assert_eq!(Decimal::new(0, 6), Decimal::negative_zero_with_exponent(-6));
        assert!(Decimal::negative_zero().is_negative_zero());
        assert!(!Decimal::new(0, 0).is_negative_zero());
    }

    #[test]
    fn compare_across_exponents() {
        let sixteen_thousand = Decimal::new(16, 3);
        let sixteen_thousand_scaled = Decimal::new(1600, 1);
        assert_eq!(sixteen_thousand, sixteen_thousand_scaled);
        assert_eq!(Decimal::new(16, 3).cmp(&Decimal::new(1601, 1)), Ordering::Less);
        assert_eq!(Decimal::new(-16, 3).cmp(&Decimal::new(-1601, 1)), Ordering::Greater);
        assert!(Decimal::new(-1, 0) < Decimal::new(1, -4));
    }

    #[test]
    fn big_decimal_round_trip() {
        let big = BigDecimal::from_str("-24.601").unwrap();
        let decimal: Decimal = big.clone().into();
        assert_eq!(decimal.scale(), 3);
        assert!(decimal.coefficient().is_negative());
        let back: BigDecimal = (&decimal).try_into().unwrap();
        assert_eq!(back, big);
    }

    #[test]
    fn negative_zero_cannot_become_big_decimal() {
        let result: Result<BigDecimal, _> = (&Decimal::negative_zero()).try_into();
        assert!(result.is_err());
    }

    #[test]
    fn coefficient_as_i64() {
        assert_eq!(Decimal::new(1225, -2).coefficient().as_i64(), Some(1225));
        assert_eq!(
            Decimal::new(i64::MIN, 0).coefficient().as_i64(),
            Some(i64::MIN)
        );
        assert_eq!(Decimal::negative_zero().coefficient().as_i64(), Some(0));
    }
}
