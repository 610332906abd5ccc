use std::cmp::Ordering;
use std::fmt;
use std::ops::Neg;

use num_bigint::{BigInt, BigUint, Sign as BigSign};
use num_traits::{ToPrimitive, Zero};

/// An unsigned integer of arbitrary size. Magnitudes that fit in a `u64` are stored inline;
/// larger magnitudes fall back to a heap-allocated [`BigUint`].
#[derive(Debug, Clone)]
pub enum UInt {
    U64(u64),
    BigUInt(BigUint),
}

// Comparisons are numeric, not structural: a BigUInt may hold a small magnitude, and two
// representations of the same number must compare (and hash) as equal.
impl PartialEq for UInt {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for UInt {}

impl UInt {
    /// Returns `true` if this magnitude is zero.
    pub fn is_zero(&self) -> bool {
        match self {
            UInt::U64(value) => *value == 0,
            UInt::BigUInt(value) => value.is_zero(),
        }
    }

    /// If the magnitude fits in a `u64`, returns it as one.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            UInt::U64(value) => Some(*value),
            UInt::BigUInt(value) => value.to_u64(),
        }
    }

    /// Returns the number of digits in the base-10 representation of the magnitude.
    pub(crate) fn number_of_decimal_digits(&self) -> u64 {
        match self {
            UInt::U64(value) => {
                let mut remaining = *value / 10;
                let mut digits = 1;
                while remaining > 0 {
                    remaining /= 10;
                    digits += 1;
                }
                digits
            }
            UInt::BigUInt(value) => {
                if value.is_zero() {
                    1
                } else {
                    value.to_str_radix(10).len() as u64
                }
            }
        }
    }
}

impl PartialOrd for UInt {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UInt {
    fn cmp(&self, other: &Self) -> Ordering {
        use UInt::*;
        match (self, other) {
            (U64(this), U64(that)) => this.cmp(that),
            (BigUInt(this), BigUInt(that)) => this.cmp(that),
            (U64(this), BigUInt(that)) => BigUint::from(*this).cmp(that),
            (BigUInt(this), U64(that)) => this.cmp(&BigUint::from(*that)),
        }
    }
}

impl fmt::Display for UInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UInt::U64(value) => write!(f, "{value}"),
            UInt::BigUInt(value) => write!(f, "{value}"),
        }
    }
}

macro_rules! impl_uint_from_small_unsigned_int_types {
    ($($t:ty),*) => ($(
        impl From<$t> for UInt {
            fn from(value: $t) -> UInt {
                UInt::U64(value as u64)
            }
        }
    )*)
}
impl_uint_from_small_unsigned_int_types!(u8, u16, u32, u64, usize);

impl From<u128> for UInt {
    fn from(value: u128) -> UInt {
        match u64::try_from(value) {
            Ok(small) => UInt::U64(small),
            Err(_) => UInt::BigUInt(BigUint::from(value)),
        }
    }
}

impl From<BigUint> for UInt {
    fn from(value: BigUint) -> UInt {
        match value.to_u64() {
            Some(small) => UInt::U64(small),
            None => UInt::BigUInt(value),
        }
    }
}

/// A signed integer of arbitrary size. Values that fit in an `i64` are stored inline; larger
/// values fall back to a heap-allocated [`BigInt`].
#[derive(Debug, Clone)]
pub enum Int {
    I64(i64),
    BigInt(BigInt),
}

// As with [UInt], equality is numeric rather than structural.
impl PartialEq for Int {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Int {}

impl Int {
    /// Returns `true` if this value is zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Int::I64(value) => *value == 0,
            Int::BigInt(value) => value.is_zero(),
        }
    }

    /// Returns `true` if this value is less than zero.
    pub fn is_negative(&self) -> bool {
        match self {
            Int::I64(value) => *value < 0,
            Int::BigInt(value) => value.sign() == BigSign::Minus,
        }
    }

    /// If the value fits in an `i64`, returns it as one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Int::I64(value) => Some(*value),
            Int::BigInt(value) => value.to_i64(),
        }
    }

    /// Returns the magnitude (absolute value) of this integer as a [`UInt`].
    pub fn unsigned_abs(&self) -> UInt {
        match self {
            // i64::MIN is handled by widening the magnitude to u64 before negation.
            Int::I64(value) => UInt::U64(value.unsigned_abs()),
            Int::BigInt(value) => UInt::from(value.magnitude().clone()),
        }
    }
}

impl PartialOrd for Int {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Int {
    fn cmp(&self, other: &Self) -> Ordering {
        use Int::*;
        match (self, other) {
            (I64(this), I64(that)) => this.cmp(that),
            (BigInt(this), BigInt(that)) => this.cmp(that),
            (I64(this), BigInt(that)) => num_bigint::BigInt::from(*this).cmp(that),
            (BigInt(this), I64(that)) => this.cmp(&num_bigint::BigInt::from(*that)),
        }
    }
}

impl Neg for Int {
    type Output = Int;

    fn neg(self) -> Self::Output {
        match self {
            // i64::MIN's magnitude is not representable as an i64; negating it requires BigInt.
            Int::I64(i64::MIN) => Int::BigInt(-BigInt::from(i64::MIN)),
            Int::I64(value) => Int::I64(-value),
            Int::BigInt(value) => Int::BigInt(-value),
        }
    }
}

impl fmt::Display for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Int::I64(value) => write!(f, "{value}"),
            Int::BigInt(value) => write!(f, "{value}"),
        }
    }
}

macro_rules! impl_int_from_small_signed_int_types {
    ($($t:ty),*) => ($(
        impl From<$t> for Int {
            fn from(value: $t) -> Int {
                Int::I64(value as i64)
            }
        }
    )*)
}
impl_int_from_small_signed_int_types!(i8, i16, i32, i64, isize);

impl From<BigInt> for Int {
    fn from(value: BigInt) -> Int {
        match value.to_i64() {
            Some(small) => Int::I64(small),
            None => Int::BigInt(value),
        }
    }
}

impl From<UInt> for Int {
    fn from(value: UInt) -> Int {
        match value {
            UInt::U64(magnitude) => match i64::try_from(magnitude) {
                Ok(small) => Int::I64(small),
                Err(_) => Int::BigInt(BigInt::from(magnitude)),
            },
            UInt::BigUInt(magnitude) => Int::from(BigInt::from(magnitude)),
        }
    }
}
