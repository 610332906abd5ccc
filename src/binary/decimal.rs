use std::io::Write;

use crate::binary::int::DecodedInt;
use crate::binary::raw_binary_writer::MAX_INLINE_LENGTH;
use crate::binary::var_int::VarInt;
use crate::binary::var_uint::VarUInt;
use crate::data_source::IonDataSource;
use crate::result::{decoding_error, IonError, IonResult};
use crate::types::{Coefficient, Decimal, Sign, UInt};

/// Provides support for writing a [`Decimal`]'s binary encoding: a VarInt exponent followed by
/// an Int (sign-and-magnitude) coefficient. The coefficient subfield is omitted entirely when
/// its value is positive zero; a negative-zero coefficient is preserved on the wire, keeping
/// `-0d0` distinct from `0d0`.
pub trait DecimalBinaryEncoder {
    /// Encodes the content of a [`Decimal`] (without its type descriptor or length) and
    /// returns the number of bytes written.
    fn encode_decimal(&mut self, decimal: &Decimal) -> IonResult<usize>;

    /// Encodes a [`Decimal`] as a complete Ion value with type descriptor and length.
    /// Returns the number of bytes written.
    fn encode_decimal_value(&mut self, decimal: &Decimal) -> IonResult<usize>;
}

impl<W> DecimalBinaryEncoder for W
where
    W: Write,
{
    fn encode_decimal(&mut self, decimal: &Decimal) -> IonResult<usize> {
        // `0d0` has an empty encoding. This must be a representation check, not a numeric
        // comparison: `-0d0` and `0d1` are numerically equal to `0d0` but encode differently.
        if decimal.coefficient().is_zero()
            && !decimal.coefficient().is_negative()
            && decimal.exponent() == 0
        {
            return Ok(0);
        }

        let mut bytes_written = VarInt::write_i64(self, decimal.exponent())?;

        if decimal.is_negative_zero() {
            bytes_written += DecodedInt::write_negative_zero(self)?;
            return Ok(bytes_written);
        }
        if decimal.coefficient().is_zero() {
            // From the spec: the coefficient subfield "should not be present (that is, it has
            // zero length) when the coefficient's value is (positive) zero".
            return Ok(bytes_written);
        }

        // If the coefficient is small enough to safely fit in an i64, use that to avoid
        // allocating.
        if let Some(small_coefficient) = decimal.coefficient().as_i64() {
            bytes_written += DecodedInt::write_i64(self, small_coefficient)?;
        } else {
            let magnitude_bytes = match decimal.coefficient().magnitude() {
                UInt::U64(magnitude) => magnitude.to_be_bytes().to_vec(),
                UInt::BigUInt(magnitude) => magnitude.to_bytes_be(),
            };
            let first_bit_is_occupied = magnitude_bytes[0] & 0b1000_0000 != 0;
            let sign_bit: u8 = match decimal.coefficient().sign() {
                Sign::Negative => 0b1000_0000,
                Sign::Positive => 0b0000_0000,
            };
            if first_bit_is_occupied {
                // The first magnitude byte has no room for a sign bit; write an extra leading
                // byte that carries only the sign.
                self.write_all(&[sign_bit])?;
                self.write_all(&magnitude_bytes)?;
                bytes_written += magnitude_bytes.len() + 1;
            } else {
                let mut magnitude_bytes = magnitude_bytes;
                magnitude_bytes[0] |= sign_bit;
                self.write_all(&magnitude_bytes)?;
                bytes_written += magnitude_bytes.len();
            }
        }

        Ok(bytes_written)
    }

    fn encode_decimal_value(&mut self, decimal: &Decimal) -> IonResult<usize> {
        // Encode the body first; the encoded length is needed to write the type descriptor.
        let mut encoded: Vec<u8> = Vec::with_capacity(16);
        encoded.encode_decimal(decimal)?;

        let mut bytes_written = 1;
        if encoded.len() <= MAX_INLINE_LENGTH {
            self.write_all(&[0x50 | encoded.len() as u8])?;
        } else {
            self.write_all(&[0x5E])?;
            bytes_written += VarUInt::write_u64(self, encoded.len() as u64)?;
        }
        self.write_all(&encoded)?;
        Ok(bytes_written + encoded.len())
    }
}

/// Reads a decimal with `length` bytes of payload from the provided data source.
///
/// The caller is expected to have verified that `length` bytes are available; an exponent
/// VarInt that runs past `length` is reported as a
/// [`Decoding`](crate::IonError::Decoding) error, since it means the value's length field
/// disagrees with its content.
pub(crate) fn decode_decimal<R: IonDataSource>(
    data_source: &mut R,
    length: usize,
) -> IonResult<Decimal> {
    if length == 0 {
        return Ok(Decimal::new(0, 0));
    }

    let exponent_var_int = match VarInt::read(data_source) {
        Err(IonError::Incomplete(_)) => {
            return decoding_error("a decimal's exponent ran past the end of the value")
        }
        other => other?,
    };
    let coefficient_size_in_bytes = match length.checked_sub(exponent_var_int.size_in_bytes()) {
        Some(remaining) => remaining,
        None => return decoding_error("a decimal's exponent ran past the end of the value"),
    };

    let exponent = exponent_var_int.value();
    let coefficient = DecodedInt::read(data_source, coefficient_size_in_bytes)?;

    if coefficient.is_negative_zero() {
        return Ok(Decimal::negative_zero_with_exponent(exponent));
    }
    Ok(Decimal::new(Coefficient::from(coefficient), exponent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;
    use std::io::Cursor;

    fn round_trip(decimal: &Decimal) -> Decimal {
        let mut buffer: Vec<u8> = vec![];
        buffer.encode_decimal(decimal).expect("encoding failed");
        let length = buffer.len();
        decode_decimal(&mut Cursor::new(buffer), length).expect("decoding failed")
    }

    #[test]
    fn positive_zero_has_empty_encoding() {
        let mut buffer: Vec<u8> = vec![];
        buffer.encode_decimal(&Decimal::new(0, 0)).unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn scale_survives_round_trip() {
        let one_tenth = Decimal::new(10, -1);
        let one_hundredth = Decimal::new(100, -2);
        assert_eq!(round_trip(&one_tenth).scale(), 1);
        assert_eq!(round_trip(&one_hundredth).scale(), 2);
    }

    #[test]
    fn negative_zero_survives_round_trip() {
        let negative_zero = Decimal::negative_zero();
        let decoded = round_trip(&negative_zero);
        assert!(decoded.is_negative_zero());
        // Numerically equal to positive zero, distinct in representation.
        assert_eq!(decoded, Decimal::new(0, 0));
    }

    #[test]
    fn zero_with_nonzero_exponent_round_trips() {
        let decoded = round_trip(&Decimal::new(0, 5));
        assert_eq!(decoded.exponent(), 5);
        assert!(decoded.is_zero());
        assert!(!decoded.is_negative_zero());
    }

    #[test]
    fn small_values_round_trip() {
        for coefficient in [1i64, -1, 1225, -1225, i64::MAX, i64::MIN] {
            for exponent in [0i64, -2, 7] {
                let decimal = Decimal::new(coefficient, exponent);
                assert_eq!(round_trip(&decimal), decimal);
                assert_eq!(round_trip(&decimal).scale(), -exponent);
            }
        }
    }

    #[test]
    fn big_coefficients_round_trip() {
        let huge = BigUint::parse_bytes(b"123456789012345678901234567890", 10).unwrap();
        let decimal = Decimal::new(
            Coefficient::new(Sign::Negative, UInt::from(huge)),
            -9,
        );
        let decoded = round_trip(&decimal);
        assert_eq!(decoded, decimal);
        assert!(decoded.coefficient().is_negative());
    }

    #[test]
    fn exponent_overrunning_length_is_malformed() {
        // A two-byte VarInt exponent inside a value that claims to be one byte long.
        let result = decode_decimal(&mut Cursor::new(vec![0b0000_0001u8, 0b1000_0001]), 1);
        assert!(matches!(result, Err(IonError::Decoding(_))));
    }
}
