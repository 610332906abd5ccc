use std::io::Write;
use std::mem;

use num_bigint::{BigInt, BigUint, Sign as BigSign};

use crate::data_source::IonDataSource;
use crate::result::{decoding_error, IonResult};
use crate::types::{Coefficient, Int, Sign};

const INT_NEGATIVE_ZERO: u8 = 0x80;

// This limit is used for stack-allocating buffer space to encode/decode Ints.
const INT_STACK_BUFFER_SIZE: usize = 16;
// This number was chosen somewhat arbitrarily and could be lifted if a use case demands it.
const MAX_INT_SIZE_IN_BYTES: usize = 2048;

/// Represents a fixed-length signed integer: a big-endian magnitude whose first byte reserves
/// its high bit for the sign. Unlike Ion's integer *values* (which carry their sign in the type
/// code), this encoding is used where a sign must travel with the payload itself, most notably
/// a decimal's coefficient; `-0` is representable and distinct from `0`.
#[derive(Debug)]
pub struct DecodedInt {
    size_in_bytes: usize,
    value: Int,
    // `Int` is not capable of natively representing negative zero. We track the sign of the
    // value separately so we can distinguish between 0 and -0.
    is_negative: bool,
}

impl DecodedInt {
    /// Reads an Int with `length` bytes from the provided data source.
    pub fn read<R: IonDataSource>(data_source: &mut R, length: usize) -> IonResult<DecodedInt> {
        if length == 0 {
            return Ok(DecodedInt {
                size_in_bytes: 0,
                value: Int::I64(0),
                is_negative: false,
            });
        } else if length > MAX_INT_SIZE_IN_BYTES {
            return decoding_error(format!(
                "found a {length}-byte Int; the maximum supported size is \
                 {MAX_INT_SIZE_IN_BYTES} bytes"
            ));
        }

        if length <= INT_STACK_BUFFER_SIZE {
            let buffer = &mut [0u8; INT_STACK_BUFFER_SIZE];
            DecodedInt::read_using_buffer(data_source, length, buffer)
        } else {
            let mut buffer = vec![0u8; length];
            DecodedInt::read_using_buffer(data_source, length, buffer.as_mut_slice())
        }
    }

    fn read_using_buffer<R: IonDataSource>(
        data_source: &mut R,
        length: usize,
        buffer: &mut [u8],
    ) -> IonResult<DecodedInt> {
        let buffer = &mut buffer[0..length];
        data_source.read_exact_bytes(buffer, "an Int")?;
        let is_negative = buffer[0] & 0b1000_0000 != 0;

        let value = if length <= mem::size_of::<i64>() {
            let mut magnitude: u64 = (buffer[0] & 0b0111_1111) as u64;
            for &byte in &buffer[1..] {
                magnitude <<= 8;
                magnitude |= byte as u64;
            }
            if is_negative {
                // The magnitude is at most 63 bits, so the negation cannot overflow.
                Int::I64(-(magnitude as i64))
            } else {
                Int::I64(magnitude as i64)
            }
        } else {
            // We're going to treat the buffer's contents like the big-endian bytes of an
            // unsigned integer. The sign has been noted; clear the sign bit in the buffer.
            buffer[0] &= 0b0111_1111;
            let magnitude = BigUint::from_bytes_be(buffer);
            let sign = if is_negative {
                BigSign::Minus
            } else {
                BigSign::Plus
            };
            Int::from(BigInt::from_biguint(sign, magnitude))
        };

        Ok(DecodedInt {
            size_in_bytes: length,
            value,
            is_negative,
        })
    }

    /// Encodes the provided `value` as an Int and writes it to the provided `sink`.
    /// Returns the number of bytes written.
    pub fn write_i64<W: Write>(sink: &mut W, value: i64) -> IonResult<usize> {
        // Widening to a u64 magnitude here makes i64::MIN encodable without a special case.
        let magnitude = value.unsigned_abs();
        // We subtract one from the number of leading zero bits to leave space for a sign bit
        // and divide by 8 to get the number of empty leading bytes.
        let empty_leading_bytes: u32 = magnitude.leading_zeros().saturating_sub(1) >> 3;
        let first_occupied_byte = empty_leading_bytes as usize;

        let mut magnitude_bytes: [u8; mem::size_of::<u64>() + 1] = [0; mem::size_of::<u64>() + 1];
        magnitude_bytes[1..].copy_from_slice(&magnitude.to_be_bytes());
        let bytes_to_write: &mut [u8] = if magnitude.leading_zeros() == 0 {
            // All 64 bits are occupied; the sign bit needs a ninth byte.
            &mut magnitude_bytes[..]
        } else {
            &mut magnitude_bytes[1 + first_occupied_byte..]
        };
        if value < 0 {
            bytes_to_write[0] |= 0b1000_0000;
        }

        sink.write_all(bytes_to_write)?;
        Ok(bytes_to_write.len())
    }

    /// Encodes a negative zero as an Int and writes it to the provided `sink`.
    /// Returns the number of bytes written.
    ///
    /// This method is similar to [`DecodedInt::write_i64`], but a separate method is required
    /// because an i64 cannot represent a negative zero.
    pub fn write_negative_zero<W: Write>(sink: &mut W) -> IonResult<usize> {
        sink.write_all(&[INT_NEGATIVE_ZERO])?;
        Ok(1)
    }

    /// Returns `true` if the Int is negative zero.
    pub fn is_negative_zero(&self) -> bool {
        // `self.value` can natively represent any negative integer _except_ -0. To check for
        // negative zero, we look at the sign bit that was encoded in the stream.
        self.value.is_zero() && self.is_negative
    }

    /// Returns the value of the signed integer.
    #[inline(always)]
    pub fn value(&self) -> &Int {
        &self.value
    }

    /// Returns the number of bytes that were read from the data source to construct this
    /// signed integer.
    #[inline(always)]
    pub fn size_in_bytes(&self) -> usize {
        self.size_in_bytes
    }
}

impl From<DecodedInt> for Int {
    /// Note that if the DecodedInt represents -0, converting it to an Int will produce a 0.
    /// If negative zero is significant to your use case, check
    /// [`DecodedInt::is_negative_zero`] before converting.
    fn from(int: DecodedInt) -> Self {
        int.value
    }
}

impl From<DecodedInt> for Coefficient {
    fn from(int: DecodedInt) -> Self {
        let DecodedInt {
            value, is_negative, ..
        } = int;
        let sign = if is_negative {
            Sign::Negative
        } else {
            Sign::Positive
        };
        Coefficient::new(sign, value.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::IonResult;
    use std::io::Cursor;

    const READ_ERROR_MESSAGE: &str = "Failed to read an Int from the provided data.";

    #[test]
    fn test_read_three_byte_positive_int() {
        let data = &[0b0011_1100, 0b1000_0111, 0b1000_0001];
        let int = DecodedInt::read(&mut Cursor::new(data), data.len()).expect(READ_ERROR_MESSAGE);
        assert_eq!(int.size_in_bytes(), 3);
        assert_eq!(int.value(), &Int::I64(3_966_849));
    }

    #[test]
    fn test_read_three_byte_negative_int() {
        let data = &[0b1011_1100, 0b1000_0111, 0b1000_0001];
        let int = DecodedInt::read(&mut Cursor::new(data), data.len()).expect(READ_ERROR_MESSAGE);
        assert_eq!(int.size_in_bytes(), 3);
        assert_eq!(int.value(), &Int::I64(-3_966_849));
    }

    #[test]
    fn test_read_int_negative_zero() {
        let data = &[0b1000_0000];
        let int = DecodedInt::read(&mut Cursor::new(data), data.len()).expect(READ_ERROR_MESSAGE);
        assert_eq!(int.size_in_bytes(), 1);
        assert_eq!(int.value(), &Int::I64(0));
        assert!(int.is_negative_zero());
    }

    #[test]
    fn test_read_int_positive_zero() {
        let data = &[0b0000_0000];
        let int = DecodedInt::read(&mut Cursor::new(data), data.len()).expect(READ_ERROR_MESSAGE);
        assert_eq!(int.size_in_bytes(), 1);
        assert_eq!(int.value(), &Int::I64(0));
        assert!(!int.is_negative_zero());
    }

    #[test]
    fn test_read_int_length_zero() {
        let data = &[];
        let int = DecodedInt::read(&mut Cursor::new(data), data.len()).expect(READ_ERROR_MESSAGE);
        assert_eq!(int.size_in_bytes(), 0);
        assert_eq!(int.value(), &Int::I64(0));
        assert!(!int.is_negative_zero());
    }

    #[test]
    fn test_read_int_overflow() {
        let buffer = vec![1; MAX_INT_SIZE_IN_BYTES + 1];
        let data = buffer.as_slice();
        let _error = DecodedInt::read(&mut Cursor::new(data), data.len())
            .expect_err("This exceeded the configured max Int size.");
    }

    fn write_int_test(value: i64, expected_bytes: &[u8]) -> IonResult<()> {
        let mut buffer: Vec<u8> = vec![];
        DecodedInt::write_i64(&mut buffer, value)?;
        assert_eq!(buffer.as_slice(), expected_bytes);
        Ok(())
    }

    #[test]
    fn test_write_int_single_byte_values() -> IonResult<()> {
        write_int_test(0, &[0b0000_0000])?;
        write_int_test(1, &[0b0000_0001])?;
        write_int_test(100, &[0b0110_0100])?;
        write_int_test(-1, &[0b1000_0001])?;
        write_int_test(-100, &[0b1110_0100])?;
        Ok(())
    }

    #[test]
    fn test_write_int_two_byte_values() -> IonResult<()> {
        write_int_test(201, &[0b0000_0000, 0b1100_1001])?;
        write_int_test(-201, &[0b1000_0000, 0b1100_1001])?;
        write_int_test(16_000, &[0b0011_1110, 0b1000_0000])?;
        write_int_test(-16_000, &[0b1011_1110, 0b1000_0000])?;
        Ok(())
    }

    #[test]
    fn test_write_int_negative_zero() -> IonResult<()> {
        let mut buffer: Vec<u8> = vec![];
        DecodedInt::write_negative_zero(&mut buffer)?;
        assert_eq!(buffer.as_slice(), &[0b1000_0000]);
        Ok(())
    }

    #[test]
    fn test_write_int_round_trip_i64_extremes() -> IonResult<()> {
        for value in [i64::MAX, i64::MIN, i64::MIN + 1] {
            let mut buffer: Vec<u8> = vec![];
            let length = DecodedInt::write_i64(&mut buffer, value)?;
            let int = DecodedInt::read(&mut Cursor::new(buffer.as_slice()), length)?;
            assert_eq!(int.value(), &Int::I64(value));
        }
        Ok(())
    }
}
