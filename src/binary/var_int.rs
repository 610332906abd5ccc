use std::io::Write;

use crate::data_source::IonDataSource;
use crate::result::{decoding_error, IonResult};

type VarIntStorage = i64;

const BITS_PER_ENCODED_BYTE: usize = 7;
const BITS_PER_FIRST_BYTE: usize = 6;
// An i64's magnitude occupies up to 63 bits: 6 from the first group and 7 from each of the
// following groups, so ten groups cover any value.
const MAX_ENCODED_SIZE_IN_BYTES: usize = 10;

const LOWER_6_BITMASK: u8 = 0b0011_1111;
const LOWER_7_BITMASK: u8 = 0b0111_1111;
const HIGHEST_BIT_VALUE: u8 = 0b1000_0000;
const SIGN_BIT_VALUE: u8 = 0b0100_0000;

// Plus one byte in case the magnitude's most significant group collides with the sign bit.
const VAR_INT_BUFFER_SIZE: usize = MAX_ENCODED_SIZE_IN_BYTES + 1;

/// Represents a variable-length signed integer, used by the binary format for decimal
/// exponents and timestamp offsets. The first byte reserves its second-highest bit as the sign
/// bit; grouping and termination otherwise match [`VarUInt`](crate::binary::var_uint::VarUInt).
/// There is no negative zero: a zero magnitude is always encoded with a cleared sign bit.
#[derive(Debug)]
pub struct VarInt {
    size_in_bytes: usize,
    value: VarIntStorage,
}

impl VarInt {
    /// Reads a VarInt from the provided data source.
    pub fn read<R: IonDataSource>(data_source: &mut R) -> IonResult<VarInt> {
        // Unlike VarUInt's encoding, the first byte of a VarInt is a special case because
        // bit #6 (0-indexed, from the right) indicates whether the value is positive (0)
        // or negative (1).
        let first_byte: u8 = match data_source.next_byte()? {
            Some(byte) => byte,
            None => return crate::result::incomplete("a VarInt"),
        };
        let no_more_bytes: bool = first_byte >= HIGHEST_BIT_VALUE;
        let is_negative: bool = (first_byte & SIGN_BIT_VALUE) != 0;
        let sign: VarIntStorage = if is_negative { -1 } else { 1 };
        let mut magnitude = (first_byte & LOWER_6_BITMASK) as u128;

        if no_more_bytes {
            return Ok(VarInt {
                size_in_bytes: 1,
                value: magnitude as VarIntStorage * sign,
            });
        }

        let mut byte_processor = |byte: u8| {
            magnitude <<= BITS_PER_ENCODED_BYTE;
            magnitude |= (byte & LOWER_7_BITMASK) as u128;
            byte < HIGHEST_BIT_VALUE
        };
        let encoded_size_in_bytes =
            1 + data_source.read_next_byte_while(&mut byte_processor, "a VarInt")?;

        // A negative VarInt can carry one more unit of magnitude than a positive one
        // (i64::MIN has no positive counterpart).
        let max_magnitude: u128 = if is_negative {
            VarIntStorage::MAX as u128 + 1
        } else {
            VarIntStorage::MAX as u128
        };
        if encoded_size_in_bytes > MAX_ENCODED_SIZE_IN_BYTES || magnitude > max_magnitude {
            return decoding_error(format!(
                "found a {encoded_size_in_bytes}-byte VarInt whose magnitude does not fit in \
                 an i64; this implementation does not support arbitrary-precision magnitudes"
            ));
        }

        let value = if is_negative {
            (-(magnitude as i128)) as VarIntStorage
        } else {
            magnitude as VarIntStorage
        };
        Ok(VarInt {
            size_in_bytes: encoded_size_in_bytes,
            value,
        })
    }

    /// Encodes the given signed value as a VarInt and writes it to the sink, returning the
    /// number of bytes written.
    ///
    /// `i64::MIN` is supported: its magnitude is widened to a `u64` before negation, so no
    /// special-casing is required of the caller.
    pub fn write_i64<W: Write>(sink: &mut W, value: i64) -> IonResult<usize> {
        let magnitude: u64 = value.unsigned_abs();

        // The encoding process moves right-to-left, from the last byte in the buffer to the
        // first, in 7-bit groups.
        let mut buffer = [0u8; VAR_INT_BUFFER_SIZE];
        let mut first_byte = VAR_INT_BUFFER_SIZE;
        let mut remaining = magnitude;
        loop {
            first_byte -= 1;
            buffer[first_byte] = remaining as u8 & LOWER_7_BITMASK;
            remaining >>= BITS_PER_ENCODED_BYTE;
            if remaining == 0 {
                break;
            }
        }
        // If the leading group's 7th bit is occupied by the magnitude, prepend an empty group
        // to hold the sign bit.
        if buffer[first_byte] & SIGN_BIT_VALUE != 0 {
            first_byte -= 1;
        }
        if value < 0 {
            buffer[first_byte] |= SIGN_BIT_VALUE;
        }
        // Set the 'end' flag of the final byte.
        buffer[VAR_INT_BUFFER_SIZE - 1] |= HIGHEST_BIT_VALUE;

        let encoded_bytes = &buffer[first_byte..];
        sink.write_all(encoded_bytes)?;
        Ok(encoded_bytes.len())
    }

    /// Returns the value of the signed integer.
    #[inline(always)]
    pub fn value(&self) -> VarIntStorage {
        self.value
    }

    /// Returns the number of bytes that were read from the data source to construct this
    /// signed integer.
    #[inline(always)]
    pub fn size_in_bytes(&self) -> usize {
        self.size_in_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::VarInt;
    use crate::result::{IonError, IonResult};
    use std::io::{BufReader, Cursor};

    #[test]
    fn test_read_negative_var_int() -> IonResult<()> {
        let var_int = VarInt::read(&mut Cursor::new(&[0b0111_1001, 0b0000_1111, 0b1000_0001]))?;
        assert_eq!(var_int.size_in_bytes(), 3);
        assert_eq!(var_int.value(), -935_809);
        Ok(())
    }

    #[test]
    fn test_read_positive_var_int() -> IonResult<()> {
        let var_int = VarInt::read(&mut Cursor::new(&[0b0011_1001, 0b0000_1111, 0b1000_0001]))?;
        assert_eq!(var_int.size_in_bytes(), 3);
        assert_eq!(var_int.value(), 935_809);
        Ok(())
    }

    #[test]
    fn test_read_var_int_small_buffer() -> IonResult<()> {
        let var_int = VarInt::read(
            // A BufReader whose input buffer cannot hold all of the data at once
            &mut BufReader::with_capacity(1, Cursor::new(&[0b0111_1001, 0b0000_1111, 0b1000_0001])),
        )?;
        assert_eq!(var_int.size_in_bytes(), 3);
        assert_eq!(var_int.value(), -935_809);
        Ok(())
    }

    #[test]
    fn test_read_var_int_zero() -> IonResult<()> {
        let var_int = VarInt::read(&mut Cursor::new(&[0b1000_0000]))?;
        assert_eq!(var_int.size_in_bytes(), 1);
        assert_eq!(var_int.value(), 0);
        Ok(())
    }

    #[test]
    fn test_read_var_int_two_byte_min_and_max() -> IonResult<()> {
        let negative = VarInt::read(&mut Cursor::new(&[0b0111_1111, 0b1111_1111]))?;
        assert_eq!(negative.size_in_bytes(), 2);
        assert_eq!(negative.value(), -8_191);

        let positive = VarInt::read(&mut Cursor::new(&[0b0011_1111, 0b1111_1111]))?;
        assert_eq!(positive.size_in_bytes(), 2);
        assert_eq!(positive.value(), 8_191);
        Ok(())
    }

    #[test]
    fn test_read_var_int_truncated() {
        let result = VarInt::read(&mut Cursor::new(&[0b0011_1111, 0b0111_1111]));
        assert!(matches!(result, Err(IonError::Incomplete(_))));
        let result = VarInt::read(&mut Cursor::new(&[] as &[u8]));
        assert!(matches!(result, Err(IonError::Incomplete(_))));
    }

    #[test]
    fn test_read_var_int_overflow_detection() {
        let mut data = [0b0111_1111u8; 11];
        data[10] = 0b1111_1111;
        let result = VarInt::read(&mut &data[..]);
        assert!(matches!(result, Err(IonError::Decoding(_))));
    }

    fn var_int_round_trip_test(value: i64) -> IonResult<()> {
        let mut buffer = vec![];
        VarInt::write_i64(&mut buffer, value)?;
        let decoded = VarInt::read(&mut buffer.as_slice())?;
        assert_eq!(decoded.value(), value, "round trip failed for {value}");
        Ok(())
    }

    #[test]
    fn test_write_var_int_round_trip() -> IonResult<()> {
        for value in [
            0i64,
            1,
            -1,
            31,
            -31,
            32, // requires a second byte: magnitude collides with the sign bit
            -32,
            8_191,
            -8_191,
            935_809,
            -935_809,
            i64::MAX,
        ] {
            var_int_round_trip_test(value)?;
        }
        Ok(())
    }

    #[test]
    fn test_write_var_int_expected_encodings() -> IonResult<()> {
        let mut buffer = vec![];
        VarInt::write_i64(&mut buffer, -935_809)?;
        assert_eq!(
            buffer.as_slice(),
            &[0b0111_1001, 0b0000_1111, 0b1000_0001]
        );
        buffer.clear();
        VarInt::write_i64(&mut buffer, 0)?;
        assert_eq!(buffer.as_slice(), &[0b1000_0000]);
        Ok(())
    }

    #[test]
    fn test_write_var_int_min_i64() -> IonResult<()> {
        // i64::MIN's magnitude (2^63) cannot be produced by negating an i64 in place; the
        // encoder widens to a u64 magnitude first.
        var_int_round_trip_test(i64::MIN)
    }
}
