use std::io::Write;
use std::mem;

use num_bigint::BigUint;

use crate::data_source::IonDataSource;
use crate::result::{decoding_error, IonResult};
use crate::types::UInt;

// This limit is used for stack-allocating buffer space to encode/decode UInts.
const UINT_STACK_BUFFER_SIZE: usize = 16;
// This number was chosen somewhat arbitrarily and could be lifted if a use case demands it.
const MAX_UINT_SIZE_IN_BYTES: usize = 2048;

/// Represents a fixed-length unsigned integer: the payload encoding used for integer values
/// (whose sign lives in the type code) and symbol IDs. The magnitude is written as big-endian
/// bytes with no leading zero byte; a magnitude of zero has a zero-length encoding.
#[derive(Debug)]
pub struct DecodedUInt {
    size_in_bytes: usize,
    value: UInt,
}

impl DecodedUInt {
    /// Reads a UInt with `length` bytes from the provided data source.
    pub fn read<R: IonDataSource>(data_source: &mut R, length: usize) -> IonResult<DecodedUInt> {
        if length > MAX_UINT_SIZE_IN_BYTES {
            return decoding_error(format!(
                "found a {length}-byte UInt; the maximum supported size is \
                 {MAX_UINT_SIZE_IN_BYTES} bytes"
            ));
        }

        if length <= UINT_STACK_BUFFER_SIZE {
            let buffer = &mut [0u8; UINT_STACK_BUFFER_SIZE];
            DecodedUInt::read_using_buffer(data_source, length, buffer)
        } else {
            // This UInt is enormous; heap-allocate a Vec to use as storage.
            let mut buffer = vec![0u8; length];
            DecodedUInt::read_using_buffer(data_source, length, buffer.as_mut_slice())
        }
    }

    fn read_using_buffer<R: IonDataSource>(
        data_source: &mut R,
        length: usize,
        buffer: &mut [u8],
    ) -> IonResult<DecodedUInt> {
        let buffer = &mut buffer[0..length];
        data_source.read_exact_bytes(buffer, "a UInt")?;

        let value = if length <= mem::size_of::<u64>() {
            let mut magnitude: u64 = 0;
            for &byte in buffer.iter() {
                magnitude <<= 8;
                magnitude |= byte as u64;
            }
            UInt::U64(magnitude)
        } else {
            UInt::from(BigUint::from_bytes_be(buffer))
        };

        Ok(DecodedUInt {
            size_in_bytes: length,
            value,
        })
    }

    /// Encodes the magnitude of `value` as a big-endian UInt and writes it to `sink`, returning
    /// the number of bytes written. A magnitude of zero writes nothing.
    pub fn write_u64<W: Write>(sink: &mut W, magnitude: u64) -> IonResult<usize> {
        let encoded = encode_u64(magnitude);
        sink.write_all(encoded.as_bytes())?;
        Ok(encoded.as_bytes().len())
    }

    /// Returns the magnitude of the unsigned integer.
    #[inline(always)]
    pub fn value(&self) -> &UInt {
        &self.value
    }

    /// Returns the number of bytes that were read from the data source to construct this
    /// unsigned integer.
    #[inline(always)]
    pub fn size_in_bytes(&self) -> usize {
        self.size_in_bytes
    }
}

impl From<DecodedUInt> for UInt {
    fn from(uint: DecodedUInt) -> Self {
        uint.value
    }
}

/// The big-endian encoding of a u64 magnitude, held in a stack-allocated array alongside its
/// occupied length.
pub(crate) struct EncodedU64 {
    bytes: [u8; mem::size_of::<u64>()],
    first_occupied_byte: usize,
}

impl EncodedU64 {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[self.first_occupied_byte..]
    }
}

/// Encodes a u64 magnitude as big-endian bytes with no leading zero bytes. A magnitude of zero
/// occupies zero bytes.
pub(crate) fn encode_u64(magnitude: u64) -> EncodedU64 {
    let bytes = magnitude.to_be_bytes();
    let first_occupied_byte = magnitude.leading_zeros() as usize / 8;
    EncodedU64 {
        bytes,
        first_occupied_byte,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const READ_ERROR_MESSAGE: &str = "Failed to read a UInt from the provided data.";

    #[test]
    fn test_read_one_byte_uint() {
        let data = &[0b1000_0000];
        let uint = DecodedUInt::read(&mut Cursor::new(data), data.len()).expect(READ_ERROR_MESSAGE);
        assert_eq!(uint.size_in_bytes(), 1);
        assert_eq!(uint.value(), &UInt::U64(128));
    }

    #[test]
    fn test_read_two_byte_uint() {
        let data = &[0b0111_1111, 0b1111_1111];
        let uint = DecodedUInt::read(&mut Cursor::new(data), data.len()).expect(READ_ERROR_MESSAGE);
        assert_eq!(uint.size_in_bytes(), 2);
        assert_eq!(uint.value(), &UInt::U64(32_767));
    }

    #[test]
    fn test_read_three_byte_uint() {
        let data = &[0b0011_1100, 0b1000_0111, 0b1000_0001];
        let uint = DecodedUInt::read(&mut Cursor::new(data), data.len()).expect(READ_ERROR_MESSAGE);
        assert_eq!(uint.size_in_bytes(), 3);
        assert_eq!(uint.value(), &UInt::U64(3_966_849));
    }

    #[test]
    fn test_read_zero_length_uint_is_zero() {
        let data = &[];
        let uint = DecodedUInt::read(&mut Cursor::new(data), 0).expect(READ_ERROR_MESSAGE);
        assert_eq!(uint.size_in_bytes(), 0);
        assert_eq!(uint.value(), &UInt::U64(0));
    }

    #[test]
    fn test_read_uint_larger_than_u64() {
        let data = &[0x01u8; 9]; // 72 bits of magnitude
        let uint = DecodedUInt::read(&mut Cursor::new(data), data.len()).expect(READ_ERROR_MESSAGE);
        assert_eq!(uint.size_in_bytes(), 9);
        assert!(matches!(uint.value(), UInt::BigUInt(_)));
    }

    #[test]
    fn test_read_uint_too_large() {
        let buffer = vec![1; MAX_UINT_SIZE_IN_BYTES + 1];
        let data = buffer.as_slice();
        let _error = DecodedUInt::read(&mut Cursor::new(data), data.len())
            .expect_err("This exceeded the configured max UInt size.");
    }

    #[test]
    fn test_write_u64() {
        let mut buffer: Vec<u8> = vec![];
        DecodedUInt::write_u64(&mut buffer, 3_966_849).unwrap();
        assert_eq!(buffer.as_slice(), &[0b0011_1100, 0b1000_0111, 0b1000_0001]);
        buffer.clear();
        DecodedUInt::write_u64(&mut buffer, 0).unwrap();
        assert!(buffer.is_empty());
    }
}
