use std::io::Write;
use std::mem;

use crate::data_source::IonDataSource;
use crate::result::{decoding_error, IonResult};

type VarUIntStorage = u64;

const BITS_PER_ENCODED_BYTE: usize = 7;
const STORAGE_SIZE_IN_BITS: usize = mem::size_of::<VarUIntStorage>() * 8;
// A u64's 64 bits of magnitude occupy up to ten 7-bit groups.
const MAX_ENCODED_SIZE_IN_BYTES: usize =
    (STORAGE_SIZE_IN_BITS + BITS_PER_ENCODED_BYTE - 1) / BITS_PER_ENCODED_BYTE;

const LOWER_7_BITMASK: u8 = 0b0111_1111;
const HIGHEST_BIT_VALUE: u8 = 0b1000_0000;

// A u64 magnitude can require up to ten 7-bit groups.
const VAR_UINT_BUFFER_SIZE: usize = 10;

/// Represents a variable-length unsigned integer: the encoding used throughout the binary
/// format for lengths, symbol IDs, and other unsigned magnitudes. Values are written as 7-bit
/// groups, most significant group first; the final byte is marked by setting its high bit.
#[derive(Debug)]
pub struct VarUInt {
    value: VarUIntStorage,
    size_in_bytes: usize,
}

impl VarUInt {
    /// Reads a VarUInt from the provided data source.
    ///
    /// Reaching the end of the data source before a terminator byte is an
    /// [`Incomplete`](crate::IonError::Incomplete) error. A VarUInt whose magnitude overflows
    /// this implementation's storage is a [`Decoding`](crate::IonError::Decoding) error whose
    /// message names the supported size, allowing callers to decide whether to fall back to an
    /// arbitrary-precision read.
    pub fn read<R: IonDataSource>(data_source: &mut R) -> IonResult<VarUInt> {
        // Accumulate in a u128 so that a wider-than-u64 encoding is detected by inspecting the
        // final magnitude rather than lost to shifted-out bits.
        let mut magnitude: u128 = 0;

        let mut byte_processor = |byte: u8| {
            magnitude <<= BITS_PER_ENCODED_BYTE;
            magnitude |= (byte & LOWER_7_BITMASK) as u128;
            byte < HIGHEST_BIT_VALUE // If the high bit is set, we're done.
        };

        let encoded_size_in_bytes =
            data_source.read_next_byte_while(&mut byte_processor, "a VarUInt")?;

        if encoded_size_in_bytes > MAX_ENCODED_SIZE_IN_BYTES
            || magnitude > VarUIntStorage::MAX as u128
        {
            return decoding_error(format!(
                "found a {encoded_size_in_bytes}-byte VarUInt whose magnitude requires more \
                 than {STORAGE_SIZE_IN_BITS} bits; this implementation does not support \
                 arbitrary-precision magnitudes"
            ));
        }

        Ok(VarUInt {
            value: magnitude as VarUIntStorage,
            size_in_bytes: encoded_size_in_bytes,
        })
    }

    /// Encodes the given unsigned value as a VarUInt and writes it to the sink, returning the
    /// number of bytes written.
    pub fn write_u64<W: Write>(sink: &mut W, magnitude: u64) -> IonResult<usize> {
        if magnitude == 0 {
            sink.write_all(&[0b1000_0000])?;
            return Ok(1);
        }

        // The encoding process moves right-to-left, from the last byte in the buffer to the
        // first. `first_byte` tracks the leftmost occupied byte in the buffer.
        let mut buffer = [0u8; VAR_UINT_BUFFER_SIZE];
        let mut first_byte = VAR_UINT_BUFFER_SIZE;
        let mut magnitude = magnitude;
        while magnitude > 0 {
            first_byte -= 1;
            buffer[first_byte] = magnitude as u8 & LOWER_7_BITMASK;
            magnitude >>= BITS_PER_ENCODED_BYTE;
        }
        // Set the 'end' flag of the final byte.
        buffer[VAR_UINT_BUFFER_SIZE - 1] |= HIGHEST_BIT_VALUE;

        let encoded_bytes = &buffer[first_byte..];
        sink.write_all(encoded_bytes)?;
        Ok(encoded_bytes.len())
    }

    /// Returns the magnitude of the unsigned integer.
    #[inline(always)]
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Returns the number of bytes that were read from the data source to construct this
    /// unsigned integer.
    #[inline(always)]
    pub fn size_in_bytes(&self) -> usize {
        self.size_in_bytes
    }
}
