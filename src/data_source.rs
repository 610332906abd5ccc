use std::io::BufRead;

use crate::result::{incomplete, IonResult};

/// Optimized read operations for parsing binary Ion.
///
/// The binary format calls for a number of reading patterns, including:
///
/// * Type descriptor octets (value headers) require that a single byte be read from input.
/// * Variable length integers (both signed and unsigned) require that a single byte at a time be
///   read from the data source until some condition is met.
/// * Fixed length values require that `n` bytes be read from the data source and interpreted as a
///   single value.
/// * Skipping over values, partial or whole, requires that the next `n` bytes of the data source
///   be ignored altogether.
///
/// The IonDataSource trait extends the functionality offered by [`BufRead`] with methods tailored
/// to these use cases. They prefer operating on data that's already in the input buffer in place
/// rather than copying it out to another byte array.
///
/// Running out of data partway through any of these operations is reported as
/// [`IonError::Incomplete`](crate::IonError::Incomplete) using the provided `label`; the label
/// should name the construct being read so the resulting error is actionable.
pub trait IonDataSource: BufRead {
    /// Ignores the next `number_of_bytes` bytes in the data source.
    fn skip_bytes(&mut self, number_of_bytes: usize, label: &'static str) -> IonResult<()>;

    /// Returns the next byte in the data source, or `None` if the source is empty.
    fn next_byte(&mut self) -> IonResult<Option<u8>>;

    /// Calls `byte_processor` on each byte in the data source until it returns false.
    /// Returns the number of bytes that were read and processed.
    fn read_next_byte_while<F>(
        &mut self,
        byte_processor: &mut F,
        label: &'static str,
    ) -> IonResult<usize>
    where
        F: FnMut(u8) -> bool;

    /// Fills the provided buffer with the next `buffer.len()` bytes from the data source.
    fn read_exact_bytes(&mut self, buffer: &mut [u8], label: &'static str) -> IonResult<()>;
}

// Allows all implementations of `BufRead` to be used as an IonDataSource, including BufReader
// and io::Cursor.
impl<T: BufRead> IonDataSource for T {
    // Moves the cursor within the input buffer until `number_of_bytes` bytes have been skipped.
    // Will read from the underlying data source as needed.
    fn skip_bytes(&mut self, number_of_bytes: usize, label: &'static str) -> IonResult<()> {
        let mut bytes_skipped = 0;
        while bytes_skipped < number_of_bytes {
            let buffer = self.fill_buf()?;
            if buffer.is_empty() {
                return incomplete(label);
            }
            let bytes_to_skip = (number_of_bytes - bytes_skipped).min(buffer.len());
            self.consume(bytes_to_skip);
            bytes_skipped += bytes_to_skip;
        }
        Ok(())
    }

    // Returns the next byte in the input buffer if one is available. Otherwise reads one from the
    // underlying data source.
    #[inline(always)]
    fn next_byte(&mut self) -> IonResult<Option<u8>> {
        match self.fill_buf()?.first() {
            Some(&byte) => {
                self.consume(1);
                Ok(Some(byte))
            }
            None => Ok(None),
        }
    }

    // Some encoding primitives have a length that must be discovered by inspecting one byte at a
    // time. Iterating over the data source's input bytes with io::Read::bytes() would require
    // error handling for each byte read; this method instead processes the bytes of the input
    // buffer in place, refilling it only when it has been exhausted.
    fn read_next_byte_while<F>(
        &mut self,
        byte_processor: &mut F,
        label: &'static str,
    ) -> IonResult<usize>
    where
        F: FnMut(u8) -> bool,
    {
        // The number of bytes that have been processed by the provided closure
        let mut number_of_bytes_processed: usize = 0;
        // The number of bytes that have been flushed from the input buffer after processing them
        let mut number_of_bytes_consumed: usize = 0;

        loop {
            let buffer = self.fill_buf()?;
            if buffer.is_empty() {
                return incomplete(label);
            }

            for byte in buffer {
                number_of_bytes_processed += 1;
                if !byte_processor(*byte) {
                    // The closure is finished reading. Notify the data source of how many bytes
                    // we've used from the buffer so they can be removed.
                    self.consume(number_of_bytes_processed - number_of_bytes_consumed);
                    return Ok(number_of_bytes_processed);
                }
            }

            // We've processed all of the available data but the closure isn't finished yet.
            // Empty the buffer so the next loop iteration will refill it.
            let number_of_buffered_bytes = buffer.len();
            self.consume(number_of_buffered_bytes);
            number_of_bytes_consumed += number_of_buffered_bytes;
        }
    }

    fn read_exact_bytes(&mut self, buffer: &mut [u8], label: &'static str) -> IonResult<()> {
        match self.read_exact(buffer) {
            Ok(()) => Ok(()),
            Err(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof => incomplete(label),
            Err(io_error) => Err(io_error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::IonDataSource;
    use crate::result::IonError;
    use std::io::BufReader;

    fn test_data(buffer_size: usize, data: &'static [u8]) -> impl IonDataSource {
        BufReader::with_capacity(buffer_size, data)
    }

    #[test]
    fn test_next_byte() {
        let mut data_source = test_data(2, &[1, 2, 3]);
        assert_eq!(Some(1), data_source.next_byte().unwrap());
        assert_eq!(Some(2), data_source.next_byte().unwrap());
        assert_eq!(Some(3), data_source.next_byte().unwrap());
        assert_eq!(None, data_source.next_byte().unwrap());
    }

    #[test]
    fn test_skip_bytes() {
        let mut data_source = test_data(2, &[1, 2, 3, 4, 5]);
        data_source.skip_bytes(3, "test data").unwrap();
        assert_eq!(Some(4), data_source.next_byte().unwrap());
        data_source.skip_bytes(1, "test data").unwrap();
        assert_eq!(None, data_source.next_byte().unwrap());
    }

    #[test]
    fn test_read_next_byte_while() {
        let mut data_source = test_data(2, &[1, 2, 3, 4, 5]);
        let mut sum: u64 = 0;
        let processor = &mut |byte: u8| {
            sum += byte as u64;
            byte < 4
        };
        let number_of_bytes_processed = data_source
            .read_next_byte_while(processor, "test data")
            .unwrap();
        assert_eq!(number_of_bytes_processed, 4);
        assert_eq!(sum, 10);
    }

    #[test]
    fn test_eof_during_skip_bytes() {
        let mut data_source = test_data(2, &[1, 2, 3]);
        let result = data_source.skip_bytes(42, "test data");
        assert!(matches!(result, Err(IonError::Incomplete(_))));
    }

    #[test]
    fn test_eof_during_read_exact_bytes() {
        let mut data_source = test_data(2, &[1, 2, 3]);
        let mut buffer = [0u8; 8];
        let result = data_source.read_exact_bytes(&mut buffer, "test data");
        assert!(matches!(result, Err(IonError::Incomplete(_))));
    }
}
