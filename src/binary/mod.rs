//! Structures and logic to read and write values in the binary Ion format.

pub mod constants;
pub mod cursor;
pub mod decimal;
mod header;
pub mod int;
mod nibbles;
pub mod raw_binary_writer;
pub mod timestamp;
pub(crate) mod type_code;
pub mod uint;
pub mod var_int;
pub mod var_uint;

pub use cursor::BinaryIonCursor;
pub use raw_binary_writer::RawBinaryWriter;
pub use type_code::IonTypeCode;

use constants::v1_0::IVM;

/// Returns `true` if the provided bytes begin with the exact four-byte Ion 1.0 version marker
/// that introduces every binary Ion stream.
///
/// This is the detection predicate an outer system can use to decide whether input should be
/// handed to the binary reader; any other leading bytes mean the input is not binary Ion 1.0
/// (it may still be text Ion).
pub fn is_binary_ion(data: &[u8]) -> bool {
    data.get(0..4) == Some(&IVM[..])
}

#[cfg(test)]
mod format_detection_tests {
    use super::*;

    #[test]
    fn ivm_is_recognized() {
        assert!(is_binary_ion(&[0xE0, 0x01, 0x00, 0xEA]));
        assert!(is_binary_ion(&[0xE0, 0x01, 0x00, 0xEA, 0x0F]));
    }

    #[test]
    fn other_leading_bytes_are_rejected() {
        assert!(!is_binary_ion(&[]));
        assert!(!is_binary_ion(&[0xE0, 0x01, 0x00]));
        assert!(!is_binary_ion(&[0xE0, 0x01, 0x01, 0xEA])); // Ion 1.1 is not recognized
        assert!(!is_binary_ion("$ion_1_0".as_bytes()));
    }
}
