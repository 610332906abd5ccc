use crate::binary::nibbles::nibbles_from_byte;
use crate::binary::type_code::IonTypeCode;
use crate::result::IonResult;
use crate::types::IonType;

/// Contains all of the information that can be extracted from the one-octet type descriptor
/// found at the beginning of each value, annotation wrapper, and NOP pad in a binary Ion
/// stream.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Header {
    pub ion_type_code: IonTypeCode,
    pub ion_type: Option<IonType>,
    pub length_code: u8,
}

impl Header {
    /// Attempts to parse the provided byte. If the type code is unrecognized, an error will be
    /// returned.
    pub fn from_byte(byte: u8) -> IonResult<Header> {
        let (type_code, length_code) = nibbles_from_byte(byte);
        let ion_type_code = IonTypeCode::try_from(type_code)?;
        let ion_type = ion_type_code.as_ion_type();
        Ok(Header {
            ion_type,
            ion_type_code,
            length_code,
        })
    }
}

/// Parses all 256 possible type descriptor bytes and stores the results in a Vec, which can be
/// used as a jump table to avoid re-interpreting the same byte values repeatedly. Calling code
/// is responsible for handling the end-of-file and IO error cases; each entry in the table is
/// stored as an `IonResult<Option<Header>>` so that, when another byte is available and no IO
/// error occurs, the entry can be returned as-is.
pub(crate) fn create_header_byte_jump_table() -> Vec<IonResult<Option<Header>>> {
    let mut header_jump_table = Vec::with_capacity(256);
    for byte_value in 0..=255u8 {
        let entry = Header::from_byte(byte_value).map(Some);
        header_jump_table.push(entry);
    }
    header_jump_table
}
