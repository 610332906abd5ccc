use std::mem;

use chrono::{DateTime, FixedOffset};

use crate::binary::constants::v1_0::{length_codes, IVM};
use crate::binary::decimal::decode_decimal;
use crate::binary::header::{create_header_byte_jump_table, Header};
use crate::binary::timestamp::decode_timestamp;
use crate::binary::type_code::IonTypeCode;
use crate::binary::uint::DecodedUInt;
use crate::binary::var_uint::VarUInt;
use crate::cursor::{Cursor, StreamItem};
use crate::data_source::IonDataSource;
use crate::result::{
    decoding_error, decoding_error_raw, illegal_operation, illegal_operation_raw, incomplete,
    IonResult,
};
use crate::types::{Decimal, Int, IonType, SymbolId, UInt};

/// Everything the cursor knows about the value it is currently positioned on.
#[derive(Clone, Debug)]
struct CursorValue {
    ion_type: IonType,
    header: Header,
    is_null: bool,
    index_at_depth: usize,
    length_in_bytes: usize,
    // The stream offset one past the end of this value's payload.
    last_byte: usize,
    field_id: Option<SymbolId>,
    annotations: Vec<SymbolId>,
    // The value's payload, loaded on the first `read_*` call. Caching it makes scalar reads
    // idempotent: every subsequent read decodes from this buffer instead of the data source.
    payload: Option<Vec<u8>>,
}

impl Default for CursorValue {
    fn default() -> CursorValue {
        CursorValue {
            ion_type: IonType::Null,
            header: Header {
                ion_type: Some(IonType::Null),
                ion_type_code: IonTypeCode::NullOrNop,
                length_code: length_codes::NULL,
            },
            field_id: None,
            annotations: Vec::new(),
            is_null: true,
            index_at_depth: 0,
            length_in_bytes: 0,
            last_byte: 0,
            payload: None,
        }
    }
}

/* CursorState is broken out from the BinaryIonCursor struct to allow it to be cloned
 * or replaced as part of a seek operation.
 */
#[derive(Clone, Debug)]
pub struct CursorState {
    // The (major, minor) version pair of the stream being read. Defaults to (1, 0).
    ion_version: (u8, u8),
    // Whether a leading version marker has been read yet.
    seen_ivm: bool,
    // How many bytes we've read from our data source.
    bytes_read: usize,
    // How deeply nested the cursor is at the moment.
    depth: usize,
    // The number of values that have been read at the current depth.
    index_at_depth: usize,
    // Whether the cursor is currently traversing a struct's fields.
    is_in_struct: bool,
    // Information about the value on which the cursor is currently sitting.
    value: CursorValue,
    // All of the values into which the cursor has stepped. Empty at the top level.
    parents: Vec<CursorValue>,
}

/// A low-level cursor over a binary Ion data source. It offers no symbol management; symbol
/// values, field names, and annotations are surfaced as raw symbol IDs.
///
/// The stream must begin with the four-byte Ion 1.0 version marker; anything else is rejected
/// as unreadable. (Use [`is_binary_ion`](crate::binary::is_binary_ion) to detect the format
/// without consuming input.)
pub struct BinaryIonCursor<R>
where
    R: IonDataSource,
{
    data_source: R,
    cursor: CursorState,
    header_cache: Vec<IonResult<Option<Header>>>,
}

impl<R: IonDataSource> Cursor for BinaryIonCursor<R> {
    fn ion_version(&self) -> (u8, u8) {
        self.cursor.ion_version
    }

    fn next(&mut self) -> IonResult<Option<StreamItem>> {
        // If the cursor is partway through the current value, skip the rest of it.
        self.skip_current_value()?;

        loop {
            if let Some(parent) = self.cursor.parents.last() {
                // Don't attempt to read beyond the end of the parent container; users can call
                // step_out() to progress past it.
                if self.cursor.bytes_read >= parent.last_byte {
                    return Ok(None);
                }
            }

            // If we're in a struct, read the field ID that must precede each value.
            self.cursor.value.field_id = if self.cursor.is_in_struct {
                Some(self.read_field_id()?)
            } else {
                None
            };

            let header_byte = match self.data_source.next_byte()? {
                Some(byte) => byte,
                // A clean end of stream is only possible at the top level, between values.
                None if self.cursor.depth == 0 && !self.cursor.is_in_struct => return Ok(None),
                None => return incomplete("a type descriptor"),
            };
            self.cursor.bytes_read += 1;

            if !self.cursor.seen_ivm {
                // The first byte of every binary Ion stream belongs to a version marker.
                if header_byte != 0xE0 {
                    return decoding_error(
                        "the stream does not begin with an Ion version marker",
                    );
                }
            }

            let mut header = match &self.header_cache[header_byte as usize] {
                Ok(Some(header)) => *header,
                Ok(None) => unreachable!("the jump table contains an entry for every byte"),
                Err(error) => return Err(error.clone()),
            };

            self.cursor.value.annotations.truncate(0);
            self.cursor.value.payload = None;

            // A type code of 0 with a non-null length nibble is NOP padding; skip it and look
            // for the next value.
            if header.ion_type_code == IonTypeCode::NullOrNop
                && header.length_code != length_codes::NULL
            {
                let pad_length = self.read_standard_length(header.length_code)?;
                self.check_parent_bound(self.cursor.bytes_read + pad_length)?;
                self.skip_bytes(pad_length, "a NOP pad")?;
                continue;
            }

            let mut annotations_wrapper_end: Option<usize> = None;
            if header.ion_type_code == IonTypeCode::AnnotationOrIvm {
                if header.length_code == 0 {
                    // This is the first byte of an Ion version marker.
                    if self.cursor.depth > 0 {
                        return decoding_error(
                            "found a version marker inside a container",
                        );
                    }
                    return Ok(Some(self.read_ivm()?));
                }
                if header.length_code == length_codes::NULL {
                    return decoding_error("0xEF is not a legal type descriptor");
                }

                // We've found an annotation wrapper. Note where it must end, read the
                // annotation symbol IDs, then read the header of the wrapped value itself.
                let wrapper_length = self.read_standard_length(header.length_code)?;
                let wrapper_end = self.cursor.bytes_read + wrapper_length;
                self.check_parent_bound(wrapper_end)?;
                self.read_annotations()?;

                let wrapped_byte = match self.data_source.next_byte()? {
                    Some(byte) => byte,
                    None => return incomplete("an annotated value"),
                };
                self.cursor.bytes_read += 1;
                header = match &self.header_cache[wrapped_byte as usize] {
                    Ok(Some(header)) => *header,
                    Ok(None) => unreachable!("the jump table contains an entry for every byte"),
                    Err(error) => return Err(error.clone()),
                };
                match header.ion_type_code {
                    IonTypeCode::AnnotationOrIvm => {
                        return decoding_error(
                            "found an annotation wrapper wrapping another annotation wrapper",
                        )
                    }
                    IonTypeCode::NullOrNop if header.length_code != length_codes::NULL => {
                        return decoding_error("found an annotation wrapper wrapping a NOP pad")
                    }
                    _ => {}
                }
                annotations_wrapper_end = Some(wrapper_end);
            }

            self.process_header_by_type_code(header)?;

            // The wrapped value must occupy exactly the remainder of its annotation wrapper.
            if let Some(wrapper_end) = annotations_wrapper_end {
                if self.cursor.value.last_byte != wrapper_end {
                    return decoding_error(
                        "an annotation wrapper's length disagrees with its wrapped value's length",
                    );
                }
            }
            self.check_parent_bound(self.cursor.value.last_byte)?;

            self.cursor.index_at_depth += 1;
            self.cursor.value.index_at_depth = self.cursor.index_at_depth;

            return Ok(Some(StreamItem::Value(
                self.cursor.value.ion_type,
                self.cursor.value.is_null,
            )));
        }
    }

    fn ion_type(&self) -> Option<IonType> {
        if self.cursor.index_at_depth == 0 {
            return None;
        }
        Some(self.cursor.value.ion_type)
    }

    fn is_null(&self) -> bool {
        self.cursor.value.is_null
    }

    fn annotation_ids(&self) -> &[SymbolId] {
        &self.cursor.value.annotations
    }

    fn field_id(&self) -> Option<SymbolId> {
        self.cursor.value.field_id
    }

    fn read_null(&mut self) -> IonResult<Option<IonType>> {
        if self.is_null() {
            return Ok(Some(self.cursor.value.ion_type));
        }
        Ok(None)
    }

    fn read_bool(&mut self) -> IonResult<Option<bool>> {
        if self.cursor.value.ion_type != IonType::Bool || self.cursor.value.is_null {
            return Ok(None);
        }
        // No reading from the stream occurs; the header contains everything we need.
        match self.cursor.value.header.length_code {
            0 => Ok(Some(false)),
            1 => Ok(Some(true)),
            code => decoding_error(format!(
                "found a boolean value with an illegal length code: {code}"
            )),
        }
    }

    fn read_i64(&mut self) -> IonResult<Option<i64>> {
        match self.read_int()? {
            Some(int) => match int.as_i64() {
                Some(value) => Ok(Some(value)),
                None => decoding_error(
                    "the current integer does not fit in an i64; use read_int() instead",
                ),
            },
            None => Ok(None),
        }
    }

    fn read_int(&mut self) -> IonResult<Option<Int>> {
        if self.cursor.value.ion_type != IonType::Int || self.cursor.value.is_null {
            return Ok(None);
        }
        let type_code = self.cursor.value.header.ion_type_code;
        let length = self.cursor.value.length_in_bytes;
        let bytes = self.value_bytes()?;
        let magnitude: UInt = DecodedUInt::read(&mut &bytes[..], length)?.into();

        let value = match type_code {
            IonTypeCode::PositiveInteger => Int::from(magnitude),
            IonTypeCode::NegativeInteger => -Int::from(magnitude),
            _ => unreachable!("an Int value always has type code 2 or 3"),
        };
        Ok(Some(value))
    }

    fn read_f32(&mut self) -> IonResult<Option<f32>> {
        match self.read_f64() {
            Ok(Some(value)) => Ok(Some(value as f32)), // Lossy if the encoding was 64 bits
            Ok(None) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn read_f64(&mut self) -> IonResult<Option<f64>> {
        if self.cursor.value.ion_type != IonType::Float || self.cursor.value.is_null {
            return Ok(None);
        }
        let bytes = self.value_bytes()?;
        let value = match bytes.len() {
            0 => 0f64,
            4 => f64::from(f32::from_be_bytes(bytes.try_into().unwrap())),
            8 => f64::from_be_bytes(bytes.try_into().unwrap()),
            length => {
                return decoding_error(format!(
                    "found a float value with an illegal length: {length}"
                ))
            }
        };
        Ok(Some(value))
    }

    fn read_decimal(&mut self) -> IonResult<Option<Decimal>> {
        if self.cursor.value.ion_type != IonType::Decimal || self.cursor.value.is_null {
            return Ok(None);
        }
        let length = self.cursor.value.length_in_bytes;
        let bytes = self.value_bytes()?;
        decode_decimal(&mut &bytes[..], length).map(Some)
    }

    fn read_string(&mut self) -> IonResult<Option<String>> {
        if self.cursor.value.ion_type != IonType::String || self.cursor.value.is_null {
            return Ok(None);
        }
        let bytes = self.value_bytes()?;
        let text = std::str::from_utf8(bytes)
            .map_err(|_| decoding_error_raw("found a string with invalid UTF-8"))?;
        Ok(Some(text.to_string()))
    }

    fn read_symbol_id(&mut self) -> IonResult<Option<SymbolId>> {
        if self.cursor.value.ion_type != IonType::Symbol || self.cursor.value.is_null {
            return Ok(None);
        }
        let length = self.cursor.value.length_in_bytes;
        let bytes = self.value_bytes()?;
        let magnitude: UInt = DecodedUInt::read(&mut &bytes[..], length)?.into();
        let symbol_id = magnitude
            .as_u64()
            .and_then(|value| usize::try_from(value).ok())
            .ok_or_else(|| decoding_error_raw("found a symbol ID that overflows a usize"))?;
        Ok(Some(symbol_id))
    }

    fn read_blob_bytes(&mut self) -> IonResult<Option<Vec<u8>>> {
        if self.cursor.value.ion_type != IonType::Blob || self.cursor.value.is_null {
            return Ok(None);
        }
        self.value_bytes().map(|bytes| Some(bytes.to_vec()))
    }

    fn read_clob_bytes(&mut self) -> IonResult<Option<Vec<u8>>> {
        if self.cursor.value.ion_type != IonType::Clob || self.cursor.value.is_null {
            return Ok(None);
        }
        self.value_bytes().map(|bytes| Some(bytes.to_vec()))
    }

    fn read_datetime(&mut self) -> IonResult<Option<DateTime<FixedOffset>>> {
        if self.cursor.value.ion_type != IonType::Timestamp || self.cursor.value.is_null {
            return Ok(None);
        }
        let length = self.cursor.value.length_in_bytes;
        let bytes = self.value_bytes()?;
        decode_timestamp(&mut &bytes[..], length).map(Some)
    }

    fn step_in(&mut self) -> IonResult<()> {
        use IonType::*;
        if self.cursor.index_at_depth == 0 {
            return illegal_operation("the cursor is not positioned on a value");
        }
        if self.cursor.value.is_null {
            return illegal_operation("cannot step into a null container");
        }
        self.cursor.is_in_struct = match self.cursor.value.ion_type {
            Struct => true,
            List | SExp => false,
            other => {
                return illegal_operation(format!("cannot step into a(n) {other}"));
            }
        };
        self.cursor.parents.push(self.cursor.value.clone());
        self.cursor.depth += 1;
        self.cursor.index_at_depth = 0;
        Ok(())
    }

    fn step_out(&mut self) -> IonResult<()> {
        let mut parent = self
            .cursor
            .parents
            .pop()
            .ok_or_else(|| illegal_operation_raw("cannot step out at the top level"))?;

        // Any unread values remaining in the container are discarded.
        let bytes_to_skip = parent.last_byte.saturating_sub(self.cursor.bytes_read);

        // The container becomes the current value.
        mem::swap(&mut self.cursor.value, &mut parent);

        self.cursor.is_in_struct = self
            .cursor
            .parents
            .last()
            .map(|parent| parent.ion_type == IonType::Struct)
            .unwrap_or(false);
        self.cursor.index_at_depth = self.cursor.value.index_at_depth;
        self.cursor.depth -= 1;
        self.skip_bytes(bytes_to_skip, "the end of a container")?;
        Ok(())
    }

    fn depth(&self) -> usize {
        self.cursor.depth
    }
}

impl<R: IonDataSource> BinaryIonCursor<R> {
    pub fn new(data_source: R) -> Self {
        BinaryIonCursor {
            data_source,
            cursor: CursorState {
                ion_version: (1, 0),
                seen_ivm: false,
                bytes_read: 0,
                depth: 0,
                index_at_depth: 0,
                is_in_struct: false,
                value: Default::default(),
                parents: Vec::new(),
            },
            header_cache: create_header_byte_jump_table(),
        }
    }

    /// The number of bytes the cursor has consumed from its data source. Errors raised while
    /// reading refer to the bytes at and beyond this offset.
    pub fn bytes_read(&self) -> usize {
        self.cursor.bytes_read
    }

    /// If the current value is a non-null scalar, returns its raw payload bytes exactly as
    /// they appeared in the stream (without the type descriptor or length). This enables a
    /// writer to forward the encoded form without a decode/re-encode pass; see
    /// [`BinaryWriter::write_raw_scalar`](crate::binary_writer::BinaryWriter::write_raw_scalar)
    /// for the symbol table requirements that apply.
    pub fn raw_value_bytes(&mut self) -> IonResult<Option<&[u8]>> {
        if self.cursor.index_at_depth == 0
            || self.cursor.value.is_null
            || self.cursor.value.ion_type.is_container()
        {
            return Ok(None);
        }
        self.value_bytes().map(Some)
    }

    // Loads (if necessary) and returns the current value's payload bytes. Repeated calls
    // return the same cached buffer.
    fn value_bytes(&mut self) -> IonResult<&[u8]> {
        if self.cursor.value.payload.is_none() {
            let length = self.cursor.value.length_in_bytes;
            let mut buffer = vec![0u8; length];
            self.data_source
                .read_exact_bytes(&mut buffer, "a value's payload")?;
            self.cursor.bytes_read += length;
            self.cursor.value.payload = Some(buffer);
        }
        Ok(self.cursor.value.payload.as_deref().unwrap())
    }

    fn read_var_uint(&mut self) -> IonResult<VarUInt> {
        let var_uint = VarUInt::read(&mut self.data_source)?;
        self.cursor.bytes_read += var_uint.size_in_bytes();
        Ok(var_uint)
    }

    fn skip_bytes(&mut self, number_of_bytes: usize, label: &'static str) -> IonResult<()> {
        if number_of_bytes == 0 {
            return Ok(());
        }
        self.data_source.skip_bytes(number_of_bytes, label)?;
        self.cursor.bytes_read += number_of_bytes;
        Ok(())
    }

    fn skip_current_value(&mut self) -> IonResult<()> {
        if self.cursor.index_at_depth == 0 {
            return Ok(());
        }
        let bytes_to_skip = self
            .cursor
            .value
            .last_byte
            .saturating_sub(self.cursor.bytes_read);
        self.skip_bytes(bytes_to_skip, "the rest of a value")
    }

    fn read_field_id(&mut self) -> IonResult<SymbolId> {
        let var_uint = self.read_var_uint()?;
        usize::try_from(var_uint.value())
            .map_err(|_| decoding_error_raw("found a field ID that overflows a usize"))
    }

    fn read_ivm(&mut self) -> IonResult<StreamItem> {
        let mut rest = [0u8; 3];
        self.data_source
            .read_exact_bytes(&mut rest, "a version marker")?;
        self.cursor.bytes_read += rest.len();
        let [major, minor, terminator] = rest;
        if terminator != IVM[3] {
            return decoding_error("found an invalid version marker");
        }
        if (major, minor) != (1, 0) {
            return decoding_error(format!(
                "found a version marker for unsupported Ion version {major}.{minor}"
            ));
        }
        self.cursor.ion_version = (major, minor);
        self.cursor.seen_ivm = true;
        self.cursor.value = CursorValue::default();
        self.cursor.index_at_depth = 0;
        Ok(StreamItem::VersionMarker(major, minor))
    }

    fn read_annotations(&mut self) -> IonResult<()> {
        let annotations_length = self.read_var_uint()?.value() as usize;
        if annotations_length == 0 {
            return decoding_error("found an annotation wrapper with no annotations");
        }
        let mut bytes_read: usize = 0;
        while bytes_read < annotations_length {
            let var_uint = self.read_var_uint()?;
            bytes_read += var_uint.size_in_bytes();
            let annotation_symbol_id = usize::try_from(var_uint.value())
                .map_err(|_| decoding_error_raw("found an annotation that overflows a usize"))?;
            self.cursor.value.annotations.push(annotation_symbol_id);
        }
        if bytes_read != annotations_length {
            return decoding_error(
                "an annotation sequence's length disagrees with its contents",
            );
        }
        Ok(())
    }

    fn process_header_by_type_code(&mut self, header: Header) -> IonResult<()> {
        use IonTypeCode::*;
        let length = match header.ion_type_code {
            Reserved => {
                return decoding_error("found a value with the reserved type code 15");
            }
            AnnotationOrIvm => {
                return decoding_error("found an annotation wrapper where a value was required");
            }
            // Only null.null reaches this point; NOP padding was handled by the caller.
            NullOrNop => 0,
            Boolean => match header.length_code {
                0 | 1 | length_codes::NULL => 0,
                code => {
                    return decoding_error(format!(
                        "found a boolean with an illegal length code: {code}"
                    ));
                }
            },
            NegativeInteger if header.length_code == 0 => {
                // A zero-magnitude integer is always encoded with the positive-int type code;
                // "negative zero" is not a value the int encoding can express.
                return decoding_error(
                    "found a negative integer (type code 3) with a zero-length magnitude",
                );
            }
            PositiveInteger | NegativeInteger | Decimal | Timestamp | String | Symbol | List
            | SExpression | Clob | Blob => self.read_standard_length(header.length_code)?,
            Float => match header.length_code {
                0 | length_codes::NULL => 0,
                4 => 4,
                8 => 8,
                code => {
                    return decoding_error(format!(
                        "found a float with an illegal length code: {code}"
                    ));
                }
            },
            Struct => match header.length_code {
                length_codes::NULL => 0,
                // L = 1 indicates a struct with sorted field names; its length is always
                // encoded as a VarUInt.
                1 | length_codes::VAR_UINT => self.read_var_uint()?.value() as usize,
                magnitude => magnitude as usize,
            },
        };

        self.cursor.value.ion_type = header
            .ion_type
            .expect("every type code that survives the match above maps to an IonType");
        self.cursor.value.header = header;
        self.cursor.value.is_null = header.length_code == length_codes::NULL;
        self.cursor.value.length_in_bytes = length;
        self.cursor.value.last_byte = self.cursor.bytes_read + length;
        Ok(())
    }

    fn read_standard_length(&mut self, length_code: u8) -> IonResult<usize> {
        let length = match length_code {
            length_codes::NULL => 0,
            length_codes::VAR_UINT => self.read_var_uint()?.value() as usize,
            magnitude => magnitude as usize,
        };
        Ok(length)
    }

    fn check_parent_bound(&self, end_of_item: usize) -> IonResult<()> {
        if let Some(parent) = self.cursor.parents.last() {
            if end_of_item > parent.last_byte {
                return decoding_error(
                    "a value's length runs past the end of its enclosing container",
                );
            }
        }
        Ok(())
    }
}
