use std::io::Write;
use std::mem;
use std::ops::Range;

use chrono::{DateTime, FixedOffset};
use num_bigint::Sign as BigSign;
use num_traits::Zero;

use crate::binary::constants::v1_0::IVM;
use crate::binary::decimal::DecimalBinaryEncoder;
use crate::binary::timestamp::TimestampBinaryEncoder;
use crate::binary::type_code::IonTypeCode;
use crate::binary::uint;
use crate::binary::var_uint::VarUInt;
use crate::result::{encoding_error, illegal_operation, illegal_operation_raw, IonResult};
use crate::types::{ContainerType, Decimal, Int, IonType, SymbolId};

// The largest 'L' (length) value that can be written directly in a type descriptor byte.
// Larger length values are written as a VarUInt following the type descriptor.
pub(crate) const MAX_INLINE_LENGTH: usize = 13;

// The number of IoRanges reserved ahead of an annotated container's header range: one each for
// the wrapper header, the annotation sequence's length, and the annotation sequence itself.
const IO_RANGES_PER_ANNOTATION_WRAPPER: usize = 3;

// Initial capacities for the writer's reusable Vecs; they are resized as necessary.
const INITIAL_ENCODING_BUFFER_CAPACITY: usize = 8 * 1024;
const INITIAL_ENCODING_LEVELS_CAPACITY: usize = 16;
const INITIAL_IO_RANGE_CAPACITY: usize = 128;
const INITIAL_ANNOTATIONS_CAPACITY: usize = 4;

// Ion's length prefixing requires that elements in a stream be encoded out of order. For
// example, to write the annotated list $ion::["foo", "bar"], the writer must:
//   1. Encode "foo", then "bar"
//   2. Use their combined length to encode the list's header
//   3. Encode the annotation sequence '$ion' and its length
//   4. Use the combined length of the sequence and the list to encode the wrapper's header
//
// The writer encodes these out-of-order byte sequences in a temporary buffer and keeps a queue
// of `Range<usize>` entries ("IoRanges") recording the order in which slices of that buffer
// must be written to the sink when `flush()` is called.
type IoRange = Range<usize>;

// Stores information about a container the writer has stepped into: its kind, the field ID and
// annotations that will precede it, and the index of the IoRange reserved for its header.
#[derive(Debug)]
struct EncodingLevel {
    container_type: ContainerType,
    field_id: Option<SymbolId>,
    // Annotations for all levels are stored in one Vec on the writer, treated as a stack;
    // each level only records how many of its entries it owns.
    num_annotations: u8,
    td_io_range_index: usize,
}

impl EncodingLevel {
    fn new(
        container_type: ContainerType,
        field_id: Option<SymbolId>,
        num_annotations: u8,
        td_io_range_index: usize,
    ) -> EncodingLevel {
        EncodingLevel {
            container_type,
            field_id,
            num_annotations,
            td_io_range_index,
        }
    }

    // Sums the lengths of all IoRanges created since this level was opened. The total is the
    // container's encoded length, which its header's length field must carry.
    fn calculate_final_size(&self, io_ranges: &mut [IoRange]) -> usize {
        io_ranges[self.td_io_range_index..]
            .iter()
            .map(|range| range.len())
            .sum()
    }
}

/// A system-level streaming binary Ion writer. This writer provides no symbol table
/// management; symbol-related operations (field IDs, annotations, symbol values) require the
/// caller to provide valid symbol IDs. See
/// [`BinaryWriter`](crate::binary_writer::BinaryWriter) for the user-level writer that interns
/// text on the caller's behalf.
///
/// Every value is fully framed in the writer's internal buffer before `flush()` copies it to
/// the output sink, so the sink never holds a torn varint or an unresolved length prefix.
pub struct RawBinaryWriter<W: Write> {
    // A byte buffer to encode individual components of the stream.
    buffer: Vec<u8>,
    // Slices of the buffer to write out in order when flush() is called.
    io_ranges: Vec<IoRange>,
    // Stack tracking step_in()/step_out().
    levels: Vec<EncodingLevel>,
    out: W,
    // The field ID of the next value. Only set while the writer is inside a struct.
    field_id: Option<SymbolId>,
    // A shared Vec holding the annotations of every level, treated as a stack.
    annotations_all_levels: Vec<SymbolId>,
    // The number of annotations at the tail of `annotations_all_levels` that belong to the
    // next value.
    num_annotations_current_value: u8,
    // Scratch space used by flush() to assemble the buffer's ranges into their final order.
    contiguous_encoding: Vec<u8>,
}

impl<W: Write> RawBinaryWriter<W> {
    /// Creates a new RawBinaryWriter that writes its encoded output to `out`.
    pub fn new(out: W) -> RawBinaryWriter<W> {
        let mut levels = Vec::with_capacity(INITIAL_ENCODING_LEVELS_CAPACITY);
        levels.push(EncodingLevel::new(ContainerType::TopLevel, None, 0, 0));
        let mut io_ranges = Vec::with_capacity(INITIAL_IO_RANGE_CAPACITY);
        // An empty IoRange for the top level's leading scalar values.
        io_ranges.push(0usize..0);
        RawBinaryWriter {
            buffer: Vec::with_capacity(INITIAL_ENCODING_BUFFER_CAPACITY),
            io_ranges,
            levels,
            out,
            field_id: None,
            annotations_all_levels: Vec::with_capacity(INITIAL_ANNOTATIONS_CAPACITY),
            num_annotations_current_value: 0,
            contiguous_encoding: Vec::with_capacity(INITIAL_ENCODING_BUFFER_CAPACITY),
        }
    }

    // Uses the provided closure to encode data to the buffer. Returns the range of the buffer
    // now occupied by the encoded bytes.
    #[inline]
    fn encode_to_buffer(
        &mut self,
        mut encode_fn: impl FnMut(&mut Self) -> IonResult<()>,
    ) -> IonResult<IoRange> {
        let start = self.buffer.len();
        encode_fn(self)?;
        let end = self.buffer.len();
        Ok(start..end)
    }

    #[inline]
    fn is_in_struct(&self) -> bool {
        self.levels
            .last()
            .map(|level| level.container_type == ContainerType::Struct)
            .unwrap_or(false)
    }

    // Modifies the last IoRange to include the next `number_of_bytes`. Scalars can always
    // extend the most recent range instead of adding a new one.
    #[inline]
    fn extend_last_range(&mut self, number_of_bytes: usize) {
        let last_range = self
            .io_ranges
            .last_mut()
            .expect("io_ranges is never empty");
        last_range.end += number_of_bytes;
    }

    // Creates an empty IoRange starting from the next unoccupied byte in the buffer.
    fn push_empty_io_range(&mut self) {
        let next_byte_index = self.buffer.len();
        self.io_ranges.push(next_byte_index..next_byte_index);
    }

    // Handles the before-and-after tasks common to writing all non-container values: encoding
    // the field ID and, if needed, the annotations wrapper.
    fn write_scalar(
        &mut self,
        mut write_fn: impl FnMut(&mut Vec<u8>) -> IonResult<()>,
    ) -> IonResult<()> {
        if self.is_in_struct() {
            let field_id = self.expect_field_id()? as u64;
            let bytes_written = VarUInt::write_u64(&mut self.buffer, field_id)?;
            self.extend_last_range(bytes_written);
            self.field_id = None;
        }

        if self.has_annotations() {
            return self.encode_annotated_scalar(write_fn);
        }

        let encoded_range = self.encode_to_buffer(|writer| write_fn(&mut writer.buffer))?;
        self.extend_last_range(encoded_range.len());
        Ok(())
    }

    // Encodes a scalar value to the buffer, then encodes the annotation wrapper that must
    // precede it in the output.
    fn encode_annotated_scalar(
        &mut self,
        mut scalar_write_fn: impl FnMut(&mut Vec<u8>) -> IonResult<()>,
    ) -> IonResult<()> {
        let value_io_range = self.encode_to_buffer(|writer| scalar_write_fn(&mut writer.buffer))?;

        let (header_io_range, seq_length_io_range, seq_io_range) =
            self.encode_annotation_wrapper(value_io_range.len())?;

        // Push the IoRanges in the order the encoded bytes must appear in the output.
        self.io_ranges.extend_from_slice(&[
            header_io_range,
            seq_length_io_range,
            seq_io_range,
            value_io_range,
        ]);

        self.push_empty_io_range();
        Ok(())
    }

    // Encodes the annotations wrapper for a value whose encoded body is
    // `wrapped_value_length` bytes long. Returns the IoRanges holding the wrapper's header,
    // the annotation sequence's length, and the annotation sequence, in output order.
    fn encode_annotation_wrapper(
        &mut self,
        wrapped_value_length: usize,
    ) -> IonResult<(IoRange, IoRange, IoRange)> {
        // Encode the sequence of annotation symbol IDs.
        let seq_io_range = self.encode_to_buffer(|writer| {
            let annotations_range = writer.current_value_annotations_range();
            for index in annotations_range {
                let annotation_id = writer.annotations_all_levels[index] as u64;
                VarUInt::write_u64(&mut writer.buffer, annotation_id)?;
            }
            Ok(())
        })?;
        let seq_length = seq_io_range.len();

        // Encode the length of the annotations sequence as a VarUInt.
        let seq_length_io_range = self.encode_to_buffer(|writer| {
            VarUInt::write_u64(&mut writer.buffer, seq_length as u64)?;
            Ok(())
        })?;

        // The wrapper's own length field counts the annotation sequence, the VarUInt holding
        // its length, and the wrapped value.
        let wrapper_length = seq_io_range.len() + seq_length_io_range.len() + wrapped_value_length;

        let header_io_range = self.encode_to_buffer(|writer| {
            if wrapper_length <= MAX_INLINE_LENGTH {
                writer.buffer.push(0xE0 | wrapper_length as u8);
            } else {
                writer.buffer.push(0xEE);
                VarUInt::write_u64(&mut writer.buffer, wrapper_length as u64)?;
            }
            Ok(())
        })?;

        self.clear_annotations();
        Ok((header_io_range, seq_length_io_range, seq_io_range))
    }

    // Returns the range of entries in `annotations_all_levels` that belong to the next value.
    #[inline]
    fn current_value_annotations_range(&self) -> Range<usize> {
        let end = self.annotations_all_levels.len();
        let start = end - self.num_annotations_current_value as usize;
        start..end
    }

    /// Discards any annotations that have been set for the next value.
    pub fn clear_annotations(&mut self) {
        if self.num_annotations_current_value > 0 {
            let new_length =
                self.annotations_all_levels.len() - self.num_annotations_current_value as usize;
            self.annotations_all_levels.truncate(new_length);
            self.num_annotations_current_value = 0;
        }
    }

    #[inline]
    pub fn has_annotations(&self) -> bool {
        self.num_annotations_current_value > 0
    }

    /// Adds `symbol_id` to the annotations that will precede the next value written.
    pub fn add_annotation(&mut self, symbol_id: SymbolId) {
        self.annotations_all_levels.push(symbol_id);
        self.num_annotations_current_value += 1;
    }

    /// Sets the field ID to precede the next value written. Only meaningful inside a struct.
    pub fn set_field_id(&mut self, field_id: SymbolId) {
        self.field_id = Some(field_id);
    }

    // Called when the writer is in a struct and a missing field ID is an error.
    fn expect_field_id(&self) -> IonResult<SymbolId> {
        match self.field_id {
            Some(field_id) => Ok(field_id),
            None => illegal_operation("a field ID must be set before each value in a struct"),
        }
    }

    /// Writes an Ion version marker directly to the output sink. Only legal at the top level.
    pub fn write_ion_version_marker(&mut self, major: u8, minor: u8) -> IonResult<()> {
        if self.depth() > 0 {
            return illegal_operation("can only write an IVM at the top level");
        }
        if (major, minor) != (1, 0) {
            return illegal_operation("only Ion 1.0 is supported");
        }
        Ok(self.out.write_all(&IVM)?)
    }

    pub fn ion_version(&self) -> (u8, u8) {
        (1, 0)
    }

    /// Writes an Ion null of the specified type.
    pub fn write_null(&mut self, ion_type: IonType) -> IonResult<()> {
        self.write_scalar(|enc_buffer| {
            let byte: u8 = match ion_type {
                IonType::Null => 0x0F,
                IonType::Bool => 0x1F,
                IonType::Int => 0x2F,
                IonType::Float => 0x4F,
                IonType::Decimal => 0x5F,
                IonType::Timestamp => 0x6F,
                IonType::Symbol => 0x7F,
                IonType::String => 0x8F,
                IonType::Clob => 0x9F,
                IonType::Blob => 0xAF,
                IonType::List => 0xBF,
                IonType::SExp => 0xCF,
                IonType::Struct => 0xDF,
            };
            enc_buffer.push(byte);
            Ok(())
        })
    }

    /// Writes an Ion boolean with the specified value.
    pub fn write_bool(&mut self, value: bool) -> IonResult<()> {
        self.write_scalar(|enc_buffer| {
            let byte: u8 = if value { 0x11 } else { 0x10 };
            enc_buffer.push(byte);
            Ok(())
        })
    }

    /// Writes an Ion integer with the specified value.
    pub fn write_i64(&mut self, value: i64) -> IonResult<()> {
        self.write_scalar(|enc_buffer| {
            // Widening the magnitude to a u64 makes i64::MIN encodable without special casing.
            let magnitude: u64 = value.unsigned_abs();
            let encoded = uint::encode_u64(magnitude);
            let bytes_to_write = encoded.as_bytes();

            // The magnitude of an i64 is at most 8 bytes, so the length always fits in the
            // type descriptor's length nibble.
            let length_nibble = bytes_to_write.len() as u8;
            let type_descriptor: u8 = if value >= 0 {
                0x20 | length_nibble
            } else {
                0x30 | length_nibble
            };
            enc_buffer.push(type_descriptor);
            enc_buffer.extend_from_slice(bytes_to_write);
            Ok(())
        })
    }

    /// Writes an Ion integer of arbitrary size.
    pub fn write_int(&mut self, value: &Int) -> IonResult<()> {
        let value = match value {
            Int::I64(i) => return self.write_i64(*i),
            Int::BigInt(i) => i,
        };

        self.write_scalar(|enc_buffer| {
            if value.is_zero() {
                enc_buffer.push(0x20);
                return Ok(());
            }

            let (sign, magnitude_be_bytes) = value.to_bytes_be();
            let mut type_descriptor: u8 = match sign {
                BigSign::Plus | BigSign::NoSign => 0x20,
                BigSign::Minus => 0x30,
            };

            let encoded_length = magnitude_be_bytes.len();
            if encoded_length <= MAX_INLINE_LENGTH {
                type_descriptor |= encoded_length as u8;
                enc_buffer.push(type_descriptor);
            } else {
                type_descriptor |= 0x0E;
                enc_buffer.push(type_descriptor);
                VarUInt::write_u64(enc_buffer, encoded_length as u64)?;
            }
            enc_buffer.extend_from_slice(magnitude_be_bytes.as_slice());
            Ok(())
        })
    }

    /// Writes an Ion float with the specified value.
    pub fn write_f32(&mut self, value: f32) -> IonResult<()> {
        self.write_scalar(|enc_buffer| {
            if value == 0f32 && !value.is_sign_negative() {
                enc_buffer.push(0x40);
                return Ok(());
            }
            enc_buffer.push(0x44);
            enc_buffer.extend_from_slice(&value.to_be_bytes());
            Ok(())
        })
    }

    /// Writes an Ion float with the specified value.
    pub fn write_f64(&mut self, value: f64) -> IonResult<()> {
        self.write_scalar(|enc_buffer| {
            if value == 0f64 && !value.is_sign_negative() {
                enc_buffer.push(0x40);
                return Ok(());
            }
            enc_buffer.push(0x48);
            enc_buffer.extend_from_slice(&value.to_be_bytes());
            Ok(())
        })
    }

    /// Writes an Ion decimal with the specified value.
    pub fn write_decimal(&mut self, value: &Decimal) -> IonResult<()> {
        self.write_scalar(|enc_buffer| {
            enc_buffer.encode_decimal_value(value)?;
            Ok(())
        })
    }

    /// Writes an Ion timestamp with the specified value.
    pub fn write_timestamp(&mut self, value: &DateTime<FixedOffset>) -> IonResult<()> {
        self.write_scalar(|enc_buffer| {
            enc_buffer.encode_timestamp_value(value)?;
            Ok(())
        })
    }

    /// Writes an Ion symbol with the specified symbol ID. The raw writer has no symbol table
    /// and cannot validate the ID.
    pub fn write_symbol_id(&mut self, symbol_id: SymbolId) -> IonResult<()> {
        self.write_scalar(|enc_buffer| {
            let encoded = uint::encode_u64(symbol_id as u64);
            let bytes_to_write = encoded.as_bytes();
            enc_buffer.push(0x70 | bytes_to_write.len() as u8);
            enc_buffer.extend_from_slice(bytes_to_write);
            Ok(())
        })
    }

    /// Writes an Ion string with the specified text.
    pub fn write_string<A: AsRef<str>>(&mut self, value: A) -> IonResult<()> {
        self.write_scalar(|enc_buffer| {
            let text: &str = value.as_ref();
            let encoded_length = text.len(); // The number of utf8 bytes

            if encoded_length <= MAX_INLINE_LENGTH {
                enc_buffer.push(0x80 | encoded_length as u8);
            } else {
                enc_buffer.push(0x8E);
                VarUInt::write_u64(enc_buffer, encoded_length as u64)?;
            }
            enc_buffer.extend_from_slice(text.as_bytes());
            Ok(())
        })
    }

    /// Writes an Ion clob with the specified bytes.
    pub fn write_clob<A: AsRef<[u8]>>(&mut self, value: A) -> IonResult<()> {
        self.write_scalar(|enc_buffer| {
            // The clob type descriptor's high nibble is type code 9
            Self::encode_lob(enc_buffer, value.as_ref(), 0x90)
        })
    }

    /// Writes an Ion blob with the specified bytes.
    pub fn write_blob<A: AsRef<[u8]>>(&mut self, value: A) -> IonResult<()> {
        self.write_scalar(|enc_buffer| {
            // The blob type descriptor's high nibble is type code 10
            Self::encode_lob(enc_buffer, value.as_ref(), 0xA0)
        })
    }

    fn encode_lob(enc_buffer: &mut Vec<u8>, value: &[u8], type_code: u8) -> IonResult<()> {
        let encoded_length = value.len();
        if encoded_length <= MAX_INLINE_LENGTH {
            enc_buffer.push(type_code | encoded_length as u8);
        } else {
            enc_buffer.push(type_code | 0x0E);
            VarUInt::write_u64(enc_buffer, encoded_length as u64)?;
        }
        enc_buffer.extend_from_slice(value);
        Ok(())
    }

    /// Forwards an already-encoded scalar payload, framing it with a fresh type descriptor.
    /// The caller is responsible for ensuring that any symbol IDs embedded in the payload are
    /// meaningful to the destination stream; see
    /// [`BinaryWriter::write_raw_scalar`](crate::binary_writer::BinaryWriter::write_raw_scalar).
    pub fn write_raw_scalar_payload(
        &mut self,
        type_code: IonTypeCode,
        payload: &[u8],
    ) -> IonResult<()> {
        use IonTypeCode::*;
        match type_code {
            // A boolean's value lives in its length nibble rather than its payload, so it
            // cannot be reconstructed from payload bytes alone.
            NullOrNop | Boolean | List | SExpression | Struct | AnnotationOrIvm | Reserved => {
                return encoding_error(format!(
                    "cannot forward raw bytes for type code {type_code:?}; only non-null, \
                     non-boolean scalars are supported"
                ));
            }
            NegativeInteger if payload.is_empty() => {
                return encoding_error("a negative integer must have a non-empty magnitude");
            }
            _ => {}
        }
        self.write_scalar(|enc_buffer| {
            let high_nibble = type_code.to_u8() << 4;
            if payload.len() <= MAX_INLINE_LENGTH {
                enc_buffer.push(high_nibble | payload.len() as u8);
            } else {
                enc_buffer.push(high_nibble | 0x0E);
                VarUInt::write_u64(enc_buffer, payload.len() as u64)?;
            }
            enc_buffer.extend_from_slice(payload);
            Ok(())
        })
    }

    /// Starts a container of the specified type. If `ion_type` is not a List, SExp, or
    /// Struct, returns an error.
    pub fn step_in(&mut self, ion_type: IonType) -> IonResult<()> {
        use IonType::*;
        let container_type = match ion_type {
            List => ContainerType::List,
            SExp => ContainerType::SExpression,
            Struct => ContainerType::Struct,
            _ => return illegal_operation("cannot step into a scalar Ion type"),
        };

        // If this container is a field of a struct, encode the field ID first.
        if self.is_in_struct() {
            let field_id_io_range = self.encode_to_buffer(|writer| {
                let field_id = writer.expect_field_id()? as u64;
                VarUInt::write_u64(&mut writer.buffer, field_id)?;
                Ok(())
            })?;
            self.extend_last_range(field_id_io_range.len());
            self.field_id = None;
        }

        // If the container is annotated, reserve IoRanges to hold the annotation wrapper
        // components that will be encoded when its length is known.
        if self.num_annotations_current_value > 0 {
            for _ in 0..IO_RANGES_PER_ANNOTATION_WRAPPER {
                self.push_empty_io_range();
            }
        }

        // An empty placeholder range to be filled in during step_out() with the container's
        // type descriptor and length.
        let header_io_range_index = self.io_ranges.len();
        self.push_empty_io_range();

        self.levels.push(EncodingLevel::new(
            container_type,
            self.field_id,
            self.num_annotations_current_value,
            header_io_range_index,
        ));
        self.num_annotations_current_value = 0;
        self.field_id = None;

        // Scalars within the new container can append to this range.
        self.push_empty_io_range();
        Ok(())
    }

    /// If the writer is positioned at the top level, returns `None`. Otherwise, returns the
    /// parent container's [`IonType`].
    pub fn parent_type(&self) -> Option<IonType> {
        // `self.levels` always holds at least the top level.
        match self.levels.last().unwrap().container_type {
            ContainerType::TopLevel => None,
            ContainerType::Struct => Some(IonType::Struct),
            ContainerType::List => Some(IonType::List),
            ContainerType::SExpression => Some(IonType::SExp),
        }
    }

    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    /// Ends the current container. If the writer is at the top level, returns an error.
    pub fn step_out(&mut self) -> IonResult<()> {
        if self.levels.len() <= 1 {
            return illegal_operation(
                "cannot step out unless the writer is positioned within a container",
            );
        }
        self.clear_annotations();
        let container = self.levels.pop().unwrap();
        self.num_annotations_current_value = container.num_annotations;
        self.field_id = container.field_id;
        let container_size = container.calculate_final_size(&mut self.io_ranges);

        let mut type_descriptor: u8 = match container.container_type {
            ContainerType::List => 0xB0,
            ContainerType::SExpression => 0xC0,
            ContainerType::Struct => 0xD0,
            ContainerType::TopLevel => {
                return Err(illegal_operation_raw("cannot step out of the top level"))
            }
        };

        // Encode the container's type descriptor byte and optional length.
        let header_io_range = self.encode_to_buffer(|writer| {
            if container_size <= MAX_INLINE_LENGTH {
                type_descriptor |= container_size as u8;
                writer.buffer.push(type_descriptor);
            } else {
                type_descriptor |= 0x0E; // VarUInt length
                writer.buffer.push(type_descriptor);
                VarUInt::write_u64(&mut writer.buffer, container_size as u64)?;
            }
            Ok(())
        })?;

        // The container's total size now includes its header.
        let container_size = container_size + header_io_range.len();

        // Point the reserved header range at the bytes we just encoded.
        let td_io_range = self
            .io_ranges
            .get_mut(container.td_io_range_index)
            .expect("a header IoRange was reserved at step_in()");
        let _ = mem::replace(td_io_range, header_io_range);

        // If the container was annotated, fill in the IoRanges that were reserved for the
        // components of its annotations wrapper.
        if container.num_annotations > 0 {
            let (header, seq_length, seq) = self.encode_annotation_wrapper(container_size)?;
            let wrapper_start = container.td_io_range_index - IO_RANGES_PER_ANNOTATION_WRAPPER;
            self.io_ranges[wrapper_start] = header;
            self.io_ranges[wrapper_start + 1] = seq_length;
            self.io_ranges[wrapper_start + 2] = seq;
        }

        // Any scalar values that follow can append to this range.
        self.push_empty_io_range();
        Ok(())
    }

    /// Writes any buffered data to the sink. This method can only be called when the writer is
    /// at the top level.
    pub fn flush(&mut self) -> IonResult<()> {
        if self.depth() > 0 {
            return illegal_operation(
                "cannot flush while the writer is positioned within a container",
            );
        }

        // Copy the buffer's slices into a contiguous buffer in IoRange order, then hand the
        // result to the sink in a single write.
        for io_range in self.io_ranges.drain(..) {
            self.contiguous_encoding
                .extend_from_slice(&self.buffer[io_range]);
        }
        self.out.write_all(self.contiguous_encoding.as_slice())?;

        self.contiguous_encoding.clear();
        self.buffer.clear();
        self.push_empty_io_range();
        Ok(())
    }

    /// Returns a reference to the underlying output sink.
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Returns a mutable reference to the underlying output sink. Modifying it directly can
    /// corrupt the stream; this is intended for callers assembling a stream prologue.
    pub fn output_mut(&mut self) -> &mut W {
        &mut self.out
    }
}
