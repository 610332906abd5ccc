use chrono::{DateTime, FixedOffset};

use crate::raw_symbol_token::AsRawSymbolTokenRef;
use crate::result::IonResult;
use crate::types::{Decimal, Int, IonType};

/// The format-agnostic encoding functionality needed to write native Rust types to a stream as
/// Ion values. This is the value-consumer contract: any component that produces a sequence of
/// value events (a DOM tree walker, a stream transcoder) drives one of these.
pub trait IonWriter {
    /// The type to which the implementor writes its data. This may be a file, a buffer, etc.
    type Output;

    /// Returns the (major, minor) version of the Ion stream being written.
    fn ion_version(&self) -> (u8, u8);

    /// Returns `true` if this writer can accept field names, annotations, and symbol values
    /// as text, interning them into a symbol table as needed. Writers that return `false`
    /// (such as the raw, SID-level writer) only accept symbol IDs.
    fn supports_text_symbol_tokens(&self) -> bool;

    /// Sets a list of annotations to apply to the next value that is written. The annotations
    /// are written in the order provided, with no deduplication.
    fn set_annotations<I, A>(&mut self, annotations: I) -> IonResult<()>
    where
        A: AsRawSymbolTokenRef,
        I: IntoIterator<Item = A>;

    /// Writes an Ion `null` of the specified type. To write an untyped null (equivalent to
    /// `null.null`), pass [`IonType::Null`].
    fn write_null(&mut self, ion_type: IonType) -> IonResult<()>;

    /// Writes an Ion `bool` with the specified value.
    fn write_bool(&mut self, value: bool) -> IonResult<()>;

    /// Writes an Ion `int` with the specified value.
    fn write_i64(&mut self, value: i64) -> IonResult<()>;

    /// Writes an Ion `int` of arbitrary size with the specified value.
    fn write_int(&mut self, value: &Int) -> IonResult<()>;

    /// Writes an Ion `float` with the specified value.
    fn write_f32(&mut self, value: f32) -> IonResult<()>;

    /// Writes an Ion `float` with the specified value.
    fn write_f64(&mut self, value: f64) -> IonResult<()>;

    /// Writes an Ion `decimal` with the specified value.
    fn write_decimal(&mut self, value: &Decimal) -> IonResult<()>;

    /// Writes an Ion `timestamp` with the specified value.
    fn write_timestamp(&mut self, value: &DateTime<FixedOffset>) -> IonResult<()>;

    /// Writes an Ion `symbol` with the specified value.
    fn write_symbol<A: AsRawSymbolTokenRef>(&mut self, value: A) -> IonResult<()>;

    /// Writes an Ion `string` with the specified value.
    fn write_string<A: AsRef<str>>(&mut self, value: A) -> IonResult<()>;

    /// Writes an Ion `clob` with the specified value.
    fn write_clob<A: AsRef<[u8]>>(&mut self, value: A) -> IonResult<()>;

    /// Writes an Ion `blob` with the specified value.
    fn write_blob<A: AsRef<[u8]>>(&mut self, value: A) -> IonResult<()>;

    /// Starts a new container of the specified type. The only valid arguments are
    /// [`IonType::List`], [`IonType::SExp`], and [`IonType::Struct`]; any other type returns
    /// an error.
    fn step_in(&mut self, container_type: IonType) -> IonResult<()>;

    /// Sets the field name for the next value written. Must be called before each value
    /// written while the writer is positioned inside a struct.
    fn set_field_name<A: AsRawSymbolTokenRef>(&mut self, name: A) -> IonResult<()>;

    /// If the writer is positioned at the top level, returns `None`. Otherwise, returns the
    /// [`IonType`] of the parent container.
    fn parent_type(&self) -> Option<IonType>;

    /// Returns the number of containers the writer has stepped into without stepping out.
    fn depth(&self) -> usize;

    /// Ends the current container. Returns an error if the writer is at the top level.
    fn step_out(&mut self) -> IonResult<()>;

    /// Causes any buffered data to be written to the underlying sink. This method can only be
    /// called when the writer is at the top level.
    ///
    /// Values are fully framed in memory before this method copies them out, so a flush never
    /// leaves a partially-written length prefix or varint in the sink, and dropping a writer
    /// without flushing leaves the sink exactly as the last flush left it. Calling `flush()`
    /// repeatedly without intervening writes appends nothing.
    fn flush(&mut self) -> IonResult<()>;

    /// Returns a reference to the writer's output, allowing the data written so far to be
    /// inspected without dropping the writer.
    fn output(&self) -> &Self::Output;

    /// Returns a mutable reference to the writer's output. Modifying the underlying sink is an
    /// inherently risky operation and can result in invalid data; it is not recommended for
    /// most use cases.
    fn output_mut(&mut self) -> &mut Self::Output;
}
