use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset};

use crate::result::IonResult;
use crate::types::{Decimal, Int, IonType, SymbolId};

/// The system-level stream components that a [`Cursor`] surfaces.
///
/// This is the *system* view of a stream: version markers and symbol-table structs are visible
/// alongside ordinary values. The user-level [`Reader`](crate::reader::Reader) consumes these
/// items and hides the ones that only exist to manage the symbol table.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum StreamItem {
    /// An Ion Version Marker (IVM) indicating the major and minor version that were used to
    /// encode the values that follow.
    VersionMarker(u8, u8),
    /// A value and its corresponding Ion type. Values that represent system constructs (e.g. a
    /// struct annotated with `$ion_symbol_table`) are still values at this level. The `bool`
    /// is true if the value is a null.
    Value(IonType, bool),
}

/// The format-agnostic, system-level cursor protocol needed to navigate within an Ion stream
/// and read the values encountered into native Rust data types.
///
/// Cursor implementations are not expected to interpret symbol table declarations, resolve
/// symbol IDs into text, or otherwise interpret system-level constructs for use at a user
/// level; that is the work of the [`Reader`](crate::reader::Reader) that drives them.
/// This trait is also the contract an alternative value source (for example, a text parser
/// maintained outside this crate) must implement to drive the reader.
///
/// Reading a scalar's payload is idempotent: calling the same `read_*` method on the same
/// value repeatedly returns the same result. The cursor does not cache a container's
/// children; re-entering a container re-reads from the underlying source.
pub trait Cursor {
    /// Returns the (major, minor) version of the stream being read. If no version marker has
    /// been read yet, the version (1, 0) is returned.
    fn ion_version(&self) -> (u8, u8);

    /// Attempts to advance the cursor to the next item in the stream at the current depth,
    /// returning `None` when the end of the stream (or of the current container) is reached.
    fn next(&mut self) -> IonResult<Option<StreamItem>>;

    /// Returns the Ion type of the value currently under the cursor, if any.
    fn ion_type(&self) -> Option<IonType>;

    /// Returns true if the value currently under the cursor is a null of any type.
    fn is_null(&self) -> bool;

    /// Returns the annotation symbol IDs of the current value. Empty if there is no current
    /// value or it is not annotated.
    fn annotation_ids(&self) -> &[SymbolId];

    /// If the current value is a field of a struct, returns the symbol ID of its field name.
    fn field_id(&self) -> Option<SymbolId>;

    /// If the current value is a null, returns its Ion type; otherwise `None`.
    fn read_null(&mut self) -> IonResult<Option<IonType>>;

    /// If the current value is a non-null boolean, returns its value; otherwise `None`.
    fn read_bool(&mut self) -> IonResult<Option<bool>>;

    /// If the current value is a non-null integer that fits in an `i64`, returns its value.
    /// Returns an error if the value is an integer too large for an `i64`; see
    /// [`Cursor::read_int`].
    fn read_i64(&mut self) -> IonResult<Option<i64>>;

    /// If the current value is a non-null integer, returns its value at full precision.
    fn read_int(&mut self) -> IonResult<Option<Int>>;

    /// If the current value is a non-null float, returns its value as an `f32`, losing
    /// precision if the encoding was 64 bits wide.
    fn read_f32(&mut self) -> IonResult<Option<f32>>;

    /// If the current value is a non-null float, returns its value as an `f64`.
    fn read_f64(&mut self) -> IonResult<Option<f64>>;

    /// If the current value is a non-null decimal, returns its value with its scale and any
    /// negative-zero coefficient preserved.
    fn read_decimal(&mut self) -> IonResult<Option<Decimal>>;

    /// If the current value is a non-null decimal, returns it as a [`BigDecimal`]. Returns an
    /// error for negative-zero decimals, which `BigDecimal` cannot represent.
    fn read_big_decimal(&mut self) -> IonResult<Option<BigDecimal>> {
        match self.read_decimal()? {
            Some(decimal) => (&decimal).try_into().map(Some),
            None => Ok(None),
        }
    }

    /// If the current value is a non-null string, returns its text.
    fn read_string(&mut self) -> IonResult<Option<String>>;

    /// If the current value is a non-null symbol, returns its symbol ID. Resolving the ID to
    /// text is the symbol table's job, not the cursor's.
    fn read_symbol_id(&mut self) -> IonResult<Option<SymbolId>>;

    /// If the current value is a non-null blob, returns its bytes.
    fn read_blob_bytes(&mut self) -> IonResult<Option<Vec<u8>>>;

    /// If the current value is a non-null clob, returns its bytes.
    fn read_clob_bytes(&mut self) -> IonResult<Option<Vec<u8>>>;

    /// If the current value is a non-null timestamp, returns it as a `DateTime<FixedOffset>`.
    fn read_datetime(&mut self) -> IonResult<Option<DateTime<FixedOffset>>>;

    /// If the current value is a container, positions the cursor before that container's first
    /// child value. Otherwise, returns an error.
    fn step_in(&mut self) -> IonResult<()>;

    /// Positions the cursor after the end of the container currently being traversed,
    /// discarding any of its values that were not read. Returns an error at the top level.
    fn step_out(&mut self) -> IonResult<()>;

    /// Returns the number of containers the cursor has stepped into without stepping out.
    fn depth(&self) -> usize;
}
