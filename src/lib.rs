//! A binary [Ion 1.0](https://amazon-ion.github.io/ion-docs/) serialization core.
//!
//! This crate implements the symbol table resolution and binary encoding/decoding engine of
//! the Ion format:
//!
//! * the layered symbol table system — the fixed *system* table, immutable named+versioned
//!   *shared* tables, growable per-stream *local* tables, and the *substitute* tables
//!   synthesized when an import cannot be matched against the [`Catalog`];
//! * the binary value codec — type descriptors, `VarUInt`/`VarInt` fields, and the per-type
//!   payload encodings;
//! * a streaming cursor protocol — [`BinaryIonCursor`] (the system view, where version
//!   markers and symbol table structs are visible) and [`Reader`] (the user view, where they
//!   are consumed transparently and symbol IDs resolve to text);
//! * a streaming writer — [`RawBinaryWriter`](binary::RawBinaryWriter) at the symbol ID level
//!   and [`BinaryWriter`] above it, which interns symbols and assembles each datagram's
//!   version-marker/symbol-table prologue as it flushes.
//!
//! Reading and writing text Ion, and the mutable document object model, are out of scope;
//! the [`Cursor`] and [`IonWriter`] traits are the seams where such components plug in.
//!
//! ```
//! use ion_binary::{BinaryIonCursor, BinaryWriterBuilder, IonWriter, Reader};
//!
//! # fn main() -> ion_binary::IonResult<()> {
//! let mut writer = BinaryWriterBuilder::new().build(Vec::new())?;
//! writer.step_in(ion_binary::IonType::Struct)?;
//! writer.set_field_name("species")?;
//! writer.write_string("spider")?;
//! writer.set_field_name("legs")?;
//! writer.write_i64(8)?;
//! writer.step_out()?;
//! writer.flush()?;
//!
//! let encoded = writer.output().clone();
//! let mut reader = Reader::new(BinaryIonCursor::new(std::io::Cursor::new(encoded)));
//! reader.next()?;
//! reader.step_in()?;
//! reader.next()?;
//! assert_eq!(reader.field_name().unwrap(), "species");
//! assert_eq!(reader.read_string()?.unwrap(), "spider");
//! # Ok(())
//! # }
//! ```

pub mod binary;
pub mod binary_writer;
pub mod catalog;
mod constants;
pub mod cursor;
pub mod data_source;
pub mod imports;
pub mod raw_symbol_token;
pub mod reader;
pub mod result;
pub mod shared_symbol_table;
mod symbol;
mod symbol_table;
pub mod types;
pub mod writer;

pub use binary::cursor::BinaryIonCursor;
pub use binary::is_binary_ion;
pub use binary_writer::{BinaryWriter, BinaryWriterBuilder};
pub use catalog::{Catalog, EmptyCatalog, MapCatalog};
pub use cursor::{Cursor, StreamItem};
pub use data_source::IonDataSource;
pub use imports::{resolve_import, ImportDescriptor, ResolvedImport};
pub use raw_symbol_token::{AsRawSymbolTokenRef, RawSymbolToken, RawSymbolTokenRef};
pub use reader::Reader;
pub use result::{IonError, IonResult};
pub use shared_symbol_table::SharedSymbolTable;
pub use symbol::Symbol;
pub use symbol_table::SymbolTable;
pub use types::{Coefficient, Decimal, Int, IonType, Sign, SymbolId, UInt};
pub use writer::IonWriter;
