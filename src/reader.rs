use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset};
use delegate::delegate;

use crate::catalog::{Catalog, EmptyCatalog};
use crate::constants::v1_0::system_symbol_ids;
use crate::cursor::{Cursor, StreamItem};
use crate::imports::{resolve_import, ImportDescriptor, ResolvedImport};
use crate::result::IonResult;
use crate::symbol::Symbol;
use crate::symbol_table::SymbolTable;
use crate::types::{Decimal, Int, IonType, SymbolId};

/// A streaming Ion reader that resolves symbol IDs into text.
///
/// This is the *user* view of a stream: version markers and `$ion_symbol_table` structs are
/// consumed transparently, updating the active symbol table, and only application values are
/// surfaced. (The wrapped [`Cursor`] is the system view, where those constructs are visible.)
///
/// The reader itself is format-agnostic; all format-specific logic is handled by the wrapped
/// cursor implementation. Symbol table imports are resolved against the [`Catalog`] the reader
/// was built with; tables resolved from the catalog are retained for the life of the stream
/// even if the catalog is subsequently mutated.
pub struct Reader<C: Cursor> {
    cursor: C,
    symbol_table: SymbolTable,
    catalog: Arc<dyn Catalog>,
}

impl<C: Cursor> Reader<C> {
    /// Creates a reader with an empty catalog; every import encountered in the stream will
    /// resolve to a substitute table.
    pub fn new(cursor: C) -> Reader<C> {
        Reader::with_catalog(cursor, Arc::new(EmptyCatalog))
    }

    /// Creates a reader that resolves symbol table imports against the provided catalog.
    pub fn with_catalog(cursor: C, catalog: Arc<dyn Catalog>) -> Reader<C> {
        Reader {
            cursor,
            symbol_table: SymbolTable::new(),
            catalog,
        }
    }

    /// Advances to the next user-level value, processing any system-level constructs
    /// encountered along the way. Returns the value's type and whether it is a null, or
    /// `None` at the end of the stream or of the current container.
    pub fn next(&mut self) -> IonResult<Option<(IonType, bool)>> {
        loop {
            match self.cursor.next()? {
                Some(StreamItem::VersionMarker(_major, _minor)) => {
                    // A version marker resets the symbol table to the system table.
                    self.symbol_table = SymbolTable::new();
                }
                Some(StreamItem::Value(IonType::Struct, false))
                    if self.cursor.depth() == 0
                        && self.cursor.annotation_ids().first()
                            == Some(&system_symbol_ids::ION_SYMBOL_TABLE) =>
                {
                    self.read_symbol_table()?;
                }
                Some(StreamItem::Value(ion_type, is_null)) => {
                    return Ok(Some((ion_type, is_null)))
                }
                None => return Ok(None),
            }
        }
    }

    // Reads a $ion_symbol_table struct, replacing or extending the active symbol table.
    fn read_symbol_table(&mut self) -> IonResult<()> {
        let mut is_append = false;
        let mut import_descriptors: Vec<ImportDescriptor> = vec![];
        let mut declared_symbols: Vec<Option<String>> = vec![];

        self.cursor.step_in()?;
        while let Some(StreamItem::Value(ion_type, is_null)) = self.cursor.next()? {
            match (self.cursor.field_id(), ion_type, is_null) {
                (Some(system_symbol_ids::IMPORTS), IonType::Symbol, false) => {
                    // `imports: $ion_symbol_table` means the new symbols are appended to the
                    // active table instead of replacing it.
                    if self.cursor.read_symbol_id()?
                        == Some(system_symbol_ids::ION_SYMBOL_TABLE)
                    {
                        is_append = true;
                    }
                }
                (Some(system_symbol_ids::IMPORTS), IonType::List, false) => {
                    self.cursor.step_in()?;
                    while let Some(StreamItem::Value(ion_type, is_null)) = self.cursor.next()? {
                        if ion_type == IonType::Struct && !is_null {
                            import_descriptors.push(self.read_import_descriptor()?);
                        }
                        // Entries of any other type carry no import information.
                    }
                    self.cursor.step_out()?;
                }
                (Some(system_symbol_ids::SYMBOLS), IonType::List, false) => {
                    self.cursor.step_in()?;
                    while let Some(StreamItem::Value(ion_type, is_null)) = self.cursor.next()? {
                        if ion_type == IonType::String && !is_null {
                            declared_symbols.push(self.cursor.read_string()?);
                        } else {
                            // Null and non-string entries still occupy a symbol ID; their
                            // text is unknown.
                            declared_symbols.push(None);
                        }
                    }
                    self.cursor.step_out()?;
                }
                // Other fields are open content; they are visible through the system-level
                // cursor but not interpreted here.
                _ => {}
            }
        }
        self.cursor.step_out()?;

        if is_append {
            for maybe_text in declared_symbols {
                self.symbol_table.add_symbol_or_placeholder(maybe_text)?;
            }
            return Ok(());
        }

        let mut resolved_imports: Vec<ResolvedImport> = vec![];
        for descriptor in &import_descriptors {
            // An import of the system table contributes nothing: its symbols are always the
            // prefix of every local table.
            if descriptor.name() == "$ion" {
                continue;
            }
            resolved_imports.push(resolve_import(self.catalog.as_ref(), descriptor)?);
        }
        let mut new_table = SymbolTable::with_imports(resolved_imports);
        for maybe_text in declared_symbols {
            new_table.add_symbol_or_placeholder(maybe_text)?;
        }
        self.symbol_table = new_table;
        Ok(())
    }

    // Reads one {name, version, max_id} struct from an imports list.
    fn read_import_descriptor(&mut self) -> IonResult<ImportDescriptor> {
        let mut name: Option<String> = None;
        let mut version: usize = 1;
        let mut max_id: Option<usize> = None;

        self.cursor.step_in()?;
        while let Some(StreamItem::Value(ion_type, is_null)) = self.cursor.next()? {
            match (self.cursor.field_id(), ion_type, is_null) {
                (Some(system_symbol_ids::NAME), IonType::String, false) => {
                    name = self.cursor.read_string()?;
                }
                (Some(system_symbol_ids::VERSION), IonType::Int, false) => {
                    version = self.cursor.read_i64()?.map(|v| v.max(1)).unwrap_or(1) as usize;
                }
                (Some(system_symbol_ids::MAX_ID), IonType::Int, false) => {
                    // A negative max_id carries no usable information; it is treated the same
                    // as an absent one.
                    max_id = self
                        .cursor
                        .read_i64()?
                        .and_then(|v| usize::try_from(v).ok());
                }
                _ => {}
            }
        }
        self.cursor.step_out()?;

        // An import with no name cannot be resolved; ImportDescriptor keeps the empty string
        // and resolution reports it as unresolvable.
        Ok(ImportDescriptor::new(
            name.unwrap_or_default(),
            version,
            max_id,
        ))
    }

    /// The active symbol table.
    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbol_table
    }

    /// If the current value is a field of a struct, returns its field name as a resolved
    /// [`Symbol`]. The symbol's text is unknown if no reachable table defines it; see
    /// [`Symbol::expect_text`] for callers that require text.
    pub fn field_name(&self) -> Option<Symbol> {
        self.cursor
            .field_id()
            .map(|sid| self.resolve_to_symbol(sid))
    }

    /// Returns the current value's annotations as resolved [`Symbol`]s.
    pub fn annotations(&self) -> Vec<Symbol> {
        self.cursor
            .annotation_ids()
            .iter()
            .map(|sid| self.resolve_to_symbol(*sid))
            .collect()
    }

    /// Returns true if any of the current value's annotations has the provided text.
    pub fn has_annotation(&self, text: &str) -> bool {
        self.cursor
            .annotation_ids()
            .iter()
            .any(|sid| self.symbol_table.text_for(*sid) == Some(text))
    }

    /// The current value's annotations as raw symbol IDs.
    pub fn annotation_ids(&self) -> &[SymbolId] {
        self.cursor.annotation_ids()
    }

    /// If the current value is a field of a struct, returns its field name's raw symbol ID.
    pub fn field_id(&self) -> Option<SymbolId> {
        self.cursor.field_id()
    }

    /// If the current value is a non-null symbol, returns it as a resolved [`Symbol`].
    ///
    /// Decoding always succeeds for in-stream symbol values: a symbol ID with no text in any
    /// reachable table (including an ID beyond the table's max_id) produces a Symbol with
    /// unknown text rather than an error. Callers that demand text can use
    /// [`Symbol::expect_text`].
    pub fn read_symbol(&mut self) -> IonResult<Option<Symbol>> {
        match self.cursor.read_symbol_id()? {
            Some(sid) => Ok(Some(self.resolve_to_symbol(sid))),
            None => Ok(None),
        }
    }

    fn resolve_to_symbol(&self, sid: SymbolId) -> Symbol {
        self.symbol_table
            .symbol_for(sid)
            .unwrap_or_else(Symbol::unknown_text)
    }

    /// Provides access to the wrapped cursor: the system-level view of this stream.
    pub fn cursor(&self) -> &C {
        &self.cursor
    }

    // Everything below is common to the system and user views; it is forwarded to the cursor
    // directly.
    delegate! {
        to self.cursor {
            pub fn ion_version(&self) -> (u8, u8);
            pub fn ion_type(&self) -> Option<IonType>;
            pub fn is_null(&self) -> bool;
            pub fn read_null(&mut self) -> IonResult<Option<IonType>>;
            pub fn read_bool(&mut self) -> IonResult<Option<bool>>;
            pub fn read_i64(&mut self) -> IonResult<Option<i64>>;
            pub fn read_int(&mut self) -> IonResult<Option<Int>>;
            pub fn read_f32(&mut self) -> IonResult<Option<f32>>;
            pub fn read_f64(&mut self) -> IonResult<Option<f64>>;
            pub fn read_decimal(&mut self) -> IonResult<Option<Decimal>>;
            pub fn read_big_decimal(&mut self) -> IonResult<Option<BigDecimal>>;
            pub fn read_string(&mut self) -> IonResult<Option<String>>;
            pub fn read_symbol_id(&mut self) -> IonResult<Option<SymbolId>>;
            pub fn read_blob_bytes(&mut self) -> IonResult<Option<Vec<u8>>>;
            pub fn read_clob_bytes(&mut self) -> IonResult<Option<Vec<u8>>>;
            pub fn read_datetime(&mut self) -> IonResult<Option<DateTime<FixedOffset>>>;
            pub fn step_in(&mut self) -> IonResult<()>;
            pub fn step_out(&mut self) -> IonResult<()>;
            pub fn depth(&self) -> usize;
        }
    }
}

#[cfg(test)]
mod reader_tests {
    use super::*;
    use crate::binary::constants::v1_0::IVM;
    use crate::binary::cursor::BinaryIonCursor;
    use crate::catalog::MapCatalog;
    use crate::shared_symbol_table::SharedSymbolTable;
    use std::io;

    type TestReader = Reader<BinaryIonCursor<io::Cursor<Vec<u8>>>>;

    fn ion_data(bytes: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&IVM);
        data.extend_from_slice(bytes);
        data
    }

    fn reader_for(bytes: &[u8]) -> TestReader {
        Reader::new(BinaryIonCursor::new(io::Cursor::new(ion_data(bytes))))
    }

    fn reader_with_catalog_for(bytes: &[u8], catalog: MapCatalog) -> TestReader {
        Reader::with_catalog(
            BinaryIonCursor::new(io::Cursor::new(ion_data(bytes))),
            Arc::new(catalog),
        )
    }

    // $ion_symbol_table::{symbols: ["foo", "bar", "baz"]} followed by three symbol values
    // and a struct that uses the new symbols as field names and annotations.
    const EXAMPLE_STREAM: &[u8] = &[
        0xEE, 0x92, // Annotation wrapper, 18 bytes
        0x81, // One byte of annotations
        0x83, // Annotation 3 ('$ion_symbol_table')
        0xDE, 0x8E, // Struct, 14 bytes
        0x87, // Field 7 ('symbols')
        0xBC, // 12-byte list
        0x83, 0x66, 0x6F, 0x6F, // "foo"
        0x83, 0x62, 0x61, 0x72, // "bar"
        0x83, 0x62, 0x61, 0x7A, // "baz"
        0x71, 0x0A, // $10
        0x71, 0x0B, // $11
        0x71, 0x0C, // $12
        0xD6, // 6-byte struct
        0x8A, // Field $10
        0xE4, 0x81, 0x8B, // Annotation wrapper: $11
        0x71, 0x0C, // $12
    ];

    #[test]
    fn symbol_table_structs_are_hidden_from_the_user_view() -> IonResult<()> {
        let mut reader = reader_for(EXAMPLE_STREAM);
        // The first user-level value is a symbol, not the symbol table struct.
        assert_eq!(reader.next()?, Some((IonType::Symbol, false)));
        Ok(())
    }

    #[test]
    fn symbol_values_resolve_through_the_local_table() -> IonResult<()> {
        let mut reader = reader_for(EXAMPLE_STREAM);
        reader.next()?;
        assert_eq!(reader.read_symbol()?.unwrap(), "foo");
        reader.next()?;
        assert_eq!(reader.read_symbol()?.unwrap(), "bar");
        reader.next()?;
        assert_eq!(reader.read_symbol()?.unwrap(), "baz");
        Ok(())
    }

    #[test]
    fn field_names_and_annotations_resolve() -> IonResult<()> {
        let mut reader = reader_for(EXAMPLE_STREAM);
        for _ in 0..3 {
            reader.next()?;
        }
        assert_eq!(reader.next()?, Some((IonType::Struct, false)));
        reader.step_in()?;
        assert_eq!(reader.next()?, Some((IonType::Symbol, false)));
        assert_eq!(reader.field_name().unwrap(), "foo");
        assert_eq!(reader.annotations(), vec![Symbol::owned("bar")]);
        assert!(reader.has_annotation("bar"));
        assert_eq!(reader.read_symbol()?.unwrap(), "baz");
        reader.step_out()?;
        assert_eq!(reader.next()?, None);
        Ok(())
    }

    #[test]
    fn appended_symbols_extend_the_table() -> IonResult<()> {
        // $ion_symbol_table::{symbols: ["foo"]} $10
        // $ion_symbol_table::{imports: $ion_symbol_table, symbols: ["bar"]} $11
        let stream: &[u8] = &[
            0xE9, 0x81, 0x83, 0xD6, 0x87, 0xB4, 0x83, 0x66, 0x6F, 0x6F, // symtab ["foo"]
            0x71, 0x0A, // $10
            0xEC, 0x81, 0x83, 0xD9, // symtab append
            0x86, 0x71, 0x03, // imports: $ion_symbol_table
            0x87, 0xB4, 0x83, 0x62, 0x61, 0x72, // symbols: ["bar"]
            0x71, 0x0B, // $11
        ];
        let mut reader = reader_for(stream);
        reader.next()?;
        assert_eq!(reader.read_symbol()?.unwrap(), "foo");
        reader.next()?;
        assert_eq!(reader.read_symbol()?.unwrap(), "bar");
        // "foo" kept its SID across the append.
        assert_eq!(reader.symbol_table().text_for(10), Some("foo"));
        assert_eq!(reader.symbol_table().text_for(11), Some("bar"));
        Ok(())
    }

    #[test]
    fn symbol_table_replacement_discards_old_symbols() -> IonResult<()> {
        // $ion_symbol_table::{symbols: ["foo"]} $10 $ion_symbol_table::{symbols: ["bar"]} $10
        let stream: &[u8] = &[
            0xE9, 0x81, 0x83, 0xD6, 0x87, 0xB4, 0x83, 0x66, 0x6F, 0x6F, // symtab ["foo"]
            0x71, 0x0A, // $10
            0xE9, 0x81, 0x83, 0xD6, 0x87, 0xB4, 0x83, 0x62, 0x61, 0x72, // symtab ["bar"]
            0x71, 0x0A, // $10
        ];
        let mut reader = reader_for(stream);
        reader.next()?;
        assert_eq!(reader.read_symbol()?.unwrap(), "foo");
        reader.next()?;
        assert_eq!(reader.read_symbol()?.unwrap(), "bar");
        Ok(())
    }

    // $ion_symbol_table::{imports: [{name: "fred", version: 2, max_id: 5}]}
    const IMPORTING_STREAM_PREFIX: &[u8] = &[
        0xEE, 0x93, 0x81, 0x83, // annotation wrapper (19 bytes), $ion_symbol_table
        0xDE, 0x8F, // struct, 15 bytes
        0x86, // imports:
        0xBD, // list, 13 bytes
        0xDC, // struct, 12 bytes
        0x84, 0x84, 0x66, 0x72, 0x65, 0x64, // name: "fred"
        0x85, 0x21, 0x02, // version: 2
        0x88, 0x21, 0x05, // max_id: 5
    ];

    fn importing_stream() -> Vec<u8> {
        let mut stream = IMPORTING_STREAM_PREFIX.to_vec();
        // $10 and $14: the first and last SIDs the import covers
        stream.extend_from_slice(&[0x71, 0x0A, 0x71, 0x0E]);
        stream
    }

    fn fred_v1() -> SharedSymbolTable {
        SharedSymbolTable::new(
            "fred",
            1,
            vec![Symbol::owned("fee"), Symbol::owned("fie")],
        )
        .unwrap()
    }

    #[test]
    fn exact_import_match_resolves_text() -> IonResult<()> {
        let mut catalog = MapCatalog::new();
        catalog.insert_table(SharedSymbolTable::new(
            "fred",
            2,
            vec![
                Symbol::owned("a"),
                Symbol::owned("b"),
                Symbol::owned("c"),
                Symbol::owned("d"),
                Symbol::owned("e"),
            ],
        )?);
        let mut reader = reader_with_catalog_for(&importing_stream(), catalog);
        reader.next()?;
        assert_eq!(reader.read_symbol()?.unwrap(), "a");
        reader.next()?;
        assert_eq!(reader.read_symbol()?.unwrap(), "e");
        assert!(!reader.symbol_table().imports()[0].is_substitute());
        Ok(())
    }

    #[test]
    fn missing_import_version_produces_a_padded_substitute() -> IonResult<()> {
        // The catalog only has fred v1 with two symbols; the declaration wants v2 with five.
        let mut catalog = MapCatalog::new();
        catalog.insert_table(fred_v1());
        let mut reader = reader_with_catalog_for(&importing_stream(), catalog);
        reader.next()?;
        // SID 10 falls within fred v1's range and resolves.
        assert_eq!(reader.read_symbol()?.unwrap(), "fee");
        reader.next()?;
        // SID 14 is within the import's declared range but beyond fred v1; its text is
        // unknown, which is not an error.
        let symbol = reader.read_symbol()?.unwrap();
        assert_eq!(symbol.text(), None);
        assert!(symbol.expect_text().is_err());

        let import = &reader.symbol_table().imports()[0];
        assert!(import.is_substitute());
        assert_eq!(import.max_id(), 5);
        Ok(())
    }

    #[test]
    fn missing_import_entirely_produces_unknown_text() -> IonResult<()> {
        let mut reader = reader_for(&importing_stream());
        reader.next()?;
        assert_eq!(reader.read_symbol()?.unwrap().text(), None);
        // Local symbols still begin after the import's declared range.
        assert_eq!(reader.symbol_table().import_base(), 9 + 5);
        Ok(())
    }

    #[test]
    fn sid_beyond_max_id_is_not_a_decode_error() -> IonResult<()> {
        let mut reader = reader_for(&[0x71, 0x63]); // $99
        reader.next()?;
        let symbol = reader.read_symbol()?.unwrap();
        assert_eq!(symbol.text(), None);
        Ok(())
    }

    #[test]
    fn ivm_resets_the_symbol_table() -> IonResult<()> {
        // symtab ["foo"] $10, then an IVM, then $10 again (now undefined)
        let stream: &[u8] = &[
            0xE9, 0x81, 0x83, 0xD6, 0x87, 0xB4, 0x83, 0x66, 0x6F, 0x6F, // symtab ["foo"]
            0x71, 0x0A, // $10
            0xE0, 0x01, 0x00, 0xEA, // IVM
            0x71, 0x0A, // $10
        ];
        let mut reader = reader_for(stream);
        reader.next()?;
        assert_eq!(reader.read_symbol()?.unwrap(), "foo");
        reader.next()?;
        assert_eq!(reader.read_symbol()?.unwrap().text(), None);
        Ok(())
    }
}
