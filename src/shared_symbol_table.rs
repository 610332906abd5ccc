use crate::cursor::Cursor;
use crate::reader::Reader;
use crate::result::{decoding_error, illegal_operation, IonResult};
use crate::symbol::Symbol;
use crate::types::IonType;

/// An immutable, named, versioned symbol table that can be distributed independently of the
/// streams that import it.
///
/// A slot in a shared table may have no text: versioning rules allow a symbol to be removed
/// from a newer version of a table, but its position must be preserved as a hole so that the
/// symbol IDs of the surrounding entries do not shift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedSymbolTable {
    name: String,
    version: usize,
    symbols: Vec<Symbol>,
}

impl SharedSymbolTable {
    /// Constructs a new shared symbol table. The `name` must be a non-empty string; versions
    /// below 1 are clamped to 1.
    pub fn new<S: Into<String>>(
        name: S,
        version: usize,
        symbols: Vec<Symbol>,
    ) -> IonResult<Self> {
        let name = name.into();
        // Materialization of a shared symbol table whose name is not a non-empty string
        // must fail.
        if name.is_empty() {
            return illegal_operation("shared symbol table with empty name is not allowed");
        }
        Ok(Self {
            name,
            version: version.max(1),
            symbols,
        })
    }

    /// Returns the name of this table.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the version of this table.
    pub fn version(&self) -> usize {
        self.version
    }

    /// Returns the highest symbol ID this table can assign. Equal to the number of slots,
    /// including slots with unknown text.
    pub fn max_id(&self) -> usize {
        self.symbols.len()
    }

    /// Returns all of this table's slots in position order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Returns the symbol at the provided position. Positions are 1-based, matching the symbol
    /// ID that the slot would be assigned if this table were the stream's only source of
    /// symbols.
    pub fn symbol_for(&self, position: usize) -> Option<&Symbol> {
        if position == 0 {
            return None;
        }
        self.symbols.get(position - 1)
    }

    /// Returns the text at the provided 1-based position, or `None` if the position is out of
    /// range or its text is unknown.
    pub fn text_for(&self, position: usize) -> Option<&str> {
        self.symbol_for(position)?.text()
    }

    /// Materializes a shared symbol table from the next value of the provided reader, which
    /// must be a struct annotated with `$ion_shared_symbol_table`:
    ///
    /// ```text
    /// $ion_shared_symbol_table::{
    ///   name: "com.example.symbols",
    ///   version: 1,
    ///   symbols: ["fee", "fie", "foe"]
    /// }
    /// ```
    ///
    /// Null or non-string entries in the `symbols` list become slots with unknown text.
    pub fn from_reader<C: Cursor>(reader: &mut Reader<C>) -> IonResult<Self> {
        match reader.next()? {
            Some((IonType::Struct, false)) => {}
            Some((ion_type, _)) => {
                return decoding_error(format!(
                    "expected a shared symbol table struct, found a(n) {ion_type}"
                ));
            }
            None => return decoding_error("expected a shared symbol table struct, found nothing"),
        }
        if !reader.has_annotation("$ion_shared_symbol_table") {
            return decoding_error(
                "shared symbol table structs must be annotated with '$ion_shared_symbol_table'",
            );
        }

        let mut name: Option<String> = None;
        let mut version: usize = 1;
        let mut symbols: Vec<Symbol> = vec![];

        reader.step_in()?;
        while let Some((ion_type, is_null)) = reader.next()? {
            let field_name = reader
                .field_name()
                .and_then(|symbol| symbol.text().map(String::from));
            match (field_name.as_deref(), ion_type, is_null) {
                (Some("name"), IonType::String, false) => {
                    name = reader.read_string()?;
                }
                (Some("version"), IonType::Int, false) => {
                    version = reader.read_i64()?.unwrap_or(1).max(1) as usize;
                }
                (Some("symbols"), IonType::List, false) => {
                    reader.step_in()?;
                    while let Some((ion_type, is_null)) = reader.next()? {
                        match (ion_type, is_null) {
                            (IonType::String, false) => {
                                let text = reader.read_string()?.expect("string value");
                                symbols.push(Symbol::owned(text));
                            }
                            // Null or non-string entries are preserved as holes.
                            _ => symbols.push(Symbol::unknown_text()),
                        }
                    }
                    reader.step_out()?;
                }
                // `imports` and any other fields are informational only.
                _ => {}
            }
        }
        reader.step_out()?;

        match name {
            Some(name) => SharedSymbolTable::new(name, version, symbols),
            None => decoding_error("shared symbol table struct has no 'name' field"),
        }
    }
}
