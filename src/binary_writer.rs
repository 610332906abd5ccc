use std::io::Write;
use std::mem;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use delegate::delegate;

use crate::binary::constants::v1_0::IVM;
use crate::binary::raw_binary_writer::RawBinaryWriter;
use crate::binary::type_code::IonTypeCode;
use crate::constants::v1_0::system_symbol_ids;
use crate::imports::ResolvedImport;
use crate::raw_symbol_token::{AsRawSymbolTokenRef, RawSymbolTokenRef};
use crate::result::{encoding_error, illegal_operation, IonResult};
use crate::symbol_table::SymbolTable;
use crate::types::{Decimal, Int, IonType, SymbolId};
use crate::writer::IonWriter;

/// Builds [`BinaryWriter`] instances, optionally configuring the imports their local symbol
/// tables begin with.
pub struct BinaryWriterBuilder {
    imports: Vec<ResolvedImport>,
}

impl BinaryWriterBuilder {
    pub fn new() -> Self {
        BinaryWriterBuilder { imports: vec![] }
    }

    /// Adds a resolved import whose symbols will be available to (and assumed by) the stream
    /// being written. Imports occupy the symbol ID range after the system symbols, in the
    /// order they are added.
    pub fn with_import(mut self, import: ResolvedImport) -> Self {
        self.imports.push(import);
        self
    }

    /// Creates a BinaryWriter that will write its encoded output to the provided sink.
    pub fn build<W: Write>(self, sink: W) -> IonResult<BinaryWriter<W>> {
        Ok(BinaryWriter {
            raw_writer: RawBinaryWriter::new(sink),
            symbol_table: SymbolTable::with_imports(self.imports),
            emitted_ivm: false,
            emitted_symbol_table_struct: false,
        })
    }
}

impl Default for BinaryWriterBuilder {
    fn default() -> Self {
        BinaryWriterBuilder::new()
    }
}

/// An application-level binary Ion writer. This writer manages the stream's local symbol
/// table, interning the text of field names, annotations, and symbol values as they are
/// written, and assembles the datagram: on each `flush()` it emits the stream prologue the
/// buffered values depend on (the version marker, then a symbol table struct carrying any
/// newly interned symbols) before the values themselves.
///
/// Flushing seals the current symbol table generation. Writing more symbols afterward opens a
/// fresh generation layered on the sealed one, and the next flush announces those symbols in
/// append form (`imports: $ion_symbol_table`), guaranteeing that bytes already handed to the
/// sink are never revisited.
pub struct BinaryWriter<W: Write> {
    raw_writer: RawBinaryWriter<W>,
    symbol_table: SymbolTable,
    emitted_ivm: bool,
    emitted_symbol_table_struct: bool,
}

impl<W: Write> BinaryWriter<W> {
    /// The active symbol table. Between flushes this is the open generation that new text is
    /// interned into.
    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbol_table
    }

    fn intern_text(&mut self, text: &str) -> IonResult<SymbolId> {
        if self.symbol_table.is_sealed() && self.symbol_table.sid_for(&text).is_none() {
            // The previous flush sealed the table; layer a fresh, growable generation on it.
            let sealed = mem::take(&mut self.symbol_table);
            self.symbol_table = SymbolTable::new_generation(Arc::new(sealed));
        }
        self.symbol_table.intern(text)
    }

    // Resolves a raw symbol token to a SID, interning text as necessary. A raw SID is
    // accepted only if the active table has assigned it; anything else would encode a symbol
    // this stream cannot give meaning to.
    fn sid_for_token<A: AsRawSymbolTokenRef>(&mut self, token: &A) -> IonResult<SymbolId> {
        match token.as_raw_symbol_token_ref() {
            RawSymbolTokenRef::SymbolId(sid) => {
                if self.symbol_table.sid_is_valid(sid) {
                    Ok(sid)
                } else {
                    encoding_error(format!(
                        "cannot write symbol ID ${sid}; it is not defined in the active symbol \
                         table (max_id is {})",
                        self.symbol_table.max_id()
                    ))
                }
            }
            RawSymbolTokenRef::Text(text) => self.intern_text(text),
        }
    }

    /// Forwards a scalar value that is already binary-encoded, skipping the decode/re-encode
    /// pass. This is only sound when the source stream's symbol table assigns exactly the same
    /// meaning to every symbol ID as this writer's table does, so the caller must supply the
    /// source table for comparison; if the mapping differs, an
    /// [`Encoding`](crate::IonError::Encoding) error is returned and the caller must fall back
    /// to reading and re-writing the value (remapping its symbol IDs in the process).
    pub fn write_raw_scalar(
        &mut self,
        type_code: IonTypeCode,
        payload: &[u8],
        source_symbol_table: &SymbolTable,
    ) -> IonResult<()> {
        if !self.symbol_table.has_same_mapping(source_symbol_table) {
            return encoding_error(
                "cannot forward raw value bytes: the source stream's symbol table does not \
                 match this writer's; decode and re-encode the value instead",
            );
        }
        self.raw_writer.write_raw_scalar_payload(type_code, payload)
    }

    // Encodes the prologue this segment's values depend on: the IVM (once per stream) and, if
    // any symbols were interned since the last flush, a symbol table struct. The prologue is
    // written straight to the sink, ahead of the raw writer's buffered values.
    fn write_stream_prologue(&mut self) -> IonResult<()> {
        // A sealed table's local symbols were announced by the flush that sealed it; only an
        // open generation can be holding symbols the sink has not seen.
        let pending_symbols = if self.symbol_table.is_sealed() {
            vec![]
        } else {
            self.symbol_table.local_symbols().to_vec()
        };
        let needs_symbol_table_struct = !pending_symbols.is_empty()
            || (!self.emitted_symbol_table_struct && !self.symbol_table.imports().is_empty());

        let mut prologue: Vec<u8> = Vec::new();
        if !self.emitted_ivm {
            prologue.extend_from_slice(&IVM);
        }

        if needs_symbol_table_struct {
            let mut symtab_writer = RawBinaryWriter::new(&mut prologue);
            symtab_writer.add_annotation(system_symbol_ids::ION_SYMBOL_TABLE);
            symtab_writer.step_in(IonType::Struct)?;

            if self.emitted_symbol_table_struct {
                // Append form: the new symbols extend the table already announced on this
                // stream rather than replacing it.
                symtab_writer.set_field_id(system_symbol_ids::IMPORTS);
                symtab_writer.write_symbol_id(system_symbol_ids::ION_SYMBOL_TABLE)?;
            } else if !self.symbol_table.imports().is_empty() {
                symtab_writer.set_field_id(system_symbol_ids::IMPORTS);
                symtab_writer.step_in(IonType::List)?;
                for import in self.symbol_table.imports() {
                    symtab_writer.step_in(IonType::Struct)?;
                    symtab_writer.set_field_id(system_symbol_ids::NAME);
                    symtab_writer.write_string(import.name())?;
                    symtab_writer.set_field_id(system_symbol_ids::VERSION);
                    symtab_writer.write_i64(import.version() as i64)?;
                    symtab_writer.set_field_id(system_symbol_ids::MAX_ID);
                    symtab_writer.write_i64(import.max_id() as i64)?;
                    symtab_writer.step_out()?;
                }
                symtab_writer.step_out()?;
            }

            symtab_writer.set_field_id(system_symbol_ids::SYMBOLS);
            symtab_writer.step_in(IonType::List)?;
            for symbol in &pending_symbols {
                match symbol.text() {
                    Some(text) => symtab_writer.write_string(text)?,
                    // A placeholder slot; its SID exists but carries no text.
                    None => symtab_writer.write_null(IonType::Null)?,
                }
            }
            symtab_writer.step_out()?;
            symtab_writer.step_out()?;
            symtab_writer.flush()?;
        }

        if !prologue.is_empty() {
            self.raw_writer.output_mut().write_all(&prologue)?;
        }

        self.emitted_ivm = true;
        if needs_symbol_table_struct {
            self.emitted_symbol_table_struct = true;
            // The table's contents are now on the wire; seal this generation so the symbol
            // IDs it assigned can never be renumbered.
            self.symbol_table.seal();
        }
        Ok(())
    }
}

impl<W: Write> IonWriter for BinaryWriter<W> {
    type Output = W;

    fn supports_text_symbol_tokens(&self) -> bool {
        true
    }

    fn set_annotations<I, A>(&mut self, annotations: I) -> IonResult<()>
    where
        A: AsRawSymbolTokenRef,
        I: IntoIterator<Item = A>,
    {
        self.raw_writer.clear_annotations();
        for annotation in annotations {
            let sid = self.sid_for_token(&annotation)?;
            self.raw_writer.add_annotation(sid);
        }
        Ok(())
    }

    fn write_symbol<A: AsRawSymbolTokenRef>(&mut self, value: A) -> IonResult<()> {
        let sid = self.sid_for_token(&value)?;
        self.raw_writer.write_symbol_id(sid)
    }

    fn set_field_name<A: AsRawSymbolTokenRef>(&mut self, name: A) -> IonResult<()> {
        if self.raw_writer.parent_type() != Some(IonType::Struct) {
            return illegal_operation("field names can only be set inside a struct");
        }
        let sid = self.sid_for_token(&name)?;
        self.raw_writer.set_field_id(sid);
        Ok(())
    }

    fn flush(&mut self) -> IonResult<()> {
        if self.raw_writer.depth() > 0 {
            return illegal_operation(
                "cannot flush while the writer is positioned within a container",
            );
        }
        self.write_stream_prologue()?;
        self.raw_writer.flush()
    }

    delegate! {
        to self.raw_writer {
            fn ion_version(&self) -> (u8, u8);
            fn write_null(&mut self, ion_type: IonType) -> IonResult<()>;
            fn write_bool(&mut self, value: bool) -> IonResult<()>;
            fn write_i64(&mut self, value: i64) -> IonResult<()>;
            fn write_int(&mut self, value: &Int) -> IonResult<()>;
            fn write_f32(&mut self, value: f32) -> IonResult<()>;
            fn write_f64(&mut self, value: f64) -> IonResult<()>;
            fn write_decimal(&mut self, value: &Decimal) -> IonResult<()>;
            fn write_timestamp(&mut self, value: &DateTime<FixedOffset>) -> IonResult<()>;
            fn write_string<A: AsRef<str>>(&mut self, value: A) -> IonResult<()>;
            fn write_clob<A: AsRef<[u8]>>(&mut self, value: A) -> IonResult<()>;
            fn write_blob<A: AsRef<[u8]>>(&mut self, value: A) -> IonResult<()>;
            fn step_in(&mut self, container_type: IonType) -> IonResult<()>;
            fn parent_type(&self) -> Option<IonType>;
            fn depth(&self) -> usize;
            fn step_out(&mut self) -> IonResult<()>;
            fn output(&self) -> &W;
            fn output_mut(&mut self) -> &mut W;
        }
    }
}
