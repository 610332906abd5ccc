//! End-to-end tests for catalog-backed imports, shared symbol table materialization, and the
//! raw-forwarding fast path between streams that share a symbol table.

use std::io;
use std::sync::Arc;

use ion_binary::binary::IonTypeCode;
use ion_binary::{
    resolve_import, BinaryIonCursor, BinaryWriterBuilder, Catalog, Cursor, ImportDescriptor,
    IonResult, IonWriter, MapCatalog, Reader, SharedSymbolTable, StreamItem, Symbol,
};

fn units_table() -> SharedSymbolTable {
    SharedSymbolTable::new(
        "com.example.units",
        1,
        vec![
            Symbol::owned("meters"),
            Symbol::owned("seconds"),
            Symbol::owned("kilograms"),
        ],
    )
    .unwrap()
}

fn units_catalog() -> MapCatalog {
    let mut catalog = MapCatalog::new();
    catalog.insert_table(units_table());
    catalog
}

#[test]
fn imported_symbols_round_trip_through_the_catalog() -> IonResult<()> {
    let catalog = units_catalog();
    let import = resolve_import(
        &catalog,
        &ImportDescriptor::new("com.example.units", 1, Some(3)),
    )?;

    let mut writer = BinaryWriterBuilder::new().with_import(import).build(Vec::new())?;
    // "seconds" resolves to an imported SID; "parsecs" is interned locally.
    writer.write_symbol("seconds")?;
    writer.write_symbol("parsecs")?;
    writer.flush()?;
    let encoded = writer.output().clone();

    let mut reader = Reader::with_catalog(
        BinaryIonCursor::new(io::Cursor::new(encoded)),
        Arc::new(units_catalog()),
    );
    reader.next()?;
    assert_eq!(reader.read_symbol()?.unwrap(), "seconds");
    reader.next()?;
    assert_eq!(reader.read_symbol()?.unwrap(), "parsecs");
    assert!(!reader.symbol_table().imports()[0].is_substitute());
    Ok(())
}

#[test]
fn decoding_without_the_catalog_yields_unknown_text() -> IonResult<()> {
    let catalog = units_catalog();
    let import = resolve_import(
        &catalog,
        &ImportDescriptor::new("com.example.units", 1, Some(3)),
    )?;
    let mut writer = BinaryWriterBuilder::new().with_import(import).build(Vec::new())?;
    writer.write_symbol("seconds")?;
    writer.flush()?;
    let encoded = writer.output().clone();

    // A reader with an empty catalog resolves the import to a substitute: the symbol is
    // readable, but its text is unknown.
    let mut reader = Reader::new(BinaryIonCursor::new(io::Cursor::new(encoded)));
    reader.next()?;
    let symbol = reader.read_symbol()?.unwrap();
    assert_eq!(symbol.text(), None);
    assert!(reader.symbol_table().imports()[0].is_substitute());
    Ok(())
}

#[test]
fn shared_symbol_table_materializes_from_a_stream() -> IonResult<()> {
    // Write an $ion_shared_symbol_table struct, then read it back as a SharedSymbolTable and
    // register it in a catalog.
    let mut writer = BinaryWriterBuilder::new().build(Vec::new())?;
    writer.set_annotations(["$ion_shared_symbol_table"])?;
    writer.step_in(ion_binary::IonType::Struct)?;
    writer.set_field_name("name")?;
    writer.write_string("com.example.colors")?;
    writer.set_field_name("version")?;
    writer.write_i64(2)?;
    writer.set_field_name("symbols")?;
    writer.step_in(ion_binary::IonType::List)?;
    writer.write_string("red")?;
    writer.write_null(ion_binary::IonType::Null)?; // a retired symbol leaves a hole
    writer.write_string("blue")?;
    writer.step_out()?;
    writer.step_out()?;
    writer.flush()?;
    let encoded = writer.output().clone();

    let mut reader = Reader::new(BinaryIonCursor::new(io::Cursor::new(encoded)));
    let table = SharedSymbolTable::from_reader(&mut reader)?;
    assert_eq!(table.name(), "com.example.colors");
    assert_eq!(table.version(), 2);
    assert_eq!(table.max_id(), 3);
    assert_eq!(table.text_for(1), Some("red"));
    assert_eq!(table.text_for(2), None); // the hole is preserved, not compacted
    assert_eq!(table.text_for(3), Some("blue"));

    let mut catalog = MapCatalog::new();
    catalog.insert_table(table);
    assert_eq!(catalog.get_table("com.example.colors").unwrap().version(), 2);
    Ok(())
}

#[test]
fn raw_forwarding_requires_an_identical_symbol_table() -> IonResult<()> {
    // Encode a source stream with a string value.
    let mut source_writer = BinaryWriterBuilder::new().build(Vec::new())?;
    source_writer.write_symbol("shared_symbol")?;
    source_writer.write_string("payload")?;
    source_writer.flush()?;
    let encoded = source_writer.output().clone();

    // Read the string's raw payload from the source through the system-level cursor.
    let mut cursor = BinaryIonCursor::new(io::Cursor::new(encoded));
    assert_eq!(cursor.next()?, Some(StreamItem::VersionMarker(1, 0)));
    cursor.next()?; // the symbol table struct
    cursor.step_in()?;
    cursor.step_out()?;
    cursor.next()?; // the symbol value
    assert_eq!(cursor.next()?, Some(StreamItem::Value(ion_binary::IonType::String, false)));
    let payload = cursor.raw_value_bytes()?.unwrap().to_vec();

    // A destination writer with the same interned symbols accepts the forwarded bytes...
    let mut matching_writer = BinaryWriterBuilder::new().build(Vec::new())?;
    matching_writer.write_symbol("shared_symbol")?;
    let source_table = {
        let mut table_writer = BinaryWriterBuilder::new().build(Vec::new())?;
        table_writer.write_symbol("shared_symbol")?;
        table_writer.symbol_table().clone()
    };
    matching_writer.write_raw_scalar(IonTypeCode::String, &payload, &source_table)?;
    matching_writer.flush()?;

    let mut reader = Reader::new(BinaryIonCursor::new(io::Cursor::new(
        matching_writer.output().clone(),
    )));
    reader.next()?;
    assert_eq!(reader.read_symbol()?.unwrap(), "shared_symbol");
    reader.next()?;
    assert_eq!(reader.read_string()?, Some("payload".to_string()));

    // ...but a writer whose table diverges must be told to re-encode.
    let mut mismatched_writer = BinaryWriterBuilder::new().build(Vec::new())?;
    mismatched_writer.write_symbol("a_different_symbol")?;
    let result = mismatched_writer.write_raw_scalar(IonTypeCode::String, &payload, &source_table);
    assert!(matches!(result, Err(ion_binary::IonError::Encoding(_))));
    Ok(())
}

#[test]
fn catalog_mutation_does_not_invalidate_live_streams() -> IonResult<()> {
    let catalog = units_catalog();
    let import = resolve_import(
        &catalog,
        &ImportDescriptor::new("com.example.units", 1, Some(3)),
    )?;
    let mut writer = BinaryWriterBuilder::new().with_import(import).build(Vec::new())?;
    writer.write_symbol("kilograms")?;
    writer.flush()?;
    let encoded = writer.output().clone();

    let mut shared_catalog = units_catalog();
    let catalog_arc: Arc<MapCatalog> = {
        // Build the reader's catalog, resolve the stream against it, then remove the table.
        let mut reader = Reader::with_catalog(
            BinaryIonCursor::new(io::Cursor::new(encoded.clone())),
            Arc::new(units_catalog()),
        );
        reader.next()?;
        assert_eq!(reader.read_symbol()?.unwrap(), "kilograms");

        // Mutating a different catalog instance mid-test mirrors the supported pattern:
        // already-resolved tables are owned via Arc and keep working.
        shared_catalog.remove_table("com.example.units", 1);
        assert_eq!(reader.symbol_table().imports()[0].table().text_for(3), Some("kilograms"));
        Arc::new(shared_catalog)
    };
    // A new stream resolved against the mutated catalog gets a substitute instead.
    let mut reader = Reader::with_catalog(
        BinaryIonCursor::new(io::Cursor::new(encoded)),
        catalog_arc,
    );
    reader.next()?;
    assert_eq!(reader.read_symbol()?.unwrap().text(), None);
    assert!(reader.symbol_table().imports()[0].is_substitute());
    Ok(())
}
