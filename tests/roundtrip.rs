//! End-to-end tests that write a binary Ion stream with [`BinaryWriter`] and read it back
//! with [`Reader`].

use std::io;

use chrono::DateTime;

use ion_binary::{
    is_binary_ion, BinaryIonCursor, BinaryWriter, BinaryWriterBuilder, Decimal, IonResult,
    IonType, IonWriter, Reader,
};

type TestReader = Reader<BinaryIonCursor<io::Cursor<Vec<u8>>>>;

/// A reusable test outline: runs the provided writing function, then hands a reader over the
/// encoded output to the provided reading function.
fn write_then_read(
    write_fn: impl FnOnce(&mut BinaryWriter<Vec<u8>>) -> IonResult<()>,
    read_fn: impl FnOnce(&mut TestReader) -> IonResult<()>,
) -> IonResult<()> {
    let mut writer = BinaryWriterBuilder::new().build(Vec::new())?;
    write_fn(&mut writer)?;
    writer.flush()?;
    let encoded = writer.output().clone();
    assert!(is_binary_ion(&encoded));
    let mut reader = Reader::new(BinaryIonCursor::new(io::Cursor::new(encoded)));
    read_fn(&mut reader)
}

#[test]
fn scalars_round_trip() -> IonResult<()> {
    let timestamp = DateTime::parse_from_rfc3339("2021-04-06T18:00:05.446-05:00").unwrap();
    write_then_read(
        |writer| {
            writer.write_bool(true)?;
            writer.write_i64(-7_000_000)?;
            writer.write_f64(1.125)?;
            writer.write_decimal(&Decimal::new(1225, -2))?;
            writer.write_timestamp(&timestamp)?;
            writer.write_string("forty-two")?;
            writer.write_blob([0xDE, 0xAD, 0xBE, 0xEF])?;
            writer.write_clob(b"clob contents")?;
            writer.write_null(IonType::Timestamp)?;
            Ok(())
        },
        |reader| {
            assert_eq!(reader.next()?, Some((IonType::Bool, false)));
            assert_eq!(reader.read_bool()?, Some(true));
            assert_eq!(reader.next()?, Some((IonType::Int, false)));
            assert_eq!(reader.read_i64()?, Some(-7_000_000));
            assert_eq!(reader.next()?, Some((IonType::Float, false)));
            assert_eq!(reader.read_f64()?, Some(1.125));
            assert_eq!(reader.next()?, Some((IonType::Decimal, false)));
            assert_eq!(reader.read_decimal()?, Some(Decimal::new(1225, -2)));
            assert_eq!(reader.next()?, Some((IonType::Timestamp, false)));
            assert_eq!(reader.read_datetime()?, Some(timestamp));
            assert_eq!(reader.next()?, Some((IonType::String, false)));
            assert_eq!(reader.read_string()?, Some("forty-two".to_string()));
            assert_eq!(reader.next()?, Some((IonType::Blob, false)));
            assert_eq!(
                reader.read_blob_bytes()?,
                Some(vec![0xDE, 0xAD, 0xBE, 0xEF])
            );
            assert_eq!(reader.next()?, Some((IonType::Clob, false)));
            assert_eq!(reader.read_clob_bytes()?, Some(b"clob contents".to_vec()));
            assert_eq!(reader.next()?, Some((IonType::Timestamp, true)));
            assert_eq!(reader.read_null()?, Some(IonType::Timestamp));
            assert_eq!(reader.next()?, None);
            Ok(())
        },
    )
}

#[test]
fn decimal_precision_survives_round_trip() -> IonResult<()> {
    // 1.0 and 1.00 are numerically equal but their scales must be preserved independently,
    // and -0. must come back reporting a negative zero.
    write_then_read(
        |writer| {
            writer.write_decimal(&Decimal::new(10, -1))?; // 1.0
            writer.write_decimal(&Decimal::new(100, -2))?; // 1.00
            writer.write_decimal(&Decimal::negative_zero())?; // -0.
            Ok(())
        },
        |reader| {
            reader.next()?;
            let one_tenths = reader.read_decimal()?.unwrap();
            reader.next()?;
            let one_hundredths = reader.read_decimal()?.unwrap();
            reader.next()?;
            let negative_zero = reader.read_decimal()?.unwrap();

            assert_eq!(one_tenths.scale(), 1);
            assert_eq!(one_hundredths.scale(), 2);
            assert_eq!(one_tenths, one_hundredths); // numerically equal

            assert!(negative_zero.is_negative_zero());
            assert_eq!(negative_zero, Decimal::new(0, 0)); // numerically equal to 0.
            Ok(())
        },
    )
}

#[test]
fn extreme_integers_round_trip() -> IonResult<()> {
    // i64::MIN's magnitude cannot be produced by negating an i64 in place; the encoder must
    // widen before negating rather than rejecting it.
    write_then_read(
        |writer| {
            writer.write_i64(i64::MIN)?;
            writer.write_i64(i64::MAX)?;
            writer.write_i64(0)?;
            Ok(())
        },
        |reader| {
            reader.next()?;
            assert_eq!(reader.read_i64()?, Some(i64::MIN));
            reader.next()?;
            assert_eq!(reader.read_i64()?, Some(i64::MAX));
            reader.next()?;
            assert_eq!(reader.read_i64()?, Some(0));
            Ok(())
        },
    )
}

#[test]
fn containers_round_trip() -> IonResult<()> {
    // {inventory: [truck::{wheels: 6}, 2], name: "depot"}
    write_then_read(
        |writer| {
            writer.step_in(IonType::Struct)?;
            writer.set_field_name("inventory")?;
            writer.step_in(IonType::List)?;
            writer.set_annotations(["truck"])?;
            writer.step_in(IonType::Struct)?;
            writer.set_field_name("wheels")?;
            writer.write_i64(6)?;
            writer.step_out()?;
            writer.write_i64(2)?;
            writer.step_out()?;
            writer.set_field_name("name")?;
            writer.write_string("depot")?;
            writer.step_out()?;
            Ok(())
        },
        |reader| {
            assert_eq!(reader.next()?, Some((IonType::Struct, false)));
            reader.step_in()?;

            assert_eq!(reader.next()?, Some((IonType::List, false)));
            assert_eq!(reader.field_name().unwrap(), "inventory");
            reader.step_in()?;

            assert_eq!(reader.next()?, Some((IonType::Struct, false)));
            let annotations = reader.annotations();
            assert_eq!(annotations.len(), 1);
            assert_eq!(annotations[0], "truck");
            reader.step_in()?;
            assert_eq!(reader.next()?, Some((IonType::Int, false)));
            assert_eq!(reader.field_name().unwrap(), "wheels");
            assert_eq!(reader.read_i64()?, Some(6));
            reader.step_out()?;

            assert_eq!(reader.next()?, Some((IonType::Int, false)));
            assert_eq!(reader.read_i64()?, Some(2));
            assert_eq!(reader.next()?, None);
            reader.step_out()?;

            assert_eq!(reader.next()?, Some((IonType::String, false)));
            assert_eq!(reader.field_name().unwrap(), "name");
            assert_eq!(reader.read_string()?, Some("depot".to_string()));
            reader.step_out()?;

            assert_eq!(reader.next()?, None);
            Ok(())
        },
    )
}

#[test]
fn symbols_round_trip_by_text() -> IonResult<()> {
    write_then_read(
        |writer| {
            writer.write_symbol("foo")?;
            writer.write_symbol("bar")?;
            writer.write_symbol("foo")?;
            Ok(())
        },
        |reader| {
            reader.next()?;
            assert_eq!(reader.read_symbol()?.unwrap(), "foo");
            reader.next()?;
            assert_eq!(reader.read_symbol()?.unwrap(), "bar");
            reader.next()?;
            assert_eq!(reader.read_symbol()?.unwrap(), "foo");
            Ok(())
        },
    )
}

#[test]
fn field_and_annotation_write_order_is_preserved() -> IonResult<()> {
    write_then_read(
        |writer| {
            writer.set_annotations(["b", "a", "b"])?;
            writer.write_symbol("value")?;
            Ok(())
        },
        |reader| {
            reader.next()?;
            // Annotations come back in call order: no reordering, no deduplication.
            let annotations = reader.annotations();
            assert_eq!(annotations.len(), 3);
            assert_eq!(annotations[0], "b");
            assert_eq!(annotations[1], "a");
            assert_eq!(annotations[2], "b");
            Ok(())
        },
    )
}

#[test]
fn values_written_after_a_flush_remain_readable() -> IonResult<()> {
    // Symbols interned after a flush are announced in a second, append-form symbol table
    // struct; the reader must resolve symbols from both segments.
    let mut writer = BinaryWriterBuilder::new().build(Vec::new())?;
    writer.write_symbol("alpha")?;
    writer.flush()?;
    let first_segment = writer.output().clone();

    writer.write_symbol("alpha")?;
    writer.write_symbol("beta")?;
    writer.flush()?;
    let encoded = writer.output().clone();

    // The first segment's bytes were not revisited by the second flush.
    assert_eq!(&encoded[..first_segment.len()], &first_segment[..]);

    let mut reader = Reader::new(BinaryIonCursor::new(io::Cursor::new(encoded)));
    reader.next()?;
    assert_eq!(reader.read_symbol()?.unwrap(), "alpha");
    reader.next()?;
    assert_eq!(reader.read_symbol()?.unwrap(), "alpha");
    reader.next()?;
    assert_eq!(reader.read_symbol()?.unwrap(), "beta");
    assert_eq!(reader.next()?, None);
    Ok(())
}

#[test]
fn repeated_encoding_reuses_symbol_ids() -> IonResult<()> {
    // Encoding the same values twice must assign the same SIDs both times.
    let encode = || -> IonResult<Vec<u8>> {
        let mut writer = BinaryWriterBuilder::new().build(Vec::new())?;
        writer.step_in(IonType::Struct)?;
        writer.set_field_name("quantity")?;
        writer.write_i64(4)?;
        writer.set_field_name("unit")?;
        writer.write_symbol("meters")?;
        writer.step_out()?;
        writer.flush()?;
        Ok(writer.output().clone())
    };
    assert_eq!(encode()?, encode()?);
    Ok(())
}
