use std::io::Write;

use arrayvec::ArrayVec;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Timelike};

use crate::binary::int::DecodedInt;
use crate::binary::raw_binary_writer::MAX_INLINE_LENGTH;
use crate::binary::var_int::VarInt;
use crate::binary::var_uint::VarUInt;
use crate::data_source::IonDataSource;
use crate::result::{decoding_error, IonError, IonResult};

// Stack allocation for the encoded form of a timestamp: offset and year VarInts, five
// single-byte time fields, and a fractional-second coefficient never exceed this size.
const TIMESTAMP_BUFFER_SIZE: usize = 32;

const NANOSECONDS_PER_SECOND: i64 = 1_000_000_000;

/// Provides support for writing a timestamp's binary encoding: an offset VarInt (minutes from
/// UTC) followed by the UTC date and time components as VarUInts, and an optional
/// fractional-second decimal. The component fields are always stored in UTC; the offset is
/// applied when reading to recover local time.
pub trait TimestampBinaryEncoder {
    /// Encodes the content of a timestamp (without its type descriptor or length) and returns
    /// the number of bytes written.
    fn encode_timestamp(&mut self, value: &DateTime<FixedOffset>) -> IonResult<usize>;

    /// Encodes a timestamp as a complete Ion value with type descriptor and length.
    /// Returns the number of bytes written.
    fn encode_timestamp_value(&mut self, value: &DateTime<FixedOffset>) -> IonResult<usize>;
}

impl<W> TimestampBinaryEncoder for W
where
    W: Write,
{
    fn encode_timestamp(&mut self, value: &DateTime<FixedOffset>) -> IonResult<usize> {
        let offset_minutes = value.offset().local_minus_utc() / 60;
        let utc = value.naive_utc();

        let mut bytes_written = VarInt::write_i64(self, offset_minutes as i64)?;
        bytes_written += VarUInt::write_u64(self, utc.year() as u64)?;
        bytes_written += VarUInt::write_u64(self, utc.month() as u64)?;
        bytes_written += VarUInt::write_u64(self, utc.day() as u64)?;
        bytes_written += VarUInt::write_u64(self, utc.hour() as u64)?;
        bytes_written += VarUInt::write_u64(self, utc.minute() as u64)?;
        bytes_written += VarUInt::write_u64(self, utc.second() as u64)?;

        let nanoseconds = value.timestamp_subsec_nanos();
        if nanoseconds > 0 {
            // The fractional seconds are a decimal: 446000000 nanoseconds is 446000000d-9.
            bytes_written += VarInt::write_i64(self, -9)?;
            bytes_written += DecodedInt::write_i64(self, nanoseconds as i64)?;
        }

        Ok(bytes_written)
    }

    fn encode_timestamp_value(&mut self, value: &DateTime<FixedOffset>) -> IonResult<usize> {
        // Encode the body first; the encoded length is needed to write the type descriptor.
        let mut encoded: ArrayVec<u8, TIMESTAMP_BUFFER_SIZE> = ArrayVec::new();
        encoded.encode_timestamp(value)?;

        let mut bytes_written = 1;
        if encoded.len() <= MAX_INLINE_LENGTH {
            self.write_all(&[0x60 | encoded.len() as u8])?;
        } else {
            self.write_all(&[0x6E])?;
            bytes_written += VarUInt::write_u64(self, encoded.len() as u64)?;
        }
        self.write_all(&encoded)?;
        Ok(bytes_written + encoded.len())
    }
}

// Maps an Incomplete error encountered inside a value's payload to a Decoding error: the bytes
// were all present, so running out of them means the length field lied.
fn overran<T>(result: IonResult<T>) -> IonResult<T> {
    match result {
        Err(IonError::Incomplete(_)) => {
            decoding_error("a timestamp's fields ran past the end of the value")
        }
        other => other,
    }
}

/// Reads a timestamp with `length` bytes of payload from the provided data source.
///
/// Fields the encoding omits (a year-precision timestamp has no month, for example) assume
/// their lowest legal values. A timestamp with an unknown offset (`-0`) is returned at offset
/// zero, as the caller-facing [`DateTime<FixedOffset>`] cannot express "unknown".
pub(crate) fn decode_timestamp<R: IonDataSource>(
    data_source: &mut R,
    length: usize,
) -> IonResult<DateTime<FixedOffset>> {
    if length == 0 {
        return decoding_error("found a timestamp with no offset or year");
    }

    let mut remaining = length;

    let offset_var_int = overran(VarInt::read(data_source))?;
    let offset_minutes = offset_var_int.value();
    remaining = remaining
        .checked_sub(offset_var_int.size_in_bytes())
        .ok_or_else(|| {
            crate::result::decoding_error_raw("a timestamp's offset ran past the end of the value")
        })?;

    let mut read_field = |data_source: &mut R, remaining: &mut usize| -> IonResult<Option<u64>> {
        if *remaining == 0 {
            return Ok(None);
        }
        let var_uint = overran(VarUInt::read(data_source))?;
        *remaining = remaining.checked_sub(var_uint.size_in_bytes()).ok_or_else(|| {
            crate::result::decoding_error_raw("a timestamp's fields ran past the end of the value")
        })?;
        Ok(Some(var_uint.value()))
    };

    let year = match read_field(data_source, &mut remaining)? {
        Some(year) => year,
        None => return decoding_error("found a timestamp with no year field"),
    };
    let month = read_field(data_source, &mut remaining)?.unwrap_or(1);
    let day = read_field(data_source, &mut remaining)?.unwrap_or(1);
    let hour = read_field(data_source, &mut remaining)?.unwrap_or(0);
    let minute = read_field(data_source, &mut remaining)?.unwrap_or(0);
    let second = read_field(data_source, &mut remaining)?.unwrap_or(0);

    // Any remaining bytes are the fractional seconds decimal.
    let mut nanoseconds: i64 = 0;
    if remaining > 0 {
        let exponent_var_int = overran(VarInt::read(data_source))?;
        let exponent = exponent_var_int.value();
        let coefficient_length = remaining
            .checked_sub(exponent_var_int.size_in_bytes())
            .ok_or_else(|| {
                crate::result::decoding_error_raw(
                    "a timestamp's fractional seconds ran past the end of the value",
                )
            })?;
        let coefficient = overran(DecodedInt::read(data_source, coefficient_length))?;
        let coefficient = coefficient.value().as_i64().ok_or_else(|| {
            crate::result::decoding_error_raw("a timestamp's fractional seconds are out of range")
        })?;
        // fraction = coefficient * 10^exponent seconds; convert to nanoseconds.
        nanoseconds = if exponent > 0 {
            return decoding_error("a timestamp's fractional seconds are not less than 1");
        } else if exponent >= -9 {
            let scale_up = (exponent + 9) as u32;
            coefficient.checked_mul(10i64.pow(scale_up)).ok_or_else(|| {
                crate::result::decoding_error_raw(
                    "a timestamp's fractional seconds are out of range",
                )
            })?
        } else {
            // Sub-nanosecond precision cannot be represented; truncate toward zero.
            let scale_down = (-9i128) - (exponent as i128);
            if scale_down >= 19 {
                0
            } else {
                coefficient / 10i64.pow(scale_down as u32)
            }
        };
        if !(0..NANOSECONDS_PER_SECOND).contains(&nanoseconds) {
            return decoding_error("a timestamp's fractional seconds are out of range");
        }
    }

    build_datetime(
        offset_minutes,
        year,
        month,
        day,
        hour,
        minute,
        second,
        nanoseconds as u32,
    )
}

#[allow(clippy::too_many_arguments)]
fn build_datetime(
    offset_minutes: i64,
    year: u64,
    month: u64,
    day: u64,
    hour: u64,
    minute: u64,
    second: u64,
    nanoseconds: u32,
) -> IonResult<DateTime<FixedOffset>> {
    let naive_utc = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
        .and_then(|date| date.and_hms_nano_opt(hour as u32, minute as u32, second as u32, nanoseconds))
        .ok_or_else(|| {
            crate::result::decoding_error_raw(format!(
                "found a timestamp with illegal component values: \
                 {year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}"
            ))
        })?;
    let offset = offset_minutes
        .checked_mul(60)
        .and_then(|seconds| i32::try_from(seconds).ok())
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| {
            crate::result::decoding_error_raw(format!(
                "found a timestamp with an out-of-range offset: {offset_minutes} minutes"
            ))
        })?;
    Ok(offset.from_utc_datetime(&naive_utc))
}
