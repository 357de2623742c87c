//! SBON encoding into any `io::Write`

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};

use super::{
    Value, ValueMap, TAG_BOOLEAN, TAG_DOUBLE, TAG_INT, TAG_LIST, TAG_MAP, TAG_NULL, TAG_STRING,
};
use crate::error::Result;

/// Write an unsigned varint.
///
/// # Errors
/// Returns [`Error::Io`] on write failure.
///
/// [`Error::Io`]: crate::Error::Io
pub fn write_varint<W: Write + ?Sized>(writer: &mut W, value: u64) -> Result<()> {
    let mut buf = [0u8; 10];
    let mut index = buf.len() - 1;
    let mut value = value;

    buf[index] = (value & 0x7F) as u8;
    value >>= 7;
    while value > 0 {
        index -= 1;
        buf[index] = 0x80 | (value & 0x7F) as u8;
        value >>= 7;
    }

    writer.write_all(&buf[index..])?;
    Ok(())
}

/// Write a signed varint: `n >= 0` encodes as `n << 1`, `n < 0` as
/// `((-n - 1) << 1) | 1`.
///
/// # Errors
/// Returns [`Error::Io`] on write failure.
///
/// [`Error::Io`]: crate::Error::Io
pub fn write_signed_varint<W: Write + ?Sized>(writer: &mut W, value: i64) -> Result<()> {
    let encoded = if value < 0 {
        ((-(value + 1)) as u64) << 1 | 1
    } else {
        (value as u64) << 1
    };
    write_varint(writer, encoded)
}

/// Write a varint-length-prefixed byte string.
///
/// # Errors
/// Returns [`Error::Io`] on write failure.
///
/// [`Error::Io`]: crate::Error::Io
pub fn write_bytes<W: Write + ?Sized>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    write_varint(writer, bytes.len() as u64)?;
    writer.write_all(bytes)?;
    Ok(())
}

/// Write a varint-length-prefixed UTF-8 string.
///
/// # Errors
/// Returns [`Error::Io`] on write failure.
///
/// [`Error::Io`]: crate::Error::Io
pub fn write_string<W: Write + ?Sized>(writer: &mut W, value: &str) -> Result<()> {
    write_bytes(writer, value.as_bytes())
}

/// Write a tagged dynamic value.
///
/// # Errors
/// Returns [`Error::Io`] on write failure.
///
/// [`Error::Io`]: crate::Error::Io
pub fn write_dynamic<W: Write + ?Sized>(writer: &mut W, value: &Value) -> Result<()> {
    match value {
        Value::Null => writer.write_u8(TAG_NULL)?,
        Value::Double(value) => {
            writer.write_u8(TAG_DOUBLE)?;
            writer.write_f64::<BigEndian>(*value)?;
        }
        Value::Bool(value) => {
            writer.write_u8(TAG_BOOLEAN)?;
            writer.write_u8(u8::from(*value))?;
        }
        Value::Int(value) => {
            writer.write_u8(TAG_INT)?;
            write_signed_varint(writer, *value)?;
        }
        Value::String(value) => {
            writer.write_u8(TAG_STRING)?;
            write_string(writer, value)?;
        }
        Value::List(values) => {
            writer.write_u8(TAG_LIST)?;
            write_list(writer, values)?;
        }
        Value::Map(map) => {
            writer.write_u8(TAG_MAP)?;
            write_map(writer, map)?;
        }
    }
    Ok(())
}

/// Write a bare list: varint count, then each value as a dynamic.
///
/// # Errors
/// Returns [`Error::Io`] on write failure.
///
/// [`Error::Io`]: crate::Error::Io
pub fn write_list<W: Write + ?Sized>(writer: &mut W, values: &[Value]) -> Result<()> {
    write_varint(writer, values.len() as u64)?;
    for value in values {
        write_dynamic(writer, value)?;
    }
    Ok(())
}

/// Write a bare map in its iteration order: varint count, then
/// string-key / dynamic-value pairs.
///
/// # Errors
/// Returns [`Error::Io`] on write failure.
///
/// [`Error::Io`]: crate::Error::Io
pub fn write_map<W: Write + ?Sized>(writer: &mut W, map: &ValueMap) -> Result<()> {
    write_varint(writer, map.len() as u64)?;
    for (key, value) in map {
        write_string(writer, key)?;
        write_dynamic(writer, value)?;
    }
    Ok(())
}
