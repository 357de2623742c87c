//! SBON decoding against a byte stream

use super::{
    Value, ValueMap, DEFAULT_MAX_DEPTH, TAG_BOOLEAN, TAG_DOUBLE, TAG_INT, TAG_LIST, TAG_MAP,
    TAG_NULL, TAG_STRING,
};
use crate::error::{Error, Result};
use crate::io::ReadStream;

/// Read an unsigned varint: big-endian base-128, top bit set on every
/// byte except the last.
///
/// # Errors
/// Returns [`Error::MalformedSbon`] if the value would exceed 64 bits and
/// [`Error::OutOfBounds`] on a truncated stream.
pub fn read_varint<S: ReadStream + ?Sized>(stream: &mut S) -> Result<u64> {
    let mut value: u64 = 0;
    loop {
        let byte = stream.read_u8()?;
        if value > u64::MAX >> 7 {
            return Err(Error::MalformedSbon(
                "varint does not fit in 64 bits".to_string(),
            ));
        }
        value = (value << 7) | u64::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
}

/// Read a signed varint: the unsigned varint `u` decodes to `u >> 1`,
/// negated and offset by one when the low bit is set.
///
/// # Errors
/// Propagates the failures of [`read_varint`].
pub fn read_signed_varint<S: ReadStream + ?Sized>(stream: &mut S) -> Result<i64> {
    let encoded = read_varint(stream)?;
    let magnitude = (encoded >> 1) as i64;
    if encoded & 1 == 0 {
        Ok(magnitude)
    } else {
        Ok(-magnitude - 1)
    }
}

/// Read a varint-length-prefixed byte string.
///
/// # Errors
/// Returns [`Error::OutOfBounds`] if the stream holds fewer bytes than
/// the prefix promises.
pub fn read_bytes<S: ReadStream + ?Sized>(stream: &mut S) -> Result<Vec<u8>> {
    let length = read_varint(stream)?;
    if length == 0 {
        return Ok(Vec::new());
    }
    let length = usize::try_from(length)
        .map_err(|_| Error::MalformedSbon(format!("byte string length {length} is unaddressable")))?;
    stream.read(length)
}

/// Read a varint-length-prefixed UTF-8 string.
///
/// # Errors
/// Returns [`Error::MalformedSbon`] on invalid UTF-8; no replacement
/// characters are ever substituted.
pub fn read_string<S: ReadStream + ?Sized>(stream: &mut S) -> Result<String> {
    String::from_utf8(read_bytes(stream)?)
        .map_err(|_| Error::MalformedSbon("string is not valid UTF-8".to_string()))
}

/// Read a dynamic value with the default depth limit.
///
/// # Errors
/// Returns [`Error::MalformedSbon`] for unknown tags, invalid boolean
/// bytes, invalid UTF-8, or nesting beyond [`DEFAULT_MAX_DEPTH`].
pub fn read_dynamic<S: ReadStream + ?Sized>(stream: &mut S) -> Result<Value> {
    read_dynamic_with_depth(stream, DEFAULT_MAX_DEPTH)
}

/// Read a dynamic value, allowing at most `max_depth` nesting levels.
///
/// # Errors
/// As [`read_dynamic`], with the caller's depth limit.
pub fn read_dynamic_with_depth<S: ReadStream + ?Sized>(
    stream: &mut S,
    max_depth: usize,
) -> Result<Value> {
    if max_depth == 0 {
        return Err(Error::MalformedSbon(
            "value nesting exceeds the depth limit".to_string(),
        ));
    }
    let tag = stream.read_u8()?;
    match tag {
        TAG_NULL => Ok(Value::Null),
        TAG_DOUBLE => {
            let bits = stream.read_u64_be()?;
            Ok(Value::Double(f64::from_bits(bits)))
        }
        TAG_BOOLEAN => match stream.read_u8()? {
            0x00 => Ok(Value::Bool(false)),
            0x01 => Ok(Value::Bool(true)),
            byte => Err(Error::MalformedSbon(format!(
                "invalid boolean byte {byte:#04x}"
            ))),
        },
        TAG_INT => Ok(Value::Int(read_signed_varint(stream)?)),
        TAG_STRING => Ok(Value::String(read_string(stream)?)),
        TAG_LIST => Ok(Value::List(read_list_with_depth(stream, max_depth)?)),
        TAG_MAP => Ok(Value::Map(read_map_with_depth(stream, max_depth)?)),
        tag => Err(Error::MalformedSbon(format!(
            "unknown dynamic value tag {tag}"
        ))),
    }
}

/// Read a bare list (varint count, then that many dynamic values) with
/// the default depth limit.
///
/// # Errors
/// As [`read_dynamic`].
pub fn read_list<S: ReadStream + ?Sized>(stream: &mut S) -> Result<Vec<Value>> {
    read_list_with_depth(stream, DEFAULT_MAX_DEPTH)
}

/// Read a bare list, allowing at most `max_depth` nesting levels.
///
/// # Errors
/// As [`read_dynamic`].
pub fn read_list_with_depth<S: ReadStream + ?Sized>(
    stream: &mut S,
    max_depth: usize,
) -> Result<Vec<Value>> {
    if max_depth == 0 {
        return Err(Error::MalformedSbon(
            "value nesting exceeds the depth limit".to_string(),
        ));
    }
    let count = read_varint(stream)?;
    let mut values = Vec::with_capacity(collection_capacity(count));
    for _ in 0..count {
        values.push(read_dynamic_with_depth(stream, max_depth - 1)?);
    }
    Ok(values)
}

/// Read a bare map (varint count, then string-keyed dynamic values) with
/// the default depth limit. Duplicate keys keep the last value.
///
/// # Errors
/// As [`read_dynamic`].
pub fn read_map<S: ReadStream + ?Sized>(stream: &mut S) -> Result<ValueMap> {
    read_map_with_depth(stream, DEFAULT_MAX_DEPTH)
}

/// Read a bare map, allowing at most `max_depth` nesting levels.
///
/// # Errors
/// As [`read_dynamic`].
pub fn read_map_with_depth<S: ReadStream + ?Sized>(
    stream: &mut S,
    max_depth: usize,
) -> Result<ValueMap> {
    if max_depth == 0 {
        return Err(Error::MalformedSbon(
            "value nesting exceeds the depth limit".to_string(),
        ));
    }
    let count = read_varint(stream)?;
    let mut map = ValueMap::with_capacity(collection_capacity(count));
    for _ in 0..count {
        let key = read_string(stream)?;
        let value = read_dynamic_with_depth(stream, max_depth - 1)?;
        if map.insert(key.clone(), value).is_some() {
            tracing::warn!(key = %key, "duplicate map key, keeping the last value");
        }
    }
    Ok(map)
}

// Counts come off the wire; never preallocate more than a sane cap.
fn collection_capacity(count: u64) -> usize {
    usize::try_from(count.min(4096)).unwrap_or(4096)
}
