//! Archive header and metatable parsing and building

use byteorder::{BigEndian, WriteBytesExt};

use super::{FileTableEntry, INDEX_MARKER, MAGIC};
use crate::error::{Error, Result};
use crate::io::{MemorySink, ReadStream, Sink};
use crate::sbon::{self, ValueMap};

/// A parsed metatable: the free-form metadata map plus the ordered file
/// table.
#[derive(Debug, Clone, Default)]
pub struct Metatable {
    /// Free-form SBON metadata.
    pub metadata: ValueMap,
    /// File-table records in archive order. Duplicate paths are kept
    /// as read; mappings built from them keep the last occurrence.
    pub entries: Vec<FileTableEntry>,
}

/// Read the 16-byte archive header and return the metatable offset.
///
/// # Errors
/// Returns [`Error::NotAnArchive`] if the first 8 bytes are not the
/// `SBAsset6` magic, and [`Error::OutOfBounds`] on a source shorter than
/// the header.
pub fn read_header<S: ReadStream + ?Sized>(stream: &mut S) -> Result<u64> {
    stream.seek_absolute(0)?;
    let magic = stream.read(MAGIC.len())?;
    if magic != MAGIC {
        return Err(Error::NotAnArchive);
    }
    stream.read_u64_be()
}

/// Read the metatable at `offset`: the `INDEX` marker, the metadata map,
/// and the file table.
///
/// # Errors
/// Returns [`Error::CorruptMetatable`] if the marker is missing or the
/// body is truncated or undecodable.
pub fn read_metatable<S: ReadStream + ?Sized>(stream: &mut S, offset: u64) -> Result<Metatable> {
    stream
        .seek_absolute(offset)
        .map_err(|_| Error::CorruptMetatable(format!("metatable offset {offset} is past the end")))?;

    let marker = stream.read(INDEX_MARKER.len()).map_err(as_corrupt)?;
    if marker != INDEX_MARKER {
        return Err(Error::CorruptMetatable(
            "INDEX marker not found at metatable offset".to_string(),
        ));
    }

    let metadata = sbon::read_map(stream).map_err(as_corrupt)?;
    let count = sbon::read_varint(stream).map_err(as_corrupt)?;

    let mut entries = Vec::with_capacity(usize::try_from(count.min(4096)).unwrap_or(0));
    for _ in 0..count {
        let path = sbon::read_string(stream).map_err(as_corrupt)?;
        let offset = stream.read_u64_be().map_err(as_corrupt)?;
        let length = stream.read_u64_be().map_err(as_corrupt)?;
        entries.push(FileTableEntry {
            path,
            offset,
            length,
        });
    }

    Ok(Metatable { metadata, entries })
}

// Inside the metatable, SBON and truncation failures all mean the same
// thing to the caller: the pointer landed on something unusable.
fn as_corrupt(err: Error) -> Error {
    match err {
        Error::MalformedSbon(message) => Error::CorruptMetatable(message),
        Error::OutOfBounds(message) => {
            Error::CorruptMetatable(format!("truncated metatable: {message}"))
        }
        other => other,
    }
}

/// Serialize a metatable: the `INDEX` marker, the metadata map, the
/// entry count, then each `(path, offset, length)` record.
///
/// # Errors
/// Returns [`Error::Io`] on write failure.
///
/// [`Error::Io`]: crate::Error::Io
pub fn build_metatable(metadata: &ValueMap, entries: &[FileTableEntry]) -> Result<Vec<u8>> {
    let mut sink = MemorySink::new();
    sink.append(&INDEX_MARKER)?;
    sbon::write_map(&mut sink, metadata)?;
    sbon::write_varint(&mut sink, entries.len() as u64)?;
    for entry in entries {
        sbon::write_string(&mut sink, &entry.path)?;
        sink.write_u64::<BigEndian>(entry.offset)?;
        sink.write_u64::<BigEndian>(entry.length)?;
    }
    Ok(sink.into_inner())
}
