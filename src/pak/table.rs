//! Virtual file table: virtual paths mapped to deferred content sources

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::io::resolve_window;

/// Where an entry's bytes come from when they are finally needed.
///
/// The variants make invalid field combinations unrepresentable: an
/// archive window always has both bounds, a buffer has none.
#[derive(Debug, Clone)]
pub enum ContentSource {
    /// A window into the owning archive's own file, carried forward from
    /// load. Resolved through the archive's open stream.
    Archive {
        /// Byte offset of the body inside the archive.
        offset: u64,
        /// Body length in bytes.
        length: u64,
    },
    /// A file on the host filesystem, opened read-only when resolved.
    Path {
        /// Host path to read from.
        path: PathBuf,
        /// Window start; the file's start when absent.
        offset: Option<u64>,
        /// Window length; the rest of the file when absent.
        length: Option<u64>,
    },
    /// An open file handle. Ownership stays with the caller; the table
    /// never closes it.
    Handle {
        /// Shared handle to read from.
        file: Arc<File>,
        /// Window start; the file's start when absent.
        offset: Option<u64>,
        /// Window length; the rest of the file when absent.
        length: Option<u64>,
    },
    /// In-memory content, used as-is.
    Buffer(Vec<u8>),
}

impl ContentSource {
    /// Short name of the source kind, as reported in save progress.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ContentSource::Archive { .. } => "archive",
            ContentSource::Path { .. } => "path",
            ContentSource::Handle { .. } => "handle",
            ContentSource::Buffer(_) => "buffer",
        }
    }
}

/// Read a window of `file` into memory, defaulting a missing length to
/// everything from the offset to the end.
pub(crate) fn read_file_window(
    file: &File,
    offset: Option<u64>,
    length: Option<u64>,
) -> Result<Vec<u8>> {
    let size = file.metadata()?.len();
    let (offset, length) = resolve_window(size, offset, length)?;
    let length = usize::try_from(length)
        .map_err(|_| Error::InvalidArgument(format!("window of {length} bytes is unaddressable")))?;

    let mut reader = file;
    reader.seek(SeekFrom::Start(offset))?;
    let mut bytes = vec![0u8; length];
    reader.read_exact(&mut bytes)?;
    Ok(bytes)
}

/// In-memory mapping from virtual paths to content sources.
///
/// Listing order is insertion order and is stable across calls that do
/// not mutate the table. Saving an archive writes bodies in this order.
#[derive(Debug, Clone, Default)]
pub struct VirtualFileTable {
    entries: IndexMap<String, ContentSource>,
}

impl VirtualFileTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Enumerate the virtual paths.
    #[must_use]
    pub fn list(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Whether a virtual path has an entry.
    #[must_use]
    pub fn exists(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// The content source registered under a virtual path.
    #[must_use]
    pub fn source(&self, path: &str) -> Option<&ContentSource> {
        self.entries.get(path)
    }

    /// Register `source` under `path`, fully replacing any previous
    /// mapping.
    pub fn set(&mut self, path: impl Into<String>, source: ContentSource) {
        self.entries.insert(path.into(), source);
    }

    /// Remove the entry under `path`. Absent paths are not an error;
    /// returns whether an entry was removed.
    pub fn delete(&mut self, path: &str) -> bool {
        self.entries.shift_remove(path).is_some()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate `(path, source)` pairs in listing order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContentSource)> {
        self.entries.iter().map(|(path, source)| (path.as_str(), source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_list_delete() {
        let mut table = VirtualFileTable::new();
        table.set("/b.txt", ContentSource::Buffer(b"b".to_vec()));
        table.set("/a.txt", ContentSource::Buffer(b"a".to_vec()));

        assert_eq!(table.list(), vec!["/b.txt", "/a.txt"]);
        assert!(table.exists("/a.txt"));
        assert!(!table.exists("/c.txt"));

        assert!(table.delete("/b.txt"));
        assert!(!table.delete("/b.txt"));
        assert_eq!(table.list(), vec!["/a.txt"]);
    }

    #[test]
    fn test_set_replaces_whole_source() {
        let mut table = VirtualFileTable::new();
        table.set(
            "/x",
            ContentSource::Archive {
                offset: 16,
                length: 4,
            },
        );
        table.set("/x", ContentSource::Buffer(b"xyz".to_vec()));

        assert_eq!(table.len(), 1);
        match table.source("/x").unwrap() {
            ContentSource::Buffer(bytes) => assert_eq!(bytes, b"xyz"),
            other => panic!("unexpected source: {other:?}"),
        }
    }

    #[test]
    fn test_source_kinds() {
        assert_eq!(
            ContentSource::Archive {
                offset: 0,
                length: 0
            }
            .kind(),
            "archive"
        );
        assert_eq!(ContentSource::Buffer(Vec::new()).kind(), "buffer");
    }

    #[test]
    fn test_read_file_window() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("window.bin");
        std::fs::write(&path, b"0123456789").unwrap();
        let file = File::open(&path).unwrap();

        assert_eq!(read_file_window(&file, Some(3), Some(4)).unwrap(), b"3456");
        assert_eq!(read_file_window(&file, Some(6), None).unwrap(), b"6789");
        assert_eq!(read_file_window(&file, None, None).unwrap(), b"0123456789");
        assert!(read_file_window(&file, Some(6), Some(5)).is_err());
    }
}
