//! Append-only byte sinks with position tracking

use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{Error, Result};

/// An append-only byte sink that knows its write position.
///
/// Both variants also implement [`std::io::Write`], so `byteorder` and
/// [`std::io::copy`] work against them directly.
pub trait Sink: Write {
    /// Append `bytes` and return the new end position.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the underlying write fails.
    fn append(&mut self, bytes: &[u8]) -> Result<u64>;

    /// Bytes written so far.
    fn position(&self) -> u64;
}

/// Sink backed by a growing in-memory block.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buf: Vec<u8>,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// View the written bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Recover the written block.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Sink for MemorySink {
    fn append(&mut self, bytes: &[u8]) -> Result<u64> {
        self.buf.extend_from_slice(bytes);
        Ok(self.buf.len() as u64)
    }

    fn position(&self) -> u64 {
        self.buf.len() as u64
    }
}

/// Sink backed by an output file, with support for back-patching bytes
/// that were already written.
#[derive(Debug)]
pub struct FileSink {
    file: File,
    position: u64,
}

impl FileSink {
    /// Create (or truncate) the file at `path`.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(path)?;
        Ok(Self { file, position: 0 })
    }

    /// Overwrite `bytes` at `offset` without moving the append cursor.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if the patched range does not lie
    /// within the bytes already written, or [`Error::Io`] on write failure.
    pub fn patch(&mut self, bytes: &[u8], offset: u64) -> Result<()> {
        match offset.checked_add(bytes.len() as u64) {
            Some(end) if end <= self.position => {}
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "patch of {} bytes at offset {offset} lies outside the {} bytes written",
                    bytes.len(),
                    self.position
                )))
            }
        }
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(bytes)?;
        self.file.seek(SeekFrom::Start(self.position))?;
        Ok(())
    }

    /// Flush and close the sink.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the final flush fails.
    pub fn finish(mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.file.write(buf)?;
        self.position += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Sink for FileSink {
    fn append(&mut self, bytes: &[u8]) -> Result<u64> {
        self.file.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(self.position)
    }

    fn position(&self) -> u64 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_positions() {
        let mut sink = MemorySink::new();
        assert_eq!(sink.position(), 0);
        assert_eq!(sink.append(b"abc").unwrap(), 3);
        assert_eq!(sink.append(b"de").unwrap(), 5);
        assert_eq!(sink.as_slice(), b"abcde");
    }

    #[test]
    fn test_file_sink_append_and_patch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sink.bin");

        let mut sink = FileSink::create(&path).unwrap();
        sink.append(b"hello placeholder").unwrap();
        sink.patch(b"PATCH", 6).unwrap();
        // The append cursor must be unaffected by the patch.
        assert_eq!(sink.position(), 17);
        sink.append(b"!").unwrap();
        sink.finish().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"hello PATCHholder!");
    }

    #[test]
    fn test_file_sink_patch_outside_written_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sink.bin");

        let mut sink = FileSink::create(&path).unwrap();
        sink.append(b"1234").unwrap();
        assert!(matches!(
            sink.patch(b"xx", 3),
            Err(Error::InvalidArgument(_))
        ));
    }
}
