//! Streaming copies from content sources into a sink

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{Error, Result};
use crate::io::Sink;

/// A source of bytes for [`Pipeline::pump`].
#[derive(Debug)]
pub enum PumpSource<'a> {
    /// An in-memory block, always copied whole.
    Bytes(&'a [u8]),
    /// An open file handle; ownership stays with the caller.
    Handle(&'a File),
    /// A host path, opened read-only for the duration of the pump.
    Path(&'a Path),
}

/// Turn an optional `(offset, length)` window into a concrete one.
///
/// A missing offset means the start of the source; a missing length means
/// everything from the offset to the end (`size - offset`).
///
/// # Errors
/// Returns [`Error::InvalidArgument`] if the window does not fit inside
/// `size`.
pub(crate) fn resolve_window(
    size: u64,
    offset: Option<u64>,
    length: Option<u64>,
) -> Result<(u64, u64)> {
    let offset = offset.unwrap_or(0);
    if offset > size {
        return Err(Error::InvalidArgument(format!(
            "window offset {offset} exceeds source size {size}"
        )));
    }
    let length = length.unwrap_or(size - offset);
    match offset.checked_add(length) {
        Some(end) if end <= size => Ok((offset, length)),
        _ => Err(Error::InvalidArgument(format!(
            "window of {length} bytes at offset {offset} exceeds source size {size}"
        ))),
    }
}

/// Pumps bytes from content sources into a sink, reporting where each
/// body landed.
#[derive(Debug)]
pub struct Pipeline<'a, S: Sink> {
    sink: &'a mut S,
}

impl<'a, S: Sink> Pipeline<'a, S> {
    /// Wrap a sink.
    pub fn new(sink: &'a mut S) -> Self {
        Self { sink }
    }

    /// The sink's current write position.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.sink.position()
    }

    /// Copy `source` into the sink, honoring an optional window, and
    /// return `(offset_written_at, bytes_written)`.
    ///
    /// The window is ignored for [`PumpSource::Bytes`]. File sources are
    /// validated against their statted size up front; a source shorter
    /// than the requested window fails rather than truncating.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if the window exceeds the source
    /// and [`Error::Io`] for underlying read or write failures.
    pub fn pump(
        &mut self,
        source: PumpSource<'_>,
        offset: Option<u64>,
        length: Option<u64>,
    ) -> Result<(u64, u64)> {
        let start = self.sink.position();
        let wrote = match source {
            PumpSource::Bytes(bytes) => {
                self.sink.append(bytes)?;
                bytes.len() as u64
            }
            PumpSource::Handle(file) => self.copy_file_window(file, offset, length)?,
            PumpSource::Path(path) => {
                let file = File::open(path)?;
                self.copy_file_window(&file, offset, length)?
            }
        };
        Ok((start, wrote))
    }

    fn copy_file_window(
        &mut self,
        file: &File,
        offset: Option<u64>,
        length: Option<u64>,
    ) -> Result<u64> {
        let size = file.metadata()?.len();
        let (offset, length) = resolve_window(size, offset, length)?;
        if length == 0 {
            return Ok(0);
        }

        let mut reader = file;
        reader.seek(SeekFrom::Start(offset))?;
        let copied = io::copy(&mut reader.take(length), &mut self.sink)?;
        if copied != length {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("source yielded {copied} of {length} requested bytes"),
            )));
        }
        Ok(copied)
    }
}
