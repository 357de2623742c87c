//! The SBAsset6 archive handle

use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use super::metatable::{build_metatable, read_header, read_metatable};
use super::table::{read_file_window, ContentSource, VirtualFileTable};
use super::types::{FileTableEntry, LoadReport, PakPhase, PakProgress, ProgressCallback};
use super::MAGIC;
use crate::error::{Error, Result};
use crate::io::{FileSink, FileStream, Pipeline, PumpSource, ReadStream};
use crate::sbon::ValueMap;

/// Handle to one SBAsset6 archive on disk.
///
/// A handle starts out fresh: no stream, an empty metadata map, an empty
/// file table. [`load`] opens the archive and registers every existing
/// entry as an [`ContentSource::Archive`] window; mutations then go
/// through [`metadata_mut`] and [`files_mut`]; [`save`] rewrites the
/// whole archive to a sibling temp file, renames it over the original,
/// and reloads. Saving a fresh handle is how archives are created from
/// scratch.
///
/// [`load`]: PakArchive::load
/// [`save`]: PakArchive::save
/// [`metadata_mut`]: PakArchive::metadata_mut
/// [`files_mut`]: PakArchive::files_mut
#[derive(Debug)]
pub struct PakArchive {
    path: PathBuf,
    stream: Option<FileStream>,
    metatable_offset: Option<u64>,
    metadata: ValueMap,
    files: VirtualFileTable,
}

impl PakArchive {
    /// Create a fresh, unloaded handle for `path`. The file need not
    /// exist yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            stream: None,
            metatable_offset: None,
            metadata: ValueMap::new(),
            files: VirtualFileTable::new(),
        }
    }

    /// Create a handle for `path` and load it.
    ///
    /// # Errors
    /// As [`PakArchive::load`].
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let mut archive = Self::new(path);
        archive.load()?;
        Ok(archive)
    }

    /// The host path this handle reads from and saves to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether an archive stream is currently open.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.stream.is_some()
    }

    /// Byte position of the `INDEX` marker, when loaded.
    #[must_use]
    pub fn metatable_offset(&self) -> Option<u64> {
        self.metatable_offset
    }

    /// The free-form metadata map.
    #[must_use]
    pub fn metadata(&self) -> &ValueMap {
        &self.metadata
    }

    /// Mutable access to the metadata map.
    pub fn metadata_mut(&mut self) -> &mut ValueMap {
        &mut self.metadata
    }

    /// Replace the metadata map.
    pub fn set_metadata(&mut self, metadata: ValueMap) {
        self.metadata = metadata;
    }

    /// The virtual file table.
    #[must_use]
    pub fn files(&self) -> &VirtualFileTable {
        &self.files
    }

    /// Mutable access to the virtual file table.
    pub fn files_mut(&mut self) -> &mut VirtualFileTable {
        &mut self.files
    }

    /// Number of entries in the virtual file table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the virtual file table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Load the archive: verify the header, parse the metatable, and
    /// register every entry in the virtual file table.
    ///
    /// # Errors
    /// Returns [`Error::NotAnArchive`] on a bad magic,
    /// [`Error::CorruptMetatable`] on an unusable metatable, and
    /// [`Error::Io`] if the file cannot be opened.
    ///
    /// [`Error::Io`]: crate::Error::Io
    pub fn load(&mut self) -> Result<LoadReport> {
        self.load_with_progress(&|_| {})
    }

    /// Load the archive, reporting each step to `progress`.
    ///
    /// # Errors
    /// As [`PakArchive::load`].
    pub fn load_with_progress(&mut self, progress: ProgressCallback<'_>) -> Result<LoadReport> {
        let target = self.path.display().to_string();
        progress(&PakProgress::with_file(PakPhase::LoadStart, 0, 0, target));

        let mut stream = FileStream::open(&self.path)?;
        let metatable_offset = read_header(&mut stream)?;
        progress(&PakProgress::new(PakPhase::LoadHeader, 0, 0));

        let metatable = read_metatable(&mut stream, metatable_offset)?;
        progress(&PakProgress::new(PakPhase::LoadMetatable, 0, 0));

        let total = metatable.entries.len();
        progress(&PakProgress::new(PakPhase::LoadFiles, 0, total));

        let mut files = VirtualFileTable::new();
        for (index, entry) in metatable.entries.into_iter().enumerate() {
            progress(&PakProgress::with_file(
                PakPhase::LoadFileProgress,
                index + 1,
                total,
                entry.path.clone(),
            ));
            if files.exists(&entry.path) {
                tracing::warn!(path = %entry.path, "duplicate file table entry, keeping the last");
            }
            files.set(
                entry.path,
                ContentSource::Archive {
                    offset: entry.offset,
                    length: entry.length,
                },
            );
        }

        let files_registered = files.len();
        self.stream = Some(stream);
        self.metatable_offset = Some(metatable_offset);
        self.metadata = metatable.metadata;
        self.files = files;

        progress(&PakProgress::new(PakPhase::LoadDone, 0, 0));
        tracing::debug!(
            archive = %self.path.display(),
            files = files_registered,
            metatable_offset,
            "loaded archive"
        );

        Ok(LoadReport {
            files: files_registered,
            metatable_offset,
        })
    }

    /// Read `length` bytes at `offset` from the open archive stream.
    ///
    /// # Errors
    /// Returns [`Error::NotLoaded`] if no stream is open and
    /// [`Error::OutOfBounds`] if the window leaves the file.
    pub fn read_window(&mut self, offset: u64, length: u64) -> Result<Vec<u8>> {
        let stream = self.stream.as_mut().ok_or(Error::NotLoaded)?;
        stream.seek_absolute(offset)?;
        if length == 0 {
            return Ok(Vec::new());
        }
        let length = usize::try_from(length).map_err(|_| {
            Error::InvalidArgument(format!("window of {length} bytes is unaddressable"))
        })?;
        stream.read(length)
    }

    /// Resolve the entry under `path` to its full content.
    ///
    /// # Errors
    /// Returns [`Error::FileNotFoundInPak`] for unknown paths,
    /// [`Error::NotLoaded`] if the entry is an archive window but no
    /// stream is open, and [`Error::Io`] for host-file failures.
    ///
    /// [`Error::Io`]: crate::Error::Io
    pub fn get(&mut self, path: &str) -> Result<Vec<u8>> {
        let source = self
            .files
            .source(path)
            .ok_or_else(|| Error::FileNotFoundInPak(path.to_string()))?;

        match source {
            ContentSource::Archive { offset, length } => {
                let (offset, length) = (*offset, *length);
                self.read_window(offset, length)
            }
            ContentSource::Buffer(bytes) => Ok(bytes.clone()),
            ContentSource::Handle {
                file,
                offset,
                length,
            } => read_file_window(file, *offset, *length),
            ContentSource::Path {
                path,
                offset,
                length,
            } => {
                let file = File::open(path)?;
                read_file_window(&file, *offset, *length)
            }
        }
    }

    /// Rewrite the archive from the current metadata and file table,
    /// then reload it.
    ///
    /// The rewrite streams into `<path>.tmp` and renames over the
    /// original only after the metatable is in place, so a failed save
    /// leaves the original untouched (and the temp file behind).
    ///
    /// # Errors
    /// Returns [`Error::NotLoaded`] if an entry still references the
    /// archive but no stream is open, [`Error::InvalidArgument`] for
    /// content windows that exceed their source, and [`Error::Io`] for
    /// host failures.
    ///
    /// [`Error::Io`]: crate::Error::Io
    pub fn save(&mut self) -> Result<LoadReport> {
        self.save_with_progress(&|_| {})
    }

    /// Rewrite the archive, reporting each step to `progress`.
    ///
    /// # Errors
    /// As [`PakArchive::save`].
    pub fn save_with_progress(&mut self, progress: ProgressCallback<'_>) -> Result<LoadReport> {
        let target = self.path.display().to_string();
        progress(&PakProgress::with_file(PakPhase::SaveStart, 0, 0, target));
        tracing::info!(
            archive = %self.path.display(),
            files = self.files.len(),
            "saving archive"
        );

        let tmp_path = tmp_save_path(&self.path);
        let mut sink = FileSink::create(&tmp_path)?;
        let metatable_offset;
        {
            let mut pipeline = Pipeline::new(&mut sink);
            pipeline.pump(PumpSource::Bytes(&MAGIC), None, None)?;
            pipeline.pump(PumpSource::Bytes(&[0u8; 8]), None, None)?;
            progress(&PakProgress::new(PakPhase::SaveHeader, 0, 0));

            let total = self.files.len();
            progress(&PakProgress::new(PakPhase::SaveFiles, 0, total));

            let mut entries = Vec::with_capacity(total);
            for (index, (path, source)) in self.files.iter().enumerate() {
                progress(&PakProgress {
                    phase: PakPhase::SaveFileProgress,
                    current: index + 1,
                    total,
                    current_file: Some(path.to_string()),
                    source_kind: Some(source.kind()),
                });

                let (offset, length) = match source {
                    ContentSource::Archive { offset, length } => {
                        let stream = self.stream.as_ref().ok_or(Error::NotLoaded)?;
                        pipeline.pump(
                            PumpSource::Handle(stream.file()),
                            Some(*offset),
                            Some(*length),
                        )?
                    }
                    ContentSource::Buffer(bytes) => {
                        pipeline.pump(PumpSource::Bytes(bytes), None, None)?
                    }
                    ContentSource::Handle {
                        file,
                        offset,
                        length,
                    } => pipeline.pump(PumpSource::Handle(file), *offset, *length)?,
                    ContentSource::Path {
                        path: source_path,
                        offset,
                        length,
                    } => pipeline.pump(PumpSource::Path(source_path), *offset, *length)?,
                };
                entries.push(FileTableEntry {
                    path: path.to_string(),
                    offset,
                    length,
                });
            }

            metatable_offset = pipeline.position();
            let metatable = build_metatable(&self.metadata, &entries)?;
            pipeline.pump(PumpSource::Bytes(&metatable), None, None)?;
            progress(&PakProgress::new(PakPhase::SaveMetatable, 0, 0));
        }

        // Patch the header pointer while the sink is still open.
        sink.patch(&metatable_offset.to_be_bytes(), 8)?;
        sink.finish()?;

        self.close_with_progress(progress);

        if let Err(err) = fs::rename(&tmp_path, &self.path) {
            tracing::debug!(error = %err, "rename failed, falling back to copy and unlink");
            fs::copy(&tmp_path, &self.path)?;
            fs::remove_file(&tmp_path)?;
        }

        let report = self.load_with_progress(progress)?;
        progress(&PakProgress::new(PakPhase::SaveDone, 0, 0));
        tracing::info!(
            archive = %self.path.display(),
            files = report.files,
            "archive saved"
        );
        Ok(report)
    }

    /// Close the archive stream and clear all loaded state. Idempotent;
    /// the handle can be repopulated and saved again afterwards.
    pub fn close(&mut self) {
        self.close_with_progress(&|_| {});
    }

    /// Close the archive, reporting the step to `progress`.
    pub fn close_with_progress(&mut self, progress: ProgressCallback<'_>) {
        if self.stream.take().is_some() {
            tracing::debug!(archive = %self.path.display(), "closed archive stream");
        }
        self.metatable_offset = None;
        self.metadata = ValueMap::new();
        self.files = VirtualFileTable::new();
        progress(&PakProgress::new(PakPhase::Closed, 0, 0));
    }
}

fn tmp_save_path(path: &Path) -> PathBuf {
    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_handle_state() {
        let archive = PakArchive::new("/nonexistent/thing.pak");
        assert!(!archive.is_loaded());
        assert!(archive.metadata().is_empty());
        assert!(archive.is_empty());
        assert_eq!(archive.len(), 0);
        assert_eq!(archive.metatable_offset(), None);
    }

    #[test]
    fn test_read_window_requires_load() {
        let mut archive = PakArchive::new("/nonexistent/thing.pak");
        assert!(matches!(
            archive.read_window(0, 1),
            Err(Error::NotLoaded)
        ));
    }

    #[test]
    fn test_get_unknown_path() {
        let mut archive = PakArchive::new("/nonexistent/thing.pak");
        match archive.get("/missing.txt") {
            Err(Error::FileNotFoundInPak(path)) => assert_eq!(path, "/missing.txt"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut archive = PakArchive::new("/nonexistent/thing.pak");
        archive.close();
        archive.close();
        assert!(!archive.is_loaded());
    }

    #[test]
    fn test_tmp_save_path_appends_suffix() {
        assert_eq!(
            tmp_save_path(Path::new("/mods/cool.pak")),
            Path::new("/mods/cool.pak.tmp")
        );
    }
}
