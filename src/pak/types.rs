//! Types for PAK archive handling

/// One record of an archive's file table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTableEntry {
    /// Virtual path of the entry inside the archive.
    pub path: String,
    /// Offset of the body from the start of the archive, big-endian u64
    /// on the wire.
    pub offset: u64,
    /// Length of the body in bytes, big-endian u64 on the wire.
    pub length: u64,
}

/// Observable step of a load, save, or close operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PakPhase {
    /// Load began; `current_file` carries the archive path.
    LoadStart,
    /// Header magic and metatable pointer were read.
    LoadHeader,
    /// Metatable was parsed.
    LoadMetatable,
    /// File table size is known; `total` carries the entry count.
    LoadFiles,
    /// One file-table entry was registered.
    LoadFileProgress,
    /// Load finished.
    LoadDone,
    /// Save began; `current_file` carries the archive path.
    SaveStart,
    /// Header magic and pointer placeholder were written.
    SaveHeader,
    /// Body writing begins; `total` carries the entry count.
    SaveFiles,
    /// One entry body was pumped; `source_kind` names its content source.
    SaveFileProgress,
    /// Metatable was appended and the header pointer patched.
    SaveMetatable,
    /// Save finished and the archive was reloaded.
    SaveDone,
    /// The archive stream was closed and in-memory state cleared.
    Closed,
    /// One entry was written to disk during extraction.
    ExtractFileProgress,
}

impl PakPhase {
    /// The dotted event name for this phase.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoadStart => "load.start",
            Self::LoadHeader => "load.header",
            Self::LoadMetatable => "load.metatable",
            Self::LoadFiles => "load.files",
            Self::LoadFileProgress => "load.file.progress",
            Self::LoadDone => "load.done",
            Self::SaveStart => "save.start",
            Self::SaveHeader => "save.header",
            Self::SaveFiles => "save.files",
            Self::SaveFileProgress => "save.file.progress",
            Self::SaveMetatable => "save.metatable",
            Self::SaveDone => "save.done",
            Self::Closed => "close",
            Self::ExtractFileProgress => "extract.file.progress",
        }
    }
}

/// Progress information delivered synchronously during PAK operations.
#[derive(Debug, Clone)]
pub struct PakProgress {
    /// Current operation phase.
    pub phase: PakPhase,
    /// Current item number (1-indexed) for per-file phases, 0 otherwise.
    pub current: usize,
    /// Total number of items for the phase, 0 when not applicable.
    pub total: usize,
    /// The archive path or virtual path the phase concerns.
    pub current_file: Option<String>,
    /// Content-source kind for `save.file.progress`.
    pub source_kind: Option<&'static str>,
}

impl PakProgress {
    /// Create a progress update without file information.
    #[must_use]
    pub fn new(phase: PakPhase, current: usize, total: usize) -> Self {
        Self {
            phase,
            current,
            total,
            current_file: None,
            source_kind: None,
        }
    }

    /// Create a progress update with a file or target name.
    #[must_use]
    pub fn with_file(
        phase: PakPhase,
        current: usize,
        total: usize,
        file: impl Into<String>,
    ) -> Self {
        Self {
            phase,
            current,
            total,
            current_file: Some(file.into()),
            source_kind: None,
        }
    }
}

/// Progress callback for PAK operations.
///
/// Receives a [`PakProgress`] with phase, current/total counts, and an
/// optional file name. Delivery is synchronous from within the call; a
/// single archive handle is never touched from more than one thread, so
/// no `Sync`/`Send` bound is required.
pub type ProgressCallback<'a> = &'a dyn Fn(&PakProgress);

/// Summary returned by a successful load (and by save, which reloads).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// Number of entries registered in the virtual file table.
    pub files: usize,
    /// Byte position of the `INDEX` marker.
    pub metatable_offset: u64,
}
