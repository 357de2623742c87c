//! SBAsset6 PAK archive reader/writer
//!
//! An SBAsset6 file is a flat container: 16 bytes of header (magic plus a
//! pointer), the file bodies back to back, and a trailing metatable that
//! carries a free-form SBON metadata map and the file table. Saving
//! streams every entry into a sibling temp file, appends a fresh
//! metatable, back-patches the header pointer, and renames over the
//! original.

mod archive;
mod creator;
mod extractor;
mod metatable;
mod table;
mod types;

pub use archive::PakArchive;
pub use creator::{create_pak, create_pak_with_progress};
pub use extractor::{extract_pak, extract_pak_with_progress};
pub use metatable::{build_metatable, read_header, read_metatable, Metatable};
pub use table::{ContentSource, VirtualFileTable};
pub use types::{FileTableEntry, LoadReport, PakPhase, PakProgress, ProgressCallback};

pub(crate) const MAGIC: [u8; 8] = *b"SBAsset6";
pub(crate) const INDEX_MARKER: [u8; 5] = *b"INDEX";
