//! Error types for `starpak`

use thiserror::Error;

/// The error type for `starpak` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Stream Errors ====================
    /// A caller violated an operation's contract (zero-length read,
    /// backwards relative seek on an in-memory stream, a content window
    /// larger than its source, and the like).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A read or seek would leave the readable range of a byte stream.
    #[error("out of bounds: {0}")]
    OutOfBounds(String),

    // ==================== PAK Archive Errors ====================
    /// The file does not start with the `SBAsset6` magic.
    #[error("File does not appear to be SBAsset6 format.")]
    NotAnArchive,

    /// The metatable pointer does not land on an `INDEX` marker, or the
    /// metatable body is truncated or undecodable.
    #[error("corrupt metatable: {0}")]
    CorruptMetatable(String),

    /// An operation needs an open archive stream but none exists.
    #[error("archive is not loaded")]
    NotLoaded,

    /// The requested virtual path has no entry in the file table.
    #[error("file not found in pak: {0}")]
    FileNotFoundInPak(String),

    // ==================== SBON Errors ====================
    /// SBON data that cannot be decoded: an unknown dynamic-value tag, a
    /// boolean byte other than 0 or 1, a non-UTF-8 string, a varint wider
    /// than 64 bits, or nesting beyond the depth limit.
    #[error("malformed SBON: {0}")]
    MalformedSbon(String),
}

/// A specialized Result type for `starpak` operations.
pub type Result<T> = std::result::Result<T, Error>;
