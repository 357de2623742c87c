//! starpak - Native Rust implementation of Starbound's SBAsset6 format
//!
//! This crate reads, mutates, and rewrites the `.pak` archives used by
//! Starbound, together with the SBON binary value format the archives
//! embed for metadata and strings.
//!
//! The usual flow: open an archive, poke at its metadata and virtual
//! file table, then save it back.
//!
//! ```no_run
//! use starpak::pak::{ContentSource, PakArchive};
//! use starpak::sbon::Value;
//!
//! # fn main() -> starpak::Result<()> {
//! let mut archive = PakArchive::open("mods/cool.pak")?;
//! archive
//!     .metadata_mut()
//!     .insert("author".to_string(), Value::from("someone"));
//! archive
//!     .files_mut()
//!     .set("/readme.txt", ContentSource::Buffer(b"hi".to_vec()));
//! archive.save()?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod io;
pub mod pak;
pub mod sbon;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::pak::{ContentSource, PakArchive, PakPhase, PakProgress, VirtualFileTable};
    pub use crate::sbon::{Value, ValueMap};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
