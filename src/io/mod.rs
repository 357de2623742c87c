//! Byte stream, sink, and copy-pipeline primitives
//!
//! Everything above this layer (the SBON codec and the archive engine)
//! reads through [`ReadStream`] and writes through [`Sink`], so the same
//! code paths serve in-memory blocks and files on disk.

mod pipeline;
mod sink;
mod stream;

pub use pipeline::{Pipeline, PumpSource};
pub use sink::{FileSink, MemorySink, Sink};
pub use stream::{FileStream, MemoryStream, ReadStream};

pub(crate) use pipeline::resolve_window;
