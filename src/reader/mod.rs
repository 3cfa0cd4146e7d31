//! Chunked asynchronous stream reading.

mod error;
mod event;
mod listener;
mod policy;
mod stream_reader;

pub use error::ReaderError;
pub use event::{ReadSummary, ReaderEvent, ReaderState, Termination};
pub use listener::{FnListener, Listener, NoopListener};
pub use policy::{ChunkPolicy, Chunker, ReadMode, DEFAULT_BLOCK_SIZE, READ_BUFFER_SIZE};
pub use stream_reader::{
    event_stream, spawn_event_reader, ReaderHandle, StreamReader, DEFAULT_CHANNEL_CAPACITY,
};
