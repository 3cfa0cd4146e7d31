//! Reader events, lifecycle states, and session summaries.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use super::error::ReaderError;

/// One event of a read session, as published on the event channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderEvent {
    /// The session started; sent before any read.
    Started,
    /// A completed chunk.
    Chunk(Vec<u8>),
    /// The source is exhausted. Terminal.
    EndOfStream,
    /// A read failed. Terminal.
    Fault(ReaderError),
}

impl ReaderEvent {
    /// Whether this event ends the session.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::EndOfStream | Self::Fault(_))
    }
}

/// How a read session ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Termination {
    /// The source reported end of stream.
    #[default]
    EndOfStream,
    /// A read failed.
    Fault(ReaderError),
    /// The event consumer went away before the source was exhausted.
    Detached,
}

/// Counters for one finished read session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadSummary {
    /// Chunks handed to the listener or channel.
    pub chunks: usize,
    /// Bytes returned by the source.
    pub bytes_read: u64,
    /// Bytes contained in delivered chunks.
    pub bytes_delivered: u64,
    /// Unflushed trailing bytes dropped at the end of the session.
    pub bytes_discarded: usize,
    pub termination: Termination,
}

/// Lifecycle of a stream reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum ReaderState {
    #[default]
    Created = 0,
    Running = 1,
    Finished = 2,
}

impl ReaderState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::Running,
            _ => Self::Finished,
        }
    }
}

/// State shared between a reader task and its handle.
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedState(Arc<AtomicU8>);

impl SharedState {
    pub(crate) fn get(&self) -> ReaderState {
        ReaderState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, state: ReaderState) {
        self.0.store(state as u8, Ordering::Release);
    }
}
