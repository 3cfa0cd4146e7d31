//! Chunk boundary policies.
//!
//! A [`Chunker`] owns the accumulation buffer of one reader and decides,
//! for the bytes returned by each read call, where chunks end.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use super::error::ReaderError;

/// Default block size in bytes.
pub const DEFAULT_BLOCK_SIZE: usize = 256;

/// Maximum number of bytes requested per read call in block mode.
pub const READ_BUFFER_SIZE: usize = 1024;

/// How a reader splits its input.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReadMode {
    /// Fixed-size blocks.
    Block,
    /// Newline-delimited lines.
    #[default]
    Line,
}

/// Chunk boundary rule, fixed at reader construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChunkPolicy {
    /// Flush once the buffer holds at least `size` bytes.
    Block { size: NonZeroUsize },
    /// Flush on every `\n`, excluding the newline itself.
    #[default]
    Line,
}

impl ChunkPolicy {
    /// Block policy with the given size.
    ///
    /// # Errors
    ///
    /// Returns `ReaderError::InvalidBlockSize` if `size` is zero.
    pub fn block(size: usize) -> Result<Self, ReaderError> {
        NonZeroUsize::new(size)
            .map(|size| Self::Block { size })
            .ok_or(ReaderError::InvalidBlockSize)
    }

    /// Block policy with [`DEFAULT_BLOCK_SIZE`].
    #[must_use]
    pub const fn default_block() -> Self {
        Self::Block {
            size: NonZeroUsize::MIN.saturating_add(DEFAULT_BLOCK_SIZE - 1),
        }
    }

    /// Line policy.
    #[must_use]
    pub fn line() -> Self {
        Self::Line
    }

    /// Policy for `mode`, using `block_size` only in block mode.
    ///
    /// # Errors
    ///
    /// Returns `ReaderError::InvalidBlockSize` if block mode is requested
    /// with a size of zero.
    pub fn from_mode(mode: ReadMode, block_size: usize) -> Result<Self, ReaderError> {
        match mode {
            ReadMode::Block => Self::block(block_size),
            ReadMode::Line => Ok(Self::Line),
        }
    }

    #[must_use]
    pub fn mode(&self) -> ReadMode {
        match self {
            Self::Block { .. } => ReadMode::Block,
            Self::Line => ReadMode::Line,
        }
    }

    /// Number of bytes requested from the source per read call.
    #[must_use]
    pub fn read_size(&self) -> usize {
        match self {
            Self::Block { .. } => READ_BUFFER_SIZE,
            Self::Line => 1,
        }
    }
}

/// Accumulation buffer driven by a [`ChunkPolicy`].
#[derive(Debug, Clone)]
pub struct Chunker {
    policy: ChunkPolicy,
    buffer: Vec<u8>,
}

impl Chunker {
    #[must_use]
    pub fn new(policy: ChunkPolicy) -> Self {
        Self {
            policy,
            buffer: Vec::new(),
        }
    }

    #[must_use]
    pub fn policy(&self) -> ChunkPolicy {
        self.policy
    }

    /// Feed the bytes returned by one read call.
    ///
    /// Returns the chunks completed by these bytes, in order. The buffer is
    /// empty again after every flush, before the next byte is appended.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Vec<u8>> {
        let mut chunks = Vec::new();
        match self.policy {
            ChunkPolicy::Block { size } => {
                self.buffer.extend_from_slice(data);
                // The whole buffer goes out, even when the read overshot `size`.
                if self.buffer.len() >= size.get() {
                    chunks.push(std::mem::take(&mut self.buffer));
                }
            }
            ChunkPolicy::Line => {
                for &byte in data {
                    if byte == b'\n' {
                        chunks.push(std::mem::take(&mut self.buffer));
                    } else {
                        self.buffer.push(byte);
                    }
                }
            }
        }
        chunks
    }

    /// Bytes accumulated since the last flush.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }
}
