//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::reader::{
    ChunkPolicy, ReadMode, ReaderError, DEFAULT_BLOCK_SIZE, DEFAULT_CHANNEL_CAPACITY,
};

use super::ConfigError;

/// Configuration for stream readers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Chunking mode.
    #[serde(default)]
    pub mode: ReadMode,
    /// Block size in bytes, used in block mode only.
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    /// Capacity of the reader event channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            mode: ReadMode::default(),
            block_size: default_block_size(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl ReaderConfig {
    /// Chunk policy described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns `ReaderError::InvalidBlockSize` for block mode with a zero size.
    pub fn policy(&self) -> Result<ChunkPolicy, ReaderError> {
        ChunkPolicy::from_mode(self.mode, self.block_size)
    }
}

/// Configuration for launched processes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessConfig {
    /// Grace period between SIGTERM and SIGKILL, in milliseconds.
    #[serde(default = "default_terminate_timeout_ms")]
    pub terminate_timeout_ms: u64,
    /// Working directory for launched processes.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

fn default_terminate_timeout_ms() -> u64 {
    5000
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            terminate_timeout_ms: default_terminate_timeout_ms(),
            working_dir: None,
        }
    }
}

impl ProcessConfig {
    #[must_use]
    pub fn terminate_timeout(&self) -> Duration {
        Duration::from_millis(self.terminate_timeout_ms)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PumpConfig {
    #[serde(default)]
    pub reader: ReaderConfig,
    #[serde(default)]
    pub process: ProcessConfig,
}

impl PumpConfig {
    /// Check values that deserialize fine but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reader.block_size == 0 {
            return Err(ConfigError::Invalid(
                "reader.block_size must be positive".to_string(),
            ));
        }
        if self.reader.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "reader.channel_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
