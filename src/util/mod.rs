//! Helpers that sit next to the reader: conversions, statistics, parsing,
//! and file copying.

pub mod data;
pub mod fs;
pub mod stats;
pub mod text;

pub use data::{Charset, DataError};
pub use fs::{copy_file, CopyError};
pub use stats::SeriesStats;
