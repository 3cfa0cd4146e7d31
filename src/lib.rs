//! streampump - chunked asynchronous stream reading and subprocess output pumping.

pub mod config;
pub mod display;
pub mod process;
pub mod reader;
pub mod util;
