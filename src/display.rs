//! Colored CLI display utilities for pumped output.
//!
//! This module provides functions for printing colored, formatted output
//! to the terminal while streams are read and processes are pumped.

use std::io::{self, Write};
use std::process::ExitStatus;

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::reader::{ReadMode, ReadSummary, ReaderError, ReaderEvent, Termination};
use crate::util::data::{hex_from_bytes, string_from_bytes, Charset};
use crate::util::SeriesStats;

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Maximum length for truncated chunk renderings.
const DEFAULT_MAX_LEN: usize = 200;

/// Truncate a string to a maximum length in characters, adding ellipsis if
/// truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize, raw_mode: bool) -> String {
    if raw_mode || s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return "...".to_string();
    }
    let kept: String = s.chars().take(max_len - 3).collect();
    format!("{kept}...")
}

/// Render a chunk: text for lines, uppercase hex for blocks.
#[must_use]
pub fn format_chunk(chunk: &[u8], mode: ReadMode, raw_mode: bool) -> String {
    let rendered = match mode {
        ReadMode::Line => string_from_bytes(chunk, Charset::Utf8),
        ReadMode::Block => hex_from_bytes(chunk),
    };
    truncate(&rendered, DEFAULT_MAX_LEN, raw_mode)
}

/// One reader event as a JSON object.
#[must_use]
pub fn event_json(index: usize, event: &ReaderEvent) -> serde_json::Value {
    match event {
        ReaderEvent::Started => serde_json::json!({ "event": "start" }),
        ReaderEvent::Chunk(chunk) => serde_json::json!({
            "event": "chunk",
            "index": index,
            "len": chunk.len(),
            "hex": hex_from_bytes(chunk),
        }),
        ReaderEvent::EndOfStream => serde_json::json!({ "event": "end" }),
        ReaderEvent::Fault(error) => serde_json::json!({
            "event": "fault",
            "error": error.to_string(),
        }),
    }
}

/// Print process launch information.
pub fn print_launch(command: &str, pid: Option<u32>) {
    println!(
        "{} {} {} {}",
        timestamp().dimmed(),
        "[LAUNCH]".blue().bold(),
        command.cyan(),
        pid.map_or(String::new(), |p| format!("pid={p}")).dimmed()
    );
    let _ = io::stdout().flush();
}

/// Print one line of process output.
pub fn print_line(line: &[u8], raw_mode: bool) {
    println!("{}", format_chunk(line, ReadMode::Line, raw_mode));
    let _ = io::stdout().flush();
}

/// Print a chunk read from a stream.
pub fn print_chunk(index: usize, chunk: &[u8], mode: ReadMode, raw_mode: bool) {
    println!(
        "{} {} {}",
        format!("[{index:>5}]").cyan().bold(),
        format!("len={}", chunk.len()).dimmed(),
        format_chunk(chunk, mode, raw_mode)
    );
    let _ = io::stdout().flush();
}

/// Print a read fault.
pub fn print_fault(error: &ReaderError) {
    println!(
        "{} {} {}",
        timestamp().dimmed(),
        "[FAULT]".red().bold(),
        error.to_string().red()
    );
    let _ = io::stdout().flush();
}

/// Print process exit status.
pub fn print_exit(status: ExitStatus) {
    let code = status
        .code()
        .map_or_else(|| "signal".to_string(), |c| c.to_string());
    if status.success() {
        println!(
            "{} {} exit={}",
            timestamp().dimmed(),
            "[EXIT]".green().bold(),
            code
        );
    } else {
        println!(
            "{} {} exit={}",
            timestamp().dimmed(),
            "[EXIT]".red().bold(),
            code.red()
        );
    }
    let _ = io::stdout().flush();
}

/// Print the summary of a finished read session.
pub fn print_summary(summary: &ReadSummary, chunk_sizes: &SeriesStats) {
    let ending = match &summary.termination {
        Termination::EndOfStream => "end of stream".green().to_string(),
        Termination::Fault(e) => format!("fault: {e}").red().to_string(),
        Termination::Detached => "detached".yellow().to_string(),
    };
    println!(
        "{} {} chunks={} read={}B delivered={}B discarded={}B ({})",
        timestamp().dimmed(),
        "[SUMMARY]".magenta().bold(),
        summary.chunks,
        summary.bytes_read,
        summary.bytes_delivered,
        summary.bytes_discarded,
        ending
    );
    if chunk_sizes.count() > 0 {
        println!(
            "{} {} min={} max={} mean={:.1} stddev={:.1}",
            timestamp().dimmed(),
            "[SIZES]".magenta().bold(),
            chunk_sizes.min(),
            chunk_sizes.max(),
            chunk_sizes.mean(),
            chunk_sizes.std_dev()
        );
    }
    let _ = io::stdout().flush();
}

/// Print a JSON value on one line.
pub fn print_json(value: &serde_json::Value) {
    println!("{value}");
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}
