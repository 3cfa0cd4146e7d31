//! Small text parsing helpers.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

static IPV4_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"([0-9]{1,3})\.([0-9]{1,3})\.([0-9]{1,3})\.([0-9]{1,3})").ok()
});

/// Value of header `name` in a header block such as an HTTP or SSDP message.
///
/// The first line is the start line and is skipped. Header names match
/// case-insensitively; the value is trimmed.
#[must_use]
pub fn parse_header_value<'a>(content: &'a str, name: &str) -> Option<&'a str> {
    content.lines().skip(1).find_map(|line| {
        let (header, value) = line.split_once(':')?;
        header
            .trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim())
    })
}

/// First dotted-quad address found in `url`.
#[must_use]
pub fn parse_ip_address(url: &str) -> Option<String> {
    let caps = IPV4_PATTERN.as_ref()?.captures(url)?;
    Some(format!(
        "{}.{}.{}.{}",
        &caps[1], &caps[2], &caps[3], &caps[4]
    ))
}

/// File name of `path` with its last extension removed.
#[must_use]
pub fn filename_without_extension(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.rfind('.') {
        Some(idx) if idx + 1 < name.len() => name[..idx].to_string(),
        _ => name,
    }
}
