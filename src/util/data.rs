//! Byte, hex, and text conversions.

/// Text encoding used by the string conversions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Charset {
    #[default]
    Ascii,
    Utf8,
}

/// Errors from data conversions.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Invalid hex string: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Uppercase hex rendering, e.g. `[0x09, 0xFF]` -> `"09FF"`.
#[must_use]
pub fn hex_from_bytes(raw: &[u8]) -> String {
    hex::encode_upper(raw)
}

/// Parse a hex string of either case.
///
/// # Errors
///
/// Returns `DataError::InvalidHex` on an odd length or a non-hex digit.
pub fn bytes_from_hex(raw: &str) -> Result<Vec<u8>, DataError> {
    Ok(hex::decode(raw)?)
}

/// Decode bytes as text. ASCII decoding maps bytes above 0x7F to U+FFFD.
#[must_use]
pub fn string_from_bytes(input: &[u8], charset: Charset) -> String {
    match charset {
        Charset::Ascii => input
            .iter()
            .map(|&b| {
                if b.is_ascii() {
                    char::from(b)
                } else {
                    char::REPLACEMENT_CHARACTER
                }
            })
            .collect(),
        Charset::Utf8 => String::from_utf8_lossy(input).into_owned(),
    }
}

/// Encode text as bytes. Empty input yields `None`.
///
/// ASCII encoding maps characters outside ASCII to `?`.
#[must_use]
pub fn bytes_from_string(input: &str, charset: Charset) -> Option<Vec<u8>> {
    if input.is_empty() {
        return None;
    }
    let bytes = match charset {
        Charset::Ascii => input
            .chars()
            .map(|c| u8::try_from(c).ok().filter(u8::is_ascii).unwrap_or(b'?'))
            .collect(),
        Charset::Utf8 => input.as_bytes().to_vec(),
    };
    Some(bytes)
}

/// `a` followed by `b`.
#[must_use]
pub fn concat_bytes(a: &[u8], b: &[u8]) -> Vec<u8> {
    [a, b].concat()
}

/// Big-endian `i32` from the four bytes starting at `start`.
///
/// Bytes past the end of `array` read as zero.
#[must_use]
pub fn int_from_section(array: &[u8], start: usize) -> i32 {
    let mut word = [0u8; 4];
    let available = array.get(start..).unwrap_or_default();
    let n = available.len().min(4);
    word[..n].copy_from_slice(&available[..n]);
    i32::from_be_bytes(word)
}
