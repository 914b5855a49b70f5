//! Parameter encoding helpers

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::WeiboError;

/// Characters left untouched when a value is substituted into a path.
const PATH_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

/// Serialize named values into an `application/x-www-form-urlencoded`
/// string, keeping the given order.
pub fn encode_params<K, V>(params: &[(K, V)]) -> Result<String, WeiboError>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let pairs: Vec<(&str, &str)> = params
        .iter()
        .map(|(k, v)| (k.as_ref(), v.as_ref()))
        .collect();
    serde_urlencoded::to_string(pairs)
        .map_err(|e| WeiboError::Parameter(format!("Failed to encode parameters: {e}")))
}

/// Normalize raw bytes to transport text. Invalid UTF-8 sequences are
/// replaced rather than rejected.
pub fn normalize_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Percent-encode a value for substitution into a path template.
pub(crate) fn encode_path_value(value: &str) -> String {
    utf8_percent_encode(value, PATH_VALUE).to_string()
}

/// Truncate to at most `max` characters without splitting a code point.
pub(crate) fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
