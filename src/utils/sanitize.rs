//! Header sanitisation.
//!
//! Masks credential-bearing header values before they are logged or exported.

use std::collections::BTreeMap;

use crate::config::{MASK_PATTERN, MASK_SHOW_CHARS, SENSITIVE_HEADERS};

/// Masks a sensitive value, keeping only `show_chars` characters at each end.
///
/// Values of `2 * show_chars` characters or fewer are replaced entirely.
///
/// # Examples
///
/// ```
/// use http_timing::utils::mask_sensitive_value;
///
/// assert_eq!(mask_sensitive_value("Bearer token123456", 4), "Bear****3456");
/// assert_eq!(mask_sensitive_value("short", 4), "****");
/// ```
pub fn mask_sensitive_value(value: &str, show_chars: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= show_chars * 2 {
        return MASK_PATTERN.to_string();
    }

    let head: String = chars[..show_chars].iter().collect();
    let tail: String = chars[chars.len() - show_chars..].iter().collect();
    format!("{head}{MASK_PATTERN}{tail}")
}

/// Returns true if `name` is one of the sensitive header names (case-insensitive).
pub fn is_sensitive_header(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SENSITIVE_HEADERS.contains(&lower.as_str())
}

/// Returns a copy of `headers` with sensitive values masked.
///
/// Header names keep their original spelling.
pub fn sanitize_headers<'a, I>(headers: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    headers
        .into_iter()
        .map(|(name, value)| {
            let value = if is_sensitive_header(name) {
                mask_sensitive_value(value, MASK_SHOW_CHARS)
            } else {
                value.clone()
            };
            (name.clone(), value)
        })
        .collect()
}
