//! URL and request-header argument validation.

/// Returns true for `http://` and `https://` URLs.
pub fn validate_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Parses `"Name: value"` arguments into an ordered header list.
///
/// A later header whose name matches an earlier one case-insensitively
/// replaces its value; the first spelling of the name is kept.
///
/// # Errors
///
/// Returns a message when a line has no `:` or the name is empty.
pub fn parse_header_args<S: AsRef<str>>(lines: &[S]) -> Result<Vec<(String, String)>, String> {
    let mut headers: Vec<(String, String)> = Vec::new();

    for line in lines {
        let line = line.as_ref();
        let Some((name, value)) = line.split_once(':') else {
            return Err(format!("Invalid header format: {line}"));
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("Header name cannot be empty: {line}"));
        }
        let value = value.trim().to_string();

        match headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value,
            None => headers.push((name.to_string(), value)),
        }
    }

    Ok(headers)
}
