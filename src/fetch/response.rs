//! Response metadata and protocol naming.

use std::collections::BTreeMap;

use hyper::header::{CONTENT_TYPE, DATE, LOCATION, SERVER};
use hyper::HeaderMap;

use crate::models::ResponseInfo;
use crate::utils::parse_http_date;

/// Fills status and header-derived fields of `info`.
///
/// Header names are lowercase; repeated headers are joined with `", "`. An
/// empty `Location` is kept as `Some("")`.
pub fn populate_response_metadata(status: u16, headers: &HeaderMap, info: &mut ResponseInfo) {
    info.status = Some(status);
    info.content_type = header_string(headers, CONTENT_TYPE.as_str());
    info.server = header_string(headers, SERVER.as_str());
    info.location = header_string(headers, LOCATION.as_str());
    info.date = header_string(headers, DATE.as_str()).and_then(|d| parse_http_date(&d));
    info.headers = flatten_headers(headers);
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut flat: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        flat.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    flat
}

/// Canonical `HTTP/x.y` token for a negotiated protocol.
///
/// ALPN shorthands (`h2`, `h3`) and bare `HTTP/2`/`HTTP/3` are expanded;
/// anything else passes through unchanged.
pub fn normalize_http_version(token: &str) -> String {
    match token {
        "h2" | "H2" | "HTTP/2" => "HTTP/2.0".to_string(),
        "h3" | "H3" | "HTTP/3" => "HTTP/3.0".to_string(),
        "http/1.1" => "HTTP/1.1".to_string(),
        other => other.to_string(),
    }
}
