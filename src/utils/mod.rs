//! Utility functions.
//!
//! This module provides:
//! - Header sanitisation and value masking
//! - HTTP and certificate date parsing, day arithmetic
//! - URL validation and request-header argument parsing

mod args;
mod dates;
mod sanitize;

pub use args::{parse_header_args, validate_url};
pub use dates::{calculate_days_until, parse_certificate_date, parse_http_date};
pub use sanitize::{is_sensitive_header, mask_sensitive_value, sanitize_headers};
