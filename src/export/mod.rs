//! Report export.
//!
//! Writes the analyzed steps as a single JSON document.

mod json;

pub use json::{build_report, export_json};
