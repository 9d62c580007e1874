//! JSON report export.
//!
//! Document layout:
//!
//! ```json
//! {
//!   "initial_url": "...",
//!   "total_steps": 2,
//!   "summary": { "total_time_ms": 123.4 },
//!   "steps": [ { "url": "...", "timing": {...}, "network": {...}, ... } ]
//! }
//! ```

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::models::StepMetrics;

/// Builds the report document for `steps`.
///
/// `summary.total_time_ms` is the sum of every step's `total_ms`.
///
/// # Errors
///
/// Returns an error if a step cannot be serialized.
pub fn build_report(steps: &[StepMetrics], initial_url: &str) -> Result<Value> {
    let total_time_ms: f64 = steps.iter().map(|s| s.timing.total_ms).sum();
    let steps = steps
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<Value>, _>>()
        .context("Failed to serialize step metrics")?;

    Ok(json!({
        "initial_url": initial_url,
        "total_steps": steps.len(),
        "summary": {
            "total_time_ms": total_time_ms,
        },
        "steps": steps,
    }))
}

/// Writes the pretty-printed report to `output`, or to stdout when `None`.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn export_json(steps: &[StepMetrics], initial_url: &str, output: Option<&Path>) -> Result<()> {
    let report = build_report(steps, initial_url)?;

    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("Failed to create output file: {}", path.display())
        })?)),
        None => Box::new(io::stdout()),
    };

    serde_json::to_writer_pretty(&mut writer, &report).context("Failed to write JSON report")?;
    writeln!(writer).context("Failed to write JSON report")?;
    writer.flush().context("Failed to flush JSON report")?;

    if let Some(path) = output {
        log::info!("Exported {} step(s) to {}", steps.len(), path.display());
    }
    Ok(())
}
