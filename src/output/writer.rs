//! JSON result writing
//!
//! Results are appended when the target file already exists, so repeated
//! runs against the same `result-path` accumulate rather than overwrite.

use crate::output::{CrawlResult, OutputResult};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes the result as JSON to the given path
///
/// # Arguments
///
/// * `result` - The crawl result to write
/// * `path` - Destination file; created if missing, appended to otherwise
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the result
/// * `Err(OutputError)` - Failed to open, serialize or write
pub fn write_result(result: &CrawlResult, path: &Path) -> OutputResult<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::new(file);
    write_result_to(result, &mut writer)?;
    writer.flush()?;
    tracing::debug!("Wrote crawl result to {}", path.display());
    Ok(())
}

/// Writes the result as JSON to any writer, followed by a newline
pub fn write_result_to<W: Write>(result: &CrawlResult, writer: &mut W) -> OutputResult<()> {
    serde_json::to_writer(&mut *writer, result)?;
    writeln!(writer)?;
    Ok(())
}
