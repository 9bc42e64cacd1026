//! Output formatting and persistence for realtime records.
//!
//! Supports pretty JSON on stdout and CSV append.

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Writes `value` as pretty-printed JSON followed by a newline.
pub fn write_json<W: Write, T: Serialize + ?Sized>(mut writer: W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    Ok(())
}

/// Prints `value` as pretty-printed JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let stdout = std::io::stdout();
    write_json(stdout.lock(), value)
}

/// Appends `records` as rows to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_records<T: Serialize>(path: &str, records: &[T]) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, rows = records.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}
