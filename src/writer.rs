use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;

/// Serializes records to `path` as JSON Lines, one object per line.
/// Replaces any existing file; serde_json keeps non-ASCII text literal.
pub fn write_jsonl<T: Serialize>(path: &Path, records: &[T]) -> Result<usize> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    for record in records {
        let line = serde_json::to_string(record)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    Ok(records.len())
}
