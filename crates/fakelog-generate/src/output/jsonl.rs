use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use fakelog_core::{Batch, Record};

use crate::errors::GenerationError;

/// Write a batch as JSON lines, one record per line, in batch order.
///
/// Creates `dir` when missing and returns the written path.
pub fn write_batch_jsonl(
    dir: &Path,
    file_name: &str,
    batch: &Batch,
) -> Result<PathBuf, GenerationError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    let mut writer = BufWriter::new(File::create(&path)?);
    write_records(&mut writer, batch)?;
    writer.flush()?;
    Ok(path)
}

/// Serialize a batch into any writer using the JSON-lines layout.
pub fn write_records<W: Write>(writer: &mut W, batch: &Batch) -> Result<(), GenerationError> {
    for record in batch {
        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Read a JSON-lines batch file. Blank lines are skipped.
///
/// Records are re-sorted by timestamp and truncated to `max_rows`, so a
/// loaded batch holds the same invariants as a generated one.
pub fn read_batch_jsonl(path: &Path, max_rows: usize) -> Result<Batch, GenerationError> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: Record = serde_json::from_str(&line)?;
        records.push(record);
    }
    Ok(Batch::from_records(records, max_rows))
}

/// Number of records in a JSON-lines file.
pub fn count_lines(path: &Path) -> Result<u64, GenerationError> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = 0_u64;
    for line in reader.lines() {
        if !line?.trim().is_empty() {
            lines += 1;
        }
    }
    Ok(lines)
}
