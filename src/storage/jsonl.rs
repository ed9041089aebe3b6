//! Line-delimited JSON storage
//!
//! Each record is serialized to a single line and written with one append
//! call followed by a data sync. The file is only ever appended to, so an
//! interrupted crawl leaves every earlier line intact. A write that fails
//! part way is cut back off the file before the error is returned.

use crate::storage::traits::{Store, StorageResult};
use crate::storage::PageRecord;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Append-only JSON-lines store
pub struct JsonLinesStore {
    path: PathBuf,
    file: File,
    /// Set when a failed write could not be cut back off the file
    needs_newline: bool,
}

impl JsonLinesStore {
    /// Opens (or creates) the file at `path` for appending
    ///
    /// If a previous run was interrupted mid-line, a newline is written first
    /// so the torn fragment cannot merge with the next record.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        if ends_with_partial_line(&mut file)? {
            tracing::warn!(
                "{} ends with an incomplete record; it will be ignored",
                path.display()
            );
            file.write_all(b"\n")?;
            file.sync_data()?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            file,
            needs_newline: false,
        })
    }
}

/// The file operations an append needs
trait LineSink: Write {
    fn end(&mut self) -> io::Result<u64>;
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
}

impl LineSink for File {
    fn end(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

/// Appends one complete line or nothing at all
///
/// On a failed write the sink is truncated back to where it was. If even
/// that fails, `needs_newline` is set so the next line starts fresh instead
/// of merging with the leftover fragment.
fn append_line<S: LineSink>(sink: &mut S, line: &[u8], needs_newline: &mut bool) -> io::Result<()> {
    let start = sink.end()?;

    let written = write_line(sink, line, *needs_newline);
    match written {
        Ok(()) => {
            *needs_newline = false;
            Ok(())
        }
        Err(e) => {
            if let Err(cut) = sink.truncate_to(start) {
                tracing::warn!("Could not remove partial record after failed write: {}", cut);
                *needs_newline = true;
            }
            Err(e)
        }
    }
}

fn write_line<S: LineSink>(sink: &mut S, line: &[u8], leading_newline: bool) -> io::Result<()> {
    if leading_newline {
        sink.write_all(b"\n")?;
    }
    sink.write_all(line)?;
    sink.sync()
}

impl Store for JsonLinesStore {
    fn append(&mut self, record: &PageRecord) -> StorageResult<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        append_line(&mut self.file, &line, &mut self.needs_newline)?;
        Ok(())
    }

    fn count(&self) -> StorageResult<u64> {
        Ok(read_records(&self.path)?.len() as u64)
    }
}

/// Returns true if the file is non-empty and its last byte is not a newline
fn ends_with_partial_line(file: &mut File) -> std::io::Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(false);
    }

    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Reads every well-formed record from a JSON-lines file
///
/// Blank lines are ignored; malformed lines (such as a record torn by an
/// interrupted write) are skipped with a warning.
pub fn read_records(path: &Path) -> StorageResult<Vec<PageRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<PageRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Skipping malformed record on line {}: {}", index + 1, e);
            }
        }
    }

    Ok(records)
}
