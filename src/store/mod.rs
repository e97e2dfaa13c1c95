//! # Storage Module
//!
//! Append-only text stores on the removable medium.
//!
//! This module handles:
//! - Day partitions (`YYYY-MM-DD.txt`): samples plus at most one `AVG:` line
//! - Long-lived weekly and monthly aggregate files
//! - Lazy line iteration that treats absent files as empty history
//!
//! Every write opens the file in append mode, writes one line, flushes and
//! closes. Nothing is ever rewritten in place.

pub mod backend;
pub mod day_log;
pub mod aggregate;

use std::io::{self, BufRead, Write};

use chrono::NaiveDate;
use tracing::warn;

pub use aggregate::AggregateStore;
pub use backend::{FsBackend, StorageBackend};
pub use day_log::DayLogStore;

use crate::error::Result;

/// File name of the partition used while the current date is unknown
pub const UNKNOWN_PARTITION_FILE: &str = "unknown.txt";

/// Identifies one day partition file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// Partition of a known calendar date
    Day(NaiveDate),

    /// Placeholder partition while the time source is unavailable
    Unknown,
}

impl Partition {
    /// File name of the partition, e.g. `2025-03-01.txt`
    pub fn file_name(&self) -> String {
        match self {
            Partition::Day(date) => format!("{}.txt", date.format("%Y-%m-%d")),
            Partition::Unknown => UNKNOWN_PARTITION_FILE.to_string(),
        }
    }
}

impl From<NaiveDate> for Partition {
    fn from(date: NaiveDate) -> Self {
        Partition::Day(date)
    }
}

impl From<Option<NaiveDate>> for Partition {
    fn from(date: Option<NaiveDate>) -> Self {
        date.map_or(Partition::Unknown, Partition::Day)
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Partition::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Partition::Unknown => write!(f, "unknown"),
        }
    }
}

/// Lazy, finite sequence of the lines of one stored file, oldest first
///
/// An absent file yields nothing. Bytes that are not valid UTF-8 (e.g. a
/// torn write) are replaced, so a garbled line never hides the lines after
/// it. A read error part-way through is logged and ends the sequence. Call
/// the store again to restart from the top.
pub struct LogLines {
    source: String,
    reader: Option<Box<dyn BufRead>>,
    buffer: Vec<u8>,
}

impl LogLines {
    fn open(reader: Box<dyn BufRead>, source: &str) -> Self {
        Self {
            source: source.to_string(),
            reader: Some(reader),
            buffer: Vec::new(),
        }
    }

    fn empty(source: &str) -> Self {
        Self {
            source: source.to_string(),
            reader: None,
            buffer: Vec::new(),
        }
    }
}

impl std::fmt::Debug for LogLines {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogLines")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl Iterator for LogLines {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let reader = self.reader.as_mut()?;
        self.buffer.clear();

        match reader.read_until(b'\n', &mut self.buffer) {
            Ok(0) => {
                self.reader = None;
                None
            }
            Ok(_) => {
                let line = self.buffer.strip_suffix(b"\n").unwrap_or(&self.buffer[..]);
                let line = line.strip_suffix(b"\r").unwrap_or(line);
                Some(String::from_utf8_lossy(line).into_owned())
            }
            Err(e) => {
                warn!("Read error in {}, stopping scan: {}", self.source, e);
                self.reader = None;
                None
            }
        }
    }
}

/// Append one newline-terminated line to `name`
fn append_line(backend: &dyn StorageBackend, name: &str, line: &str) -> Result<()> {
    let mut handle = backend.open_for_append(name)?;
    handle.write_all(line.as_bytes())?;
    handle.write_all(b"\n")?;
    handle.flush()?;
    Ok(())
}

/// Open `name` for line iteration, or `None` when it is absent or unreadable
fn open_lines(backend: &dyn StorageBackend, name: &str) -> Option<LogLines> {
    match backend.open_for_read(name) {
        Ok(reader) => Some(LogLines::open(reader, name)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!("Failed to open {} for reading: {}", name, e);
            None
        }
    }
}

/// Open `name` for line iteration, absent files reading as empty
fn read_lines(backend: &dyn StorageBackend, name: &str) -> LogLines {
    open_lines(backend, name).unwrap_or_else(|| LogLines::empty(name))
}

/// Last line matching `predicate`, scanning the whole sequence
fn last_matching<F>(lines: LogLines, predicate: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    lines.filter(|line| predicate(line.as_str())).last()
}
