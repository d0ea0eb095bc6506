//! JSON-lines scan logs and record output.
//!
//! # File Format
//!
//! One JSON object per line. Scan logs hold `Timestamped<LaserScan>`:
//!
//! ```text
//! {"data":{"angle_min":0.0,"angle_max":6.28,"angle_increment":0.0174,
//!          "range_min":0.15,"range_max":12.0,"ranges":[1.2,1.3,...]},
//!  "timestamp_us":1000000}
//! ```
//!
//! Record logs hold one `RegistrationRecord` per line. Blank lines are
//! skipped when reading.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::core::types::{LaserScan, Timestamped};
use crate::engine::record::RegistrationRecord;
use crate::error::Result;

/// Reader over a JSON-lines file.
pub struct JsonLinesReader<T> {
    lines: Lines<BufReader<File>>,
    line_number: usize,
    _marker: std::marker::PhantomData<T>,
}

impl<T: DeserializeOwned> JsonLinesReader<T> {
    /// Open a file for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            line_number: 0,
            _marker: std::marker::PhantomData,
        })
    }

    /// Read the next entry, `None` at end of file.
    pub fn next_entry(&mut self) -> Result<Option<T>> {
        for line in self.lines.by_ref() {
            let line = line?;
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            return Ok(Some(serde_json::from_str(&line)?));
        }
        Ok(None)
    }

    /// Number of lines consumed so far.
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<T: DeserializeOwned> Iterator for JsonLinesReader<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose()
    }
}

/// Writer producing a JSON-lines file.
pub struct JsonLinesWriter<T> {
    writer: BufWriter<File>,
    count: u64,
    _marker: std::marker::PhantomData<T>,
}

impl<T: Serialize> JsonLinesWriter<T> {
    /// Create (or truncate) a file for writing.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            count: 0,
            _marker: std::marker::PhantomData,
        })
    }

    /// Append one entry.
    pub fn write(&mut self, entry: &T) -> Result<()> {
        serde_json::to_writer(&mut self.writer, entry)?;
        self.writer.write_all(b"\n")?;
        self.count += 1;
        Ok(())
    }

    /// Entries written so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Flush and close, returning the number of entries written.
    pub fn finish(mut self) -> Result<u64> {
        self.writer.flush()?;
        Ok(self.count)
    }
}

/// Reader for recorded scans.
pub type ScanLogReader = JsonLinesReader<Timestamped<LaserScan>>;

/// Writer for recorded scans.
pub type ScanLogWriter = JsonLinesWriter<Timestamped<LaserScan>>;

/// Writer for emitted registration records.
pub type RecordWriter = JsonLinesWriter<RegistrationRecord>;
