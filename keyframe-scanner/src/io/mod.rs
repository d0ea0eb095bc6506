//! I/O layer.
//!
//! - [`scan_log`]: JSON-lines scan logs for replay and record output

pub mod scan_log;

pub use scan_log::{JsonLinesReader, JsonLinesWriter, RecordWriter, ScanLogReader, ScanLogWriter};
