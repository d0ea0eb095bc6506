//! Timestamp wrapper for sensor data.

use serde::{Deserialize, Serialize};

/// A value stamped with its acquisition time.
///
/// Scan logs hold one `Timestamped<LaserScan>` per line and the engine
/// copies `timestamp_us` onto the proposed keyframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timestamped<T> {
    pub data: T,
    /// Microseconds since the epoch of the recording
    pub timestamp_us: u64,
}

impl<T> Timestamped<T> {
    #[inline]
    pub fn new(data: T, timestamp_us: u64) -> Self {
        Self { data, timestamp_us }
    }
}
