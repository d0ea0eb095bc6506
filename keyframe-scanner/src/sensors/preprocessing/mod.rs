//! Scan preprocessing.
//!
//! Turns raw polar scans into the Cartesian clouds handed to the
//! registration oracle:
//!
//! ```text
//! LaserScan → ScanPreprocessor → PointCloud2D
//! ```
//!
//! The engine only depends on the [`ScanPreprocessor`] trait, so a filter
//! chain living in another process can stand in for [`ScanConverter`].

mod converter;

pub use converter::{ScanConverter, ScanConverterConfig};

use crate::core::types::{LaserScan, PointCloud2D};

/// Converts a raw scan into a point cloud in the sensor frame.
pub trait ScanPreprocessor {
    /// Convert `scan`, dropping readings that carry no geometry.
    fn to_point_cloud(&self, scan: &LaserScan) -> PointCloud2D;
}

impl ScanPreprocessor for ScanConverter {
    fn to_point_cloud(&self, scan: &LaserScan) -> PointCloud2D {
        self.convert(scan)
    }
}
