//! Polar to Cartesian scan conversion.

use serde::{Deserialize, Serialize};

use crate::core::types::{LaserScan, Point2D, PointCloud2D};

/// Configuration for [`ScanConverter`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConverterConfig {
    /// Readings closer than this are dropped (meters).
    ///
    /// Applied on top of the scan's own `range_min`.
    pub scan_range_min: f32,

    /// Readings farther than this are dropped (meters).
    ///
    /// Applied on top of the scan's own `range_max`.
    pub scan_range_max: f32,

    /// Radial offset added to every range before conversion (meters).
    ///
    /// Corrects for the optical offset between the lidar housing center
    /// and the actual laser origin.
    pub radial_offset: f32,
}

impl Default for ScanConverterConfig {
    fn default() -> Self {
        Self {
            scan_range_min: 0.15,
            scan_range_max: 12.0,
            radial_offset: 0.0,
        }
    }
}

/// Scan converter for polar to Cartesian transformation.
///
/// ```text
/// corrected_range = measured_range + radial_offset
/// x = corrected_range * cos(angle)
/// y = corrected_range * sin(angle)
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScanConverter {
    config: ScanConverterConfig,
}

impl ScanConverter {
    /// Create a converter with the given configuration.
    pub fn new(config: ScanConverterConfig) -> Self {
        Self { config }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &ScanConverterConfig {
        &self.config
    }

    /// Convert a laser scan to a point cloud.
    pub fn convert(&self, scan: &LaserScan) -> PointCloud2D {
        let mut cloud = PointCloud2D::with_capacity(scan.len());

        for (angle, range) in scan.beams() {
            if !scan.accepts_range(range)
                || range < self.config.scan_range_min
                || range > self.config.scan_range_max
            {
                continue;
            }

            let corrected_range = range + self.config.radial_offset;
            let (sin_a, cos_a) = angle.sin_cos();
            cloud.push(Point2D::new(corrected_range * cos_a, corrected_range * sin_a));
        }

        cloud
    }
}
