//! Range scans and the point clouds derived from them.

use super::pose::{Point2D, Pose2D};
use serde::{Deserialize, Serialize};

/// One sweep of a 2D range sensor, in polar form.
///
/// Records carry the scan exactly as received, so the serialized layout
/// follows the usual `LaserScan` message fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaserScan {
    /// Bearing of the first reading (radians)
    pub angle_min: f32,
    /// Bearing of the last reading (radians)
    pub angle_max: f32,
    /// Bearing step between readings (radians)
    pub angle_increment: f32,
    /// Shortest range the sensor reports reliably (meters)
    pub range_min: f32,
    /// Longest range the sensor reports reliably (meters)
    pub range_max: f32,
    /// One range per bearing (meters); 0 or non-finite means no return
    pub ranges: Vec<f32>,
    /// Return intensities, passed through untouched
    #[serde(default)]
    pub intensities: Option<Vec<u8>>,
    /// Explicit bearings for sensors with uneven spacing
    #[serde(default)]
    pub angles: Option<Vec<f32>>,
}

impl LaserScan {
    pub fn new(
        angle_min: f32,
        angle_max: f32,
        angle_increment: f32,
        range_min: f32,
        range_max: f32,
        ranges: Vec<f32>,
    ) -> Self {
        Self {
            angle_min,
            angle_max,
            angle_increment,
            range_min,
            range_max,
            ranges,
            intensities: None,
            angles: None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Bearing of reading `index`, from `angles` when present.
    #[inline]
    pub fn angle_at(&self, index: usize) -> f32 {
        match self.angles.as_ref().and_then(|angles| angles.get(index)) {
            Some(&angle) => angle,
            None => self.angle_min + index as f32 * self.angle_increment,
        }
    }

    /// Whether `range` is a usable return for this sensor.
    #[inline]
    pub fn accepts_range(&self, range: f32) -> bool {
        range.is_finite() && range > 0.0 && (self.range_min..=self.range_max).contains(&range)
    }

    /// `(bearing, range)` of every reading, valid or not.
    pub fn beams(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.ranges
            .iter()
            .enumerate()
            .map(|(i, &range)| (self.angle_at(i), range))
    }

    /// Number of readings passing [`accepts_range`](Self::accepts_range).
    pub fn valid_count(&self) -> usize {
        self.ranges.iter().filter(|&&r| self.accepts_range(r)).count()
    }

    /// Check that the metadata is usable for conversion.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self
            .angles
            .as_ref()
            .is_some_and(|angles| angles.len() != self.ranges.len())
        {
            return Err("angles and ranges length mismatch");
        }
        if self
            .intensities
            .as_ref()
            .is_some_and(|intensities| intensities.len() != self.ranges.len())
        {
            return Err("intensities and ranges length mismatch");
        }
        if self.angles.is_none()
            && !(self.angle_min.is_finite() && self.angle_increment.is_finite())
        {
            return Err("bearing metadata is not finite");
        }
        if self.angles.is_none() && self.ranges.len() > 1 && self.angle_increment == 0.0 {
            return Err("angle_increment must be non-zero");
        }
        if self.range_min.is_nan() || self.range_min < 0.0 {
            return Err("range_min must be non-negative");
        }
        if self.range_max.is_nan() || self.range_max <= self.range_min {
            return Err("range_max must be greater than range_min");
        }
        Ok(())
    }
}

impl Default for LaserScan {
    /// Empty 360° scan with one-degree spacing.
    fn default() -> Self {
        Self::new(
            0.0,
            std::f32::consts::TAU,
            std::f32::consts::TAU / 360.0,
            0.15,
            12.0,
            Vec::new(),
        )
    }
}

/// Planar point cloud in the sensor frame, stored as separate x and y
/// arrays.
///
/// The engine never looks inside; it only hands clouds to the oracle and
/// keeps them on keyframes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PointCloud2D {
    pub xs: Vec<f32>,
    pub ys: Vec<f32>,
}

impl PointCloud2D {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            xs: Vec::with_capacity(capacity),
            ys: Vec::with_capacity(capacity),
        }
    }

    pub fn from_points(points: &[Point2D]) -> Self {
        Self {
            xs: points.iter().map(|p| p.x).collect(),
            ys: points.iter().map(|p| p.y).collect(),
        }
    }

    #[inline]
    pub fn push(&mut self, point: Point2D) {
        self.xs.push(point.x);
        self.ys.push(point.y);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Point2D> + '_ {
        self.xs
            .iter()
            .zip(&self.ys)
            .map(|(&x, &y)| Point2D::new(x, y))
    }

    /// Cloud expressed in the parent frame of `pose`.
    pub fn transform(&self, pose: &Pose2D) -> PointCloud2D {
        let mut moved = PointCloud2D::with_capacity(self.len());
        for point in self.iter() {
            moved.push(pose.transform_point(&point));
        }
        moved
    }
}
