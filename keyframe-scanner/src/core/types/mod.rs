//! Core data types for scan registration.
//!
//! - [`Point2D`], [`Pose2D`]: planar geometry, also used for pose deltas
//! - [`Transform3`]: homogeneous 4x4 transform exchanged with the oracle
//! - [`Covariance2D`]: 3x3 covariance matrix for pose uncertainty
//! - [`Timestamped<T>`]: generic timestamp wrapper
//! - [`LaserScan`]: raw LiDAR scan in polar coordinates
//! - [`PointCloud2D`]: collection of 2D points in Cartesian coordinates

mod covariance;
mod pose;
mod scan;
mod timestamped;

pub use covariance::Covariance2D;
pub use pose::{Point2D, Pose2D, Transform3};
pub use scan::{LaserScan, PointCloud2D};
pub use timestamped::Timestamped;
