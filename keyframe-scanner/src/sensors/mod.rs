//! Sensor processing layer.
//!
//! - [`preprocessing`]: LiDAR scan conversion into point clouds

pub mod preprocessing;
