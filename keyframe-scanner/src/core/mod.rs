//! Core foundation layer.
//!
//! This is the bottom layer of the crate with no internal dependencies.
//!
//! # Contents
//!
//! - [`types`]: Core data types (poses, transforms, scans, covariance)
//! - [`math`]: Angle arithmetic

pub mod math;
pub mod types;
