//! Algorithms layer.
//!
//! # Contents
//!
//! - [`matching`]: Registration oracle trait and point-to-point ICP
//! - [`uncertainty`]: Displacement-scaled covariance for relative poses

pub mod matching;
pub mod uncertainty;
