//! Point cloud registration.
//!
//! The decision engine treats alignment as an oracle behind the
//! [`Registration`] trait: two clouds and an initial guess in, a transform,
//! a convergence verdict and a fitness score out. [`PointToPointIcp`] is the
//! in-crate implementation; any other algorithm (generalized ICP, NDT, a
//! remote service) can be swapped in by implementing the trait.
//!
//! # Example
//!
//! ```ignore
//! use keyframe_scanner::algorithms::matching::{IcpConfig, PointToPointIcp, Registration};
//! use keyframe_scanner::core::types::Transform3;
//!
//! let icp = PointToPointIcp::new(IcpConfig::default());
//! let alignment = icp.align(&current, &keyframe, &Transform3::identity(), 0.05);
//! if alignment.converged {
//!     println!("delta: {:?} fitness: {}", alignment.delta(), alignment.fitness);
//! }
//! ```

mod icp;
#[cfg(test)]
pub(crate) mod test_utils;

pub use icp::{IcpConfig, PointToPointIcp};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::types::{PointCloud2D, Pose2D, Transform3};

/// Why the oracle stopped iterating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceState {
    /// Iteration stopped without meeting any criterion.
    NotConverged,
    /// Maximum number of iterations reached.
    IterationLimit,
    /// Incremental transform fell below the transformation epsilon.
    TransformThreshold,
    /// Absolute change in mean squared error fell below its epsilon.
    AbsoluteMse,
    /// Relative change in mean squared error fell below its epsilon.
    RelativeMse,
    /// Too few correspondences to estimate a transform.
    NoCorrespondences,
}

impl fmt::Display for ConvergenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ConvergenceState::NotConverged => "not converged",
            ConvergenceState::IterationLimit => "iteration limit",
            ConvergenceState::TransformThreshold => "transform threshold",
            ConvergenceState::AbsoluteMse => "absolute MSE",
            ConvergenceState::RelativeMse => "relative MSE",
            ConvergenceState::NoCorrespondences => "no correspondences",
        };
        f.write_str(text)
    }
}

/// Result of a registration.
#[derive(Debug, Clone)]
pub struct Alignment {
    /// Whether the oracle considers the alignment converged.
    pub converged: bool,

    /// Mean squared nearest-neighbour distance after alignment (m²).
    ///
    /// Lower is better. `f32::MAX` when no score could be computed.
    pub fitness: f32,

    /// Transform taking source points into the target frame.
    pub transform: Transform3,

    /// Termination reason.
    pub convergence_state: ConvergenceState,

    /// Number of iterations performed.
    pub iterations: u32,
}

impl Alignment {
    /// A failed alignment that leaves the initial guess untouched.
    pub fn failed(initial_guess: &Transform3, convergence_state: ConvergenceState) -> Self {
        Self {
            converged: false,
            fitness: f32::MAX,
            transform: *initial_guess,
            convergence_state,
            iterations: 0,
        }
    }

    /// Planar pose delta (x, y, yaw) of the final transform.
    pub fn delta(&self) -> Pose2D {
        Pose2D::from_transform(&self.transform)
    }
}

/// A point cloud registration algorithm.
pub trait Registration {
    /// Align `source` onto `target`.
    ///
    /// # Arguments
    ///
    /// * `source` - The point cloud to be transformed
    /// * `target` - The reference point cloud
    /// * `initial_guess` - Initial transform estimate (source frame → target frame)
    /// * `max_correspondence_distance` - Point pairs farther apart than this
    ///   (meters) are not used as correspondences
    fn align(
        &self,
        source: &PointCloud2D,
        target: &PointCloud2D,
        initial_guess: &Transform3,
        max_correspondence_distance: f32,
    ) -> Alignment;
}
