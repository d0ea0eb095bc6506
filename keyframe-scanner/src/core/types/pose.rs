//! Pose and point types for 2D registration.

use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

use crate::core::math::{normalize_angle, yaw_from_rotation};

/// Homogeneous 4x4 rigid transform (SE(3)).
///
/// Alignments are exchanged with the registration oracle in this form even
/// though the robot moves in the plane, so that 3D-capable oracles can be
/// plugged in unchanged.
pub type Transform3 = Matrix4<f32>;

/// Planar point (meters).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Planar pose: a keyframe's pose in the map, or the relative pose
/// between two keyframes.
///
/// `theta` is kept in [-π, π] by every constructor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    pub x: f32,
    pub y: f32,
    /// Heading (radians)
    pub theta: f32,
}

impl Pose2D {
    #[inline]
    pub fn new(x: f32, y: f32, theta: f32) -> Self {
        Self {
            x,
            y,
            theta: normalize_angle(theta),
        }
    }

    #[inline]
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
        }
    }

    /// Compose two poses: self ⊕ other
    ///
    /// ```text
    /// C = A ⊕ B:
    ///   C.x = A.x + B.x * cos(A.θ) - B.y * sin(A.θ)
    ///   C.y = A.y + B.x * sin(A.θ) + B.y * cos(A.θ)
    ///   C.θ = normalize(A.θ + B.θ)
    /// ```
    #[inline]
    pub fn compose(&self, other: &Pose2D) -> Pose2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        Pose2D::new(
            self.x + other.x * cos_t - other.y * sin_t,
            self.y + other.x * sin_t + other.y * cos_t,
            self.theta + other.theta,
        )
    }

    /// Inverse of this pose.
    #[inline]
    pub fn inverse(&self) -> Pose2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        Pose2D::new(
            -self.x * cos_t - self.y * sin_t,
            self.x * sin_t - self.y * cos_t,
            -self.theta,
        )
    }

    /// Express `point`, given in this pose's frame, in the parent frame.
    #[inline]
    pub fn transform_point(&self, point: &Point2D) -> Point2D {
        let (sin_t, cos_t) = self.theta.sin_cos();
        Point2D::new(
            self.x + point.x * cos_t - point.y * sin_t,
            self.y + point.x * sin_t + point.y * cos_t,
        )
    }

    #[inline]
    pub fn translation_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    /// Length of the translation part (meters).
    #[inline]
    pub fn translation(&self) -> f32 {
        self.translation_squared().sqrt()
    }

    /// Lift this planar pose into a homogeneous 4x4 transform.
    ///
    /// The pose becomes a rotation about Z plus an XY translation.
    #[rustfmt::skip]
    pub fn to_transform(&self) -> Transform3 {
        let (sin_t, cos_t) = self.theta.sin_cos();
        Transform3::new(
            cos_t, -sin_t, 0.0, self.x,
            sin_t,  cos_t, 0.0, self.y,
            0.0,    0.0,   1.0, 0.0,
            0.0,    0.0,   0.0, 1.0,
        )
    }

    /// Project a homogeneous transform onto the ground plane and yaw.
    ///
    /// Z translation, roll and pitch are discarded.
    pub fn from_transform(transform: &Transform3) -> Pose2D {
        Pose2D::new(
            transform[(0, 3)],
            transform[(1, 3)],
            yaw_from_rotation(transform[(0, 0)], transform[(1, 0)]),
        )
    }
}

impl Default for Pose2D {
    fn default() -> Self {
        Self::identity()
    }
}
