//! Displacement-scaled noise model for relative pose measurements.
//!
//! Variances grow linearly with the translation and rotation of the
//! measured delta, on top of a fixed noise floor:
//!
//! ```text
//! d    = √(x² + y²)
//! a    = |θ|
//! σ²xy = sigma_xy² + k_disp_disp·d
//! σ²θ  = sigma_th² + k_rot_disp·d + k_rot_rot·a
//! ```

use serde::{Deserialize, Serialize};

use crate::core::types::{Covariance2D, Pose2D};

/// Noise coefficients of the uncertainty model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseCoefficients {
    /// Translation variance per meter travelled (m²/m).
    pub k_disp_disp: f32,
    /// Rotation variance per meter travelled (rad²/m).
    pub k_rot_disp: f32,
    /// Rotation variance per radian turned (rad²/rad).
    pub k_rot_rot: f32,
    /// Translation noise floor (m, standard deviation).
    pub sigma_xy: f32,
    /// Rotation noise floor (rad, standard deviation).
    pub sigma_th: f32,
}

impl Default for NoiseCoefficients {
    fn default() -> Self {
        Self {
            k_disp_disp: 0.001,
            k_rot_disp: 0.001,
            k_rot_rot: 0.001,
            sigma_xy: 0.002,
            sigma_th: 0.001,
        }
    }
}

/// Maps a relative pose delta to a diagonal (x, y, θ) covariance.
#[derive(Debug, Clone, Default)]
pub struct UncertaintyModel {
    coefficients: NoiseCoefficients,
}

impl UncertaintyModel {
    pub fn new(coefficients: NoiseCoefficients) -> Self {
        Self { coefficients }
    }

    pub fn coefficients(&self) -> &NoiseCoefficients {
        &self.coefficients
    }

    /// Covariance of a measured relative pose.
    ///
    /// Off-diagonal terms are zero. With non-negative coefficients the result
    /// is positive semi-definite and never smaller than the noise floor.
    ///
    /// Growth is per component, not in a joint norm over (x, y, θ): σ²xy
    /// depends only on the translation magnitude √(x² + y²), and σ²θ is
    /// non-decreasing in that magnitude and in |θ| separately. A delta that
    /// turns more but travels less can therefore get a smaller σ²xy.
    pub fn covariance(&self, delta: &Pose2D) -> Covariance2D {
        let c = &self.coefficients;
        let d = delta.translation();
        let a = delta.theta.abs();

        let var_xy = c.sigma_xy * c.sigma_xy + c.k_disp_disp * d;
        let var_theta = c.sigma_th * c.sigma_th + c.k_rot_disp * d + c.k_rot_rot * a;

        Covariance2D::diagonal(var_xy, var_xy, var_theta)
    }
}
