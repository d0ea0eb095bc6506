//! Covariance attached to relative pose measurements.

use serde::{Deserialize, Serialize};

/// Covariance over (x, y, θ), row-major.
///
/// Serialized as a flat array of nine values so that a backend can feed
/// it straight into an information matrix.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Covariance2D {
    data: [f32; 9],
}

impl Covariance2D {
    /// Diagonal covariance from the three variances.
    #[inline]
    pub fn diagonal(var_x: f32, var_y: f32, var_theta: f32) -> Self {
        let mut data = [0.0; 9];
        data[0] = var_x;
        data[4] = var_y;
        data[8] = var_theta;
        Self { data }
    }

    /// Entry at (`row`, `col`); both must be below 3.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        assert!(row < 3 && col < 3, "covariance index ({}, {}) out of range", row, col);
        self.data[row * 3 + col]
    }

    #[inline]
    pub fn var_x(&self) -> f32 {
        self.get(0, 0)
    }

    #[inline]
    pub fn var_y(&self) -> f32 {
        self.get(1, 1)
    }

    #[inline]
    pub fn var_theta(&self) -> f32 {
        self.get(2, 2)
    }
}
