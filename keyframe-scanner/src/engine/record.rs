//! Per-scan output of the registration engine.
//!
//! Exactly one [`RegistrationRecord`] is emitted for every accepted scan.
//! It proposes a new keyframe and up to two pose-graph edges; the backend
//! decides what to store and assigns ids.

use serde::{Deserialize, Serialize};

use super::keyframe::Keyframe;
use crate::core::types::{Covariance2D, LaserScan, PointCloud2D, Pose2D};

/// Relative pose measurement with its uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseDeltaWithCovariance {
    /// Relative pose (x, y, theta).
    pub delta: Pose2D,
    /// Covariance over (x, y, theta).
    pub covariance: Covariance2D,
}

/// Proposed edge between two keyframes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    /// Reference keyframe (always the last accepted keyframe).
    pub id_1: u64,

    /// Other endpoint.
    ///
    /// `None` for the edge to the proposed keyframe, whose id the backend
    /// has not assigned yet.
    pub id_2: Option<u64>,

    /// Measured relative pose of `id_2` in the frame of `id_1`.
    ///
    /// `None` when the alignment did not converge.
    pub delta: Option<PoseDeltaWithCovariance>,
}

/// Keyframe candidate built from the current scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewKeyframe {
    /// Scan timestamp in microseconds.
    pub timestamp_us: u64,
    /// Cloud converted from the scan.
    pub cloud: PointCloud2D,
    /// The scan as received.
    pub scan: LaserScan,
}

/// Consolidated decision for one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    /// Store was empty; nothing was aligned.
    pub first_frame_flag: bool,
    /// The scan was voted in as a new keyframe.
    pub keyframe_flag: bool,
    /// A loop closure was accepted.
    pub loop_closure_flag: bool,

    pub keyframe_new: NewKeyframe,
    /// Present unless this is the first frame.
    pub keyframe_last: Option<Keyframe>,
    /// Present only when `loop_closure_flag` is set.
    pub keyframe_loop: Option<Keyframe>,
    /// Present when `keyframe_flag` is set.
    pub factor_new: Option<Factor>,
    /// Present only when `loop_closure_flag` is set.
    pub factor_loop: Option<Factor>,
}

impl RegistrationRecord {
    /// Record for a scan arriving while the store holds no keyframe.
    pub fn first_frame(keyframe_new: NewKeyframe) -> Self {
        Self {
            first_frame_flag: true,
            keyframe_flag: false,
            loop_closure_flag: false,
            keyframe_new,
            keyframe_last: None,
            keyframe_loop: None,
            factor_new: None,
            factor_loop: None,
        }
    }

    /// Whether the backend should store `keyframe_new`.
    pub fn proposes_keyframe(&self) -> bool {
        self.first_frame_flag || self.keyframe_flag
    }
}
