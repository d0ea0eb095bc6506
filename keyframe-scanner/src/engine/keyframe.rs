//! Keyframes and the keyframe store seam.
//!
//! The engine never owns keyframes. It asks a [`KeyframeStore`] for the last
//! accepted keyframe and for loop-closure candidates, and proposes new ones
//! through its records. [`InMemoryKeyframeStore`] is a self-contained store
//! that ingests those records directly, for replay and tests.

use serde::{Deserialize, Serialize};

use super::record::RegistrationRecord;
use crate::core::types::{PointCloud2D, Pose2D};

/// A keyframe accepted by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Backend-assigned identifier. Increases monotonically, never reused.
    pub id: u64,

    /// Timestamp of the originating scan (microseconds).
    pub timestamp_us: u64,

    /// Point cloud in the sensor frame.
    pub cloud: PointCloud2D,

    /// Current best estimate of the keyframe's global pose.
    pub optimized_pose: Pose2D,
}

impl Keyframe {
    /// Create a new keyframe.
    pub fn new(id: u64, timestamp_us: u64, cloud: PointCloud2D, optimized_pose: Pose2D) -> Self {
        Self {
            id,
            timestamp_us,
            cloud,
            optimized_pose,
        }
    }

    /// Squared planar distance between two keyframe poses.
    #[inline]
    pub fn distance_squared(&self, other: &Keyframe) -> f32 {
        let dx = self.optimized_pose.x - other.optimized_pose.x;
        let dy = self.optimized_pose.y - other.optimized_pose.y;
        dx * dx + dy * dy
    }
}

/// Pose-graph backend queries used by the engine.
///
/// `None` means the backend had nothing to return, whether because it is
/// empty or because the call failed. The engine treats both alike.
pub trait KeyframeStore {
    /// Most recently accepted keyframe.
    fn last_keyframe(&mut self) -> Option<Keyframe>;

    /// Loop-closure candidate for `reference`, by the store's own notion of
    /// proximity.
    fn closest_keyframe(&mut self, reference: &Keyframe) -> Option<Keyframe>;
}

/// Configuration for [`InMemoryKeyframeStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyframeStoreConfig {
    /// Keyframes within this many ids of the reference are never returned
    /// as closest. Prevents closing loops with immediate neighbours.
    pub min_keyframe_gap: u64,

    /// Maximum Euclidean distance (meters) to search for candidates.
    pub max_search_distance: f32,
}

impl Default for KeyframeStoreConfig {
    fn default() -> Self {
        Self {
            min_keyframe_gap: 2,
            max_search_distance: 10.0,
        }
    }
}

/// Keyframe store held in memory.
///
/// Poses are dead-reckoned from the factors of ingested records and never
/// optimized.
#[derive(Debug, Default)]
pub struct InMemoryKeyframeStore {
    config: KeyframeStoreConfig,

    /// All keyframes in chronological order.
    keyframes: Vec<Keyframe>,

    /// Next keyframe ID.
    next_id: u64,
}

impl InMemoryKeyframeStore {
    /// Create an empty store.
    pub fn new(config: KeyframeStoreConfig) -> Self {
        Self {
            config,
            keyframes: Vec::new(),
            next_id: 0,
        }
    }

    /// Store the keyframe proposed by `record`, if any.
    ///
    /// The new pose is the last keyframe's pose composed with the
    /// `factor_new` delta, or the last pose itself when no delta is
    /// available. Returns the assigned id.
    pub fn ingest(&mut self, record: &RegistrationRecord) -> Option<u64> {
        if !record.proposes_keyframe() {
            return None;
        }

        let pose = match self.keyframes.last() {
            None => Pose2D::identity(),
            Some(last) => {
                let delta = record
                    .factor_new
                    .as_ref()
                    .and_then(|factor| factor.delta.as_ref())
                    .map(|measured| measured.delta);
                match delta {
                    Some(delta) => last.optimized_pose.compose(&delta),
                    None => {
                        log::debug!(
                            "Keyframe after {} has no delta, reusing its pose",
                            last.id
                        );
                        last.optimized_pose
                    }
                }
            }
        };

        let id = self.next_id;
        self.next_id += 1;
        self.keyframes.push(Keyframe::new(
            id,
            record.keyframe_new.timestamp_us,
            record.keyframe_new.cloud.clone(),
            pose,
        ));

        log::debug!(
            "Stored keyframe {} at ({:.3}, {:.3}, {:.3})",
            id, pose.x, pose.y, pose.theta
        );
        Some(id)
    }

    /// Insert a keyframe as-is, e.g. when seeding from a saved map.
    ///
    /// Ids must keep increasing; the next assigned id follows this one.
    pub fn insert(&mut self, keyframe: Keyframe) {
        self.next_id = self.next_id.max(keyframe.id + 1);
        self.keyframes.push(keyframe);
    }

    /// Get all keyframes.
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Get a keyframe by ID.
    pub fn get(&self, id: u64) -> Option<&Keyframe> {
        self.keyframes.iter().find(|kf| kf.id == id)
    }

    /// Get number of keyframes.
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Clear all keyframes.
    pub fn clear(&mut self) {
        self.keyframes.clear();
        self.next_id = 0;
    }

    /// Get configuration.
    pub fn config(&self) -> &KeyframeStoreConfig {
        &self.config
    }
}

impl KeyframeStore for InMemoryKeyframeStore {
    fn last_keyframe(&mut self) -> Option<Keyframe> {
        self.keyframes.last().cloned()
    }

    fn closest_keyframe(&mut self, reference: &Keyframe) -> Option<Keyframe> {
        let max_dist_sq = self.config.max_search_distance * self.config.max_search_distance;

        self.keyframes
            .iter()
            .filter(|kf| reference.id.abs_diff(kf.id) > self.config.min_keyframe_gap)
            .map(|kf| (kf, kf.distance_squared(reference)))
            .filter(|&(_, dist_sq)| dist_sq <= max_dist_sq)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(kf, _)| kf.clone())
    }
}
