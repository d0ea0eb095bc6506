//! Point-to-Point Iterative Closest Point (ICP) registration.
//!
//! # Algorithm
//!
//! ```text
//! Input: Source cloud S, Target cloud T, Initial guess T₀
//! Output: Transform T* that aligns S to T
//!
//! 1. S' = T₀ · S
//! 2. Repeat:
//!    a. Pair each point of S' with its nearest neighbour in T
//!       (reciprocal, within the correspondence distance)
//!    b. Solve the closed-form rigid transform ΔT for the pairs
//!    c. T* = ΔT · T*,  S' = ΔT · S'
//!    d. Stop when a convergence criterion fires
//! 3. Fitness = mean squared nearest-neighbour distance of T* · S to T
//! ```
//!
//! # Convergence criteria
//!
//! Checked in order after every iteration:
//!
//! | State | Condition |
//! |-------|-----------|
//! | `IterationLimit` | iteration count reached `max_iterations` |
//! | `TransformThreshold` | ‖Δt‖² ≤ `transformation_epsilon` and \|Δθ\| ≤ `rotation_epsilon` |
//! | `AbsoluteMse` | \|mse - prev_mse\| < `euclidean_fitness_epsilon` |
//! | `RelativeMse` | \|mse - prev_mse\| / prev_mse < `relative_mse_epsilon` |
//!
//! The last three only fire once they held for
//! `max_iterations_similar_transforms` consecutive iterations.

use std::collections::HashSet;

use kiddo::{ImmutableKdTree, SquaredEuclidean};
use serde::{Deserialize, Serialize};

use super::{Alignment, ConvergenceState, Registration};
use crate::core::types::{Point2D, PointCloud2D, Pose2D, Transform3};

/// Configuration for Point-to-Point ICP.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IcpConfig {
    /// Maximum number of iterations.
    pub max_iterations: u32,

    /// Squared translation (m²) of the incremental transform below which
    /// it counts as similar.
    pub transformation_epsilon: f32,

    /// Rotation (radians) of the incremental transform below which it
    /// counts as similar.
    pub rotation_epsilon: f32,

    /// Absolute MSE change (m²) below which two iterations count as similar.
    pub euclidean_fitness_epsilon: f32,

    /// Relative MSE change below which two iterations count as similar.
    pub relative_mse_epsilon: f32,

    /// Consecutive similar iterations required before declaring convergence.
    pub max_iterations_similar_transforms: u32,

    /// Minimum number of valid correspondences required.
    pub min_correspondences: usize,

    /// Report hitting `max_iterations` as non-convergence.
    pub fail_after_max_iterations: bool,

    /// Keep only pairs that are each other's nearest neighbour.
    pub use_reciprocal_correspondences: bool,
}

impl Default for IcpConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            transformation_epsilon: 1e-8,
            rotation_epsilon: 0.0045, // ~0.26°
            euclidean_fitness_epsilon: 1.0,
            relative_mse_epsilon: 1e-5,
            max_iterations_similar_transforms: 10,
            min_correspondences: 3,
            fail_after_max_iterations: false,
            use_reciprocal_correspondences: true,
        }
    }
}

/// Point pair: (source index, target index, squared distance).
type Correspondence = (usize, usize, f32);

/// Nearest neighbour index over a cloud.
///
/// Exact duplicates are collapsed onto their first occurrence, so queries
/// return the lowest cloud index at the nearest position.
struct PointIndex {
    tree: ImmutableKdTree<f32, 2>,
    /// Cloud index of each point handed to the tree
    ids: Vec<usize>,
}

impl PointIndex {
    /// Index over `cloud`, which must not be empty.
    fn build(cloud: &PointCloud2D) -> Self {
        let mut seen = HashSet::with_capacity(cloud.len());
        let mut points = Vec::with_capacity(cloud.len());
        let mut ids = Vec::with_capacity(cloud.len());
        for (i, (&x, &y)) in cloud.xs.iter().zip(cloud.ys.iter()).enumerate() {
            // +0.0 folds -0.0 onto 0.0
            if seen.insert(((x + 0.0).to_bits(), (y + 0.0).to_bits())) {
                points.push([x, y]);
                ids.push(i);
            }
        }
        Self {
            tree: ImmutableKdTree::new_from_slice(&points),
            ids,
        }
    }

    /// Cloud index and squared distance of the point nearest (`x`, `y`).
    #[inline]
    fn nearest(&self, x: f32, y: f32) -> (usize, f32) {
        let nn = self.tree.nearest_one::<SquaredEuclidean>(&[x, y]);
        (self.ids[nn.item as usize], nn.distance)
    }

    /// Number of distinct positions.
    #[cfg(test)]
    fn len(&self) -> usize {
        self.ids.len()
    }
}

/// Point-to-Point ICP registration oracle.
///
/// Uses an immutable k-d tree over the target for nearest neighbour queries.
/// Suitable for small to medium initial pose errors (<20cm, <10°).
#[derive(Debug, Clone)]
pub struct PointToPointIcp {
    config: IcpConfig,
}

impl PointToPointIcp {
    /// Create a new ICP oracle with the given configuration.
    pub fn new(config: IcpConfig) -> Self {
        Self { config }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &IcpConfig {
        &self.config
    }

    /// Pair every point of the (already transformed) source with its nearest
    /// target point within `max_dist_sq`.
    fn find_correspondences(
        &self,
        source: &PointCloud2D,
        target: &PointCloud2D,
        target_index: &PointIndex,
        max_dist_sq: f32,
    ) -> Vec<Correspondence> {
        let source_index = self
            .config
            .use_reciprocal_correspondences
            .then(|| PointIndex::build(source));

        let mut correspondences = Vec::with_capacity(source.len());
        for (i, (&x, &y)) in source.xs.iter().zip(source.ys.iter()).enumerate() {
            let (j, dist_sq) = target_index.nearest(x, y);
            if dist_sq > max_dist_sq {
                continue;
            }

            if let Some(index) = &source_index
                && index.nearest(target.xs[j], target.ys[j]).0 != i
            {
                continue;
            }
            correspondences.push((i, j, dist_sq));
        }
        correspondences
    }

    /// Closed-form rigid transform minimizing Σ‖R·s + t - q‖² over the pairs.
    fn estimate_transform(
        source: &PointCloud2D,
        target: &PointCloud2D,
        correspondences: &[Correspondence],
    ) -> Pose2D {
        let n = correspondences.len() as f32;
        let mut source_centroid = Point2D::default();
        let mut target_centroid = Point2D::default();

        for &(si, ti, _) in correspondences {
            source_centroid.x += source.xs[si];
            source_centroid.y += source.ys[si];
            target_centroid.x += target.xs[ti];
            target_centroid.y += target.ys[ti];
        }
        source_centroid.x /= n;
        source_centroid.y /= n;
        target_centroid.x /= n;
        target_centroid.y /= n;

        // H = Σ (s - s̄)(q - q̄)ᵀ
        let mut h00 = 0.0f32;
        let mut h01 = 0.0f32;
        let mut h10 = 0.0f32;
        let mut h11 = 0.0f32;

        for &(si, ti, _) in correspondences {
            let sx = source.xs[si] - source_centroid.x;
            let sy = source.ys[si] - source_centroid.y;
            let tx = target.xs[ti] - target_centroid.x;
            let ty = target.ys[ti] - target_centroid.y;

            h00 += sx * tx;
            h01 += sx * ty;
            h10 += sy * tx;
            h11 += sy * ty;
        }

        let dtheta = (h01 - h10).atan2(h00 + h11);
        let (sin_dt, cos_dt) = dtheta.sin_cos();
        Pose2D::new(
            target_centroid.x - (source_centroid.x * cos_dt - source_centroid.y * sin_dt),
            target_centroid.y - (source_centroid.x * sin_dt + source_centroid.y * cos_dt),
            dtheta,
        )
    }

    /// Mean squared nearest-neighbour distance over all transformed points.
    fn fitness_score(aligned: &PointCloud2D, target_index: &PointIndex) -> f32 {
        if aligned.is_empty() {
            return f32::MAX;
        }
        let sum: f32 = aligned
            .xs
            .iter()
            .zip(aligned.ys.iter())
            .map(|(&x, &y)| target_index.nearest(x, y).1)
            .sum();
        sum / aligned.len() as f32
    }
}

/// Tracks the similar-iteration streak across ICP iterations.
struct ConvergenceCriteria<'a> {
    config: &'a IcpConfig,
    similar_iterations: u32,
    prev_mse: f32,
}

/// Verdict of one convergence check.
enum Verdict {
    Continue,
    Converged(ConvergenceState),
    Failed,
}

impl<'a> ConvergenceCriteria<'a> {
    fn new(config: &'a IcpConfig) -> Self {
        Self {
            config,
            similar_iterations: 0,
            prev_mse: f32::MAX,
        }
    }

    fn check(&mut self, iterations: u32, delta: &Pose2D, mse: f32) -> Verdict {
        if iterations >= self.config.max_iterations {
            if self.config.fail_after_max_iterations {
                return Verdict::Failed;
            }
            return Verdict::Converged(ConvergenceState::IterationLimit);
        }

        let streak_complete =
            self.similar_iterations >= self.config.max_iterations_similar_transforms;
        let mut is_similar = false;

        if delta.translation_squared() <= self.config.transformation_epsilon
            && delta.theta.abs() <= self.config.rotation_epsilon
        {
            if streak_complete {
                return Verdict::Converged(ConvergenceState::TransformThreshold);
            }
            is_similar = true;
        }

        let mse_change = (mse - self.prev_mse).abs();
        if mse_change < self.config.euclidean_fitness_epsilon {
            if streak_complete {
                return Verdict::Converged(ConvergenceState::AbsoluteMse);
            }
            is_similar = true;
        }

        if mse_change / self.prev_mse < self.config.relative_mse_epsilon {
            if streak_complete {
                return Verdict::Converged(ConvergenceState::RelativeMse);
            }
            is_similar = true;
        }

        if is_similar {
            self.similar_iterations += 1;
        } else {
            self.similar_iterations = 0;
        }
        self.prev_mse = mse;
        Verdict::Continue
    }
}

impl Registration for PointToPointIcp {
    fn align(
        &self,
        source: &PointCloud2D,
        target: &PointCloud2D,
        initial_guess: &Transform3,
        max_correspondence_distance: f32,
    ) -> Alignment {
        if source.is_empty() || target.is_empty() {
            return Alignment::failed(initial_guess, ConvergenceState::NoCorrespondences);
        }

        let target_index = PointIndex::build(target);
        let max_dist_sq = max_correspondence_distance * max_correspondence_distance;

        let mut current = Pose2D::from_transform(initial_guess);
        let mut aligned = source.transform(&current);
        let mut criteria = ConvergenceCriteria::new(&self.config);
        let mut iterations = 0u32;

        let state = loop {
            let correspondences =
                self.find_correspondences(&aligned, target, &target_index, max_dist_sq);
            if correspondences.len() < self.config.min_correspondences.max(1) {
                break ConvergenceState::NoCorrespondences;
            }

            let mse = correspondences.iter().map(|c| c.2).sum::<f32>()
                / correspondences.len() as f32;

            let delta = Self::estimate_transform(&aligned, target, &correspondences);
            current = delta.compose(&current);
            aligned = source.transform(&current);
            iterations += 1;

            match criteria.check(iterations, &delta, mse) {
                Verdict::Continue => {}
                Verdict::Converged(state) => break state,
                Verdict::Failed => break ConvergenceState::NotConverged,
            }
        };

        let converged = !matches!(
            state,
            ConvergenceState::NotConverged | ConvergenceState::NoCorrespondences
        );

        Alignment {
            converged,
            fitness: Self::fitness_score(&aligned, &target_index),
            transform: current.to_transform(),
            convergence_state: state,
            iterations,
        }
    }
}
