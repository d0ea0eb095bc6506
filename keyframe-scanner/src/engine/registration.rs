//! Registration decision engine.
//!
//! For each scan the engine aligns the scan against the last keyframe,
//! votes on whether it becomes a new keyframe, paces loop-closure attempts,
//! and emits one [`RegistrationRecord`].
//!
//! # Per-scan flow
//!
//! ```text
//! scan ─► validate ─► last keyframe? ──none──► first-frame record
//!                          │
//!                          ▼
//!              align(scan → last, guess = carried)
//!                          │
//!                  vote for keyframe ──no──► carried = transform
//!                          │yes
//!              carried = identity, counter += 1
//!                          │
//!              counter ≥ skip? ──yes──► closest keyframe ─► align(closest → last)
//!                                                              │
//!                                       converged && fitness < loop threshold
//!                                                              │
//!                                                    loop factor, counter = 0
//! ```
//!
//! Alignment non-convergence forces a keyframe vote: the scan can no longer
//! be related to the last keyframe with confidence.

use std::time::Instant;

use super::keyframe::{Keyframe, KeyframeStore};
use super::record::{Factor, NewKeyframe, PoseDeltaWithCovariance, RegistrationRecord};
use crate::algorithms::matching::{Alignment, Registration};
use crate::algorithms::uncertainty::UncertaintyModel;
use crate::config::{KeyframeConfig, LoopClosureConfig, ScannerConfig};
use crate::core::types::{LaserScan, PointCloud2D, Pose2D, Timestamped, Transform3};
use crate::error::{ConfigError, Result, ScannerError};
use crate::sensors::preprocessing::ScanPreprocessor;

/// Scan registration decision engine.
///
/// Generic over its three collaborators so each can be swapped or mocked.
/// All mutable state lives in the instance; `process_scan` takes `&mut self`,
/// so runs are serialized by the borrow checker.
pub struct RegistrationEngine<R, S, P> {
    oracle: R,
    store: S,
    preprocessor: P,
    uncertainty: UncertaintyModel,

    keyframe: KeyframeConfig,
    loop_closure: LoopClosureConfig,
    correspondence_distance: f32,

    /// Initial guess for the next primary alignment.
    carried_transform: Transform3,

    /// Keyframes created since the last accepted loop closure.
    loop_attempt_counter: u32,
}

impl<R, S, P> RegistrationEngine<R, S, P>
where
    R: Registration,
    S: KeyframeStore,
    P: ScanPreprocessor,
{
    /// Create an engine after validating `config`.
    pub fn new(
        config: &ScannerConfig,
        oracle: R,
        store: S,
        preprocessor: P,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            oracle,
            store,
            preprocessor,
            uncertainty: UncertaintyModel::new(config.uncertainty),
            keyframe: config.keyframe.clone(),
            loop_closure: config.loop_closure.clone(),
            correspondence_distance: config.registration.gicp_maximum_correspondence_distance,
            carried_transform: Transform3::identity(),
            loop_attempt_counter: 0,
        })
    }

    /// Process one scan and produce its record.
    ///
    /// Returns [`ScannerError::MalformedInput`] for scans that cannot be
    /// registered. Such scans leave the engine state untouched and the
    /// caller can continue with the next scan.
    pub fn process_scan(&mut self, scan: Timestamped<LaserScan>) -> Result<RegistrationRecord> {
        let cloud = match self.prepare(&scan.data) {
            Ok(cloud) => cloud,
            Err(e) => {
                log::warn!("Rejected scan at {} us: {}", scan.timestamp_us, e);
                return Err(e);
            }
        };

        let keyframe_new = NewKeyframe {
            timestamp_us: scan.timestamp_us,
            cloud,
            scan: scan.data,
        };

        let Some(last) = self.store.last_keyframe() else {
            log::info!(
                "First frame at {} us, proposing initial keyframe",
                keyframe_new.timestamp_us
            );
            return Ok(RegistrationRecord::first_frame(keyframe_new));
        };

        let start = Instant::now();
        let alignment = self.oracle.align(
            &keyframe_new.cloud,
            &last.cloud,
            &self.carried_transform,
            self.correspondence_distance,
        );
        let align_ms = start.elapsed().as_secs_f32() * 1000.0;

        let measured = alignment.converged.then(|| self.measure(&alignment));
        let delta = measured.as_ref().map(|m| &m.delta);
        let keyframe_flag = self.vote_for_keyframe(alignment.fitness, delta);

        let mut record = RegistrationRecord {
            first_frame_flag: false,
            keyframe_flag,
            loop_closure_flag: false,
            keyframe_new,
            keyframe_last: None,
            keyframe_loop: None,
            factor_new: None,
            factor_loop: None,
        };

        if !keyframe_flag {
            log::debug!(
                "Tracking keyframe {}: align {:.1} ms, fitness {:.4}, {}, delta {}",
                last.id,
                align_ms,
                alignment.fitness,
                alignment.convergence_state,
                format_delta(delta)
            );
            self.carried_transform = alignment.transform;
            record.keyframe_last = Some(last);
            return Ok(record);
        }

        log::info!(
            "Keyframe after {}: align {:.1} ms, fitness {:.4}, {}, delta {}",
            last.id,
            align_ms,
            alignment.fitness,
            alignment.convergence_state,
            format_delta(delta)
        );

        self.carried_transform = Transform3::identity();
        self.loop_attempt_counter += 1;
        record.factor_new = Some(Factor {
            id_1: last.id,
            id_2: None,
            delta: measured,
        });

        if self.loop_attempt_counter >= self.loop_closure.loop_closure_skip
            && let Some((closest, factor)) = self.attempt_loop_closure(&last)
        {
            record.loop_closure_flag = true;
            record.keyframe_loop = Some(closest);
            record.factor_loop = Some(factor);
        }

        record.keyframe_last = Some(last);
        Ok(record)
    }

    /// Keyframe vote.
    ///
    /// True when the fitness is poor or the motion is large. Without a delta
    /// (alignment did not converge) the vote is always true.
    pub fn vote_for_keyframe(&self, fitness: f32, delta: Option<&Pose2D>) -> bool {
        let Some(delta) = delta else {
            return true;
        };
        let distance = self.keyframe.distance_threshold;

        fitness > self.keyframe.fitness_keyframe_threshold
            || delta.theta.abs() > self.keyframe.rotation_threshold
            || delta.translation_squared() > distance * distance
    }

    /// Search for and verify a loop closure against `last`.
    ///
    /// Returns the loop keyframe and its factor when accepted.
    fn attempt_loop_closure(&mut self, last: &Keyframe) -> Option<(Keyframe, Factor)> {
        let Some(closest) = self.store.closest_keyframe(last) else {
            log::debug!(
                "No loop-closure candidate for keyframe {} (attempt {})",
                last.id,
                self.loop_attempt_counter
            );
            return None;
        };

        let prior = last.optimized_pose.inverse().to_transform()
            * closest.optimized_pose.to_transform();

        let start = Instant::now();
        let alignment = self.oracle.align(
            &closest.cloud,
            &last.cloud,
            &prior,
            self.loop_closure.loop_closure_correspondence_distance,
        );
        let align_ms = start.elapsed().as_secs_f32() * 1000.0;

        let accepted =
            alignment.converged && alignment.fitness < self.loop_closure.fitness_loop_threshold;

        log::info!(
            "Loop closure {} -> {} {}: align {:.1} ms, fitness {:.4}, {}, delta {}",
            last.id,
            closest.id,
            if accepted { "accepted" } else { "rejected" },
            align_ms,
            alignment.fitness,
            alignment.convergence_state,
            format_delta(Some(&alignment.delta()))
        );

        if !accepted {
            return None;
        }

        self.loop_attempt_counter = 0;
        let factor = Factor {
            id_1: last.id,
            id_2: Some(closest.id),
            delta: Some(self.measure(&alignment)),
        };
        Some((closest, factor))
    }

    fn measure(&self, alignment: &Alignment) -> PoseDeltaWithCovariance {
        let delta = alignment.delta();
        PoseDeltaWithCovariance {
            delta,
            covariance: self.uncertainty.covariance(&delta),
        }
    }

    fn prepare(&self, scan: &LaserScan) -> Result<PointCloud2D> {
        if scan.is_empty() {
            return Err(ScannerError::MalformedInput("empty scan".into()));
        }
        scan.validate()
            .map_err(|reason| ScannerError::MalformedInput(reason.into()))?;
        if scan.valid_count() == 0 {
            return Err(ScannerError::MalformedInput("no valid ranges".into()));
        }

        let cloud = self.preprocessor.to_point_cloud(scan);
        if cloud.is_empty() {
            return Err(ScannerError::MalformedInput(
                "converted point cloud is empty".into(),
            ));
        }
        Ok(cloud)
    }

    /// Initial guess for the next primary alignment.
    pub fn carried_transform(&self) -> &Transform3 {
        &self.carried_transform
    }

    /// Keyframes created since the last accepted loop closure.
    pub fn loop_attempt_counter(&self) -> u32 {
        self.loop_attempt_counter
    }

    pub fn oracle(&self) -> &R {
        &self.oracle
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable store access, e.g. to ingest emitted records.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn uncertainty(&self) -> &UncertaintyModel {
        &self.uncertainty
    }
}

fn format_delta(delta: Option<&Pose2D>) -> String {
    match delta {
        Some(d) => format!("({:.3}, {:.3}, {:.3})", d.x, d.y, d.theta),
        None => "unavailable".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::matching::ConvergenceState;
    use crate::core::types::Point2D;
    use crate::sensors::preprocessing::ScanConverter;
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Arguments of one oracle call.
    #[derive(Debug, Clone)]
    struct AlignCall {
        source_len: usize,
        target_len: usize,
        guess: Transform3,
        tolerance: f32,
    }

    /// Oracle replaying scripted alignments, converged identity when empty.
    #[derive(Default)]
    struct ScriptedOracle {
        script: RefCell<VecDeque<Alignment>>,
        calls: RefCell<Vec<AlignCall>>,
    }

    impl ScriptedOracle {
        fn push(&self, alignment: Alignment) {
            self.script.borrow_mut().push_back(alignment);
        }

        fn calls(&self) -> Vec<AlignCall> {
            self.calls.borrow().clone()
        }
    }

    impl Registration for ScriptedOracle {
        fn align(
            &self,
            source: &PointCloud2D,
            target: &PointCloud2D,
            initial_guess: &Transform3,
            max_correspondence_distance: f32,
        ) -> Alignment {
            self.calls.borrow_mut().push(AlignCall {
                source_len: source.len(),
                target_len: target.len(),
                guess: *initial_guess,
                tolerance: max_correspondence_distance,
            });
            self.script
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| converged(0.0, Pose2D::identity()))
        }
    }

    #[derive(Default)]
    struct MockStore {
        last: Option<Keyframe>,
        closest: Option<Keyframe>,
        last_queries: u32,
        closest_queries: u32,
    }

    impl KeyframeStore for MockStore {
        fn last_keyframe(&mut self) -> Option<Keyframe> {
            self.last_queries += 1;
            self.last.clone()
        }

        fn closest_keyframe(&mut self, _reference: &Keyframe) -> Option<Keyframe> {
            self.closest_queries += 1;
            self.closest.clone()
        }
    }

    type TestEngine = RegistrationEngine<ScriptedOracle, MockStore, ScanConverter>;

    fn converged(fitness: f32, delta: Pose2D) -> Alignment {
        Alignment {
            converged: true,
            fitness,
            transform: delta.to_transform(),
            convergence_state: ConvergenceState::AbsoluteMse,
            iterations: 12,
        }
    }

    fn diverged() -> Alignment {
        Alignment {
            converged: false,
            fitness: 9.0,
            transform: Pose2D::new(0.3, 0.1, 0.2).to_transform(),
            convergence_state: ConvergenceState::NotConverged,
            iterations: 50,
        }
    }

    fn keyframe(id: u64, points: usize, pose: Pose2D) -> Keyframe {
        let cloud = PointCloud2D::from_points(
            &(0..points)
                .map(|i| Point2D::new(i as f32 * 0.1, 1.0))
                .collect::<Vec<_>>(),
        );
        Keyframe::new(id, id * 1000, cloud, pose)
    }

    fn scan(timestamp_us: u64) -> Timestamped<LaserScan> {
        let ranges = vec![1.0; 36];
        Timestamped::new(
            LaserScan::new(0.0, std::f32::consts::TAU, std::f32::consts::TAU / 36.0, 0.1, 10.0, ranges),
            timestamp_us,
        )
    }

    fn engine_with(config: ScannerConfig, store: MockStore) -> TestEngine {
        RegistrationEngine::new(&config, ScriptedOracle::default(), store, ScanConverter::default())
            .unwrap()
    }

    fn tracking_engine() -> TestEngine {
        engine_with(
            ScannerConfig::default(),
            MockStore {
                last: Some(keyframe(3, 20, Pose2D::identity())),
                ..MockStore::default()
            },
        )
    }

    #[test]
    fn test_first_frame_without_keyframes() {
        let mut engine = engine_with(ScannerConfig::default(), MockStore::default());

        let record = engine.process_scan(scan(100)).unwrap();

        assert!(record.first_frame_flag);
        assert!(!record.keyframe_flag);
        assert!(!record.loop_closure_flag);
        assert_eq!(record.keyframe_new.timestamp_us, 100);
        assert_eq!(record.keyframe_new.cloud.len(), 36);
        assert_eq!(record.keyframe_new.scan.ranges.len(), 36);
        assert!(record.keyframe_last.is_none());
        assert!(engine.oracle().calls().is_empty());
    }

    #[test]
    fn test_high_fitness_votes_keyframe() {
        let mut engine = tracking_engine();
        engine.oracle().push(converged(2.0, Pose2D::identity()));

        let record = engine.process_scan(scan(1)).unwrap();

        assert!(record.keyframe_flag);
        assert!(!record.first_frame_flag);
        let factor = record.factor_new.unwrap();
        assert_eq!(factor.id_1, 3);
        assert_eq!(factor.id_2, None);
        assert!(factor.delta.is_some());
    }

    #[test]
    fn test_small_motion_does_not_vote() {
        let mut engine = tracking_engine();
        let delta = Pose2D::new(0.05, 0.0, 0.0);
        engine.oracle().push(converged(0.5, delta));

        let record = engine.process_scan(scan(1)).unwrap();

        assert!(!record.keyframe_flag);
        assert!(record.factor_new.is_none());
        assert_eq!(record.keyframe_last.map(|kf| kf.id), Some(3));
        assert_eq!(*engine.carried_transform(), delta.to_transform());
        assert_eq!(engine.loop_attempt_counter(), 0);
    }

    #[test]
    fn test_rotation_votes_keyframe() {
        let mut engine = tracking_engine();
        engine.oracle().push(converged(0.1, Pose2D::new(0.0, 0.0, -1.2)));

        assert!(engine.process_scan(scan(1)).unwrap().keyframe_flag);
    }

    #[test]
    fn test_translation_votes_keyframe() {
        let mut engine = tracking_engine();
        engine.oracle().push(converged(0.1, Pose2D::new(0.8, 0.7, 0.0)));

        assert!(engine.process_scan(scan(1)).unwrap().keyframe_flag);
    }

    #[test]
    fn test_vote_thresholds_are_strict() {
        let engine = tracking_engine();

        assert!(!engine.vote_for_keyframe(1.5, Some(&Pose2D::new(1.0, 0.0, 0.0))));
        assert!(!engine.vote_for_keyframe(0.0, Some(&Pose2D::new(0.0, 0.0, 1.0))));
        assert!(engine.vote_for_keyframe(1.51, Some(&Pose2D::identity())));
        assert!(engine.vote_for_keyframe(0.0, None));
    }

    #[test]
    fn test_non_convergence_forces_keyframe() {
        let mut engine = tracking_engine();
        engine.oracle().push(converged(0.1, Pose2D::new(0.2, 0.0, 0.0)));
        engine.process_scan(scan(1)).unwrap();
        assert_ne!(*engine.carried_transform(), Transform3::identity());

        engine.oracle().push(diverged());
        let record = engine.process_scan(scan(2)).unwrap();

        assert!(record.keyframe_flag);
        let factor = record.factor_new.unwrap();
        assert_eq!(factor.id_1, 3);
        assert!(factor.delta.is_none());
        assert_eq!(*engine.carried_transform(), Transform3::identity());
        assert_eq!(engine.loop_attempt_counter(), 1);
    }

    #[test]
    fn test_carried_transform_seeds_next_alignment() {
        let mut engine = tracking_engine();
        let first = Pose2D::new(0.1, 0.02, 0.05);
        engine.oracle().push(converged(0.2, first));
        engine.oracle().push(converged(0.2, Pose2D::new(0.2, 0.0, 0.1)));
        engine.oracle().push(converged(3.0, Pose2D::identity()));
        engine.oracle().push(converged(0.2, Pose2D::identity()));

        for t in 0..4 {
            engine.process_scan(scan(t)).unwrap();
        }

        let calls = engine.oracle().calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0].guess, Transform3::identity());
        assert_eq!(calls[1].guess, first.to_transform());
        assert_eq!(calls[2].guess, Pose2D::new(0.2, 0.0, 0.1).to_transform());
        // Keyframe in call 2 resets the guess
        assert_eq!(calls[3].guess, Transform3::identity());

        for call in &calls {
            assert_eq!(call.source_len, 36);
            assert_eq!(call.target_len, 20);
            assert_relative_eq!(call.tolerance, 0.05);
        }
    }

    #[test]
    fn test_factor_covariance_follows_uncertainty_model() {
        let mut engine = tracking_engine();
        let delta = Pose2D::new(1.5, 0.0, 0.3);
        engine.oracle().push(converged(0.1, delta));

        let record = engine.process_scan(scan(1)).unwrap();
        let measured = record.factor_new.and_then(|f| f.delta).unwrap();

        assert_relative_eq!(measured.delta.x, 1.5, epsilon = 1e-6);
        assert_relative_eq!(measured.delta.theta, 0.3, epsilon = 1e-6);
        assert_eq!(measured.covariance, engine.uncertainty().covariance(&measured.delta));
    }

    #[test]
    fn test_loop_closure_paced_by_skip() {
        let mut engine = tracking_engine();

        for t in 0..3 {
            engine.oracle().push(converged(2.0, Pose2D::identity()));
            let record = engine.process_scan(scan(t)).unwrap();
            assert!(record.keyframe_flag);
            assert!(!record.loop_closure_flag);
        }
        assert_eq!(engine.store().closest_queries, 0);
        assert_eq!(engine.loop_attempt_counter(), 3);

        // Fourth keyframe is due; store has no candidate
        engine.oracle().push(converged(2.0, Pose2D::identity()));
        let record = engine.process_scan(scan(3)).unwrap();
        assert!(!record.loop_closure_flag);
        assert!(record.keyframe_loop.is_none());
        assert_eq!(engine.store().closest_queries, 1);
        assert_eq!(engine.loop_attempt_counter(), 4);

        // Counter was not reset, so the next keyframe retries
        engine.oracle().push(converged(2.0, Pose2D::identity()));
        engine.process_scan(scan(4)).unwrap();
        assert_eq!(engine.store().closest_queries, 2);
        assert_eq!(engine.loop_attempt_counter(), 5);
    }

    #[test]
    fn test_non_keyframe_scans_do_not_advance_pacing() {
        let mut engine = tracking_engine();

        for t in 0..10 {
            engine.oracle().push(converged(0.1, Pose2D::new(0.01, 0.0, 0.0)));
            engine.process_scan(scan(t)).unwrap();
        }
        assert_eq!(engine.loop_attempt_counter(), 0);
        assert_eq!(engine.store().closest_queries, 0);
    }

    fn loop_engine() -> TestEngine {
        let mut config = ScannerConfig::default();
        config.loop_closure.loop_closure_skip = 1;
        engine_with(
            config,
            MockStore {
                last: Some(keyframe(9, 20, Pose2D::new(2.0, 1.0, 0.5))),
                closest: Some(keyframe(2, 15, Pose2D::new(2.5, 1.2, 0.3))),
                ..MockStore::default()
            },
        )
    }

    #[test]
    fn test_loop_closure_accepted() {
        let mut engine = loop_engine();
        let loop_delta = Pose2D::new(0.4, -0.1, -0.2);
        engine.oracle().push(converged(2.0, Pose2D::identity()));
        engine.oracle().push(converged(0.8, loop_delta));

        let record = engine.process_scan(scan(1)).unwrap();

        assert!(record.keyframe_flag);
        assert!(record.loop_closure_flag);
        assert_eq!(record.keyframe_loop.as_ref().map(|kf| kf.id), Some(2));
        assert_eq!(record.keyframe_last.as_ref().map(|kf| kf.id), Some(9));

        let factor = record.factor_loop.unwrap();
        assert_eq!(factor.id_1, 9);
        assert_eq!(factor.id_2, Some(2));
        let measured = factor.delta.unwrap();
        assert_relative_eq!(measured.delta.x, 0.4, epsilon = 1e-6);
        assert_relative_eq!(measured.delta.y, -0.1, epsilon = 1e-6);
        assert_relative_eq!(measured.delta.theta, -0.2, epsilon = 1e-6);

        assert_eq!(engine.loop_attempt_counter(), 0);
    }

    #[test]
    fn test_loop_alignment_inputs() {
        let mut engine = loop_engine();
        engine.oracle().push(converged(2.0, Pose2D::identity()));
        engine.oracle().push(converged(0.8, Pose2D::identity()));

        engine.process_scan(scan(1)).unwrap();

        let calls = engine.oracle().calls();
        assert_eq!(calls.len(), 2);
        let loop_call = &calls[1];
        // Closest keyframe cloud aligned onto last keyframe cloud
        assert_eq!(loop_call.source_len, 15);
        assert_eq!(loop_call.target_len, 20);
        assert_relative_eq!(loop_call.tolerance, 1.0);

        let expected = Pose2D::new(2.0, 1.0, 0.5)
            .inverse()
            .compose(&Pose2D::new(2.5, 1.2, 0.3));
        let prior = Pose2D::from_transform(&loop_call.guess);
        assert_relative_eq!(prior.x, expected.x, epsilon = 1e-5);
        assert_relative_eq!(prior.y, expected.y, epsilon = 1e-5);
        assert_relative_eq!(prior.theta, expected.theta, epsilon = 1e-5);
    }

    #[test]
    fn test_loop_closure_rejected_on_fitness() {
        let mut engine = loop_engine();
        engine.oracle().push(converged(2.0, Pose2D::identity()));
        engine.oracle().push(converged(4.5, Pose2D::identity()));

        let record = engine.process_scan(scan(1)).unwrap();

        assert!(record.keyframe_flag);
        assert!(!record.loop_closure_flag);
        assert!(record.factor_loop.is_none());
        assert!(record.keyframe_loop.is_none());
        assert_eq!(engine.loop_attempt_counter(), 1);
    }

    #[test]
    fn test_loop_closure_rejected_on_non_convergence() {
        let mut engine = loop_engine();
        engine.oracle().push(converged(2.0, Pose2D::identity()));
        engine.oracle().push(Alignment {
            fitness: 0.1,
            ..diverged()
        });

        let record = engine.process_scan(scan(1)).unwrap();

        assert!(!record.loop_closure_flag);
        assert_eq!(engine.loop_attempt_counter(), 1);
    }

    #[test]
    fn test_empty_scan_rejected_without_state_change() {
        let mut engine = tracking_engine();
        engine.oracle().push(converged(0.1, Pose2D::new(0.02, 0.0, 0.0)));
        engine.process_scan(scan(1)).unwrap();
        let carried = *engine.carried_transform();

        let empty = Timestamped::new(LaserScan::default(), 2);
        let err = engine.process_scan(empty).unwrap_err();
        assert!(matches!(err, ScannerError::MalformedInput(_)));

        assert_eq!(*engine.carried_transform(), carried);
        assert_eq!(engine.store().last_queries, 1);
        assert_eq!(engine.oracle().calls().len(), 1);

        // Processing continues normally
        assert!(engine.process_scan(scan(3)).is_ok());
    }

    #[test]
    fn test_scan_without_valid_ranges_rejected() {
        let mut engine = tracking_engine();
        let mut bad = scan(1);
        bad.data.ranges = vec![f32::NAN, 0.0, 50.0];

        let err = engine.process_scan(bad).unwrap_err();
        assert!(matches!(err, ScannerError::MalformedInput(_)));
    }

    #[test]
    fn test_scan_with_zero_bearing_step_rejected() {
        let mut engine = tracking_engine();
        let mut collapsed = scan(1);
        collapsed.data.angle_max = 0.0;
        collapsed.data.angle_increment = 0.0;

        let err = engine.process_scan(collapsed).unwrap_err();
        assert!(matches!(err, ScannerError::MalformedInput(_)));
        assert!(err.to_string().contains("angle_increment"));
        assert!(engine.oracle().calls().is_empty());
        assert_eq!(*engine.carried_transform(), Transform3::identity());

        assert!(engine.process_scan(scan(2)).is_ok());
    }

    #[test]
    fn test_scan_outside_converter_band_rejected() {
        let mut engine = tracking_engine();
        let mut far = scan(1);
        // Valid for the sensor, dropped by the converter's 12 m cutoff
        far.data.range_max = 30.0;
        far.data.ranges = vec![20.0; 36];

        let err = engine.process_scan(far).unwrap_err();
        assert!(matches!(err, ScannerError::MalformedInput(_)));
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let mut config = ScannerConfig::default();
        config.keyframe.distance_threshold = -0.5;

        let result = RegistrationEngine::new(
            &config,
            ScriptedOracle::default(),
            MockStore::default(),
            ScanConverter::default(),
        );
        assert!(result.is_err());
    }
}
