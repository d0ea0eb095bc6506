//! keyframe-scanner - Keyframe and loop-closure decisions for 2D lidar mapping
//!
//! Given a stream of range scans and a pose-graph backend holding accepted
//! keyframes, the crate decides whether each scan becomes a new keyframe,
//! when to search for a loop closure and whether to accept it, and how much
//! uncertainty to attach to every proposed relative pose.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     main.rs                         │  ← Replay binary
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                  io/, config/                       │  ← Infrastructure
//! │           (scan logs, TOML configuration)           │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                    engine/                          │  ← Decisions
//! │         (registration engine, keyframe store)       │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                  algorithms/                        │  ← Oracle + noise
//! │              (matching, uncertainty)                │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                   sensors/                          │  ← Scan conversion
//! │                (preprocessing)                      │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │                (types, math)                        │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Collaborators
//!
//! The engine depends on three traits, each with an in-crate default:
//!
//! | Trait | Default | Role |
//! |-------|---------|------|
//! | [`Registration`] | [`PointToPointIcp`] | Aligns two point clouds |
//! | [`KeyframeStore`] | [`InMemoryKeyframeStore`] | Last / closest keyframe queries |
//! | [`ScanPreprocessor`] | [`ScanConverter`] | Scan to point cloud |
//!
//! # Example
//!
//! ```ignore
//! use keyframe_scanner::*;
//!
//! let config = ScannerConfig::load_default()?;
//! let mut engine = RegistrationEngine::new(
//!     &config,
//!     PointToPointIcp::new(config.registration.icp_config()),
//!     InMemoryKeyframeStore::new(config.store.clone()),
//!     ScanConverter::new(config.preprocessing.clone()),
//! )?;
//!
//! for scan in ScanLogReader::open("scans.jsonl")? {
//!     match engine.process_scan(scan?) {
//!         Ok(record) => {
//!             engine.store_mut().ingest(&record);
//!         }
//!         Err(e) => log::warn!("{}", e),
//!     }
//! }
//! ```

// ============================================================================
// Layer 1: Core foundation (no internal deps)
// ============================================================================
pub mod core;

// ============================================================================
// Layer 2: Sensor processing (depends on core)
// ============================================================================
pub mod sensors;

// ============================================================================
// Layer 3: Algorithms (depends on core)
// ============================================================================
pub mod algorithms;

// ============================================================================
// Layer 4: Decision engine (depends on core, sensors, algorithms)
// ============================================================================
pub mod engine;

// ============================================================================
// Layer 5: Infrastructure (depends on all layers)
// ============================================================================
pub mod config;
pub mod error;
pub mod io;

// ============================================================================
// Convenience re-exports (flat namespace for common use)
// ============================================================================

// Core types
pub use core::math;
pub use core::types::{Covariance2D, LaserScan, PointCloud2D};
pub use core::types::{Point2D, Pose2D, Timestamped, Transform3};

// Sensors
pub use sensors::preprocessing::{ScanConverter, ScanConverterConfig, ScanPreprocessor};

// Algorithms
pub use algorithms::matching::{
    Alignment, ConvergenceState, IcpConfig, PointToPointIcp, Registration,
};
pub use algorithms::uncertainty::{NoiseCoefficients, UncertaintyModel};

// Engine
pub use engine::{
    Factor, InMemoryKeyframeStore, Keyframe, KeyframeStore, KeyframeStoreConfig, NewKeyframe,
    PoseDeltaWithCovariance, RegistrationEngine, RegistrationRecord,
};

// Infrastructure
pub use config::{KeyframeConfig, LoopClosureConfig, RegistrationConfig, ScannerConfig};
pub use error::{ConfigError, Result, ScannerError};
pub use io::{RecordWriter, ScanLogReader, ScanLogWriter};
