//! Engine layer: keyframe voting and loop-closure decisions.
//!
//! - [`registration`]: The per-scan decision engine
//! - [`keyframe`]: Keyframe type, store trait and in-memory store
//! - [`record`]: Records and factors emitted per scan

pub mod keyframe;
pub mod record;
pub mod registration;

pub use keyframe::{InMemoryKeyframeStore, Keyframe, KeyframeStore, KeyframeStoreConfig};
pub use record::{Factor, NewKeyframe, PoseDeltaWithCovariance, RegistrationRecord};
pub use registration::RegistrationEngine;
