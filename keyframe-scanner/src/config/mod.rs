//! Configuration for keyframe-scanner.
//!
//! Loaded from a TOML file with one table per concern. Every option has a
//! default, and an option missing from the file is reported at startup
//! together with the value that replaces it.
//!
//! ```toml
//! [registration]
//! gicp_maximum_iterations = 50
//! gicp_maximum_correspondence_distance = 0.05
//!
//! [keyframe]
//! fitness_keyframe_threshold = 1.5
//!
//! [loop_closure]
//! loop_closure_skip = 4
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::algorithms::matching::IcpConfig;
use crate::algorithms::uncertainty::NoiseCoefficients;
use crate::engine::keyframe::KeyframeStoreConfig;
use crate::error::ConfigError;
use crate::sensors::preprocessing::ScanConverterConfig;

/// Paths tried by [`ScannerConfig::load_default`], in order.
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["keyframe-scanner.toml", "/etc/keyframe-scanner.toml"];

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub registration: RegistrationConfig,
    pub keyframe: KeyframeConfig,
    pub loop_closure: LoopClosureConfig,
    pub uncertainty: NoiseCoefficients,
    pub preprocessing: ScanConverterConfig,
    pub store: KeyframeStoreConfig,
}

/// Registration oracle parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Oracle iteration cap.
    pub gicp_maximum_iterations: u32,

    /// Primary alignment correspondence tolerance (meters).
    pub gicp_maximum_correspondence_distance: f32,

    /// Squared incremental translation treated as converged (m²).
    pub gicp_transformation_epsilon: f32,

    /// Absolute MSE change treated as converged (m²).
    pub gicp_euclidean_fitness_epsilon: f32,

    /// Relative MSE change treated as converged.
    pub gicp_relative_mse_epsilon: f32,

    /// Consecutive similar iterations before convergence is declared.
    pub gicp_max_iterations_similar_transforms: u32,

    /// Below this many correspondences the oracle gives up.
    pub gicp_min_correspondences: usize,

    /// Treat hitting the iteration cap as non-convergence.
    pub gicp_fail_after_max_iterations: bool,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            gicp_maximum_iterations: 50,
            gicp_maximum_correspondence_distance: 0.05,
            gicp_transformation_epsilon: 1e-8,
            gicp_euclidean_fitness_epsilon: 1.0,
            gicp_relative_mse_epsilon: 1e-5,
            gicp_max_iterations_similar_transforms: 10,
            gicp_min_correspondences: 3,
            gicp_fail_after_max_iterations: false,
        }
    }
}

impl RegistrationConfig {
    /// ICP oracle configuration derived from these options.
    pub fn icp_config(&self) -> IcpConfig {
        IcpConfig {
            max_iterations: self.gicp_maximum_iterations,
            transformation_epsilon: self.gicp_transformation_epsilon,
            euclidean_fitness_epsilon: self.gicp_euclidean_fitness_epsilon,
            relative_mse_epsilon: self.gicp_relative_mse_epsilon,
            max_iterations_similar_transforms: self.gicp_max_iterations_similar_transforms,
            min_correspondences: self.gicp_min_correspondences,
            fail_after_max_iterations: self.gicp_fail_after_max_iterations,
            ..IcpConfig::default()
        }
    }
}

/// Keyframe voting thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyframeConfig {
    /// Fitness above this votes for a new keyframe.
    pub fitness_keyframe_threshold: f32,

    /// Translation (meters) above this votes for a new keyframe.
    pub distance_threshold: f32,

    /// Rotation (radians) above this votes for a new keyframe.
    pub rotation_threshold: f32,
}

impl Default for KeyframeConfig {
    fn default() -> Self {
        Self {
            fitness_keyframe_threshold: 1.5,
            distance_threshold: 1.0,
            rotation_threshold: 1.0,
        }
    }
}

/// Loop-closure pacing and acceptance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopClosureConfig {
    /// Fitness below this accepts a loop closure.
    pub fitness_loop_threshold: f32,

    /// Keyframe creations between loop-closure attempts.
    pub loop_closure_skip: u32,

    /// Loop-closure alignment correspondence tolerance (meters).
    pub loop_closure_correspondence_distance: f32,
}

impl Default for LoopClosureConfig {
    fn default() -> Self {
        Self {
            fitness_loop_threshold: 4.5,
            loop_closure_skip: 4,
            loop_closure_correspondence_distance: 1.0,
        }
    }
}

impl ScannerConfig {
    /// Load and validate configuration from a TOML file.
    ///
    /// # Example
    /// ```no_run
    /// use keyframe_scanner::config::ScannerConfig;
    ///
    /// let config = ScannerConfig::load("keyframe-scanner.toml").unwrap();
    /// println!("loop closure every {} keyframes", config.loop_closure.loop_closure_skip);
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        log::info!("Loading config from {}", path.display());
        Self::from_toml(&contents)
    }

    /// Load from the first existing default path, or fall back to defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        for path in DEFAULT_CONFIG_PATHS {
            if Path::new(path).exists() {
                return Self::load(path);
            }
        }
        log::warn!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// Options missing from `contents` are logged with their default.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let raw: toml::Table = contents.parse()?;
        let config: ScannerConfig = toml::from_str(contents)?;

        for (option, value) in config.defaulted_options(&raw) {
            log::warn!("{} not set, using default {}", option, value);
        }

        config.validate()?;
        Ok(config)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write configuration to a TOML file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// `section.option` names absent from `raw`, with their resolved values.
    pub fn defaulted_options(&self, raw: &toml::Table) -> Vec<(String, toml::Value)> {
        let Ok(toml::Value::Table(resolved)) = toml::Value::try_from(self) else {
            return Vec::new();
        };

        let mut defaulted = Vec::new();
        for (section, options) in &resolved {
            let toml::Value::Table(options) = options else {
                continue;
            };
            let given = raw.get(section).and_then(toml::Value::as_table);
            for (option, value) in options {
                if given.is_none_or(|table| !table.contains_key(option)) {
                    defaulted.push((format!("{}.{}", section, option), value.clone()));
                }
            }
        }
        defaulted
    }

    /// Check startup invariants.
    ///
    /// Thresholds must be finite and non-negative, iteration caps non-zero,
    /// and the loop-closure tolerance at least as coarse as the primary one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let reg = &self.registration;
        non_negative(
            "registration.gicp_maximum_correspondence_distance",
            reg.gicp_maximum_correspondence_distance,
        )?;
        non_negative(
            "registration.gicp_transformation_epsilon",
            reg.gicp_transformation_epsilon,
        )?;
        non_negative(
            "registration.gicp_euclidean_fitness_epsilon",
            reg.gicp_euclidean_fitness_epsilon,
        )?;
        non_negative(
            "registration.gicp_relative_mse_epsilon",
            reg.gicp_relative_mse_epsilon,
        )?;
        if reg.gicp_maximum_iterations == 0 {
            return Err(ConfigError::invalid(
                "registration.gicp_maximum_iterations",
                "must be at least 1",
            ));
        }
        if reg.gicp_min_correspondences == 0 {
            return Err(ConfigError::invalid(
                "registration.gicp_min_correspondences",
                "must be at least 1",
            ));
        }

        let kf = &self.keyframe;
        non_negative(
            "keyframe.fitness_keyframe_threshold",
            kf.fitness_keyframe_threshold,
        )?;
        non_negative("keyframe.distance_threshold", kf.distance_threshold)?;
        non_negative("keyframe.rotation_threshold", kf.rotation_threshold)?;

        let lc = &self.loop_closure;
        non_negative("loop_closure.fitness_loop_threshold", lc.fitness_loop_threshold)?;
        non_negative(
            "loop_closure.loop_closure_correspondence_distance",
            lc.loop_closure_correspondence_distance,
        )?;
        if lc.loop_closure_correspondence_distance < reg.gicp_maximum_correspondence_distance {
            return Err(ConfigError::invalid(
                "loop_closure.loop_closure_correspondence_distance",
                format!(
                    "{} is tighter than the primary tolerance {}",
                    lc.loop_closure_correspondence_distance,
                    reg.gicp_maximum_correspondence_distance
                ),
            ));
        }

        let noise = &self.uncertainty;
        non_negative("uncertainty.k_disp_disp", noise.k_disp_disp)?;
        non_negative("uncertainty.k_rot_disp", noise.k_rot_disp)?;
        non_negative("uncertainty.k_rot_rot", noise.k_rot_rot)?;
        non_negative("uncertainty.sigma_xy", noise.sigma_xy)?;
        non_negative("uncertainty.sigma_th", noise.sigma_th)?;

        let pre = &self.preprocessing;
        non_negative("preprocessing.scan_range_min", pre.scan_range_min)?;
        non_negative("preprocessing.scan_range_max", pre.scan_range_max)?;
        if !pre.radial_offset.is_finite() {
            return Err(ConfigError::invalid(
                "preprocessing.radial_offset",
                "must be finite",
            ));
        }
        if pre.scan_range_max <= pre.scan_range_min {
            return Err(ConfigError::invalid(
                "preprocessing.scan_range_max",
                "must be greater than scan_range_min",
            ));
        }

        non_negative("store.max_search_distance", self.store.max_search_distance)?;
        Ok(())
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::invalid(field, format!("{} is not finite", value)));
    }
    if value < 0.0 {
        return Err(ConfigError::invalid(field, format!("{} is negative", value)));
    }
    Ok(())
}
