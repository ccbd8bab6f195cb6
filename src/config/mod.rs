//! Simulation configuration loaded from TOML, every section falls back to its
//! defaults so partial files are accepted.
//!
//! ```toml
//! [voxel]
//! b0 = 3.0
//!
//! [decision]
//! upper_threshold = 45.0
//! lower_threshold = 15.0
//!
//! [trial]
//! dt = 0.0001
//! stim_start_time = 1.0
//! stim_end_time = 3.0
//! ```

use std::{fs::read_to_string, path::Path};
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::error::ConfigurationError;
use crate::decision::DecisionThresholds;
use crate::rates::RateFilter;
use crate::voxel::{Integrator, VoxelParameters};


/// Largest number of steps a single trial may span
pub const MAX_TRIAL_STEPS: usize = 100_000_000;

/// Timing and recording settings of a single trial
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialParameters {
    /// Simulation timestep (s), shared by the network, the voxels and the rate traces
    pub dt: f64,
    /// Duration of the trial (s)
    pub trial_duration: f64,
    /// Time the stimulus starts (s)
    pub stim_start_time: f64,
    /// Time the stimulus ends (s)
    pub stim_end_time: f64,
    /// Width of the rate smoothing window (s)
    pub rate_smoothing_width: f64,
    /// Window shape used for rate smoothing
    pub rate_filter: RateFilter,
    /// Integration scheme used for the voxels
    pub integrator: Integrator,
    /// Whether to also simulate a voxel driven only by excitatory synapses
    pub record_exc_voxel: bool,
}

impl Default for TrialParameters {
    fn default() -> Self {
        TrialParameters {
            dt: 0.0001, // 0.1 ms
            trial_duration: 4.,
            stim_start_time: 1.,
            stim_end_time: 3.,
            rate_smoothing_width: 0.005, // 5 ms
            rate_filter: RateFilter::Gaussian,
            integrator: Integrator::Euler,
            record_exc_voxel: true,
        }
    }
}

impl TrialParameters {
    /// Number of simulation steps in the trial, only meaningful once [`TrialParameters::validate`]
    /// has passed
    pub fn num_steps(&self) -> usize {
        (self.trial_duration / self.dt).round() as usize
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.dt.is_finite() || self.dt <= 0. {
            return Err(ConfigurationError::InvalidParameter {
                name: "dt", value: self.dt, reason: "must be positive and finite",
            });
        }
        if !self.trial_duration.is_finite() || self.trial_duration < self.dt {
            return Err(ConfigurationError::InvalidParameter {
                name: "trial_duration", value: self.trial_duration, reason: "must span at least one timestep",
            });
        }
        let steps = self.trial_duration / self.dt;
        if steps.round() > MAX_TRIAL_STEPS as f64 {
            return Err(ConfigurationError::InvalidParameter {
                name: "trial_duration", value: self.trial_duration, reason: "spans too many timesteps",
            });
        }
        if !self.stim_start_time.is_finite() || !self.stim_end_time.is_finite()
            || self.stim_start_time >= self.stim_end_time {
            return Err(ConfigurationError::InvertedStimulusWindow {
                start: self.stim_start_time, end: self.stim_end_time,
            });
        }
        if !self.rate_smoothing_width.is_finite() || self.rate_smoothing_width < self.dt {
            return Err(ConfigurationError::InvalidParameter {
                name: "rate_smoothing_width", value: self.rate_smoothing_width, reason: "must be at least one timestep",
            });
        }

        Ok(())
    }
}

/// Complete configuration for running trials
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Hemodynamic parameters shared by every voxel
    pub voxel: VoxelParameters,
    /// Decision thresholds
    pub decision: DecisionThresholds,
    /// Trial timing
    pub trial: TrialParameters,
}

impl SimulationConfig {
    /// Parses and validates a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigurationError> {
        let config: SimulationConfig = toml::from_str(content)
            .map_err(|e| ConfigurationError::ConfigFile(e.to_string()))?;
        config.validate()?;

        Ok(config)
    }

    /// Serializes the configuration to TOML text
    pub fn to_toml_string(&self) -> Result<String, ConfigurationError> {
        toml::to_string(self)
            .map_err(|e| ConfigurationError::ConfigFile(e.to_string()))
    }

    /// Checks every section
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.voxel.validate()?;
        self.decision.validate()?;
        self.trial.validate()
    }
}

/// Reads, parses and validates a configuration file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SimulationConfig, ConfigurationError> {
    let path = path.as_ref();
    let content = read_to_string(path)
        .map_err(|e| ConfigurationError::ConfigFile(format!("{}: {}", path.display(), e)))?;

    debug!(path = %path.display(), "loading simulation config");

    SimulationConfig::from_toml_str(&content)
}
