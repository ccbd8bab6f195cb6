//! Error types shared across the voxel model, the decision extractor and the trial tooling.

use std::fmt::{Display, Formatter, Result};
use thiserror::Error;


/// Hemodynamic state variables that are checked for physical validity after each step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateVariable {
    /// Vasodilatory signal
    Signal,
    /// Normalized blood inflow
    Inflow,
    /// Normalized blood volume
    Volume,
    /// Normalized deoxyhemoglobin content
    Deoxyhemoglobin,
}

impl Display for StateVariable {
    fn fmt(&self, f: &mut Formatter) -> Result {
        let name = match self {
            StateVariable::Signal => "s",
            StateVariable::Inflow => "f_in",
            StateVariable::Volume => "v",
            StateVariable::Deoxyhemoglobin => "q",
        };

        write!(f, "{}", name)
    }
}

/// Set of errors for invalid parameters, malformed traces or unreadable configuration,
/// always raised before any computation starts
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// A parameter is outside of its valid range
    #[error("Invalid parameter `{name}` ({value}): {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
    /// A trace contained no populations
    #[error("Decision trace must contain at least one population")]
    NoPopulations,
    /// A trace contained populations with no samples
    #[error("Firing rate traces must not be empty")]
    EmptyTrace,
    /// Populations were sampled for a different number of steps
    #[error("Firing rate trace for population {population} has {found} samples, expected {expected}")]
    TraceLengthMismatch {
        population: usize,
        expected: usize,
        found: usize,
    },
    /// Stimulus window does not open before it closes
    #[error("Stimulus start time ({start}) must be before stimulus end time ({end})")]
    InvertedStimulusWindow {
        start: f64,
        end: f64,
    },
    /// Number of input values does not match the number of populations
    #[error("Expected {expected} inputs, found {found}")]
    InputLengthMismatch {
        expected: usize,
        found: usize,
    },
    /// Network source could not supply a sample for the requested step
    #[error("Network source ran out of samples at step {step}")]
    SourceExhausted {
        step: usize,
    },
    /// Excitatory-only voxel is enabled but the network gave no excitatory drive
    #[error("Network source gave no excitatory drive at step {step}")]
    MissingExcitatoryDrive {
        step: usize,
    },
    /// Configuration file could not be read or parsed
    #[error("Configuration file error: {0}")]
    ConfigFile(String),
}

/// A state variable left its physically valid domain during integration
#[derive(Debug, Clone, PartialEq, Error)]
pub struct NumericalInstability {
    /// Variable that became invalid
    pub variable: StateVariable,
    /// Offending value
    pub value: f64,
    /// Simulation time (s) of the failing step, when known by the caller
    pub time: Option<f64>,
}

impl NumericalInstability {
    /// Attaches the simulation time (s) at which the instability occured
    pub fn at_time(mut self, time: f64) -> Self {
        self.time = Some(time);

        self
    }
}

impl Display for NumericalInstability {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self.time {
            Some(time) => write!(
                f, "Numerical instability: `{}` reached {} at t = {}s", self.variable, self.value, time
            ),
            None => write!(
                f, "Numerical instability: `{}` reached {}", self.variable, self.value
            ),
        }
    }
}

/// A set of errors that may occur when using the library
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WTAHemodynamicsError {
    /// Errors related to invalid configuration or inputs
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// Errors related to voxel integration leaving the valid domain
    #[error(transparent)]
    NumericalInstability(#[from] NumericalInstability),
    /// A single trial of a sweep failed, other trials are unaffected
    #[error("Trial {trial} failed: {source}")]
    TrialFailed {
        trial: usize,
        source: Box<WTAHemodynamicsError>,
    },
}

impl WTAHemodynamicsError {
    /// Wraps the error with the index of the trial it occured in
    pub fn in_trial(self, trial: usize) -> Self {
        WTAHemodynamicsError::TrialFailed { trial, source: Box::new(self) }
    }

    /// Attaches a simulation time (s) to numerical instabilities, other errors are unchanged
    pub fn at_time(self, time: f64) -> Self {
        match self {
            WTAHemodynamicsError::NumericalInstability(err) if err.time.is_none() => {
                WTAHemodynamicsError::NumericalInstability(err.at_time(time))
            },
            other => other,
        }
    }
}
