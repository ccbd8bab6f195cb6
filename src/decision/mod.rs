//! Tools to extract a choice and a response time from the firing rates of competing
//! populations in a winner-take-all network.
//!
//! A decision is the first sample inside the stimulus window at which one population's
//! rate reaches the upper threshold while, if a lower threshold is set, every
//! competing population is at or below the lower threshold.
//!
//! ```rust
//! use wta_hemodynamics::decision::{DecisionThresholds, response_time_from_rates};
//! # use wta_hemodynamics::error::ConfigurationError;
//!
//! # fn main() -> Result<(), ConfigurationError> {
//! let dt = 0.001; // s
//! let winner: Vec<f64> = (0..2000).map(|i| if i >= 1150 { 70. } else { 5. }).collect();
//! let loser = vec![5.; 2000];
//!
//! let outcome = response_time_from_rates(
//!     &[winner, loser], dt, 1.0, 2.0, &DecisionThresholds::default(),
//! )?;
//!
//! assert_eq!(outcome.winner_index, Some(0));
//! assert!((outcome.response_time.unwrap() - 150.).abs() <= 1.);
//! # Ok(())
//! # }
//! ```

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::error::ConfigurationError;


/// Firing rate thresholds (Hz) that define a decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionThresholds {
    /// Rate a population must reach to be chosen (Hz)
    pub upper_threshold: f64,
    /// Rate every other population must stay at or below when the winner crosses (Hz),
    /// not checked when `None`
    pub lower_threshold: Option<f64>,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        DecisionThresholds {
            upper_threshold: 60.,
            lower_threshold: None,
        }
    }
}

impl DecisionThresholds {
    /// Checks that thresholds are finite, the lower threshold may equal or exceed the upper one
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.upper_threshold.is_finite() {
            return Err(ConfigurationError::InvalidParameter {
                name: "upper_threshold", value: self.upper_threshold, reason: "must be finite",
            });
        }

        if let Some(lower) = self.lower_threshold {
            if !lower.is_finite() {
                return Err(ConfigurationError::InvalidParameter {
                    name: "lower_threshold", value: lower, reason: "must be finite",
                });
            }
        }

        Ok(())
    }
}

/// Time aligned firing rates of competing populations over one trial
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTrace {
    rates: Array2<f64>,
    dt: f64,
    stim_start_time: f64,
    stim_end_time: f64,
}

impl DecisionTrace {
    /// Builds a trace from one rate vector (Hz) per population sampled every `dt` seconds,
    /// rejects empty or ragged traces and stimulus windows that do not open before closing
    pub fn new(
        rates: &[Vec<f64>],
        dt: f64,
        stim_start_time: f64,
        stim_end_time: f64,
    ) -> Result<Self, ConfigurationError> {
        let first = rates.first().ok_or(ConfigurationError::NoPopulations)?;
        let expected = first.len();

        if let Some((population, found)) = rates.iter()
            .map(|i| i.len())
            .enumerate()
            .find(|(_, len)| *len != expected) {
            return Err(ConfigurationError::TraceLengthMismatch { population, expected, found });
        }

        let array = Array2::from_shape_fn((rates.len(), expected), |(i, j)| rates[i][j]);

        DecisionTrace::from_array(array, dt, stim_start_time, stim_end_time)
    }

    /// Builds a trace from a `populations x samples` array of rates (Hz)
    pub fn from_array(
        rates: Array2<f64>,
        dt: f64,
        stim_start_time: f64,
        stim_end_time: f64,
    ) -> Result<Self, ConfigurationError> {
        if rates.nrows() == 0 {
            return Err(ConfigurationError::NoPopulations);
        }
        if rates.ncols() == 0 {
            return Err(ConfigurationError::EmptyTrace);
        }
        if !dt.is_finite() || dt <= 0. {
            return Err(ConfigurationError::InvalidParameter {
                name: "dt", value: dt, reason: "must be positive and finite",
            });
        }
        if !stim_start_time.is_finite() || !stim_end_time.is_finite() || stim_start_time >= stim_end_time {
            return Err(ConfigurationError::InvertedStimulusWindow { start: stim_start_time, end: stim_end_time });
        }

        Ok(DecisionTrace { rates, dt, stim_start_time, stim_end_time })
    }

    /// Rates as a `populations x samples` array
    pub fn rates(&self) -> &Array2<f64> {
        &self.rates
    }

    pub fn num_populations(&self) -> usize {
        self.rates.nrows()
    }

    /// Number of samples per population
    pub fn len(&self) -> usize {
        self.rates.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.ncols() == 0
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn stim_start_time(&self) -> f64 {
        self.stim_start_time
    }

    pub fn stim_end_time(&self) -> f64 {
        self.stim_end_time
    }

    /// Time (s) of the given sample
    pub fn time(&self, index: usize) -> f64 {
        index as f64 * self.dt
    }
}

/// Choice and latency of a single trial
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionOutcome {
    /// Time from stimulus onset to the threshold crossing (ms), `None` if no response
    pub response_time: Option<f64>,
    /// Index of the chosen population, `None` if no response
    pub winner_index: Option<usize>,
}

impl DecisionOutcome {
    /// Outcome of a trial where no population reached threshold in the stimulus window
    pub fn no_response() -> Self {
        DecisionOutcome { response_time: None, winner_index: None }
    }

    /// Whether any population was chosen
    pub fn is_response(&self) -> bool {
        self.winner_index.is_some()
    }

    /// Chosen population as an integer code, `-1` if no response
    pub fn choice(&self) -> i64 {
        self.winner_index.map_or(-1, |i| i as i64)
    }
}

/// Scans the trace once in time order and returns the first valid threshold crossing
/// strictly inside the stimulus window, populations are checked in index order so when
/// several satisfy the decision condition at the same sample the lowest index wins
pub fn get_response_time(
    trace: &DecisionTrace,
    thresholds: &DecisionThresholds,
) -> Result<DecisionOutcome, ConfigurationError> {
    thresholds.validate()?;

    let upper = thresholds.upper_threshold;

    for (index, sample) in trace.rates.columns().into_iter().enumerate() {
        let time = trace.time(index);
        if time <= trace.stim_start_time {
            continue;
        }
        if time >= trace.stim_end_time {
            break;
        }

        let winner = (0..sample.len()).find(|&population| {
            sample[population] >= upper && match thresholds.lower_threshold {
                Some(lower) => sample.iter()
                    .enumerate()
                    .all(|(other, &rate)| other == population || rate <= lower),
                None => true,
            }
        });

        if let Some(winner) = winner {
            let response_time = (time - trace.stim_start_time) * 1000.;
            debug!(winner, response_time, "decision threshold crossed");

            return Ok(DecisionOutcome { response_time: Some(response_time), winner_index: Some(winner) });
        }
    }

    debug!("no population crossed decision threshold");

    Ok(DecisionOutcome::no_response())
}

/// Validates the given rates (Hz, one vector per population sampled every `dt` seconds)
/// and stimulus window (s) and extracts the decision, see [`get_response_time`]
pub fn response_time_from_rates(
    rates: &[Vec<f64>],
    dt: f64,
    stim_start_time: f64,
    stim_end_time: f64,
    thresholds: &DecisionThresholds,
) -> Result<DecisionOutcome, ConfigurationError> {
    let trace = DecisionTrace::new(rates, dt, stim_start_time, stim_end_time)?;

    get_response_time(&trace, thresholds)
}
