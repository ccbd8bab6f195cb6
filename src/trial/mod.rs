//! Runs a single trial, advancing the network, the voxels and the rate traces in
//! lock-step on one clock, then extracting the decision from the smoothed rates.

use tracing::{debug, info};
use crate::config::SimulationConfig;
use crate::decision::{DecisionOutcome, response_time_from_rates};
use crate::error::{ConfigurationError, WTAHemodynamicsError};
use crate::rates::smooth_rate;
use crate::voxel::{Voxel, history::{FullVoxelHistory, VoxelHistory}};


/// Output of one network step
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSample {
    /// Sum of synaptic conductances over all synapses (nA)
    pub g_total: f64,
    /// Sum of synaptic conductances over excitatory synapses only (nA)
    pub g_total_exc: Option<f64>,
    /// Instantaneous firing rate of each competing population (Hz)
    pub rates: Vec<f64>,
}

/// A spiking network (or a stand-in for one) that can be advanced one step at a time
pub trait NetworkSource {
    /// Number of competing populations reported in each sample
    fn num_populations(&self) -> usize;
    /// Advances the network from `time = step * dt` by `dt` (both in seconds) and returns
    /// its synaptic drive and rates for that step, the sample is stamped at `time` (the start
    /// of the step) in every recorded trace so response times sit one `dt` early relative
    /// to the end of the step that produced the crossing
    fn step(&mut self, step: usize, time: f64, dt: f64) -> Result<NetworkSample, WTAHemodynamicsError>;
}

/// Replays previously recorded synaptic drive and rates
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedNetwork {
    g_total: Vec<f64>,
    g_total_exc: Option<Vec<f64>>,
    rates: Vec<Vec<f64>>,
}

impl RecordedNetwork {
    /// Creates a replay source, every trace must have the same number of samples
    pub fn new(
        g_total: Vec<f64>,
        g_total_exc: Option<Vec<f64>>,
        rates: Vec<Vec<f64>>,
    ) -> Result<Self, ConfigurationError> {
        if rates.is_empty() {
            return Err(ConfigurationError::NoPopulations);
        }

        let expected = g_total.len();
        let exc_len = g_total_exc.as_ref().map(|i| i.len());
        if let Some(found) = exc_len.filter(|&len| len != expected) {
            return Err(ConfigurationError::InputLengthMismatch { expected, found });
        }
        if let Some((population, found)) = rates.iter()
            .map(|i| i.len())
            .enumerate()
            .find(|(_, len)| *len != expected) {
            return Err(ConfigurationError::TraceLengthMismatch { population, expected, found });
        }

        Ok(RecordedNetwork { g_total, g_total_exc, rates })
    }

    /// Number of recorded steps
    pub fn len(&self) -> usize {
        self.g_total.len()
    }

    pub fn is_empty(&self) -> bool {
        self.g_total.is_empty()
    }
}

impl NetworkSource for RecordedNetwork {
    fn num_populations(&self) -> usize {
        self.rates.len()
    }

    fn step(&mut self, step: usize, _time: f64, _dt: f64) -> Result<NetworkSample, WTAHemodynamicsError> {
        let g_total = *self.g_total.get(step)
            .ok_or(ConfigurationError::SourceExhausted { step })?;

        Ok(
            NetworkSample {
                g_total,
                g_total_exc: self.g_total_exc.as_ref().map(|i| i[step]),
                rates: self.rates.iter().map(|i| i[step]).collect(),
            }
        )
    }
}

/// Everything recorded from one trial
#[derive(Debug, Clone, PartialEq)]
pub struct TrialResult {
    /// Choice and response time
    pub outcome: DecisionOutcome,
    /// Voxel driven by all synapses, entry `i` is the state after the step starting at `i * dt`
    pub bold: FullVoxelHistory,
    /// Voxel driven by excitatory synapses only, if enabled
    pub exc_bold: Option<FullVoxelHistory>,
    /// Peak BOLD of the all-synapse voxel
    pub max_bold: Option<f64>,
    /// Peak BOLD of the excitatory-only voxel
    pub max_exc_bold: Option<f64>,
    /// Smoothed firing rates (Hz) used for the decision, one vector per population,
    /// entry `i` is stamped at `i * dt`
    pub rates: Vec<Vec<f64>>,
}

/// Simulates one trial of `config.trial.trial_duration` seconds, voxels start at rest and
/// are stepped with the same `dt` as the network, numerical instabilities are reported
/// with the time of the step they occured at
pub fn run_trial<S: NetworkSource + ?Sized>(
    source: &mut S,
    config: &SimulationConfig,
) -> Result<TrialResult, WTAHemodynamicsError> {
    config.validate()?;

    let trial = &config.trial;
    let dt = trial.dt;
    let num_populations = source.num_populations();
    if num_populations == 0 {
        return Err(ConfigurationError::NoPopulations.into());
    }

    let mut voxel = Voxel::new(config.voxel)?.with_integrator(trial.integrator);
    let mut exc_voxel = if trial.record_exc_voxel {
        Some(voxel.clone())
    } else {
        None
    };

    let mut bold = FullVoxelHistory::default();
    let mut exc_bold = exc_voxel.as_ref().map(|_| FullVoxelHistory::default());

    let steps = trial.num_steps();
    let mut raw_rates: Vec<Vec<f64>> = (0..num_populations)
        .map(|_| Vec::with_capacity(steps))
        .collect();

    for step in 0..steps {
        let time = step as f64 * dt;
        let sample = source.step(step, time, dt)?;

        if sample.rates.len() != num_populations {
            return Err(
                ConfigurationError::InputLengthMismatch { expected: num_populations, found: sample.rates.len() }.into()
            );
        }

        voxel.step(sample.g_total, dt)
            .map_err(|e| e.at_time(time))?;
        bold.update(&voxel, sample.g_total);

        if let (Some(exc_voxel), Some(exc_bold)) = (exc_voxel.as_mut(), exc_bold.as_mut()) {
            let g_total_exc = sample.g_total_exc
                .ok_or(ConfigurationError::MissingExcitatoryDrive { step })?;

            exc_voxel.step(g_total_exc, dt)
                .map_err(|e| e.at_time(time))?;
            exc_bold.update(exc_voxel, g_total_exc);
        }

        for (trace, rate) in raw_rates.iter_mut().zip(sample.rates) {
            trace.push(rate);
        }
    }

    debug!(steps, "trial simulated, smoothing rates");

    let rates = raw_rates.iter()
        .map(|i| smooth_rate(i, dt, trial.rate_smoothing_width, trial.rate_filter))
        .collect::<Result<Vec<Vec<f64>>, ConfigurationError>>()?;

    let outcome = response_time_from_rates(
        &rates, dt, trial.stim_start_time, trial.stim_end_time, &config.decision
    )?;

    let max_bold = bold.max_bold();
    let max_exc_bold = exc_bold.as_ref().and_then(|i| i.max_bold());

    match outcome.winner_index {
        Some(winner) => info!(winner, response_time = ?outcome.response_time, ?max_bold, "trial finished"),
        None => info!(?max_bold, "trial finished without response"),
    }

    Ok(
        TrialResult {
            outcome,
            bold,
            exc_bold,
            max_bold,
            max_exc_bold,
            rates,
        }
    )
}
