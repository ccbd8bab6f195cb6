//! Contrast sweeps, building per-trial input conditions and running independent trials
//! in parallel.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use crate::config::SimulationConfig;
use crate::error::{ConfigurationError, WTAHemodynamicsError};
use crate::trial::{NetworkSource, TrialResult, run_trial};


/// Splits `input_sum` (Hz) between two populations so that their difference relative
/// to the sum equals `contrast`, first value is the larger input for positive contrast
pub fn contrast_inputs(input_sum: f64, contrast: f64) -> Result<[f64; 2], ConfigurationError> {
    if !input_sum.is_finite() || input_sum < 0. {
        return Err(ConfigurationError::InvalidParameter {
            name: "input_sum", value: input_sum, reason: "must be non-negative and finite",
        });
    }
    if !contrast.is_finite() || !(0. ..=1.).contains(&contrast) {
        return Err(ConfigurationError::InvalidParameter {
            name: "contrast", value: contrast, reason: "must be within [0, 1]",
        });
    }

    let first = input_sum * (contrast + 1.) / 2.;

    Ok([first, input_sum - first])
}

/// Derives the seed of a single trial from a base seed so that each trial
/// gets its own stream regardless of which thread runs it
pub fn trial_seed(base_seed: u64, trial: usize) -> u64 {
    // splitmix64 finalizer
    let mut z = base_seed.wrapping_add((trial as u64 + 1).wrapping_mul(0x9E3779B97F4A7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);

    z ^ (z >> 31)
}

/// Inputs and seed of one trial in a sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialCondition {
    /// Index of the trial within the sweep
    pub trial: usize,
    /// Input contrast
    pub contrast: f64,
    /// Input rate to each population (Hz)
    pub inputs: Vec<f64>,
    /// Population receiving the larger input
    pub correct_input: usize,
    /// Seed for any randomness in the trial
    pub seed: u64,
}

/// Builds `trials_per_contrast` trials for every contrast, for each trial which population
/// gets the larger input is shuffled with the trial's own generator
pub fn contrast_conditions(
    contrasts: &[f64],
    trials_per_contrast: usize,
    input_sum: f64,
    base_seed: u64,
) -> Result<Vec<TrialCondition>, ConfigurationError> {
    let mut conditions = Vec::with_capacity(contrasts.len() * trials_per_contrast);

    for &contrast in contrasts {
        let base_inputs = contrast_inputs(input_sum, contrast)?;

        for _ in 0..trials_per_contrast {
            let trial = conditions.len();
            let seed = trial_seed(base_seed, trial);
            let mut rng = StdRng::seed_from_u64(seed);

            let mut inputs = base_inputs.to_vec();
            inputs.shuffle(&mut rng);

            // first population with the largest input, population 0 at zero contrast
            let correct_input = if inputs[1] > inputs[0] { 1 } else { 0 };

            conditions.push(TrialCondition { trial, contrast, inputs, correct_input, seed });
        }
    }

    Ok(conditions)
}

/// Result of one trial in a sweep, failures are kept in place
#[derive(Debug, Clone, PartialEq)]
pub struct SweepEntry {
    /// Condition the trial was run under
    pub condition: TrialCondition,
    /// Outcome of the trial or the error that stopped it
    pub result: Result<TrialResult, WTAHemodynamicsError>,
}

/// Runs every condition as an independent trial across the rayon thread pool, `factory`
/// builds the network for a condition, a failing trial is logged and reported in its own
/// entry as [`WTAHemodynamicsError::TrialFailed`] without stopping the others,
/// entries are returned in the order of `conditions`
pub fn run_sweep<S, F>(
    conditions: &[TrialCondition],
    factory: F,
    config: &SimulationConfig,
) -> Vec<SweepEntry>
where
    S: NetworkSource,
    F: Fn(&TrialCondition) -> Result<S, WTAHemodynamicsError> + Sync,
{
    let entries: Vec<SweepEntry> = conditions.par_iter()
        .map(|condition| {
            let result = factory(condition)
                .and_then(|mut source| run_trial(&mut source, config))
                .map_err(|e| {
                    warn!(trial = condition.trial, error = %e, "trial failed");
                    e.in_trial(condition.trial)
                });

            SweepEntry { condition: condition.clone(), result }
        })
        .collect();

    let failed = entries.iter().filter(|i| i.result.is_err()).count();
    info!(trials = entries.len(), failed, "sweep finished");

    entries
}

/// Mean peak BOLD of the all-synapse voxel for each contrast in the sweep,
/// failed trials and trials without a peak are skipped
pub fn mean_max_bold_by_contrast(entries: &[SweepEntry]) -> Vec<(f64, f64)> {
    let mut contrasts: Vec<f64> = entries.iter()
        .map(|i| i.condition.contrast)
        .collect();
    contrasts.sort_by(|a, b| a.total_cmp(b));
    contrasts.dedup();

    contrasts.into_iter()
        .filter_map(|contrast| {
            let peaks: Vec<f64> = entries.iter()
                .filter(|i| i.condition.contrast == contrast)
                .filter_map(|i| i.result.as_ref().ok().and_then(|result| result.max_bold))
                .collect();

            if peaks.is_empty() {
                None
            } else {
                Some((contrast, peaks.iter().sum::<f64>() / peaks.len() as f64))
            }
        })
        .collect()
}
