//! Behavioural statistics over a session of trials: accuracy, missed trials and
//! response times grouped by input coherence.

use serde::{Deserialize, Serialize};
use crate::decision::DecisionOutcome;
use crate::error::ConfigurationError;
use crate::sweep::SweepEntry;


/// Mapping from the input to population 0 onto a coherence level, coherence is
/// `|inputs[0] - mu_0| / (p_a * 100)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoherenceParameters {
    /// Input rate at zero coherence (Hz)
    pub mu_0: f64,
    /// Input rate gained per percent of coherence (Hz)
    pub p_a: f64,
}

impl Default for CoherenceParameters {
    fn default() -> Self {
        CoherenceParameters {
            mu_0: 40.,
            p_a: 0.4, // mu_0 / 100
        }
    }
}

impl CoherenceParameters {
    /// Coherence of a trial given its inputs (Hz), rounded to 3 decimals
    pub fn coherence(&self, inputs: &[f64]) -> Option<f64> {
        let first = inputs.first()?;
        let coherence = ((first - self.mu_0) / (self.p_a * 100.)).abs();

        Some((coherence * 1000.).round() / 1000.)
    }
}

/// Summary of one coherence level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoherenceSummary {
    /// Coherence level
    pub coherence: f64,
    /// Mean value over the included trials
    pub mean: f64,
    /// Standard error of the mean
    pub sem: f64,
}

fn mean_and_sem(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|i| (i - mean).powi(2)).sum::<f64>() / n;

    Some((mean, variance.sqrt() / n.sqrt()))
}

/// Per-trial record of inputs and outcomes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Coherence mapping for the inputs
    pub coherence_parameters: CoherenceParameters,
    /// Inputs (Hz) of each trial
    pub trial_inputs: Vec<Vec<f64>>,
    /// Population receiving the larger input for each trial
    pub trial_correct_input: Vec<usize>,
    /// Decision outcome of each trial
    pub trial_outcomes: Vec<DecisionOutcome>,
}

impl SessionRecord {
    pub fn new(coherence_parameters: CoherenceParameters) -> Self {
        SessionRecord {
            coherence_parameters,
            ..SessionRecord::default()
        }
    }

    /// Appends a trial
    pub fn record_trial(&mut self, inputs: &[f64], correct_input: usize, outcome: DecisionOutcome) {
        self.trial_inputs.push(inputs.to_vec());
        self.trial_correct_input.push(correct_input);
        self.trial_outcomes.push(outcome);
    }

    /// Appends every successful trial of a sweep in order and returns the
    /// indices of the trials that failed
    pub fn record_sweep(&mut self, entries: &[SweepEntry]) -> Vec<usize> {
        let mut failed = vec![];

        for entry in entries {
            match &entry.result {
                Ok(result) => self.record_trial(
                    &entry.condition.inputs, entry.condition.correct_input, result.outcome
                ),
                Err(_) => failed.push(entry.condition.trial),
            }
        }

        failed
    }

    pub fn num_trials(&self) -> usize {
        self.trial_outcomes.len()
    }

    /// Number of trials where no population was chosen
    pub fn num_no_response(&self) -> usize {
        self.trial_outcomes.iter().filter(|i| !i.is_response()).count()
    }

    /// Whether each trial chose the population with the larger input,
    /// trials without a response count as incorrect
    pub fn trial_correct(&self) -> Vec<bool> {
        self.trial_outcomes.iter()
            .zip(&self.trial_correct_input)
            .map(|(outcome, &correct)| outcome.winner_index == Some(correct))
            .collect()
    }

    /// Indices of trials with a response
    pub fn responded_trials(&self) -> Vec<usize> {
        self.trial_outcomes.iter()
            .enumerate()
            .filter(|(_, outcome)| outcome.is_response())
            .map(|(i, _)| i)
            .collect()
    }

    /// Fraction of responded trials that were correct, `None` if no trial had a response
    pub fn perc_correct(&self) -> Option<f64> {
        self.accuracy_over(&self.responded_trials())
    }

    /// Percentage of trials without a response, `None` for an empty session
    pub fn perc_missed(&self) -> Option<f64> {
        if self.num_trials() == 0 {
            return None;
        }

        Some(self.num_no_response() as f64 / self.num_trials() as f64 * 100.)
    }

    /// Moving average of correctness over consecutive windows of `window` trials,
    /// only complete windows are returned
    pub fn correct_moving_average(&self, window: usize) -> Result<Vec<f64>, ConfigurationError> {
        if window == 0 {
            return Err(ConfigurationError::InvalidParameter {
                name: "window", value: 0., reason: "must be positive",
            });
        }

        let correct: Vec<f64> = self.trial_correct().into_iter()
            .map(|i| if i { 1. } else { 0. })
            .collect();

        Ok(
            correct.windows(window)
                .map(|i| i.iter().sum::<f64>() / window as f64)
                .collect()
        )
    }

    /// Coherence of a given trial
    pub fn coherence(&self, trial: usize) -> Option<f64> {
        self.trial_inputs.get(trial)
            .and_then(|inputs| self.coherence_parameters.coherence(inputs))
    }

    /// Sorted unique coherence levels in the session
    pub fn coherence_levels(&self) -> Vec<f64> {
        let mut levels: Vec<f64> = (0..self.num_trials())
            .filter_map(|i| self.coherence(i))
            .collect();
        levels.sort_by(|a, b| a.total_cmp(b));
        levels.dedup();

        levels
    }

    /// Indices of trials at the given coherence level
    pub fn coherence_trials(&self, coherence: f64) -> Vec<usize> {
        let rounded = (coherence * 1000.).round() / 1000.;

        (0..self.num_trials())
            .filter(|&i| self.coherence(i) == Some(rounded))
            .collect()
    }

    fn responded_coherence_trials(&self, coherence: f64) -> Vec<usize> {
        self.coherence_trials(coherence).into_iter()
            .filter(|&i| self.trial_outcomes[i].is_response())
            .collect()
    }

    fn accuracy_over(&self, trials: &[usize]) -> Option<f64> {
        if trials.is_empty() {
            return None;
        }

        let correct = self.trial_correct();
        let num_correct = trials.iter().filter(|&&i| correct[i]).count();

        Some(num_correct as f64 / trials.len() as f64)
    }

    /// Mean response time (ms) and its standard error for each coherence level, levels
    /// where no trial had a response are skipped
    pub fn mean_rt_by_coherence(&self) -> Vec<CoherenceSummary> {
        self.coherence_levels().into_iter()
            .filter_map(|coherence| {
                let rts: Vec<f64> = self.responded_coherence_trials(coherence).into_iter()
                    .filter_map(|i| self.trial_outcomes[i].response_time)
                    .collect();

                mean_and_sem(&rts).map(|(mean, sem)| CoherenceSummary { coherence, mean, sem })
            })
            .collect()
    }

    /// Fraction correct over responded trials for each coherence level, levels
    /// where no trial had a response are skipped
    pub fn accuracy_by_coherence(&self) -> Vec<(f64, f64)> {
        self.coherence_levels().into_iter()
            .filter_map(|coherence| {
                self.accuracy_over(&self.responded_coherence_trials(coherence))
                    .map(|accuracy| (coherence, accuracy))
            })
            .collect()
    }

    /// Percentage of trials without a response for each coherence level
    pub fn perc_missed_by_coherence(&self) -> Vec<(f64, f64)> {
        self.coherence_levels().into_iter()
            .map(|coherence| {
                let total = self.coherence_trials(coherence).len();
                let responded = self.responded_coherence_trials(coherence).len();

                (coherence, (1. - responded as f64 / total as f64) * 100.)
            })
            .collect()
    }
}

/// Keeps values whose distance from the median is less than `m` times the median
/// distance, if the median distance is zero every value is kept
pub fn reject_outliers(data: &[f64], m: f64) -> Vec<f64> {
    fn median(values: &[f64]) -> Option<f64> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len();
        match n {
            0 => None,
            _ if n % 2 == 1 => Some(sorted[n / 2]),
            _ => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.),
        }
    }

    let center = match median(data) {
        Some(value) => value,
        None => return vec![],
    };
    let deviations: Vec<f64> = data.iter().map(|i| (i - center).abs()).collect();
    let mdev = median(&deviations).unwrap_or(0.);

    if mdev == 0. {
        return data.to_vec();
    }

    data.iter()
        .zip(deviations)
        .filter(|(_, d)| d / mdev < m)
        .map(|(i, _)| *i)
        .collect()
}
