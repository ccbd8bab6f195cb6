//! Population firing rate estimation from spike counts and smoothing of rate traces.

use serde::{Deserialize, Serialize};
use crate::error::ConfigurationError;


/// Shape of the smoothing window used in [`smooth_rate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateFilter {
    /// Gaussian window spanning two widths on either side
    #[default]
    Gaussian,
    /// Rectangular window spanning one width on either side
    Flat,
}

/// Converts per-step spike counts of a population into a firing rate (Hz) given the
/// number of neurons in the population and the timestep (s)
pub fn population_rate(spike_counts: &[usize], group_size: usize, dt: f64) -> Result<Vec<f64>, ConfigurationError> {
    if group_size == 0 {
        return Err(ConfigurationError::InvalidParameter {
            name: "group_size", value: 0., reason: "must be positive",
        });
    }
    if !dt.is_finite() || dt <= 0. {
        return Err(ConfigurationError::InvalidParameter {
            name: "dt", value: dt, reason: "must be positive and finite",
        });
    }

    let scale = 1. / (group_size as f64 * dt);

    Ok(
        spike_counts.iter()
            .map(|&count| count as f64 * scale)
            .collect()
    )
}

fn window(filter: RateFilter, width_dt: usize) -> Vec<f64> {
    let values: Vec<f64> = match filter {
        RateFilter::Gaussian => {
            let extent = 2 * width_dt as i64;
            let denominator = 2. * (width_dt as f64).powi(2);

            (-extent..=extent)
                .map(|k| (-(k as f64).powi(2) / denominator).exp())
                .collect()
        },
        RateFilter::Flat => vec![1.; 2 * width_dt + 1],
    };

    let total: f64 = values.iter().sum();

    values.iter()
        .map(|i| i / total)
        .collect()
}

/// Smooths a rate trace (sampled every `dt` seconds) with a normalized window of the given
/// `width` (s), output has the same length as the input and samples beyond either end
/// are treated as zero
pub fn smooth_rate(rates: &[f64], dt: f64, width: f64, filter: RateFilter) -> Result<Vec<f64>, ConfigurationError> {
    if !dt.is_finite() || dt <= 0. {
        return Err(ConfigurationError::InvalidParameter {
            name: "dt", value: dt, reason: "must be positive and finite",
        });
    }
    if !width.is_finite() || width < dt {
        return Err(ConfigurationError::InvalidParameter {
            name: "rate_smoothing_width", value: width, reason: "must be at least one timestep",
        });
    }

    // guards against widths like 5 ms / 0.1 ms landing just under an integer
    let width_dt = ((width / dt) + 1e-9).floor() as usize;
    let kernel = window(filter, width_dt);
    let half = kernel.len() / 2;
    let n = rates.len();

    Ok(
        (0..n).map(|i| {
            kernel.iter()
                .enumerate()
                .filter_map(|(k, weight)| {
                    // sample aligned with kernel position k when centred on i
                    let j = (i + half).checked_sub(k)?;
                    rates.get(j).map(|rate| rate * weight)
                })
                .sum()
        })
        .collect()
    )
}
