//! Tools to generate clamped noise and noisy synaptic drive from explicitly seeded generators.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use crate::error::ConfigurationError;


/// Samples the normal distribution at the given mean and standard deviation and clamps
/// the output value between the given minimum and maximum, if standard deviation is `0.` the
/// mean is always returned
pub fn limited_distr<R: Rng + ?Sized>(
    mean: f64,
    std: f64,
    minimum: f64,
    maximum: f64,
    rng: &mut R,
) -> Result<f64, ConfigurationError> {
    if std == 0. {
        return Ok(mean);
    }

    let normal = Normal::new(mean, std)
        .map_err(|_| ConfigurationError::InvalidParameter {
            name: "std", value: std, reason: "must be positive and finite",
        })?;
    let output: f64 = normal.sample(rng);

    Ok(output.max(minimum).min(maximum))
}

/// Normally distributed total synaptic drive (nA) clamped from below, used to
/// drive voxels without a full network
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussianDrive {
    /// Mean drive (nA)
    pub mean: f64,
    /// Standard deviation of drive (nA)
    pub std: f64,
    /// Smallest drive that can be produced (nA)
    pub minimum: f64,
}

impl Default for GaussianDrive {
    fn default() -> Self {
        GaussianDrive {
            mean: 28670.,
            std: 1000.,
            minimum: 0.,
        }
    }
}

impl GaussianDrive {
    /// Generates `steps` samples of drive from the given generator
    pub fn generate<R: Rng + ?Sized>(&self, steps: usize, rng: &mut R) -> Result<Vec<f64>, ConfigurationError> {
        (0..steps)
            .map(|_| limited_distr(self.mean, self.std, self.minimum, f64::INFINITY, rng))
            .collect()
    }
}
