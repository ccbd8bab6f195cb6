//! # WTA Hemodynamics
//!
//! `wta_hemodynamics` is a package for deriving an fMRI BOLD signal and behavioural
//! measures from simulated winner-take-all decision networks. A Balloon-Windkessel
//! voxel converts the total synaptic drive of the network into blood flow, volume,
//! deoxyhemoglobin content and BOLD signal, while a decision extractor reads the choice
//! and response time off of the firing rates of the competing populations.
//!
//! Around these two kernels the crate provides rate smoothing, a lock-step trial runner
//! that takes any network implementing [`trial::NetworkSource`], parallel contrast sweeps,
//! session statistics by input coherence and TOML configuration.
//!
//! ## Example Code
//!
//! ### Driving a voxel and reading a decision from a recorded trial
//!
//! ```rust
//! use wta_hemodynamics::{
//!     config::SimulationConfig,
//!     error::WTAHemodynamicsError,
//!     trial::{RecordedNetwork, run_trial},
//! };
//!
//! # fn main() -> Result<(), WTAHemodynamicsError> {
//! let mut config = SimulationConfig::default();
//! config.trial.dt = 0.001; // s
//! config.trial.trial_duration = 3.;
//! config.trial.stim_start_time = 1.;
//! config.trial.stim_end_time = 2.;
//! config.trial.record_exc_voxel = false;
//!
//! let steps = config.trial.num_steps();
//! let g_base = config.voxel.g_base;
//!
//! // stimulus raises drive by half and population 0 wins 300 ms after onset
//! let g_total: Vec<f64> = (0..steps)
//!     .map(|i| if (1000..2000).contains(&i) { g_base * 1.5 } else { g_base })
//!     .collect();
//! let winner: Vec<f64> = (0..steps).map(|i| if i >= 1300 { 80. } else { 5. }).collect();
//! let loser = vec![5.; steps];
//!
//! let mut network = RecordedNetwork::new(g_total, None, vec![winner, loser])?;
//! let result = run_trial(&mut network, &config)?;
//!
//! assert_eq!(result.outcome.winner_index, Some(0));
//! assert!(result.max_bold.unwrap() > 0.);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod decision;
pub mod distribution;
pub mod error;
pub mod rates;
pub mod session;
pub mod sweep;
pub mod trial;
pub mod voxel;
