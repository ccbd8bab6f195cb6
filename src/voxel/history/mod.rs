//! Monitors that record voxel state over a trial and a helper to drive a voxel
//! through a whole trace of synaptic input.

use tracing::trace;
use crate::error::WTAHemodynamicsError;
use super::Voxel;


/// Handles recording of voxel state after each step
pub trait VoxelHistory: Default {
    /// Stores the current state of the voxel given the drive that produced it
    fn update(&mut self, voxel: &Voxel, g_total: f64);
    /// Resets history
    fn reset(&mut self);
}

fn max_of(values: &[f64]) -> Option<f64> {
    values.iter()
        .copied()
        .max_by(|a, b| a.total_cmp(b))
}

/// Stores every state variable along with the drive and BOLD signal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FullVoxelHistory {
    /// Total synaptic drive (nA)
    pub g_total: Vec<f64>,
    /// Vasodilatory signal
    pub s: Vec<f64>,
    /// Blood inflow
    pub f_in: Vec<f64>,
    /// Blood volume
    pub v: Vec<f64>,
    /// Deoxyhemoglobin content
    pub q: Vec<f64>,
    /// BOLD signal
    pub y: Vec<f64>,
}

impl VoxelHistory for FullVoxelHistory {
    fn update(&mut self, voxel: &Voxel, g_total: f64) {
        let state = voxel.state();

        self.g_total.push(g_total);
        self.s.push(state.s);
        self.f_in.push(state.f_in);
        self.v.push(state.v);
        self.q.push(state.q);
        self.y.push(voxel.bold());
    }

    fn reset(&mut self) {
        self.g_total.clear();
        self.s.clear();
        self.f_in.clear();
        self.v.clear();
        self.q.clear();
        self.y.clear();
    }
}

impl FullVoxelHistory {
    /// Largest BOLD value recorded, `None` if nothing has been recorded
    pub fn max_bold(&self) -> Option<f64> {
        max_of(&self.y)
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }
}

/// Stores only the BOLD signal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoldHistory {
    /// BOLD values
    pub history: Vec<f64>,
}

impl VoxelHistory for BoldHistory {
    fn update(&mut self, voxel: &Voxel, _g_total: f64) {
        self.history.push(voxel.bold());
    }

    fn reset(&mut self) {
        self.history.clear();
    }
}

impl BoldHistory {
    /// Largest BOLD value recorded, `None` if nothing has been recorded
    pub fn max_bold(&self) -> Option<f64> {
        max_of(&self.history)
    }
}

/// Keeps only the peak BOLD value, for summary-only runs
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeakBold {
    /// Largest BOLD value seen so far
    pub max: Option<f64>,
}

impl VoxelHistory for PeakBold {
    fn update(&mut self, voxel: &Voxel, _g_total: f64) {
        let y = voxel.bold();
        self.max = Some(self.max.map_or(y, |current| current.max(y)));
    }

    fn reset(&mut self) {
        self.max = None;
    }
}

/// Steps the voxel once per value of `drive` at a timestep of `dt` seconds,
/// recording into `history` after every step, a numerical instability is
/// reported with the time of the step that failed
pub fn run_voxel<T: VoxelHistory>(
    voxel: &mut Voxel,
    history: &mut T,
    drive: &[f64],
    dt: f64,
) -> Result<(), WTAHemodynamicsError> {
    for (i, &g_total) in drive.iter().enumerate() {
        voxel.step(g_total, dt)
            .map_err(|e| e.at_time(i as f64 * dt))?;
        history.update(voxel, g_total);

        trace!(step = i, y = voxel.bold(), "voxel step");
    }

    Ok(())
}
