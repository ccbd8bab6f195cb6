//! An implementation of a Balloon-Windkessel hemodynamic voxel with a linear
//! signal/flow coupling front end, used to derive a BOLD signal from total synaptic input.
//!
//! The voxel is integrated in lock-step with the spiking network that drives it,
//! the caller supplies the instantaneous drive and the timestep on every call so the
//! voxel has no clock of its own.
//!
//! ```rust
//! use wta_hemodynamics::voxel::{Voxel, VoxelParameters};
//! # use wta_hemodynamics::error::WTAHemodynamicsError;
//!
//! # fn main() -> Result<(), WTAHemodynamicsError> {
//! let params = VoxelParameters::default();
//! let mut voxel = Voxel::new(params)?;
//!
//! // one second of drive 20% above baseline at a 0.1 ms timestep
//! for _ in 0..10_000 {
//!     voxel.step(params.g_base * 1.2, 0.0001)?;
//! }
//!
//! assert!(voxel.state().f_in > 1.);
//! # Ok(())
//! # }
//! ```

use std::ops::{Add, Mul};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use crate::error::{ConfigurationError, NumericalInstability, StateVariable, WTAHemodynamicsError};
pub mod history;


/// Physical constants of the voxel, fixed once a voxel is created
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoxelParameters {
    /// Resting total synaptic drive (nA), drive is normalized against this value
    pub g_base: f64,
    /// Synaptic efficacy (1/s)
    pub eta: f64,
    /// Signal decay time constant (s)
    pub tau_s: f64,
    /// Autoregulatory feedback time constant (s)
    pub tau_f: f64,
    /// Grubb's parameter
    pub alpha: f64,
    /// Venous time constant (s)
    pub tau_o: f64,
    /// Resting net oxygen extraction fraction by the capillary bed
    pub e_base: f64,
    /// Resting blood volume fraction
    pub v_base: f64,
    /// Resting intravascular transverse relaxation time (s)
    pub t_2e: f64,
    /// Resting extravascular transverse relaxation time (s)
    pub t_2i: f64,
    /// Effective intravascular spin density
    pub s_e_0: f64,
    /// Effective extravascular spin density
    pub s_i_0: f64,
    /// Main magnetic field strength (T)
    pub b0: f64,
    /// Echo time (s)
    pub te: f64,
}

impl Default for VoxelParameters {
    fn default() -> Self {
        VoxelParameters {
            g_base: 28670., // nA
            eta: 0.5, // Zheng et al., 2002
            tau_s: 0.8, // Zheng et al., 2002
            tau_f: 0.4, // Zheng et al., 2002
            alpha: 0.2,
            tau_o: 1., // Friston et al., 2000
            e_base: 0.8, // Friston et al., 2000
            v_base: 0.02, // Friston et al., 2000
            t_2e: 0.0414, // 41.4 ms at 4T, Yacoub et al., 2001
            t_2i: 0.0235, // 23.5 ms at 4T, Yacoub et al., 2001
            s_e_0: 1., // Behzadi & Liu, 2005
            s_i_0: 1., // Behzadi & Liu, 2005
            b0: 4.7,
            te: 0.02,
        }
    }
}

fn invalid(name: &'static str, value: f64, reason: &'static str) -> ConfigurationError {
    ConfigurationError::InvalidParameter { name, value, reason }
}

impl VoxelParameters {
    /// Checks that every parameter is finite and within its physical range
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let all = [
            ("g_base", self.g_base), ("eta", self.eta), ("tau_s", self.tau_s),
            ("tau_f", self.tau_f), ("alpha", self.alpha), ("tau_o", self.tau_o),
            ("e_base", self.e_base), ("v_base", self.v_base), ("t_2e", self.t_2e),
            ("t_2i", self.t_2i), ("s_e_0", self.s_e_0), ("s_i_0", self.s_i_0),
            ("b0", self.b0), ("te", self.te),
        ];
        if let Some((name, value)) = all.iter().find(|(_, value)| !value.is_finite()) {
            return Err(invalid(*name, *value, "must be finite"));
        }

        let positive = [
            ("g_base", self.g_base), ("tau_s", self.tau_s), ("tau_f", self.tau_f),
            ("alpha", self.alpha), ("tau_o", self.tau_o), ("v_base", self.v_base),
            ("t_2e", self.t_2e), ("t_2i", self.t_2i), ("s_e_0", self.s_e_0),
            ("s_i_0", self.s_i_0), ("b0", self.b0), ("te", self.te),
        ];
        if let Some((name, value)) = positive.iter().find(|(_, value)| *value <= 0.) {
            return Err(invalid(*name, *value, "must be positive"));
        }

        if self.e_base <= 0. || self.e_base >= 1. {
            return Err(invalid("e_base", self.e_base, "must be within (0, 1)"));
        }

        Ok(())
    }

    /// Calculates the MR constants `k1`, `k2` and `k3` for these parameters
    pub fn magnetic_constants(&self) -> MagneticConstants {
        MagneticConstants::from_parameters(self)
    }
}

/// BOLD signal constants derived from field strength, echo time and relaxation times
/// (Obata et al., 2004), only obtainable from a full set of [`VoxelParameters`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagneticConstants {
    pub k1: f64,
    pub k2: f64,
    pub k3: f64,
}

impl MagneticConstants {
    /// Derives the constants from the given parameters
    pub fn from_parameters(params: &VoxelParameters) -> Self {
        let field_ratio = params.b0 / 1.5;
        let freq_offset = 40.3 * field_ratio;
        let r_0 = 25. * field_ratio.powi(2);

        let s_e = params.s_e_0 * (-params.te / params.t_2e).exp();
        let s_i = params.s_i_0 * (-params.te / params.t_2i).exp();
        let beta = s_e / s_i;

        MagneticConstants {
            k1: 4.3 * freq_offset * params.e_base * params.te,
            k2: beta * r_0 * params.e_base * params.te,
            k3: beta - 1.,
        }
    }
}

/// Integrated state of a voxel, derived observables are calculated from this
/// through [`HemodynamicModel`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoxelState {
    /// Vasodilatory signal
    pub s: f64,
    /// Normalized blood inflow
    pub f_in: f64,
    /// Normalized blood volume
    pub v: f64,
    /// Normalized deoxyhemoglobin content
    pub q: f64,
}

impl Default for VoxelState {
    fn default() -> Self {
        VoxelState::resting()
    }
}

impl VoxelState {
    /// State at rest, `s = 0` with inflow, volume and deoxyhemoglobin at baseline
    pub fn resting() -> Self {
        VoxelState { s: 0., f_in: 1., v: 1., q: 1. }
    }

    /// Checks that inflow and volume are positive and every variable is finite,
    /// otherwise outflow and oxygen extraction are undefined
    pub fn check_domain(&self) -> Result<(), NumericalInstability> {
        let checks = [
            (StateVariable::Inflow, self.f_in, true),
            (StateVariable::Volume, self.v, true),
            (StateVariable::Signal, self.s, false),
            (StateVariable::Deoxyhemoglobin, self.q, false),
        ];

        for (variable, value, must_be_positive) in checks {
            if !value.is_finite() || (must_be_positive && value <= 0.) {
                return Err(NumericalInstability { variable, value, time: None });
            }
        }

        Ok(())
    }
}

/// Time derivatives of each [`VoxelState`] variable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelDerivatives {
    pub ds: f64,
    pub df_in: f64,
    pub dv: f64,
    pub dq: f64,
}

impl Add for VoxelDerivatives {
    type Output = VoxelDerivatives;

    fn add(self, rhs: VoxelDerivatives) -> VoxelDerivatives {
        VoxelDerivatives {
            ds: self.ds + rhs.ds,
            df_in: self.df_in + rhs.df_in,
            dv: self.dv + rhs.dv,
            dq: self.dq + rhs.dq,
        }
    }
}

impl Mul<f64> for VoxelDerivatives {
    type Output = VoxelDerivatives;

    fn mul(self, rhs: f64) -> VoxelDerivatives {
        VoxelDerivatives {
            ds: self.ds * rhs,
            df_in: self.df_in * rhs,
            dv: self.dv * rhs,
            dq: self.dq * rhs,
        }
    }
}

impl VoxelState {
    fn displaced(&self, change: VoxelDerivatives, h: f64) -> VoxelState {
        VoxelState {
            s: self.s + h * change.ds,
            f_in: self.f_in + h * change.df_in,
            v: self.v + h * change.dv,
            q: self.q + h * change.dq,
        }
    }
}

/// Fixed step integration scheme used to advance a voxel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Integrator {
    /// Forward Euler, one derivative evaluation per step
    #[default]
    Euler,
    /// Classical fourth order Runge-Kutta
    RungeKutta4,
}

/// Equations of the hemodynamic model bound to a validated set of parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HemodynamicModel {
    params: VoxelParameters,
    constants: MagneticConstants,
}

impl HemodynamicModel {
    /// Validates the parameters and derives the magnetic constants
    pub fn new(params: VoxelParameters) -> Result<Self, ConfigurationError> {
        params.validate()?;

        Ok(HemodynamicModel { params, constants: params.magnetic_constants() })
    }

    pub fn parameters(&self) -> &VoxelParameters {
        &self.params
    }

    pub fn magnetic_constants(&self) -> &MagneticConstants {
        &self.constants
    }

    /// Blood outflow, `v^(1/alpha)`
    pub fn f_out(&self, state: &VoxelState) -> f64 {
        state.v.powf(1. / self.params.alpha)
    }

    /// Oxygen extraction fraction, `1 - (1 - e_base)^(1/f_in)`
    pub fn o_e(&self, state: &VoxelState) -> f64 {
        1. - (1. - self.params.e_base).powf(1. / state.f_in)
    }

    /// BOLD signal read out from deoxyhemoglobin and volume
    pub fn bold(&self, state: &VoxelState) -> f64 {
        let MagneticConstants { k1, k2, k3 } = self.constants;

        self.params.v_base * ((k1 + k2) * (1. - state.q) - (k2 + k3) * (1. - state.v))
    }

    /// Calculates the time derivatives (per second) of the state given the total synaptic drive
    pub fn derivatives(&self, state: &VoxelState, g_total: f64) -> Result<VoxelDerivatives, NumericalInstability> {
        state.check_domain()?;

        let p = &self.params;
        let f_out = self.f_out(state);
        let o_e = self.o_e(state);

        Ok(
            VoxelDerivatives {
                ds: p.eta * (g_total - p.g_base) / p.g_base - state.s / p.tau_s - (state.f_in - 1.) / p.tau_f,
                df_in: state.s,
                dv: (state.f_in - f_out) / p.tau_o,
                dq: (state.f_in * o_e / p.e_base - f_out * state.q / state.v) / p.tau_o,
            }
        )
    }

    /// Returns the state one timestep (`dt`, seconds) later, the given state is not modified
    pub fn advance(
        &self,
        state: &VoxelState,
        g_total: f64,
        dt: f64,
        integrator: Integrator,
    ) -> Result<VoxelState, WTAHemodynamicsError> {
        if !dt.is_finite() || dt <= 0. {
            return Err(invalid("dt", dt, "must be positive and finite").into());
        }
        if !g_total.is_finite() {
            return Err(invalid("g_total", g_total, "must be finite").into());
        }

        let next = match integrator {
            Integrator::Euler => {
                let k1 = self.derivatives(state, g_total)?;

                state.displaced(k1, dt)
            },
            Integrator::RungeKutta4 => {
                let k1 = self.derivatives(state, g_total)?;
                let k2 = self.derivatives(&state.displaced(k1, dt / 2.), g_total)?;
                let k3 = self.derivatives(&state.displaced(k2, dt / 2.), g_total)?;
                let k4 = self.derivatives(&state.displaced(k3, dt), g_total)?;

                state.displaced(k1 + k2 * 2. + k3 * 2. + k4, dt / 6.)
            },
        };

        next.check_domain()?;

        Ok(next)
    }
}

/// A single simulated voxel, owns its state and advances it with the drive
/// supplied at every step
#[derive(Debug, Clone, PartialEq)]
pub struct Voxel {
    model: HemodynamicModel,
    state: VoxelState,
    integrator: Integrator,
}

impl Default for Voxel {
    fn default() -> Self {
        let params = VoxelParameters::default();

        Voxel {
            model: HemodynamicModel { params, constants: params.magnetic_constants() },
            state: VoxelState::resting(),
            integrator: Integrator::default(),
        }
    }
}

impl Voxel {
    /// Creates a voxel at rest, fails if any parameter is invalid
    pub fn new(params: VoxelParameters) -> Result<Self, ConfigurationError> {
        let model = HemodynamicModel::new(params)?;
        let MagneticConstants { k1, k2, k3 } = model.constants;
        debug!(k1, k2, k3, g_base = params.g_base, "created voxel");

        Ok(
            Voxel {
                model,
                state: VoxelState::resting(),
                integrator: Integrator::default(),
            }
        )
    }

    /// Returns the default implementation of the voxel
    pub fn default_impl() -> Self {
        Voxel::default()
    }

    /// Sets the integration scheme used by [`Voxel::step`]
    pub fn with_integrator(mut self, integrator: Integrator) -> Self {
        self.integrator = integrator;

        self
    }

    /// Advances the voxel by `dt` seconds given the total synaptic drive at this instant,
    /// on failure the state is left as it was before the call
    pub fn step(&mut self, g_total: f64, dt: f64) -> Result<(), WTAHemodynamicsError> {
        match self.model.advance(&self.state, g_total, dt, self.integrator) {
            Ok(next) => {
                self.state = next;

                Ok(())
            },
            Err(e) => {
                warn!(error = %e, g_total, "voxel step rejected");

                Err(e)
            },
        }
    }

    /// Current BOLD signal
    pub fn bold(&self) -> f64 {
        self.model.bold(&self.state)
    }

    /// Current blood outflow
    pub fn f_out(&self) -> f64 {
        self.model.f_out(&self.state)
    }

    /// Current oxygen extraction fraction
    pub fn o_e(&self) -> f64 {
        self.model.o_e(&self.state)
    }

    pub fn state(&self) -> &VoxelState {
        &self.state
    }

    pub fn model(&self) -> &HemodynamicModel {
        &self.model
    }

    pub fn parameters(&self) -> &VoxelParameters {
        self.model.parameters()
    }

    pub fn integrator(&self) -> Integrator {
        self.integrator
    }

    /// Returns the voxel to rest for the start of a new trial
    pub fn reset(&mut self) {
        self.state = VoxelState::resting();
    }
}
