#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};
    use wta_hemodynamics::{
        distribution::GaussianDrive,
        error::{StateVariable, WTAHemodynamicsError},
        voxel::{
            Integrator, Voxel, VoxelParameters,
            history::{FullVoxelHistory, VoxelHistory, run_voxel},
        },
    };

    fn step_drive(g_base: f64, steps: usize) -> Vec<f64> {
        vec![g_base * 1.5; steps]
    }

    fn steady_state_bold(params: &VoxelParameters, f_in: f64) -> f64 {
        let constants = params.magnetic_constants();
        let v = f_in.powf(params.alpha);
        let o_e = 1. - (1. - params.e_base).powf(1. / f_in);
        let q = v * o_e / params.e_base;

        params.v_base * ((constants.k1 + constants.k2) * (1. - q) - (constants.k2 + constants.k3) * (1. - v))
    }

    #[test]
    pub fn test_baseline_drive_is_fixed_point() -> Result<(), WTAHemodynamicsError> {
        let mut voxel = Voxel::default_impl();
        let g_base = voxel.parameters().g_base;

        for _ in 0..10_000 {
            voxel.step(g_base, 0.0001)?;
        }

        let state = voxel.state();
        assert!(state.s.abs() < 1e-12);
        assert!((state.f_in - 1.).abs() < 1e-12);
        assert!((state.v - 1.).abs() < 1e-12);
        assert!((state.q - 1.).abs() < 1e-12);
        assert!(voxel.bold().abs() < 1e-12);

        Ok(())
    }

    #[test]
    pub fn test_step_response() -> Result<(), WTAHemodynamicsError> {
        let params = VoxelParameters::default();
        let mut voxel = Voxel::new(params)?;
        let dt = 0.001;
        let drive = step_drive(params.g_base, 40_000);

        let mut history = FullVoxelHistory::default();
        run_voxel(&mut voxel, &mut history, &drive, dt)?;

        let expected_f_in = 1. + params.tau_f * params.eta * 0.5;

        // signal rises first and then relaxes back to zero
        let max_s = history.s.iter().cloned().fold(f64::MIN, f64::max);
        assert!(max_s > 0.);
        assert!(history.s[history.s.len() - 1].abs() < 1e-6);

        // inflow overshoots before settling
        let max_f_in = history.f_in.iter().cloned().fold(f64::MIN, f64::max);
        assert!(max_f_in > expected_f_in + 1e-3);
        assert!((voxel.state().f_in - expected_f_in).abs() < 1e-6);

        let expected_bold = steady_state_bold(&params, expected_f_in);
        assert!(expected_bold > 0.);
        assert!((voxel.bold() - expected_bold).abs() < 1e-5);
        assert!((voxel.f_out() - expected_f_in).abs() < 1e-5);

        Ok(())
    }

    #[test]
    pub fn test_euler_agrees_with_runge_kutta() -> Result<(), WTAHemodynamicsError> {
        let params = VoxelParameters::default();

        let mut euler = Voxel::new(params)?.with_integrator(Integrator::Euler);
        let mut euler_history = FullVoxelHistory::default();
        run_voxel(&mut euler, &mut euler_history, &step_drive(params.g_base, 100_000), 0.0001)?;

        let mut rk4 = Voxel::new(params)?.with_integrator(Integrator::RungeKutta4);
        let mut rk4_history = FullVoxelHistory::default();
        run_voxel(&mut rk4, &mut rk4_history, &step_drive(params.g_base, 10_000), 0.001)?;

        for (n, rk4_y) in rk4_history.y.iter().enumerate().step_by(100) {
            let euler_y = euler_history.y[(n + 1) * 10 - 1];
            assert!((euler_y - rk4_y).abs() < 1e-4, "y differs at step {}: {} vs {}", n, euler_y, rk4_y);
        }
        assert!((euler.state().f_in - rk4.state().f_in).abs() < 1e-3);

        Ok(())
    }

    #[test]
    pub fn test_identical_drive_is_deterministic() -> Result<(), WTAHemodynamicsError> {
        let drive = GaussianDrive::default().generate(20_000, &mut StdRng::seed_from_u64(5))?;

        let mut first = Voxel::default_impl();
        let mut first_history = FullVoxelHistory::default();
        run_voxel(&mut first, &mut first_history, &drive, 0.0001)?;

        let mut second = Voxel::default_impl();
        let mut second_history = FullVoxelHistory::default();
        run_voxel(&mut second, &mut second_history, &drive, 0.0001)?;

        assert_eq!(first_history, second_history);
        assert_eq!(first.state(), second.state());

        Ok(())
    }

    #[test]
    pub fn test_negative_drive_is_unstable() {
        let mut voxel = Voxel::default_impl();
        let g_base = voxel.parameters().g_base;
        let drive = vec![-10. * g_base; 50_000];

        let mut history = FullVoxelHistory::default();
        let result = run_voxel(&mut voxel, &mut history, &drive, 0.0001);

        match result {
            Err(WTAHemodynamicsError::NumericalInstability(err)) => {
                assert_eq!(err.variable, StateVariable::Inflow);
                assert!(err.value <= 0.);

                let time = err.time.expect("time should be attached");
                assert!(time > 0. && time < 5.);
                assert_eq!(history.len(), (time / 0.0001).round() as usize);
            },
            other => panic!("expected numerical instability, got {:?}", other),
        }

        // last accepted state is kept
        assert!(voxel.state().f_in > 0.);

        history.reset();
        assert!(history.is_empty());
    }

    #[test]
    pub fn test_invalid_parameters_rejected() {
        let params = VoxelParameters { e_base: 1.2, ..VoxelParameters::default() };
        assert!(Voxel::new(params).is_err());

        let params = VoxelParameters { tau_o: 0., ..VoxelParameters::default() };
        assert!(Voxel::new(params).is_err());

        let params = VoxelParameters { g_base: f64::NAN, ..VoxelParameters::default() };
        assert!(Voxel::new(params).is_err());

        for params in [
            VoxelParameters { b0: 0., ..VoxelParameters::default() },
            VoxelParameters { te: -0.01, ..VoxelParameters::default() },
            VoxelParameters { v_base: 0., ..VoxelParameters::default() },
            VoxelParameters { alpha: 0., ..VoxelParameters::default() },
        ] {
            assert!(Voxel::new(params).is_err());
        }
    }
}
