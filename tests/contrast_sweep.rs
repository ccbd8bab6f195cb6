#[cfg(test)]
mod tests {
    use wta_hemodynamics::{
        config::SimulationConfig,
        error::{ConfigurationError, WTAHemodynamicsError},
        session::SessionRecord,
        sweep::{
            SweepEntry, TrialCondition, contrast_conditions,
            mean_max_bold_by_contrast, run_sweep,
        },
        trial::{NetworkSample, NetworkSource},
    };

    /// Population with the larger input ramps up after a latency that shrinks with contrast,
    /// drive scales with total input
    struct InputDrivenNetwork {
        inputs: Vec<f64>,
        contrast: f64,
        g_base: f64,
        stim_start_time: f64,
        stim_end_time: f64,
        nan_drive: bool,
    }

    impl NetworkSource for InputDrivenNetwork {
        fn num_populations(&self) -> usize {
            self.inputs.len()
        }

        fn step(&mut self, _step: usize, time: f64, _dt: f64) -> Result<NetworkSample, WTAHemodynamicsError> {
            let stimulated = time >= self.stim_start_time && time < self.stim_end_time;
            let latency = 0.6 - 0.4 * self.contrast;
            let decided = stimulated && time >= self.stim_start_time + latency;

            let largest = self.inputs.iter().cloned().fold(f64::MIN, f64::max);
            let rates = self.inputs.iter()
                .map(|&input| if decided && input == largest { 70. } else { 4. })
                .collect();

            let g_total = if self.nan_drive && stimulated {
                f64::NAN
            } else if stimulated {
                self.g_base * (1. + self.contrast * 0.5)
            } else {
                self.g_base
            };

            Ok(NetworkSample { g_total, g_total_exc: Some(g_total), rates })
        }
    }

    fn config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.trial.dt = 0.001;
        config.trial.trial_duration = 2.;
        config.trial.stim_start_time = 0.5;
        config.trial.stim_end_time = 1.5;

        config
    }

    fn network(condition: &TrialCondition, config: &SimulationConfig, nan_drive: bool) -> InputDrivenNetwork {
        InputDrivenNetwork {
            inputs: condition.inputs.clone(),
            contrast: condition.contrast,
            g_base: config.voxel.g_base,
            stim_start_time: config.trial.stim_start_time,
            stim_end_time: config.trial.stim_end_time,
            nan_drive,
        }
    }

    fn sweep(failing: &[usize]) -> Result<Vec<SweepEntry>, ConfigurationError> {
        let config = config();
        let conditions = contrast_conditions(&[0.032, 0.256, 0.512], 3, 80., 17)?;

        Ok(
            run_sweep(
                &conditions,
                |condition| {
                    if condition.trial == 1 && failing.contains(&1) {
                        return Err(ConfigurationError::NoPopulations.into());
                    }

                    Ok(network(condition, &config, failing.contains(&condition.trial)))
                },
                &config,
            )
        )
    }

    #[test]
    pub fn test_sweep_chooses_larger_input() -> Result<(), ConfigurationError> {
        let entries = sweep(&[])?;

        assert_eq!(entries.len(), 9);
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.condition.trial, i);

            let result = entry.result.as_ref().expect("trial should succeed");
            assert_eq!(result.outcome.winner_index, Some(entry.condition.correct_input));
        }

        // larger contrast decides sooner and drives a larger response
        let first_rt = entries[0].result.as_ref().unwrap().outcome.response_time.unwrap();
        let last_rt = entries[8].result.as_ref().unwrap().outcome.response_time.unwrap();
        assert!(last_rt < first_rt);

        let peaks = mean_max_bold_by_contrast(&entries);
        assert_eq!(peaks.len(), 3);
        assert!(peaks[0].1 < peaks[1].1 && peaks[1].1 < peaks[2].1);

        Ok(())
    }

    #[test]
    pub fn test_sweep_is_reproducible() -> Result<(), ConfigurationError> {
        let first = sweep(&[])?;
        let second = sweep(&[])?;

        assert_eq!(first, second);

        Ok(())
    }

    #[test]
    pub fn test_failed_trials_are_isolated() -> Result<(), ConfigurationError> {
        let entries = sweep(&[1, 4])?;

        assert_eq!(entries.len(), 9);

        match &entries[1].result {
            Err(WTAHemodynamicsError::TrialFailed { trial, source }) => {
                assert_eq!(*trial, 1);
                assert_eq!(**source, WTAHemodynamicsError::from(ConfigurationError::NoPopulations));
            },
            other => panic!("expected failed trial, got {:?}", other),
        }
        assert!(matches!(
            entries[4].result,
            Err(WTAHemodynamicsError::TrialFailed { trial: 4, .. }),
        ));

        for (i, entry) in entries.iter().enumerate() {
            if i != 1 && i != 4 {
                assert!(entry.result.is_ok());
            }
        }

        let mut session = SessionRecord::default();
        let failed = session.record_sweep(&entries);

        assert_eq!(failed, vec![1, 4]);
        assert_eq!(session.num_trials(), 7);
        assert_eq!(session.perc_correct(), Some(1.));

        Ok(())
    }
}
