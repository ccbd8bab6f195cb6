#[cfg(test)]
mod tests {
    use std::io::Write;
    use tempfile::NamedTempFile;
    use wta_hemodynamics::{
        config::{SimulationConfig, load_config},
        error::ConfigurationError,
        rates::RateFilter,
        voxel::Integrator,
    };

    #[test]
    pub fn test_round_trip() -> Result<(), ConfigurationError> {
        let mut config = SimulationConfig::default();
        config.voxel.b0 = 3.;
        config.decision.lower_threshold = Some(15.);
        config.trial.integrator = Integrator::RungeKutta4;
        config.trial.rate_filter = RateFilter::Flat;

        let text = config.to_toml_string()?;
        let parsed = SimulationConfig::from_toml_str(&text)?;

        assert_eq!(parsed, config);

        Ok(())
    }

    #[test]
    pub fn test_partial_file_uses_defaults() -> Result<(), ConfigurationError> {
        let config = SimulationConfig::from_toml_str(
            r#"
            [decision]
            upper_threshold = 45.0

            [trial]
            integrator = "runge_kutta4"
            "#
        )?;

        let defaults = SimulationConfig::default();
        assert_eq!(config.decision.upper_threshold, 45.);
        assert_eq!(config.decision.lower_threshold, None);
        assert_eq!(config.trial.integrator, Integrator::RungeKutta4);
        assert_eq!(config.trial.dt, defaults.trial.dt);
        assert_eq!(config.voxel, defaults.voxel);

        Ok(())
    }

    #[test]
    pub fn test_equal_thresholds_accepted() -> Result<(), ConfigurationError> {
        let config = SimulationConfig::from_toml_str(
            "[decision]\nupper_threshold = 60.0\nlower_threshold = 60.0"
        )?;

        assert_eq!(config.decision.lower_threshold, Some(60.));

        Ok(())
    }

    #[test]
    pub fn test_load_from_file() -> Result<(), ConfigurationError> {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[voxel]\nb0 = 7.0\n\n[trial]\ntrial_duration = 2.0\nstim_end_time = 1.5").unwrap();

        let config = load_config(file.path())?;

        assert_eq!(config.voxel.b0, 7.);
        assert_eq!(config.trial.trial_duration, 2.);
        assert_eq!(config.trial.stim_end_time, 1.5);

        Ok(())
    }

    #[test]
    pub fn test_invalid_files_rejected() {
        assert!(matches!(
            SimulationConfig::from_toml_str("[decision]\nupper_threshold = inf"),
            Err(ConfigurationError::InvalidParameter { name: "upper_threshold", .. }),
        ));
        assert!(matches!(
            SimulationConfig::from_toml_str("[trial]\ntrial_duration = 1e30"),
            Err(ConfigurationError::InvalidParameter { name: "trial_duration", .. }),
        ));
        assert!(matches!(
            SimulationConfig::from_toml_str("[voxel]\ne_base = 1.5"),
            Err(ConfigurationError::InvalidParameter { name: "e_base", .. }),
        ));
        assert!(matches!(
            SimulationConfig::from_toml_str("[trial\ndt = "),
            Err(ConfigurationError::ConfigFile(_)),
        ));
        assert!(matches!(
            load_config("/nonexistent/wta_hemodynamics.toml"),
            Err(ConfigurationError::ConfigFile(_)),
        ));
    }
}
