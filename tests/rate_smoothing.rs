#[cfg(test)]
mod tests {
    use wta_hemodynamics::{
        error::ConfigurationError,
        rates::{RateFilter, population_rate, smooth_rate},
    };

    #[test]
    pub fn test_population_rate() -> Result<(), ConfigurationError> {
        let rates = population_rate(&[0, 2, 4, 1], 2, 0.001)?;

        assert_eq!(rates, vec![0., 1000., 2000., 500.]);

        assert!(population_rate(&[1, 2], 0, 0.001).is_err());
        assert!(population_rate(&[1, 2], 10, 0.).is_err());

        Ok(())
    }

    #[test]
    pub fn test_flat_trace_keeps_mean() -> Result<(), ConfigurationError> {
        let dt = 0.0001;
        let trace = vec![10.; 2000];

        for filter in [RateFilter::Gaussian, RateFilter::Flat] {
            let smoothed = smooth_rate(&trace, dt, 0.005, filter)?;

            assert_eq!(smoothed.len(), trace.len());
            for value in &smoothed[100..1900] {
                assert!((value - 10.).abs() < 1e-9);
            }

            // zero padding at the edges
            assert!(smoothed[0] < 10.);
            assert!(smoothed[smoothed.len() - 1] < 10.);
        }

        Ok(())
    }

    #[test]
    pub fn test_smoothing_spreads_spike() -> Result<(), ConfigurationError> {
        let dt = 0.001;
        let mut trace = vec![0.; 101];
        trace[50] = 1000.;

        let smoothed = smooth_rate(&trace, dt, 0.005, RateFilter::Gaussian)?;

        // centred, symmetric and mass preserving
        let peak = smoothed.iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        assert_eq!(peak, Some(50));
        assert!((smoothed[45] - smoothed[55]).abs() < 1e-9);
        assert!((smoothed.iter().sum::<f64>() - 1000.).abs() < 1e-6);
        assert_eq!(smoothed[30], 0.);

        Ok(())
    }

    #[test]
    pub fn test_flat_filter_is_moving_average() -> Result<(), ConfigurationError> {
        let trace: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let smoothed = smooth_rate(&trace, 1., 1., RateFilter::Flat)?;

        assert!((smoothed[5] - 5.).abs() < 1e-12);
        assert!((smoothed[0] - 1. / 3.).abs() < 1e-12);

        Ok(())
    }

    #[test]
    pub fn test_narrow_width_rejected() {
        assert!(smooth_rate(&[1., 2., 3.], 0.001, 0.0005, RateFilter::Gaussian).is_err());
        assert!(smooth_rate(&[1., 2., 3.], 0.001, f64::NAN, RateFilter::Flat).is_err());
    }
}
