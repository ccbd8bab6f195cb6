extern crate wta_hemodynamics;
use rand::{rngs::StdRng, SeedableRng};
use std::{env, fs::File, io::{BufWriter, Write}};
use tracing::info;
use tracing_subscriber::EnvFilter;
use wta_hemodynamics::{
    config::{SimulationConfig, load_config},
    distribution::limited_distr,
    error::WTAHemodynamicsError,
    session::SessionRecord,
    sweep::{TrialCondition, contrast_conditions, mean_max_bold_by_contrast, run_sweep},
    trial::{NetworkSample, NetworkSource},
};


/// Two competing rate populations with self-excitation and mutual inhibition,
/// stands in for a spiking winner-take-all network
struct CompetingPools {
    inputs: Vec<f64>,
    rates: [f64; 2],
    g_base: f64,
    stim_start_time: f64,
    stim_end_time: f64,
    rng: StdRng,
}

impl CompetingPools {
    fn new(condition: &TrialCondition, config: &SimulationConfig) -> Self {
        CompetingPools {
            inputs: condition.inputs.clone(),
            rates: [3., 3.],
            g_base: config.voxel.g_base,
            stim_start_time: config.trial.stim_start_time,
            stim_end_time: config.trial.stim_end_time,
            rng: StdRng::seed_from_u64(condition.seed),
        }
    }
}

impl NetworkSource for CompetingPools {
    fn num_populations(&self) -> usize {
        2
    }

    fn step(&mut self, _step: usize, time: f64, dt: f64) -> Result<NetworkSample, WTAHemodynamicsError> {
        let tau = 0.02; // s
        let stimulated = time >= self.stim_start_time && time < self.stim_end_time;
        let [r0, r1] = self.rates;

        let mut next = [0.; 2];
        for (i, rate) in next.iter_mut().enumerate() {
            let (own, other) = if i == 0 { (r0, r1) } else { (r1, r0) };
            let input = if stimulated { self.inputs[i] } else { 0. };
            let noise = limited_distr(0., 8., -40., 40., &mut self.rng)?;

            let target = (3. + 0.35 * input + 0.9 * own - 1.1 * other + noise).clamp(0., 100.);
            *rate = own + dt / tau * (target - own);
        }
        self.rates = next;

        let input_sum: f64 = if stimulated { self.inputs.iter().sum() } else { 0. };
        let g_exc = self.g_base * (1. + (next[0] + next[1] + input_sum) / 400.);
        let g_total = g_exc + self.g_base * (next[0] + next[1]) / 800.;

        Ok(NetworkSample { g_total, g_total_exc: Some(g_exc), rates: next.to_vec() })
    }
}

/// Runs a sweep of trials over several input contrasts using an optional TOML config given
/// as the first argument, writes one row per trial to `contrast_sweep.csv` in the current
/// working directory and logs accuracy and response time by coherence
fn main() -> Result<(), WTAHemodynamicsError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match env::args().nth(1) {
        Some(path) => load_config(path)?,
        None => {
            let mut config = SimulationConfig::default();
            config.trial.dt = 0.0005;
            config.trial.trial_duration = 3.;
            config.trial.stim_start_time = 0.5;
            config.trial.stim_end_time = 2.5;

            config
        },
    };

    let contrasts = [0., 0.032, 0.064, 0.128, 0.256, 0.512];
    let conditions = contrast_conditions(&contrasts, 10, 80., 2024)?;

    let entries = run_sweep(
        &conditions,
        |condition| Ok(CompetingPools::new(condition, &config)),
        &config,
    );

    let mut file = BufWriter::new(File::create("contrast_sweep.csv")
        .expect("Could not create file"));
    writeln!(file, "trial,contrast,correct_input,choice,response_time,max_bold,max_exc_bold")
        .expect("Could not write to file");

    for entry in &entries {
        let condition = &entry.condition;
        match &entry.result {
            Ok(result) => writeln!(
                file,
                "{},{},{},{},{},{},{}",
                condition.trial,
                condition.contrast,
                condition.correct_input,
                result.outcome.choice(),
                result.outcome.response_time.map_or(String::from(""), |i| i.to_string()),
                result.max_bold.map_or(String::from(""), |i| i.to_string()),
                result.max_exc_bold.map_or(String::from(""), |i| i.to_string()),
            ).expect("Could not write to file"),
            Err(e) => info!(trial = condition.trial, error = %e, "skipping failed trial"),
        }
    }

    let mut session = SessionRecord::default();
    let failed = session.record_sweep(&entries);

    info!(
        trials = session.num_trials(),
        failed = failed.len(),
        perc_correct = ?session.perc_correct(),
        perc_missed = ?session.perc_missed(),
        "session finished"
    );

    for summary in session.mean_rt_by_coherence() {
        info!(coherence = summary.coherence, mean_rt = summary.mean, sem = summary.sem, "response time");
    }
    for (coherence, accuracy) in session.accuracy_by_coherence() {
        info!(coherence, accuracy, "accuracy");
    }
    for (contrast, max_bold) in mean_max_bold_by_contrast(&entries) {
        info!(contrast, max_bold, "peak bold");
    }

    Ok(())
}
