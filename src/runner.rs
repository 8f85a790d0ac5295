use crate::config::Config;
use crate::crossover::first_crossover;
use crate::engine::{Engine, InitialCondition, Scenario};
use crate::error::SimError;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Outcome of one scenario of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub mix_coef: f64,
    pub avg_c: Vec<f64>,
    pub avg_s: Vec<f64>,
    pub crossover: Option<usize>,
}

/// All scenarios of a sweep together with the seed that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResults {
    pub seed: u64,
    pub results: Vec<ScenarioResult>,
}

/// Sweeps the configured mixing coefficients.
pub struct Runner {
    cfg: Config,
}

impl Runner {
    pub fn new(cfg: Config) -> Result<Self, SimError> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Run every scenario of the sweep.
    ///
    /// The initial condition is drawn from stream 0 of `seed` and scenario
    /// `k` uses stream `k + 1`, so results depend only on the seed and not
    /// on how scenarios are scheduled.
    pub fn run_sweep(&self, seed: u64) -> Result<SweepResults, SimError> {
        let shared_init = if self.cfg.sweep.resample_init {
            None
        } else {
            Some(InitialCondition::generate(&self.cfg, &mut stream_rng(seed, 0))?)
        };

        let results = self
            .cfg
            .sweep
            .mix_coefs
            .par_iter()
            .enumerate()
            .map(|(i_scn, &mix_coef)| -> Result<ScenarioResult, SimError> {
                let mut rng = stream_rng(seed, i_scn as u64 + 1);
                let own_init;
                let init = match &shared_init {
                    Some(init) => init,
                    None => {
                        own_init = InitialCondition::generate(&self.cfg, &mut rng)?;
                        &own_init
                    }
                };

                let traj = Engine::new(&self.cfg, Scenario::uniform(mix_coef), rng).run(init)?;
                let crossover = first_crossover(&traj.avg_s, &traj.avg_c);

                match crossover {
                    Some(step) => log::info!("mix_coef = {mix_coef}: first crossover at step {step}"),
                    None => log::info!("mix_coef = {mix_coef}: no crossover"),
                }

                Ok(ScenarioResult {
                    mix_coef,
                    avg_c: traj.avg_c,
                    avg_s: traj.avg_s,
                    crossover,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SweepResults { seed, results })
    }
}

fn stream_rng(seed: u64, stream: u64) -> ChaCha12Rng {
    let mut rng = ChaCha12Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[test]
    fn one_result_per_scenario_in_order() {
        let cfg = test_config(200, vec![0.3, 0.5, 0.7], 1.0);
        let sweep = Runner::new(cfg).expect("valid config").run_sweep(11).expect("sweep");

        assert_eq!(sweep.seed, 11);
        let mix_coefs: Vec<f64> = sweep.results.iter().map(|res| res.mix_coef).collect();
        assert_eq!(mix_coefs, vec![0.3, 0.5, 0.7]);
        for res in &sweep.results {
            assert_eq!(res.avg_c.len(), 20);
            assert_eq!(res.avg_s.len(), 20);
            assert_eq!(res.crossover, first_crossover(&res.avg_s, &res.avg_c));
        }
    }

    #[test]
    fn equal_seeds_give_equal_sweeps() {
        let runner = Runner::new(test_config(100, vec![0.2, 0.8], 1.0)).expect("valid config");
        assert_eq!(
            runner.run_sweep(12).expect("sweep"),
            runner.run_sweep(12).expect("sweep")
        );
        assert_ne!(
            runner.run_sweep(12).expect("sweep"),
            runner.run_sweep(13).expect("sweep")
        );
    }

    #[test]
    fn shared_initial_condition_across_scenarios() {
        let runner = Runner::new(test_config(100, vec![0.4, 0.6], 1.0)).expect("valid config");
        let sweep = runner.run_sweep(14).expect("sweep");
        assert_eq!(sweep.results[0].avg_c[0], sweep.results[1].avg_c[0]);
        assert_eq!(sweep.results[0].avg_s[0], sweep.results[1].avg_s[0]);
    }

    #[test]
    fn resampled_initial_condition_differs() {
        let mut cfg = test_config(100, vec![0.4, 0.6], 1.0);
        cfg.sweep.resample_init = true;
        let sweep = Runner::new(cfg).expect("valid config").run_sweep(15).expect("sweep");
        assert_ne!(sweep.results[0].avg_c[0], sweep.results[1].avg_c[0]);
    }

    #[test]
    fn full_extraction_with_strong_mixing_crosses_over() {
        // Phase 1 never crosses (S holds nothing); the merged phase pulls S up to C.
        let mut cfg = test_config(100, vec![0.0], 0.0);
        cfg.population.frac_extract = 1.0;
        let sweep = Runner::new(cfg).expect("valid config").run_sweep(16).expect("sweep");
        assert_eq!(sweep.results[0].crossover, Some(11));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = test_config(0, vec![0.5], 1.0);
        assert!(matches!(Runner::new(cfg), Err(SimError::Configuration(_))));
    }
}
