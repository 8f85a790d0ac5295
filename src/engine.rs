use crate::config::Config;
use crate::error::{SimError, check_len};
use crate::noise::NoiseField;
use crate::population::{Lineage, LineageSplit, Population};
use crate::stepper::Stepper;
use rand::Rng;
use rand_chacha::ChaCha12Rng;
use rand_distr::{Distribution, Uniform};

/// Mixing coefficients of the three processes of one scenario.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scenario {
    pub mix_coef_c: f64,
    pub mix_coef_s: f64,
    pub mix_coef_w: f64,
}

impl Scenario {
    /// Same mixing coefficient for every process.
    pub fn uniform(mix_coef: f64) -> Self {
        Self {
            mix_coef_c: mix_coef,
            mix_coef_s: mix_coef,
            mix_coef_w: mix_coef,
        }
    }
}

/// Initial wealth of both lineages, before extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct InitialCondition {
    pub wealth_c: Vec<f64>,
    pub wealth_s: Vec<f64>,
}

impl InitialCondition {
    /// Draw every agent's wealth uniformly from `[0, wealth_max)`.
    pub fn generate<R: Rng + ?Sized>(cfg: &Config, rng: &mut R) -> Result<Self, SimError> {
        let n_agents = cfg.population.n_agents;
        let wealth_dist = Uniform::new(0.0, cfg.population.wealth_max)
            .map_err(|err| SimError::Configuration(format!("invalid wealth bound: {err}")))?;

        let wealth_c = (0..n_agents).map(|_| wealth_dist.sample(rng)).collect();
        let wealth_s = (0..n_agents).map(|_| wealth_dist.sample(rng)).collect();

        Ok(Self { wealth_c, wealth_s })
    }
}

/// Transfer `frac` of every S value to the C value with the same index.
pub fn extract(wealth_c: &mut [f64], wealth_s: &mut [f64], frac: f64) -> Result<(), SimError> {
    check_len("extraction pairs", wealth_c.len(), wealth_s.len())?;
    for (c, s) in wealth_c.iter_mut().zip(wealth_s.iter_mut()) {
        let amount = frac * *s;
        *c += amount;
        *s -= amount;
    }
    Ok(())
}

/// Concatenate the latest snapshots of both lineages, C first.
pub fn merge(
    pop_c: &Population,
    pop_s: &Population,
) -> Result<(Vec<f64>, LineageSplit), SimError> {
    check_len("merged lineages", pop_c.n_agents(), pop_s.n_agents())?;

    let mut merged = Vec::with_capacity(pop_c.n_agents() + pop_s.n_agents());
    merged.extend_from_slice(pop_c.last());
    merged.extend_from_slice(pop_s.last());

    let split = LineageSplit::new(pop_c.n_agents(), pop_s.n_agents());
    Ok((merged, split))
}

/// Lineage averages over both phases.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub avg_c: Vec<f64>,
    pub avg_s: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    Phase1Running,
    Merging,
    Phase2Running,
    Done,
}

/// Two-phase simulation engine.
///
/// Holds the configuration, the scenario, and the random number generator,
/// and runs a scenario from the initial condition to the merged phase.
pub struct Engine<'a> {
    cfg: &'a Config,
    scenario: Scenario,
    rng: ChaCha12Rng,
    phase: Phase,
}

impl<'a> Engine<'a> {
    pub fn new(cfg: &'a Config, scenario: Scenario, rng: ChaCha12Rng) -> Self {
        Self {
            cfg,
            scenario,
            rng,
            phase: Phase::Init,
        }
    }

    /// Run both phases and return the lineage averages.
    ///
    /// Any error aborts the run; no partial trajectory is returned.
    pub fn run(mut self, init: &InitialCondition) -> Result<Trajectory, SimError> {
        let cfg = self.cfg;
        let pop_cfg = &cfg.population;
        let phases = &cfg.phases;
        let n_agents = pop_cfg.n_agents;

        check_len("initial wealth of C", n_agents, init.wealth_c.len())?;
        check_len("initial wealth of S", n_agents, init.wealth_s.len())?;

        let noise_w = NoiseField::new(phases.std_dev_w)?;
        let stepper_c = Stepper::new(self.scenario.mix_coef_c, NoiseField::new(phases.std_dev_c)?);
        let stepper_s = Stepper::new(self.scenario.mix_coef_s, NoiseField::new(phases.std_dev_s)?);
        let stepper_w = Stepper::new(self.scenario.mix_coef_w, noise_w);

        let mut wealth_c = init.wealth_c.clone();
        let mut wealth_s = init.wealth_s.clone();
        extract(&mut wealth_c, &mut wealth_s, pop_cfg.frac_extract)?;

        self.enter(Phase::Phase1Running);
        let mut pop_c = Population::new(wealth_c, phases.steps_init)?;
        let mut pop_s = Population::new(wealth_s, phases.steps_init)?;
        stepper_c.run(&mut pop_c, phases.steps_init, &mut self.rng)?;
        stepper_s.run(&mut pop_s, phases.steps_init, &mut self.rng)?;

        self.enter(Phase::Merging);
        let (merged, split) = merge(&pop_c, &pop_s)?;

        let mut avg_c = pop_c.means();
        let mut avg_s = pop_s.means();

        self.enter(Phase::Phase2Running);
        log::debug!(
            "merged {} agents, noise standard deviation {}",
            split.n_agents(),
            noise_w.std_dev()
        );
        let mut pop_w = Population::new(merged, phases.steps_final)?;
        stepper_w.run(&mut pop_w, phases.steps_final, &mut self.rng)?;

        avg_c.extend(pop_w.lineage_means(&split, Lineage::C));
        avg_s.extend(pop_w.lineage_means(&split, Lineage::S));

        self.enter(Phase::Done);
        Ok(Trajectory { avg_c, avg_s })
    }

    fn enter(&mut self, phase: Phase) {
        log::debug!("{:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }
}
