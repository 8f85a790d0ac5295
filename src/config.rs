use crate::error::SimError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Population parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of agents in each lineage before the merge.
    pub n_agents: usize,
    /// Upper bound of the uniform initial wealth draw.
    pub wealth_max: f64,
    /// Fraction of each S value transferred to the paired C value at t = 0.
    pub frac_extract: f64,
}

/// Phase parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PhasesConfig {
    /// Number of steps of the initial two-population phase.
    pub steps_init: usize,
    /// Number of steps of the merged phase.
    pub steps_final: usize,
    /// Standard deviation of the noise of lineage C in phase 1.
    pub std_dev_c: f64,
    /// Standard deviation of the noise of lineage S in phase 1.
    pub std_dev_s: f64,
    /// Standard deviation of the noise of the merged population.
    pub std_dev_w: f64,
}

/// Sweep parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Mixing coefficients, one scenario each.
    pub mix_coefs: Vec<f64>,
    /// Draw a new initial condition for every scenario.
    #[serde(default)]
    pub resample_init: bool,
}

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    pub population: PopulationConfig,
    pub phases: PhasesConfig,
    pub sweep: SweepConfig,
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    /// Check every parameter once, before any scenario runs.
    ///
    /// Mixing coefficients are deliberately left unchecked.
    pub fn validate(&self) -> Result<(), SimError> {
        let pop = &self.population;
        check_num("number of agents", pop.n_agents, 1..)?;
        check_num("maximum initial wealth", pop.wealth_max, f64::MIN_POSITIVE..f64::INFINITY)?;
        check_num("extraction fraction", pop.frac_extract, 0.0..=1.0)?;

        let phases = &self.phases;
        check_num("number of initial steps", phases.steps_init, 1..)?;
        check_num("number of final steps", phases.steps_final, 1..)?;
        check_num("noise standard deviation of C", phases.std_dev_c, 0.0..f64::INFINITY)?;
        check_num("noise standard deviation of S", phases.std_dev_s, 0.0..f64::INFINITY)?;
        check_num("noise standard deviation of W", phases.std_dev_w, 0.0..f64::INFINITY)?;

        if self.sweep.mix_coefs.is_empty() {
            return Err(SimError::Configuration(
                "sweep must contain at least one mixing coefficient".into(),
            ));
        }

        Ok(())
    }
}

fn check_num<T, R>(name: &str, num: T, range: R) -> Result<(), SimError>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        return Err(SimError::Configuration(format!(
            "{name} must be in the range {range:?}, but is {num:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_config(n_agents: usize, mix_coefs: Vec<f64>, std_dev: f64) -> Config {
    Config {
        population: PopulationConfig {
            n_agents,
            wealth_max: 100.0,
            frac_extract: 0.25,
        },
        phases: PhasesConfig {
            steps_init: 10,
            steps_final: 10,
            std_dev_c: std_dev,
            std_dev_s: std_dev,
            std_dev_w: std_dev,
        },
        sweep: SweepConfig {
            mix_coefs,
            resample_init: false,
        },
    }
}
