use crate::config::Config;
use crate::runner::{Runner, SweepResults};
use crate::stats::{Accumulator, AccumulatorReport};
use anyhow::{Context, Result, bail};
use glob::glob;
use rand::Rng;
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

/// Crossover statistics of one mixing coefficient over all stored sweeps.
#[derive(Debug, Serialize, Deserialize)]
pub struct MixCoefAnalysis {
    pub mix_coef: f64,
    pub n_sweeps: usize,
    pub n_no_crossover: usize,
    pub crossover: AccumulatorReport,
    pub final_gap: AccumulatorReport,
}

pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    pub fn run_sweep(&self, seed: Option<u64>) -> Result<()> {
        let seed = seed.unwrap_or_else(|| rand::rng().random());
        log::info!("seed = {seed}");

        let runner = Runner::new(self.cfg.clone()).context("failed to construct runner")?;
        let sweep = runner.run_sweep(seed).context("failed to run sweep")?;

        let file_idx = self
            .next_results_idx()
            .context("failed to find next results index")?;
        let file = self.results_file(file_idx);
        save_msgpack(&file, &sweep).context("failed to save sweep results")?;
        log::info!("saved {file:?}");

        Ok(())
    }

    pub fn analyze_sweeps(&self) -> Result<()> {
        let mix_coefs = &self.cfg.sweep.mix_coefs;
        let mut n_no_crossover = vec![0; mix_coefs.len()];
        let mut crossover_accs = vec![Accumulator::new(); mix_coefs.len()];
        let mut final_gap_accs = vec![Accumulator::new(); mix_coefs.len()];

        let files = self
            .results_files()
            .context("failed to list results files")?;
        let n_files = files.len();
        for file in files {
            let sweep: SweepResults =
                load_msgpack(&file).with_context(|| format!("failed to load {file:?}"))?;

            if sweep.results.len() != mix_coefs.len() {
                bail!("{file:?} does not match the current sweep");
            }
            for (i_scn, res) in sweep.results.iter().enumerate() {
                if res.mix_coef != mix_coefs[i_scn] {
                    bail!("{file:?} does not match the current sweep");
                }
                match res.crossover {
                    Some(step) => crossover_accs[i_scn].add(step as f64),
                    None => n_no_crossover[i_scn] += 1,
                }
                if let (Some(c), Some(s)) = (res.avg_c.last(), res.avg_s.last()) {
                    final_gap_accs[i_scn].add(c - s);
                }
            }
        }

        let analysis: Vec<_> = mix_coefs
            .iter()
            .enumerate()
            .map(|(i_scn, &mix_coef)| MixCoefAnalysis {
                mix_coef,
                n_sweeps: n_files,
                n_no_crossover: n_no_crossover[i_scn],
                crossover: crossover_accs[i_scn].report(),
                final_gap: final_gap_accs[i_scn].report(),
            })
            .collect();
        log::info!("{analysis:#?}");

        let file = self.analysis_file();
        save_msgpack(&file, &analysis).context("failed to save analysis")?;
        log::info!("saved {file:?}");

        Ok(())
    }

    pub fn clean_sim(&self) -> Result<()> {
        let mut files = self
            .results_files()
            .context("failed to list results files")?;
        let analysis_file = self.analysis_file();
        if analysis_file.exists() {
            files.push(analysis_file);
        }

        for file in files {
            fs::remove_file(&file).with_context(|| format!("failed to remove {file:?}"))?;
            log::info!("removed {file:?}");
        }

        Ok(())
    }

    fn results_files(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.sim_dir.join("results-*.msgpack");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let files = glob(pattern)
            .context("failed to glob results files")?
            .filter_map(Result::ok)
            .collect();
        Ok(files)
    }

    /// One past the highest existing results index.
    fn next_results_idx(&self) -> Result<usize> {
        let next_idx = self
            .results_files()?
            .iter()
            .filter_map(|file| {
                let stem = file.file_stem()?.to_str()?;
                stem.strip_prefix("results-")?.parse::<usize>().ok()
            })
            .max()
            .map_or(0, |file_idx| file_idx + 1);
        Ok(next_idx)
    }

    fn results_file(&self, file_idx: usize) -> PathBuf {
        self.sim_dir.join(format!("results-{file_idx:04}.msgpack"))
    }

    fn analysis_file(&self) -> PathBuf {
        self.sim_dir.join("analysis.msgpack")
    }
}

fn save_msgpack<T: Serialize + ?Sized>(file: &Path, value: &T) -> Result<()> {
    let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    let mut writer = BufWriter::new(file);
    encode::write(&mut writer, value).context("failed to serialize value")?;
    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}

fn load_msgpack<T: DeserializeOwned>(file: &Path) -> Result<T> {
    let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
    let reader = BufReader::new(file);
    let value = decode::from_read(reader).context("failed to deserialize value")?;
    Ok(value)
}
