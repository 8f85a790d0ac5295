//! Time-indexed wealth snapshots of a fixed-size population.

use crate::error::{SimError, check_len};
use crate::stats::mean;
use std::ops::Range;

/// Sub-population an agent descends from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lineage {
    C,
    S,
}

/// Partition of a merged population into its two lineage blocks.
///
/// Lineage C occupies the first block and lineage S the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineageSplit {
    n_c: usize,
    n_agents: usize,
}

impl LineageSplit {
    pub fn new(n_c: usize, n_s: usize) -> Self {
        Self {
            n_c,
            n_agents: n_c + n_s,
        }
    }

    pub fn n_agents(&self) -> usize {
        self.n_agents
    }

    pub fn range(&self, lineage: Lineage) -> Range<usize> {
        match lineage {
            Lineage::C => 0..self.n_c,
            Lineage::S => self.n_c..self.n_agents,
        }
    }
}

/// Wealth of every agent at every recorded step.
///
/// Snapshots are stored contiguously and only ever appended, so a snapshot
/// is never rewritten once recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    n_agents: usize,
    vals: Vec<f64>,
}

impl Population {
    /// Create a population whose snapshot at t = 0 is `init`.
    ///
    /// `n_steps` only reserves storage.
    pub fn new(init: Vec<f64>, n_steps: usize) -> Result<Self, SimError> {
        let n_agents = init.len();
        if n_agents == 0 {
            return Err(SimError::Configuration(
                "population must contain at least one agent".into(),
            ));
        }
        let mut vals = init;
        vals.reserve(n_agents * n_steps.saturating_sub(1));
        Ok(Self { n_agents, vals })
    }

    pub fn n_agents(&self) -> usize {
        self.n_agents
    }

    /// Number of recorded snapshots.
    pub fn n_steps(&self) -> usize {
        self.vals.len() / self.n_agents
    }

    pub fn snapshot(&self, t: usize) -> Option<&[f64]> {
        let start = t.checked_mul(self.n_agents)?;
        let end = start.checked_add(self.n_agents)?;
        self.vals.get(start..end)
    }

    /// Most recent snapshot.
    pub fn last(&self) -> &[f64] {
        &self.vals[self.vals.len() - self.n_agents..]
    }

    /// Record the snapshot of the next step.
    pub fn push(&mut self, snap: &[f64]) -> Result<(), SimError> {
        check_len("population snapshot", self.n_agents, snap.len())?;
        self.vals.extend_from_slice(snap);
        Ok(())
    }

    pub fn mean_at(&self, t: usize) -> Option<f64> {
        self.snapshot(t).map(mean)
    }

    /// Mean over the agents in `range` at step `t`.
    pub fn mean_in(&self, t: usize, range: Range<usize>) -> Option<f64> {
        self.snapshot(t)?.get(range).map(mean)
    }

    /// Mean of each lineage block at every recorded step.
    pub fn lineage_means(&self, split: &LineageSplit, lineage: Lineage) -> Vec<f64> {
        let range = split.range(lineage);
        (0..self.n_steps())
            .filter_map(|t| self.mean_in(t, range.clone()))
            .collect()
    }

    /// Mean of the whole population at every recorded step.
    pub fn means(&self) -> Vec<f64> {
        (0..self.n_steps()).filter_map(|t| self.mean_at(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_at_uses_exact_agent_count() {
        let mut pop = Population::new(vec![1.0, 2.0, 3.0], 2).expect("non-empty");
        pop.push(&[4.0, 4.0, 7.0]).expect("matching size");

        assert_eq!(pop.n_steps(), 2);
        assert_eq!(pop.mean_at(0), Some(2.0));
        assert_eq!(pop.mean_at(1), Some(5.0));
        assert_eq!(pop.mean_at(2), None);
        assert_eq!(pop.mean_at(usize::MAX / 3), None);
        assert_eq!(pop.means(), vec![2.0, 5.0]);
    }

    #[test]
    fn mean_in_restricts_to_range() {
        let pop = Population::new(vec![1.0, 3.0, 10.0, 20.0], 1).expect("non-empty");
        let split = LineageSplit::new(2, 2);

        assert_eq!(pop.mean_in(0, split.range(Lineage::C)), Some(2.0));
        assert_eq!(pop.mean_in(0, split.range(Lineage::S)), Some(15.0));
        assert_eq!(pop.mean_in(0, 2..9), None);
        assert_eq!(pop.lineage_means(&split, Lineage::S), vec![15.0]);
    }

    #[test]
    fn earlier_snapshots_are_kept() {
        let mut pop = Population::new(vec![1.0, 2.0], 3).expect("non-empty");
        pop.push(&[5.0, 6.0]).expect("matching size");
        pop.push(&[7.0, 8.0]).expect("matching size");

        assert_eq!(pop.snapshot(0), Some(&[1.0, 2.0][..]));
        assert_eq!(pop.snapshot(1), Some(&[5.0, 6.0][..]));
        assert_eq!(pop.last(), &[7.0, 8.0]);
    }

    #[test]
    fn push_rejects_wrong_size() {
        let mut pop = Population::new(vec![1.0, 2.0], 2).expect("non-empty");
        assert_eq!(
            pop.push(&[1.0]),
            Err(SimError::DimensionMismatch {
                what: "population snapshot",
                expected: 2,
                actual: 1,
            })
        );
        assert_eq!(pop.n_steps(), 1);
    }

    #[test]
    fn empty_population_is_rejected() {
        assert!(matches!(
            Population::new(Vec::new(), 1),
            Err(SimError::Configuration(_))
        ));
    }
}
