use crate::error::{SimError, check_len};
use crate::noise::NoiseField;
use crate::population::Population;
use crate::stats::mean;
use rand::Rng;

/// Apply one mean-reversion update.
///
/// `next[i] = mix_coef * cur[i] + (1 - mix_coef) * mean(cur) + noise[i]`
pub fn revert_to_mean(
    cur: &[f64],
    mix_coef: f64,
    noise: &[f64],
    next: &mut Vec<f64>,
) -> Result<(), SimError> {
    check_len("noise vector", cur.len(), noise.len())?;

    let pull = (1.0 - mix_coef) * mean(cur);
    next.clear();
    next.extend(
        cur.iter()
            .zip(noise)
            .map(|(&val, &eps)| mix_coef * val + pull + eps),
    );
    Ok(())
}

/// Mean-reversion process with a fixed mixing coefficient and noise level.
#[derive(Debug, Clone, Copy)]
pub struct Stepper {
    mix_coef: f64,
    noise: NoiseField,
}

impl Stepper {
    pub fn new(mix_coef: f64, noise: NoiseField) -> Self {
        Self { mix_coef, noise }
    }

    /// Advance `pop` until it holds `n_steps` snapshots.
    pub fn run<R: Rng + ?Sized>(
        &self,
        pop: &mut Population,
        n_steps: usize,
        rng: &mut R,
    ) -> Result<(), SimError> {
        let n_agents = pop.n_agents();
        let mut next = Vec::with_capacity(n_agents);

        while pop.n_steps() < n_steps {
            let eps = self.noise.sample(rng, n_agents);
            revert_to_mean(pop.last(), self.mix_coef, &eps, &mut next)?;
            pop.push(&next)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn quiet_stepper(mix_coef: f64) -> Stepper {
        Stepper::new(mix_coef, NoiseField::new(0.0).expect("valid std dev"))
    }

    #[test]
    fn no_reversion_no_noise_keeps_values() {
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        let init = vec![1.5, 20.0, 42.0, 7.25];
        let mut pop = Population::new(init.clone(), 6).expect("non-empty");

        quiet_stepper(1.0).run(&mut pop, 6, &mut rng).expect("run");

        assert_eq!(pop.n_steps(), 6);
        for t in 0..6 {
            assert_eq!(pop.snapshot(t), Some(&init[..]));
        }
    }

    #[test]
    fn full_reversion_jumps_to_mean() {
        let mut rng = ChaCha12Rng::seed_from_u64(4);
        let mut pop = Population::new(vec![0.0, 10.0, 20.0, 50.0], 4).expect("non-empty");

        quiet_stepper(0.0).run(&mut pop, 4, &mut rng).expect("run");

        for t in 0..3 {
            let mean = pop.mean_at(t).expect("recorded step");
            let next = pop.snapshot(t + 1).expect("recorded step");
            assert!(next.iter().all(|&val| val == mean));
        }
    }

    #[test]
    fn partial_reversion_rule() {
        let mut next = Vec::new();
        revert_to_mean(&[2.0, 6.0], 0.25, &[0.5, -1.0], &mut next).expect("matching size");
        // mean = 4, pull = 3
        assert_eq!(next, vec![0.5 + 3.0 + 0.5, 1.5 + 3.0 - 1.0]);
    }

    #[test]
    fn noise_length_mismatch_is_rejected() {
        let mut next = Vec::new();
        assert!(matches!(
            revert_to_mean(&[1.0, 2.0, 3.0], 0.5, &[0.0, 0.0], &mut next),
            Err(SimError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn seeded_runs_are_identical() {
        let stepper = Stepper::new(0.5, NoiseField::new(1.0).expect("valid std dev"));
        let init = vec![10.0, 20.0, 30.0];

        let mut pop_a = Population::new(init.clone(), 8).expect("non-empty");
        let mut pop_b = Population::new(init, 8).expect("non-empty");
        stepper
            .run(&mut pop_a, 8, &mut ChaCha12Rng::seed_from_u64(5))
            .expect("run");
        stepper
            .run(&mut pop_b, 8, &mut ChaCha12Rng::seed_from_u64(5))
            .expect("run");

        assert_eq!(pop_a, pop_b);
    }
}
