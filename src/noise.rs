use crate::error::SimError;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Additive Gaussian noise with zero mean.
#[derive(Debug, Clone, Copy)]
pub struct NoiseField {
    dist: Normal<f64>,
}

impl NoiseField {
    pub fn new(std_dev: f64) -> Result<Self, SimError> {
        let dist = Normal::new(0.0, std_dev).map_err(|err| {
            SimError::Configuration(format!("invalid noise standard deviation {std_dev}: {err}"))
        })?;
        Ok(Self { dist })
    }

    pub fn std_dev(&self) -> f64 {
        self.dist.std_dev()
    }

    /// Draw `count` independent values.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, count: usize) -> Vec<f64> {
        let mut buf = vec![0.0; count];
        self.fill(rng, &mut buf);
        buf
    }

    /// Overwrite `buf` with independent draws.
    pub fn fill<R: Rng + ?Sized>(&self, rng: &mut R, buf: &mut [f64]) {
        for val in buf.iter_mut() {
            *val = self.dist.sample(rng);
        }
    }
}
