//! Randomness for key generation and encryption

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// Default Gaussian standard deviation
pub const DEFAULT_SIGMA: f64 = 3.2;

/// Error and secret sampler backed by ChaCha20
pub struct Sampler {
    sigma: f64,
    rng: ChaCha20Rng,
}

impl Sampler {
    /// Create a new sampler seeded from OS entropy
    pub fn new(sigma: f64) -> Self {
        Self {
            sigma,
            rng: ChaCha20Rng::from_entropy(),
        }
    }

    /// Create a seeded sampler for reproducibility
    pub fn with_seed(sigma: f64, seed: u64) -> Self {
        Self {
            sigma,
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Sample from discrete Gaussian using Box-Muller transform
    pub fn gaussian(&mut self) -> i64 {
        let u1: f64 = self.rng.gen_range(f64::MIN_POSITIVE..1.0);
        let u2: f64 = self.rng.gen_range(0.0..1.0);

        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        (z * self.sigma).round() as i64
    }

    /// Vector of n discrete Gaussian samples
    pub fn gaussian_vec(&mut self, n: usize) -> Vec<i64> {
        (0..n).map(|_| self.gaussian()).collect()
    }

    /// Vector of n uniform samples from {-1, 0, 1}
    pub fn ternary_vec(&mut self, n: usize) -> Vec<i64> {
        (0..n).map(|_| self.rng.gen_range(-1..=1)).collect()
    }

    /// Underlying RNG, for uniform ring elements
    pub fn rng(&mut self) -> &mut ChaCha20Rng {
        &mut self.rng
    }

    /// Get the standard deviation
    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}
