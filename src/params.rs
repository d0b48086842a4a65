//! Parameter selection for encrypted regression
//!
//! Sizes the modulus chain from the dataset shape. The chain must absorb the
//! noise of the Gram stage plus `dim - 1` sequential Cramer multiplications;
//! undersizing it corrupts results silently rather than failing.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{param_err, Result};
use crate::math::{bit_length, is_prime, is_primitive_root, DEFAULT_SIGMA};

/// Largest supported ring dimension
pub const MAX_RING_DIM: usize = 1 << 16;

/// Bit size of the special key-switching prime
pub const SPECIAL_PRIME_BITS: u32 = 60;

/// Largest chain prime the NTT and Montgomery code accept
pub const MAX_PRIME_BITS: u32 = 60;

/// Security level for ring-dimension selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SecurityLevel {
    /// 128-bit security for ternary secrets (homomorphic encryption standard bounds)
    #[default]
    Bits128,
    /// Smallest ring that holds one block; for tests and demonstrations only
    Toy,
}

impl SecurityLevel {
    /// Largest total modulus bit length allowed at ring dimension `n`.
    pub fn max_log_qp(&self, n: usize) -> Option<u32> {
        match self {
            SecurityLevel::Toy => Some(u32::MAX),
            SecurityLevel::Bits128 => match n {
                1024 => Some(27),
                2048 => Some(54),
                4096 => Some(109),
                8192 => Some(218),
                16384 => Some(438),
                32768 => Some(881),
                _ if n < 1024 => Some(0),
                _ => None,
            },
        }
    }
}

/// Empirical noise-growth constants.
///
/// The defaults reproduce the modulus-size formula
/// `logQ = ceil((4.5·ln n + max(1, dim-1)·(ln 1280 + 2·ln n + ln xi)) / ln 2 + 24.7)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseModel {
    /// Additive safety margin in bits
    pub margin_bits: f64,
    /// Per-multiplication growth constant
    pub growth_constant: f64,
    /// Coefficient of ln n in the fresh-noise term
    pub fresh_log_factor: f64,
    /// Extra bits per chain prime on top of the scheme's per-level noise bound
    pub level_margin_bits: u32,
}

impl Default for NoiseModel {
    fn default() -> Self {
        Self {
            margin_bits: 24.7,
            growth_constant: 1280.0,
            fresh_log_factor: 4.5,
            level_margin_bits: 6,
        }
    }
}

impl NoiseModel {
    /// Bit length of the ciphertext modulus needed for `dim` sequential
    /// multiplications over values bounded by `n` and `xi`.
    pub fn log_q(&self, n: u64, dim: usize, xi: usize) -> u32 {
        let ln_n = (n as f64).ln();
        let depth = dim.saturating_sub(1).max(1) as f64;
        let lg_q = self.fresh_log_factor * ln_n
            + depth * (self.growth_constant.ln() + 2.0 * ln_n + (xi as f64).ln());
        (lg_q / std::f64::consts::LN_2 + self.margin_bits).ceil() as u32
    }

    /// Smallest chain-prime size that keeps one level of this scheme
    /// correct at ring dimension `ring_dim`: a product of two rescaled
    /// ciphertexts summed over `xi` terms and traced over the ring.
    pub fn min_prime_bits(&self, p: u64, ring_dim: usize, xi: usize) -> u32 {
        let bound = (p as f64).log2() + 2.0 * (ring_dim as f64).log2() + (xi as f64).log2();
        bound.ceil() as u32 + self.level_margin_bits
    }
}

/// Encryption parameters for one regression run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptionParameters {
    /// Ring dimension N (power of two, at least the block size)
    pub ring_dim: usize,
    /// Required ciphertext modulus bit length from the noise formula
    pub log_q: u32,
    /// Plaintext prime p
    pub plaintext_modulus: u64,
    /// Generator g of Z_p^*
    pub generator: u64,
    /// Plaintext space exponent r (plaintext space Z_{p^r}); only 1 is supported
    pub plaintext_exponent: u32,
    /// Rows per block
    pub block_size: usize,
    /// Multiplicative levels in the chain (chain has `levels + 1` primes)
    pub levels: usize,
    /// Bit size of each chain prime
    pub prime_bits: u32,
    /// Standard deviation for Gaussian error sampling
    pub sigma: f64,
    pub security: SecurityLevel,
}

impl EncryptionParameters {
    /// Total bit length of the ciphertext modulus chain
    pub fn chain_bits(&self) -> u32 {
        (self.levels as u32 + 1) * self.prime_bits
    }

    /// Required congruence step for every chain prime: q ≡ 1 (mod 2N·p)
    pub fn prime_step(&self) -> u64 {
        2 * self.ring_dim as u64 * self.plaintext_modulus
    }

    /// Check if parameters are valid
    pub fn validate(&self) -> Result<()> {
        validate_plaintext(self.plaintext_modulus, self.generator)?;

        if self.plaintext_exponent != 1 {
            return Err(param_err!(
                "plaintext exponent {} unsupported; only 1 is implemented",
                self.plaintext_exponent
            ));
        }
        if !self.ring_dim.is_power_of_two() || self.ring_dim < 4 {
            return Err(param_err!("ring_dim {} must be a power of two ≥ 4", self.ring_dim));
        }
        if self.ring_dim > MAX_RING_DIM {
            return Err(param_err!("ring_dim {} exceeds {}", self.ring_dim, MAX_RING_DIM));
        }
        if self.block_size == 0 || self.block_size > self.ring_dim {
            return Err(param_err!(
                "block size {} does not fit ring dimension {}",
                self.block_size,
                self.ring_dim
            ));
        }
        if self.levels == 0 {
            return Err(param_err!("at least one level is required"));
        }
        if self.prime_bits > MAX_PRIME_BITS
            || self.prime_bits < bit_length(self.prime_step()) + 2
        {
            return Err(param_err!(
                "chain prime size {} bits incompatible with step {}",
                self.prime_bits,
                self.prime_step()
            ));
        }
        if self.chain_bits() < self.log_q {
            return Err(param_err!(
                "chain of {} bits is below the required {} bits",
                self.chain_bits(),
                self.log_q
            ));
        }
        Ok(())
    }
}

/// Output of parameter selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSelection {
    /// Largest power of two ≤ (p-1)/2 - 1
    pub block_size: usize,
    /// ceil(rows / block_size)
    pub n_blocks: usize,
    /// max(n_blocks, dim)
    pub xi: usize,
    /// Required modulus bit length
    pub log_q: u32,
    pub params: EncryptionParameters,
}

/// Per-block capacity bound n = (p-1)/2 - 1.
pub fn capacity_bound(p: u64) -> u64 {
    ((p - 1) / 2).saturating_sub(1)
}

/// Largest power of two not exceeding `capacity_bound(p)`, by repeated halving.
pub fn block_size_for(p: u64) -> usize {
    let mut block_size = 1usize;
    let mut val = capacity_bound(p);
    while val > 1 {
        block_size <<= 1;
        val >>= 1;
    }
    block_size
}

fn validate_plaintext(p: u64, g: u64) -> Result<()> {
    if p < 5 || p % 2 == 0 || !is_prime(p) {
        return Err(param_err!("p = {} must be an odd prime ≥ 5", p));
    }
    if capacity_bound(p) <= 1 {
        return Err(param_err!(
            "p = {} leaves no room for a block: (p-1)/2 - 1 must exceed 1",
            p
        ));
    }
    if p > 1 << 30 {
        return Err(param_err!("p = {} too large for word-sized chain primes", p));
    }
    let block_size = block_size_for(p);
    if block_size > MAX_RING_DIM {
        return Err(param_err!(
            "p = {} needs blocks of {} slots, more than the largest ring ({})",
            p,
            block_size,
            MAX_RING_DIM
        ));
    }
    if g <= 1 || g >= p {
        return Err(param_err!("generator {} must satisfy 1 < g < p", g));
    }
    Ok(())
}

/// Derive block layout, modulus size and encryption parameters for a dataset
/// of `rows` rows and `dim` features over the prime `p`.
pub fn select_parameters(
    p: u64,
    g: u64,
    rows: usize,
    dim: usize,
    noise: &NoiseModel,
    security: SecurityLevel,
) -> Result<ParameterSelection> {
    validate_plaintext(p, g)?;
    if !is_primitive_root(g, p) {
        warn!("generator {} is not a primitive root mod {}", g, p);
    }
    if rows == 0 || dim == 0 {
        return Err(param_err!("dataset must have at least one row and one feature"));
    }

    let block_size = block_size_for(p);
    let n_blocks = rows.div_ceil(block_size);
    let xi = n_blocks.max(dim);
    let log_q = noise.log_q(capacity_bound(p), dim, xi);
    let levels = dim;

    let mut ring_dim = block_size.max(4);
    let prime_bits = loop {
        let bits = chain_prime_bits(log_q, levels, ring_dim, p, xi, noise);
        let total = (levels as u32 + 1) * bits + SPECIAL_PRIME_BITS;
        let fits = security
            .max_log_qp(ring_dim)
            .is_some_and(|max| total <= max);
        if fits && bits <= MAX_PRIME_BITS {
            break bits;
        }
        if bits > MAX_PRIME_BITS {
            return Err(param_err!(
                "chain primes of {} bits needed at ring dimension {}",
                bits,
                ring_dim
            ));
        }
        ring_dim *= 2;
        if ring_dim > MAX_RING_DIM || security.max_log_qp(ring_dim).is_none() {
            return Err(param_err!(
                "no ring dimension up to {} supports a {}-bit modulus at {:?}",
                MAX_RING_DIM,
                total,
                security
            ));
        }
    };

    debug!(
        block_size,
        n_blocks, xi, log_q, ring_dim, prime_bits, "selected parameters"
    );

    let params = EncryptionParameters {
        ring_dim,
        log_q,
        plaintext_modulus: p,
        generator: g,
        plaintext_exponent: 1,
        block_size,
        levels,
        prime_bits,
        sigma: DEFAULT_SIGMA,
        security,
    };
    params.validate()?;

    Ok(ParameterSelection {
        block_size,
        n_blocks,
        xi,
        log_q,
        params,
    })
}

fn chain_prime_bits(
    log_q: u32,
    levels: usize,
    ring_dim: usize,
    p: u64,
    xi: usize,
    noise: &NoiseModel,
) -> u32 {
    let count = levels as u32 + 1;
    let from_formula = log_q.div_ceil(count) + 1;
    let from_noise = noise.min_prime_bits(p, ring_dim, xi);
    let from_step = bit_length(2 * ring_dim as u64 * p) + 8;
    from_formula.max(from_noise).max(from_step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegressionError;

    fn toy(p: u64, g: u64, rows: usize, dim: usize) -> ParameterSelection {
        select_parameters(p, g, rows, dim, &NoiseModel::default(), SecurityLevel::Toy).unwrap()
    }

    #[test]
    fn test_block_size_halving() {
        assert_eq!(block_size_for(8191), 2048);
        assert_eq!(block_size_for(257), 64);
        assert_eq!(block_size_for(7), 2);
        assert_eq!(block_size_for(11), 4);
    }

    #[test]
    fn test_log_q_reference_values() {
        assert_eq!(toy(8191, 17, 4, 2).log_q, 115);
        assert_eq!(toy(8191, 17, 4, 1).log_q, 114);
        assert_eq!(toy(8191, 17, 4, 3).log_q, 151);
        assert_eq!(toy(257, 3, 100, 2).log_q, 82);
        assert_eq!(toy(257, 3, 10, 3).log_q, 108);
    }

    #[test]
    fn test_block_counts() {
        let exact = toy(257, 3, 128, 2);
        assert_eq!(exact.n_blocks, 2);
        let partial = toy(257, 3, 129, 2);
        assert_eq!(partial.n_blocks, 3);
        assert_eq!(partial.xi, 3);
    }

    #[test]
    fn test_selection_is_monotonic() {
        let mut prev = 0;
        for dim in 1..6 {
            let sel = toy(257, 3, 50, dim);
            assert!(sel.log_q >= prev);
            prev = sel.log_q;
        }
        let mut prev = 0;
        for rows in [1, 64, 65, 500, 5000] {
            let sel = toy(257, 3, rows, 2);
            assert!(sel.log_q >= prev);
            prev = sel.log_q;
        }
        assert_eq!(toy(8191, 17, 4, 2), toy(8191, 17, 4, 2));
    }

    #[test]
    fn test_chain_covers_log_q() {
        let sel = toy(8191, 17, 4, 2);
        let params = &sel.params;
        assert_eq!(params.ring_dim, 2048);
        assert_eq!(params.levels, 2);
        assert!(params.chain_bits() >= sel.log_q);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_secure_ring_is_larger() {
        let sel =
            select_parameters(8191, 17, 4, 2, &NoiseModel::default(), SecurityLevel::Bits128)
                .unwrap();
        let p = &sel.params;
        let total = p.chain_bits() + SPECIAL_PRIME_BITS;
        assert!(p.ring_dim > 2048);
        assert!(total <= SecurityLevel::Bits128.max_log_qp(p.ring_dim).unwrap());
    }

    #[test]
    fn test_rejects_bad_configuration() {
        let noise = NoiseModel::default();
        let sec = SecurityLevel::Toy;
        assert!(select_parameters(8190, 17, 4, 2, &noise, sec).is_err());
        assert!(select_parameters(9, 2, 4, 2, &noise, sec).is_err());
        assert!(select_parameters(5, 2, 4, 2, &noise, sec).is_err());
        assert!(select_parameters(8191, 8191, 4, 2, &noise, sec).is_err());
        assert!(select_parameters(8191, 1, 4, 2, &noise, sec).is_err());
        assert!(select_parameters(8191, 17, 0, 2, &noise, sec).is_err());
        // Blocks wider than the largest ring
        let err = select_parameters(786433, 10, 4, 2, &noise, sec).unwrap_err();
        assert!(matches!(err, RegressionError::InvalidParameters(ref m) if m.contains("262144")));
        assert!(select_parameters(65537, 3, 4, 2, &noise, sec).is_ok());
        // Non-primitive generators only warn
        assert!(select_parameters(8191, 2, 4, 2, &noise, sec).is_ok());
    }

    #[test]
    fn test_exponent_must_be_one() {
        let mut params = toy(257, 3, 10, 1).params;
        params.plaintext_exponent = 3;
        assert!(params.validate().is_err());
    }
}
