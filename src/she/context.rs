//! Encryption context: parameters, RNS modulus chain and NTT tables.
//!
//! Passed by reference into every SHE and regression component; nothing in
//! the crate reads an implicit global context.

use tracing::debug;

use crate::error::{param_err, Result};
use crate::math::{ntt_primes, NttTable, RnsTables};
use crate::params::{EncryptionParameters, SPECIAL_PRIME_BITS};

/// Precomputed state shared by keys, ciphertexts and the evaluator.
#[derive(Clone, Debug)]
pub struct SheContext {
    params: EncryptionParameters,
    /// Ciphertext chain q_0, ..., q_L
    chain: Vec<u64>,
    /// Special prime P used only inside key switching
    special: u64,
    tables: RnsTables,
}

impl SheContext {
    /// Generate the chain and special prime and precompute NTT tables.
    pub fn new(params: &EncryptionParameters) -> Result<Self> {
        params.validate()?;

        let step = params.prime_step();
        let count = params.levels + 1;
        let chain = ntt_primes(params.prime_bits, step, count, &[]);
        if chain.len() < count {
            return Err(param_err!(
                "only {} of {} chain primes of {} bits exist with step {}",
                chain.len(),
                count,
                params.prime_bits,
                step
            ));
        }
        let special = ntt_primes(SPECIAL_PRIME_BITS, step, 1, &chain)
            .first()
            .copied()
            .ok_or_else(|| param_err!("no special prime with step {}", step))?;

        let tables = chain
            .iter()
            .chain(std::iter::once(&special))
            .map(|&q| NttTable::new(params.ring_dim, q))
            .collect::<Result<Vec<_>>>()?;

        debug!(?chain, special, ring_dim = params.ring_dim, "built modulus chain");

        Ok(Self {
            params: params.clone(),
            chain,
            special,
            tables: RnsTables::new(params.ring_dim, tables),
        })
    }

    pub fn params(&self) -> &EncryptionParameters {
        &self.params
    }

    pub fn ring_dim(&self) -> usize {
        self.params.ring_dim
    }

    /// Plaintext modulus t = p
    pub fn plaintext_modulus(&self) -> u64 {
        self.params.plaintext_modulus
    }

    pub fn chain(&self) -> &[u64] {
        &self.chain
    }

    pub fn special_prime(&self) -> u64 {
        self.special
    }

    /// Level of a fresh ciphertext
    pub fn max_level(&self) -> usize {
        self.chain.len() - 1
    }

    /// Chain primes q_0..q_level
    pub fn moduli_at(&self, level: usize) -> &[u64] {
        &self.chain[..=level]
    }

    /// Chain plus special prime: the basis key-switching keys live over
    pub fn key_basis(&self) -> Vec<u64> {
        let mut basis = self.chain.clone();
        basis.push(self.special);
        basis
    }

    pub fn tables(&self) -> &RnsTables {
        &self.tables
    }

    /// Total bit length of the chain modulus
    pub fn log_chain_modulus(&self) -> f64 {
        self.chain.iter().map(|&q| (q as f64).log2()).sum()
    }

    /// Galois element of the reflection X -> X^(-1)
    pub fn reflection_element(&self) -> usize {
        2 * self.ring_dim() - 1
    }

    /// Galois elements 2^k + 1 for k = log N down to 1, in trace order
    pub fn trace_elements(&self) -> Vec<usize> {
        let log_n = self.ring_dim().trailing_zeros();
        (1..=log_n).rev().map(|k| (1usize << k) + 1).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{select_parameters, NoiseModel, SecurityLevel};

    #[test]
    fn test_chain_primes_are_compatible() {
        let sel =
            select_parameters(257, 3, 10, 2, &NoiseModel::default(), SecurityLevel::Toy).unwrap();
        let ctx = SheContext::new(&sel.params).unwrap();
        let step = 2 * ctx.ring_dim() as u64 * 257;

        assert_eq!(ctx.chain().len(), 3);
        assert_eq!(ctx.max_level(), 2);
        for &q in ctx.key_basis().iter() {
            assert_eq!(q % step, 1);
        }
        assert!(!ctx.chain().contains(&ctx.special_prime()));
        assert!(ctx.log_chain_modulus() >= sel.log_q as f64 - 1.0);
    }

    #[test]
    fn test_galois_elements() {
        let sel =
            select_parameters(257, 3, 10, 1, &NoiseModel::default(), SecurityLevel::Toy).unwrap();
        let ctx = SheContext::new(&sel.params).unwrap();
        assert_eq!(ctx.ring_dim(), 64);
        assert_eq!(ctx.reflection_element(), 127);
        assert_eq!(ctx.trace_elements(), vec![65, 33, 17, 9, 5, 3]);
    }
}
