//! Number-Theoretic Transform (NTT) for negacyclic polynomial multiplication.
//!
//! Cooley-Tukey forward and Gentleman-Sande inverse transforms over
//! Z_q[X]/(X^n + 1), one table per RNS prime. Values in the evaluation
//! domain are kept in Montgomery form (R = 2^64): `forward` converts in and
//! `inverse` converts out, so pointwise products and sums stay consistent and
//! multiplying an evaluation-domain value by a plain scalar is still exact.
//!
//! # Requirements
//!
//! `n` must be a power of two and `q < 2^63` must satisfy q ≡ 1 (mod 2n) so
//! that a primitive 2n-th root of unity ψ exists.

use crate::error::{param_err, Result};

use super::modular::ModQ;

/// Precomputed twiddle factors and Montgomery constants for one prime.
#[derive(Clone, Debug)]
pub struct NttTable {
    n: usize,
    q: u64,
    /// -q^(-1) mod 2^64
    q_inv_neg: u64,
    /// 2^128 mod q
    r_squared: u64,
    /// Forward twiddles (powers of ψ, bit-reversed), Montgomery form.
    psi_powers: Vec<u64>,
    /// Inverse twiddles (powers of ψ^(-1), bit-reversed), Montgomery form.
    psi_inv_powers: Vec<u64>,
    /// n^(-1) mod q, standard form.
    n_inv: u64,
}

impl NttTable {
    /// Builds the table for ring dimension `n` and prime `q`.
    pub fn new(n: usize, q: u64) -> Result<Self> {
        if !n.is_power_of_two() || n < 2 {
            return Err(param_err!("NTT dimension {} is not a power of two", n));
        }
        if q >= 1 << 63 || q % (2 * n as u64) != 1 {
            return Err(param_err!("modulus {} is not ≡ 1 (mod {})", q, 2 * n));
        }

        let q_inv_neg = Self::compute_q_inv_neg(q);
        let r_squared = Self::compute_r_squared(q);

        let psi = Self::find_primitive_root(2 * n as u64, q)
            .ok_or_else(|| param_err!("no primitive {}-th root of unity mod {}", 2 * n, q))?;
        let psi_inv = ModQ::pow(psi, q - 2, q);

        let mut table = Self {
            n,
            q,
            q_inv_neg,
            r_squared,
            psi_powers: Vec::new(),
            psi_inv_powers: Vec::new(),
            n_inv: 0,
        };
        table.psi_powers = table.twiddle_factors(psi);
        table.psi_inv_powers = table.twiddle_factors(psi_inv);
        table.n_inv = ModQ::pow(n as u64, q - 2, q);
        Ok(table)
    }

    pub fn dimension(&self) -> usize {
        self.n
    }

    pub fn modulus(&self) -> u64 {
        self.q
    }

    /// Forward NTT in place; input in standard form, output in Montgomery form.
    pub fn forward(&self, coeffs: &mut [u64]) {
        debug_assert_eq!(coeffs.len(), self.n, "length must match dimension");
        for c in coeffs.iter_mut() {
            *c = self.to_montgomery(*c);
        }

        let q = self.q;
        let mut t = self.n;
        let mut m = 1;
        while m < self.n {
            t >>= 1;
            for i in 0..m {
                let j1 = 2 * i * t;
                let w = self.psi_powers[m + i];
                for j in j1..j1 + t {
                    let u = coeffs[j];
                    let v = self.montgomery_mul(coeffs[j + t], w);
                    coeffs[j] = ModQ::add(u, v, q);
                    coeffs[j + t] = ModQ::sub(u, v, q);
                }
            }
            m <<= 1;
        }
    }

    /// Inverse NTT in place; input in Montgomery form, output in standard form.
    pub fn inverse(&self, coeffs: &mut [u64]) {
        debug_assert_eq!(coeffs.len(), self.n, "length must match dimension");

        let q = self.q;
        let mut t = 1;
        let mut m = self.n;
        while m > 1 {
            m >>= 1;
            for i in 0..m {
                let j1 = 2 * i * t;
                let w = self.psi_inv_powers[m + i];
                for j in j1..j1 + t {
                    let u = coeffs[j];
                    let v = coeffs[j + t];
                    coeffs[j] = ModQ::add(u, v, q);
                    coeffs[j + t] = self.montgomery_mul(ModQ::sub(u, v, q), w);
                }
            }
            t <<= 1;
        }

        // Plain n^(-1) scales and leaves Montgomery form in one multiply
        for c in coeffs.iter_mut() {
            *c = self.montgomery_mul(*c, self.n_inv);
        }
    }

    /// Pointwise product of two evaluation-domain vectors.
    pub fn pointwise_mul(&self, a: &[u64], b: &[u64], result: &mut [u64]) {
        for ((r, &x), &y) in result.iter_mut().zip(a).zip(b) {
            *r = self.montgomery_mul(x, y);
        }
    }

    /// `acc += a * b` in the evaluation domain.
    pub fn pointwise_mul_acc(&self, acc: &mut [u64], a: &[u64], b: &[u64]) {
        for ((r, &x), &y) in acc.iter_mut().zip(a).zip(b) {
            *r = ModQ::add(*r, self.montgomery_mul(x, y), self.q);
        }
    }

    #[inline]
    fn montgomery_mul(&self, a: u64, b: u64) -> u64 {
        let ab = (a as u128) * (b as u128);
        let m = ((ab as u64).wrapping_mul(self.q_inv_neg)) as u128;
        let t = ((ab + m * (self.q as u128)) >> 64) as u64;
        if t >= self.q {
            t - self.q
        } else {
            t
        }
    }

    #[inline]
    fn to_montgomery(&self, a: u64) -> u64 {
        self.montgomery_mul(a, self.r_squared)
    }

    fn compute_q_inv_neg(q: u64) -> u64 {
        let mut y: u64 = 1;
        for i in 1..64 {
            let yi = y.wrapping_mul(q) & (1u64 << i);
            y |= yi;
        }
        y.wrapping_neg()
    }

    fn compute_r_squared(q: u64) -> u64 {
        let r_mod_q = (1u128 << 64) % (q as u128);
        ((r_mod_q * r_mod_q) % (q as u128)) as u64
    }

    /// Primitive `order`-th root of unity mod q (`order` a power of two).
    fn find_primitive_root(order: u64, q: u64) -> Option<u64> {
        let exp = (q - 1) / order;
        (2..q.min(1 << 20))
            .map(|g| ModQ::pow(g, exp, q))
            .find(|&candidate| ModQ::pow(candidate, order / 2, q) == q - 1)
    }

    /// Powers of `root` in bit-reversed order, Montgomery form.
    fn twiddle_factors(&self, root: u64) -> Vec<u64> {
        let log_n = self.n.trailing_zeros();
        (0..self.n)
            .map(|k| {
                let exp = reverse_bits(k, log_n) as u64;
                self.to_montgomery(ModQ::pow(root, exp, self.q))
            })
            .collect()
    }
}

#[inline]
fn reverse_bits(x: usize, bits: u32) -> usize {
    if bits == 0 {
        0
    } else {
        x.reverse_bits() >> (usize::BITS - bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::primes::ntt_primes;

    fn table(n: usize) -> NttTable {
        let q = ntt_primes(50, 2 * n as u64, 1, &[])[0];
        NttTable::new(n, q).unwrap()
    }

    fn schoolbook(a: &[u64], b: &[u64], q: u64) -> Vec<u64> {
        let n = a.len();
        let mut out = vec![0u64; n];
        for i in 0..n {
            for j in 0..n {
                let prod = ModQ::mul(a[i], b[j], q);
                if i + j < n {
                    out[i + j] = ModQ::add(out[i + j], prod, q);
                } else {
                    out[i + j - n] = ModQ::sub(out[i + j - n], prod, q);
                }
            }
        }
        out
    }

    #[test]
    fn test_ntt_inverse_roundtrip() {
        for n in [4, 16, 1024] {
            let ctx = table(n);
            let original: Vec<u64> = (0..n as u64).map(|i| i * 12345 % ctx.modulus()).collect();
            let mut coeffs = original.clone();
            ctx.forward(&mut coeffs);
            ctx.inverse(&mut coeffs);
            assert_eq!(coeffs, original);
        }
    }

    #[test]
    fn test_negacyclic_convolution() {
        let n = 256;
        let ctx = table(n);
        let q = ctx.modulus();

        let mut a = vec![0u64; n];
        a[1] = 1;
        let mut b = vec![0u64; n];
        b[n - 1] = 1;

        ctx.forward(&mut a);
        ctx.forward(&mut b);
        let mut result = vec![0u64; n];
        ctx.pointwise_mul(&a, &b, &mut result);
        ctx.inverse(&mut result);

        assert_eq!(result[0], q - 1);
        assert!(result[1..].iter().all(|&c| c == 0));
    }

    #[test]
    fn test_matches_schoolbook() {
        let n = 32;
        let ctx = table(n);
        let q = ctx.modulus();
        let a: Vec<u64> = (0..n as u64).map(|i| (i * 7919 + 3) % q).collect();
        let b: Vec<u64> = (0..n as u64).map(|i| q - 1 - i * 31).collect();
        let expected = schoolbook(&a, &b, q);

        let (mut fa, mut fb) = (a.clone(), b.clone());
        ctx.forward(&mut fa);
        ctx.forward(&mut fb);
        let mut acc = vec![0u64; n];
        ctx.pointwise_mul_acc(&mut acc, &fa, &fb);
        ctx.inverse(&mut acc);
        assert_eq!(acc, expected);
    }

    #[test]
    fn test_rejects_unfriendly_modulus() {
        assert!(NttTable::new(16, 8191).is_err());
        assert!(NttTable::new(12, 97).is_err());
    }
}
