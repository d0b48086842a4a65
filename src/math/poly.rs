//! Polynomials over R_Q = Z_Q[X]/(X^N + 1) in RNS form.
//!
//! A polynomial is stored as one residue vector ("limb") per prime of its
//! basis. Limbs are either all in coefficient form or all in NTT form.
//! Coefficient form is canonical: every homomorphic operation returns
//! coefficient-form polynomials, and NTT form is used inside
//! multiplication and key switching.
//!
//! Structural mismatches (different bases, domains or dimensions) are
//! programming errors and panic, matching the operator impls; fallible
//! checks happen one layer up in the evaluator.

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::modular::ModQ;
use super::ntt::NttTable;

/// NTT tables for every prime a polynomial may be expressed over.
#[derive(Clone, Debug)]
pub struct RnsTables {
    n: usize,
    tables: Vec<NttTable>,
}

impl RnsTables {
    pub fn new(n: usize, tables: Vec<NttTable>) -> Self {
        Self { n, tables }
    }

    pub fn dimension(&self) -> usize {
        self.n
    }

    /// Table for prime `q`.
    ///
    /// # Panics
    ///
    /// Panics if `q` was not part of the basis these tables were built for.
    pub fn table(&self, q: u64) -> &NttTable {
        match self.tables.iter().find(|t| t.modulus() == q) {
            Some(table) => table,
            None => panic!("no NTT table for modulus {}", q),
        }
    }
}

/// Polynomial in RNS representation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RnsPoly {
    /// One residue vector per modulus.
    limbs: Vec<Vec<u64>>,
    /// Basis primes, parallel to `limbs`.
    moduli: Vec<u64>,
    /// Whether limbs hold NTT (Montgomery) values.
    is_ntt: bool,
}

impl RnsPoly {
    /// Zero polynomial in coefficient form
    pub fn zero(n: usize, moduli: &[u64]) -> Self {
        Self {
            limbs: vec![vec![0; n]; moduli.len()],
            moduli: moduli.to_vec(),
            is_ntt: false,
        }
    }

    /// Polynomial with small signed coefficients, reduced into every limb
    pub fn from_signed(coeffs: &[i64], moduli: &[u64]) -> Self {
        let limbs = moduli
            .iter()
            .map(|&q| coeffs.iter().map(|&c| ModQ::from_signed(c, q)).collect())
            .collect();
        Self {
            limbs,
            moduli: moduli.to_vec(),
            is_ntt: false,
        }
    }

    /// Polynomial with non-negative coefficients, reduced into every limb
    pub fn from_unsigned(coeffs: &[u64], moduli: &[u64]) -> Self {
        let limbs = moduli
            .iter()
            .map(|&q| coeffs.iter().map(|&c| c % q).collect())
            .collect();
        Self {
            limbs,
            moduli: moduli.to_vec(),
            is_ntt: false,
        }
    }

    /// Uniformly random polynomial.
    ///
    /// With `is_ntt` set the limbs are taken as evaluation-domain values,
    /// which is equally uniform and skips a transform.
    pub fn uniform<R: Rng>(n: usize, moduli: &[u64], is_ntt: bool, rng: &mut R) -> Self {
        let limbs = moduli
            .iter()
            .map(|&q| (0..n).map(|_| rng.gen_range(0..q)).collect())
            .collect();
        Self {
            limbs,
            moduli: moduli.to_vec(),
            is_ntt,
        }
    }

    pub fn ring_dim(&self) -> usize {
        self.limbs.first().map_or(0, Vec::len)
    }

    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    pub fn limb_count(&self) -> usize {
        self.moduli.len()
    }

    pub fn limb(&self, i: usize) -> &[u64] {
        &self.limbs[i]
    }

    pub fn is_ntt(&self) -> bool {
        self.is_ntt
    }

    pub fn is_zero(&self) -> bool {
        self.limbs.iter().all(|limb| limb.iter().all(|&c| c == 0))
    }

    /// Convert to NTT domain
    pub fn to_ntt(&mut self, tables: &RnsTables) {
        if !self.is_ntt {
            for (limb, &q) in self.limbs.iter_mut().zip(&self.moduli) {
                tables.table(q).forward(limb);
            }
            self.is_ntt = true;
        }
    }

    /// Convert from NTT domain to coefficient domain
    pub fn from_ntt(&mut self, tables: &RnsTables) {
        if self.is_ntt {
            for (limb, &q) in self.limbs.iter_mut().zip(&self.moduli) {
                tables.table(q).inverse(limb);
            }
            self.is_ntt = false;
        }
    }

    /// Create a copy in NTT domain
    pub fn to_ntt_new(&self, tables: &RnsTables) -> Self {
        let mut result = self.clone();
        result.to_ntt(tables);
        result
    }

    /// Create a copy in coefficient domain
    pub fn from_ntt_new(&self, tables: &RnsTables) -> Self {
        let mut result = self.clone();
        result.from_ntt(tables);
        result
    }

    /// Pointwise product when both operands are already in NTT domain
    pub fn mul_ntt_domain(&self, other: &Self, tables: &RnsTables) -> Self {
        assert!(
            self.is_ntt && other.is_ntt,
            "Both polynomials must be in NTT domain"
        );
        assert_eq!(self.moduli, other.moduli, "Moduli must match");

        let limbs = self
            .limbs
            .iter()
            .zip(&other.limbs)
            .zip(&self.moduli)
            .map(|((a, b), &q)| {
                let mut out = vec![0u64; a.len()];
                tables.table(q).pointwise_mul(a, b, &mut out);
                out
            })
            .collect();

        Self {
            limbs,
            moduli: self.moduli.clone(),
            is_ntt: true,
        }
    }

    /// In-place multiply-accumulate in NTT domain: self += a * b
    pub fn mul_acc_ntt_domain(&mut self, a: &Self, b: &Self, tables: &RnsTables) {
        assert!(
            self.is_ntt && a.is_ntt && b.is_ntt,
            "All polynomials must be in NTT domain"
        );
        assert_eq!(self.moduli, a.moduli, "Moduli must match");
        assert_eq!(self.moduli, b.moduli, "Moduli must match");

        for (i, &q) in self.moduli.iter().enumerate() {
            tables
                .table(q)
                .pointwise_mul_acc(&mut self.limbs[i], &a.limbs[i], &b.limbs[i]);
        }
    }

    /// Negacyclic product of two coefficient-form polynomials (via NTT)
    pub fn mul(&self, other: &Self, tables: &RnsTables) -> Self {
        let a = self.to_ntt_new(tables);
        let b = other.to_ntt_new(tables);
        let mut product = a.mul_ntt_domain(&b, tables);
        product.from_ntt(tables);
        product
    }

    /// Multiply every coefficient by an integer scalar
    pub fn scalar_mul(&self, scalar: u64) -> Self {
        let limbs = self
            .limbs
            .iter()
            .zip(&self.moduli)
            .map(|(limb, &q)| {
                let s = scalar % q;
                limb.iter().map(|&c| ModQ::mul(c, s, q)).collect()
            })
            .collect();

        Self {
            limbs,
            moduli: self.moduli.clone(),
            is_ntt: self.is_ntt,
        }
    }

    /// Add `scalar · values` to limb `limb` only, with `values` already
    /// reduced modulo that limb's prime and in the same domain as `self`.
    ///
    /// Used by key generation to place `P·s'` on a single limb.
    pub fn add_scaled_limb(&mut self, limb: usize, values: &[u64], scalar: u64) {
        let q = self.moduli[limb];
        let s = scalar % q;
        for (c, &v) in self.limbs[limb].iter_mut().zip(values) {
            *c = ModQ::add(*c, ModQ::mul(v, s, q), q);
        }
    }

    /// Galois automorphism X -> X^g (coefficient form, g odd).
    ///
    /// X^i maps to X^(g·i mod 2N), with a sign flip when the exponent
    /// lands in [N, 2N) because X^N = -1.
    pub fn automorphism(&self, g: usize) -> Self {
        assert!(!self.is_ntt, "automorphism requires coefficient form");
        assert!(g % 2 == 1, "Galois element must be odd");

        let n = self.ring_dim();
        let two_n = 2 * n;
        let limbs = self
            .limbs
            .iter()
            .zip(&self.moduli)
            .map(|(limb, &q)| {
                let mut out = vec![0u64; n];
                for (i, &c) in limb.iter().enumerate() {
                    let idx = (g * i) % two_n;
                    if idx < n {
                        out[idx] = c;
                    } else {
                        out[idx - n] = ModQ::negate(c, q);
                    }
                }
                out
            })
            .collect();

        Self {
            limbs,
            moduli: self.moduli.clone(),
            is_ntt: false,
        }
    }

    /// Centered lift of limb `i` into every prime of `target`.
    ///
    /// This is the RNS digit used by hybrid key switching.
    pub fn lift_limb(&self, i: usize, target: &[u64]) -> Self {
        assert!(!self.is_ntt, "digit lift requires coefficient form");
        let q = self.moduli[i];
        let signed: Vec<i64> = self.limbs[i]
            .iter()
            .map(|&c| ModQ::to_signed(c, q))
            .collect();
        Self::from_signed(&signed, target)
    }

    /// Sub-basis view: the limbs for the given primes, in the given order.
    pub fn select(&self, moduli: &[u64]) -> Self {
        let limbs = moduli
            .iter()
            .map(|q| {
                let idx = self
                    .moduli
                    .iter()
                    .position(|m| m == q)
                    .unwrap_or_else(|| panic!("modulus {} not in basis", q));
                self.limbs[idx].clone()
            })
            .collect();

        Self {
            limbs,
            moduli: moduli.to_vec(),
            is_ntt: self.is_ntt,
        }
    }

    /// Divide by the last prime and drop its limb, preserving the message
    /// modulo `t`. All basis moduli must be prime.
    ///
    /// For x over q_0..q_k, the correction δ satisfies δ ≡ x (mod q_k) and
    /// δ ≡ 0 (mod t), with |δ| ≤ t·q_k/2, so (x - δ)/q_k is exact and its
    /// residue mod t equals x·q_k^(-1). With every prime ≡ 1 (mod t) the
    /// message is unchanged; the noise shrinks by q_k and gains at most t/2.
    pub fn drop_last_limb(&self, t: u64) -> Self {
        assert!(!self.is_ntt, "modulus switching requires coefficient form");
        assert!(self.moduli.len() >= 2, "cannot drop the only limb");

        let k = self.moduli.len() - 1;
        let last = self.moduli[k];
        let last_limb = &self.limbs[k];
        let t_inv = ModQ::pow(t % last, last - 2, last);

        // δ / t as a centered value, shared by every remaining limb
        let r: Vec<i64> = last_limb
            .iter()
            .map(|&x| ModQ::to_signed(ModQ::mul(x, t_inv, last), last))
            .collect();

        let limbs = self.limbs[..k]
            .iter()
            .zip(&self.moduli[..k])
            .map(|(limb, &q)| {
                let last_inv = ModQ::pow(last % q, q - 2, q);
                let t_mod = t % q;
                limb.iter()
                    .zip(&r)
                    .map(|(&x, &ri)| {
                        let delta = ModQ::mul(ModQ::from_signed(ri, q), t_mod, q);
                        ModQ::mul(ModQ::sub(x, delta, q), last_inv, q)
                    })
                    .collect()
            })
            .collect();

        Self {
            limbs,
            moduli: self.moduli[..k].to_vec(),
            is_ntt: false,
        }
    }

    /// Polynomial addition (method style)
    pub fn add(&self, other: &Self) -> Self {
        self + other
    }

    /// Polynomial subtraction (method style)
    pub fn sub(&self, other: &Self) -> Self {
        self - other
    }

    /// Negate polynomial (method style)
    pub fn negate(&self) -> Self {
        -self
    }

    fn zip_limbs(&self, rhs: &Self, op: impl Fn(u64, u64, u64) -> u64) -> Self {
        assert_eq!(self.moduli, rhs.moduli, "Moduli must match");
        assert_eq!(self.is_ntt, rhs.is_ntt, "NTT domains must match");

        let limbs = self
            .limbs
            .iter()
            .zip(&rhs.limbs)
            .zip(&self.moduli)
            .map(|((a, b), &q)| a.iter().zip(b).map(|(&x, &y)| op(x, y, q)).collect())
            .collect();

        Self {
            limbs,
            moduli: self.moduli.clone(),
            is_ntt: self.is_ntt,
        }
    }
}

impl Add for &RnsPoly {
    type Output = RnsPoly;

    fn add(self, rhs: Self) -> Self::Output {
        self.zip_limbs(rhs, ModQ::add)
    }
}

impl Add for RnsPoly {
    type Output = RnsPoly;

    fn add(self, rhs: Self) -> Self::Output {
        &self + &rhs
    }
}

impl AddAssign<&RnsPoly> for RnsPoly {
    fn add_assign(&mut self, rhs: &Self) {
        *self = &*self + rhs;
    }
}

impl Sub for &RnsPoly {
    type Output = RnsPoly;

    fn sub(self, rhs: Self) -> Self::Output {
        self.zip_limbs(rhs, ModQ::sub)
    }
}

impl Sub for RnsPoly {
    type Output = RnsPoly;

    fn sub(self, rhs: Self) -> Self::Output {
        &self - &rhs
    }
}

impl SubAssign<&RnsPoly> for RnsPoly {
    fn sub_assign(&mut self, rhs: &Self) {
        *self = &*self - rhs;
    }
}

impl Neg for &RnsPoly {
    type Output = RnsPoly;

    fn neg(self) -> Self::Output {
        let limbs = self
            .limbs
            .iter()
            .zip(&self.moduli)
            .map(|(limb, &q)| limb.iter().map(|&c| ModQ::negate(c, q)).collect())
            .collect();

        RnsPoly {
            limbs,
            moduli: self.moduli.clone(),
            is_ntt: self.is_ntt,
        }
    }
}

impl Neg for RnsPoly {
    type Output = RnsPoly;

    fn neg(self) -> Self::Output {
        -&self
    }
}
