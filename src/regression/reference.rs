//! Exact integer regression used to check encrypted results.
//!
//! Forms `G = XᵀX` and `b = Xᵀy` over the integers and applies the same
//! Cramer evaluation as the encrypted path, so `θ mod p` and `det mod p`
//! are directly comparable with decrypted outputs.

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

use crate::error::Result;

use super::cramer::{cramer_solve, RingOps};
use super::dataset::Dataset;

/// The integers, with arbitrary precision.
#[derive(Clone, Copy, Debug, Default)]
pub struct IntegerRing;

impl RingOps for IntegerRing {
    type Elem = BigInt;

    fn add(&self, a: &BigInt, b: &BigInt) -> Result<BigInt> {
        Ok(a + b)
    }

    fn sub(&self, a: &BigInt, b: &BigInt) -> Result<BigInt> {
        Ok(a - b)
    }

    fn mul(&self, a: &BigInt, b: &BigInt) -> Result<BigInt> {
        Ok(a * b)
    }
}

/// Unscaled solution `θ'` and determinant, over the integers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceSolution {
    pub theta: Vec<BigInt>,
    pub det: BigInt,
}

impl ReferenceSolution {
    pub fn is_singular(&self) -> bool {
        self.det.is_zero()
    }

    pub fn det_mod(&self, p: u64) -> u64 {
        reduce(&self.det, p)
    }

    pub fn theta_mod(&self, p: u64) -> Vec<u64> {
        self.theta.iter().map(|t| reduce(t, p)).collect()
    }

    /// The rational solution `θ'_i / det`, when `det ≠ 0`.
    pub fn solution(&self) -> Option<Vec<f64>> {
        let det = self.det.to_f64().filter(|d| *d != 0.0)?;
        self.theta
            .iter()
            .map(|t| t.to_f64().map(|t| t / det))
            .collect()
    }
}

fn reduce(v: &BigInt, p: u64) -> u64 {
    let p = BigInt::from(p);
    let r = ((v % &p) + &p) % &p;
    r.to_u64().unwrap_or(0)
}

/// Gram matrix `XᵀX` and moment vector `Xᵀy`
pub fn normal_equations(dataset: &Dataset) -> (Vec<Vec<BigInt>>, Vec<BigInt>) {
    let dim = dataset.dim();
    let columns: Vec<Vec<i64>> = (0..dim).map(|j| dataset.column(j)).collect();
    let dot = |x: &[i64], y: &[i64]| -> BigInt {
        x.iter()
            .zip(y)
            .map(|(&a, &b)| BigInt::from(a) * BigInt::from(b))
            .sum()
    };

    let gram = (0..dim)
        .map(|i| (0..dim).map(|j| dot(&columns[i], &columns[j])).collect())
        .collect();
    let rhs = columns.iter().map(|c| dot(c, dataset.labels())).collect();
    (gram, rhs)
}

/// Plaintext regression over the integers.
pub fn regress_plaintext(dataset: &Dataset) -> Result<ReferenceSolution> {
    let (gram, rhs) = normal_equations(dataset);
    let (theta, det) = cramer_solve(&IntegerRing, &gram, &rhs)?;
    Ok(ReferenceSolution { theta, det })
}
