//! Key material: secret key, public key and key-switching keys.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::math::RnsPoly;

/// Ternary secret key s, stored as signed coefficients so it can be
/// expressed over any basis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretKey {
    coeffs: Vec<i64>,
}

impl SecretKey {
    pub(crate) fn from_coeffs(coeffs: Vec<i64>) -> Self {
        Self { coeffs }
    }

    pub fn ring_dim(&self) -> usize {
        self.coeffs.len()
    }

    /// s over the given basis, coefficient form
    pub fn poly(&self, moduli: &[u64]) -> RnsPoly {
        RnsPoly::from_signed(&self.coeffs, moduli)
    }
}

/// Public encryption key (b, a) with b = -a·s + t·e over the full chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    pub b: RnsPoly,
    pub a: RnsPoly,
}

/// One RNS digit of a key-switching key, NTT form over chain + special prime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySwitchRow {
    pub b: RnsPoly,
    pub a: RnsPoly,
}

/// Hybrid key-switching key from s' to s: row i satisfies
/// b_i + a_i·s = t·e_i + P·s' on limb q_i (and t·e_i elsewhere).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySwitchKey {
    pub rows: Vec<KeySwitchRow>,
}

/// Relinearization key (s² -> s) and Galois keys (σ_g(s) -> s).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationKeys {
    pub relin: KeySwitchKey,
    pub galois: BTreeMap<usize, KeySwitchKey>,
}

/// Everything a compute party needs: encryption and evaluation keys.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeySet {
    pub encryption: PublicKey,
    pub evaluation: EvaluationKeys,
}
