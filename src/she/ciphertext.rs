//! BGV ciphertexts over the RNS chain.

use serde::{Deserialize, Serialize};

use crate::math::RnsPoly;

/// Ciphertext (b, a) with b + a·s = m·c + t·e over the current chain prefix,
/// where `c` is the plaintext correction factor.
///
/// The level (number of chain primes minus one) is the remaining
/// multiplicative depth: each multiplication ends with a rescale that drops
/// one prime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    pub b: RnsPoly,
    pub a: RnsPoly,
    /// Factor c (mod t) multiplying the encrypted message
    pub correction: u64,
}

impl Ciphertext {
    pub fn from_parts(b: RnsPoly, a: RnsPoly, correction: u64) -> Self {
        Self { b, a, correction }
    }

    /// Remaining depth budget
    pub fn level(&self) -> usize {
        self.b.limb_count() - 1
    }

    pub fn moduli(&self) -> &[u64] {
        self.b.moduli()
    }

    pub fn ring_dim(&self) -> usize {
        self.b.ring_dim()
    }

    /// Drop the last chain prime from both components (modulus switching).
    pub(crate) fn drop_last_prime(&self, t: u64) -> Self {
        Self {
            b: self.b.drop_last_limb(t),
            a: self.a.drop_last_limb(t),
            correction: self.correction,
        }
    }
}
