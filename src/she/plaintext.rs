//! Plaintext elements with coefficient slots.
//!
//! Slot `k` is the coefficient of X^k of a polynomial in Z_p[X]/(X^N + 1).
//! Slot-wise addition is polynomial addition; the inner product of two slot
//! vectors appears as the constant coefficient of a(X)·b(X^(-1)).

use serde::{Deserialize, Serialize};

use crate::error::{mismatch_err, Result};
use crate::math::ModQ;

/// Element of the plaintext ring Z_p[X]/(X^N + 1).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plaintext {
    slots: Vec<u64>,
    modulus: u64,
}

impl Plaintext {
    pub fn zero(ring_dim: usize, modulus: u64) -> Self {
        Self {
            slots: vec![0; ring_dim],
            modulus,
        }
    }

    /// Place `values` in slots 0.., reducing each modulo p; remaining
    /// slots are zero.
    pub fn encode(values: &[i64], ring_dim: usize, modulus: u64) -> Result<Self> {
        if values.len() > ring_dim {
            return Err(mismatch_err!(
                "{} values exceed {} slots",
                values.len(),
                ring_dim
            ));
        }
        let mut slots = vec![0u64; ring_dim];
        for (slot, &v) in slots.iter_mut().zip(values) {
            *slot = ModQ::from_signed(v, modulus);
        }
        Ok(Self { slots, modulus })
    }

    pub(crate) fn from_slots(slots: Vec<u64>, modulus: u64) -> Self {
        Self { slots, modulus }
    }

    /// All slot values in [0, p)
    pub fn decode_slots(&self) -> &[u64] {
        &self.slots
    }

    pub fn slot(&self, i: usize) -> u64 {
        self.slots[i]
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    pub fn ring_dim(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_reduces_and_pads() {
        let pt = Plaintext::encode(&[5, -1, 8191 + 3], 8, 8191).unwrap();
        assert_eq!(pt.decode_slots(), &[5, 8190, 3, 0, 0, 0, 0, 0]);
        assert_eq!(pt.slot(1), 8190);
    }

    #[test]
    fn test_encode_rejects_overflow() {
        assert!(Plaintext::encode(&[1; 9], 8, 257).is_err());
    }
}
