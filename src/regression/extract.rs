//! Decryption of regression outputs.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::she::{Ciphertext, Decryptor, SecretKey, SheContext};

use super::engine::RegressionResult;
use super::reference::ReferenceSolution;

/// Decrypted `θ'` and determinant, as residues mod p.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptedResult {
    pub theta: Vec<u64>,
    pub det: u64,
}

impl DecryptedResult {
    /// Whether this agrees with an integer reference modulo `p`.
    pub fn matches(&self, reference: &ReferenceSolution, p: u64) -> bool {
        self.det == reference.det_mod(p) && self.theta == reference.theta_mod(p)
    }
}

/// Decrypts ciphertexts produced by the regression engine.
pub struct ResultExtractor<'a> {
    decryptor: Decryptor<'a>,
}

impl<'a> ResultExtractor<'a> {
    pub fn new(ctx: &'a SheContext, sk: &'a SecretKey) -> Self {
        Self {
            decryptor: Decryptor::new(ctx, sk),
        }
    }

    /// All plaintext slots of `ct`
    pub fn decode_slots(&self, ct: &Ciphertext) -> Result<Vec<u64>> {
        Ok(self.decryptor.decrypt(ct)?.decode_slots().to_vec())
    }

    /// Slot 0 of `ct`, where every scalar regression output lives
    pub fn extract_scalar(&self, ct: &Ciphertext) -> Result<u64> {
        Ok(self.decryptor.decrypt(ct)?.slot(0))
    }

    pub fn extract(&self, result: &RegressionResult) -> Result<DecryptedResult> {
        let theta = result
            .theta
            .iter()
            .map(|ct| self.extract_scalar(ct))
            .collect::<Result<Vec<_>>>()?;
        let det = self.extract_scalar(&result.det)?;
        Ok(DecryptedResult { theta, det })
    }

    /// log2 of the largest noise coefficient in `ct`
    pub fn noise_bits(&self, ct: &Ciphertext) -> f64 {
        self.decryptor.noise_bits(ct)
    }
}
