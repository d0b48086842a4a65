//! Encrypted regression engine.
//!
//! Accumulates encrypted data blocks, then evaluates the normal equations
//! and Cramer's rule homomorphically. The engine holds public keys only.
//!
//! ```text
//! KeysGenerated --add_data--> DataAccumulating --regress--> Regressed
//!                                  ^    |                       |
//!                                  +----+ add_data          extract
//!                                                               v
//!                                                        ResultAvailable
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{mismatch_err, RegressionError, Result};
use crate::math::Sampler;
use crate::she::{Ciphertext, Encryptor, Evaluator, Plaintext, PublicKeySet, SheContext};

use super::batch::BatchedData;
use super::cramer::cramer_solve;
use super::extract::{DecryptedResult, ResultExtractor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    KeysGenerated,
    DataAccumulating,
    Regressed,
    ResultAvailable,
}

/// Encrypted blocks received so far.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncryptedAccumulator {
    /// `features[j][k]`: block `k` of feature `j`
    pub features: Vec<Vec<Ciphertext>>,
    pub labels: Vec<Ciphertext>,
}

impl EncryptedAccumulator {
    fn with_dim(dim: usize) -> Self {
        Self {
            features: vec![Vec::new(); dim],
            labels: Vec::new(),
        }
    }

    pub fn dim(&self) -> usize {
        self.features.len()
    }

    pub fn n_blocks(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Encrypted `θ'` and `det G`, all at slot 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionResult {
    pub theta: Vec<Ciphertext>,
    pub det: Ciphertext,
}

pub struct EncryptedRegressionEngine<'a> {
    ctx: &'a SheContext,
    keys: PublicKeySet,
    sampler: Sampler,
    strict_depth: bool,
    state: EngineState,
    data: EncryptedAccumulator,
    result: Option<RegressionResult>,
}

impl<'a> EncryptedRegressionEngine<'a> {
    /// Engine for `dim` features under `keys`.
    pub fn new(ctx: &'a SheContext, keys: PublicKeySet, dim: usize, sampler: Sampler) -> Self {
        Self {
            ctx,
            keys,
            sampler,
            strict_depth: false,
            state: EngineState::KeysGenerated,
            data: EncryptedAccumulator::with_dim(dim),
            result: None,
        }
    }

    pub fn with_strict_depth(mut self, strict: bool) -> Self {
        self.strict_depth = strict;
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn context(&self) -> &'a SheContext {
        self.ctx
    }

    pub fn public_keys(&self) -> &PublicKeySet {
        &self.keys
    }

    /// Encrypted blocks accumulated so far
    pub fn data(&self) -> &EncryptedAccumulator {
        &self.data
    }

    pub fn result(&self) -> Option<&RegressionResult> {
        self.result.as_ref()
    }

    /// Encrypt and append blocks; `features[j][k]` pairs with `labels[k]`.
    pub fn add_data(&mut self, features: &[Vec<Plaintext>], labels: &[Plaintext]) -> Result<()> {
        if matches!(
            self.state,
            EngineState::Regressed | EngineState::ResultAvailable
        ) {
            return Err(RegressionError::InvalidState(
                "add_data after regression".into(),
            ));
        }
        if features.len() != self.data.dim() {
            return Err(mismatch_err!(
                "{} feature columns, engine expects {}",
                features.len(),
                self.data.dim()
            ));
        }
        if labels.is_empty() {
            return Err(mismatch_err!("add_data called with no blocks"));
        }
        if let Some(j) = features.iter().position(|f| f.len() != labels.len()) {
            return Err(mismatch_err!(
                "feature {} has {} blocks, labels have {}",
                j,
                features[j].len(),
                labels.len()
            ));
        }

        let encryptor = Encryptor::new(self.ctx, &self.keys.encryption);
        for (column, blocks) in self.data.features.iter_mut().zip(features) {
            for pt in blocks {
                column.push(encryptor.encrypt(pt, &mut self.sampler)?);
            }
        }
        for pt in labels {
            self.data.labels.push(encryptor.encrypt(pt, &mut self.sampler)?);
        }

        self.state = EngineState::DataAccumulating;
        debug!(blocks = self.data.n_blocks(), "accumulated encrypted blocks");
        Ok(())
    }

    /// `add_data` for a whole batch.
    pub fn add_batch(&mut self, batch: &BatchedData) -> Result<()> {
        self.add_data(&batch.features, &batch.labels)
    }

    /// Evaluate `θ'` and `det G` on the accumulated data.
    pub fn regress(&mut self) -> Result<&RegressionResult> {
        match self.state {
            EngineState::DataAccumulating => {}
            EngineState::KeysGenerated => {
                return Err(RegressionError::InvalidState(
                    "regress called before any data was added".into(),
                ));
            }
            EngineState::Regressed | EngineState::ResultAvailable => {
                return Err(RegressionError::InvalidState(
                    "regression already evaluated".into(),
                ));
            }
        }

        let eval =
            Evaluator::new(self.ctx, &self.keys.evaluation).with_strict_depth(self.strict_depth);
        let dim = self.data.dim();
        let data = &self.data;

        let reflected = data
            .features
            .par_iter()
            .map(|blocks| blocks.iter().map(|ct| eval.reflect(ct)).collect::<Result<Vec<_>>>())
            .collect::<Result<Vec<Vec<_>>>>()?;

        let pairs: Vec<(usize, usize)> = (0..dim)
            .flat_map(|i| (i..dim).map(move |j| (i, j)))
            .collect();
        let entries = pairs
            .par_iter()
            .map(|&(i, j)| inner_product(&eval, &data.features[i], &reflected[j]))
            .collect::<Result<Vec<_>>>()?;
        let rhs = reflected
            .par_iter()
            .map(|col| inner_product(&eval, &data.labels, col))
            .collect::<Result<Vec<_>>>()?;

        let mut gram: Vec<Vec<Option<Ciphertext>>> = vec![vec![None; dim]; dim];
        for (&(i, j), ct) in pairs.iter().zip(entries) {
            gram[j][i] = Some(ct.clone());
            gram[i][j] = Some(ct);
        }
        let gram = gram
            .into_iter()
            .map(|row| row.into_iter().flatten().collect::<Vec<_>>())
            .collect::<Vec<_>>();
        debug!(entries = pairs.len(), "normal equations formed");

        let (theta, det) = cramer_solve(&eval, &gram, &rhs)?;
        info!(
            dim,
            blocks = data.n_blocks(),
            level = det.level(),
            "encrypted regression evaluated"
        );

        self.state = EngineState::Regressed;
        Ok(&*self.result.insert(RegressionResult { theta, det }))
    }

    /// Decrypt the stored result and mark it available.
    pub fn extract(&mut self, extractor: &ResultExtractor<'_>) -> Result<DecryptedResult> {
        let result = self.result.as_ref().ok_or_else(|| {
            RegressionError::InvalidState("no regression result to extract".into())
        })?;
        let decrypted = extractor.extract(result)?;
        self.state = EngineState::ResultAvailable;
        Ok(decrypted)
    }
}

/// Σ_k xs[k]·ys[k] traced to slot 0, where `ys` are already reflected.
fn inner_product(eval: &Evaluator<'_>, xs: &[Ciphertext], ys: &[Ciphertext]) -> Result<Ciphertext> {
    let products = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| eval.multiply_relin(x, y))
        .collect::<Result<Vec<_>>>()?;
    let traced = eval.trace(&eval.sum(&products)?)?;
    eval.rescale(&traced)
}
