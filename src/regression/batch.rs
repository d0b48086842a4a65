//! Row batching into plaintext blocks.
//!
//! Rows are cut into consecutive blocks of `block_size`. Block `k` of
//! feature `j` holds feature `j` of rows `k·bs .. (k+1)·bs` in slots
//! `0..bs`; the last block is zero-padded. Zero padding contributes
//! nothing to the inner products formed later.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{mismatch_err, Result};
use crate::she::{Plaintext, SheContext};

use super::dataset::Dataset;

/// Plaintext blocks of one dataset (or a slice of it).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchedData {
    /// `features[j][k]`: block `k` of feature `j`
    pub features: Vec<Vec<Plaintext>>,
    /// `labels[k]`: block `k` of the label vector
    pub labels: Vec<Plaintext>,
}

impl BatchedData {
    pub fn dim(&self) -> usize {
        self.features.len()
    }

    pub fn n_blocks(&self) -> usize {
        self.labels.len()
    }

    /// Split into the first `k` blocks and the rest.
    pub fn split_at(&self, k: usize) -> (BatchedData, BatchedData) {
        let k = k.min(self.n_blocks());
        let head = BatchedData {
            features: self.features.iter().map(|f| f[..k].to_vec()).collect(),
            labels: self.labels[..k].to_vec(),
        };
        let tail = BatchedData {
            features: self.features.iter().map(|f| f[k..].to_vec()).collect(),
            labels: self.labels[k..].to_vec(),
        };
        (head, tail)
    }
}

/// Packs dataset columns into plaintext blocks for one context.
#[derive(Clone, Copy, Debug)]
pub struct Batcher {
    block_size: usize,
    ring_dim: usize,
    modulus: u64,
}

impl Batcher {
    pub fn new(ctx: &SheContext) -> Self {
        let params = ctx.params();
        Self {
            block_size: params.block_size,
            ring_dim: params.ring_dim,
            modulus: params.plaintext_modulus,
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of blocks `rows` rows occupy
    pub fn blocks_for(&self, rows: usize) -> usize {
        rows.div_ceil(self.block_size)
    }

    /// Batch every feature column and the label column.
    pub fn batch(&self, dataset: &Dataset) -> Result<BatchedData> {
        if self.block_size > self.ring_dim {
            return Err(mismatch_err!(
                "block size {} exceeds {} slots",
                self.block_size,
                self.ring_dim
            ));
        }

        let features = (0..dataset.dim())
            .into_par_iter()
            .map(|j| self.batch_column(&dataset.column(j)))
            .collect::<Result<Vec<_>>>()?;
        let labels = self.batch_column(dataset.labels())?;

        debug!(
            rows = dataset.rows(),
            dim = dataset.dim(),
            blocks = self.blocks_for(dataset.rows()),
            "batched dataset"
        );
        Ok(BatchedData { features, labels })
    }

    fn batch_column(&self, values: &[i64]) -> Result<Vec<Plaintext>> {
        values
            .chunks(self.block_size)
            .map(|chunk| Plaintext::encode(chunk, self.ring_dim, self.modulus))
            .collect()
    }
}
