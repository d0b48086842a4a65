//! Privacy-preserving linear regression over encrypted data
//!
//! A data holder encrypts a feature matrix and label vector under a
//! somewhat-homomorphic scheme; an untrusted party computes the
//! least-squares normal equations and solves them by Cramer's rule without
//! seeing any plaintext. The key holder decrypts `θ' = det(G)·θ` and
//! `det(G)` modulo the plaintext prime `p`.
//!
//! Key components:
//! - [`params`]: block size and modulus-chain selection from dataset shape
//! - [`she`]: BGV-style encryption with coefficient packing and key switching
//! - [`regression`]: batching, the encrypted engine, and the integer reference
//!
//! # Example
//!
//! ```no_run
//! use encrypted_regression::{
//!     select_parameters, Batcher, Dataset, EncryptedRegressionEngine, KeyAuthority,
//!     NoiseModel, ResultExtractor, Sampler, SecurityLevel, SheContext,
//! };
//!
//! let dataset = Dataset::load("data.txt")?;
//! let selection = select_parameters(
//!     8191, 17, dataset.rows(), dataset.dim(),
//!     &NoiseModel::default(), SecurityLevel::Bits128,
//! )?;
//! let ctx = SheContext::new(&selection.params)?;
//! let mut sampler = Sampler::new(selection.params.sigma);
//! let authority = KeyAuthority::generate(&ctx, &mut sampler);
//!
//! let mut engine = EncryptedRegressionEngine::new(
//!     &ctx, authority.public_keys().clone(), dataset.dim(), sampler,
//! );
//! engine.add_batch(&Batcher::new(&ctx).batch(&dataset)?)?;
//! engine.regress()?;
//! let result = engine.extract(&ResultExtractor::new(&ctx, authority.secret_key()))?;
//! println!("theta' = {:?}, det = {}", result.theta, result.det);
//! # Ok::<(), encrypted_regression::RegressionError>(())
//! ```

pub mod error;
pub mod math;
pub mod params;
pub mod regression;
pub mod she;

pub use error::{RegressionError, Result};
pub use math::Sampler;
pub use params::{
    select_parameters, EncryptionParameters, NoiseModel, ParameterSelection, SecurityLevel,
};
pub use regression::{
    regress_plaintext, BatchedData, Batcher, Dataset, DecryptedResult, EncryptedRegressionEngine,
    EngineState, ReferenceSolution, RegressionResult, ResultExtractor,
};
pub use she::{Ciphertext, KeyAuthority, Plaintext, PublicKeySet, SecretKey, SheContext};
