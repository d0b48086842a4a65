//! Linear regression on encrypted data.
//!
//! Data flows dataset → [`Batcher`] → [`EncryptedRegressionEngine`] →
//! [`ResultExtractor`], with [`regress_plaintext`] as the integer reference
//! the decrypted output is checked against.

pub mod batch;
pub mod cramer;
pub mod dataset;
pub mod engine;
pub mod export;
pub mod extract;
pub mod reference;

pub use batch::{BatchedData, Batcher};
pub use cramer::{cramer_solve, determinant, RingOps};
pub use dataset::Dataset;
pub use engine::{EncryptedAccumulator, EncryptedRegressionEngine, EngineState, RegressionResult};
pub use export::{append_export, read_exports, ExportPaths};
pub use extract::{DecryptedResult, ResultExtractor};
pub use reference::{normal_equations, regress_plaintext, IntegerRing, ReferenceSolution};
