//! Arithmetic primitives for the SHE layer.
//!
//! - **Modular arithmetic** over word-sized primes
//! - **Prime generation** for NTT-friendly RNS chains
//! - **Number-Theoretic Transform (NTT)** with Montgomery reduction
//! - **RNS polynomials** over R_Q = Z_Q[X]/(X^N + 1)
//! - **Sampling** of Gaussian errors, ternary secrets and uniform elements
//!
//! # Example
//!
//! ```
//! use encrypted_regression::math::{ntt_primes, NttTable, RnsPoly, RnsTables};
//!
//! let n = 64;
//! let moduli = ntt_primes(40, 2 * n as u64, 2, &[]);
//! let tables = RnsTables::new(
//!     n,
//!     moduli.iter().map(|&q| NttTable::new(n, q).unwrap()).collect(),
//! );
//! let mut x = vec![0i64; n];
//! x[1] = 1;
//! let x = RnsPoly::from_signed(&x, &moduli);
//! let x_squared = x.mul(&x, &tables);
//! assert!(!x_squared.is_zero());
//! ```

pub mod modular;
pub mod ntt;
pub mod poly;
pub mod primes;
pub mod sampler;

pub use modular::ModQ;
pub use ntt::NttTable;
pub use poly::{RnsPoly, RnsTables};
pub use primes::{bit_length, is_prime, is_primitive_root, ntt_primes};
pub use sampler::{Sampler, DEFAULT_SIGMA};
