//! Somewhat-homomorphic encryption (BGV over an RNS chain).
//!
//! Plaintexts live in Z_p[X]/(X^N + 1) with data in coefficient slots;
//! ciphertexts satisfy b + a·s = c·m + p·e modulo the current chain prefix.
//! Every chain prime (and the special key-switching prime) is ≡ 1 mod 2N·p,
//! so modulus switching leaves messages unchanged.
//!
//! Key components:
//! - [`SheContext`]: parameters, chain and NTT tables, passed explicitly
//! - [`KeyAuthority`]: key generation; sole owner of the secret key
//! - [`Encryptor`] / [`Decryptor`]
//! - [`Evaluator`]: add, multiply, rescale, automorphisms, trace

pub mod authority;
pub mod ciphertext;
pub mod context;
pub mod encrypt;
pub mod evaluator;
pub mod keys;
pub mod keyswitch;
pub mod plaintext;

pub use authority::KeyAuthority;
pub use ciphertext::Ciphertext;
pub use context::SheContext;
pub use encrypt::{Decryptor, Encryptor};
pub use evaluator::Evaluator;
pub use keys::{EvaluationKeys, KeySwitchKey, KeySwitchRow, PublicKey, PublicKeySet, SecretKey};
pub use keyswitch::{generate_switch_key, key_switch};
pub use plaintext::Plaintext;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegressionError;
    use crate::math::{Sampler, DEFAULT_SIGMA};
    use crate::params::{select_parameters, NoiseModel, SecurityLevel};

    fn setup(dim: usize) -> (SheContext, KeyAuthority, Sampler) {
        let sel = select_parameters(257, 3, 10, dim, &NoiseModel::default(), SecurityLevel::Toy)
            .unwrap();
        let ctx = SheContext::new(&sel.params).unwrap();
        let mut sampler = Sampler::with_seed(DEFAULT_SIGMA, 5);
        let authority = KeyAuthority::generate(&ctx, &mut sampler);
        (ctx, authority, sampler)
    }

    fn encrypt(ctx: &SheContext, auth: &KeyAuthority, s: &mut Sampler, v: &[i64]) -> Ciphertext {
        let pt = Plaintext::encode(v, ctx.ring_dim(), ctx.plaintext_modulus()).unwrap();
        Encryptor::new(ctx, &auth.public_keys().encryption)
            .encrypt(&pt, s)
            .unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let (ctx, auth, mut sampler) = setup(2);
        let values: Vec<i64> = (0..ctx.ring_dim() as i64).map(|i| (i * 37) % 257).collect();
        let ct = encrypt(&ctx, &auth, &mut sampler, &values);
        assert_eq!(ct.level(), ctx.max_level());

        let pt = auth.decryptor(&ctx).decrypt(&ct).unwrap();
        let expected: Vec<u64> = values.iter().map(|&v| v as u64).collect();
        assert_eq!(pt.decode_slots(), expected.as_slice());
    }

    #[test]
    fn test_add_and_multiply_constants() {
        let (ctx, auth, mut sampler) = setup(2);
        let eval = Evaluator::new(&ctx, &auth.public_keys().evaluation).with_strict_depth(true);
        let x = encrypt(&ctx, &auth, &mut sampler, &[12]);
        let y = encrypt(&ctx, &auth, &mut sampler, &[30]);

        let sum = eval.add(&x, &y).unwrap();
        let product = eval.multiply(&x, &y).unwrap();
        assert_eq!(product.level(), ctx.max_level() - 1);

        let dec = auth.decryptor(&ctx);
        assert_eq!(dec.decrypt(&sum).unwrap().slot(0), 42);
        assert_eq!(dec.decrypt(&product).unwrap().slot(0), 360 % 257);
    }

    #[test]
    fn test_trace_isolates_constant_term() {
        let (ctx, auth, mut sampler) = setup(2);
        let eval = Evaluator::new(&ctx, &auth.public_keys().evaluation);
        let ct = encrypt(&ctx, &auth, &mut sampler, &[9, 4, 200, 7]);

        let traced = eval.trace(&ct).unwrap();
        assert_eq!(traced.correction, ctx.ring_dim() as u64 % 257);

        let pt = auth.decryptor(&ctx).decrypt(&traced).unwrap();
        assert_eq!(pt.slot(0), 9);
        assert!(pt.decode_slots()[1..].iter().all(|&c| c == 0));
    }

    #[test]
    fn test_reflected_product_is_inner_product() {
        let (ctx, auth, mut sampler) = setup(2);
        let eval = Evaluator::new(&ctx, &auth.public_keys().evaluation);
        let x = encrypt(&ctx, &auth, &mut sampler, &[3, 1, 4, 1, 5]);
        let y = encrypt(&ctx, &auth, &mut sampler, &[2, 7, 1, 8, 2]);

        let product = eval.multiply_relin(&x, &eval.reflect(&y).unwrap()).unwrap();
        let inner = eval.rescale(&eval.trace(&product).unwrap()).unwrap();

        let pt = auth.decryptor(&ctx).decrypt(&inner).unwrap();
        assert_eq!(pt.slot(0), 6 + 7 + 4 + 8 + 10);
        assert!(pt.decode_slots()[1..].iter().all(|&c| c == 0));
    }

    #[test]
    fn test_mismatched_corrections_still_add() {
        let (ctx, auth, mut sampler) = setup(2);
        let eval = Evaluator::new(&ctx, &auth.public_keys().evaluation);
        let x = encrypt(&ctx, &auth, &mut sampler, &[100]);
        let y = encrypt(&ctx, &auth, &mut sampler, &[50]);
        let traced = eval.trace(&x).unwrap();

        let sum = eval.add(&traced, &y).unwrap();
        assert_eq!(auth.decryptor(&ctx).decrypt(&sum).unwrap().slot(0), 150);
    }

    #[test]
    fn test_strict_depth_exhaustion() {
        let (ctx, auth, mut sampler) = setup(1);
        let strict = Evaluator::new(&ctx, &auth.public_keys().evaluation).with_strict_depth(true);
        let x = encrypt(&ctx, &auth, &mut sampler, &[2]);

        let once = strict.multiply(&x, &x).unwrap();
        assert_eq!(once.level(), 0);
        match strict.multiply(&once, &x) {
            Err(RegressionError::DepthBudgetExhausted(_)) => {}
            other => panic!("expected depth exhaustion, got {:?}", other.map(|c| c.level())),
        }

        let lenient = Evaluator::new(&ctx, &auth.public_keys().evaluation);
        let twice = lenient.multiply(&once, &x).unwrap();
        assert_eq!(twice.level(), 0);
    }

    #[test]
    fn test_missing_galois_key() {
        let (ctx, auth, mut sampler) = setup(1);
        let x = encrypt(&ctx, &auth, &mut sampler, &[1]);
        let mut keys = auth.public_keys().evaluation.clone();
        keys.galois.clear();
        let eval = Evaluator::new(&ctx, &keys);
        assert!(matches!(
            eval.reflect(&x),
            Err(RegressionError::MissingKey(_))
        ));
    }
}
