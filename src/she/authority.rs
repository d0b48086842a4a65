//! Key authority: the only holder of the secret key.
//!
//! The compute side receives a `PublicKeySet`; decryption goes through a
//! `Decryptor` borrowed from the authority, so the secret key never has to
//! be handed to the engine.

use std::collections::BTreeMap;

use tracing::debug;

use crate::math::{RnsPoly, Sampler};

use super::context::SheContext;
use super::encrypt::Decryptor;
use super::keys::{EvaluationKeys, PublicKey, PublicKeySet, SecretKey};
use super::keyswitch::generate_switch_key;

/// Generates and holds a key pair bound to one context.
pub struct KeyAuthority {
    secret: SecretKey,
    public: PublicKeySet,
}

impl KeyAuthority {
    /// Sample a ternary secret and derive the public, relinearization and
    /// Galois keys needed by the regression circuit.
    pub fn generate(ctx: &SheContext, sampler: &mut Sampler) -> Self {
        let n = ctx.ring_dim();
        let t = ctx.plaintext_modulus();
        let tables = ctx.tables();

        let secret = SecretKey::from_coeffs(sampler.ternary_vec(n));

        let chain = ctx.moduli_at(ctx.max_level());
        let s = secret.poly(chain).to_ntt_new(tables);
        let a = RnsPoly::uniform(n, chain, true, sampler.rng());
        let e = RnsPoly::from_signed(&sampler.gaussian_vec(n), chain)
            .scalar_mul(t)
            .to_ntt_new(tables);
        let mut b = &e - &a.mul_ntt_domain(&s, tables);
        b.from_ntt(tables);
        let encryption = PublicKey {
            b,
            a: a.from_ntt_new(tables),
        };

        let basis = ctx.key_basis();
        let s_full = secret.poly(&basis);
        let relin = generate_switch_key(ctx, &secret, &s_full.mul(&s_full, tables), sampler);

        let mut galois = BTreeMap::new();
        let elements = ctx
            .trace_elements()
            .into_iter()
            .chain(std::iter::once(ctx.reflection_element()));
        for g in elements {
            let key = generate_switch_key(ctx, &secret, &s_full.automorphism(g), sampler);
            galois.insert(g, key);
        }
        debug!(galois_keys = galois.len(), "generated evaluation keys");

        Self {
            secret,
            public: PublicKeySet {
                encryption,
                evaluation: EvaluationKeys { relin, galois },
            },
        }
    }

    pub fn public_keys(&self) -> &PublicKeySet {
        &self.public
    }

    /// Secret key access, for export by the decrypting party only.
    pub fn secret_key(&self) -> &SecretKey {
        &self.secret
    }

    pub fn decryptor<'a>(&'a self, ctx: &'a SheContext) -> Decryptor<'a> {
        Decryptor::new(ctx, &self.secret)
    }
}
