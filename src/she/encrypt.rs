//! Public-key encryption and secret-key decryption

use crate::error::{mismatch_err, Result};
use crate::math::{ModQ, RnsPoly, Sampler};

use super::ciphertext::Ciphertext;
use super::context::SheContext;
use super::keys::{PublicKey, SecretKey};
use super::plaintext::Plaintext;

/// Encrypts plaintexts under a public key at the top level of the chain.
pub struct Encryptor<'a> {
    ctx: &'a SheContext,
    pk: &'a PublicKey,
}

impl<'a> Encryptor<'a> {
    pub fn new(ctx: &'a SheContext, pk: &'a PublicKey) -> Self {
        Self { ctx, pk }
    }

    /// b = pk_b·u + t·e0 + m, a = pk_a·u + t·e1
    pub fn encrypt(&self, pt: &Plaintext, sampler: &mut Sampler) -> Result<Ciphertext> {
        let n = self.ctx.ring_dim();
        let t = self.ctx.plaintext_modulus();
        if pt.ring_dim() != n || pt.modulus() != t {
            return Err(mismatch_err!(
                "plaintext over Z_{}[X]/(X^{} + 1) does not match context",
                pt.modulus(),
                pt.ring_dim()
            ));
        }

        let tables = self.ctx.tables();
        let moduli = self.ctx.moduli_at(self.ctx.max_level());

        let u = RnsPoly::from_signed(&sampler.ternary_vec(n), moduli).to_ntt_new(tables);
        let e0 = RnsPoly::from_signed(&sampler.gaussian_vec(n), moduli).scalar_mul(t);
        let e1 = RnsPoly::from_signed(&sampler.gaussian_vec(n), moduli).scalar_mul(t);
        let m = RnsPoly::from_unsigned(pt.decode_slots(), moduli);

        let mut b = self.pk.b.to_ntt_new(tables).mul_ntt_domain(&u, tables);
        let mut a = self.pk.a.to_ntt_new(tables).mul_ntt_domain(&u, tables);
        b.from_ntt(tables);
        a.from_ntt(tables);

        Ok(Ciphertext::from_parts(&(&b + &e0) + &m, &a + &e1, 1))
    }
}

/// Decrypts ciphertexts with the secret key.
pub struct Decryptor<'a> {
    ctx: &'a SheContext,
    sk: &'a SecretKey,
}

impl<'a> Decryptor<'a> {
    pub fn new(ctx: &'a SheContext, sk: &'a SecretKey) -> Self {
        Self { ctx, sk }
    }

    /// Centered residues of b + a·s mod q_0 after switching to level 0.
    fn phase(&self, ct: &Ciphertext) -> Vec<i64> {
        let t = self.ctx.plaintext_modulus();
        let mut ct = ct.clone();
        while ct.level() > 0 {
            ct = ct.drop_last_prime(t);
        }
        let q0 = ct.moduli()[0];
        let s = self.sk.poly(ct.moduli());
        let v = &ct.b + &ct.a.mul(&s, self.ctx.tables());
        v.limb(0).iter().map(|&c| ModQ::to_signed(c, q0)).collect()
    }

    /// Recover the plaintext, removing the ciphertext's correction factor.
    ///
    /// If the noise outgrew q_0 the result is wrong; this is not detectable
    /// here.
    pub fn decrypt(&self, ct: &Ciphertext) -> Result<Plaintext> {
        let t = self.ctx.plaintext_modulus();
        let inv = ModQ::inv(ct.correction % t, t)
            .ok_or_else(|| mismatch_err!("correction {} not invertible mod {}", ct.correction, t))?;
        let slots = self
            .phase(ct)
            .into_iter()
            .map(|v| ModQ::mul(ModQ::from_signed(v, t), inv, t))
            .collect();
        Ok(Plaintext::from_slots(slots, t))
    }

    /// log2 of the largest centered coefficient of the decryption phase,
    /// against log2(q_0 / 2) as the failure point. Diagnostic only.
    pub fn noise_bits(&self, ct: &Ciphertext) -> f64 {
        let max = self
            .phase(ct)
            .into_iter()
            .map(|v| v.unsigned_abs())
            .max()
            .unwrap_or(0);
        ((max.max(1)) as f64).log2()
    }
}
