//! Homomorphic operations on ciphertexts.
//!
//! The ciphertext level doubles as the depth budget: multiplication is
//! followed by a rescale that consumes one chain prime. In strict mode a
//! multiplication or rescale at level 0 fails with `DepthBudgetExhausted`;
//! otherwise it proceeds and the result may silently decrypt to garbage.

use tracing::debug;

use crate::error::{mismatch_err, RegressionError, Result};
use crate::math::ModQ;

use super::ciphertext::Ciphertext;
use super::context::SheContext;
use super::keys::EvaluationKeys;
use super::keyswitch::key_switch;

/// Evaluates additions, multiplications and automorphisms with public
/// evaluation keys.
#[derive(Clone, Copy)]
pub struct Evaluator<'a> {
    ctx: &'a SheContext,
    keys: &'a EvaluationKeys,
    strict_depth: bool,
}

impl<'a> Evaluator<'a> {
    pub fn new(ctx: &'a SheContext, keys: &'a EvaluationKeys) -> Self {
        Self {
            ctx,
            keys,
            strict_depth: false,
        }
    }

    /// Fail loudly instead of continuing once the depth budget is spent.
    pub fn with_strict_depth(mut self, strict: bool) -> Self {
        self.strict_depth = strict;
        self
    }

    pub fn context(&self) -> &'a SheContext {
        self.ctx
    }

    /// Switch down to `level` without changing the message.
    pub fn mod_switch_to(&self, ct: &Ciphertext, level: usize) -> Result<Ciphertext> {
        if level > ct.level() {
            return Err(mismatch_err!(
                "cannot switch level {} up to {}",
                ct.level(),
                level
            ));
        }
        let t = self.ctx.plaintext_modulus();
        let mut out = ct.clone();
        while out.level() > level {
            out = out.drop_last_prime(t);
        }
        Ok(out)
    }

    /// Bring both operands to the lower level and to `a`'s correction.
    fn align(&self, a: &Ciphertext, b: &Ciphertext) -> Result<(Ciphertext, Ciphertext)> {
        if a.ring_dim() != b.ring_dim() {
            return Err(mismatch_err!(
                "ring dimensions {} and {} differ",
                a.ring_dim(),
                b.ring_dim()
            ));
        }
        let level = a.level().min(b.level());
        let a = self.mod_switch_to(a, level)?;
        let mut b = self.mod_switch_to(b, level)?;

        if a.correction != b.correction {
            let t = self.ctx.plaintext_modulus();
            let inv = ModQ::inv(b.correction, t)
                .ok_or_else(|| mismatch_err!("correction {} not invertible", b.correction))?;
            b = self.mul_scalar(&b, ModQ::mul(a.correction, inv, t));
            b.correction = a.correction;
        }
        Ok((a, b))
    }

    pub fn add(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext> {
        let (a, b) = self.align(a, b)?;
        Ok(Ciphertext::from_parts(&a.b + &b.b, &a.a + &b.a, a.correction))
    }

    pub fn sub(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext> {
        let (a, b) = self.align(a, b)?;
        Ok(Ciphertext::from_parts(&a.b - &b.b, &a.a - &b.a, a.correction))
    }

    /// Sum of a non-empty slice of ciphertexts
    pub fn sum(&self, cts: &[Ciphertext]) -> Result<Ciphertext> {
        let (first, rest) = cts
            .split_first()
            .ok_or_else(|| mismatch_err!("cannot sum zero ciphertexts"))?;
        rest.iter()
            .try_fold(first.clone(), |acc, ct| self.add(&acc, ct))
    }

    /// Multiply the message by an integer `k` (taken mod t). No level is used.
    pub fn mul_scalar(&self, ct: &Ciphertext, k: u64) -> Ciphertext {
        let k = k % self.ctx.plaintext_modulus();
        Ciphertext::from_parts(ct.b.scalar_mul(k), ct.a.scalar_mul(k), ct.correction)
    }

    /// Tensor product followed by relinearization, without rescaling.
    pub fn multiply_relin(&self, x: &Ciphertext, y: &Ciphertext) -> Result<Ciphertext> {
        self.check_depth(x.level().min(y.level()), "multiplication")?;
        let (x, y) = self.align(x, y)?;
        let tables = self.ctx.tables();
        let t = self.ctx.plaintext_modulus();

        let (b1, a1) = (x.b.to_ntt_new(tables), x.a.to_ntt_new(tables));
        let (b2, a2) = (y.b.to_ntt_new(tables), y.a.to_ntt_new(tables));

        let mut d0 = b1.mul_ntt_domain(&b2, tables);
        let mut d1 = b1.mul_ntt_domain(&a2, tables);
        d1.mul_acc_ntt_domain(&a1, &b2, tables);
        let mut d2 = a1.mul_ntt_domain(&a2, tables);
        d0.from_ntt(tables);
        d1.from_ntt(tables);
        d2.from_ntt(tables);

        let (kb, ka) = key_switch(self.ctx, &d2, &self.keys.relin)?;
        let correction = ModQ::mul(x.correction, y.correction, t);
        Ok(Ciphertext::from_parts(&d0 + &kb, &d1 + &ka, correction))
    }

    /// Drop one chain prime, consuming one level of depth budget.
    pub fn rescale(&self, ct: &Ciphertext) -> Result<Ciphertext> {
        if ct.level() == 0 {
            self.check_depth(0, "rescale")?;
            return Ok(ct.clone());
        }
        Ok(ct.drop_last_prime(self.ctx.plaintext_modulus()))
    }

    /// Multiply, relinearize and rescale.
    pub fn multiply(&self, x: &Ciphertext, y: &Ciphertext) -> Result<Ciphertext> {
        let product = self.multiply_relin(x, y)?;
        self.rescale(&product)
    }

    /// Apply X -> X^g and switch back to the main key.
    pub fn apply_galois(&self, ct: &Ciphertext, g: usize) -> Result<Ciphertext> {
        let key = self
            .keys
            .galois
            .get(&g)
            .ok_or_else(|| RegressionError::MissingKey(format!("Galois element {}", g)))?;
        let b = ct.b.automorphism(g);
        let a = ct.a.automorphism(g);
        let (kb, ka) = key_switch(self.ctx, &a, key)?;
        Ok(Ciphertext::from_parts(&b + &kb, ka, ct.correction))
    }

    /// Slot reversal X -> X^(-1); pairs with a product to form inner products.
    pub fn reflect(&self, ct: &Ciphertext) -> Result<Ciphertext> {
        self.apply_galois(ct, self.ctx.reflection_element())
    }

    /// Sum over the automorphisms fixing the constant term: leaves
    /// N·(slot 0) in slot 0 and zero elsewhere. The factor N is folded into
    /// the correction so decryption returns slot 0 itself.
    pub fn trace(&self, ct: &Ciphertext) -> Result<Ciphertext> {
        let mut acc = ct.clone();
        for g in self.ctx.trace_elements() {
            let rotated = self.apply_galois(&acc, g)?;
            acc = self.add(&acc, &rotated)?;
        }
        let t = self.ctx.plaintext_modulus();
        acc.correction = ModQ::mul(acc.correction, self.ctx.ring_dim() as u64 % t, t);
        Ok(acc)
    }

    fn check_depth(&self, level: usize, op: &'static str) -> Result<()> {
        if level > 0 {
            return Ok(());
        }
        if self.strict_depth {
            return Err(RegressionError::DepthBudgetExhausted(op));
        }
        debug!(op, "depth budget exhausted; continuing without a level");
        Ok(())
    }
}
