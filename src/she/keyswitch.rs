//! Hybrid RNS key switching with a special prime.
//!
//! A polynomial d over q_0..q_l is split into its RNS digits
//! d_i = [d]_{q_i} (centered), each lifted to the extended basis
//! q_0..q_l, P. Accumulating Σ d_i · K_i gives P·d·s' + t·E, and dividing by
//! P (with t-correction) leaves d·s' plus noise of order t·√N.

use crate::error::{RegressionError, Result};
use crate::math::{RnsPoly, Sampler};

use super::context::SheContext;
use super::keys::{KeySwitchKey, KeySwitchRow, SecretKey};

/// Generate a key switching from `s_prime` to the secret key `sk`.
///
/// `s_prime` must be in coefficient form over `ctx.key_basis()`.
pub fn generate_switch_key(
    ctx: &SheContext,
    sk: &SecretKey,
    s_prime: &RnsPoly,
    sampler: &mut Sampler,
) -> KeySwitchKey {
    let n = ctx.ring_dim();
    let t = ctx.plaintext_modulus();
    let tables = ctx.tables();
    let basis = ctx.key_basis();

    let s = sk.poly(&basis).to_ntt_new(tables);
    let s_prime = s_prime.to_ntt_new(tables);

    let rows = (0..ctx.chain().len())
        .map(|i| {
            let a = RnsPoly::uniform(n, &basis, true, sampler.rng());
            let e = RnsPoly::from_signed(&sampler.gaussian_vec(n), &basis)
                .scalar_mul(t)
                .to_ntt_new(tables);
            let mut b = &e - &a.mul_ntt_domain(&s, tables);
            b.add_scaled_limb(i, s_prime.limb(i), ctx.special_prime());
            KeySwitchRow { b, a }
        })
        .collect();

    KeySwitchKey { rows }
}

/// Switch `d·s'` to the main key: returns (Δb, Δa) over d's basis with
/// Δb + Δa·s = d·s' + t·e for a small e.
///
/// `d` must be in coefficient form over a chain prefix.
pub fn key_switch(
    ctx: &SheContext,
    d: &RnsPoly,
    key: &KeySwitchKey,
) -> Result<(RnsPoly, RnsPoly)> {
    let tables = ctx.tables();
    let t = ctx.plaintext_modulus();
    let digits = d.limb_count();
    if key.rows.len() < digits {
        return Err(RegressionError::MissingKey(format!(
            "key has {} digits, ciphertext needs {}",
            key.rows.len(),
            digits
        )));
    }

    let mut extended = d.moduli().to_vec();
    extended.push(ctx.special_prime());

    let mut acc_b = RnsPoly::zero(ctx.ring_dim(), &extended).to_ntt_new(tables);
    let mut acc_a = acc_b.clone();

    for (i, row) in key.rows.iter().take(digits).enumerate() {
        let digit = d.lift_limb(i, &extended).to_ntt_new(tables);
        acc_b.mul_acc_ntt_domain(&digit, &row.b.select(&extended), tables);
        acc_a.mul_acc_ntt_domain(&digit, &row.a.select(&extended), tables);
    }

    acc_b.from_ntt(tables);
    acc_a.from_ntt(tables);
    Ok((acc_b.drop_last_limb(t), acc_a.drop_last_limb(t)))
}
