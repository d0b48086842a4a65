//! Prime testing and NTT-friendly prime generation

use super::modular::ModQ;

const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Deterministic Miller-Rabin test, exact for every `u64`.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for &p in &WITNESSES {
        if n % p == 0 {
            return n == p;
        }
    }

    let mut d = n - 1;
    let mut s = 0;
    while d % 2 == 0 {
        d /= 2;
        s += 1;
    }

    'witness: for &a in &WITNESSES {
        let mut x = ModQ::pow(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = ModQ::mul(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Distinct prime factors of `n` by trial division.
pub fn prime_factors(mut n: u64) -> Vec<u64> {
    let mut factors = Vec::new();
    let mut f = 2;
    while f * f <= n {
        if n % f == 0 {
            factors.push(f);
            while n % f == 0 {
                n /= f;
            }
        }
        f += 1;
    }
    if n > 1 {
        factors.push(n);
    }
    factors
}

/// Check whether `g` generates the multiplicative group of the prime field F_p.
pub fn is_primitive_root(g: u64, p: u64) -> bool {
    if g % p == 0 {
        return false;
    }
    prime_factors(p - 1)
        .into_iter()
        .all(|f| ModQ::pow(g, (p - 1) / f, p) != 1)
}

/// Number of bits needed to represent `n`.
#[inline]
pub fn bit_length(n: u64) -> u32 {
    64 - n.leading_zeros()
}

/// Generate `count` distinct primes `q < 2^bits` with `q ≡ 1 (mod step)`,
/// searching downward from the largest candidate and skipping `exclude`.
///
/// Returns fewer primes than requested only if the search space runs out.
pub fn ntt_primes(bits: u32, step: u64, count: usize, exclude: &[u64]) -> Vec<u64> {
    let mut primes = Vec::with_capacity(count);
    let upper = if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 };
    let mut k = upper / step;
    while primes.len() < count && k > 0 {
        let candidate = k * step + 1;
        if is_prime(candidate) && !exclude.contains(&candidate) {
            primes.push(candidate);
        }
        k -= 1;
    }
    primes
}
