//! Modular arithmetic over word-sized moduli

/// Modular arithmetic operations over Z_q for q < 2^63
pub struct ModQ;

impl ModQ {
    /// Add two reduced values modulo q
    #[inline]
    pub fn add(a: u64, b: u64, q: u64) -> u64 {
        let sum = a + b;
        if sum >= q {
            sum - q
        } else {
            sum
        }
    }

    /// Subtract two reduced values modulo q
    #[inline]
    pub fn sub(a: u64, b: u64, q: u64) -> u64 {
        if a >= b {
            a - b
        } else {
            q - (b - a)
        }
    }

    /// Multiply two values modulo q
    #[inline]
    pub fn mul(a: u64, b: u64, q: u64) -> u64 {
        ((a as u128 * b as u128) % q as u128) as u64
    }

    /// Negate a reduced value modulo q
    #[inline]
    pub fn negate(a: u64, q: u64) -> u64 {
        if a == 0 {
            0
        } else {
            q - a
        }
    }

    /// Modular exponentiation by squaring
    pub fn pow(mut base: u64, mut exp: u64, q: u64) -> u64 {
        let mut result = 1 % q;
        base %= q;
        while exp > 0 {
            if exp & 1 == 1 {
                result = Self::mul(result, base, q);
            }
            base = Self::mul(base, base, q);
            exp >>= 1;
        }
        result
    }

    /// Multiplicative inverse via the extended Euclidean algorithm.
    ///
    /// Returns `None` when `gcd(a, q) != 1`. Works for composite moduli.
    pub fn inv(a: u64, q: u64) -> Option<u64> {
        let (mut old_r, mut r) = (a as i128 % q as i128, q as i128);
        let (mut old_s, mut s) = (1i128, 0i128);
        while r != 0 {
            let quotient = old_r / r;
            (old_r, r) = (r, old_r - quotient * r);
            (old_s, s) = (s, old_s - quotient * s);
        }
        if old_r != 1 {
            return None;
        }
        Some(old_s.rem_euclid(q as i128) as u64)
    }

    /// Convert a signed integer to its representation in Z_q
    #[inline]
    pub fn from_signed(val: i64, q: u64) -> u64 {
        (val as i128).rem_euclid(q as i128) as u64
    }

    /// Convert from Z_q to the centered representative in (-q/2, q/2]
    #[inline]
    pub fn to_signed(val: u64, q: u64) -> i64 {
        if val <= q / 2 {
            val as i64
        } else {
            -((q - val) as i64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const Q: u64 = 1152921504606830593;

    #[test]
    fn test_add() {
        assert_eq!(ModQ::add(5, 7, Q), 12);
        assert_eq!(ModQ::add(Q - 1, 2, Q), 1);
    }

    #[test]
    fn test_sub() {
        assert_eq!(ModQ::sub(10, 3, Q), 7);
        assert_eq!(ModQ::sub(3, 10, Q), Q - 7);
    }

    #[test]
    fn test_mul_wraps() {
        assert_eq!(ModQ::mul(5, 7, Q), 35);
        assert_eq!(ModQ::mul(Q - 1, Q - 1, Q), 1);
    }

    #[test]
    fn test_pow_and_inv() {
        assert_eq!(ModQ::pow(3, 4, 8191), 81);
        let inv = ModQ::inv(2048, 8191).unwrap();
        assert_eq!(ModQ::mul(inv, 2048, 8191), 1);
        assert_eq!(ModQ::inv(6, 9), None);
        assert_eq!(ModQ::inv(4, 9), Some(7));
    }

    #[test]
    fn test_signed_roundtrip() {
        assert_eq!(ModQ::from_signed(-5, Q), Q - 5);
        assert_eq!(ModQ::to_signed(Q - 5, Q), -5);
        assert_eq!(ModQ::from_signed(-26, 8191), 8165);
        assert_eq!(ModQ::to_signed(4095, 8191), 4095);
        assert_eq!(ModQ::to_signed(4096, 8191), -4095);
    }
}
