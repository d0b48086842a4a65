//! Cramer's rule over any commutative ring.
//!
//! Determinants are expanded along rows with minors memoized by the set of
//! columns they use. A minor over `s` columns costs `s - 1` sequential
//! multiplications, so a `d × d` system needs depth `d - 1`. The column
//! replaced by the right-hand side only matters for minors that contain
//! it, so minors without that column are shared with `det(G)`.

use std::collections::HashMap;

use crate::error::{mismatch_err, Result};
use crate::she::{Ciphertext, Evaluator};

/// Ring operations used by the solver.
pub trait RingOps {
    type Elem: Clone;

    fn add(&self, a: &Self::Elem, b: &Self::Elem) -> Result<Self::Elem>;
    fn sub(&self, a: &Self::Elem, b: &Self::Elem) -> Result<Self::Elem>;
    fn mul(&self, a: &Self::Elem, b: &Self::Elem) -> Result<Self::Elem>;
}

/// Multiplication here includes the rescale that spends one level.
impl RingOps for Evaluator<'_> {
    type Elem = Ciphertext;

    fn add(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext> {
        Evaluator::add(self, a, b)
    }

    fn sub(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext> {
        Evaluator::sub(self, a, b)
    }

    fn mul(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext> {
        self.multiply(a, b)
    }
}

struct Minors<'m, R: RingOps> {
    ring: &'m R,
    matrix: &'m [Vec<R::Elem>],
    rhs: &'m [R::Elem],
    cache: HashMap<(u64, Option<usize>), R::Elem>,
}

impl<'m, R: RingOps> Minors<'m, R> {
    /// Determinant of the bottom `|mask|` rows restricted to the columns in
    /// `mask`, with column `replaced` taken from the right-hand side.
    fn minor(&mut self, mask: u64, replaced: Option<usize>) -> Result<R::Elem> {
        let replaced = replaced.filter(|&c| mask & (1 << c) != 0);
        if let Some(hit) = self.cache.get(&(mask, replaced)) {
            return Ok(hit.clone());
        }

        let (matrix, rhs, ring) = (self.matrix, self.rhs, self.ring);
        let n = matrix.len();
        let row = n - mask.count_ones() as usize;

        let value = if mask.count_ones() == 1 {
            entry(matrix, rhs, row, mask.trailing_zeros() as usize, replaced).clone()
        } else {
            let mut acc: Option<R::Elem> = None;
            let columns = (0..n).filter(|&c| mask & (1 << c) != 0);
            for (pos, col) in columns.enumerate() {
                let sub = self.minor(mask & !(1 << col), replaced)?;
                let term = ring.mul(entry(matrix, rhs, row, col, replaced), &sub)?;
                acc = Some(match acc {
                    None => term,
                    Some(a) if pos % 2 == 0 => ring.add(&a, &term)?,
                    Some(a) => ring.sub(&a, &term)?,
                });
            }
            acc.ok_or_else(|| mismatch_err!("empty minor"))?
        };

        self.cache.insert((mask, replaced), value.clone());
        Ok(value)
    }
}

fn entry<'e, T>(
    matrix: &'e [Vec<T>],
    rhs: &'e [T],
    row: usize,
    col: usize,
    replaced: Option<usize>,
) -> &'e T {
    if Some(col) == replaced {
        &rhs[row]
    } else {
        &matrix[row][col]
    }
}

fn check_square<T>(matrix: &[Vec<T>], rhs_len: usize) -> Result<()> {
    let n = matrix.len();
    if n == 0 || n > 63 {
        return Err(mismatch_err!("unsupported system size {}", n));
    }
    if matrix.iter().any(|row| row.len() != n) || rhs_len != n {
        return Err(mismatch_err!("system is not {} × {}", n, n));
    }
    Ok(())
}

/// Determinant by memoized Laplace expansion.
pub fn determinant<R: RingOps>(ring: &R, matrix: &[Vec<R::Elem>]) -> Result<R::Elem> {
    check_square(matrix, matrix.len())?;
    let mut minors = Minors {
        ring,
        matrix,
        rhs: &[],
        cache: HashMap::new(),
    };
    minors.minor(full_mask(matrix.len()), None)
}

/// Solve `G·θ = b` up to the common denominator: returns `(θ', det G)`
/// with `θ'_i = det(G with column i replaced by b)`, so `θ = θ' / det G`.
pub fn cramer_solve<R: RingOps>(
    ring: &R,
    gram: &[Vec<R::Elem>],
    rhs: &[R::Elem],
) -> Result<(Vec<R::Elem>, R::Elem)> {
    check_square(gram, rhs.len())?;
    let mask = full_mask(gram.len());
    let mut minors = Minors {
        ring,
        matrix: gram,
        rhs,
        cache: HashMap::new(),
    };

    let det = minors.minor(mask, None)?;
    let theta = (0..gram.len())
        .map(|i| minors.minor(mask, Some(i)))
        .collect::<Result<Vec<_>>>()?;
    Ok((theta, det))
}

fn full_mask(n: usize) -> u64 {
    (1u64 << n) - 1
}
