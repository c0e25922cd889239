//! Dense row-major matrix of arbitrary-precision integers.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LpMatrix {
    rows: usize,
    cols: usize,
    dat: Vec<BigInt>,
}

impl LpMatrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            dat: vec![BigInt::zero(); rows * cols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::new(n, n);
        m.init_identity();
        m
    }

    /// Reset a square matrix to the identity.
    pub fn init_identity(&mut self) {
        debug_assert_eq!(self.rows, self.cols);
        for (i, x) in self.dat.iter_mut().enumerate() {
            if i / self.cols == i % self.cols {
                x.set_one();
            } else {
                x.set_zero();
            }
        }
    }

    /// Copy `other` into this matrix, reusing its allocation.
    pub fn init_clone(&mut self, other: &LpMatrix) {
        self.rows = other.rows;
        self.cols = other.cols;
        self.dat.clone_from(&other.dat);
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn entry(&self, r: usize, c: usize) -> &BigInt {
        &self.dat[r * self.cols + c]
    }

    #[inline]
    pub fn entry_mut(&mut self, r: usize, c: usize) -> &mut BigInt {
        &mut self.dat[r * self.cols + c]
    }

    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for c in 0..self.cols {
            self.dat.swap(a * self.cols + c, b * self.cols + c);
        }
    }

    pub fn negate_row(&mut self, r: usize) {
        for x in &mut self.dat[r * self.cols..(r + 1) * self.cols] {
            *x = -std::mem::take(x);
        }
    }

    /// Mutable row `dest` alongside shared row `src` (`dest != src`).
    fn row_pair(&mut self, dest: usize, src: usize) -> (&mut [BigInt], &[BigInt]) {
        let cols = self.cols;
        if dest < src {
            let (lo, hi) = self.dat.split_at_mut(src * cols);
            (&mut lo[dest * cols..(dest + 1) * cols], &hi[..cols])
        } else {
            let (lo, hi) = self.dat.split_at_mut(dest * cols);
            (&mut hi[..cols], &lo[src * cols..(src + 1) * cols])
        }
    }

    /// `row[dest] = (dest_coeff * row[dest] - src_coeff * row[src]) / div`, exactly.
    pub fn comb_row(
        &mut self,
        dest_coeff: &BigInt,
        dest: usize,
        src_coeff: &BigInt,
        src: usize,
        div: &BigInt,
    ) {
        let (pd, ps) = self.row_pair(dest, src);
        for (d, s) in pd.iter_mut().zip(ps) {
            *d = (&*d * dest_coeff - src_coeff * s) / div;
        }
    }

    /// `row[dest] = dest_coeff * row[dest] - src_coeff * row[src]`, then divide the
    /// row by the gcd of its entries. Returns that gcd (0 for a zero row).
    pub fn comb_row_and_norm(
        &mut self,
        dest_coeff: &BigInt,
        dest: usize,
        src_coeff: &BigInt,
        src: usize,
    ) -> BigInt {
        let (pd, ps) = self.row_pair(dest, src);
        let mut g = BigInt::zero();
        for (d, s) in pd.iter_mut().zip(ps) {
            *d = &*d * dest_coeff - src_coeff * s;
            if !g.is_one() {
                g = g.gcd(d);
            }
        }
        if g > BigInt::one() {
            for d in pd.iter_mut() {
                *d /= &g;
            }
        }
        g
    }
}
