//! A tableau in the dual simplex: row operations applied to the shared
//! starting tableau, plus the right-hand side and the current basis.

use std::sync::Arc;

use num_bigint::{BigInt, Sign};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

use super::initial::LpInitialTableaux;
use super::matrix::LpMatrix;

/// Role of one tableau column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColState {
    /// Constrained to zero and removed from the problem.
    Inactive,
    NonBasic,
    /// Basic, defined by the given row.
    Basic(usize),
}

/// Tableau for a node of the search tree.
///
/// Constraints only ever tighten: columns are forced to zero (and deactivated),
/// forced positive by the substitution `x = 1 + x'`, or paired into an octagon.
/// After each change the basis is moved back to feasibility if possible.
#[derive(Clone, Debug)]
pub struct LpData {
    orig: Arc<LpInitialTableaux>,
    rhs: Vec<BigInt>,
    row_ops: LpMatrix,
    rank: usize,
    basis: Vec<usize>,
    state: Vec<ColState>,
    feasible: bool,
    /// `(primary, secondary)` quad columns merged into an octagon column.
    oct: Option<(usize, usize)>,
}

impl LpData {
    /// Allocate storage for tableaux over `orig`; contents are undefined until
    /// `init_start` or `init_clone`.
    pub fn new(orig: Arc<LpInitialTableaux>) -> Self {
        let rank = orig.rank();
        let cols = orig.columns();
        Self {
            rhs: vec![BigInt::zero(); rank],
            row_ops: LpMatrix::new(rank, rank),
            rank,
            basis: vec![0; rank],
            state: vec![ColState::NonBasic; cols],
            feasible: false,
            oct: None,
            orig,
        }
    }

    /// Root tableau: the starting tableau with a zero right-hand side and a
    /// basis found by Gauss-Jordan elimination.
    pub fn init_start(&mut self) {
        self.rank = self.orig.rank();
        self.row_ops.init_identity();
        self.rhs.iter_mut().for_each(Zero::set_zero);
        self.oct = None;
        self.find_initial_basis();
        self.feasible = true;
    }

    /// Become a copy of `parent`. Infeasible parents only pass on infeasibility.
    pub fn init_clone(&mut self, parent: &LpData) {
        self.feasible = parent.feasible;
        if !self.feasible {
            return;
        }
        self.rhs.clone_from(&parent.rhs);
        self.row_ops.init_clone(&parent.row_ops);
        self.rank = parent.rank;
        self.basis.clone_from(&parent.basis);
        self.state.clone_from(&parent.state);
        self.oct = parent.oct;
    }

    #[inline]
    pub fn is_feasible(&self) -> bool {
        self.feasible
    }

    #[inline]
    pub fn is_active(&self, col: usize) -> bool {
        self.state[col] != ColState::Inactive
    }

    #[inline]
    pub fn col_state(&self, col: usize) -> ColState {
        self.state[col]
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.orig.columns()
    }

    #[inline]
    pub fn coordinate_columns(&self) -> usize {
        self.orig.coordinate_columns()
    }

    /// Entry `(r, c)` of the current tableau, octagon merge included.
    pub fn entry(&self, r: usize, c: usize) -> BigInt {
        match self.oct {
            Some((p, s)) if p == c => self.orig.mult_oct_by_row(&self.row_ops, r, p, s),
            _ => self.orig.mult_col_by_row(&self.row_ops, r, c),
        }
    }

    #[inline]
    fn entry_sign(&self, r: usize, c: usize) -> Sign {
        self.entry(r, c).sign()
    }

    /// Largest-index active non-basic column whose entry in row `r` has a sign
    /// accepted by `want`.
    fn last_nonbasic_where(&self, r: usize, want: impl Fn(Sign) -> bool) -> Option<usize> {
        (0..self.columns())
            .rev()
            .find(|&c| self.state[c] == ColState::NonBasic && want(self.entry_sign(r, c)))
    }

    /// Move row `r` past the active rows after its basic variable has left.
    fn drop_row(&mut self, r: usize) {
        self.rank -= 1;
        let last = self.rank;
        if r != last {
            self.rhs.swap(r, last);
            self.row_ops.swap_rows(r, last);
            self.basis[r] = self.basis[last];
            self.state[self.basis[r]] = ColState::Basic(r);
        }
    }

    /// Force column `pos` to zero and deactivate it.
    pub fn constrain_zero(&mut self, pos: usize) {
        if !self.is_active(pos) || !self.feasible {
            return;
        }

        let mut perhaps_infeasible = false;
        if let ColState::Basic(r) = self.state[pos] {
            if self.rhs[r].is_zero() {
                match self.last_nonbasic_where(r, |s| s != Sign::NoSign) {
                    Some(c) => self.pivot(pos, c),
                    // The row reads x_pos = 0.
                    None => self.drop_row(r),
                }
            } else {
                let Some(c) = self.last_nonbasic_where(r, |s| s == Sign::Plus) else {
                    self.feasible = false;
                    return;
                };
                self.pivot(pos, c);
                perhaps_infeasible = true;
            }
        }

        self.state[pos] = ColState::Inactive;

        if perhaps_infeasible {
            self.make_feasible();
        }
    }

    /// Force column `pos` to be at least one.
    pub fn constrain_positive(&mut self, pos: usize) {
        if !self.is_active(pos) {
            self.feasible = false;
            return;
        }
        if !self.feasible {
            return;
        }

        // Substitute x = 1 + x': subtract the column from the right-hand side.
        match self.state[pos] {
            ColState::Basic(r) => {
                let e = self.entry(r, pos);
                self.rhs[r] -= e;
                if self.rhs[r].is_negative() {
                    self.make_feasible();
                }
            }
            _ => {
                for r in 0..self.rank {
                    let e = self.entry(r, pos);
                    self.rhs[r] -= e;
                }
                self.make_feasible();
            }
        }
    }

    /// Require an octagon made of quad columns `quad1` and `quad2`: the two
    /// counts are equal and positive.
    ///
    /// One column becomes the primary octagon counter; the other is zeroed.
    pub fn constrain_oct(&mut self, quad1: usize, quad2: usize) {
        if !(self.is_active(quad1) && self.is_active(quad2)) {
            self.feasible = false;
            return;
        }
        if !self.feasible {
            return;
        }

        match (self.state[quad1], self.state[quad2]) {
            (ColState::NonBasic, ColState::NonBasic) => {
                self.oct = Some((quad1, quad2));
                self.state[quad2] = ColState::Inactive;
                self.constrain_positive(quad1);
            }
            (ColState::NonBasic, _) => {
                self.oct = Some((quad1, quad2));
                self.constrain_zero(quad2);
                self.constrain_positive(quad1);
            }
            (_, ColState::NonBasic) => {
                self.oct = Some((quad2, quad1));
                self.constrain_zero(quad1);
                self.constrain_positive(quad2);
            }
            (ColState::Basic(row1), _) => {
                // The primary column changed under a basic variable; restore it
                // to a unit column or move it out of the basis.
                self.oct = Some((quad1, quad2));
                let mut e1 = self.entry(row1, quad1);
                if !e1.is_zero() {
                    if e1.is_negative() {
                        e1 = -e1;
                        self.negate_row(row1);
                    }
                    self.eliminate_column(row1, quad1, &e1);
                    self.make_feasible();
                } else if let Some(c) = self.last_nonbasic_where(row1, |s| s != Sign::NoSign) {
                    self.pivot(quad1, c);
                    self.make_feasible();
                } else if !self.rhs[row1].is_zero() {
                    self.feasible = false;
                    return;
                } else {
                    self.state[quad1] = ColState::NonBasic;
                    self.drop_row(row1);
                }
                self.constrain_zero(quad2);
                self.constrain_positive(quad1);
            }
            (ColState::Inactive, _) => unreachable!("inactive columns rejected above"),
        }
    }

    /// Solution vector in surface coordinates, as the smallest integer multiple.
    ///
    /// `types` holds the type of each tableau slot (quad slots first, then
    /// triangle slots) as set by the traversal.
    pub fn extract_solution(&self, types: &[u8]) -> Vec<BigInt> {
        let perm = self.orig.column_perm();
        let n_tets = self.orig.n_tets();
        let coord_cols = self.orig.coordinate_columns();

        let lcm = (0..self.rank).fold(BigInt::one(), |acc, r| acc.lcm(&self.entry(r, self.basis[r])));

        let mut v = vec![BigInt::zero(); coord_cols];
        for r in 0..self.rank {
            let b = self.basis[r];
            if b >= coord_cols {
                continue;
            }
            v[perm[b]] = &lcm * &self.rhs[r] / self.entry(r, b);
        }

        // Undo every x = 1 + x' substitution.
        for (i, &t) in types.iter().enumerate().take(n_tets) {
            if (1..4).contains(&t) {
                v[perm[3 * i + usize::from(t) - 1]] += &lcm;
            }
        }
        for i in 3 * n_tets..coord_cols {
            if types[i - 2 * n_tets] != 0 {
                v[perm[i]] += &lcm;
            }
        }
        if let Some((p, s)) = self.oct {
            v[perm[p]] += &lcm;
            v[perm[s]] = v[perm[p]].clone();
        }

        let g = v.iter().fold(BigInt::zero(), |g, x| g.gcd(x));
        if g > BigInt::one() {
            for x in &mut v {
                *x /= &g;
            }
        }
        v
    }

    fn negate_row(&mut self, r: usize) {
        self.rhs[r] = -std::mem::take(&mut self.rhs[r]);
        self.row_ops.negate_row(r);
    }

    /// Clear column `col` outside `def_row`, whose entry is `base > 0`.
    fn eliminate_column(&mut self, def_row: usize, col: usize, base: &BigInt) {
        for r in 0..self.rank {
            if r == def_row {
                continue;
            }
            let coeff = self.entry(r, col);
            if coeff.is_zero() {
                continue;
            }
            let g = self.row_ops.comb_row_and_norm(base, r, &coeff, def_row);
            let rhs = &self.rhs[r] * base - &coeff * &self.rhs[def_row];
            self.rhs[r] = rhs / g;
        }
    }

    /// Swap basic `out_col` for non-basic `in_col`.
    fn pivot(&mut self, out_col: usize, in_col: usize) {
        let ColState::Basic(def_row) = self.state[out_col] else {
            unreachable!("pivot out of a non-basic column");
        };
        self.state[out_col] = ColState::NonBasic;
        self.state[in_col] = ColState::Basic(def_row);
        self.basis[def_row] = in_col;

        let mut base = self.entry(def_row, in_col);
        if base.is_negative() {
            base = -base;
            self.negate_row(def_row);
        }
        self.eliminate_column(def_row, in_col, &base);
    }

    fn find_initial_basis(&mut self) {
        let cols = self.columns();
        self.state.iter_mut().for_each(|s| *s = ColState::NonBasic);

        let mut tab = self.orig.fill_initial_tableaux();
        let mut ops = LpMatrix::identity(self.rank);

        let mut row = 0;
        while row < self.rank {
            let pick = (0..cols).find(|&c| self.state[c] == ColState::NonBasic && !tab.entry(row, c).is_zero());
            let Some(c) = pick else {
                // Only reachable if the starting tableau lost rank.
                self.rank -= 1;
                tab.swap_rows(row, self.rank);
                ops.swap_rows(row, self.rank);
                continue;
            };

            self.basis[row] = c;
            self.state[c] = ColState::Basic(row);

            let mut base = tab.entry(row, c).clone();
            if base.is_negative() {
                base = -base;
                tab.negate_row(row);
                ops.negate_row(row);
            }
            for r in (0..self.rank).filter(|&r| r != row) {
                let coeff = tab.entry(r, c).clone();
                if !coeff.is_zero() {
                    let g = ops.comb_row_and_norm(&base, r, &coeff, row);
                    tab.comb_row(&base, r, &coeff, row, &g);
                }
            }
            row += 1;
        }
        self.row_ops = ops;
    }

    /// Pivot until every basic variable is non-negative, or detect infeasibility.
    ///
    /// Leaves the most negative basic variable first; switches to a slower
    /// cycle-free rule if a basis repeats (Brent's cycle detection).
    fn make_feasible(&mut self) {
        let cols = self.columns();
        let mut curr = vec![false; cols];
        for &b in &self.basis[..self.rank] {
            curr[b] = true;
        }
        let mut old = curr.clone();
        let mut pow2: u64 = 1;
        let mut n_pivots: u64 = 0;

        loop {
            let mut out: Option<(usize, BigInt)> = None;
            for r in 0..self.rank {
                if !self.rhs[r].is_negative() {
                    continue;
                }
                let e = self.entry(r, self.basis[r]);
                let better = match &out {
                    None => true,
                    Some((out_row, out_entry)) => &self.rhs[r] * out_entry < &self.rhs[*out_row] * &e,
                };
                if better {
                    out = Some((r, e));
                }
            }
            let Some((out_row, _)) = out else {
                return;
            };
            let out_col = self.basis[out_row];

            let Some(c) = self.last_nonbasic_where(out_row, |s| s == Sign::Minus) else {
                self.feasible = false;
                return;
            };
            self.pivot(out_col, c);

            curr[out_col] = false;
            curr[c] = true;
            if curr == old {
                tracing::trace!(pivots = n_pivots, "cycling detected; switching pivot rule");
                self.make_feasible_anti_cycling();
                return;
            }

            n_pivots += 1;
            if n_pivots == pow2 {
                old.clone_from(&curr);
                pow2 = match pow2.checked_mul(2) {
                    Some(p) => p,
                    None => {
                        self.make_feasible_anti_cycling();
                        return;
                    }
                };
            }
        }
    }

    /// Always leave the largest-index negative basic variable.
    fn make_feasible_anti_cycling(&mut self) {
        loop {
            let out_col = (0..self.rank)
                .filter(|&r| self.rhs[r].is_negative())
                .map(|r| self.basis[r])
                .max();
            let Some(out_col) = out_col else {
                return;
            };
            let ColState::Basic(out_row) = self.state[out_col] else {
                unreachable!("basis and column states disagree");
            };
            let Some(c) = self.last_nonbasic_where(out_row, |s| s == Sign::Minus) else {
                self.feasible = false;
                return;
            };
            self.pivot(out_col, c);
        }
    }

    /// Check the tableau invariants: basic columns are positive unit columns
    /// and the right-hand side is non-negative.
    #[cfg(any(test, debug_assertions))]
    pub fn verify(&self) -> bool {
        if !self.feasible {
            return true;
        }
        for r in 0..self.rank {
            if self.rhs[r].is_negative() {
                return false;
            }
            let b = self.basis[r];
            if self.state[b] != ColState::Basic(r) {
                return false;
            }
            for r2 in 0..self.rank {
                let e = self.entry(r2, b);
                let ok = if r2 == r { e.is_positive() } else { e.is_zero() };
                if !ok {
                    return false;
                }
            }
        }
        true
    }
}
