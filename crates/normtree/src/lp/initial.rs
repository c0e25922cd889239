//! The shared starting tableau: matching equations in sparse column form.

use nalgebra::DMatrix;
use num_bigint::BigInt;
use smallvec::SmallVec;

use super::matrix::LpMatrix;
use crate::constraint::LpConstraint;
use crate::coords::NormalCoords;
use crate::equations::{matching_equations, row_basis};
use crate::triangulation::Triangulation;

/// One column of the starting tableau: non-zero matching-equation entries plus
/// coefficients in the extra constraint rows.
#[derive(Clone, Debug, Default)]
pub struct LpCol {
    entries: SmallVec<[(usize, i64); 4]>,
    extra: SmallVec<[i64; 2]>,
}

/// Matching equations, row-reduced to full rank, columns reordered for sparsity,
/// with extra constraint rows appended.
///
/// Tableau columns: `3n` quad columns (tetrahedron slot `i` owns `3i..3i+3`),
/// then in standard systems `4n` triangle columns (slot `j` owns `3n+4j..`),
/// then one column per extra constraint. `column_perm()` maps tableau columns
/// back to surface coordinates.
#[derive(Clone, Debug)]
pub struct LpInitialTableaux {
    system: NormalCoords,
    n_tets: usize,
    eqns: DMatrix<i64>,
    rank: usize,
    cols: usize,
    col: Vec<LpCol>,
    column_perm: Vec<usize>,
    n_extra: usize,
    oct_adjustment: i64,
    constraints_broken: bool,
}

impl LpInitialTableaux {
    /// Build for `coords` (octagon systems use their octagon-free counterpart).
    ///
    /// `enumeration` selects the column order: full enumeration in standard
    /// coordinates reuses the quad-coordinate order.
    pub fn new<C: LpConstraint>(tri: &Triangulation, coords: NormalCoords, enumeration: bool) -> Self {
        let system = coords.without_octagons();
        let n = tri.size();
        let mut eqns = matching_equations(tri, system);
        let matching_rank = row_basis(&mut eqns);
        let coord_cols = eqns.ncols();
        let n_extra = C::N_CONSTRAINTS;

        let mut column_perm = if system == NormalCoords::Standard && enumeration {
            standard_from_quad_order(tri)
        } else {
            sparsity_order(&eqns, matching_rank, n, system)
        };
        column_perm.extend(coord_cols..coord_cols + n_extra);

        let eqns = DMatrix::from_fn(eqns.nrows(), coord_cols, |r, c| eqns[(r, column_perm[c])]);

        let cols = coord_cols + n_extra;
        let mut col = vec![LpCol::default(); cols];
        for (c, lp_col) in col.iter_mut().enumerate().take(coord_cols) {
            for r in 0..matching_rank {
                let v = eqns[(r, c)];
                if v != 0 {
                    lp_col.entries.push((r, v));
                }
            }
        }

        let mut constraints_broken = false;
        if n_extra > 0 {
            let rows = C::coefficients(tri, system);
            if rows.is_none() {
                constraints_broken = true;
                tracing::warn!(
                    constraint = C::NAME,
                    coords = %coords,
                    "extra constraints cannot be installed; treating them as trivial"
                );
            }
            for (c, lp_col) in col.iter_mut().enumerate() {
                lp_col.extra = SmallVec::from_elem(0, n_extra);
                if c < coord_cols {
                    if let Some(rows) = &rows {
                        for (j, row) in rows.iter().enumerate() {
                            lp_col.extra[j] = row[column_perm[c]];
                        }
                    }
                } else {
                    lp_col.extra[c - coord_cols] = -1;
                }
            }
        }

        Self {
            system,
            n_tets: n,
            eqns,
            rank: matching_rank + n_extra,
            cols,
            col,
            column_perm,
            n_extra,
            oct_adjustment: C::OCT_ADJUSTMENT,
            constraints_broken,
        }
    }

    /// Rows of the tableau, extra constraint rows included.
    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Columns of the tableau, extra constraint columns included.
    #[inline]
    pub fn columns(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn coordinate_columns(&self) -> usize {
        self.cols - self.n_extra
    }

    #[inline]
    pub fn system(&self) -> NormalCoords {
        self.system
    }

    #[inline]
    pub fn n_tets(&self) -> usize {
        self.n_tets
    }

    #[inline]
    pub fn column_perm(&self) -> &[usize] {
        &self.column_perm
    }

    /// Matching equations with columns in tableau order.
    #[inline]
    pub fn eqns(&self) -> &DMatrix<i64> {
        &self.eqns
    }

    #[inline]
    pub fn constraints_broken(&self) -> bool {
        self.constraints_broken
    }

    /// Row `r` of `m` times column `c` of the starting tableau.
    pub fn mult_col_by_row(&self, m: &LpMatrix, r: usize, c: usize) -> BigInt {
        let mut ans = BigInt::default();
        for &(row, v) in &self.col[c].entries {
            add_scaled(&mut ans, m.entry(r, row), v);
        }
        let base = m.cols() - self.n_extra;
        for (j, &v) in self.col[c].extra.iter().enumerate() {
            add_scaled(&mut ans, m.entry(r, base + j), v);
        }
        ans
    }

    /// Row `r` of `m` times the merged octagon column `primary + secondary`.
    ///
    /// Each of the two quad columns has its extra constraint coefficients
    /// shifted by the octagon adjustment.
    pub fn mult_oct_by_row(&self, m: &LpMatrix, r: usize, primary: usize, secondary: usize) -> BigInt {
        let mut ans = self.mult_col_by_row(m, r, primary) + self.mult_col_by_row(m, r, secondary);
        if self.oct_adjustment != 0 {
            let base = m.cols() - self.n_extra;
            for j in 0..self.n_extra {
                add_scaled(&mut ans, m.entry(r, base + j), 2 * self.oct_adjustment);
            }
        }
        ans
    }

    /// Dense copy of the starting tableau (`rank × columns`).
    pub fn fill_initial_tableaux(&self) -> LpMatrix {
        let mut m = LpMatrix::new(self.rank, self.cols);
        let base = self.rank - self.n_extra;
        for (c, col) in self.col.iter().enumerate() {
            for &(r, v) in &col.entries {
                *m.entry_mut(r, c) += v;
            }
            for (j, &v) in col.extra.iter().enumerate() {
                *m.entry_mut(base + j, c) += v;
            }
        }
        m
    }
}

#[inline]
fn add_scaled(ans: &mut BigInt, x: &BigInt, v: i64) {
    match v {
        0 => {}
        1 => *ans += x,
        -1 => *ans -= x,
        _ => *ans += x * v,
    }
}

/// Standard-coordinate order for enumeration: the quad-coordinate tetrahedron
/// order, triangles following the quads.
fn standard_from_quad_order(tri: &Triangulation) -> Vec<usize> {
    let n = tri.size();
    let mut quad = matching_equations(tri, NormalCoords::Quad);
    let rank = row_basis(&mut quad);
    let quad_perm = sparsity_order(&quad, rank, n, NormalCoords::Quad);
    let mut perm = vec![0; 7 * n];
    for i in 0..n {
        let k = quad_perm[3 * i] / 3;
        place_tet(&mut perm, n, i, k, NormalCoords::Standard);
    }
    perm
}

/// Put tetrahedron `k` into tableau slot `slot`.
fn place_tet(perm: &mut [usize], n: usize, slot: usize, k: usize, system: NormalCoords) {
    if system == NormalCoords::Quad {
        for q in 0..3 {
            perm[3 * slot + q] = 3 * k + q;
        }
    } else {
        for q in 0..3 {
            perm[3 * slot + q] = 7 * k + 4 + q;
        }
        for v in 0..4 {
            perm[3 * n + 4 * slot + v] = 7 * k + v;
        }
    }
}

/// Process rows by fewest not-yet-placed tetrahedra touched, placing their
/// tetrahedra from the back of the tableau; untouched tetrahedra go last.
fn sparsity_order(eqns: &DMatrix<i64>, rank: usize, n: usize, system: NormalCoords) -> Vec<usize> {
    let per = system.per_tet();
    let quad_base = system.quad_offset();
    let touches = |row: usize, k: usize| (0..3).any(|q| eqns[(row, per * k + quad_base + q)] != 0);

    let mut perm = vec![0; per * n];
    let mut used = vec![false; rank];
    let mut touched = vec![false; n];
    let mut n_touched = 0;

    for _ in 0..rank {
        let mut best = n + 1;
        let mut best_row = 0;
        for j in (0..rank).filter(|&j| !used[j]) {
            let mut curr = 0;
            for k in (0..n).filter(|&k| !touched[k]) {
                if touches(j, k) {
                    curr += 1;
                }
                if curr >= best {
                    break;
                }
            }
            if curr < best {
                best_row = j;
                best = curr;
            }
        }

        used[best_row] = true;
        for k in 0..n {
            if !touched[k] && touches(best_row, k) {
                touched[k] = true;
                place_tet(&mut perm, n, n - n_touched - 1, k, system);
                n_touched += 1;
            }
        }
    }

    for k in 0..n {
        if !touched[k] {
            touched[k] = true;
            place_tet(&mut perm, n, n - n_touched - 1, k, system);
            n_touched += 1;
        }
    }
    perm
}
