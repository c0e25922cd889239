//! Matching equations, Euler characteristic coefficients and row bases.
//!
//! Columns follow `NormalCoords` layouts: tetrahedron `t` owns the block
//! `t * coords.per_tet() ..` (triangles, then quads, then octagons).
//!
//! Octagon type `k` in a tetrahedron has the arcs and edge points of quads
//! `(k+1)%3` and `(k+2)%3` together, so octagon coefficients are derived from
//! quad coefficients. This is the same encoding the tableau uses for octagons.

use nalgebra::DMatrix;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, Zero};

use crate::coords::NormalCoords;
use crate::triangulation::{Triangulation, QUAD_SEPARATING};

/// Column of triangle `v` in tetrahedron `t`.
#[inline]
fn tri_col(coords: NormalCoords, t: usize, v: usize) -> usize {
    t * coords.per_tet() + v
}

#[inline]
fn quad_col(coords: NormalCoords, t: usize, q: usize) -> usize {
    t * coords.per_tet() + coords.quad_offset() + q
}

#[inline]
fn oct_col(coords: NormalCoords, t: usize, k: usize, oct_offset: usize) -> usize {
    t * coords.per_tet() + oct_offset + k
}

/// Matching equations for `coords`, one row per equation.
///
/// Triangle-storing systems get three rows per internal triangle; quad systems
/// get one row per non-boundary edge.
pub fn matching_equations(tri: &Triangulation, coords: NormalCoords) -> DMatrix<i64> {
    if coords.stores_triangles() {
        standard_equations(tri, coords)
    } else {
        quad_equations(tri, coords)
    }
}

fn standard_equations(tri: &Triangulation, coords: NormalCoords) -> DMatrix<i64> {
    let sk = tri.skeleton();
    let internal: Vec<_> = sk.triangles.iter().filter(|t| !t.is_boundary()).collect();
    let cols = coords.per_tet() * tri.size();
    let mut m = DMatrix::<i64>::zeros(3 * internal.len(), cols);
    let oct = coords.oct_offset();

    let mut row = 0;
    for triangle in internal {
        let (t, f) = triangle.embeddings[0];
        let Some(g) = tri.adjacent(t, f) else {
            continue;
        };
        let gf = g.perm.apply(f);
        for v in (0..4).filter(|&v| v != f) {
            let gv = g.perm.apply(v);
            let q = QUAD_SEPARATING[v][f];
            let gq = QUAD_SEPARATING[gv][gf];
            m[(row, tri_col(coords, t, v))] += 1;
            m[(row, quad_col(coords, t, q))] += 1;
            m[(row, tri_col(coords, g.tet, gv))] -= 1;
            m[(row, quad_col(coords, g.tet, gq))] -= 1;
            if let Some(off) = oct {
                for k in (0..3).filter(|&k| k != q) {
                    m[(row, oct_col(coords, t, k, off))] += 1;
                }
                for k in (0..3).filter(|&k| k != gq) {
                    m[(row, oct_col(coords, g.tet, k, off))] -= 1;
                }
            }
            row += 1;
        }
    }
    m
}

fn quad_equations(tri: &Triangulation, coords: NormalCoords) -> DMatrix<i64> {
    let sk = tri.skeleton();
    let internal: Vec<_> = sk.edges.iter().filter(|e| !e.boundary).collect();
    let cols = coords.per_tet() * tri.size();
    let mut m = DMatrix::<i64>::zeros(internal.len(), cols);
    let oct = coords.oct_offset();

    for (row, edge) in internal.into_iter().enumerate() {
        for emb in &edge.embeddings {
            let p = emb.perm;
            let plus = QUAD_SEPARATING[p.apply(0)][p.apply(2)];
            let minus = QUAD_SEPARATING[p.apply(0)][p.apply(3)];
            m[(row, quad_col(coords, emb.tet, plus))] += 1;
            m[(row, quad_col(coords, emb.tet, minus))] -= 1;
            if let Some(off) = oct {
                m[(row, oct_col(coords, emb.tet, minus, off))] += 1;
                m[(row, oct_col(coords, emb.tet, plus, off))] -= 1;
            }
        }
    }
    m
}

/// Arcs a disc leaves on face `f` of its tetrahedron, by disc kind.
fn arcs_on_face(kind: Disc, f: usize) -> i64 {
    match kind {
        Disc::Triangle(v) => i64::from(v != f),
        Disc::Quad(_) => 1,
        Disc::Oct(_) => 2,
    }
}

/// Points a disc leaves on the tetrahedron edge `ab`.
fn points_on_edge(kind: Disc, a: usize, b: usize) -> i64 {
    let sep = QUAD_SEPARATING[a][b];
    match kind {
        Disc::Triangle(v) => i64::from(v == a || v == b),
        Disc::Quad(q) => i64::from(q != sep),
        Disc::Oct(k) => {
            if k == sep {
                2
            } else {
                1
            }
        }
    }
}

/// A normal or almost normal disc type within one tetrahedron.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disc {
    Triangle(usize),
    Quad(usize),
    Oct(usize),
}

impl Disc {
    /// Disc types of a tetrahedron block in `coords` order.
    pub fn block(coords: NormalCoords) -> Vec<Disc> {
        let mut out = Vec::with_capacity(coords.per_tet());
        if coords.stores_triangles() {
            out.extend((0..4).map(Disc::Triangle));
        }
        out.extend((0..3).map(Disc::Quad));
        if coords.stores_octagons() {
            out.extend((0..3).map(Disc::Oct));
        }
        out
    }

    /// Does this disc meet face `f` of its tetrahedron?
    #[inline]
    pub fn meets_face(self, f: usize) -> bool {
        arcs_on_face(self, f) > 0
    }
}

/// Per-column coefficients of the Euler characteristic, for triangle-storing systems.
///
/// Every disc counts once as a face; every arc is charged to the first
/// embedding of its triangle and every point to the first embedding of its edge.
/// Returns `None` for quad-only systems.
pub fn euler_coefficients(tri: &Triangulation, coords: NormalCoords) -> Option<Vec<i64>> {
    if !coords.stores_triangles() {
        return None;
    }
    let sk = tri.skeleton();
    let block = Disc::block(coords);
    let per = coords.per_tet();
    let mut obj = vec![1i64; per * tri.size()];

    for triangle in &sk.triangles {
        let (t, f) = triangle.embeddings[0];
        for (i, &d) in block.iter().enumerate() {
            obj[t * per + i] -= arcs_on_face(d, f);
        }
    }
    for edge in &sk.edges {
        let Some(emb) = edge.embeddings.first() else {
            continue;
        };
        let (a, b) = (emb.perm.apply(0), emb.perm.apply(1));
        for (i, &d) in block.iter().enumerate() {
            obj[emb.tet * per + i] += points_on_edge(d, a, b);
        }
    }
    Some(obj)
}

/// Reorder rows so that the first `rank` rows form a basis of the row space.
///
/// Returns the rank. Row order is otherwise stable.
pub fn row_basis(m: &mut DMatrix<i64>) -> usize {
    let (rows, cols) = m.shape();
    let mut echelon: Vec<(usize, Vec<BigInt>)> = Vec::new();
    let mut independent = Vec::new();
    let mut dependent = Vec::new();

    for r in 0..rows {
        let mut v: Vec<BigInt> = (0..cols).map(|c| BigInt::from(m[(r, c)])).collect();
        for (pc, b) in &echelon {
            if v[*pc].is_zero() {
                continue;
            }
            let coeff = v[*pc].clone();
            let base = b[*pc].clone();
            let mut g = BigInt::zero();
            for c in 0..cols {
                v[c] = &v[c] * &base - &coeff * &b[c];
                g = g.gcd(&v[c]);
            }
            if g > BigInt::from(1) {
                for x in v.iter_mut() {
                    *x /= &g;
                }
            }
        }
        match v.iter().position(|x| !x.is_zero()) {
            Some(pc) => {
                if v[pc].is_negative() {
                    for x in v.iter_mut() {
                        *x = -&*x;
                    }
                }
                echelon.push((pc, v));
                independent.push(r);
            }
            None => dependent.push(r),
        }
    }

    let rank = independent.len();
    if rank < rows {
        let order: Vec<usize> = independent.into_iter().chain(dependent).collect();
        let old = m.clone();
        *m = DMatrix::from_fn(rows, cols, |i, j| old[(order[i], j)]);
    }
    rank
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triangulation::special;

    #[test]
    fn single_tet_has_no_equations() {
        let tri = special::single_tet();
        assert_eq!(matching_equations(&tri, NormalCoords::Standard).nrows(), 0);
        assert_eq!(matching_equations(&tri, NormalCoords::Quad).nrows(), 0);
        assert_eq!(matching_equations(&tri, NormalCoords::QuadOct).ncols(), 6);
    }

    #[test]
    fn lst_standard_equations_have_rank_three() {
        let tri = special::lst_123();
        let mut m = matching_equations(&tri, NormalCoords::Standard);
        assert_eq!(m.shape(), (3, 7));
        assert_eq!(row_basis(&mut m), 3);
        // All three edges lie on the boundary, so there are no quad equations.
        assert_eq!(matching_equations(&tri, NormalCoords::Quad).nrows(), 0);
    }

    #[test]
    fn vertex_link_of_single_tet_has_euler_char_one() {
        let tri = special::single_tet();
        let obj = euler_coefficients(&tri, NormalCoords::Standard).unwrap();
        // A single triangle is a disc; a single quad is a disc.
        for (i, &c) in obj.iter().enumerate() {
            assert_eq!(c, 1, "column {i}");
        }
        let an = euler_coefficients(&tri, NormalCoords::AlmostNormal).unwrap();
        // Octagon: 1 face, 8 arcs, 8 points.
        assert_eq!(&an[7..10], &[1, 1, 1]);
        assert!(euler_coefficients(&tri, NormalCoords::Quad).is_none());
    }

    #[test]
    fn lst_vertex_link_is_a_disc() {
        let tri = special::lst_123();
        let obj = euler_coefficients(&tri, NormalCoords::Standard).unwrap();
        let link: i64 = obj[..4].iter().sum();
        assert_eq!(link, 1);
        let eqns = matching_equations(&tri, NormalCoords::Standard);
        for r in 0..eqns.nrows() {
            let s: i64 = (0..4).map(|c| eqns[(r, c)]).sum();
            assert_eq!(s, 0);
        }
    }

    #[test]
    fn row_basis_moves_dependent_rows_last() {
        let mut m = DMatrix::from_row_slice(3, 3, &[1, 1, 0, 2, 2, 0, 0, 1, 1]);
        assert_eq!(row_basis(&mut m), 2);
        assert_eq!(m.row(0).iter().copied().collect::<Vec<_>>(), vec![1, 1, 0]);
        assert_eq!(m.row(1).iter().copied().collect::<Vec<_>>(), vec![0, 1, 1]);
        assert_eq!(m.row(2).iter().copied().collect::<Vec<_>>(), vec![2, 2, 0]);
    }
}
