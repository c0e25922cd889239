//! Disc types that must be zero (banned) or that do not count towards a
//! non-trivial solution (marked).
//!
//! Both are indexed by tableau column, so policies are built against the
//! column layout of the starting tableau.

use crate::coords::NormalCoords;
use crate::equations::Disc;
use crate::lp::{LpData, LpInitialTableaux};
use crate::triangulation::Triangulation;

/// A ban/mark policy, chosen at compile time.
pub trait BanPolicy: Sized {
    const NAME: &'static str;

    fn new(tri: &Triangulation, init: &LpInitialTableaux) -> Self;

    fn supported(coords: NormalCoords) -> bool;

    fn is_banned(&self, col: usize) -> bool;

    fn is_marked(&self, col: usize) -> bool;

    /// Force every banned column of `lp` to zero.
    fn enforce_bans(&self, lp: &mut LpData) {
        for col in (0..lp.coordinate_columns()).filter(|&c| self.is_banned(c)) {
            lp.constrain_zero(col);
        }
    }
}

/// Nothing banned, nothing marked.
#[derive(Clone, Copy, Debug, Default)]
pub struct BanNone;

impl BanPolicy for BanNone {
    const NAME: &'static str = "none";

    fn new(_tri: &Triangulation, _init: &LpInitialTableaux) -> Self {
        Self
    }

    fn supported(_coords: NormalCoords) -> bool {
        true
    }

    fn is_banned(&self, _col: usize) -> bool {
        false
    }

    fn is_marked(&self, _col: usize) -> bool {
        false
    }

    fn enforce_bans(&self, _lp: &mut LpData) {}
}

/// Per-column ban and mark flags.
#[derive(Clone, Debug, Default)]
struct DiscMask {
    banned: Vec<bool>,
    marked: Vec<bool>,
}

impl DiscMask {
    fn new(init: &LpInitialTableaux) -> Self {
        let cols = init.columns();
        Self {
            banned: vec![false; cols],
            marked: vec![false; cols],
        }
    }

    /// `(tet, disc)` for each coordinate column of the tableau.
    fn discs(init: &LpInitialTableaux) -> impl Iterator<Item = (usize, usize, Disc)> + '_ {
        let system = init.system();
        let block = Disc::block(system);
        let per = system.per_tet();
        init.column_perm()[..init.coordinate_columns()]
            .iter()
            .enumerate()
            .map(move |(col, &orig)| (col, orig / per, block[orig % per]))
    }
}

/// Bans every disc meeting a boundary triangle. Marks nothing.
#[derive(Clone, Debug, Default)]
pub struct BanBoundary {
    mask: DiscMask,
}

impl BanPolicy for BanBoundary {
    const NAME: &'static str = "boundary";

    fn new(tri: &Triangulation, init: &LpInitialTableaux) -> Self {
        let mut mask = DiscMask::new(init);
        for (col, tet, disc) in DiscMask::discs(init) {
            mask.banned[col] = (0..4).any(|f| tri.adjacent(tet, f).is_none() && disc.meets_face(f));
        }
        Self { mask }
    }

    fn supported(coords: NormalCoords) -> bool {
        coords.stores_triangles()
    }

    #[inline]
    fn is_banned(&self, col: usize) -> bool {
        self.mask.banned[col]
    }

    #[inline]
    fn is_marked(&self, col: usize) -> bool {
        self.mask.marked[col]
    }
}

/// Bans every disc meeting a torus boundary component and marks triangles in
/// the links of vertices on such components.
#[derive(Clone, Debug, Default)]
pub struct BanTorusBoundary {
    mask: DiscMask,
}

impl BanPolicy for BanTorusBoundary {
    const NAME: &'static str = "torus-boundary";

    fn new(tri: &Triangulation, init: &LpInitialTableaux) -> Self {
        let sk = tri.skeleton();
        let torus: Vec<bool> = sk
            .boundary_components
            .iter()
            .map(|c| c.orientable && c.euler_char() == 0)
            .collect();
        let on_torus_triangle = |t: usize, f: usize| {
            let id = sk.tet_triangle[t][f];
            sk.triangles[id].is_boundary()
                && sk
                    .boundary_components
                    .iter()
                    .zip(&torus)
                    .any(|(c, &is_torus)| is_torus && c.triangles.contains(&id))
        };
        let on_torus_vertex = |t: usize, v: usize| {
            sk.vertex_component(sk.tet_vertex[t][v])
                .is_some_and(|c| torus[c])
        };

        let mut mask = DiscMask::new(init);
        for (col, tet, disc) in DiscMask::discs(init) {
            mask.banned[col] = (0..4).any(|f| disc.meets_face(f) && on_torus_triangle(tet, f));
            if let Disc::Triangle(v) = disc {
                mask.marked[col] = on_torus_vertex(tet, v);
            }
        }
        Self { mask }
    }

    fn supported(coords: NormalCoords) -> bool {
        coords.stores_triangles()
    }

    #[inline]
    fn is_banned(&self, col: usize) -> bool {
        self.mask.banned[col]
    }

    #[inline]
    fn is_marked(&self, col: usize) -> bool {
        self.mask.marked[col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::NoConstraint;
    use crate::triangulation::special;

    fn init(tri: &Triangulation, coords: NormalCoords) -> LpInitialTableaux {
        LpInitialTableaux::new::<NoConstraint>(tri, coords, true)
    }

    #[test]
    fn free_tet_bans_everything() {
        let tri = special::single_tet();
        let init = init(&tri, NormalCoords::Standard);
        let ban = BanBoundary::new(&tri, &init);
        assert!((0..7).all(|c| ban.is_banned(c)));
        assert!((0..7).all(|c| !ban.is_marked(c)));
    }

    #[test]
    fn lst_torus_bans_quads_and_marks_all_triangles() {
        let tri = special::lst_123();
        let init = init(&tri, NormalCoords::Standard);
        let ban = BanTorusBoundary::new(&tri, &init);
        // Faces 1 and 2 are the torus; every quad meets them.
        for c in 0..3 {
            assert!(ban.is_banned(c));
        }
        // The single vertex lies on the torus, so every triangle is marked.
        for c in 3..7 {
            assert!(ban.is_marked(c));
        }
    }

    #[test]
    fn torus_found_beside_a_non_orientable_component() {
        use crate::triangulation::Perm4;
        let perm = |img| Perm4::new(img).unwrap();
        let tri = Triangulation::from_gluings(
            2,
            &[(0, 0, 0, perm([3, 0, 1, 2])), (1, 0, 1, perm([2, 0, 1, 3]))],
        )
        .unwrap();
        assert!(!tri.is_orientable());
        let init = init(&tri, NormalCoords::Standard);
        let ban = BanTorusBoundary::new(&tri, &init);
        // Every disc of the solid torus meets its boundary; the other
        // tetrahedron only meets a projective plane.
        for (col, tet, disc) in DiscMask::discs(&init) {
            assert_eq!(ban.is_banned(col), tet == 0, "column {col}");
            if let Disc::Triangle(_) = disc {
                assert_eq!(ban.is_marked(col), tet == 0, "column {col}");
            }
        }
    }

    #[test]
    fn closed_triangulation_bans_nothing() {
        let tri = special::folded_sphere();
        let init = init(&tri, NormalCoords::Standard);
        let ban = BanBoundary::new(&tri, &init);
        assert!((0..7).all(|c| !ban.is_banned(c)));
    }
}
