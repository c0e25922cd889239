//! Search for a single non-trivial solution.
//!
//! Quad types 0 and 1 are merged (type 1 leaves quad 0 unconstrained), there is
//! no domination test, and the branching order changes as the search runs: at
//! least one unmarked triangle coordinate is forced to zero before any quad is
//! decided, which keeps vertex links out of the answer.

use std::ops::Deref;
use std::sync::Arc;

use super::types::{Branching, OctState, SingleSolnCfg, TraversalError};
use super::TreeTraversal;
use crate::ban::BanPolicy;
use crate::constraint::LpConstraint;
use crate::coords::NormalCoords;
use crate::lp::LpData;
use crate::triangulation::Triangulation;

/// Finds one surface satisfying the extra constraints with some unmarked
/// triangle coordinate zero. Standard coordinates only, with or without
/// octagons.
#[derive(Debug)]
pub struct TreeSingleSoln<C, B> {
    base: TreeTraversal<C, B>,
    /// Level of the triangle slot currently forced towards zero.
    next_zero_level: usize,
    cfg: SingleSolnCfg,
    searched: bool,
}

impl<C: LpConstraint, B: BanPolicy> TreeSingleSoln<C, B> {
    pub fn new(tri: impl Into<Arc<Triangulation>>, coords: NormalCoords) -> Result<Self, TraversalError> {
        Self::with_cfg(tri, coords, SingleSolnCfg::default())
    }

    pub fn with_cfg(
        tri: impl Into<Arc<Triangulation>>,
        coords: NormalCoords,
        cfg: SingleSolnCfg,
    ) -> Result<Self, TraversalError> {
        if !coords.stores_triangles() {
            return Err(TraversalError::coords("single-solution search", coords));
        }
        let branches_per_quad = if coords.stores_octagons() { 6 } else { 3 };
        Ok(Self {
            base: TreeTraversal::new(tri.into(), coords, branches_per_quad, 2, false)?,
            next_zero_level: 0,
            cfg,
            searched: false,
        })
    }

    #[inline]
    pub fn cfg(&self) -> SingleSolnCfg {
        self.cfg
    }

    /// Run the search. On success `build_surface()` returns the solution.
    ///
    /// The search runs once; later calls return false.
    pub fn find(&mut self) -> bool {
        if std::mem::replace(&mut self.searched, true) {
            return false;
        }
        let found = self.search();
        tracing::debug!(found, visited = self.base.n_visited, "single-solution search done");
        found
    }

    fn search(&mut self) -> bool {
        let b = &mut self.base;
        let n_types = b.n_types;
        let n_tets = b.n_tets;

        if !b.start_root() {
            return false;
        }
        let Some(first) = b.next_unmarked_triangle_type(n_tets) else {
            tracing::debug!("every triangle type is marked; nothing to force to zero");
            return false;
        };
        b.set_next_at(0, first);
        b.level = 0;

        while !b.is_cancelled() {
            let level = b.level;
            let idx = b.type_order[level];

            if b.out_of_range(idx) {
                b.types[idx] = 0;
                if level == 0 {
                    return false;
                }
                b.level -= 1;
                let up = b.type_order[b.level];
                b.types[up] += 1;
                continue;
            }

            b.n_visited += 1;
            b.prepare_single_node(idx);

            if !b.pool.get(b.lp_slot[level + 1]).is_feasible() {
                b.types[idx] += 1;
                continue;
            }

            if level == n_types - 1 {
                // Merged quads may hide a smaller solution; settle each one.
                let lp = b.pool.get_mut(b.lp_slot[level + 1]);
                repair_merged_quads(lp, &mut b.tmp[0], &mut b.types, n_tets);
                debug_assert!(
                    b.verify(&b.build_surface(), None),
                    "single solution fails verification: {}",
                    b.type_string()
                );
                return true;
            }

            if level == self.next_zero_level {
                if b.types[idx] == 0 {
                    // This triangle is zero: decide its tetrahedron's quads next.
                    b.set_next((idx - n_tets) / 4);
                } else {
                    match b.next_unmarked_triangle_type(idx + 1) {
                        Some(next) => {
                            b.set_next(next);
                            self.next_zero_level += 1;
                        }
                        // Only solutions with every unmarked triangle positive remain.
                        None => return false,
                    }
                }
            } else if self.cfg.branching == Branching::FewestFeasible && b.type_order[level + 1] < n_tets {
                let mut best = None;
                let mut min_branches = 5;
                for i in level + 1..n_types {
                    let quad = b.type_order[i];
                    if quad >= n_tets {
                        continue;
                    }
                    let k = b.feasible_branches(quad);
                    if k < min_branches {
                        min_branches = k;
                        best = Some(quad);
                        if k == 0 {
                            break;
                        }
                    }
                }
                if let Some(quad) = best {
                    b.set_next(quad);
                }
            }

            b.level += 1;
        }
        false
    }
}

impl<C: LpConstraint, B: BanPolicy> TreeTraversal<C, B> {
    /// Single-solution counterpart of the enumeration node setup. Quad slots
    /// skip type 0: their first visit becomes type 1 in place.
    fn prepare_single_node(&mut self, idx: usize) {
        let level = self.level;
        let here = self.lp_slot[level];
        let nxt = self.next_slot[level];

        if self.types[idx] == 0 {
            if idx >= self.n_tets {
                self.lp_slot[level + 1] = here;
                self.next_slot[level + 1] = nxt.offset(1);
                self.pool.clone_slot(nxt, here);
                self.pool.get_mut(here).constrain_zero(2 * self.n_tets + idx);
                return;
            }

            self.types[idx] = 1;
            let base = 3 * idx;
            if self.oct == OctState::Free {
                self.next_slot[level + 1] = nxt.offset(5);
                // Types 3, 4, 5 start unconstrained.
                self.pool.clone_slot(nxt.offset(1), here);
                self.pool.clone_slot(nxt.offset(2), here);
                self.pool.clone_slot(nxt.offset(3), here);
                self.pool.get_mut(here).constrain_zero(base + 2);
                // Types 2, 6 inherit x2 = 0.
                self.pool.clone_slot(nxt, here);
                self.pool.clone_slot(nxt.offset(4), here);
                self.pool.get_mut(here).constrain_zero(base + 1);
            } else {
                self.next_slot[level + 1] = nxt.offset(2);
                self.pool.clone_slot(nxt.offset(1), here);
                self.pool.get_mut(here).constrain_zero(base + 2);
                self.pool.clone_slot(nxt, here);
                self.pool.get_mut(here).constrain_zero(base + 1);
            }
        }

        if idx >= self.n_tets {
            self.lp_slot[level + 1] = nxt;
            self.pool.get_mut(nxt).constrain_positive(2 * self.n_tets + idx);
            return;
        }

        let t = self.types[idx];
        let base = 3 * idx;
        let slot = if t == 1 { here } else { nxt.offset(usize::from(t) - 2) };
        self.lp_slot[level + 1] = slot;
        let lp = self.pool.get_mut(slot);
        match t {
            // x1 = x2 = 0 already; x0 stays free.
            1 => {}
            2 => {
                lp.constrain_zero(base);
                lp.constrain_positive(base + 1);
            }
            3 => {
                lp.constrain_zero(base);
                lp.constrain_zero(base + 1);
                lp.constrain_positive(base + 2);
            }
            4 => {
                lp.constrain_zero(base);
                lp.constrain_oct(base + 1, base + 2);
            }
            5 => {
                lp.constrain_zero(base + 1);
                lp.constrain_oct(base, base + 2);
            }
            6 => lp.constrain_oct(base, base + 1),
            _ => unreachable!("quad type {t} passed the range check"),
        }
    }
}

/// Settle every merged quad slot (type 1) at a feasible leaf: if its quad can
/// be zero the slot becomes type 0, otherwise the quad is made positive so
/// that the solution reads back correctly.
///
/// `scratch` is overwritten.
pub fn repair_merged_quads(lp: &mut LpData, scratch: &mut LpData, types: &mut [u8], n_tets: usize) {
    for (i, ty) in types.iter_mut().enumerate().take(n_tets) {
        if *ty != 1 {
            continue;
        }
        scratch.init_clone(lp);
        scratch.constrain_zero(3 * i);
        if scratch.is_feasible() {
            lp.constrain_zero(3 * i);
            *ty = 0;
        } else {
            lp.constrain_positive(3 * i);
        }
    }
}

impl<C, B> Deref for TreeSingleSoln<C, B> {
    type Target = TreeTraversal<C, B>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use num_bigint::BigInt;

    use super::*;
    use crate::constraint::EulerPositive;
    use crate::lp::LpInitialTableaux;
    use crate::triangulation::special;

    fn free_tet_lp() -> (Arc<LpInitialTableaux>, LpData) {
        let tri = special::single_tet();
        let init = Arc::new(LpInitialTableaux::new::<EulerPositive>(
            &tri,
            NormalCoords::Standard,
            false,
        ));
        let mut lp = LpData::new(Arc::clone(&init));
        lp.init_start();
        EulerPositive::constrain(&mut lp, init.columns());
        // Quads 1 and 2 are zero, as for a merged type 1 slot.
        lp.constrain_zero(1);
        lp.constrain_zero(2);
        (init, lp)
    }

    fn ints(v: &[i64]) -> Vec<BigInt> {
        v.iter().copied().map(BigInt::from).collect()
    }

    #[test]
    fn merged_quad_kept_when_it_must_be_positive() {
        let (init, mut lp) = free_tet_lp();
        for c in 3..7 {
            lp.constrain_zero(c);
        }
        let mut scratch = LpData::new(init);
        let mut types = vec![1, 0, 0, 0, 0, 0];
        repair_merged_quads(&mut lp, &mut scratch, &mut types, 1);
        assert_eq!(types[0], 1);
        assert!(lp.is_feasible());
        assert_eq!(lp.extract_solution(&types), ints(&[0, 0, 0, 0, 1, 0, 0]));
    }

    #[test]
    fn merged_quad_dropped_when_zero_is_feasible() {
        let (init, mut lp) = free_tet_lp();
        lp.constrain_positive(3);
        for c in 4..7 {
            lp.constrain_zero(c);
        }
        let mut scratch = LpData::new(init);
        let mut types = vec![1, 1, 0, 0, 0, 0];
        repair_merged_quads(&mut lp, &mut scratch, &mut types, 1);
        assert_eq!(types[0], 0);
        assert!(lp.is_feasible());
        assert_eq!(lp.extract_solution(&types), ints(&[1, 0, 0, 0, 0, 0, 0]));
    }

    #[test]
    fn quad_coordinates_rejected() {
        let err = TreeSingleSoln::<EulerPositive, crate::ban::BanNone>::new(special::lst_123(), NormalCoords::Quad)
            .err();
        assert_eq!(err, Some(TraversalError::coords("single-solution search", NormalCoords::Quad)));
    }
}
