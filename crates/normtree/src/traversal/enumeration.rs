//! Full enumeration of vertex surfaces.

use std::ops::Deref;
use std::sync::Arc;

use super::pool::SlotId;
use super::types::{OctState, TraversalError};
use super::TreeTraversal;
use crate::ban::BanPolicy;
use crate::constraint::LpConstraint;
use crate::coords::NormalCoords;
use crate::surface::NormalSurface;
use crate::triangulation::Triangulation;
use crate::trie::TypeTrie;

/// Lists every vertex surface (or octagonal almost normal vertex surface),
/// one per call to `next`.
///
/// Supports all four coordinate systems. Output order is deterministic.
#[derive(Debug)]
pub struct TreeEnumeration<C, B> {
    base: TreeTraversal<C, B>,
    solns: TypeTrie<7>,
    n_solns: usize,
    /// Deepest level holding a non-zero type, once any has been set.
    last_non_zero: Option<usize>,
    finished: bool,
}

impl<C: LpConstraint, B: BanPolicy> TreeEnumeration<C, B> {
    pub fn new(tri: impl Into<Arc<Triangulation>>, coords: NormalCoords) -> Result<Self, TraversalError> {
        let branches_per_quad = if coords.stores_octagons() { 7 } else { 4 };
        Ok(Self {
            base: TreeTraversal::new(tri.into(), coords, branches_per_quad, 2, true)?,
            solns: TypeTrie::new(),
            n_solns: 0,
            last_non_zero: None,
            finished: false,
        })
    }

    /// Solutions found so far.
    #[inline]
    pub fn solutions(&self) -> usize {
        self.n_solns
    }

    /// Type vectors accepted so far.
    #[inline]
    pub fn accepted(&self) -> &TypeTrie<7> {
        &self.solns
    }

    /// Call `f` after every solution until the search is exhausted or `f`
    /// returns true. Returns whether `f` stopped the search.
    pub fn run(&mut self, mut f: impl FnMut(&Self) -> bool) -> bool {
        while self.next() {
            if f(self) {
                return true;
            }
        }
        false
    }

    /// Collect every remaining surface.
    pub fn collect_surfaces(&mut self) -> Vec<NormalSurface> {
        let mut out = Vec::new();
        self.run(|e| {
            out.push(e.build_surface());
            false
        });
        out
    }

    /// Advance to the next solution. False once the search is exhausted or
    /// cancelled; it stays false afterwards.
    pub fn next(&mut self) -> bool {
        if self.finished {
            return false;
        }
        let n_types = self.base.n_types;

        match self.last_non_zero {
            None => {
                if !self.base.start_root() {
                    tracing::debug!("root tableau infeasible; no solutions");
                    self.finished = true;
                    return false;
                }
            }
            Some(level) => {
                // Incrementing a trailing zero would dominate the previous
                // solution, so resume at the deepest non-zero type.
                self.base.level = level;
                let idx = self.base.type_order[level];
                self.base.types[idx] += 1;
            }
        }

        loop {
            if self.base.is_cancelled() {
                tracing::debug!(visited = self.base.n_visited, "enumeration cancelled");
                self.finished = true;
                return false;
            }

            let b = &mut self.base;
            let level = b.level;
            let idx = b.type_order[level];

            if b.out_of_range(idx) {
                b.types[idx] = 0;
                if level == 0 {
                    tracing::debug!(
                        visited = b.n_visited,
                        solutions = self.n_solns,
                        "enumeration finished"
                    );
                    self.finished = true;
                    return false;
                }
                b.level -= 1;
                let up = b.type_order[b.level];
                b.types[up] += 1;
                self.last_non_zero = Some(b.level);
                continue;
            }

            b.n_visited += 1;

            // Zero types cannot change the outcome of the parent's test.
            if b.types[idx] != 0 && self.solns.dominates(&b.types[..n_types]) {
                b.types[idx] += 1;
                self.last_non_zero = Some(level);
                continue;
            }

            b.prepare_enumeration_node(idx);

            // The all-zero leaf still needed its clones spun off above.
            if self.last_non_zero.is_none() && level == n_types - 1 {
                b.types[idx] += 1;
                self.last_non_zero = Some(level);
                continue;
            }

            if !b.pool.get(b.lp_slot[level + 1]).is_feasible() {
                b.types[idx] += 1;
                self.last_non_zero = Some(level);
                continue;
            }

            if level < n_types - 1 {
                b.level += 1;
                continue;
            }

            self.solns.insert(&b.types[..n_types]);
            self.n_solns += 1;
            tracing::trace!(n = self.n_solns, types = %b.type_string(), "vertex surface");
            debug_assert!(
                b.verify(&b.build_surface(), None),
                "emitted surface fails verification: {}",
                b.type_string()
            );
            return true;
        }
    }
}

impl<C: LpConstraint, B: BanPolicy> TreeTraversal<C, B> {
    /// Point `lp_slot[level + 1]` at the tableau for the current type of slot
    /// `idx`, adding the constraints it implies.
    ///
    /// On a first visit (type 0) the parent tableau is constrained in place and
    /// clones for the sibling types are spun off along the way.
    fn prepare_enumeration_node(&mut self, idx: usize) {
        let level = self.level;
        let here = self.lp_slot[level];
        let nxt = self.next_slot[level];
        let t = self.types[idx];

        if t == 0 {
            self.lp_slot[level + 1] = here;
            if idx < self.n_tets {
                let base = 3 * idx;
                if self.oct == OctState::Free {
                    self.next_slot[level + 1] = nxt.offset(6);
                    // Types 1, 5, 6 start unconstrained.
                    self.pool.clone_slot(nxt, here);
                    self.pool.clone_slot(nxt.offset(4), here);
                    self.pool.clone_slot(nxt.offset(5), here);
                    self.pool.get_mut(here).constrain_zero(base);
                    // Types 2, 4 inherit x0 = 0.
                    self.pool.clone_slot(nxt.offset(1), here);
                    self.pool.clone_slot(nxt.offset(3), here);
                    self.pool.get_mut(here).constrain_zero(base + 1);
                    // Type 3 inherits x0 = x1 = 0.
                    self.pool.clone_slot(nxt.offset(2), here);
                    self.pool.get_mut(here).constrain_zero(base + 2);
                } else {
                    self.next_slot[level + 1] = nxt.offset(3);
                    self.pool.clone_slot(nxt, here);
                    self.pool.get_mut(here).constrain_zero(base);
                    self.pool.clone_slot(nxt.offset(1), here);
                    self.pool.get_mut(here).constrain_zero(base + 1);
                    self.pool.clone_slot(nxt.offset(2), here);
                    self.pool.get_mut(here).constrain_zero(base + 2);
                }
            } else {
                self.next_slot[level + 1] = nxt.offset(1);
                self.pool.clone_slot(nxt, here);
                self.pool.get_mut(here).constrain_zero(2 * self.n_tets + idx);
            }
            return;
        }

        // Zero constraints go first: they are cheaper and may end feasibility early.
        if idx < self.n_tets {
            let base = 3 * idx;
            let slot: SlotId = nxt.offset(usize::from(t) - 1);
            self.lp_slot[level + 1] = slot;
            let lp = self.pool.get_mut(slot);
            match t {
                1 => {
                    lp.constrain_zero(base + 1);
                    lp.constrain_zero(base + 2);
                    lp.constrain_positive(base);
                }
                2 => {
                    lp.constrain_zero(base + 2);
                    lp.constrain_positive(base + 1);
                }
                3 => lp.constrain_positive(base + 2),
                4 => lp.constrain_oct(base + 1, base + 2),
                5 => {
                    lp.constrain_zero(base + 1);
                    lp.constrain_oct(base, base + 2);
                }
                6 => {
                    lp.constrain_zero(base + 2);
                    lp.constrain_oct(base, base + 1);
                }
                _ => unreachable!("quad type {t} passed the range check"),
            }
        } else {
            self.lp_slot[level + 1] = nxt;
            self.pool.get_mut(nxt).constrain_positive(2 * self.n_tets + idx);
        }
    }
}

impl<C, B> Deref for TreeEnumeration<C, B> {
    type Target = TreeTraversal<C, B>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}
