//! Tree traversal over type vectors, pruned by exact linear programming.
//!
//! Purpose
//! - Walk a search tree whose levels fix one type per slot: a quad slot per
//!   tetrahedron (which quad is non-zero, or which octagon) and, in standard
//!   systems, a triangle slot per triangle coordinate (zero or positive).
//! - At every node keep a dual-simplex tableau with the constraints implied so
//!   far, and prune as soon as it turns infeasible.
//!
//! Layout
//! - `TreeTraversal` holds what both searches share: the starting tableau, the
//!   ban policy, the type vector and its order, the tableau pool and the slot
//!   bookkeeping.
//! - `TreeEnumeration` (in `enumeration.rs`) lists every vertex surface, using a
//!   `TypeTrie` to skip dominated type vectors.
//! - `TreeSingleSoln` (in `single.rs`) looks for one non-trivial solution, with
//!   quad types 0 and 1 merged and a dynamic branching order.
//!
//! Slots
//! - Quad slot `i` owns tableau columns `3i..3i+3`; triangle slot `s >= n` owns
//!   column `2n + s`. Slot `i` is not tetrahedron `i`: the tableau's column
//!   permutation decides which tetrahedron sits where.
//! - Each level takes one pooled tableau for its first child (overwritten in
//!   place) and pre-clones the rest, so the pool size is fixed by the branching
//!   factors and never grows.

mod enumeration;
mod pool;
mod single;
mod types;

use std::marker::PhantomData;
use std::sync::Arc;

use nalgebra::DMatrix;
use num_bigint::BigInt;
use num_traits::Zero;

use crate::ban::BanPolicy;
use crate::constraint::LpConstraint;
use crate::coords::NormalCoords;
use crate::equations::matching_equations;
use crate::lp::{LpData, LpInitialTableaux};
use crate::surface::NormalSurface;
use crate::triangulation::Triangulation;

pub use enumeration::TreeEnumeration;
pub use pool::{SlotId, TableauPool};
pub use single::{repair_merged_quads, TreeSingleSoln};
pub use types::{Branching, CancelToken, OctState, SingleSolnCfg, TraversalError};

/// State shared by both tree searches.
#[derive(Debug)]
pub struct TreeTraversal<C, B> {
    orig: Arc<LpInitialTableaux>,
    tri: Arc<Triangulation>,
    coords: NormalCoords,
    ban: B,
    n_tets: usize,
    n_types: usize,
    /// Type of every slot, indexed by slot; one trailing zero.
    types: Vec<u8>,
    /// Slot decided at each level.
    type_order: Vec<usize>,
    level: usize,
    oct: OctState,
    pool: TableauPool,
    /// Tableau for the node at each depth; `lp_slot[level + 1]` is the node
    /// currently being examined.
    lp_slot: Vec<SlotId>,
    /// First reserved tableau for each level's pre-cloned siblings.
    next_slot: Vec<SlotId>,
    n_visited: usize,
    tmp: [LpData; 4],
    cancel: CancelToken,
    _constraint: PhantomData<fn() -> C>,
}

impl<C: LpConstraint, B: BanPolicy> TreeTraversal<C, B> {
    /// Can this constraint/ban combination run in `coords` at all?
    pub fn supported(coords: NormalCoords) -> bool {
        C::supported(coords) && B::supported(coords)
    }

    fn new(
        tri: Arc<Triangulation>,
        coords: NormalCoords,
        branches_per_quad: usize,
        branches_per_tri: usize,
        enumeration: bool,
    ) -> Result<Self, TraversalError> {
        if tri.is_empty() {
            return Err(TraversalError::EmptyTriangulation);
        }
        if !C::supported(coords) {
            return Err(TraversalError::constraint(C::NAME, coords));
        }
        if !B::supported(coords) {
            return Err(TraversalError::ban(B::NAME, coords));
        }

        let orig = Arc::new(LpInitialTableaux::new::<C>(&tri, coords, enumeration));
        let ban = B::new(&tri, &orig);
        let n_tets = tri.size();
        let n_types = if coords.stores_triangles() { 5 * n_tets } else { n_tets };
        // One tableau per level is reused in place; the +1 is the root.
        let n_tableaux = if coords.stores_triangles() {
            (branches_per_quad - 1) * n_tets + (branches_per_tri - 1) * 4 * n_tets + 1
        } else {
            (branches_per_quad - 1) * n_tets + 1
        };

        tracing::debug!(
            tets = n_tets,
            coords = %coords,
            constraint = C::NAME,
            ban = B::NAME,
            rank = orig.rank(),
            columns = orig.columns(),
            tableaux = n_tableaux,
            "tree traversal ready"
        );

        let mut next_slot = vec![SlotId(0); n_types + 1];
        next_slot[0] = SlotId(1);
        Ok(Self {
            pool: TableauPool::new(&orig, n_tableaux),
            tmp: std::array::from_fn(|_| LpData::new(Arc::clone(&orig))),
            orig,
            tri,
            coords,
            ban,
            n_tets,
            n_types,
            types: vec![0; n_types + 1],
            type_order: (0..n_types).collect(),
            level: 0,
            oct: if coords.stores_octagons() {
                OctState::Free
            } else {
                OctState::Unavailable
            },
            lp_slot: vec![SlotId(0); n_types + 1],
            next_slot,
            n_visited: 0,
            cancel: CancelToken::new(),
            _constraint: PhantomData,
        })
    }

    #[inline]
    pub fn coords(&self) -> NormalCoords {
        self.coords
    }

    #[inline]
    pub fn triangulation(&self) -> &Arc<Triangulation> {
        &self.tri
    }

    /// Number of slots (levels of the search tree).
    #[inline]
    pub fn n_types(&self) -> usize {
        self.n_types
    }

    /// Current type of every slot, in slot order.
    #[inline]
    pub fn types(&self) -> &[u8] {
        &self.types[..self.n_types]
    }

    /// Slots in the order the search decides them.
    #[inline]
    pub fn type_order(&self) -> &[usize] {
        &self.type_order
    }

    /// Tree nodes examined so far, root included.
    #[inline]
    pub fn visited(&self) -> usize {
        self.n_visited
    }

    /// Tableaux reserved for the search.
    #[inline]
    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    /// True if the extra constraints could not be installed and are ignored.
    #[inline]
    pub fn constraints_broken(&self) -> bool {
        self.orig.constraints_broken()
    }

    /// Handle for cancelling this search from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The current type vector, one digit per slot.
    pub fn type_string(&self) -> String {
        self.types().iter().map(|&t| char::from(b'0' + t)).collect()
    }

    /// Write `type_string()` to `out`.
    pub fn dump_types(&self, out: &mut impl std::fmt::Write) -> std::fmt::Result {
        out.write_str(&self.type_string())
    }

    /// Rough progress through the search tree, in `[0, 100]`.
    pub fn percent(&self) -> f64 {
        let mut percent = 0.0;
        let mut range = 100.0;
        let mut quads_remaining = self.n_tets;
        for (i, &idx) in self.type_order.iter().enumerate() {
            if range <= 0.01 {
                break;
            }
            let t = f64::from(self.types[idx]);
            if idx >= self.n_tets {
                range /= 2.0;
                percent += range * t;
                continue;
            }
            let den = (3 * quads_remaining + 4) as f64;
            let octagon_ahead = match self.oct {
                OctState::Free => true,
                OctState::Claimed(l) => l > i,
                OctState::Unavailable => false,
            };
            if self.oct == OctState::Claimed(i) {
                range /= den;
                percent += range * ((den - 3.0) + (t - 4.0));
            } else if octagon_ahead {
                range = range * (den - 3.0) / (4.0 * den);
                percent += range * t;
            } else {
                range /= 4.0;
                percent += range * t;
            }
            quads_remaining -= 1;
        }
        percent
    }

    /// Is `types[idx]` past the last value for its slot? Claims or frees the
    /// octagon on the way.
    fn out_of_range(&mut self, idx: usize) -> bool {
        match self.types[idx] {
            4 if self.oct == OctState::Free => {
                self.oct = OctState::Claimed(self.level);
                false
            }
            4 => true,
            7 => {
                self.oct = OctState::Free;
                true
            }
            2 => idx >= self.n_tets,
            _ => false,
        }
    }

    /// Move slot `next` to position `start` of the order, shifting the slots
    /// in between back by one.
    fn set_next_at(&mut self, start: usize, next: usize) {
        if let Some(pos) = self.type_order[start..].iter().position(|&s| s == next) {
            self.type_order[start..=start + pos].rotate_right(1);
        }
    }

    /// Decide slot `next` at the level after the current one.
    fn set_next(&mut self, next: usize) {
        self.set_next_at(self.level + 1, next);
    }

    /// First triangle slot at or after `start` whose column is not marked.
    fn next_unmarked_triangle_type(&self, start: usize) -> Option<usize> {
        (start..self.n_types).find(|&s| !self.ban.is_marked(2 * self.n_tets + s))
    }

    /// Start tableau, extra constraints, bans.
    fn prepare_root(orig: &LpInitialTableaux, ban: &B, lp: &mut LpData) {
        lp.init_start();
        if !orig.constraints_broken() {
            C::constrain(lp, orig.columns());
        }
        ban.enforce_bans(lp);
    }

    /// Set up the root tableau in slot 0; false if it is infeasible.
    fn start_root(&mut self) -> bool {
        let root = self.pool.get_mut(SlotId(0));
        Self::prepare_root(&self.orig, &self.ban, root);
        self.n_visited += 1;
        root.is_feasible()
    }

    /// How many of the four quad sub-branches (all zero, or only quad 0, 1 or
    /// 2 non-zero) of slot `quad` are feasible below the current node.
    pub fn feasible_branches(&mut self, quad: usize) -> usize {
        let src = self.pool.get(self.lp_slot[self.level + 1]);
        let [t0, t1, t2, t3] = &mut self.tmp;
        let base = 3 * quad;

        t0.init_clone(src);

        t1.init_clone(t0);
        t1.constrain_zero(base + 1);
        t1.constrain_zero(base + 2);
        t1.constrain_positive(base);

        t0.constrain_zero(base);
        if !t0.is_feasible() {
            return usize::from(t1.is_feasible());
        }

        t2.init_clone(t0);
        t2.constrain_zero(base + 2);
        t2.constrain_positive(base + 1);

        t0.constrain_zero(base + 1);
        if !t0.is_feasible() {
            return usize::from(t1.is_feasible()) + usize::from(t2.is_feasible());
        }

        t3.init_clone(t0);
        t3.constrain_positive(base + 2);

        t0.constrain_zero(base + 2);

        [&*t0, &*t1, &*t2, &*t3].iter().filter(|lp| lp.is_feasible()).count()
    }

    /// Surface for the leaf just reached.
    pub fn build_surface(&self) -> NormalSurface {
        self.surface_from(self.pool.get(self.lp_slot[self.n_types]), &self.types)
    }

    /// Read the solution of `lp` under `types`, restoring true octagon
    /// coordinates in almost normal systems.
    fn surface_from(&self, lp: &LpData, types: &[u8]) -> NormalSurface {
        let mut v = lp.extract_solution(types);
        if !self.coords.stores_octagons() {
            return NormalSurface::new(Arc::clone(&self.tri), self.coords, v);
        }

        let system = self.orig.system();
        let sys_per = system.per_tet();
        let quad_off = system.quad_offset();
        let per = self.coords.per_tet();
        let mut an = vec![BigInt::zero(); per * self.n_tets];
        for t in 0..self.n_tets {
            for j in 0..sys_per {
                an[per * t + j] = std::mem::take(&mut v[sys_per * t + j]);
            }
        }
        if let Some(slot) = (0..self.n_tets).find(|&i| types[i] >= 4) {
            let tet = self.orig.column_perm()[3 * slot] / sys_per;
            let k = usize::from(types[slot] - 4);
            let count = std::mem::take(&mut an[per * tet + quad_off + (k + 1) % 3]);
            for q in 0..3 {
                an[per * tet + quad_off + q].set_zero();
            }
            an[per * tet + sys_per + k] = count;
        }
        NormalSurface::new(Arc::clone(&self.tri), self.coords, an)
    }

    /// Does `surface` satisfy the matching equations and the extra constraints?
    ///
    /// `eqns` must be in the surface's coordinates; they are computed when absent.
    pub fn verify(&self, surface: &NormalSurface, eqns: Option<&DMatrix<i64>>) -> bool {
        let owned;
        let eqns = match eqns {
            Some(e) => e,
            None => {
                owned = matching_equations(surface.triangulation(), surface.coords());
                &owned
            }
        };
        surface.satisfies(eqns) && (self.constraints_broken() || C::verify(surface))
    }

    /// Slot-ordered type vector of `surface`, the inverse of the leaf encoding.
    ///
    /// `None` if the surface is in other coordinates or has two quad types in
    /// one tetrahedron.
    pub fn type_vector_of(&self, surface: &NormalSurface) -> Option<Vec<u8>> {
        if surface.coords() != self.coords || surface.triangulation().size() != self.n_tets {
            return None;
        }
        let perm = self.orig.column_perm();
        let sys_per = self.orig.system().per_tet();
        let mut types = vec![0u8; self.n_types];

        for (slot, ty) in types.iter_mut().enumerate().take(self.n_tets) {
            let tet = perm[3 * slot] / sys_per;
            let octs: Vec<usize> = (0..3)
                .filter(|&k| surface.octs(tet, k).is_some_and(|x| !x.is_zero()))
                .collect();
            let quads: Vec<usize> = (0..3).filter(|&q| !surface.quads(tet, q).is_zero()).collect();
            *ty = match (octs.as_slice(), quads.as_slice()) {
                ([], []) => 0,
                ([], [q]) => 1 + *q as u8,
                ([k], []) => 4 + *k as u8,
                _ => return None,
            };
        }
        if self.coords.stores_triangles() {
            for s in self.n_tets..self.n_types {
                let orig = perm[2 * self.n_tets + s];
                let present = surface
                    .triangles(orig / sys_per, orig % sys_per)
                    .is_some_and(|x| !x.is_zero());
                types[s] = u8::from(present);
            }
        }
        Some(types)
    }

    /// Rebuild the tableau for a complete type vector from the root and return
    /// its surface, if the leaf is feasible and non-zero.
    pub fn replay(&self, types: &[u8]) -> Option<NormalSurface> {
        if types.len() != self.n_types || types.iter().all(|&t| t == 0) {
            return None;
        }
        let n_octs = types[..self.n_tets].iter().filter(|&&t| t >= 4).count();
        if n_octs > usize::from(self.coords.stores_octagons()) {
            return None;
        }

        let mut lp = LpData::new(Arc::clone(&self.orig));
        Self::prepare_root(&self.orig, &self.ban, &mut lp);
        for (slot, &t) in types.iter().enumerate() {
            if slot < self.n_tets {
                let base = 3 * slot;
                match t {
                    0 => (0..3).for_each(|q| lp.constrain_zero(base + q)),
                    1..=3 => {
                        let keep = usize::from(t - 1);
                        (0..3).filter(|&q| q != keep).for_each(|q| lp.constrain_zero(base + q));
                        lp.constrain_positive(base + keep);
                    }
                    4..=6 => {
                        let k = usize::from(t - 4);
                        let (a, b) = ((k + 1) % 3, (k + 2) % 3);
                        lp.constrain_zero(base + k);
                        lp.constrain_oct(base + a.min(b), base + a.max(b));
                    }
                    _ => return None,
                }
            } else {
                let col = 2 * self.n_tets + slot;
                match t {
                    0 => lp.constrain_zero(col),
                    1 => lp.constrain_positive(col),
                    _ => return None,
                }
            }
        }

        let mut full = types.to_vec();
        full.push(0);
        lp.is_feasible().then(|| self.surface_from(&lp, &full))
    }
}

#[cfg(test)]
mod tests;
