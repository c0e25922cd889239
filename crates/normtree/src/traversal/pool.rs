//! Fixed pool of tableaux addressed by slot.

use std::sync::Arc;

use crate::lp::{LpData, LpInitialTableaux};

/// Index of a tableau in the pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct SlotId(pub usize);

impl SlotId {
    #[inline]
    pub fn offset(self, k: usize) -> Self {
        Self(self.0 + k)
    }
}

/// Every tableau the search will ever need, reserved up front.
#[derive(Clone, Debug)]
pub struct TableauPool {
    lps: Vec<LpData>,
}

impl TableauPool {
    pub fn new(orig: &Arc<LpInitialTableaux>, size: usize) -> Self {
        Self {
            lps: (0..size).map(|_| LpData::new(Arc::clone(orig))).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lps.is_empty()
    }

    #[inline]
    pub fn get(&self, slot: SlotId) -> &LpData {
        &self.lps[slot.0]
    }

    #[inline]
    pub fn get_mut(&mut self, slot: SlotId) -> &mut LpData {
        &mut self.lps[slot.0]
    }

    /// Make slot `dst` a copy of slot `src`.
    pub fn clone_slot(&mut self, dst: SlotId, src: SlotId) {
        debug_assert_ne!(dst, src);
        let (d, s) = if dst < src {
            let (lo, hi) = self.lps.split_at_mut(src.0);
            (&mut lo[dst.0], &hi[0])
        } else {
            let (lo, hi) = self.lps.split_at_mut(dst.0);
            (&mut hi[0], &lo[src.0])
        };
        d.init_clone(s);
    }
}
