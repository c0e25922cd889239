//! Permutations of the four vertices of a tetrahedron.

use std::fmt;

/// Vertex pairs of the six tetrahedron edges, indexed by edge number.
pub const EDGE_VERTICES: [[usize; 2]; 6] = [[0, 1], [0, 2], [0, 3], [1, 2], [1, 3], [2, 3]];

/// Edge number for an (unordered) pair of distinct vertices.
pub const EDGE_NUMBER: [[usize; 4]; 4] = [
    [usize::MAX, 0, 1, 2],
    [0, usize::MAX, 3, 4],
    [1, 3, usize::MAX, 5],
    [2, 4, 5, usize::MAX],
];

/// Quadrilateral type that separates the two given vertices from the other two.
///
/// Quad 0 splits {0,1} | {2,3}, quad 1 splits {0,2} | {1,3}, quad 2 splits {0,3} | {1,2}.
/// A quad meets edge `ab` exactly when it is *not* `QUAD_SEPARATING[a][b]`.
pub const QUAD_SEPARATING: [[usize; 4]; 4] = [
    [usize::MAX, 0, 1, 2],
    [0, usize::MAX, 2, 1],
    [1, 2, usize::MAX, 0],
    [2, 1, 0, usize::MAX],
];

/// A permutation of {0,1,2,3}, stored as its images.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Perm4([u8; 4]);

impl Perm4 {
    pub const IDENTITY: Perm4 = Perm4([0, 1, 2, 3]);

    /// Build from images; `None` unless `images` is a bijection of {0,1,2,3}.
    pub fn new(images: [u8; 4]) -> Option<Self> {
        let mut seen = [false; 4];
        for &i in &images {
            if i > 3 || seen[i as usize] {
                return None;
            }
            seen[i as usize] = true;
        }
        Some(Perm4(images))
    }

    /// Transposition swapping `a` and `b`.
    pub fn transposition(a: usize, b: usize) -> Self {
        let mut img = [0, 1, 2, 3];
        img.swap(a, b);
        Perm4(img)
    }

    /// All 24 permutations in lexicographic order of their images.
    pub fn all() -> impl Iterator<Item = Perm4> {
        (0..256u32).filter_map(|code| {
            let img = [
                ((code >> 6) & 3) as u8,
                ((code >> 4) & 3) as u8,
                ((code >> 2) & 3) as u8,
                (code & 3) as u8,
            ];
            Perm4::new(img)
        })
    }

    #[inline]
    pub fn images(self) -> [u8; 4] {
        self.0
    }

    #[inline]
    pub fn apply(self, i: usize) -> usize {
        self.0[i] as usize
    }

    pub fn inverse(self) -> Self {
        let mut img = [0u8; 4];
        for (i, &p) in self.0.iter().enumerate() {
            img[p as usize] = i as u8;
        }
        Perm4(img)
    }

    /// Composition `self ∘ other`, i.e. apply `other` first.
    pub fn compose(self, other: Perm4) -> Self {
        let mut img = [0u8; 4];
        for (i, slot) in img.iter_mut().enumerate() {
            *slot = self.0[other.0[i] as usize];
        }
        Perm4(img)
    }

    /// +1 for even permutations, -1 for odd.
    pub fn sign(self) -> i32 {
        let mut inversions = 0;
        for i in 0..4 {
            for j in (i + 1)..4 {
                if self.0[i] > self.0[j] {
                    inversions += 1;
                }
            }
        }
        if inversions % 2 == 0 {
            1
        } else {
            -1
        }
    }

    /// Permutation sending 0 ↦ a, 1 ↦ b and {2,3} to the remaining vertices in increasing order.
    pub(crate) fn edge_start(a: usize, b: usize) -> Self {
        let mut rest = (0..4u8).filter(|&v| v as usize != a && v as usize != b);
        let c = rest.next().unwrap_or(0);
        let d = rest.next().unwrap_or(0);
        Perm4([a as u8, b as u8, c, d])
    }
}

impl Default for Perm4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Display for Perm4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}{}", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_yields_24_distinct_with_balanced_signs() {
        let perms: Vec<_> = Perm4::all().collect();
        assert_eq!(perms.len(), 24);
        assert_eq!(perms.iter().filter(|p| p.sign() == 1).count(), 12);
        assert_eq!(perms[0], Perm4::IDENTITY);
    }

    #[test]
    fn inverse_and_compose_agree() {
        for p in Perm4::all() {
            assert_eq!(p.compose(p.inverse()), Perm4::IDENTITY);
            assert_eq!(p.inverse().compose(p), Perm4::IDENTITY);
        }
        let p = Perm4::new([3, 0, 1, 2]).unwrap();
        let q = Perm4::transposition(2, 3);
        assert_eq!(p.compose(q).images(), [3, 0, 2, 1]);
        assert_eq!(p.sign(), -1);
    }

    #[test]
    fn rejects_non_bijections() {
        assert!(Perm4::new([0, 0, 1, 2]).is_none());
        assert!(Perm4::new([0, 1, 2, 4]).is_none());
    }

    #[test]
    fn quad_separating_is_symmetric_and_pairs_opposite_edges() {
        for a in 0..4 {
            for b in 0..4 {
                if a == b {
                    continue;
                }
                assert_eq!(QUAD_SEPARATING[a][b], QUAD_SEPARATING[b][a]);
                let [c, d] = {
                    let mut rest = (0..4).filter(|&v| v != a && v != b);
                    [rest.next().unwrap(), rest.next().unwrap()]
                };
                assert_eq!(QUAD_SEPARATING[a][b], QUAD_SEPARATING[c][d]);
            }
        }
        for (e, [a, b]) in EDGE_VERTICES.iter().enumerate() {
            assert_eq!(EDGE_NUMBER[*a][*b], e);
            assert_eq!(EDGE_NUMBER[*b][*a], e);
        }
    }
}
