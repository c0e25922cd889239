//! Trie of accepted type vectors, answering domination queries.
//!
//! A stored vector `e` is dominated by a query `v` when every non-zero entry of
//! `e` equals the entry of `v` in the same position. Trailing zeros are not
//! stored, so vectors of different lengths compare as if zero-padded.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
struct Node<const N: usize> {
    child: [Option<u32>; N],
    element_here: bool,
}

impl<const N: usize> Default for Node<N> {
    fn default() -> Self {
        Self {
            child: [None; N],
            element_here: false,
        }
    }
}

/// Type vectors over the alphabet `0..N`, stored in an arena.
#[derive(Clone, Debug)]
pub struct TypeTrie<const N: usize> {
    nodes: Vec<Node<N>>,
}

impl<const N: usize> Default for TypeTrie<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TypeTrie<N> {
    const ROOT: usize = 0;

    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }

    /// Remove every stored vector.
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[Self::ROOT] = Node::default();
    }

    pub fn is_empty(&self) -> bool {
        let root = &self.nodes[Self::ROOT];
        !root.element_here && root.child.iter().all(Option::is_none)
    }

    /// Store `vec`. Every entry must be below `N`.
    pub fn insert(&mut self, vec: &[u8]) {
        let len = stripped_len(vec);
        let mut node = Self::ROOT;
        for &t in &vec[..len] {
            let t = usize::from(t);
            debug_assert!(t < N, "type {t} out of range for a {N}-type trie");
            node = match self.nodes[node].child[t] {
                Some(next) => next as usize,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[node].child[t] = Some(next as u32);
                    next
                }
            };
        }
        self.nodes[node].element_here = true;
    }

    /// Is some stored vector dominated by `vec`?
    pub fn dominates(&self, vec: &[u8]) -> bool {
        let len = stripped_len(vec);
        let mut stack = vec![(Self::ROOT, 0usize)];
        while let Some((node, level)) = stack.pop() {
            let here = &self.nodes[node];
            if here.element_here {
                return true;
            }
            if level >= len {
                continue;
            }
            let t = usize::from(vec[level]);
            if t != 0 {
                if let Some(next) = here.child[t] {
                    stack.push((next as usize, level + 1));
                }
            }
            if let Some(next) = here.child[0] {
                stack.push((next as usize, level + 1));
            }
        }
        false
    }

    fn same_shape(&self, a: usize, other: &Self, b: usize) -> bool {
        let (x, y) = (&self.nodes[a], &other.nodes[b]);
        x.element_here == y.element_here
            && x.child.iter().zip(&y.child).all(|(p, q)| match (p, q) {
                (None, None) => true,
                (Some(p), Some(q)) => self.same_shape(*p as usize, other, *q as usize),
                _ => false,
            })
    }
}

#[inline]
fn stripped_len(vec: &[u8]) -> usize {
    vec.iter().rposition(|&t| t != 0).map_or(0, |i| i + 1)
}

impl<const N: usize> PartialEq for TypeTrie<N> {
    /// Equal when both store the same set of vectors.
    fn eq(&self, other: &Self) -> bool {
        self.same_shape(Self::ROOT, other, Self::ROOT)
    }
}

impl<const N: usize> Eq for TypeTrie<N> {}

impl<const N: usize> fmt::Display for TypeTrie<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if N == 1 {
            write!(f, "Trie for 1 type")
        } else {
            write!(f, "Trie for {N} types")
        }
    }
}
