//! 3-manifold triangulations: tetrahedra glued along faces.
//!
//! Purpose
//! - Hold the combinatorial input of the surface searches: `n` tetrahedra whose
//!   faces are glued in pairs by vertex permutations, unglued faces forming the
//!   boundary.
//! - Derive (lazily, once per gluing state) the skeleton the searches consume:
//!   edges with ordered embeddings, triangles, vertices, boundary components.
//!
//! Conventions
//! - Face `f` of a tetrahedron is the face opposite vertex `f`.
//! - A gluing of face `f` of tetrahedron `t` to tetrahedron `u` is a permutation
//!   `p` mapping the vertices of `t` to the vertices of `u`, with `p(f)` the face
//!   of `u` being glued. The reverse gluing is `p⁻¹`.
//!
//! Code cross-refs: `equations` (matching equations), `ban` (boundary bans).

mod perm;
pub mod rand;
mod skeleton;
pub mod special;

pub use perm::{Perm4, EDGE_NUMBER, EDGE_VERTICES, QUAD_SEPARATING};
pub use skeleton::{BoundaryComponent, Edge, EdgeEmbedding, Skeleton, Triangle, Vertex};

use std::fmt;
use std::sync::OnceLock;

/// Where a face is glued: the adjacent tetrahedron and the vertex map into it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Gluing {
    pub tet: usize,
    pub perm: Perm4,
}

/// Errors raised while building a triangulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriangulationError {
    TetOutOfRange { tet: usize, size: usize },
    FaceOutOfRange { face: usize },
    FaceAlreadyGlued { tet: usize, face: usize },
    SelfGluing { tet: usize, face: usize },
}

impl fmt::Display for TriangulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TetOutOfRange { tet, size } => {
                write!(f, "tetrahedron {tet} out of range (size {size})")
            }
            Self::FaceOutOfRange { face } => write!(f, "face {face} out of range"),
            Self::FaceAlreadyGlued { tet, face } => {
                write!(f, "face {face} of tetrahedron {tet} is already glued")
            }
            Self::SelfGluing { tet, face } => {
                write!(f, "face {face} of tetrahedron {tet} cannot be glued to itself")
            }
        }
    }
}

impl std::error::Error for TriangulationError {}

/// A triangulation with `size()` tetrahedra and lazily computed skeleton.
#[derive(Clone, Debug, Default)]
pub struct Triangulation {
    adj: Vec<[Option<Gluing>; 4]>,
    skeleton: OnceLock<Skeleton>,
}

impl Triangulation {
    /// `n` tetrahedra with every face unglued.
    pub fn new(n: usize) -> Self {
        Self {
            adj: vec![[None; 4]; n],
            skeleton: OnceLock::new(),
        }
    }

    /// Build from a list of gluings `(tet, face, other, perm)`.
    pub fn from_gluings(
        n: usize,
        gluings: &[(usize, usize, usize, Perm4)],
    ) -> Result<Self, TriangulationError> {
        let mut tri = Self::new(n);
        for &(tet, face, other, perm) in gluings {
            tri.join(tet, face, other, perm)?;
        }
        Ok(tri)
    }

    /// Glue face `face` of `tet` to face `perm(face)` of `other`.
    pub fn join(
        &mut self,
        tet: usize,
        face: usize,
        other: usize,
        perm: Perm4,
    ) -> Result<(), TriangulationError> {
        let size = self.adj.len();
        for t in [tet, other] {
            if t >= size {
                return Err(TriangulationError::TetOutOfRange { tet: t, size });
            }
        }
        if face > 3 {
            return Err(TriangulationError::FaceOutOfRange { face });
        }
        let other_face = perm.apply(face);
        if tet == other && face == other_face {
            return Err(TriangulationError::SelfGluing { tet, face });
        }
        if self.adj[tet][face].is_some() {
            return Err(TriangulationError::FaceAlreadyGlued { tet, face });
        }
        if self.adj[other][other_face].is_some() {
            return Err(TriangulationError::FaceAlreadyGlued {
                tet: other,
                face: other_face,
            });
        }
        self.adj[tet][face] = Some(Gluing { tet: other, perm });
        self.adj[other][other_face] = Some(Gluing {
            tet,
            perm: perm.inverse(),
        });
        self.skeleton = OnceLock::new();
        Ok(())
    }

    /// Number of tetrahedra.
    #[inline]
    pub fn size(&self) -> usize {
        self.adj.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.adj.is_empty()
    }

    /// Gluing across face `face` of `tet`, or `None` for a boundary face.
    #[inline]
    pub fn adjacent(&self, tet: usize, face: usize) -> Option<Gluing> {
        self.adj[tet][face]
    }

    /// Skeleton of the current gluing state, computed on first use.
    pub fn skeleton(&self) -> &Skeleton {
        self.skeleton.get_or_init(|| Skeleton::build(self))
    }

    pub fn is_orientable(&self) -> bool {
        self.skeleton().orientable
    }

    /// True if no edge is identified with itself in reverse.
    pub fn is_valid(&self) -> bool {
        self.skeleton().edges.iter().all(|e| e.valid)
    }

    pub fn has_boundary_triangles(&self) -> bool {
        self.skeleton().triangles.iter().any(|t| t.is_boundary())
    }
}
