//! Normal and almost normal surface search by LP-guided tree traversal.
//!
//! A surface in a triangulated 3-manifold is a non-negative integer vector (one
//! entry per disc type) satisfying the matching equations and the quadrilateral
//! constraints. The searches in `traversal` walk a tree of type vectors and use
//! exact dual-simplex feasibility tests (`lp`) to prune it.
//!
//! API Policy
//! - The crate is consumed by the `cli` crate and by tests/benches. There is no
//!   stable public API; breaking changes are fine when they improve the design.

pub mod ban;
pub mod constraint;
pub mod coords;
pub mod equations;
pub mod lp;
pub mod surface;
pub mod traversal;
pub mod triangulation;
pub mod trie;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use coords::NormalCoords;
pub use surface::NormalSurface;
pub use traversal::{TraversalError, TreeEnumeration, TreeSingleSoln};
pub use triangulation::{Triangulation, TriangulationError};

/// Common exports for callers running searches.
pub mod prelude {
    pub use crate::ban::{BanBoundary, BanNone, BanPolicy, BanTorusBoundary};
    pub use crate::constraint::{EulerPositive, EulerZero, LpConstraint, NoConstraint};
    pub use crate::coords::NormalCoords;
    pub use crate::surface::NormalSurface;
    pub use crate::traversal::{
        Branching, CancelToken, SingleSolnCfg, TraversalError, TreeEnumeration, TreeSingleSoln,
    };
    pub use crate::triangulation::{special, Perm4, Triangulation};
}
