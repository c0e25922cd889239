//! Small shared types for the traversals: octagon state, cancellation,
//! configuration and errors.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::coords::NormalCoords;

/// Where the one permitted octagon type stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OctState {
    /// The coordinate system has no octagons.
    Unavailable,
    /// No level holds an octagon type yet.
    Free,
    /// The quad slot at this level holds the octagon type.
    Claimed(usize),
}

/// Cooperative cancellation flag shared with other threads.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// How the single-solution search picks the next quad slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Branching {
    /// The undecided quad with fewest feasible branches (ties by scan order).
    #[default]
    FewestFeasible,
    /// The next undecided slot in the current order.
    ScanOrder,
}

/// Single-solution search configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SingleSolnCfg {
    pub branching: Branching,
}

/// Errors raised when a traversal cannot be set up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraversalError {
    EmptyTriangulation,
    UnsupportedCoords {
        strategy: &'static str,
        coords: NormalCoords,
    },
    UnsupportedConstraint {
        constraint: &'static str,
        coords: NormalCoords,
    },
    UnsupportedBan {
        ban: &'static str,
        coords: NormalCoords,
    },
}

impl TraversalError {
    pub fn coords(strategy: &'static str, coords: NormalCoords) -> Self {
        Self::UnsupportedCoords { strategy, coords }
    }

    pub fn constraint(constraint: &'static str, coords: NormalCoords) -> Self {
        Self::UnsupportedConstraint { constraint, coords }
    }

    pub fn ban(ban: &'static str, coords: NormalCoords) -> Self {
        Self::UnsupportedBan { ban, coords }
    }
}

impl fmt::Display for TraversalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTriangulation => write!(f, "triangulation has no tetrahedra"),
            Self::UnsupportedCoords { strategy, coords } => {
                write!(f, "{strategy} does not support {coords} coordinates")
            }
            Self::UnsupportedConstraint { constraint, coords } => {
                write!(f, "constraint `{constraint}` does not support {coords} coordinates")
            }
            Self::UnsupportedBan { ban, coords } => {
                write!(f, "ban policy `{ban}` does not support {coords} coordinates")
            }
        }
    }
}

impl std::error::Error for TraversalError {}
