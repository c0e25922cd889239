//! Normal and almost normal coordinate systems.

use std::fmt;

/// Coordinate system of a surface vector and of a search.
///
/// Per tetrahedron: `Standard` stores 4 triangles then 3 quads, `Quad` stores 3
/// quads, `AlmostNormal` stores 4 triangles, 3 quads and 3 octagons, `QuadOct`
/// stores 3 quads and 3 octagons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NormalCoords {
    Standard,
    Quad,
    AlmostNormal,
    QuadOct,
}

impl NormalCoords {
    #[inline]
    pub fn stores_triangles(self) -> bool {
        matches!(self, Self::Standard | Self::AlmostNormal)
    }

    #[inline]
    pub fn stores_octagons(self) -> bool {
        matches!(self, Self::AlmostNormal | Self::QuadOct)
    }

    /// Coordinates per tetrahedron in a surface vector.
    pub fn per_tet(self) -> usize {
        match self {
            Self::Standard => 7,
            Self::Quad => 3,
            Self::AlmostNormal => 10,
            Self::QuadOct => 6,
        }
    }

    /// The system the tableau is built in: octagons are carried by quad columns.
    pub fn without_octagons(self) -> Self {
        match self {
            Self::AlmostNormal => Self::Standard,
            Self::QuadOct => Self::Quad,
            c => c,
        }
    }

    /// Offset of the first quad coordinate within a tetrahedron block.
    #[inline]
    pub fn quad_offset(self) -> usize {
        if self.stores_triangles() {
            4
        } else {
            0
        }
    }

    /// Offset of the first octagon coordinate within a tetrahedron block.
    pub fn oct_offset(self) -> Option<usize> {
        match self {
            Self::AlmostNormal => Some(7),
            Self::QuadOct => Some(3),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Quad => "quad",
            Self::AlmostNormal => "almost-normal",
            Self::QuadOct => "quad-oct",
        }
    }
}

impl fmt::Display for NormalCoords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
