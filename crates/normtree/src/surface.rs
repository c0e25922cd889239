//! Normal and almost normal surfaces as coordinate vectors.

use std::fmt;
use std::sync::Arc;

use nalgebra::DMatrix;
use num_bigint::BigInt;
use num_traits::Zero;

use crate::coords::NormalCoords;
use crate::equations::{euler_coefficients, Disc};
use crate::triangulation::Triangulation;

/// A surface: one non-negative integer per disc type, in `coords` layout.
#[derive(Clone, Debug)]
pub struct NormalSurface {
    tri: Arc<Triangulation>,
    coords: NormalCoords,
    vector: Vec<BigInt>,
}

impl NormalSurface {
    pub fn new(tri: Arc<Triangulation>, coords: NormalCoords, vector: Vec<BigInt>) -> Self {
        debug_assert_eq!(vector.len(), coords.per_tet() * tri.size());
        Self {
            tri,
            coords,
            vector,
        }
    }

    #[inline]
    pub fn coords(&self) -> NormalCoords {
        self.coords
    }

    #[inline]
    pub fn vector(&self) -> &[BigInt] {
        &self.vector
    }

    #[inline]
    pub fn triangulation(&self) -> &Triangulation {
        &self.tri
    }

    /// Triangle count at vertex `v` of tetrahedron `t`, if triangles are stored.
    pub fn triangles(&self, t: usize, v: usize) -> Option<&BigInt> {
        self.coords
            .stores_triangles()
            .then(|| &self.vector[t * self.coords.per_tet() + v])
    }

    pub fn quads(&self, t: usize, q: usize) -> &BigInt {
        &self.vector[t * self.coords.per_tet() + self.coords.quad_offset() + q]
    }

    pub fn octs(&self, t: usize, k: usize) -> Option<&BigInt> {
        let off = self.coords.oct_offset()?;
        Some(&self.vector[t * self.coords.per_tet() + off + k])
    }

    /// `(tet, type)` of the first non-zero octagon coordinate.
    pub fn octagon(&self) -> Option<(usize, usize)> {
        (0..self.tri.size())
            .flat_map(|t| (0..3).map(move |k| (t, k)))
            .find(|&(t, k)| self.octs(t, k).is_some_and(|x| !x.is_zero()))
    }

    pub fn is_empty(&self) -> bool {
        self.vector.iter().all(Zero::is_zero)
    }

    /// Euler characteristic; `None` in quad-only systems.
    pub fn euler_char(&self) -> Option<BigInt> {
        let obj = euler_coefficients(&self.tri, self.coords)?;
        Some(
            obj.iter()
                .zip(&self.vector)
                .map(|(&c, x)| BigInt::from(c) * x)
                .sum(),
        )
    }

    /// Does some disc present in the surface meet a boundary triangle?
    pub fn has_real_boundary(&self) -> bool {
        let block = Disc::block(self.coords);
        let per = self.coords.per_tet();
        (0..self.tri.size()).any(|t| {
            (0..4)
                .filter(|&f| self.tri.adjacent(t, f).is_none())
                .any(|f| {
                    block
                        .iter()
                        .enumerate()
                        .any(|(i, d)| d.meets_face(f) && !self.vector[t * per + i].is_zero())
                })
        })
    }

    /// Does the vector satisfy every row of `eqns`?
    pub fn satisfies(&self, eqns: &DMatrix<i64>) -> bool {
        if eqns.ncols() != self.vector.len() {
            return false;
        }
        (0..eqns.nrows()).all(|r| {
            let s: BigInt = self
                .vector
                .iter()
                .enumerate()
                .filter(|(c, _)| eqns[(r, *c)] != 0)
                .map(|(c, x)| BigInt::from(eqns[(r, c)]) * x)
                .sum();
            s.is_zero()
        })
    }
}

impl PartialEq for NormalSurface {
    fn eq(&self, other: &Self) -> bool {
        self.coords == other.coords && self.vector == other.vector
    }
}

impl Eq for NormalSurface {}

impl fmt::Display for NormalSurface {
    /// Coordinates separated by spaces, tetrahedra separated by ` ; `.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let per = self.coords.per_tet();
        for (i, x) in self.vector.iter().enumerate() {
            if i > 0 {
                f.write_str(if i % per == 0 { " ; " } else { " " })?;
            }
            write!(f, "{x}")?;
        }
        Ok(())
    }
}
