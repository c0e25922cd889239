//! JSON rendering of search results.

use normtree::prelude::*;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SurfaceRecord {
    /// Slot-ordered type vector, one digit per slot.
    pub types: String,
    /// Exact coordinates as decimal strings.
    pub vector: Vec<String>,
    pub euler_char: Option<String>,
    pub octagon: Option<(usize, usize)>,
    pub real_boundary: bool,
}

impl SurfaceRecord {
    pub fn new(types: String, s: &NormalSurface) -> Self {
        Self {
            types,
            vector: s.vector().iter().map(ToString::to_string).collect(),
            euler_char: s.euler_char().map(|x| x.to_string()),
            octagon: s.octagon(),
            real_boundary: s.has_real_boundary(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchReport {
    pub coords: &'static str,
    pub constraint: &'static str,
    pub ban: &'static str,
    pub tetrahedra: usize,
    pub visited: usize,
    pub constraints_broken: bool,
    /// False if the search stopped early (limit or time budget).
    pub complete: bool,
    pub surfaces: Vec<SurfaceRecord>,
}
