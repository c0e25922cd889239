//! Triangulation input: a named example or a JSON gluing file.
//!
//! File format:
//! `{"tetrahedra": 1, "gluings": [{"tet": 0, "face": 0, "other": 0, "perm": [3, 0, 1, 2]}]}`
//! glues face `face` of `tet` to face `perm[face]` of `other`.

use anyhow::{anyhow, bail, Context, Result};
use normtree::triangulation::{special, Perm4, Triangulation};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GluingSpec {
    pub tet: usize,
    pub face: usize,
    pub other: usize,
    pub perm: [u8; 4],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriangulationFile {
    pub tetrahedra: usize,
    #[serde(default)]
    pub gluings: Vec<GluingSpec>,
}

impl TriangulationFile {
    pub fn build(&self) -> Result<Triangulation> {
        let mut tri = Triangulation::new(self.tetrahedra);
        for (i, g) in self.gluings.iter().enumerate() {
            let perm = Perm4::new(g.perm)
                .ok_or_else(|| anyhow!("gluing {i}: {:?} is not a permutation of 0..4", g.perm))?;
            tri.join(g.tet, g.face, g.other, perm)
                .with_context(|| format!("gluing {i}"))?;
        }
        Ok(tri)
    }
}

/// Resolve `--example` or `--input`; exactly one must be given.
pub fn load(example: Option<&str>, input: Option<&Path>) -> Result<Triangulation> {
    match (example, input) {
        (Some(name), None) => special::by_name(name).ok_or_else(|| {
            anyhow!(
                "unknown example `{name}` (known: {})",
                special::NAMES.join(", ")
            )
        }),
        (None, Some(path)) => {
            let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            let file: TriangulationFile = serde_json::from_slice(&bytes)
                .with_context(|| format!("parsing {}", path.display()))?;
            file.build()
                .with_context(|| format!("building triangulation from {}", path.display()))
        }
        (Some(_), Some(_)) => bail!("give either --example or --input, not both"),
        (None, None) => bail!("one of --example or --input is required"),
    }
}
