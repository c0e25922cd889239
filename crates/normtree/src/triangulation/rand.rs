//! Random triangulations (random face pairings + replay tokens).
//!
//! Model
//! - Shuffle the `4n` tetrahedron faces, leave the first `boundary_faces` unglued
//!   (rounded to keep the glued count even) and pair the rest consecutively.
//! - Each pair is glued by a uniformly chosen permutation sending one face to the
//!   other; with `orientable` set only odd permutations are used, so the result
//!   is orientable.
//! - Determinism uses a replay token `(seed, index)` mixed into a single RNG.

use super::{Perm4, Triangulation};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Replay token to make draws reproducible and indexable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayToken {
    pub seed: u64,
    pub index: u64,
}

impl ReplayToken {
    #[inline]
    fn to_std_rng(self) -> StdRng {
        // SplitMix64-style mixing.
        fn mix(mut x: u64) -> u64 {
            x ^= x >> 30;
            x = x.wrapping_mul(0xbf58476d1ce4e5b9);
            x ^= x >> 27;
            x = x.wrapping_mul(0x94d049bb133111eb);
            x ^ (x >> 31)
        }
        let k = mix(self.seed ^ mix(self.index.wrapping_add(0x9e3779b97f4a7c15)));
        StdRng::seed_from_u64(k)
    }
}

/// Random triangulation sampler configuration.
#[derive(Clone, Copy, Debug)]
pub struct RandomCfg {
    pub tets: usize,
    /// Faces left unglued; lowered by one if needed so the rest pair up.
    pub boundary_faces: usize,
    pub orientable: bool,
}

impl Default for RandomCfg {
    fn default() -> Self {
        Self {
            tets: 2,
            boundary_faces: 0,
            orientable: true,
        }
    }
}

/// Draw a random triangulation. Always succeeds; tetrahedra may end up disconnected.
pub fn random_triangulation(cfg: RandomCfg, tok: ReplayToken) -> Triangulation {
    let mut rng = tok.to_std_rng();
    let n = cfg.tets;
    let mut faces: Vec<(usize, usize)> = (0..n).flat_map(|t| (0..4).map(move |f| (t, f))).collect();
    faces.shuffle(&mut rng);

    let mut open = cfg.boundary_faces.min(faces.len());
    if (faces.len() - open) % 2 == 1 {
        open -= 1;
    }

    let mut tri = Triangulation::new(n);
    for pair in faces[open..].chunks_exact(2) {
        let (t, f) = pair[0];
        let (u, g) = pair[1];
        let choices: Vec<Perm4> = Perm4::all()
            .filter(|p| p.apply(f) == g && (!cfg.orientable || p.sign() < 0))
            .collect();
        let perm = choices[rng.gen_range(0..choices.len())];
        tri.join(t, f, u, perm)
            .expect("shuffled face pairing never reuses a face");
    }
    tri
}
