//! Small named triangulations used by tests, benches and the CLI.

use super::{Perm4, Triangulation};

/// A single tetrahedron with all four faces on the boundary (a 3-ball).
pub fn single_tet() -> Triangulation {
    Triangulation::new(1)
}

/// The one-tetrahedron layered solid torus LST(1,2,3).
///
/// Face 0 is glued to face 3 by `0→3, 1→0, 2→1, 3→2`; faces 1 and 2 form a
/// two-triangle torus boundary.
pub fn lst_123() -> Triangulation {
    glued(1, &[(0, 0, 0, [3, 0, 1, 2])])
}

/// One tetrahedron whose faces 3 and 2 are glued so that edge 01 meets itself
/// in reverse. The result has an invalid edge.
pub fn twisted_edge() -> Triangulation {
    glued(1, &[(0, 3, 0, [1, 0, 3, 2])])
}

/// A closed one-tetrahedron 3-sphere: faces 0,1 folded together about edge 23
/// and faces 2,3 about edge 01.
pub fn folded_sphere() -> Triangulation {
    glued(1, &[(0, 0, 0, [1, 0, 2, 3]), (0, 2, 0, [0, 1, 3, 2])])
}

/// Two tetrahedra glued along a single face (a 3-ball with six boundary triangles).
pub fn two_tet_ball() -> Triangulation {
    glued(2, &[(0, 3, 1, [0, 1, 2, 3])])
}

/// Look up a named example.
pub fn by_name(name: &str) -> Option<Triangulation> {
    match name {
        "single-tet" => Some(single_tet()),
        "lst-123" => Some(lst_123()),
        "twisted-edge" => Some(twisted_edge()),
        "folded-sphere" => Some(folded_sphere()),
        "two-tet-ball" => Some(two_tet_ball()),
        _ => None,
    }
}

/// Names accepted by [`by_name`].
pub const NAMES: [&str; 5] = [
    "single-tet",
    "lst-123",
    "twisted-edge",
    "folded-sphere",
    "two-tet-ball",
];

fn glued(n: usize, gluings: &[(usize, usize, usize, [u8; 4])]) -> Triangulation {
    let mut tri = Triangulation::new(n);
    for &(t, f, u, img) in gluings {
        let perm = Perm4::new(img).expect("built-in gluing permutation");
        tri.join(t, f, u, perm).expect("built-in gluing");
    }
    tri
}
