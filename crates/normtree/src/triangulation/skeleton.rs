//! Edges, triangles, vertices and boundary components of a triangulation.

use super::perm::{Perm4, EDGE_NUMBER, EDGE_VERTICES};
use super::Triangulation;

const UNSET: usize = usize::MAX;

/// One appearance of an edge inside a tetrahedron.
///
/// `perm(0), perm(1)` are the edge's endpoints in `tet`. Consecutive embeddings
/// of an edge are adjacent: face `perm(2)` of one is glued to face `perm(3)` of
/// the next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgeEmbedding {
    pub tet: usize,
    pub perm: Perm4,
}

#[derive(Clone, Debug)]
pub struct Edge {
    /// Embeddings in cyclic (or, for boundary edges, linear) order.
    pub embeddings: Vec<EdgeEmbedding>,
    pub boundary: bool,
    /// False if the edge is identified with itself in reverse.
    pub valid: bool,
}

/// A triangle of the triangulation: one or two `(tet, face)` appearances.
#[derive(Clone, Debug)]
pub struct Triangle {
    pub embeddings: Vec<(usize, usize)>,
}

impl Triangle {
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.embeddings.len() == 1
    }
}

#[derive(Clone, Debug)]
pub struct Vertex {
    /// `(tet, vertex)` appearances.
    pub embeddings: Vec<(usize, usize)>,
    pub boundary: bool,
}

/// A connected union of boundary triangles joined along boundary edges.
#[derive(Clone, Debug)]
pub struct BoundaryComponent {
    pub triangles: Vec<usize>,
    pub edges: Vec<usize>,
    pub vertices: Vec<usize>,
    /// Whether the surface itself is orientable, regardless of the 3-manifold.
    pub orientable: bool,
}

impl BoundaryComponent {
    pub fn euler_char(&self) -> i64 {
        self.vertices.len() as i64 - self.edges.len() as i64 + self.triangles.len() as i64
    }
}

#[derive(Clone, Debug)]
pub struct Skeleton {
    pub edges: Vec<Edge>,
    pub triangles: Vec<Triangle>,
    pub vertices: Vec<Vertex>,
    pub boundary_components: Vec<BoundaryComponent>,
    pub orientable: bool,
    /// Edge id of each tetrahedron edge, indexed by edge number.
    pub tet_edge: Vec<[usize; 6]>,
    /// Triangle id of each tetrahedron face.
    pub tet_triangle: Vec<[usize; 4]>,
    /// Vertex id of each tetrahedron vertex.
    pub tet_vertex: Vec<[usize; 4]>,
}

impl Skeleton {
    pub(super) fn build(tri: &Triangulation) -> Self {
        let (edges, tet_edge) = build_edges(tri);
        let (triangles, tet_triangle) = build_triangles(tri);
        let (vertices, tet_vertex) = build_vertices(tri);
        let mut boundary_components =
            build_boundary_components(&triangles, &tet_edge, &tet_vertex, edges.len());
        orient_boundary(&edges, &tet_triangle, &mut boundary_components);
        Self {
            edges,
            triangles,
            vertices,
            boundary_components,
            orientable: orientable(tri),
            tet_edge,
            tet_triangle,
            tet_vertex,
        }
    }

    /// Boundary component containing vertex `v`, if any.
    pub fn vertex_component(&self, v: usize) -> Option<usize> {
        self.boundary_components
            .iter()
            .position(|c| c.vertices.contains(&v))
    }
}

/// Step across face `perm(cross)` of the embedding, keeping the edge endpoints in
/// slots 0,1 and swapping slots 2,3 so that the face we arrive through is `new(3)`
/// when `cross == 2` (and `new(2)` when `cross == 3`).
fn step(tri: &Triangulation, tet: usize, perm: Perm4, cross: usize) -> Option<EdgeEmbedding> {
    let g = tri.adjacent(tet, perm.apply(cross))?;
    let img = [
        g.perm.apply(perm.apply(0)) as u8,
        g.perm.apply(perm.apply(1)) as u8,
        g.perm.apply(perm.apply(3)) as u8,
        g.perm.apply(perm.apply(2)) as u8,
    ];
    let perm = Perm4::new(img)?;
    Some(EdgeEmbedding { tet: g.tet, perm })
}

fn build_edges(tri: &Triangulation) -> (Vec<Edge>, Vec<[usize; 6]>) {
    let n = tri.size();
    let mut tet_edge = vec![[UNSET; 6]; n];
    // First endpoint seen for each tetrahedron edge; detects reversed identifications.
    let mut head = vec![[UNSET; 6]; n];
    let mut edges = Vec::new();

    for t in 0..n {
        for e in 0..6 {
            if tet_edge[t][e] != UNSET {
                continue;
            }
            let id = edges.len();
            let [a, b] = EDGE_VERTICES[e];
            let start = EdgeEmbedding {
                tet: t,
                perm: Perm4::edge_start(a, b),
            };
            tet_edge[t][e] = id;
            head[t][e] = a;

            let mut valid = true;
            let mut boundary = false;
            let mut seen = vec![(t, a, b)];
            let mut forward = vec![start];
            let mut backward = Vec::new();

            for (cross, out) in [(2usize, &mut forward), (3usize, &mut backward)] {
                if cross == 3 && !boundary {
                    break;
                }
                let mut cur = start;
                loop {
                    let Some(next) = step(tri, cur.tet, cur.perm, cross) else {
                        boundary = true;
                        break;
                    };
                    let (p0, p1) = (next.perm.apply(0), next.perm.apply(1));
                    if seen.contains(&(next.tet, p0, p1)) {
                        break;
                    }
                    seen.push((next.tet, p0, p1));
                    let ne = EDGE_NUMBER[p0][p1];
                    if tet_edge[next.tet][ne] == id {
                        if head[next.tet][ne] != p0 {
                            valid = false;
                        }
                    } else {
                        tet_edge[next.tet][ne] = id;
                        head[next.tet][ne] = p0;
                        out.push(next);
                    }
                    cur = next;
                }
            }

            backward.reverse();
            backward.extend(forward);
            edges.push(Edge {
                embeddings: backward,
                boundary,
                valid,
            });
        }
    }
    (edges, tet_edge)
}

fn build_triangles(tri: &Triangulation) -> (Vec<Triangle>, Vec<[usize; 4]>) {
    let n = tri.size();
    let mut tet_triangle = vec![[UNSET; 4]; n];
    let mut triangles = Vec::new();
    for t in 0..n {
        for f in 0..4 {
            if tet_triangle[t][f] != UNSET {
                continue;
            }
            let id = triangles.len();
            tet_triangle[t][f] = id;
            let mut embeddings = vec![(t, f)];
            if let Some(g) = tri.adjacent(t, f) {
                let gf = g.perm.apply(f);
                tet_triangle[g.tet][gf] = id;
                embeddings.push((g.tet, gf));
            }
            triangles.push(Triangle { embeddings });
        }
    }
    (triangles, tet_triangle)
}

fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[ra.max(rb)] = ra.min(rb);
    }
}

fn build_vertices(tri: &Triangulation) -> (Vec<Vertex>, Vec<[usize; 4]>) {
    let n = tri.size();
    let mut parent: Vec<usize> = (0..4 * n).collect();
    for t in 0..n {
        for f in 0..4 {
            if let Some(g) = tri.adjacent(t, f) {
                for v in (0..4).filter(|&v| v != f) {
                    union(&mut parent, 4 * t + v, 4 * g.tet + g.perm.apply(v));
                }
            }
        }
    }

    let mut tet_vertex = vec![[UNSET; 4]; n];
    let mut vertices: Vec<Vertex> = Vec::new();
    let mut root_id = vec![UNSET; 4 * n];
    for t in 0..n {
        for v in 0..4 {
            let root = find(&mut parent, 4 * t + v);
            if root_id[root] == UNSET {
                root_id[root] = vertices.len();
                vertices.push(Vertex {
                    embeddings: Vec::new(),
                    boundary: false,
                });
            }
            let id = root_id[root];
            tet_vertex[t][v] = id;
            let vertex = &mut vertices[id];
            vertex.embeddings.push((t, v));
            if (0..4).any(|f| f != v && tri.adjacent(t, f).is_none()) {
                vertex.boundary = true;
            }
        }
    }
    (vertices, tet_vertex)
}

fn build_boundary_components(
    triangles: &[Triangle],
    tet_edge: &[[usize; 6]],
    tet_vertex: &[[usize; 4]],
    n_edges: usize,
) -> Vec<BoundaryComponent> {
    let boundary: Vec<usize> = (0..triangles.len())
        .filter(|&i| triangles[i].is_boundary())
        .collect();
    let face_edges = |tri_id: usize| -> [usize; 3] {
        let (t, f) = triangles[tri_id].embeddings[0];
        let mut out = [0; 3];
        let mut k = 0;
        for (e, [a, b]) in EDGE_VERTICES.iter().enumerate() {
            if *a != f && *b != f {
                out[k] = tet_edge[t][e];
                k += 1;
            }
        }
        out
    };

    // Union boundary triangles sharing an edge.
    let mut parent: Vec<usize> = (0..boundary.len()).collect();
    let mut first_on_edge = vec![UNSET; n_edges];
    for (k, &tri_id) in boundary.iter().enumerate() {
        for e in face_edges(tri_id) {
            if first_on_edge[e] == UNSET {
                first_on_edge[e] = k;
            } else {
                union(&mut parent, first_on_edge[e], k);
            }
        }
    }

    let mut comp_of_root = vec![UNSET; boundary.len()];
    let mut components: Vec<BoundaryComponent> = Vec::new();
    for (k, &tri_id) in boundary.iter().enumerate() {
        let root = find(&mut parent, k);
        if comp_of_root[root] == UNSET {
            comp_of_root[root] = components.len();
            components.push(BoundaryComponent {
                triangles: Vec::new(),
                edges: Vec::new(),
                vertices: Vec::new(),
                orientable: true,
            });
        }
        let comp = &mut components[comp_of_root[root]];
        comp.triangles.push(tri_id);
        for e in face_edges(tri_id) {
            if !comp.edges.contains(&e) {
                comp.edges.push(e);
            }
        }
        let (t, f) = triangles[tri_id].embeddings[0];
        for v in (0..4).filter(|&v| v != f) {
            let id = tet_vertex[t][v];
            if !comp.vertices.contains(&id) {
                comp.vertices.push(id);
            }
        }
    }
    components
}

/// Direction a boundary face induces on its edge `a -> b` when the face's
/// vertices are oriented in ascending order.
fn edge_direction(face: usize, a: usize, b: usize) -> i32 {
    let c = (0..4).find(|&v| v != face && v != a && v != b).unwrap_or(face);
    let inversions = usize::from(a > b) + usize::from(a > c) + usize::from(b > c);
    if inversions % 2 == 0 {
        1
    } else {
        -1
    }
}

/// Two-colour the boundary triangles of each component so that triangles meeting
/// along a boundary edge induce opposite directions on it.
///
/// The two boundary faces at a boundary edge are face `perm(3)` of its first
/// embedding and face `perm(2)` of its last, with `perm(0)` tracking the same
/// endpoint throughout.
fn orient_boundary(
    edges: &[Edge],
    tet_triangle: &[[usize; 4]],
    components: &mut [BoundaryComponent],
) {
    let n_triangles = tet_triangle.len() * 4;
    // Boundary triangle pairs across each boundary edge, with the sign relating
    // their ascending-order orientations.
    let mut adjacent: Vec<Vec<(usize, i32)>> = vec![Vec::new(); n_triangles];
    for edge in edges.iter().filter(|e| e.boundary) {
        let (Some(first), Some(last)) = (edge.embeddings.first(), edge.embeddings.last()) else {
            continue;
        };
        let fa = first.perm.apply(3);
        let fb = last.perm.apply(2);
        let a = tet_triangle[first.tet][fa];
        let b = tet_triangle[last.tet][fb];
        let rel = -edge_direction(fa, first.perm.apply(0), first.perm.apply(1))
            * edge_direction(fb, last.perm.apply(0), last.perm.apply(1));
        adjacent[a].push((b, rel));
        adjacent[b].push((a, rel));
    }

    let mut colour = vec![0i32; n_triangles];
    for comp in components.iter_mut() {
        let Some(&start) = comp.triangles.first() else {
            continue;
        };
        colour[start] = 1;
        let mut stack = vec![start];
        while let Some(t) = stack.pop() {
            for &(u, rel) in &adjacent[t] {
                let want = rel * colour[t];
                if colour[u] == 0 {
                    colour[u] = want;
                    stack.push(u);
                } else if colour[u] != want {
                    comp.orientable = false;
                }
            }
        }
    }
}

/// Consistent orientation exists iff every gluing reverses the induced orientations.
fn orientable(tri: &Triangulation) -> bool {
    let n = tri.size();
    let mut orient = vec![0i32; n];
    for s in 0..n {
        if orient[s] != 0 {
            continue;
        }
        orient[s] = 1;
        let mut stack = vec![s];
        while let Some(t) = stack.pop() {
            for f in 0..4 {
                let Some(g) = tri.adjacent(t, f) else {
                    continue;
                };
                let want = -g.perm.sign() * orient[t];
                if orient[g.tet] == 0 {
                    orient[g.tet] = want;
                    stack.push(g.tet);
                } else if orient[g.tet] != want {
                    return false;
                }
            }
        }
    }
    true
}
