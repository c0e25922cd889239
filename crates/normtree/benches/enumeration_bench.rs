//! Criterion benches for full vertex enumeration (group "enumerate").
//!
//! - Named one-tetrahedron examples in all four coordinate systems.
//! - Random closed orientable triangulations (2-3 tetrahedra) in quad and
//!   standard coordinates, drawn from fixed replay tokens so runs are stable.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use normtree::prelude::*;
use normtree::triangulation::rand::{random_triangulation, RandomCfg, ReplayToken};

fn count(tri: &Arc<Triangulation>, coords: NormalCoords) -> usize {
    let mut e = TreeEnumeration::<NoConstraint, BanNone>::new(Arc::clone(tri), coords)
        .expect("supported coordinates");
    while e.next() {}
    e.solutions()
}

fn bench_named(c: &mut Criterion) {
    let mut group = c.benchmark_group("enumerate");
    for name in ["single-tet", "lst-123", "folded-sphere"] {
        let tri = Arc::new(special::by_name(name).expect("named example"));
        for coords in [
            NormalCoords::Quad,
            NormalCoords::Standard,
            NormalCoords::QuadOct,
            NormalCoords::AlmostNormal,
        ] {
            group.bench_function(BenchmarkId::new(name, coords), |b| b.iter(|| count(&tri, coords)));
        }
    }
    group.finish();
}

fn bench_random(c: &mut Criterion) {
    let mut group = c.benchmark_group("enumerate_random");
    group.sample_size(20);
    for tets in [2usize, 3] {
        let cfg = RandomCfg {
            tets,
            boundary_faces: 0,
            orientable: true,
        };
        for coords in [NormalCoords::Quad, NormalCoords::Standard] {
            group.bench_function(BenchmarkId::new(format!("closed{tets}"), coords), |b| {
                b.iter_batched(
                    || ReplayToken { seed: 17, index: 0 },
                    |mut tok| {
                        tok.index = tok.index.wrapping_add(1);
                        let tri = Arc::new(random_triangulation(cfg, tok));
                        count(&tri, coords)
                    },
                    BatchSize::SmallInput,
                )
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_named, bench_random);
criterion_main!(benches);
