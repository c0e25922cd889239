//! End-to-end searches on small triangulations with known answers, plus
//! structural checks (domination, replay, cancellation) on random inputs.

use std::sync::Arc;

use num_bigint::BigInt;
use proptest::prelude::*;

use super::*;
use crate::ban::{BanBoundary, BanNone, BanTorusBoundary};
use crate::constraint::{EulerPositive, EulerZero, NoConstraint};
use crate::triangulation::rand::{random_triangulation, RandomCfg, ReplayToken};
use crate::triangulation::special;

type Plain = TreeEnumeration<NoConstraint, BanNone>;

fn ints(v: &[i64]) -> Vec<BigInt> {
    v.iter().copied().map(BigInt::from).collect()
}

/// `u` dominates `v` if every non-zero entry of `u` appears unchanged in `v`.
fn dominates(u: &[u8], v: &[u8]) -> bool {
    u.iter().zip(v).all(|(&a, &b)| a == 0 || a == b)
}

fn type_vectors<C: LpConstraint, B: BanPolicy>(e: &mut TreeEnumeration<C, B>) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    e.run(|e| {
        out.push(e.types().to_vec());
        false
    });
    out
}

#[test]
fn free_tet_quad_counts() {
    let mut e = Plain::new(special::single_tet(), NormalCoords::Quad).unwrap();
    assert_eq!(e.pool_size(), 4);
    assert_eq!(e.n_types(), 1);
    assert_eq!(type_vectors(&mut e), vec![vec![1], vec![2], vec![3]]);
    assert_eq!(e.solutions(), 3);
    assert_eq!(e.visited(), 5);
    assert!(!e.next());
}

#[test]
fn free_tet_counts_in_every_system() {
    for (coords, expected) in [
        (NormalCoords::Quad, 3),
        (NormalCoords::Standard, 7),
        (NormalCoords::QuadOct, 6),
        (NormalCoords::AlmostNormal, 10),
    ] {
        let mut e = Plain::new(special::single_tet(), coords).unwrap();
        let surfaces = e.collect_surfaces();
        assert_eq!(surfaces.len(), expected, "{coords}");
        // Every vertex of a free tetrahedron is a single disc.
        for s in &surfaces {
            let ones = s.vector().iter().filter(|x| **x == BigInt::from(1)).count();
            let zeros = s.vector().iter().filter(|x| x.sign() == num_bigint::Sign::NoSign).count();
            assert_eq!((ones, zeros), (1, s.vector().len() - 1), "{coords}: {s}");
        }
    }
}

#[test]
fn pool_slots_clone_in_both_directions() {
    // Columns: q0 q1 q2 t0 t1 t2 t3.
    let tri = special::lst_123();
    let init = Arc::new(LpInitialTableaux::new::<NoConstraint>(&tri, NormalCoords::Standard, false));
    let mut pool = TableauPool::new(&init, 3);
    let root = pool.get_mut(SlotId(0));
    root.init_start();
    for col in [1, 2, 4, 5] {
        root.constrain_zero(col);
    }

    pool.clone_slot(SlotId(2), SlotId(0));
    pool.get_mut(SlotId(2)).constrain_positive(0);
    pool.get_mut(SlotId(0)).constrain_zero(0);
    pool.clone_slot(SlotId(1), SlotId(2));

    assert!(!pool.get(SlotId(0)).is_active(0));
    let disc = ints(&[1, 0, 0, 1, 1, 0, 0]);
    for slot in [SlotId(1), SlotId(2)] {
        let lp = pool.get(slot);
        assert!(lp.is_feasible() && lp.verify());
        assert_eq!(lp.extract_solution(&[1, 0, 0, 0, 0, 0]), disc);
    }
}

#[test]
fn pool_sizes_follow_branching_factors() {
    let tri = Arc::new(special::lst_123());
    let e = Plain::new(Arc::clone(&tri), NormalCoords::Standard).unwrap();
    assert_eq!(e.pool_size(), 3 + 4 + 1);
    let e = Plain::new(Arc::clone(&tri), NormalCoords::AlmostNormal).unwrap();
    assert_eq!(e.pool_size(), 6 + 4 + 1);
    let s = TreeSingleSoln::<NoConstraint, BanNone>::new(Arc::clone(&tri), NormalCoords::Standard).unwrap();
    assert_eq!(s.pool_size(), 2 + 4 + 1);
    let s = TreeSingleSoln::<NoConstraint, BanNone>::new(tri, NormalCoords::AlmostNormal).unwrap();
    assert_eq!(s.pool_size(), 5 + 4 + 1);
}

#[test]
fn euler_positive_drops_lone_octagons() {
    let mut e =
        TreeEnumeration::<EulerPositive, BanNone>::new(special::single_tet(), NormalCoords::AlmostNormal).unwrap();
    let surfaces = e.collect_surfaces();
    assert_eq!(surfaces.len(), 7);
    assert!(surfaces.iter().all(|s| s.octagon().is_none()));
    assert!(!e.constraints_broken());
}

#[test]
fn octagon_surfaces_report_their_octagon() {
    let mut e = Plain::new(special::single_tet(), NormalCoords::QuadOct).unwrap();
    let mut octs: Vec<(usize, usize)> = e.collect_surfaces().iter().filter_map(|s| s.octagon()).collect();
    octs.sort_unstable();
    assert_eq!(octs, vec![(0, 0), (0, 1), (0, 2)]);
}

#[test]
fn lst_single_solution_is_meridian_disc() {
    let mut s = TreeSingleSoln::<EulerPositive, BanNone>::new(special::lst_123(), NormalCoords::Standard).unwrap();
    assert!(s.find());
    let surface = s.build_surface();
    assert_eq!(surface.vector(), ints(&[1, 0, 0, 1, 1, 0, 0]).as_slice());
    assert_eq!(surface.euler_char(), Some(BigInt::from(1)));
    assert!(s.verify(&surface, None));
    // The search runs once.
    assert!(!s.find());
}

#[test]
fn both_branching_orders_find_a_solution() {
    for branching in [Branching::FewestFeasible, Branching::ScanOrder] {
        let mut s = TreeSingleSoln::<EulerPositive, BanNone>::with_cfg(
            special::lst_123(),
            NormalCoords::Standard,
            SingleSolnCfg { branching },
        )
        .unwrap();
        assert_eq!(s.cfg().branching, branching);
        assert!(s.find(), "{branching:?}");
        let surface = s.build_surface();
        assert!(s.verify(&surface, None));
        assert!(!surface.is_empty());
    }
}

#[test]
fn torus_boundary_ban_leaves_nothing_in_lst() {
    let mut e =
        TreeEnumeration::<NoConstraint, BanTorusBoundary>::new(special::lst_123(), NormalCoords::Standard).unwrap();
    assert!(!e.next());
    assert_eq!(e.solutions(), 0);

    let mut s =
        TreeSingleSoln::<EulerPositive, BanTorusBoundary>::new(special::lst_123(), NormalCoords::Standard).unwrap();
    assert!(!s.find());
}

#[test]
fn torus_ban_ignores_orientability_elsewhere() {
    let perm = |img| crate::triangulation::Perm4::new(img).unwrap();
    let tri = Triangulation::from_gluings(
        2,
        &[(0, 0, 0, perm([3, 0, 1, 2])), (1, 0, 1, perm([2, 0, 1, 3]))],
    )
    .unwrap();
    let mut e = TreeEnumeration::<NoConstraint, BanTorusBoundary>::new(tri, NormalCoords::Standard).unwrap();
    let surfaces = e.collect_surfaces();
    assert!(!surfaces.is_empty());
    for s in &surfaces {
        assert!((0..4).all(|v| s.triangles(0, v).is_some_and(|x| x.is_zero())), "{s}");
        assert!((0..3).all(|q| s.quads(0, q).is_zero()), "{s}");
    }
}

#[test]
fn boundary_ban_leaves_nothing_in_a_ball() {
    let mut e = TreeEnumeration::<NoConstraint, BanBoundary>::new(special::single_tet(), NormalCoords::Standard).unwrap();
    assert!(!e.next());
}

#[test]
fn lst_enumeration_is_sound() {
    for coords in [NormalCoords::Standard, NormalCoords::AlmostNormal] {
        let mut e = Plain::new(special::lst_123(), coords).unwrap();
        let eqns = crate::equations::matching_equations(e.triangulation(), coords);
        let mut seen = Vec::new();
        while e.next() {
            let s = e.build_surface();
            assert!(e.verify(&s, Some(&eqns)), "{coords}: {s}");
            assert!(!s.is_empty());
            assert_eq!(e.type_vector_of(&s).as_deref(), Some(e.types()));
            assert_eq!(e.replay(e.types()), Some(s));
            seen.push(e.types().to_vec());
        }
        assert!(!seen.is_empty());
        for (i, u) in seen.iter().enumerate() {
            assert!(e.accepted().dominates(u));
            for (j, v) in seen.iter().enumerate() {
                assert!(i == j || !dominates(u, v), "{u:?} dominates {v:?}");
            }
        }
    }
}

#[test]
fn euler_zero_surfaces_have_zero_euler_characteristic() {
    let mut e = TreeEnumeration::<EulerZero, BanNone>::new(special::lst_123(), NormalCoords::Standard).unwrap();
    for s in e.collect_surfaces() {
        assert_eq!(s.euler_char(), Some(BigInt::from(0)), "{s}");
    }
}

#[test]
fn enumeration_is_deterministic() {
    let mut first = Plain::new(special::lst_123(), NormalCoords::AlmostNormal).unwrap();
    let mut second = Plain::new(special::lst_123(), NormalCoords::AlmostNormal).unwrap();
    assert_eq!(type_vectors(&mut first), type_vectors(&mut second));
    assert_eq!(first.visited(), second.visited());
}

#[test]
fn cancellation_from_another_thread() {
    let mut e = Plain::new(special::lst_123(), NormalCoords::Standard).unwrap();
    let token = e.cancel_token();
    std::thread::spawn(move || token.cancel()).join().unwrap();
    assert!(e.is_cancelled());
    assert!(!e.next());
    assert_eq!(e.solutions(), 0);
    let frozen = e.visited();
    assert!(!e.next());
    assert_eq!(e.visited(), frozen);
}

/// A random bounded triangulation with at least `min` standard vertex surfaces.
fn busy_triangulation(min: usize) -> Arc<Triangulation> {
    let cfg = RandomCfg { tets: 4, boundary_faces: 6, orientable: true };
    (0..50)
        .map(|index| Arc::new(random_triangulation(cfg, ReplayToken { seed: 11, index })))
        .find(|tri| {
            let mut e = Plain::new(Arc::clone(tri), NormalCoords::Standard).unwrap();
            e.collect_surfaces().len() >= min
        })
        .unwrap()
}

#[test]
fn cancellation_while_running() {
    use std::sync::mpsc;

    let tri = busy_triangulation(3);
    let mut e = Plain::new(Arc::clone(&tri), NormalCoords::Standard).unwrap();
    let token = e.cancel_token();
    let (to_canceller, requests) = mpsc::channel::<()>();
    let (acks, from_canceller) = mpsc::channel::<()>();
    let canceller = std::thread::spawn(move || {
        requests.recv().unwrap();
        token.cancel();
        acks.send(()).unwrap();
    });

    let stopped = e.run(|e| {
        if e.solutions() == 1 {
            to_canceller.send(()).unwrap();
            from_canceller.recv().unwrap();
        }
        false
    });
    canceller.join().unwrap();

    assert!(!stopped);
    assert!(e.is_cancelled());
    assert_eq!(e.solutions(), 1);
    let frozen = e.visited();
    assert!(!e.next());
    assert!(!e.next());
    assert_eq!(e.visited(), frozen);
    assert_eq!(e.solutions(), 1);
}

#[test]
fn cancellation_races_a_running_search() {
    let tri = busy_triangulation(3);
    let mut e = Plain::new(tri, NormalCoords::Standard).unwrap();
    let token = e.cancel_token();
    let canceller = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(1));
        token.cancel();
    });
    let mut found = 0;
    e.run(|_| {
        found += 1;
        false
    });
    canceller.join().unwrap();

    // Whether or not the search finished first, it is now inert.
    let frozen = e.visited();
    assert_eq!(e.solutions(), found);
    assert!(!e.next());
    assert_eq!(e.visited(), frozen);
    assert_eq!(e.solutions(), found);
}

#[test]
fn cancellation_between_solutions() {
    let mut e = Plain::new(special::single_tet(), NormalCoords::Standard).unwrap();
    let stopped = e.run(|e| {
        e.cancel();
        false
    });
    assert!(!stopped);
    assert_eq!(e.solutions(), 1);
}

#[test]
fn run_stops_when_asked() {
    let mut e = Plain::new(special::single_tet(), NormalCoords::Standard).unwrap();
    assert!(e.run(|e| e.solutions() == 2));
    assert_eq!(e.solutions(), 2);
    // Resumes where it stopped.
    assert_eq!(e.collect_surfaces().len(), 5);
}

#[test]
fn progress_stays_in_range_and_grows() {
    let mut e = Plain::new(special::lst_123(), NormalCoords::AlmostNormal).unwrap();
    let mut last = -1.0;
    e.run(|e| {
        let p = e.percent();
        assert!((0.0..=100.0).contains(&p), "{p}");
        assert!(p >= last, "{p} < {last}");
        last = p;
        false
    });
}

#[test]
fn type_string_tracks_types() {
    let mut e = Plain::new(special::single_tet(), NormalCoords::Quad).unwrap();
    assert!(e.next());
    assert_eq!(e.type_string(), "1");
    let mut out = String::new();
    e.dump_types(&mut out).unwrap();
    assert_eq!(out, "1");
}

#[test]
fn replay_rejects_bad_vectors() {
    let e = Plain::new(special::single_tet(), NormalCoords::Standard).unwrap();
    assert!(e.replay(&[0, 0, 0, 0, 0]).is_none());
    assert!(e.replay(&[1, 0]).is_none());
    assert!(e.replay(&[4, 0, 0, 0, 0]).is_none());
    assert!(e.replay(&[0, 2, 0, 0, 0]).is_none());
    let s = e.replay(&[2, 0, 0, 0, 0]).unwrap();
    assert_eq!(s.vector(), ints(&[0, 0, 0, 0, 0, 1, 0]).as_slice());
}

#[test]
fn setup_errors() {
    let err = Plain::new(crate::triangulation::Triangulation::new(0), NormalCoords::Quad).err();
    assert_eq!(err, Some(TraversalError::EmptyTriangulation));

    let err = TreeEnumeration::<EulerZero, BanNone>::new(special::lst_123(), NormalCoords::Quad).err();
    assert_eq!(err, Some(TraversalError::constraint("euler-zero", NormalCoords::Quad)));

    let err = TreeEnumeration::<NoConstraint, BanBoundary>::new(special::lst_123(), NormalCoords::QuadOct).err();
    assert_eq!(err, Some(TraversalError::ban("boundary", NormalCoords::QuadOct)));

    assert!(TreeTraversal::<EulerPositive, BanNone>::supported(NormalCoords::AlmostNormal));
    assert!(!TreeTraversal::<EulerPositive, BanNone>::supported(NormalCoords::Quad));
}

#[test]
fn invalid_triangulation_ignores_euler_constraint() {
    let mut e =
        TreeEnumeration::<EulerPositive, BanNone>::new(special::twisted_edge(), NormalCoords::Standard).unwrap();
    assert!(e.constraints_broken());
    let with = e.collect_surfaces().len();
    let without = Plain::new(special::twisted_edge(), NormalCoords::Standard)
        .unwrap()
        .collect_surfaces()
        .len();
    assert_eq!(with, without);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn random_enumerations_are_sound(
        tets in 1usize..3,
        boundary_faces in 0usize..4,
        seed in any::<u64>(),
        octagons in any::<bool>(),
    ) {
        let cfg = RandomCfg { tets, boundary_faces, orientable: true };
        let tri = Arc::new(random_triangulation(cfg, ReplayToken { seed, index: 1 }));
        let coords = if octagons { NormalCoords::QuadOct } else { NormalCoords::Quad };
        let mut e = Plain::new(Arc::clone(&tri), coords).unwrap();
        let eqns = crate::equations::matching_equations(&tri, coords);

        let mut seen: Vec<Vec<u8>> = Vec::new();
        while e.next() {
            let s = e.build_surface();
            prop_assert!(s.satisfies(&eqns));
            prop_assert!(!s.is_empty());
            prop_assert!(s.vector().iter().all(|x| x.sign() != num_bigint::Sign::Minus));
            prop_assert_eq!(e.replay(e.types()), Some(s));
            seen.push(e.types().to_vec());
        }
        for (i, u) in seen.iter().enumerate() {
            for (j, v) in seen.iter().enumerate() {
                prop_assert!(i == j || !dominates(u, v));
            }
        }
    }
}
