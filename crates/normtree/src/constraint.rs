//! Extra linear constraints layered on top of the matching equations.
//!
//! Each constraint adds rows `f(x) - s = 0` with a fresh slack column `s`, then
//! restricts `s` once the root tableau exists.

use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::coords::NormalCoords;
use crate::equations::euler_coefficients;
use crate::lp::LpData;
use crate::surface::NormalSurface;
use crate::triangulation::Triangulation;

/// A family of extra linear constraints, chosen at compile time.
pub trait LpConstraint {
    const NAME: &'static str;
    /// Number of extra rows (and slack columns).
    const N_CONSTRAINTS: usize;
    /// Added to each extra coefficient of both quad columns that represent an octagon.
    const OCT_ADJUSTMENT: i64;

    fn supported(coords: NormalCoords) -> bool;

    /// One coefficient row per constraint, indexed by surface coordinate of
    /// `system`. `None` means the constraints cannot be installed.
    fn coefficients(tri: &Triangulation, system: NormalCoords) -> Option<Vec<Vec<i64>>>;

    /// Restrict the slack columns of a freshly started tableau. `n_cols` is the
    /// total column count; slack columns are the last `N_CONSTRAINTS`.
    fn constrain(lp: &mut LpData, n_cols: usize);

    /// Does a finished surface satisfy the constraints?
    fn verify(surface: &NormalSurface) -> bool;
}

/// No extra constraints.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoConstraint;

impl LpConstraint for NoConstraint {
    const NAME: &'static str = "none";
    const N_CONSTRAINTS: usize = 0;
    const OCT_ADJUSTMENT: i64 = 0;

    fn supported(_coords: NormalCoords) -> bool {
        true
    }

    fn coefficients(_tri: &Triangulation, _system: NormalCoords) -> Option<Vec<Vec<i64>>> {
        Some(Vec::new())
    }

    fn constrain(_lp: &mut LpData, _n_cols: usize) {}

    fn verify(_surface: &NormalSurface) -> bool {
        true
    }
}

/// Euler characteristic strictly positive.
///
/// In almost normal coordinates this measures Euler characteristic minus the
/// number of octagons.
#[derive(Clone, Copy, Debug, Default)]
pub struct EulerPositive;

impl LpConstraint for EulerPositive {
    const NAME: &'static str = "euler-positive";
    const N_CONSTRAINTS: usize = 1;
    const OCT_ADJUSTMENT: i64 = -1;

    fn supported(coords: NormalCoords) -> bool {
        coords.stores_triangles()
    }

    fn coefficients(tri: &Triangulation, system: NormalCoords) -> Option<Vec<Vec<i64>>> {
        euler_rows(tri, system)
    }

    fn constrain(lp: &mut LpData, n_cols: usize) {
        lp.constrain_positive(n_cols - 1);
    }

    fn verify(surface: &NormalSurface) -> bool {
        surface
            .euler_char()
            .is_some_and(|chi| (chi - octagon_count(surface)).is_positive())
    }
}

/// Euler characteristic exactly zero, in standard coordinates.
#[derive(Clone, Copy, Debug, Default)]
pub struct EulerZero;

impl LpConstraint for EulerZero {
    const NAME: &'static str = "euler-zero";
    const N_CONSTRAINTS: usize = 1;
    const OCT_ADJUSTMENT: i64 = 0;

    fn supported(coords: NormalCoords) -> bool {
        coords == NormalCoords::Standard
    }

    fn coefficients(tri: &Triangulation, system: NormalCoords) -> Option<Vec<Vec<i64>>> {
        euler_rows(tri, system)
    }

    fn constrain(lp: &mut LpData, n_cols: usize) {
        lp.constrain_zero(n_cols - 1);
    }

    fn verify(surface: &NormalSurface) -> bool {
        surface.euler_char().is_some_and(|chi| chi.is_zero())
    }
}

fn euler_rows(tri: &Triangulation, system: NormalCoords) -> Option<Vec<Vec<i64>>> {
    if !tri.is_valid() {
        return None;
    }
    euler_coefficients(tri, system).map(|row| vec![row])
}

fn octagon_count(surface: &NormalSurface) -> BigInt {
    (0..surface.triangulation().size())
        .flat_map(|t| (0..3).filter_map(move |k| surface.octs(t, k)))
        .sum()
}
