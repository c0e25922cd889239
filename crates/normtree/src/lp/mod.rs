//! Exact-arithmetic linear programming for the tree traversal.
//!
//! The starting tableau (`LpInitialTableaux`) is built once per search and shared;
//! every node of the search tree owns an `LpData` holding row operations on top
//! of it. All arithmetic is over `BigInt`, so feasibility answers are exact.

mod data;
mod initial;
mod matrix;

pub use data::{ColState, LpData};
pub use initial::{LpCol, LpInitialTableaux};
pub use matrix::LpMatrix;
