//! Shot search
//!
//! Enumerates release parameters on a fixed grid, simulates each one on a
//! shared worker pool, smooths the resulting advantage surface and picks the
//! best cell with a seeded tie-break.

pub mod grid;
pub mod pool;
pub mod smoothing;
pub mod strategy;

pub use grid::{Candidate, CandidateGrid, Cell, ScoreGrid};
pub use pool::{CancelToken, EvalPool};
pub use smoothing::{gaussian_kernel, kernel_radius, smooth};
pub use strategy::{RandomStrategy, ScoreFn, SearchReport, SearchStrategy, Strategy};
