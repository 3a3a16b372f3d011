//! Candidate grid and per-candidate score storage

use serde::{Deserialize, Serialize};

use crate::consts::MAX_CANDIDATES;
use crate::error::{SearchError, SearchResult};
use crate::settings::SearchSettings;
use crate::sim::Shot;

/// Grid coordinates: (release x, x velocity, y velocity)
pub type Cell = [usize; 3];

/// One point of the discretised release-parameter space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub cell: Cell,
    pub release_x: f64,
    pub x_velocity: f64,
    pub y_velocity: f64,
}

impl Candidate {
    pub fn shot(&self, release_y: f64) -> Shot {
        Shot {
            release_x: self.release_x,
            release_y,
            x_velocity: self.x_velocity,
            y_velocity: self.y_velocity,
        }
    }
}

/// Cartesian product of release positions and velocity sweeps
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateGrid {
    release_xs: Vec<f64>,
    x_velocities: Vec<f64>,
    y_velocities: Vec<f64>,
}

impl CandidateGrid {
    /// Build the grid, failing with `EmptySearchSpace` if any axis is empty
    /// and `SearchSpaceTooLarge` past `MAX_CANDIDATES` cells
    pub fn new(
        release_xs: Vec<f64>,
        x_velocities: Vec<f64>,
        y_velocities: Vec<f64>,
    ) -> SearchResult<Self> {
        if release_xs.is_empty() || x_velocities.is_empty() || y_velocities.is_empty() {
            return Err(SearchError::EmptySearchSpace);
        }
        let candidates = release_xs
            .len()
            .saturating_mul(x_velocities.len())
            .saturating_mul(y_velocities.len());
        if candidates > MAX_CANDIDATES {
            return Err(SearchError::SearchSpaceTooLarge {
                candidates,
                limit: MAX_CANDIDATES,
            });
        }
        Ok(Self {
            release_xs,
            x_velocities,
            y_velocities,
        })
    }

    pub fn from_settings(settings: &SearchSettings) -> SearchResult<Self> {
        Self::new(
            settings.release_xs.clone(),
            settings.x_velocity.values(),
            settings.y_velocity.values(),
        )
    }

    pub fn dims(&self) -> Cell {
        [
            self.release_xs.len(),
            self.x_velocities.len(),
            self.y_velocities.len(),
        ]
    }

    pub fn len(&self) -> usize {
        let [a, b, c] = self.dims();
        a * b * c
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The candidate at `cell`, or `None` outside the grid
    pub fn candidate(&self, cell: Cell) -> Option<Candidate> {
        let [i, j, k] = cell;
        Some(Candidate {
            cell,
            release_x: *self.release_xs.get(i)?,
            x_velocity: *self.x_velocities.get(j)?,
            y_velocity: *self.y_velocities.get(k)?,
        })
    }

    /// All candidates in row-major cell order
    pub fn candidates(&self) -> Vec<Candidate> {
        let [ni, nj, nk] = self.dims();
        let mut out = Vec::with_capacity(self.len());
        for i in 0..ni {
            for j in 0..nj {
                for k in 0..nk {
                    out.push(Candidate {
                        cell: [i, j, k],
                        release_x: self.release_xs[i],
                        x_velocity: self.x_velocities[j],
                        y_velocity: self.y_velocities[k],
                    });
                }
            }
        }
        out
    }
}

/// Dense 3-D grid of optional scores; `None` marks an excluded candidate
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreGrid {
    dims: Cell,
    cells: Vec<Option<f64>>,
}

impl ScoreGrid {
    pub fn new(dims: Cell) -> Self {
        Self {
            dims,
            cells: vec![None; dims[0] * dims[1] * dims[2]],
        }
    }

    /// Build from values in row-major order
    pub(crate) fn from_values(dims: Cell, cells: Vec<Option<f64>>) -> Self {
        debug_assert_eq!(cells.len(), dims[0] * dims[1] * dims[2], "score grid size");
        Self { dims, cells }
    }

    pub fn dims(&self) -> Cell {
        self.dims
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.iter().zip(&self.dims).all(|(c, d)| c < d)
    }

    /// Row-major offset of `cell`, or `None` outside the grid
    #[inline]
    pub fn offset(&self, cell: Cell) -> Option<usize> {
        self.contains(cell)
            .then(|| (cell[0] * self.dims[1] + cell[1]) * self.dims[2] + cell[2])
    }

    /// Score at `cell`; `None` for excluded cells and cells outside the grid
    pub fn get(&self, cell: Cell) -> Option<f64> {
        self.offset(cell).and_then(|offset| self.cells[offset])
    }

    /// Store a score, returning false if `cell` lies outside the grid
    pub fn set(&mut self, cell: Cell, value: Option<f64>) -> bool {
        match self.offset(cell) {
            Some(offset) => {
                self.cells[offset] = value;
                true
            }
            None => false,
        }
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.cells
    }

    /// Number of cells holding a score
    pub fn present(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Largest score in the grid
    pub fn max(&self) -> Option<f64> {
        self.cells
            .iter()
            .flatten()
            .copied()
            .fold(None, |best, v| match best {
                Some(b) if b >= v => Some(b),
                _ => Some(v),
            })
    }

    /// Every cell whose score equals the maximum exactly
    pub fn argmax_cells(&self) -> Vec<Cell> {
        let Some(best) = self.max() else {
            return Vec::new();
        };
        let [_, nj, nk] = self.dims;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, v)| **v == Some(best))
            .map(|(offset, _)| [offset / (nj * nk), (offset / nk) % nj, offset % nk])
            .collect()
    }

    /// Cells holding the largest score within `radius` of `center` on each axis
    ///
    /// The window is clipped to the grid edges.
    pub fn window_argmax_cells(&self, center: Cell, radius: Cell) -> Vec<Cell> {
        let range = |axis: usize| {
            let lo = center[axis].saturating_sub(radius[axis]);
            let hi = center[axis]
                .saturating_add(radius[axis])
                .min(self.dims[axis].saturating_sub(1));
            lo..=hi
        };

        let mut best: Option<f64> = None;
        let mut cells = Vec::new();
        for i in range(0) {
            for j in range(1) {
                for k in range(2) {
                    let Some(value) = self.get([i, j, k]) else {
                        continue;
                    };
                    match best {
                        Some(b) if value < b => {}
                        Some(b) if value == b => cells.push([i, j, k]),
                        _ => {
                            best = Some(value);
                            cells.clear();
                            cells.push([i, j, k]);
                        }
                    }
                }
            }
        }
        cells
    }
}
