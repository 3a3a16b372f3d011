//! Move-selection strategies
//!
//! A strategy turns (player, board, puck) into release parameters. The
//! scoring rules stay with the caller and arrive as a callback returning
//! `(score_for_player_0, score_for_player_1)`.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::grid::{Candidate, CandidateGrid, Cell, ScoreGrid};
use super::pool::{CancelToken, EvalPool};
use super::smoothing::{kernel_radius, smooth};
use crate::consts::BOARD_WIDTH;
use crate::error::{SearchError, SearchResult, SimError};
use crate::settings::{SearchSettings, Sweep};
use crate::sim::{Shot, Simulator, State};

/// Caller-supplied board scorer
pub type ScoreFn<'a> = dyn Fn(&State) -> (f64, f64) + Sync + 'a;

/// Anything that can pick a shot for a player
pub trait Strategy {
    fn choose_move(
        &mut self,
        player: u8,
        state: &State,
        puck: usize,
        score: &ScoreFn<'_>,
    ) -> SearchResult<Shot>;
}

fn check_player(player: u8) -> SearchResult<()> {
    if player > 1 {
        return Err(SearchError::InvalidPlayer(player));
    }
    Ok(())
}

fn advantage(player: u8, (score_0, score_1): (f64, f64)) -> f64 {
    if player == 0 {
        score_0 - score_1
    } else {
        score_1 - score_0
    }
}

/// Shoots from the board centre with uniformly random velocities
#[derive(Debug, Clone)]
pub struct RandomStrategy {
    rng: Pcg32,
    release_x: f64,
    release_y: f64,
    x_velocity: Sweep,
    y_velocity: Sweep,
}

impl RandomStrategy {
    /// Draws velocities from the search sweeps' bounds
    pub fn new(settings: &SearchSettings, seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            release_x: BOARD_WIDTH / 2.0,
            release_y: settings.release_y,
            x_velocity: settings.x_velocity,
            y_velocity: settings.y_velocity,
        }
    }

    fn draw(&mut self, band: Sweep) -> SearchResult<f64> {
        if !band.min.is_finite() || !band.max.is_finite() || band.min > band.max {
            return Err(SearchError::EmptySearchSpace);
        }
        Ok(self.rng.random_range(band.min..=band.max))
    }
}

impl Strategy for RandomStrategy {
    fn choose_move(
        &mut self,
        player: u8,
        state: &State,
        puck: usize,
        _score: &ScoreFn<'_>,
    ) -> SearchResult<Shot> {
        check_player(player)?;
        state.get_full(puck)?;
        Ok(Shot {
            release_x: self.release_x,
            release_y: self.release_y,
            x_velocity: self.draw(self.x_velocity)?,
            y_velocity: self.draw(self.y_velocity)?,
        })
    }
}

/// Everything a grid search produced
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub shot: Shot,
    /// Winning cell: the best raw advantage within kernel reach of itself
    pub cell: Cell,
    /// Cell picked from the smoothed grid before the local refinement
    pub anchor: Cell,
    /// Advantage per candidate before smoothing
    pub raw: ScoreGrid,
    pub smoothed: ScoreGrid,
    /// Candidates that reached rest and were scored
    pub evaluated: usize,
    /// Candidates excluded after a simulation failure
    pub failed: usize,
    /// Cells sharing the best smoothed advantage
    pub ties: usize,
}

enum Outcome {
    Scored(f64),
    Failed,
    Skipped,
}

/// Simulates every candidate on the grid and picks the best smoothed advantage
#[derive(Debug)]
pub struct SearchStrategy {
    simulator: Simulator,
    settings: SearchSettings,
    pool: Arc<EvalPool>,
    rng: Pcg32,
}

impl SearchStrategy {
    pub fn new(simulator: Simulator, settings: SearchSettings, pool: Arc<EvalPool>) -> Self {
        let rng = Pcg32::seed_from_u64(settings.seed);
        Self {
            simulator,
            settings,
            pool,
            rng,
        }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Run the search and return the full report
    pub fn search(
        &mut self,
        player: u8,
        state: &State,
        puck: usize,
        score: &ScoreFn<'_>,
    ) -> SearchResult<SearchReport> {
        self.search_with_cancel(player, state, puck, score, &CancelToken::new())
    }

    /// Run the search, abandoning outstanding candidates once `cancel` fires
    pub fn search_with_cancel(
        &mut self,
        player: u8,
        state: &State,
        puck: usize,
        score: &ScoreFn<'_>,
        cancel: &CancelToken,
    ) -> SearchResult<SearchReport> {
        check_player(player)?;
        state.validate()?;
        state.get_full(puck)?;

        let grid = CandidateGrid::from_settings(&self.settings)?;
        let candidates = grid.candidates();
        log::info!(
            "Searching {} candidates for puck {} (player {})",
            candidates.len(),
            puck,
            player
        );

        let release_y = self.settings.release_y;
        let simulator = &self.simulator;
        let outcomes = self.pool.map(&candidates, |candidate: &Candidate| {
            if cancel.is_cancelled() {
                return Outcome::Skipped;
            }
            let mut working = state.clone();
            let result = working
                .set_full(puck, candidate.shot(release_y).release())
                .and_then(|_| simulator.simulate_to_rest(&working));
            match result {
                Ok(rest) => {
                    let value = advantage(player, score(&rest));
                    if value.is_finite() {
                        Outcome::Scored(value)
                    } else {
                        log::warn!("Candidate {:?} scored non-finite {}", candidate.cell, value);
                        Outcome::Failed
                    }
                }
                Err(err) => {
                    log_failure(candidate, &err);
                    Outcome::Failed
                }
            }
        });

        if cancel.is_cancelled() {
            log::info!("Search for puck {} cancelled", puck);
            return Err(SearchError::Cancelled);
        }

        let mut raw = ScoreGrid::new(grid.dims());
        let mut failed = 0;
        for (candidate, outcome) in candidates.iter().zip(outcomes) {
            match outcome {
                Outcome::Scored(value) => {
                    raw.set(candidate.cell, Some(value));
                }
                Outcome::Failed | Outcome::Skipped => failed += 1,
            }
        }
        let evaluated = raw.present();
        if evaluated == 0 {
            return Err(SearchError::NoViableMove { failed });
        }

        let smoothed = smooth(&raw, self.settings.smoothing_sigma);
        let best = smoothed.argmax_cells();
        let Some(&anchor) = best.get(self.rng.random_range(0..best.len().max(1))) else {
            return Err(SearchError::NoViableMove { failed });
        };
        let radius = self.settings.smoothing_sigma.map(kernel_radius);
        let cell = self.refine(&raw, anchor, radius);
        let Some(candidate) = grid.candidate(cell) else {
            return Err(SearchError::NoViableMove { failed });
        };
        let shot = candidate.shot(release_y);

        log::info!(
            "Best shot for puck {}: x={:.3} vx={:.3} vy={:.3} (advantage {:.3}, smoothed {:.3}, {} ties, {} failed)",
            puck,
            shot.release_x,
            shot.x_velocity,
            shot.y_velocity,
            raw.get(cell).unwrap_or(f64::NAN),
            smoothed.get(anchor).unwrap_or(f64::NAN),
            best.len(),
            failed
        );

        Ok(SearchReport {
            shot,
            cell,
            anchor,
            raw,
            smoothed,
            evaluated,
            failed,
            ties: best.len(),
        })
    }
}

impl SearchStrategy {
    /// Climb from `cell` to a raw maximum of its own kernel neighbourhood
    ///
    /// Each move strictly raises the raw advantage, so the walk ends.
    /// Exact ties are broken with the search RNG.
    fn refine(&mut self, raw: &ScoreGrid, mut cell: Cell, radius: Cell) -> Cell {
        loop {
            let best = raw.window_argmax_cells(cell, radius);
            if best.is_empty() || best.contains(&cell) {
                return cell;
            }
            cell = best[self.rng.random_range(0..best.len())];
        }
    }
}

fn log_failure(candidate: &Candidate, err: &SimError) {
    if err.is_candidate_local() {
        log::warn!("Excluding candidate {:?}: {}", candidate.cell, err);
    } else {
        log::error!("Candidate {:?} failed: {}", candidate.cell, err);
    }
}

impl Strategy for SearchStrategy {
    fn choose_move(
        &mut self,
        player: u8,
        state: &State,
        puck: usize,
        score: &ScoreFn<'_>,
    ) -> SearchResult<Shot> {
        self.search(player, state, puck, score).map(|report| report.shot)
    }
}
