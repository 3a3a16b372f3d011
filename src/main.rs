//! Shuffle Sim headless runner
//!
//! Plays one simulated game: a grid-search player against a random player,
//! alternating shots, then prints the score and the final board.
//!
//! Usage: `shuffle-sim [--settings PATH] [--seed N] [--pucks N]`

use std::sync::Arc;

use shuffle_sim::consts::{BOARD_LENGTH, BOARD_WIDTH};
use shuffle_sim::{
    EvalPool, RandomStrategy, SearchStrategy, Settings, Simulator, State, Strategy,
};

/// Pucks per game (both players)
const DEFAULT_PUCKS: usize = 8;

struct Args {
    settings: Option<String>,
    seed: Option<u64>,
    pucks: usize,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        settings: None,
        seed: None,
        pucks: DEFAULT_PUCKS,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        let mut value = || iter.next().ok_or_else(|| format!("{arg} needs a value"));
        match arg.as_str() {
            "--settings" => args.settings = Some(value()?),
            "--seed" => {
                let raw = value()?;
                args.seed = Some(raw.parse().map_err(|e| format!("bad seed {raw}: {e}"))?);
            }
            "--pucks" => {
                let raw = value()?;
                args.pucks = raw.parse().map_err(|e| format!("bad puck count {raw}: {e}"))?;
            }
            other => return Err(format!("unknown argument {other}")),
        }
    }
    Ok(args)
}

/// Standard table shuffleboard scoring
///
/// Only pucks on the board past the 1-point line count. The team with the
/// furthest puck scores every puck beyond the opponent's furthest one:
/// 3 past the 15/16 line, 2 past 14/16, otherwise 1. Even pucks belong to
/// player 0, odd pucks to player 1.
fn score_board(state: &State) -> (f64, f64) {
    let line_1 = BOARD_LENGTH * 10.0 / 16.0;
    let line_2 = BOARD_LENGTH * 14.0 / 16.0;
    let line_3 = BOARD_LENGTH * 15.0 / 16.0;

    let mut in_zone: [Vec<f64>; 2] = [Vec::new(), Vec::new()];
    for (i, pos) in state.positions().iter().enumerate() {
        let on_board = (0.0..=BOARD_WIDTH).contains(&pos.x) && pos.y <= BOARD_LENGTH;
        if on_board && pos.y > line_1 {
            in_zone[i % 2].push(pos.y);
        }
    }

    let furthest = |team: usize| in_zone[team].iter().copied().fold(line_1, f64::max);
    let winner = if furthest(0) > furthest(1) { 0 } else { 1 };
    let bar = furthest(1 - winner);
    let points: f64 = in_zone[winner]
        .iter()
        .filter(|&&y| y > bar)
        .map(|&y| {
            if y > line_3 {
                3.0
            } else if y > line_2 {
                2.0
            } else {
                1.0
            }
        })
        .sum();

    let mut scores = [0.0, 0.0];
    scores[winner] = points;
    (scores[0], scores[1])
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args()?;
    let mut settings = match &args.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(seed) = args.seed {
        settings.search.seed = seed;
    }

    let pool = Arc::new(EvalPool::new(settings.threads)?);
    let simulator = Simulator::new(settings.sim.clone());
    let mut players: [Box<dyn Strategy>; 2] = [
        Box::new(SearchStrategy::new(
            simulator.clone(),
            settings.search.clone(),
            pool,
        )),
        Box::new(RandomStrategy::new(
            &settings.search,
            settings.search.seed.wrapping_add(1),
        )),
    ];

    let mut state = State::new(args.pucks);
    for puck in 0..args.pucks {
        let player = (puck % 2) as u8;
        let shot = players[player as usize].choose_move(player, &state, puck, &score_board)?;
        let result = simulator.apply_shot(&state, puck, &shot)?;
        state = result.rest;

        let rest = state.get_position(puck)?;
        let (score_0, score_1) = score_board(&state);
        log::info!(
            "Player {} puck {}: vx={:.3} vy={:.3} -> ({:.3}, {:.3}) in {} steps, {} contacts; score {}-{}",
            player,
            puck,
            shot.x_velocity,
            shot.y_velocity,
            rest.x,
            rest.y,
            result.trajectory.len(),
            result.trajectory.contacts().len(),
            score_0,
            score_1
        );
    }

    let (score_0, score_1) = score_board(&state);
    println!("Search player: {score_0}");
    println!("Random player: {score_1}");
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

fn main() {
    env_logger::init();
    log::info!("Shuffle Sim starting...");

    if let Err(err) = run() {
        log::error!("{err}");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;

    fn board(positions: &[(f64, f64)]) -> State {
        let positions: Vec<DVec2> = positions.iter().map(|&(x, y)| DVec2::new(x, y)).collect();
        let n = positions.len();
        State::from_parts(positions, vec![DVec2::ZERO; n]).unwrap()
    }

    #[test]
    fn test_empty_zone_scores_nothing() {
        assert_eq!(score_board(&State::new(4)), (0.0, 0.0));
    }

    #[test]
    fn test_leader_scores_pucks_past_opponent() {
        let y3 = BOARD_LENGTH * 0.95;
        let y2 = BOARD_LENGTH * 0.90;
        let y1 = BOARD_LENGTH * 0.70;
        // Player 0 owns pucks 0 and 2, player 1 owns 1 and 3
        let state = board(&[(0.2, y3), (0.2, y1), (0.1, y2), (0.0, 0.0)]);
        assert_eq!(score_board(&state), (5.0, 0.0));

        let state = board(&[(0.2, y1), (0.2, y3), (0.1, y2), (0.0, 0.0)]);
        assert_eq!(score_board(&state), (0.0, 3.0));
    }

    #[test]
    fn test_off_board_pucks_ignored() {
        let state = board(&[(0.2, BOARD_LENGTH + 0.1), (-0.05, BOARD_LENGTH * 0.95)]);
        assert_eq!(score_board(&state), (0.0, 0.0));
    }
}
