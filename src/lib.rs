//! Shuffle Sim - shuffleboard puck physics and shot selection
//!
//! Core modules:
//! - `sim`: Deterministic simulation (state, friction, contacts, rest detection)
//! - `search`: Parallel grid search over release parameters
//! - `settings`: Data-driven physics and search parameters

pub mod error;
pub mod search;
pub mod settings;
pub mod sim;

pub use error::{SearchError, SettingsError, SimError};
pub use search::{
    CancelToken, EvalPool, RandomStrategy, SearchReport, SearchStrategy, Strategy,
};
pub use settings::{SearchSettings, Settings, SimSettings, Sweep};
pub use sim::{PuckState, Shot, Simulation, Simulator, State, Trajectory};

/// Physical constants and defaults
pub mod consts {
    /// Fixed simulation timestep (100 Hz)
    pub const SIM_DT: f64 = 0.01;
    /// Velocity components below this snap to zero (m/s)
    pub const MIN_VELOCITY: f64 = 1e-2;
    /// Step-to-step change below which the board is at rest
    pub const REST_TOLERANCE: f64 = 1e-5;
    /// Step cap for a single simulation (1000 s of simulated time)
    pub const MAX_STEPS: usize = 100_000;

    pub const GRAVITY: f64 = 9.8;
    pub const KINETIC_FRICTION: f64 = 0.1;

    /// Puck mass (kg)
    pub const PUCK_MASS: f64 = 0.345;
    /// Puck radius (m), a 2 5/16" table shuffleboard weight
    pub const PUCK_RADIUS: f64 = 0.02936875;

    /// Board dimensions (m), 8' x 16"
    pub const BOARD_LENGTH: f64 = 2.4384;
    pub const BOARD_WIDTH: f64 = 0.4064;

    /// Default release distance from the shooter's end (m)
    pub const RELEASE_Y: f64 = 0.1;

    /// Most values a single velocity sweep may expand to
    pub const MAX_SWEEP_VALUES: usize = 10_000;
    /// Most candidates a single search may evaluate
    pub const MAX_CANDIDATES: usize = 1_000_000;
    /// Largest accepted smoothing sigma (cells)
    pub const MAX_SMOOTHING_SIGMA: f64 = 100.0;
}

