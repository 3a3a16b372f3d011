//! Deterministic puck simulation
//!
//! Everything the integrator needs lives here. This module must stay pure:
//! - Fixed timestep only
//! - Stable iteration order (by puck index)
//! - No randomness, rendering or I/O

pub mod collision;
pub mod state;
pub mod tick;

pub use collision::{Contact, along_line, exchange_velocities, is_closing_contact};
pub use state::{PuckState, Shot, State};
pub use tick::{Simulation, Simulator, StepDerivative, Trajectory};
