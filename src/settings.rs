//! Simulation and search settings
//!
//! Loaded from a JSON file; every field falls back to the defaults in
//! [`crate::consts`] when omitted.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SettingsError;

/// Physics and integrator parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    /// Fixed integration timestep (s)
    pub dt: f64,
    /// Velocity components below this are treated as stopped (m/s)
    pub min_velocity: f64,
    /// Rest is reached once a step moves the state less than this
    pub tol: f64,
    /// Step cap before giving up with `DidNotConverge`
    pub max_steps: usize,
    /// Puck mass (kg)
    pub puck_mass: f64,
    /// Puck radius (m)
    pub puck_radius: f64,
    /// Gravitational acceleration (m/s²)
    pub gravity: f64,
    /// Coefficient of kinetic friction between puck and board
    pub kinetic_friction: f64,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            dt: SIM_DT,
            min_velocity: MIN_VELOCITY,
            tol: REST_TOLERANCE,
            max_steps: MAX_STEPS,
            puck_mass: PUCK_MASS,
            puck_radius: PUCK_RADIUS,
            gravity: GRAVITY,
            kinetic_friction: KINETIC_FRICTION,
        }
    }
}

impl SimSettings {
    /// Magnitude of the Coulomb drag applied to a sliding puck
    #[inline]
    pub fn drag(&self) -> f64 {
        self.puck_mass * self.gravity * self.kinetic_friction
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        positive("sim.dt", self.dt)?;
        positive("sim.tol", self.tol)?;
        positive("sim.puck_radius", self.puck_radius)?;
        non_negative("sim.min_velocity", self.min_velocity)?;
        non_negative("sim.puck_mass", self.puck_mass)?;
        non_negative("sim.gravity", self.gravity)?;
        non_negative("sim.kinetic_friction", self.kinetic_friction)?;
        if self.max_steps == 0 {
            return Err(SettingsError::Invalid {
                field: "sim.max_steps",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// An inclusive sweep `min, min + step, ..., <= max`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sweep {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Sweep {
    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// Number of values in the sweep
    ///
    /// `None` when the range or step is degenerate, or when the sweep would
    /// expand past `MAX_SWEEP_VALUES`.
    pub fn count(&self) -> Option<usize> {
        if !self.step.is_finite() || self.step <= 0.0 || !self.min.is_finite() || !self.max.is_finite() {
            return None;
        }
        if self.max < self.min {
            return None;
        }
        // Tolerance keeps `max` when it sits on the lattice up to rounding
        let intervals = ((self.max - self.min) / self.step + 1e-9).floor();
        if !intervals.is_finite() || intervals >= MAX_SWEEP_VALUES as f64 {
            return None;
        }
        Some(intervals as usize + 1)
    }

    /// Expand into concrete values; empty when `count` is `None`
    pub fn values(&self) -> Vec<f64> {
        let Some(count) = self.count() else {
            return Vec::new();
        };
        (0..count)
            .map(|k| self.min + k as f64 * self.step)
            .collect()
    }
}

/// Candidate grid and selection parameters for the shot search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Lateral release positions (m from the left edge)
    pub release_xs: Vec<f64>,
    /// Release distance from the shooter's end (m)
    pub release_y: f64,
    /// Lateral velocity sweep (m/s)
    pub x_velocity: Sweep,
    /// Forward velocity sweep (m/s)
    pub y_velocity: Sweep,
    /// Gaussian sigma per grid axis, in cells: (release x, x velocity, y velocity)
    pub smoothing_sigma: [f64; 3],
    /// Seed for tie-breaking and random strategies
    pub seed: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            release_xs: vec![BOARD_WIDTH * 0.25, BOARD_WIDTH * 0.5, BOARD_WIDTH * 0.75],
            release_y: RELEASE_Y,
            x_velocity: Sweep::new(-0.25, 0.25, 0.05),
            y_velocity: Sweep::new(0.4, 1.2, 0.05),
            smoothing_sigma: [1.0, 1.0, 1.0],
            seed: 0,
        }
    }
}

impl SearchSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        for sigma in self.smoothing_sigma {
            non_negative("search.smoothing_sigma", sigma)?;
            if sigma > MAX_SMOOTHING_SIGMA {
                return Err(SettingsError::Invalid {
                    field: "search.smoothing_sigma",
                    reason: format!("must be at most {MAX_SMOOTHING_SIGMA}, got {sigma}"),
                });
            }
        }
        if !self.release_y.is_finite() {
            return Err(SettingsError::Invalid {
                field: "search.release_y",
                reason: "must be finite".to_string(),
            });
        }
        if let Some(x) = self.release_xs.iter().find(|x| !x.is_finite()) {
            return Err(SettingsError::Invalid {
                field: "search.release_xs",
                reason: format!("must be finite, got {x}"),
            });
        }

        let nx = check_sweep("search.x_velocity", &self.x_velocity)?;
        let ny = check_sweep("search.y_velocity", &self.y_velocity)?;
        let candidates = self
            .release_xs
            .len()
            .checked_mul(nx)
            .and_then(|n| n.checked_mul(ny))
            .filter(|&n| n <= MAX_CANDIDATES);
        if candidates.is_none() {
            return Err(SettingsError::Invalid {
                field: "search",
                reason: format!("grid exceeds {MAX_CANDIDATES} candidates"),
            });
        }
        Ok(())
    }
}

/// Top-level settings file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sim: SimSettings,
    pub search: SearchSettings,
    /// Worker threads for candidate evaluation (0 = one per core)
    pub threads: usize,
}

impl Settings {
    /// Parse and validate settings from JSON text
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.sim.validate()?;
        self.search.validate()
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), SettingsError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SettingsError::Invalid {
            field,
            reason: format!("must be positive, got {value}"),
        })
    }
}

/// Check a sweep and return how many values it expands to
fn check_sweep(field: &'static str, sweep: &Sweep) -> Result<usize, SettingsError> {
    let invalid = |reason: String| SettingsError::Invalid { field, reason };
    if !sweep.min.is_finite() || !sweep.max.is_finite() {
        return Err(invalid(format!(
            "bounds must be finite, got {}..{}",
            sweep.min, sweep.max
        )));
    }
    if !sweep.step.is_finite() || sweep.step <= 0.0 {
        return Err(invalid(format!("step must be positive, got {}", sweep.step)));
    }
    if sweep.max < sweep.min {
        return Err(invalid(format!(
            "max {} is below min {}",
            sweep.max, sweep.min
        )));
    }
    sweep
        .count()
        .ok_or_else(|| invalid(format!("expands past {MAX_SWEEP_VALUES} values")))
}

fn non_negative(field: &'static str, value: f64) -> Result<(), SettingsError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SettingsError::Invalid {
            field,
            reason: format!("must be non-negative, got {value}"),
        })
    }
}
