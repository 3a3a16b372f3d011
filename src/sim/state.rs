//! Puck state vector
//!
//! A [`State`] holds one position and one velocity per puck. The simulator
//! treats it as a flat vector `[positions.., velocities..]` so that a
//! derivative can be scaled by the timestep and added back.

use std::fmt;
use std::ops::Mul;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Position and velocity of a single puck
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PuckState {
    pub pos: DVec2,
    pub vel: DVec2,
}

impl PuckState {
    pub fn new(pos: DVec2, vel: DVec2) -> Self {
        Self { pos, vel }
    }
}

/// Release parameters for one shot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    pub release_x: f64,
    pub release_y: f64,
    pub x_velocity: f64,
    pub y_velocity: f64,
}

impl Shot {
    /// The puck state at the moment of release
    pub fn release(&self) -> PuckState {
        PuckState::new(
            DVec2::new(self.release_x, self.release_y),
            DVec2::new(self.x_velocity, self.y_velocity),
        )
    }
}

/// Positions and velocities of every puck on the board
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct State {
    positions: Vec<DVec2>,
    velocities: Vec<DVec2>,
}

impl State {
    /// All pucks at the origin and at rest
    pub fn new(num_pucks: usize) -> Self {
        Self {
            positions: vec![DVec2::ZERO; num_pucks],
            velocities: vec![DVec2::ZERO; num_pucks],
        }
    }

    /// Build a state from explicit vectors, rejecting mismatched lengths
    pub fn from_parts(positions: Vec<DVec2>, velocities: Vec<DVec2>) -> SimResult<Self> {
        if positions.len() != velocities.len() {
            return Err(SimError::MalformedState {
                positions: positions.len(),
                velocities: velocities.len(),
            });
        }
        Ok(Self {
            positions,
            velocities,
        })
    }

    #[inline]
    pub fn num_pucks(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[DVec2] {
        &self.positions
    }

    pub fn velocities(&self) -> &[DVec2] {
        &self.velocities
    }

    /// Check the length invariant (deserialized states can violate it)
    pub fn check_shape(&self) -> SimResult<()> {
        if self.positions.len() != self.velocities.len() {
            return Err(SimError::MalformedState {
                positions: self.positions.len(),
                velocities: self.velocities.len(),
            });
        }
        Ok(())
    }

    /// True if every component is finite
    pub fn is_finite(&self) -> bool {
        self.positions
            .iter()
            .chain(self.velocities.iter())
            .all(|v| v.is_finite())
    }

    /// Reject states that break the length invariant or hold non-finite values
    pub fn validate(&self) -> SimResult<()> {
        self.check_shape()?;
        if !self.is_finite() {
            return Err(SimError::NumericalDivergence { step: 0 });
        }
        Ok(())
    }

    #[inline]
    fn check_index(&self, i: usize) -> SimResult<()> {
        if i >= self.num_pucks() {
            return Err(SimError::OutOfRange {
                index: i,
                len: self.num_pucks(),
            });
        }
        Ok(())
    }

    pub fn get_position(&self, i: usize) -> SimResult<DVec2> {
        self.check_index(i)?;
        Ok(self.positions[i])
    }

    pub fn get_velocity(&self, i: usize) -> SimResult<DVec2> {
        self.check_index(i)?;
        Ok(self.velocities[i])
    }

    pub fn set_position(&mut self, i: usize, pos: DVec2) -> SimResult<()> {
        self.check_index(i)?;
        self.positions[i] = pos;
        Ok(())
    }

    pub fn set_velocity(&mut self, i: usize, vel: DVec2) -> SimResult<()> {
        self.check_index(i)?;
        self.velocities[i] = vel;
        Ok(())
    }

    pub fn get_full(&self, i: usize) -> SimResult<PuckState> {
        self.check_index(i)?;
        Ok(PuckState::new(self.positions[i], self.velocities[i]))
    }

    pub fn set_full(&mut self, i: usize, puck: PuckState) -> SimResult<()> {
        self.check_index(i)?;
        self.positions[i] = puck.pos;
        self.velocities[i] = puck.vel;
        Ok(())
    }

    fn check_same_size(&self, other: &State) -> SimResult<()> {
        if self.num_pucks() != other.num_pucks() {
            return Err(SimError::MalformedState {
                positions: self.num_pucks(),
                velocities: other.num_pucks(),
            });
        }
        Ok(())
    }

    /// Elementwise `self + other`
    pub fn add(&self, other: &State) -> SimResult<State> {
        self.add_scaled(other, 1.0)
    }

    /// Elementwise `self - other`
    pub fn subtract(&self, other: &State) -> SimResult<State> {
        self.add_scaled(other, -1.0)
    }

    /// Elementwise `self * factor`
    pub fn scale(&self, factor: f64) -> State {
        State {
            positions: self.positions.iter().map(|p| *p * factor).collect(),
            velocities: self.velocities.iter().map(|v| *v * factor).collect(),
        }
    }

    /// `self + other * factor`, the explicit Euler update
    pub fn add_scaled(&self, other: &State, factor: f64) -> SimResult<State> {
        self.check_same_size(other)?;
        let positions = self
            .positions
            .iter()
            .zip(&other.positions)
            .map(|(a, b)| *a + *b * factor)
            .collect();
        let velocities = self
            .velocities
            .iter()
            .zip(&other.velocities)
            .map(|(a, b)| *a + *b * factor)
            .collect();
        Ok(State {
            positions,
            velocities,
        })
    }

    /// Euclidean norm of the flattened state vector
    pub fn norm(&self) -> f64 {
        self.positions
            .iter()
            .chain(self.velocities.iter())
            .map(|v| v.length_squared())
            .sum::<f64>()
            .sqrt()
    }

    /// `‖self - other‖`, used as the convergence measure between steps
    pub fn distance(&self, other: &State) -> SimResult<f64> {
        self.check_same_size(other)?;
        let sum: f64 = self
            .positions
            .iter()
            .zip(&other.positions)
            .chain(self.velocities.iter().zip(&other.velocities))
            .map(|(a, b)| a.distance_squared(*b))
            .sum();
        Ok(sum.sqrt())
    }

    pub(crate) fn velocities_mut(&mut self) -> &mut [DVec2] {
        &mut self.velocities
    }
}

impl Mul<f64> for &State {
    type Output = State;

    fn mul(self, factor: f64) -> State {
        self.scale(factor)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (p, v)) in self.positions.iter().zip(&self.velocities).enumerate() {
            writeln!(f, "puck #{i}")?;
            writeln!(f, "   x: {}", p.x)?;
            writeln!(f, "   y: {}", p.y)?;
            writeln!(f, "  dx: {}", v.x)?;
            writeln!(f, "  dy: {}", v.y)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_pucks() -> State {
        State::from_parts(
            vec![DVec2::new(0.1, 0.2), DVec2::new(0.3, 0.4)],
            vec![DVec2::new(1.0, 0.0), DVec2::new(0.0, -2.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_new_is_zeroed() {
        let state = State::new(3);
        assert_eq!(state.num_pucks(), 3);
        assert!(state.positions().iter().all(|p| *p == DVec2::ZERO));
        assert!(state.velocities().iter().all(|v| *v == DVec2::ZERO));
        assert_eq!(state.norm(), 0.0);
    }

    #[test]
    fn test_from_parts_rejects_mismatch() {
        let err = State::from_parts(vec![DVec2::ZERO; 2], vec![DVec2::ZERO]).unwrap_err();
        assert_eq!(
            err,
            SimError::MalformedState {
                positions: 2,
                velocities: 1
            }
        );
    }

    #[test]
    fn test_accessors_out_of_range() {
        let mut state = State::new(2);
        assert_eq!(
            state.get_position(2),
            Err(SimError::OutOfRange { index: 2, len: 2 })
        );
        assert!(state.get_velocity(5).is_err());
        assert!(state.set_position(2, DVec2::ONE).is_err());
        assert!(state.set_velocity(2, DVec2::ONE).is_err());
        assert!(state.get_full(2).is_err());
        assert!(state.set_full(2, PuckState::default()).is_err());
    }

    #[test]
    fn test_set_full_roundtrip() {
        let mut state = State::new(2);
        let puck = PuckState::new(DVec2::new(0.2, 0.1), DVec2::new(0.0, 1.2));
        state.set_full(1, puck).unwrap();
        assert_eq!(state.get_full(1).unwrap(), puck);
        assert_eq!(state.get_position(0).unwrap(), DVec2::ZERO);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = two_pucks();
        let mut copy = original.clone();
        copy.set_position(0, DVec2::new(9.0, 9.0)).unwrap();
        assert_eq!(original.get_position(0).unwrap(), DVec2::new(0.1, 0.2));
    }

    #[test]
    fn test_arithmetic() {
        let a = two_pucks();
        let doubled = a.add(&a).unwrap();
        assert_eq!(doubled, a.scale(2.0));
        assert_eq!(&a * 2.0, doubled);

        let zero = a.subtract(&a).unwrap();
        assert_eq!(zero.norm(), 0.0);

        let stepped = a.add_scaled(&a, 0.5).unwrap();
        assert!((stepped.get_velocity(1).unwrap().y - (-3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_arithmetic_size_mismatch() {
        let a = State::new(2);
        let b = State::new(3);
        assert!(a.add(&b).is_err());
        assert!(a.distance(&b).is_err());
    }

    #[test]
    fn test_norm_and_distance() {
        let a = two_pucks();
        // 0.01 + 0.04 + 0.09 + 0.16 + 1 + 4
        assert!((a.norm() - 5.3_f64.sqrt()).abs() < 1e-12);
        assert!((a.distance(&State::new(2)).unwrap() - a.norm()).abs() < 1e-12);
    }

    #[test]
    fn test_validate() {
        assert!(two_pucks().validate().is_ok());
        let mut state = two_pucks();
        state.set_velocity(1, DVec2::new(f64::NAN, 0.0)).unwrap();
        assert_eq!(
            state.validate(),
            Err(SimError::NumericalDivergence { step: 0 })
        );
    }

    #[test]
    fn test_shot_release() {
        let shot = Shot {
            release_x: 0.2,
            release_y: 0.1,
            x_velocity: -0.05,
            y_velocity: 1.1,
        };
        let puck = shot.release();
        assert_eq!(puck.pos, DVec2::new(0.2, 0.1));
        assert_eq!(puck.vel, DVec2::new(-0.05, 1.1));
    }

    #[test]
    fn test_display_lists_pucks() {
        let text = two_pucks().to_string();
        assert!(text.contains("puck #0"));
        assert!(text.contains("puck #1"));
        assert!(text.contains("dy: -2"));
    }
}
