//! Fixed timestep integrator
//!
//! Advances a [`State`] under Coulomb friction and puck-puck contacts until
//! the change between consecutive steps drops below the rest tolerance.

use glam::DVec2;

use super::collision::{Contact, exchange_velocities, is_closing_contact};
use super::state::{Shot, State};
use crate::error::{SimError, SimResult};
use crate::settings::SimSettings;

/// Result of evaluating the closed-loop dynamics at one state
#[derive(Debug, Clone)]
pub struct StepDerivative {
    /// The input state with sub-threshold velocity components zeroed
    pub snapped: State,
    /// Time derivative: snapped velocities in the position slots,
    /// accelerations in the velocity slots
    pub derivative: State,
    /// Pairs `(a, b)` with `a < b` that touched this step
    pub contacts: Vec<(usize, usize)>,
}

/// Every state visited on the way to rest, plus the contacts along the way
#[derive(Debug, Clone, Default)]
pub struct Trajectory {
    states: Vec<State>,
    contacts: Vec<Contact>,
}

impl Trajectory {
    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn last(&self) -> Option<&State> {
        self.states.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, State> {
        self.states.iter()
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a State;
    type IntoIter = std::slice::Iter<'a, State>;

    fn into_iter(self) -> Self::IntoIter {
        self.states.iter()
    }
}

/// Output of a full simulation
#[derive(Debug, Clone)]
pub struct Simulation {
    /// Final resting state
    pub rest: State,
    /// Initial state, every intermediate state and the rest state
    pub trajectory: Trajectory,
}

/// Puck physics integrator
///
/// Holds no mutable state, so one instance can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Simulator {
    settings: SimSettings,
}

impl Simulator {
    pub fn new(settings: SimSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SimSettings {
        &self.settings
    }

    /// Zero each velocity component slower than `min_velocity`
    #[inline]
    fn snap(&self, vel: DVec2) -> DVec2 {
        let min = self.settings.min_velocity;
        DVec2::new(
            if vel.x.abs() < min { 0.0 } else { vel.x },
            if vel.y.abs() < min { 0.0 } else { vel.y },
        )
    }

    /// Coulomb drag opposing `vel`, capped so one step cannot reverse it
    #[inline]
    fn friction(&self, vel: DVec2) -> DVec2 {
        let speed = vel.length();
        if speed == 0.0 {
            return DVec2::ZERO;
        }
        let magnitude = self.settings.drag().min(speed / self.settings.dt);
        -vel / speed * magnitude
    }

    /// Evaluate the closed-loop dynamics at `state`
    pub fn derivative(&self, state: &State) -> SimResult<StepDerivative> {
        state.check_shape()?;
        let dt = self.settings.dt;
        let radius = self.settings.puck_radius;
        let n = state.num_pucks();

        let mut snapped = state.clone();
        for vel in snapped.velocities_mut() {
            *vel = self.snap(*vel);
        }
        let positions = snapped.positions();
        let velocities = snapped.velocities();

        let mut accelerations: Vec<DVec2> = velocities.iter().map(|v| self.friction(*v)).collect();

        // Detection uses the pre-contact velocities; resolution composes in pair order
        let mut resolved = velocities.to_vec();
        let mut touched = vec![false; n];
        let mut contacts = Vec::new();
        for a in 0..n {
            for b in (a + 1)..n {
                if !is_closing_contact(
                    positions[a],
                    velocities[a],
                    positions[b],
                    velocities[b],
                    radius,
                    dt,
                ) {
                    continue;
                }
                let (new_a, new_b) =
                    exchange_velocities(positions[a], resolved[a], positions[b], resolved[b]);
                resolved[a] = new_a;
                resolved[b] = new_b;
                touched[a] = true;
                touched[b] = true;
                contacts.push((a, b));
            }
        }

        for i in 0..n {
            if touched[i] {
                accelerations[i] = (resolved[i] - velocities[i]) / dt;
            }
        }

        let derivative = State::from_parts(velocities.to_vec(), accelerations)?;
        Ok(StepDerivative {
            snapped,
            derivative,
            contacts,
        })
    }

    /// Advance one explicit Euler step
    pub fn step(&self, state: &State) -> SimResult<(State, Vec<(usize, usize)>)> {
        let StepDerivative {
            snapped,
            derivative,
            contacts,
        } = self.derivative(state)?;
        let next = snapped.add_scaled(&derivative, self.settings.dt)?;
        Ok((next, contacts))
    }

    /// Run `state` to rest, recording the full trajectory
    pub fn simulate(&self, state: &State) -> SimResult<Simulation> {
        let mut states = vec![state.clone()];
        let mut contacts = Vec::new();
        let rest = self.run(state, |next, step, touching| {
            states.push(next.clone());
            contacts.extend(touching.iter().map(|&(a, b)| Contact { step, a, b }));
        })?;
        Ok(Simulation {
            rest,
            trajectory: Trajectory { states, contacts },
        })
    }

    /// Run `state` to rest without keeping intermediate states
    pub fn simulate_to_rest(&self, state: &State) -> SimResult<State> {
        self.run(state, |_, _, _| {})
    }

    /// Place `puck` at the shot's release point and run to rest
    pub fn apply_shot(&self, state: &State, puck: usize, shot: &Shot) -> SimResult<Simulation> {
        let mut working = state.clone();
        working.set_full(puck, shot.release())?;
        self.simulate(&working)
    }

    fn run(
        &self,
        initial: &State,
        mut observe: impl FnMut(&State, usize, &[(usize, usize)]),
    ) -> SimResult<State> {
        initial.validate()?;

        let mut current = initial.clone();
        let mut total_contacts = 0usize;
        for step in 1..=self.settings.max_steps {
            let (next, contacts) = self.step(&current)?;
            if !next.is_finite() {
                log::warn!("Simulation diverged at step {}", step);
                return Err(SimError::NumericalDivergence { step });
            }
            for (a, b) in &contacts {
                log::trace!("Step {}: contact between pucks {} and {}", step, a, b);
            }
            total_contacts += contacts.len();
            observe(&next, step, &contacts);

            let delta = next.distance(&current)?;
            current = next;
            if delta < self.settings.tol {
                log::debug!("Rest after {} steps ({} contacts)", step, total_contacts);
                return Ok(current);
            }
        }

        log::warn!(
            "No rest state within {} steps",
            self.settings.max_steps
        );
        Err(SimError::DidNotConverge {
            steps: self.settings.max_steps,
        })
    }
}
