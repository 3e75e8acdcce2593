//! Decision makers that turn an agent's perceived state into an action.

pub mod cruise;
pub mod hybrid;
pub mod policy;

use serde::Serialize;

use crate::agent::Agent;

pub use cruise::{CruiseController, Difficulty};
pub use hybrid::{ControllerPhase, HybridController};
pub use policy::{Policy, PolicyController};

/// Steering in `[-1, 1]` (negative turns left) and throttle in `[-1, 1]`
/// (negative reverses).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Action {
    pub steering: f64,
    pub throttle: f64,
}

impl Action {
    /// Substituted whenever an external decision model cannot answer.
    pub const SAFE_DEFAULT: Action = Action {
        steering: 0.0,
        throttle: 0.5,
    };

    pub const fn new(steering: f64, throttle: f64) -> Self {
        Self { steering, throttle }
    }

    /// Both components clamped to `[-1, 1]`; NaN becomes 0.
    pub fn clamped(self) -> Self {
        Self {
            steering: clamp_unit(self.steering),
            throttle: clamp_unit(self.throttle),
        }
    }

    pub fn as_array(self) -> [f64; 2] {
        [self.steering, self.throttle]
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}

pub trait Controller {
    fn id(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// Clears per-run state and reseeds any randomness.
    fn reset(&mut self, seed: u32);
    fn compute(&mut self, agent: &Agent) -> Action;
}
