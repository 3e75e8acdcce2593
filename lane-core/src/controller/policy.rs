//! Adapter for decision models that live outside the core.

use crate::agent::{Agent, STATE_LEN};
use crate::controller::{Action, Controller};

/// An external model over the normalized state vector. Returning `None`
/// means the model could not produce an answer this tick.
pub trait Policy {
    fn evaluate(&mut self, state: &[f64; STATE_LEN]) -> Option<[f64; 2]>;
}

impl<F> Policy for F
where
    F: FnMut(&[f64; STATE_LEN]) -> Option<[f64; 2]>,
{
    fn evaluate(&mut self, state: &[f64; STATE_LEN]) -> Option<[f64; 2]> {
        self(state)
    }
}

/// Runs a [`Policy`] and falls back to [`Action::SAFE_DEFAULT`] when the
/// model is missing or answers with non-finite values.
pub struct PolicyController {
    policy: Option<Box<dyn Policy + Send>>,
    fallbacks: u64,
}

impl PolicyController {
    pub fn new(policy: Box<dyn Policy + Send>) -> Self {
        Self {
            policy: Some(policy),
            fallbacks: 0,
        }
    }

    /// No model loaded: every tick uses the safe default.
    pub fn untrained() -> Self {
        Self {
            policy: None,
            fallbacks: 0,
        }
    }

    pub fn is_trained(&self) -> bool {
        self.policy.is_some()
    }

    /// Ticks answered with the safe default.
    pub fn fallbacks(&self) -> u64 {
        self.fallbacks
    }
}

impl Controller for PolicyController {
    fn id(&self) -> &'static str {
        "policy"
    }

    fn description(&self) -> &'static str {
        "External model over the 17-value state vector, safe default when unavailable."
    }

    fn reset(&mut self, _seed: u32) {
        self.fallbacks = 0;
    }

    fn compute(&mut self, agent: &Agent) -> Action {
        let answer = self
            .policy
            .as_mut()
            .and_then(|policy| policy.evaluate(&agent.state_vector()))
            .filter(|[steering, throttle]| steering.is_finite() && throttle.is_finite());

        match answer {
            Some([steering, throttle]) => Action::new(steering, throttle).clamped(),
            None => {
                if self.fallbacks == 0 {
                    tracing::warn!("policy unavailable, using safe default action");
                }
                self.fallbacks += 1;
                Action::SAFE_DEFAULT
            }
        }
    }
}
