//! Per-tick capture of what an agent perceived and what it was told to do.
//! Persistence is left to whoever drains the frames.

use serde::Serialize;

use crate::agent::{Agent, SENSOR_COUNT};
use crate::controller::Action;

pub const DEFAULT_MIN_RECORD_SPEED: f64 = 1.0;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameRecord {
    /// Sensor distances divided by the sensor range.
    pub sensors: [f64; SENSOR_COUNT],
    /// Speed divided by the maximum speed.
    pub speed: f64,
    pub steering: f64,
    pub throttle: f64,
}

impl FrameRecord {
    pub fn capture(agent: &Agent, action: Action) -> Self {
        let state = agent.state_vector();
        let mut sensors = [0.0; SENSOR_COUNT];
        sensors.copy_from_slice(&state[1..]);
        Self {
            sensors,
            speed: state[0],
            steering: action.steering,
            throttle: action.throttle,
        }
    }
}

pub trait Recorder {
    fn record(&mut self, agent: &Agent, action: Action);
}

/// In-memory buffer that only keeps frames while active and while the
/// agent is moving and uncrashed.
#[derive(Debug, Default)]
pub struct SessionRecorder {
    frames: Vec<FrameRecord>,
    active: bool,
    min_speed: f64,
}

impl SessionRecorder {
    pub fn new(min_speed: f64) -> Self {
        Self {
            frames: Vec::new(),
            active: false,
            min_speed,
        }
    }

    /// Clears the buffer and starts a new session.
    pub fn start(&mut self) {
        self.frames.clear();
        self.active = true;
    }

    /// Ends the session and hands back the buffered frames.
    pub fn stop(&mut self) -> Vec<FrameRecord> {
        self.active = false;
        std::mem::take(&mut self.frames)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn status(&self) -> String {
        if self.active {
            format!("recording [{} frames]", self.frames.len())
        } else {
            "idle".to_string()
        }
    }
}

impl Recorder for SessionRecorder {
    fn record(&mut self, agent: &Agent, action: Action) {
        if !self.active || agent.speed().abs() < self.min_speed || agent.crashed() {
            return;
        }
        self.frames.push(FrameRecord::capture(agent, action));
    }
}
