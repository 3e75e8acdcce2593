pub mod agent;
pub mod config;
pub mod controller;
pub mod error;
pub mod race;
pub mod record;
pub mod rng;
pub mod track;

pub use agent::{Agent, AgentSnapshot, ManualInput, Pose, SENSOR_COUNT, STATE_LEN};
pub use config::{AgentConfig, HybridConfig, RaceConfig, SimConfig, TrackConfig};
pub use controller::{Action, Controller};
pub use error::ConfigError;
pub use race::{Race, RaceOutcome};
pub use track::{Point, Track};
