//! Fixed-timestep race session.
//!
//! Every tick advances each entrant in insertion order: sensors, decision,
//! actuation, integration, then collision, checkpoint and finish checks.

use serde::Serialize;

use crate::agent::{Agent, AgentSnapshot};
use crate::config::SimConfig;
use crate::controller::{Action, Controller};
use crate::error::ConfigError;
use crate::record::Recorder;
use crate::track::{Track, TrackSnapshot};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RaceEvent {
    Crashed { entrant: usize },
    Checkpoint { entrant: usize, passed: usize },
    Finished { entrant: usize },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TickReport {
    pub tick: u32,
    pub actions: Vec<Action>,
    pub events: Vec<RaceEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntrantResult {
    pub label: String,
    pub controller_id: String,
    pub checkpoints: usize,
    pub progress: f64,
    pub total_distance: f64,
    pub crashed: bool,
    pub crash_ticks: u32,
    pub final_x: f64,
    pub final_y: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RaceOutcome {
    pub ticks: u32,
    pub winner: Option<usize>,
    pub winner_label: Option<String>,
    pub entrants: Vec<EntrantResult>,
}

struct Entrant {
    label: String,
    agent: Agent,
    controller: Box<dyn Controller>,
    crash_ticks: u32,
}

pub struct Race {
    cfg: SimConfig,
    track: Track,
    entrants: Vec<Entrant>,
    tick: u32,
    winner: Option<usize>,
}

impl Race {
    pub fn new(cfg: SimConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let track = Track::new(cfg.track.clone())?;
        Ok(Self {
            cfg,
            track,
            entrants: Vec::new(),
            tick: 0,
            winner: None,
        })
    }

    /// Spawns a new agent in the next free lane and returns its index.
    pub fn add_entrant(&mut self, label: impl Into<String>, controller: Box<dyn Controller>) -> usize {
        let index = self.entrants.len();
        let pose = self.track.start_pose(index as u32);
        self.entrants.push(Entrant {
            label: label.into(),
            agent: Agent::new(self.cfg.agent.clone(), pose),
            controller,
            crash_ticks: 0,
        });
        index
    }

    /// Puts every entrant back on its start pose and reseeds controllers.
    pub fn reset(&mut self, seed: u32) {
        for (index, entrant) in self.entrants.iter_mut().enumerate() {
            entrant.agent.reset(self.track.start_pose(index as u32));
            entrant.controller.reset(entrant_seed(seed, index));
            entrant.crash_ticks = 0;
        }
        self.tick = 0;
        self.winner = None;
    }

    pub fn config(&self) -> &SimConfig {
        &self.cfg
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn track_snapshot(&self) -> TrackSnapshot {
        self.track.snapshot()
    }

    pub fn tick_count(&self) -> u32 {
        self.tick
    }

    pub fn winner(&self) -> Option<usize> {
        self.winner
    }

    pub fn entrant_count(&self) -> usize {
        self.entrants.len()
    }

    pub fn agent(&self, index: usize) -> Option<&Agent> {
        self.entrants.get(index).map(|e| &e.agent)
    }

    pub fn snapshots(&self) -> Vec<AgentSnapshot> {
        self.entrants.iter().map(|e| e.agent.snapshot()).collect()
    }

    pub fn tick(&mut self) -> TickReport {
        self.step(None)
    }

    /// Like [`Race::tick`], feeding the first entrant's frame to `recorder`.
    pub fn tick_recorded(&mut self, recorder: &mut dyn Recorder) -> TickReport {
        self.step(Some(recorder))
    }

    fn step(&mut self, mut recorder: Option<&mut dyn Recorder>) -> TickReport {
        self.tick += 1;
        let mut report = TickReport {
            tick: self.tick,
            actions: Vec::with_capacity(self.entrants.len()),
            events: Vec::new(),
        };
        let checkpoint_total = self.track.checkpoint_count();
        let race_cfg = &self.cfg.race;

        for (index, entrant) in self.entrants.iter_mut().enumerate() {
            let agent = &mut entrant.agent;
            agent.refresh_sensors(&self.track);
            let action = entrant.controller.compute(agent).clamped();
            if index == 0 {
                if let Some(recorder) = recorder.as_deref_mut() {
                    recorder.record(agent, action);
                }
            }
            agent.apply_controller_action(action);
            agent.integrate();
            report.actions.push(action);

            if self.track.detect_collision(agent) {
                if !agent.crashed() {
                    report.events.push(RaceEvent::Crashed { entrant: index });
                    tracing::debug!(entrant = %entrant.label, tick = self.tick, "crashed");
                }
                agent.mark_crashed(race_cfg.crash_speed_factor);
                entrant.crash_ticks += 1;
            }

            let previous = agent.previous_position();
            if self
                .track
                .detect_checkpoint_crossing(agent, agent.checkpoints(), Some(previous))
            {
                agent.advance_checkpoint(checkpoint_total);
                let passed = agent.checkpoints();
                report.events.push(RaceEvent::Checkpoint {
                    entrant: index,
                    passed,
                });
                tracing::debug!(
                    entrant = %entrant.label,
                    passed,
                    total = checkpoint_total,
                    "checkpoint"
                );
            }

            let reached_finish = agent.position().y >= self.track.finish_y();
            let checkpoints_done =
                !race_cfg.require_all_checkpoints || agent.checkpoints() >= checkpoint_total;
            if self.winner.is_none() && reached_finish && checkpoints_done {
                self.winner = Some(index);
                report.events.push(RaceEvent::Finished { entrant: index });
                tracing::info!(entrant = %entrant.label, tick = self.tick, "finished first");
            }
        }

        report
    }

    /// Ticks until someone wins or `max_ticks` have elapsed in total.
    pub fn run(&mut self, max_ticks: u32) -> RaceOutcome {
        while self.winner.is_none() && self.tick < max_ticks {
            self.step(None);
        }
        self.outcome()
    }

    pub fn run_recorded(&mut self, max_ticks: u32, recorder: &mut dyn Recorder) -> RaceOutcome {
        while self.winner.is_none() && self.tick < max_ticks {
            self.step(Some(&mut *recorder));
        }
        self.outcome()
    }

    pub fn outcome(&self) -> RaceOutcome {
        RaceOutcome {
            ticks: self.tick,
            winner: self.winner,
            winner_label: self.winner.map(|i| self.entrants[i].label.clone()),
            entrants: self
                .entrants
                .iter()
                .map(|e| EntrantResult {
                    label: e.label.clone(),
                    controller_id: e.controller.id().to_string(),
                    checkpoints: e.agent.checkpoints(),
                    progress: self.track.progress(e.agent.checkpoints()),
                    total_distance: e.agent.total_distance(),
                    crashed: e.agent.crashed(),
                    crash_ticks: e.crash_ticks,
                    final_x: e.agent.position().x,
                    final_y: e.agent.position().y,
                })
                .collect(),
        }
    }
}

fn entrant_seed(seed: u32, index: usize) -> u32 {
    seed ^ (index as u32).wrapping_mul(0x9E37_79B9)
}
