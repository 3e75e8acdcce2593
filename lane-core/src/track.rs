//! Straight multi-lane track: an axis-aligned rectangle with ordered
//! checkpoint lines between the start line and the finish line.

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, Pose};
use crate::config::TrackConfig;
use crate::error::ConfigError;

/// Heading of an agent driving down the lane (facing south).
pub const FORWARD_HEADING: f64 = 180.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckpointLine {
    pub start: Point,
    pub end: Point,
    pub orientation: Orientation,
}

impl CheckpointLine {
    /// Crossing test with a tolerance band around the line.
    ///
    /// The current position must sit within the line's span (widened by
    /// `tolerance`). With a previous position the longitudinal coordinate has
    /// to move onto the band's near edge from outside it; without one, plain
    /// proximity is used.
    pub fn crossed(&self, current: Point, previous: Option<Point>, tolerance: f64) -> bool {
        // (lateral, longitudinal) coordinates relative to the line.
        let (span_a, span_b, line) = match self.orientation {
            Orientation::Horizontal => (self.start.x, self.end.x, self.start.y),
            Orientation::Vertical => (self.start.y, self.end.y, self.start.x),
        };
        let project = |p: Point| match self.orientation {
            Orientation::Horizontal => (p.x, p.y),
            Orientation::Vertical => (p.y, p.x),
        };

        let (lateral, along) = project(current);
        let lo = span_a.min(span_b) - tolerance;
        let hi = span_a.max(span_b) + tolerance;
        if lateral < lo || lateral > hi {
            return false;
        }

        match previous {
            Some(prev) => {
                let (_, prev_along) = project(prev);
                let entered_forward = prev_along < line - tolerance && along >= line - tolerance;
                let entered_backward = prev_along > line + tolerance && along <= line + tolerance;
                entered_forward || entered_backward
            }
            None => (along - line).abs() < tolerance,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackSnapshot {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub length: f64,
    pub lanes: u32,
    pub start_line_y: f64,
    pub finish_line_y: f64,
    pub checkpoints: Vec<CheckpointLine>,
}

#[derive(Clone, Debug)]
pub struct Track {
    cfg: TrackConfig,
    checkpoints: Vec<CheckpointLine>,
}

impl Track {
    pub fn new(cfg: TrackConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self::build(cfg))
    }

    fn build(cfg: TrackConfig) -> Self {
        let start_y = cfg.y + cfg.start_line_offset;
        let finish_y = cfg.y + cfg.length - cfg.finish_line_offset;
        let segment = (finish_y - start_y) / cfg.checkpoints as f64;
        let checkpoints = (1..=cfg.checkpoints)
            .map(|i| {
                let y = start_y + segment * i as f64;
                CheckpointLine {
                    start: Point::new(cfg.x, y),
                    end: Point::new(cfg.x + cfg.width, y),
                    orientation: Orientation::Horizontal,
                }
            })
            .collect();
        Self { cfg, checkpoints }
    }

    pub fn config(&self) -> &TrackConfig {
        &self.cfg
    }

    pub fn left(&self) -> f64 {
        self.cfg.x
    }

    pub fn right(&self) -> f64 {
        self.cfg.x + self.cfg.width
    }

    pub fn top(&self) -> f64 {
        self.cfg.y
    }

    pub fn bottom(&self) -> f64 {
        self.cfg.y + self.cfg.length
    }

    pub fn lane_width(&self) -> f64 {
        self.cfg.width / self.cfg.lanes as f64
    }

    pub fn start_line_y(&self) -> f64 {
        self.cfg.y + self.cfg.start_line_offset
    }

    pub fn finish_y(&self) -> f64 {
        self.cfg.y + self.cfg.length - self.cfg.finish_line_offset
    }

    pub fn checkpoints(&self) -> &[CheckpointLine] {
        &self.checkpoints
    }

    pub fn checkpoint_count(&self) -> usize {
        self.checkpoints.len()
    }

    /// Fraction of checkpoints passed, in `[0, 1]`.
    pub fn progress(&self, passed: usize) -> f64 {
        if self.checkpoints.is_empty() {
            return 0.0;
        }
        passed.min(self.checkpoints.len()) as f64 / self.checkpoints.len() as f64
    }

    /// Inclusive on every edge.
    pub fn is_within_bounds(&self, point: Point) -> bool {
        (self.left()..=self.right()).contains(&point.x)
            && (self.top()..=self.bottom()).contains(&point.y)
    }

    pub fn detect_collision(&self, agent: &Agent) -> bool {
        agent
            .corners()
            .iter()
            .any(|corner| !self.is_within_bounds(*corner))
    }

    pub fn detect_checkpoint_crossing(
        &self,
        agent: &Agent,
        checkpoint_index: usize,
        previous_position: Option<Point>,
    ) -> bool {
        let Some(line) = self.checkpoints.get(checkpoint_index) else {
            return false;
        };
        line.crossed(
            agent.position(),
            previous_position,
            self.cfg.checkpoint_tolerance,
        )
    }

    /// Spawn pose centered in `lane`, just past the start line, facing down
    /// the lane. Indices past the last lane use the last lane.
    pub fn start_pose(&self, lane: u32) -> Pose {
        let lane = lane.min(self.cfg.lanes - 1);
        let lane_width = self.lane_width();
        Pose {
            x: self.cfg.x + lane_width / 2.0 + lane as f64 * lane_width,
            y: self.start_line_y() + self.cfg.spawn_offset,
            heading: FORWARD_HEADING,
        }
    }

    pub fn snapshot(&self) -> TrackSnapshot {
        TrackSnapshot {
            x: self.cfg.x,
            y: self.cfg.y,
            width: self.cfg.width,
            length: self.cfg.length,
            lanes: self.cfg.lanes,
            start_line_y: self.start_line_y(),
            finish_line_y: self.finish_y(),
            checkpoints: self.checkpoints.clone(),
        }
    }
}

impl Default for Track {
    fn default() -> Self {
        Self::build(TrackConfig::default())
    }
}
