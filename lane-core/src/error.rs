use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    NonPositive { field: &'static str, value: f64 },
    Negative { field: &'static str, value: f64 },
    OutOfUnitRange { field: &'static str, value: f64 },
    ZeroLanes,
    ZeroCheckpoints,
    StartBeyondFinish { start_y: f64, finish_y: f64 },
    RecoveryPhasesUnordered { ticks: u32, hard_above: u32, reverse_above: u32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositive { field, value } => {
                write!(f, "{field} must be > 0, got {value}")
            }
            Self::Negative { field, value } => {
                write!(f, "{field} must be >= 0, got {value}")
            }
            Self::OutOfUnitRange { field, value } => {
                write!(f, "{field} must be within [-1, 1], got {value}")
            }
            Self::ZeroLanes => write!(f, "track must have at least one lane"),
            Self::ZeroCheckpoints => write!(f, "track must have at least one checkpoint"),
            Self::StartBeyondFinish { start_y, finish_y } => write!(
                f,
                "start line ({start_y}) must lie before the finish line ({finish_y})"
            ),
            Self::RecoveryPhasesUnordered {
                ticks,
                hard_above,
                reverse_above,
            } => write!(
                f,
                "recovery phases must satisfy ticks ({ticks}) > hard_above ({hard_above}) > reverse_above ({reverse_above})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
