use serde::{Deserialize, Serialize};
use std::fmt;

/// What the presentation layer shows as the sleep state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepDecision {
    /// No round has completed yet
    #[default]
    Undetermined,
    Sleeping,
    NotSleeping,
}

impl SleepDecision {
    #[must_use]
    pub const fn from_classification(sleeping: bool) -> Self {
        if sleeping {
            Self::Sleeping
        } else {
            Self::NotSleeping
        }
    }

    #[must_use]
    pub const fn is_sleeping(&self) -> bool {
        matches!(self, Self::Sleeping)
    }

    /// Get human-readable description
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Undetermined => "Determining sleep status...",
            Self::Sleeping => "User is likely sleeping",
            Self::NotSleeping => "User is likely not sleeping",
        }
    }
}

impl fmt::Display for SleepDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Snapshot published to subscribers after every completed round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorStatus {
    pub decision: SleepDecision,
    /// Debug scalars from the orientation register at publish time
    pub roll: Option<f64>,
    pub pitch: Option<f64>,
    /// Mean heart rate used for the last round, if there was one
    pub heart_rate: Option<f64>,
    pub rounds_completed: u64,
    pub polling: bool,
}

impl fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.decision)?;
        match (self.roll, self.pitch) {
            (Some(roll), Some(pitch)) => writeln!(f, "Roll: {roll:.5}\nPitch: {pitch:.5}")?,
            _ => writeln!(f, "Roll: -\nPitch: -")?,
        }
        match self.heart_rate {
            Some(bpm) => write!(f, "Heart rate: {bpm:.1} bpm"),
            None => write!(f, "Heart rate: -"),
        }
    }
}
