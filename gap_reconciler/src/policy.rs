use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Thresholds of the three-tier gap policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapPolicy {
    /// Longest gap, in hours, still filled by linear interpolation.
    pub n_hours: u32,
    /// Days on each side of a long gap used to build the average day.
    pub days_around: u32,
    /// Largest gap, relative to the series length, that is auto-completed.
    pub limit: f64,
    /// Only detect resolutions and report missing data, do not fill.
    pub ignore: bool,
}

impl Default for GapPolicy {
    fn default() -> Self {
        Self {
            n_hours: 2,
            days_around: 7,
            limit: 0.4,
            ignore: false,
        }
    }
}

impl GapPolicy {
    pub fn ignoring() -> Self {
        Self {
            ignore: true,
            ..Self::default()
        }
    }

    /// Longest short gap, in native steps.
    pub fn short_gap_steps(&self, step: Duration) -> usize {
        self.n_hours as usize * steps_per_hour(step)
    }

    /// Steps taken on each side of a long gap for the average day.
    pub fn window_steps(&self, step: Duration) -> usize {
        self.days_around as usize * 24 * steps_per_hour(step)
    }
}

/// Whole native steps per hour; zero for intervals longer than an hour.
pub fn steps_per_hour(step: Duration) -> usize {
    let minutes = step.num_minutes();
    if minutes <= 0 {
        0
    } else {
        (60 / minutes) as usize
    }
}
