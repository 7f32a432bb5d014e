use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::counter::Stage;

/// Per-frame display values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub elbow_angle_degrees: Option<i32>,
    pub body_angle_degrees: Option<i32>,
    pub stage: Stage,
    pub rep_count: u32,
    pub elapsed_seconds: u64,
}

impl Telemetry {
    pub fn new(
        elbow_angle: Option<f64>,
        body_angle: Option<f64>,
        stage: Stage,
        rep_count: u32,
        elapsed: Duration,
    ) -> Self {
        Self {
            elbow_angle_degrees: elbow_angle.map(round_degrees),
            body_angle_degrees: body_angle.map(round_degrees),
            stage,
            rep_count,
            elapsed_seconds: elapsed.as_secs(),
        }
    }
}

fn round_degrees(angle: f64) -> i32 {
    angle.round() as i32
}

fn fmt_angle(angle: Option<i32>) -> String {
    match angle {
        Some(a) => format!("{}°", a),
        None => "--".to_string(),
    }
}

impl fmt::Display for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] reps={} stage={} elbow={} body={}",
            format_elapsed(self.elapsed_seconds),
            self.rep_count,
            self.stage,
            fmt_angle(self.elbow_angle_degrees),
            fmt_angle(self.body_angle_degrees),
        )
    }
}

/// Totals reported when a session stops
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_reps: u32,
    pub duration_seconds: u64,
    pub reps_per_minute: f64,
}

impl SessionSummary {
    pub fn new(total_reps: u32, duration: Duration) -> Self {
        let secs = duration.as_secs_f64();
        let reps_per_minute = if secs > 0.0 {
            total_reps as f64 * 60.0 / secs
        } else {
            0.0
        };
        Self {
            total_reps,
            duration_seconds: duration.as_secs(),
            reps_per_minute,
        }
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} reps in {} ({:.1} reps/min)",
            self.total_reps,
            format_elapsed(self.duration_seconds),
            self.reps_per_minute
        )
    }
}

/// "MM:SS" with zero padding. Minutes are not wrapped at an hour.
pub fn format_elapsed(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
