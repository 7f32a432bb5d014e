use serde::{Deserialize, Serialize};

use crate::config::CounterConfig;

/// Classified phase of a repetition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// 未判定（表示上は "ready"）
    #[default]
    #[serde(rename = "ready")]
    Unknown,
    Up,
    Down,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Unknown => "ready",
            Stage::Up => "up",
            Stage::Down => "down",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Hysteresis rep counter over a single joint angle.
///
/// Above `up_threshold` the stage becomes Up from any stage. Below
/// `down_threshold` it becomes Down and counts, but only coming from Up.
/// Both comparisons are strict; the band between them never transitions.
#[derive(Debug, Clone)]
pub struct RepCounter {
    up_threshold: f64,
    down_threshold: f64,
    stage: Stage,
    count: u32,
}

impl RepCounter {
    pub fn new(up_threshold: f64, down_threshold: f64) -> Self {
        Self {
            up_threshold,
            down_threshold,
            stage: Stage::Unknown,
            count: 0,
        }
    }

    pub fn from_config(config: &CounterConfig) -> Self {
        Self::new(config.up_threshold, config.down_threshold)
    }

    /// Feed one angle. Returns true when this angle completed a rep.
    pub fn update(&mut self, angle: f64) -> bool {
        if angle > self.up_threshold {
            self.stage = Stage::Up;
        }
        if angle < self.down_threshold && self.stage == Stage::Up {
            self.stage = Stage::Down;
            self.count += 1;
            return true;
        }
        false
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn reset(&mut self) {
        self.stage = Stage::Unknown;
        self.count = 0;
    }
}

impl Default for RepCounter {
    fn default() -> Self {
        Self::from_config(&CounterConfig::default())
    }
}
