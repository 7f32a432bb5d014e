use anyhow::{bail, Context, Result};
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use super::landmark::LandmarkFrame;
use crate::config::PoseConfig;

/// Supplier of per-frame landmarks (an external pose model).
///
/// `initialize` runs once before capture. Failures from `initialize` or
/// `start` are reported to the tracker's caller as unavailability.
pub trait PoseSource {
    fn initialize(&mut self, config: &PoseConfig) -> Result<()>;
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self);
    /// Next available frame, if the capture has produced one.
    fn next_frame(&mut self) -> Option<LandmarkFrame>;
}

/// Source for hosts that push frames into the tracker themselves
/// (network feed, UI callback). It only validates the model configuration.
#[derive(Debug, Default)]
pub struct ExternalSource {
    initialized: bool,
}

impl ExternalSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PoseSource for ExternalSource {
    fn initialize(&mut self, config: &PoseConfig) -> Result<()> {
        config.validate()?;
        self.initialized = true;
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        if !self.initialized {
            bail!("pose source not initialized");
        }
        Ok(())
    }

    fn stop(&mut self) {}

    fn next_frame(&mut self) -> Option<LandmarkFrame> {
        None
    }
}

/// In-memory frame sequence. Used for replays and tests.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    frames: VecDeque<LandmarkFrame>,
    init_error: Option<String>,
    initialized: bool,
    capturing: bool,
}

impl ScriptedSource {
    pub fn new(frames: Vec<LandmarkFrame>) -> Self {
        Self {
            frames: frames.into(),
            ..Self::default()
        }
    }

    /// A source whose model never loads.
    pub fn failing(reason: &str) -> Self {
        Self {
            init_error: Some(reason.to_string()),
            ..Self::default()
        }
    }

    /// JSON 配列形式の記録ファイルを読み込む
    pub fn load_recording<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read recording {}", path.display()))?;
        let frames: Vec<LandmarkFrame> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse recording {}", path.display()))?;
        Ok(Self::new(frames))
    }

    pub fn push(&mut self, frame: LandmarkFrame) {
        self.frames.push_back(frame);
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }
}

impl PoseSource for ScriptedSource {
    fn initialize(&mut self, config: &PoseConfig) -> Result<()> {
        if let Some(reason) = &self.init_error {
            bail!("{}", reason);
        }
        config.validate()?;
        self.initialized = true;
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        if !self.initialized {
            bail!("pose source not initialized");
        }
        self.capturing = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.capturing = false;
    }

    fn next_frame(&mut self) -> Option<LandmarkFrame> {
        if !self.capturing {
            return None;
        }
        self.frames.pop_front()
    }
}
