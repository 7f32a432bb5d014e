pub mod landmark;
pub mod source;
pub mod synthetic;

pub use landmark::{Landmark, LandmarkFrame, LandmarkIndex};
pub use source::{ExternalSource, PoseSource, ScriptedSource};
