pub mod angle;
pub mod counter;
pub mod one_euro;
pub mod rep;
pub mod telemetry;

pub use angle::joint_angle;
pub use counter::{RepCounter, Stage};
pub use one_euro::AngleFilter;
pub use rep::{FrameOutcome, FrameResult, RepTracker, TrackerSnapshot, TrackerState};
pub use telemetry::{format_elapsed, SessionSummary, Telemetry};
