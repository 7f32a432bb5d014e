//! Synthetic landmark frames with a prescribed elbow angle.

use super::landmark::{Landmark, LandmarkFrame, LandmarkIndex};

const ELBOW: (f32, f32) = (0.5, 0.5);
const UPPER_ARM: f32 = 0.2;
const FOREARM: f32 = 0.2;

/// Frame whose left shoulder–elbow–wrist angle is `elbow_deg`.
///
/// The shoulder sits straight above the elbow and the wrist is rotated
/// `elbow_deg` away from it; the hip is level with the shoulder so the body
/// angle is 90°.
pub fn arm_frame(elbow_deg: f64, timestamp_us: u64) -> LandmarkFrame {
    let theta = elbow_deg.to_radians() as f32;
    let shoulder = Landmark::new(ELBOW.0, ELBOW.1 - UPPER_ARM, 1.0);
    let elbow = Landmark::new(ELBOW.0, ELBOW.1, 1.0);
    let wrist = Landmark::new(
        ELBOW.0 + FOREARM * theta.sin(),
        ELBOW.1 - FOREARM * theta.cos(),
        1.0,
    );
    let hip = Landmark::new(shoulder.x + 0.4, shoulder.y, 1.0);

    LandmarkFrame::empty(timestamp_us)
        .with(LandmarkIndex::LeftShoulder, shoulder)
        .with(LandmarkIndex::LeftElbow, elbow)
        .with(LandmarkIndex::LeftWrist, wrist)
        .with(LandmarkIndex::LeftHip, hip)
}

/// Frames for an angle sequence at a fixed frame interval.
pub fn arm_sequence(angles: &[f64], frame_interval_us: u64) -> Vec<LandmarkFrame> {
    angles
        .iter()
        .enumerate()
        .map(|(i, &deg)| arm_frame(deg, i as u64 * frame_interval_us))
        .collect()
}
