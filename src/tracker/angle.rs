use nalgebra::Vector2;
use std::f64::consts::PI;

use crate::pose::Landmark;

/// Angle at vertex `b` between `a` and `c`, in degrees within [0, 180].
///
/// Difference of the two polar angles seen from `b`, reflected as
/// `360 - angle` when above 180. The rep thresholds are calibrated against
/// exactly this normalization.
pub fn angle_at(a: Vector2<f64>, b: Vector2<f64>, c: Vector2<f64>) -> f64 {
    let ba = a - b;
    let bc = c - b;
    let radians = bc.y.atan2(bc.x) - ba.y.atan2(ba.x);
    let angle = (radians * 180.0 / PI).abs();
    if angle > 180.0 {
        360.0 - angle
    } else {
        angle
    }
}

/// Shortest limb segment (normalized image units) that still defines a direction
pub const MIN_SEGMENT_LENGTH: f64 = 1e-6;

/// Joint angle from three landmarks, `b` being the joint.
///
/// `None` when either segment collapses onto the joint; `atan2(0, 0)` would
/// otherwise yield an arbitrary direction.
pub fn joint_angle(a: &Landmark, b: &Landmark, c: &Landmark) -> Option<f64> {
    let (a, b, c) = (to_vec(a), to_vec(b), to_vec(c));
    if (a - b).norm() < MIN_SEGMENT_LENGTH || (c - b).norm() < MIN_SEGMENT_LENGTH {
        return None;
    }
    Some(angle_at(a, b, c))
}

fn to_vec(lm: &Landmark) -> Vector2<f64> {
    Vector2::new(lm.x as f64, lm.y as f64)
}
