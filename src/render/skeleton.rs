use serde::{Deserialize, Serialize};

use crate::pose::LandmarkIndex;

/// 骨格の接続定義 (開始ランドマーク, 終了ランドマーク)
pub const SKELETON_CONNECTIONS: [(LandmarkIndex, LandmarkIndex); 16] = {
    use LandmarkIndex::*;
    [
        // 腕
        (LeftShoulder, RightShoulder),
        (LeftShoulder, LeftElbow),
        (LeftElbow, LeftWrist),
        (RightShoulder, RightElbow),
        (RightElbow, RightWrist),
        // 胴体
        (LeftShoulder, LeftHip),
        (RightShoulder, RightHip),
        (LeftHip, RightHip),
        // 脚
        (LeftHip, LeftKnee),
        (LeftKnee, LeftAnkle),
        (RightHip, RightKnee),
        (RightKnee, RightAnkle),
        // 足
        (LeftAnkle, LeftHeel),
        (LeftHeel, LeftFootIndex),
        (RightAnkle, RightHeel),
        (RightHeel, RightFootIndex),
    ]
};

/// この肘角度未満で「下げている」配色に切り替える
pub const FLEXED_COLOR_ANGLE: f64 = 85.0;

/// オーバーレイの配色 (RGB)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayColors {
    pub joint: [u8; 3],
    pub connection: [u8; 3],
}

/// 肘を曲げている間（緑）
pub const FLEXED_COLORS: OverlayColors = OverlayColors {
    joint: [0, 255, 0],
    connection: [0, 200, 0],
};

/// 腕を伸ばしている間（オレンジ / ピンク）
pub const EXTENDED_COLORS: OverlayColors = OverlayColors {
    joint: [245, 117, 66],
    connection: [245, 66, 230],
};

/// 肘角度からオーバーレイ配色を選ぶ
pub fn overlay_colors(elbow_angle: f64) -> OverlayColors {
    if elbow_angle < FLEXED_COLOR_ANGLE {
        FLEXED_COLORS
    } else {
        EXTENDED_COLORS
    }
}
