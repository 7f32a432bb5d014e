use serde::{Deserialize, Serialize};

/// BlazePose の 33 ランドマークインデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum LandmarkIndex {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl LandmarkIndex {
    pub const COUNT: usize = 33;

    const ALL: [LandmarkIndex; LandmarkIndex::COUNT] = {
        use LandmarkIndex::*;
        [
            Nose, LeftEyeInner, LeftEye, LeftEyeOuter, RightEyeInner, RightEye, RightEyeOuter,
            LeftEar, RightEar, MouthLeft, MouthRight,
            LeftShoulder, RightShoulder, LeftElbow, RightElbow, LeftWrist, RightWrist,
            LeftPinky, RightPinky, LeftIndex, RightIndex, LeftThumb, RightThumb,
            LeftHip, RightHip, LeftKnee, RightKnee, LeftAnkle, RightAnkle,
            LeftHeel, RightHeel, LeftFootIndex, RightFootIndex,
        ]
    };

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// 単一ランドマーク
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// 正規化されたX座標 (0.0〜1.0)
    pub x: f32,
    /// 正規化されたY座標 (0.0〜1.0)
    pub y: f32,
    /// 腰中点基準の奥行き（モデルが出力しない場合は0）
    #[serde(default)]
    pub z: f32,
    /// 可視性スコア (0.0〜1.0)
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility,
        }
    }

    /// 可視性が閾値以上で、座標が有限か
    pub fn is_valid(&self, threshold: f32) -> bool {
        self.visibility >= threshold && self.x.is_finite() && self.y.is_finite()
    }

    /// ピクセル座標に変換
    pub fn to_pixel(&self, width: u32, height: u32) -> (i32, i32) {
        let px = (self.x * width as f32) as i32;
        let py = (self.y * height as f32) as i32;
        (px, py)
    }
}

/// 1フレーム分のランドマーク集合
///
/// 欠損（オクルージョン）は `None`。ポーズモデルが返す配列が短い場合も
/// 範囲外のインデックスは欠損として扱う。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// キャプチャ時刻（マイクロ秒）
    #[serde(default)]
    pub timestamp_us: u64,
    pub landmarks: Vec<Option<Landmark>>,
}

impl LandmarkFrame {
    /// 全ランドマーク欠損のフレーム
    pub fn empty(timestamp_us: u64) -> Self {
        Self {
            timestamp_us,
            landmarks: vec![None; LandmarkIndex::COUNT],
        }
    }

    pub fn from_landmarks(timestamp_us: u64, landmarks: Vec<Option<Landmark>>) -> Self {
        Self {
            timestamp_us,
            landmarks,
        }
    }

    /// ランドマークを設定したフレームを返す
    pub fn with(mut self, index: LandmarkIndex, landmark: Landmark) -> Self {
        self.set(index, Some(landmark));
        self
    }

    pub fn set(&mut self, index: LandmarkIndex, landmark: Option<Landmark>) {
        let i = index as usize;
        if self.landmarks.len() <= i {
            self.landmarks.resize(LandmarkIndex::COUNT.max(i + 1), None);
        }
        self.landmarks[i] = landmark;
    }

    /// インデックスでランドマークを取得
    pub fn get(&self, index: LandmarkIndex) -> Option<&Landmark> {
        self.landmarks.get(index as usize).and_then(|l| l.as_ref())
    }

    /// 閾値を満たすランドマークのみ取得
    pub fn valid(&self, index: LandmarkIndex, threshold: f32) -> Option<&Landmark> {
        self.get(index).filter(|l| l.is_valid(threshold))
    }
}
