use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub pose: PoseConfig,
    #[serde(default)]
    pub counter: CounterConfig,
    #[serde(default)]
    pub smooth: SmoothConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// tracing のログレベル ("trace" / "debug" / "info" / "warn" / "error")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// ポーズモデルの初期化パラメータ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseConfig {
    /// モデル複雑度 (0=lite, 1=full, 2=heavy)
    #[serde(default = "default_model_complexity")]
    pub model_complexity: u8,
    /// モデル側のランドマーク平滑化
    #[serde(default = "default_true")]
    pub smooth_landmarks: bool,
    #[serde(default = "default_confidence")]
    pub min_detection_confidence: f32,
    #[serde(default = "default_confidence")]
    pub min_tracking_confidence: f32,
}

/// レップ判定の閾値
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterConfig {
    /// この角度を超えると UP（度）
    #[serde(default = "default_up_threshold")]
    pub up_threshold: f64,
    /// UP からこの角度未満になると DOWN + カウント（度）
    #[serde(default = "default_down_threshold")]
    pub down_threshold: f64,
    /// 肩・肘・手首・腰の可視性閾値
    #[serde(default = "default_confidence")]
    pub min_confidence: f32,
}

/// 肘角度の One Euro フィルタ設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_min_cutoff")]
    pub min_cutoff: f64,
    #[serde(default = "default_beta")]
    pub beta: f64,
    #[serde(default = "default_d_cutoff")]
    pub d_cutoff: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_log_level() -> String { "info".to_string() }
fn default_model_complexity() -> u8 { 1 }
fn default_true() -> bool { true }
fn default_confidence() -> f32 { 0.5 }
fn default_up_threshold() -> f64 { 160.0 }
fn default_down_threshold() -> f64 { 90.0 }
fn default_min_cutoff() -> f64 { 1.0 }
fn default_beta() -> f64 { 0.01 }
fn default_d_cutoff() -> f64 { 1.0 }
fn default_server_addr() -> String { "127.0.0.1:9470".to_string() }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            model_complexity: default_model_complexity(),
            smooth_landmarks: default_true(),
            min_detection_confidence: default_confidence(),
            min_tracking_confidence: default_confidence(),
        }
    }
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            up_threshold: default_up_threshold(),
            down_threshold: default_down_threshold(),
            min_confidence: default_confidence(),
        }
    }
}

impl Default for SmoothConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_cutoff: default_min_cutoff(),
            beta: default_beta(),
            d_cutoff: default_d_cutoff(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}

impl PoseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.model_complexity > 2 {
            bail!("model_complexity must be 0, 1 or 2 (got {})", self.model_complexity);
        }
        for (name, value) in [
            ("min_detection_confidence", self.min_detection_confidence),
            ("min_tracking_confidence", self.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("{} must be within [0, 1] (got {})", name, value);
            }
        }
        Ok(())
    }
}

impl CounterConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("up_threshold", self.up_threshold),
            ("down_threshold", self.down_threshold),
        ] {
            if !(value > 0.0 && value < 180.0) {
                bail!("{} must be within (0, 180) degrees (got {})", name, value);
            }
        }
        if self.down_threshold >= self.up_threshold {
            bail!(
                "down_threshold ({}) must be below up_threshold ({})",
                self.down_threshold,
                self.up_threshold
            );
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            bail!("min_confidence must be within [0, 1] (got {})", self.min_confidence);
        }
        Ok(())
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// 読み込めなければデフォルト設定
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.as_ref().display(), error = %e, "using default config");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.pose.validate().context("invalid [pose] section")?;
        self.counter.validate().context("invalid [counter] section")?;
        Ok(())
    }
}
