use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

const DEFAULT_SOURCE: &str = "stub://lobby";
const DEFAULT_TARGET_LABEL: &str = "person";
const DEFAULT_ALERT_THRESHOLD: u32 = 3;
const DEFAULT_CONFIDENCE_CUTOFF: f32 = 0.5;
const DEFAULT_FRAME_WIDTH: u32 = 640;
const DEFAULT_FRAME_HEIGHT: u32 = 480;
const DEFAULT_FRAME_FPS: u32 = 10;
const DEFAULT_RECORDING_FPS: u32 = 15;
const DEFAULT_EXPORT_DIR: &str = "captures";

/// Inter-cycle delay presets for the detection loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    Fast,
    #[default]
    Normal,
    Accurate,
}

impl ProcessingMode {
    pub fn delay(self) -> Duration {
        match self {
            ProcessingMode::Fast => Duration::from_millis(30),
            ProcessingMode::Normal => Duration::from_millis(100),
            ProcessingMode::Accurate => Duration::from_millis(250),
        }
    }
}

impl std::str::FromStr for ProcessingMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "fast" => Ok(ProcessingMode::Fast),
            "normal" => Ok(ProcessingMode::Normal),
            "accurate" => Ok(ProcessingMode::Accurate),
            other => Err(anyhow!(
                "processing mode must be fast, normal, or accurate (got '{}')",
                other
            )),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct MonitorConfigFile {
    source: Option<String>,
    target_label: Option<String>,
    alert_threshold: Option<u32>,
    confidence_cutoff: Option<f32>,
    processing_mode: Option<ProcessingMode>,
    sound_alerts: Option<bool>,
    frame: Option<FrameConfigFile>,
    capture: Option<CaptureConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct FrameConfigFile {
    width: Option<u32>,
    height: Option<u32>,
    target_fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct CaptureConfigFile {
    recording_fps: Option<u32>,
    export_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Frame source descriptor: `camera:<device>`, a frame directory, or
    /// a `stub://` synthetic source.
    pub source: String,
    /// Detection class that counts toward occupancy.
    pub target_label: String,
    /// Occupancy at or above this fires an alert. Must be >= 1.
    pub alert_threshold: u32,
    /// Detections below this score are ignored. Open interval (0, 1).
    pub confidence_cutoff: f32,
    pub processing_mode: ProcessingMode,
    pub sound_alerts: bool,
    pub frame: FrameSettings,
    pub capture: CaptureSettings,
}

#[derive(Debug, Clone)]
pub struct FrameSettings {
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
}

#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub recording_fps: u32,
    pub export_dir: PathBuf,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            target_label: DEFAULT_TARGET_LABEL.to_string(),
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
            confidence_cutoff: DEFAULT_CONFIDENCE_CUTOFF,
            processing_mode: ProcessingMode::Normal,
            sound_alerts: true,
            frame: FrameSettings {
                width: DEFAULT_FRAME_WIDTH,
                height: DEFAULT_FRAME_HEIGHT,
                target_fps: DEFAULT_FRAME_FPS,
            },
            capture: CaptureSettings {
                recording_fps: DEFAULT_RECORDING_FPS,
                export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
            },
        }
    }
}

impl MonitorConfig {
    /// Load configuration: file named by `OCCUWATCH_CONFIG` (if set), then
    /// environment overrides, then validation.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("OCCUWATCH_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from an explicit file path plus environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut cfg = Self::from_file(read_config_file(path)?);
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: MonitorConfigFile) -> Self {
        let defaults = Self::default();
        Self {
            source: file.source.unwrap_or(defaults.source),
            target_label: file.target_label.unwrap_or(defaults.target_label),
            alert_threshold: file.alert_threshold.unwrap_or(defaults.alert_threshold),
            confidence_cutoff: file.confidence_cutoff.unwrap_or(defaults.confidence_cutoff),
            processing_mode: file.processing_mode.unwrap_or(defaults.processing_mode),
            sound_alerts: file.sound_alerts.unwrap_or(defaults.sound_alerts),
            frame: FrameSettings {
                width: file
                    .frame
                    .as_ref()
                    .and_then(|f| f.width)
                    .unwrap_or(defaults.frame.width),
                height: file
                    .frame
                    .as_ref()
                    .and_then(|f| f.height)
                    .unwrap_or(defaults.frame.height),
                target_fps: file
                    .frame
                    .as_ref()
                    .and_then(|f| f.target_fps)
                    .unwrap_or(defaults.frame.target_fps),
            },
            capture: CaptureSettings {
                recording_fps: file
                    .capture
                    .as_ref()
                    .and_then(|c| c.recording_fps)
                    .unwrap_or(defaults.capture.recording_fps),
                export_dir: file
                    .capture
                    .and_then(|c| c.export_dir)
                    .unwrap_or(defaults.capture.export_dir),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(source) = std::env::var("OCCUWATCH_SOURCE") {
            if !source.trim().is_empty() {
                self.source = source;
            }
        }
        if let Ok(label) = std::env::var("OCCUWATCH_TARGET_LABEL") {
            if !label.trim().is_empty() {
                self.target_label = label;
            }
        }
        if let Ok(threshold) = std::env::var("OCCUWATCH_ALERT_THRESHOLD") {
            self.alert_threshold = threshold
                .parse()
                .map_err(|_| anyhow!("OCCUWATCH_ALERT_THRESHOLD must be an integer"))?;
        }
        if let Ok(cutoff) = std::env::var("OCCUWATCH_CONFIDENCE_CUTOFF") {
            self.confidence_cutoff = cutoff
                .parse()
                .map_err(|_| anyhow!("OCCUWATCH_CONFIDENCE_CUTOFF must be a float"))?;
        }
        if let Ok(mode) = std::env::var("OCCUWATCH_PROCESSING_MODE") {
            self.processing_mode = mode.parse()?;
        }
        if let Ok(sound) = std::env::var("OCCUWATCH_SOUND_ALERTS") {
            self.sound_alerts = match sound.trim() {
                "1" | "true" | "on" => true,
                "0" | "false" | "off" => false,
                other => {
                    return Err(anyhow!(
                        "OCCUWATCH_SOUND_ALERTS must be true/false (got '{}')",
                        other
                    ))
                }
            };
        }
        if let Ok(dir) = std::env::var("OCCUWATCH_EXPORT_DIR") {
            if !dir.trim().is_empty() {
                self.capture.export_dir = PathBuf::from(dir);
            }
        }
        Ok(())
    }

    pub fn validate(&mut self) -> Result<()> {
        if self.alert_threshold < 1 {
            return Err(anyhow!("alert_threshold must be >= 1"));
        }
        if !(self.confidence_cutoff > 0.0 && self.confidence_cutoff < 1.0) {
            return Err(anyhow!(
                "confidence_cutoff must be inside (0, 1), got {}",
                self.confidence_cutoff
            ));
        }
        self.target_label = validate_target_label(&self.target_label)?;
        if self.frame.width == 0 || self.frame.height == 0 {
            return Err(anyhow!("frame dimensions must be non-zero"));
        }
        if self.frame.target_fps == 0 {
            return Err(anyhow!("frame target_fps must be >= 1"));
        }
        if self.capture.recording_fps == 0 || self.capture.recording_fps > 60 {
            return Err(anyhow!("recording_fps must be in 1..=60"));
        }
        Ok(())
    }
}

/// A conforming target label is a plain lowercase class name, the way
/// detection models report classes ("person", "sports ball"). Positive
/// allowlist to reject path-ish or formatted input early.
pub fn validate_target_label(label: &str) -> Result<String> {
    static LABEL_RE: OnceLock<regex::Regex> = OnceLock::new();
    let re = LABEL_RE.get_or_init(|| regex::Regex::new(r"^[a-z][a-z0-9 _-]{0,63}$").unwrap());

    let normalized = label.trim().to_lowercase();
    if !re.is_match(&normalized) {
        return Err(anyhow!(
            "target label must match ^[a-z][a-z0-9 _-]{{0,63}}$"
        ));
    }
    Ok(normalized)
}

fn read_config_file(path: &Path) -> Result<MonitorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let mut cfg = MonitorConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.alert_threshold, 3);
        assert_eq!(cfg.processing_mode, ProcessingMode::Normal);
    }

    #[test]
    fn processing_mode_delays() {
        assert_eq!(ProcessingMode::Fast.delay(), Duration::from_millis(30));
        assert_eq!(ProcessingMode::Normal.delay(), Duration::from_millis(100));
        assert_eq!(ProcessingMode::Accurate.delay(), Duration::from_millis(250));
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let mut cfg = MonitorConfig {
            alert_threshold: 0,
            ..MonitorConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn cutoff_bounds_are_exclusive() {
        for cutoff in [0.0f32, 1.0] {
            let mut cfg = MonitorConfig {
                confidence_cutoff: cutoff,
                ..MonitorConfig::default()
            };
            assert!(cfg.validate().is_err());
        }
        let mut cfg = MonitorConfig {
            confidence_cutoff: 0.999,
            ..MonitorConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn target_label_is_normalized() {
        let mut cfg = MonitorConfig {
            target_label: " Person ".to_string(),
            ..MonitorConfig::default()
        };
        cfg.validate().unwrap();
        assert_eq!(cfg.target_label, "person");
    }

    #[test]
    fn bad_target_labels_are_rejected() {
        for label in ["", "../etc", "PERSON!", "label\nnewline"] {
            assert!(validate_target_label(label).is_err(), "label {:?}", label);
        }
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!(
            "FAST".parse::<ProcessingMode>().unwrap(),
            ProcessingMode::Fast
        );
        assert!("warp".parse::<ProcessingMode>().is_err());
    }
}
