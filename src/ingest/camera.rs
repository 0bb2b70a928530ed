//! Live camera frame source.
//!
//! Real device capture is a platform concern outside this engine; the
//! built-in backend serves synthetic frames for `stub://` devices, which
//! is what the tests and the demo pipeline run against. Opening any other
//! device fails cleanly so the session can log the setup failure and stay
//! idle.

use anyhow::{bail, Result};

use super::synthetic::{parse_stub_limit, SyntheticFrames};
use super::{FrameSource, SourceStats};
use crate::frame::Frame;

#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Device descriptor (e.g. "stub://lobby", "stub://lobby?frames=120").
    pub device: String,
    pub width: u32,
    pub height: u32,
    /// Target frame rate; the session's cycle delay does the pacing.
    pub target_fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "stub://lobby".to_string(),
            width: 640,
            height: 480,
            target_fps: 10,
        }
    }
}

pub struct CameraSource {
    config: CameraConfig,
    backend: CameraBackend,
    ended: bool,
}

enum CameraBackend {
    Synthetic(SyntheticFrames),
}

impl CameraSource {
    pub fn new(config: CameraConfig) -> Result<Self> {
        if !config.device.starts_with("stub://") {
            bail!(
                "camera device '{}' is not available; only stub:// devices are built in",
                config.device
            );
        }
        let limit = parse_stub_limit(&config.device);
        let backend =
            CameraBackend::Synthetic(SyntheticFrames::new(config.width, config.height, limit));
        Ok(Self {
            config,
            backend,
            ended: false,
        })
    }
}

impl FrameSource for CameraSource {
    fn connect(&mut self) -> Result<()> {
        log::info!(
            "CameraSource: connected to {} (synthetic)",
            self.config.device
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let CameraBackend::Synthetic(generator) = &mut self.backend;
        let frame = generator.next();
        if frame.is_none() {
            self.ended = true;
        }
        Ok(frame)
    }

    fn close(&mut self) {
        log::info!("CameraSource: released {}", self.config.device);
    }

    fn is_healthy(&self) -> bool {
        !self.ended
    }

    fn stats(&self) -> SourceStats {
        let CameraBackend::Synthetic(generator) = &self.backend;
        SourceStats {
            frames_captured: generator.frames_generated(),
            descriptor: self.config.device.clone(),
        }
    }
}
