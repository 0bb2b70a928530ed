//! Frame ingestion sources.
//!
//! Two kinds of source feed the detection loop:
//! - Camera devices (`camera:<device>`), live capture
//! - Local frame material (a directory of still frames)
//!
//! Both kinds accept `stub://` descriptors that produce synthetic frames,
//! used by tests and the demo pipeline. Sources yield [`Frame`]s until the
//! stream ends (`Ok(None)`); a single failed read is transient and the
//! session skips that cycle.

mod camera;
mod file;
mod synthetic;

pub use camera::{CameraConfig, CameraSource};
pub use file::{FileConfig, FileSource};

use anyhow::Result;
use std::path::PathBuf;

use crate::config::FrameSettings;
use crate::frame::Frame;

/// A stream of frames. `next_frame` returning `Ok(None)` means the stream
/// ended; an `Err` is a transient per-read failure.
pub trait FrameSource: Send {
    fn connect(&mut self) -> Result<()>;
    fn next_frame(&mut self) -> Result<Option<Frame>>;
    fn close(&mut self);
    fn is_healthy(&self) -> bool;
    fn stats(&self) -> SourceStats;
}

#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub descriptor: String,
}

/// Parsed source descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceSpec {
    Camera { device: String },
    File { path: PathBuf },
}

impl SourceSpec {
    /// `camera:<device>` and bare `stub://` descriptors open a camera;
    /// anything else is treated as a local path.
    pub fn parse(raw: &str) -> Self {
        if let Some(device) = raw.strip_prefix("camera:") {
            SourceSpec::Camera {
                device: device.to_string(),
            }
        } else if raw.starts_with("stub://") {
            SourceSpec::Camera {
                device: raw.to_string(),
            }
        } else {
            SourceSpec::File {
                path: PathBuf::from(raw),
            }
        }
    }
}

pub fn open_source(spec: &SourceSpec, frame: &FrameSettings) -> Result<Box<dyn FrameSource>> {
    match spec {
        SourceSpec::Camera { device } => Ok(Box::new(CameraSource::new(CameraConfig {
            device: device.clone(),
            width: frame.width,
            height: frame.height,
            target_fps: frame.target_fps,
        })?)),
        SourceSpec::File { path } => Ok(Box::new(FileSource::new(FileConfig {
            path: path.clone(),
            width: frame.width,
            height: frame.height,
            target_fps: frame.target_fps,
        })?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_prefix_parses_to_camera() {
        assert_eq!(
            SourceSpec::parse("camera:/dev/video0"),
            SourceSpec::Camera {
                device: "/dev/video0".to_string()
            }
        );
    }

    #[test]
    fn bare_stub_parses_to_camera() {
        assert_eq!(
            SourceSpec::parse("stub://lobby"),
            SourceSpec::Camera {
                device: "stub://lobby".to_string()
            }
        );
    }

    #[test]
    fn plain_path_parses_to_file() {
        assert_eq!(
            SourceSpec::parse("clips/entrance"),
            SourceSpec::File {
                path: PathBuf::from("clips/entrance")
            }
        );
    }
}
