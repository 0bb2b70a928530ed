//! Artifact hand-off.
//!
//! The core decides *when* a snapshot or recording is finalized; the sink
//! it hands the artifact to owns persistence. `MemoryExportSink` backs the
//! tests; `DirectoryExportSink` writes JPEGs (and frame-sequence
//! directories for recordings) plus a small JSON manifest next to each
//! artifact.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use image::RgbImage;
use rand::Rng;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Finalized snapshot image.
pub struct ImageArtifact {
    pub filename: String,
    pub image: RgbImage,
    pub captured_at: DateTime<Local>,
    /// Occupancy count at capture time.
    pub count: u32,
}

/// Finalized recording: the composited frames in capture order.
pub struct VideoArtifact {
    pub filename: String,
    pub frames: Vec<RgbImage>,
    pub target_fps: u32,
    pub started_at: DateTime<Local>,
    pub duration: Duration,
}

pub trait ExportSink: Send {
    fn export_image(&mut self, artifact: ImageArtifact) -> Result<()>;
    fn export_video(&mut self, artifact: VideoArtifact) -> Result<()>;
}

/// Generated artifact name: kind, local timestamp, short random id.
pub fn artifact_filename(kind: &str, now: DateTime<Local>) -> String {
    let id: u32 = rand::thread_rng().gen();
    format!("occuwatch_{}_{}_{:08x}", kind, now.format("%Y%m%d_%H%M%S"), id)
}

// ----------------------------------------------------------------------------
// Memory sink (tests)
// ----------------------------------------------------------------------------

#[derive(Default)]
struct MemoryInner {
    images: Vec<ImageArtifact>,
    videos: Vec<VideoArtifact>,
}

/// In-memory sink. Clones share storage, so a test can keep one handle and
/// hand the other to the session.
#[derive(Clone, Default)]
pub struct MemoryExportSink {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryExportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image_count(&self) -> usize {
        self.inner.lock().map(|i| i.images.len()).unwrap_or(0)
    }

    pub fn video_count(&self) -> usize {
        self.inner.lock().map(|i| i.videos.len()).unwrap_or(0)
    }

    pub fn last_image_filename(&self) -> Option<String> {
        self.inner
            .lock()
            .ok()
            .and_then(|i| i.images.last().map(|a| a.filename.clone()))
    }

    pub fn last_video_frame_count(&self) -> Option<usize> {
        self.inner
            .lock()
            .ok()
            .and_then(|i| i.videos.last().map(|a| a.frames.len()))
    }
}

impl ExportSink for MemoryExportSink {
    fn export_image(&mut self, artifact: ImageArtifact) -> Result<()> {
        self.inner
            .lock()
            .map_err(|_| anyhow::anyhow!("export sink lock poisoned"))?
            .images
            .push(artifact);
        Ok(())
    }

    fn export_video(&mut self, artifact: VideoArtifact) -> Result<()> {
        self.inner
            .lock()
            .map_err(|_| anyhow::anyhow!("export sink lock poisoned"))?
            .videos
            .push(artifact);
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Directory sink (daemon)
// ----------------------------------------------------------------------------

pub struct DirectoryExportSink {
    dir: PathBuf,
}

#[derive(Serialize)]
struct ImageManifest<'a> {
    filename: &'a str,
    captured_at: String,
    count: u32,
}

#[derive(Serialize)]
struct VideoManifest<'a> {
    filename: &'a str,
    started_at: String,
    frames: usize,
    target_fps: u32,
    duration_ms: u128,
}

impl DirectoryExportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ExportSink for DirectoryExportSink {
    fn export_image(&mut self, artifact: ImageArtifact) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create export dir {}", self.dir.display()))?;

        let path = self.dir.join(format!("{}.jpg", artifact.filename));
        artifact
            .image
            .save(&path)
            .with_context(|| format!("write snapshot {}", path.display()))?;

        let manifest = ImageManifest {
            filename: &artifact.filename,
            captured_at: artifact.captured_at.to_rfc3339(),
            count: artifact.count,
        };
        let manifest_path = self.dir.join(format!("{}.json", artifact.filename));
        std::fs::write(&manifest_path, serde_json::to_vec_pretty(&manifest)?)
            .with_context(|| format!("write manifest {}", manifest_path.display()))?;

        log::info!("snapshot exported to {}", path.display());
        Ok(())
    }

    fn export_video(&mut self, artifact: VideoArtifact) -> Result<()> {
        let clip_dir = self.dir.join(&artifact.filename);
        std::fs::create_dir_all(&clip_dir)
            .with_context(|| format!("create recording dir {}", clip_dir.display()))?;

        for (i, frame) in artifact.frames.iter().enumerate() {
            let path = clip_dir.join(format!("frame_{:05}.jpg", i));
            frame
                .save(&path)
                .with_context(|| format!("write recording frame {}", path.display()))?;
        }

        let manifest = VideoManifest {
            filename: &artifact.filename,
            started_at: artifact.started_at.to_rfc3339(),
            frames: artifact.frames.len(),
            target_fps: artifact.target_fps,
            duration_ms: artifact.duration.as_millis(),
        };
        std::fs::write(
            clip_dir.join("manifest.json"),
            serde_json::to_vec_pretty(&manifest)?,
        )
        .context("write recording manifest")?;

        log::info!(
            "recording exported to {} ({} frames)",
            clip_dir.display(),
            artifact.frames.len()
        );
        Ok(())
    }
}
