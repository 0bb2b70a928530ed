//! Snapshot and recording bookkeeping.
//!
//! The capture manager decides when artifacts come into existence; the
//! encoding pipeline behind the export sink is not its concern. The
//! recorder runs as its own thread-backed task sampling the shared overlay
//! buffer at a fixed rate, so it tolerates the frame source disappearing
//! mid-recording: the buffer simply stops refreshing and `stop` finalizes
//! whatever was sampled.

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Local};
use image::RgbImage;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::export::{artifact_filename, ExportSink, ImageArtifact, VideoArtifact};
use crate::overlay::OverlayBuffer;

/// Manually captured still. The list is unbounded by design; screenshots
/// live until the process ends.
pub struct Screenshot {
    pub id: String,
    pub image: RgbImage,
    pub captured_at: DateTime<Local>,
    /// Occupancy count at capture time.
    pub count: u32,
}

struct RecorderHandle {
    shutdown: Arc<AtomicBool>,
    join: Option<JoinHandle<Vec<RgbImage>>>,
    started_at: DateTime<Local>,
    started_instant: Instant,
}

impl RecorderHandle {
    fn stop(mut self) -> Result<(Vec<RgbImage>, DateTime<Local>, Duration)> {
        self.shutdown.store(true, Ordering::SeqCst);
        let join = self
            .join
            .take()
            .ok_or_else(|| anyhow!("recorder already joined"))?;
        let frames = join
            .join()
            .map_err(|_| anyhow!("recorder thread panicked"))?;
        Ok((frames, self.started_at, self.started_instant.elapsed()))
    }
}

pub struct CaptureManager {
    screenshots: Vec<Screenshot>,
    recorder: Option<RecorderHandle>,
    recording_fps: u32,
}

impl CaptureManager {
    pub fn new(recording_fps: u32) -> Self {
        Self {
            screenshots: Vec::new(),
            recorder: None,
            recording_fps: recording_fps.max(1),
        }
    }

    /// Composite the most recent overlay frame into a screenshot, store it
    /// newest-first, and hand a copy to the export sink. No cooldown.
    pub fn capture_snapshot(
        &mut self,
        overlay: &OverlayBuffer,
        export: &mut dyn ExportSink,
    ) -> Result<(String, u32)> {
        let composed = overlay
            .latest()
            .ok_or_else(|| anyhow!("no composited frame available yet"))?;

        let captured_at = Local::now();
        let id = artifact_filename("snapshot", captured_at);

        export.export_image(ImageArtifact {
            filename: id.clone(),
            image: composed.image.clone(),
            captured_at,
            count: composed.count,
        })?;

        self.screenshots.insert(
            0,
            Screenshot {
                id: id.clone(),
                image: composed.image,
                captured_at,
                count: composed.count,
            },
        );

        Ok((id, composed.count))
    }

    /// Begin sampling the overlay buffer at the configured rate.
    pub fn start_recording(&mut self, overlay: OverlayBuffer) -> Result<()> {
        if self.recorder.is_some() {
            bail!("recording already in progress");
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let interval = Duration::from_millis(1000 / self.recording_fps as u64);
        let thread_shutdown = shutdown.clone();

        let join = std::thread::Builder::new()
            .name("occuwatch-recorder".to_string())
            .spawn(move || {
                let mut frames = Vec::new();
                while !thread_shutdown.load(Ordering::SeqCst) {
                    // Read-most-recent: the buffer hands out a clone, so the
                    // detection cycle never sees a torn frame and vice versa.
                    if let Some(composed) = overlay.latest() {
                        frames.push(composed.image);
                    }
                    std::thread::sleep(interval);
                }
                frames
            })
            .map_err(|e| anyhow!("failed to spawn recorder: {}", e))?;

        self.recorder = Some(RecorderHandle {
            shutdown,
            join: Some(join),
            started_at: Local::now(),
            started_instant: Instant::now(),
        });
        Ok(())
    }

    /// Finalize the active recording and hand the artifact to the sink.
    /// Returns the number of recorded frames.
    pub fn stop_recording(&mut self, export: &mut dyn ExportSink) -> Result<usize> {
        let handle = self
            .recorder
            .take()
            .ok_or_else(|| anyhow!("no recording in progress"))?;
        let (frames, started_at, duration) = handle.stop()?;
        let frame_count = frames.len();

        export.export_video(VideoArtifact {
            filename: artifact_filename("recording", started_at),
            frames,
            target_fps: self.recording_fps,
            started_at,
            duration,
        })?;

        Ok(frame_count)
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    /// Screenshots newest-first.
    pub fn screenshots(&self) -> &[Screenshot] {
        &self.screenshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::MemoryExportSink;
    use crate::frame::Frame;
    use crate::overlay;

    fn publish_frame(buffer: &OverlayBuffer, seed: u8) {
        let frame = Frame::new(vec![seed; 32 * 32 * 3], 32, 32);
        buffer.publish(overlay::compose(&frame, &[]).unwrap());
    }

    #[test]
    fn snapshot_requires_a_published_overlay() {
        let mut manager = CaptureManager::new(15);
        let sink = MemoryExportSink::new();
        let mut export = sink.clone();
        let buffer = OverlayBuffer::new();
        assert!(manager.capture_snapshot(&buffer, &mut export).is_err());
        assert_eq!(sink.image_count(), 0);
    }

    #[test]
    fn snapshots_stack_newest_first_without_limit() {
        let mut manager = CaptureManager::new(15);
        let sink = MemoryExportSink::new();
        let mut export = sink.clone();
        let buffer = OverlayBuffer::new();
        publish_frame(&buffer, 1);

        let (first, _) = manager.capture_snapshot(&buffer, &mut export).unwrap();
        let (second, _) = manager.capture_snapshot(&buffer, &mut export).unwrap();
        assert_eq!(manager.screenshots().len(), 2);
        assert_eq!(manager.screenshots()[0].id, second);
        assert_eq!(manager.screenshots()[1].id, first);
        assert_eq!(sink.image_count(), 2);
    }

    #[test]
    fn recording_samples_the_overlay_buffer() {
        let mut manager = CaptureManager::new(30);
        let sink = MemoryExportSink::new();
        let mut export = sink.clone();
        let buffer = OverlayBuffer::new();
        publish_frame(&buffer, 2);

        manager.start_recording(buffer.clone()).unwrap();
        assert!(manager.is_recording());
        std::thread::sleep(Duration::from_millis(150));
        let frames = manager.stop_recording(&mut export).unwrap();
        assert!(frames >= 1);
        assert!(!manager.is_recording());
        assert_eq!(sink.video_count(), 1);
        assert_eq!(sink.last_video_frame_count(), Some(frames));
    }

    #[test]
    fn double_start_is_rejected() {
        let mut manager = CaptureManager::new(30);
        let buffer = OverlayBuffer::new();
        manager.start_recording(buffer.clone()).unwrap();
        assert!(manager.start_recording(buffer).is_err());
        let mut export = MemoryExportSink::new();
        manager.stop_recording(&mut export).unwrap();
    }

    #[test]
    fn stop_without_start_is_an_error() {
        let mut manager = CaptureManager::new(30);
        let mut export = MemoryExportSink::new();
        assert!(manager.stop_recording(&mut export).is_err());
    }
}
