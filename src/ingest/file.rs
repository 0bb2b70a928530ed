//! Local file frame source.
//!
//! Feeds the detection loop from still frames on disk: the path is a
//! directory of jpeg/png files played back in name order, one per cycle,
//! ending the stream after the last. `stub://` paths serve synthetic
//! frames for tests.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use super::synthetic::{parse_stub_limit, SyntheticFrames};
use super::{FrameSource, SourceStats};
use crate::frame::Frame;

#[derive(Clone, Debug)]
pub struct FileConfig {
    /// Frame directory, or a `stub://` descriptor.
    pub path: PathBuf,
    /// Frame size for synthetic playback; decoded files keep their own.
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
}

pub struct FileSource {
    config: FileConfig,
    backend: FileBackend,
    frames_read: u64,
    ended: bool,
}

enum FileBackend {
    Synthetic(SyntheticFrames),
    Sequence { files: Vec<PathBuf>, index: usize },
}

impl FileSource {
    pub fn new(config: FileConfig) -> Result<Self> {
        let raw = config.path.to_string_lossy().to_string();
        let backend = if raw.starts_with("stub://") {
            FileBackend::Synthetic(SyntheticFrames::new(
                config.width,
                config.height,
                parse_stub_limit(&raw),
            ))
        } else {
            FileBackend::Sequence {
                files: Vec::new(),
                index: 0,
            }
        };
        Ok(Self {
            config,
            backend,
            frames_read: 0,
            ended: false,
        })
    }

    fn scan_sequence(path: &PathBuf) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)
            .with_context(|| format!("open frame directory {}", path.display()))?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("jpg") | Some("jpeg") | Some("png")
                )
            })
            .collect();
        files.sort();
        if files.is_empty() {
            bail!("frame directory {} contains no frames", path.display());
        }
        Ok(files)
    }
}

impl FrameSource for FileSource {
    fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            FileBackend::Synthetic(_) => {
                log::info!(
                    "FileSource: connected to {} (synthetic)",
                    self.config.path.display()
                );
            }
            FileBackend::Sequence { files, index } => {
                *files = Self::scan_sequence(&self.config.path)?;
                *index = 0;
                log::info!(
                    "FileSource: {} frames in {}",
                    files.len(),
                    self.config.path.display()
                );
            }
        }
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        match &mut self.backend {
            FileBackend::Synthetic(generator) => {
                let frame = generator.next();
                if frame.is_none() {
                    self.ended = true;
                } else {
                    self.frames_read += 1;
                }
                Ok(frame)
            }
            FileBackend::Sequence { files, index } => {
                if *index >= files.len() {
                    self.ended = true;
                    return Ok(None);
                }
                let path = files[*index].clone();
                // Advance past the file either way; a corrupt frame is a
                // transient failure, not an infinite retry.
                *index += 1;
                let image = image::open(&path)
                    .with_context(|| format!("decode frame {}", path.display()))?
                    .to_rgb8();
                self.frames_read += 1;
                let (width, height) = image.dimensions();
                Ok(Some(Frame::new(image.into_raw(), width, height)))
            }
        }
    }

    fn close(&mut self) {
        log::info!("FileSource: released {}", self.config.path.display());
    }

    fn is_healthy(&self) -> bool {
        !self.ended
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frames_read,
            descriptor: self.config.path.display().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_config(path: &str) -> FileConfig {
        FileConfig {
            path: PathBuf::from(path),
            width: 32,
            height: 24,
            target_fps: 10,
        }
    }

    #[test]
    fn synthetic_file_respects_frame_limit() {
        let mut source = FileSource::new(synthetic_config("stub://clip?frames=2")).unwrap();
        source.connect().unwrap();
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
        assert_eq!(source.stats().frames_captured, 2);
    }

    #[test]
    fn missing_directory_fails_on_connect() {
        let mut source =
            FileSource::new(synthetic_config("/nonexistent/frames")).unwrap();
        assert!(source.connect().is_err());
    }

    #[test]
    fn empty_directory_fails_on_connect() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = FileSource::new(FileConfig {
            path: dir.path().to_path_buf(),
            width: 32,
            height: 24,
            target_fps: 10,
        })
        .unwrap();
        assert!(source.connect().is_err());
    }

    #[test]
    fn sequence_plays_frames_in_name_order_then_ends() {
        let dir = tempfile::tempdir().unwrap();
        for (name, shade) in [("a.png", 10u8), ("b.png", 200u8)] {
            let img = image::RgbImage::from_pixel(4, 4, image::Rgb([shade, shade, shade]));
            img.save(dir.path().join(name)).unwrap();
        }
        let mut source = FileSource::new(FileConfig {
            path: dir.path().to_path_buf(),
            width: 4,
            height: 4,
            target_fps: 10,
        })
        .unwrap();
        source.connect().unwrap();
        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.pixels[0], 10);
        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(second.pixels[0], 200);
        assert!(source.next_frame().unwrap().is_none());
        assert!(!source.is_healthy());
    }
}
