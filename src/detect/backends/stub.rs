use anyhow::{bail, Result};
use sha2::{Digest, Sha256};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{BoundingBox, Detection};
use crate::frame::Frame;

/// Stub backend for tests and the synthetic demo pipeline.
///
/// Derives a deterministic detection set from a hash of the frame pixels,
/// so identical frames produce identical detections and a changing scene
/// produces a changing count. Emits mostly "person" boxes plus an
/// occasional off-class box so the detection filter has something to drop.
pub struct StubDetector {
    ready: bool,
    calls: u64,
    fail_every: Option<u64>,
}

impl StubDetector {
    pub fn new() -> Self {
        Self {
            ready: true,
            calls: 0,
            fail_every: None,
        }
    }

    /// A backend whose model never finishes loading. `start` must refuse
    /// to enter monitoring against it.
    pub fn not_ready() -> Self {
        Self {
            ready: false,
            ..Self::new()
        }
    }

    /// Fail every n-th `detect` call with a synthetic inference error.
    pub fn with_failures(mut self, every_n: u64) -> Self {
        self.fail_every = Some(every_n.max(1));
        self
    }
}

impl Default for StubDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for StubDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn ready(&self) -> bool {
        self.ready
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        self.calls += 1;
        if let Some(n) = self.fail_every {
            if self.calls % n == 0 {
                bail!("synthetic inference failure (call #{})", self.calls);
            }
        }

        let digest: [u8; 32] = Sha256::digest(&frame.pixels).into();
        let count = (digest[0] % 5) as usize;
        let w = frame.width as f32;
        let h = frame.height as f32;

        let mut detections = Vec::with_capacity(count + 1);
        for i in 0..count {
            let b = &digest[i * 4..i * 4 + 4];
            let bw = 40.0 + (b[2] % 64) as f32;
            let bh = bw * 2.0;
            let bbox = BoundingBox {
                x: (b[0] as f32 / 255.0) * (w - bw).max(0.0),
                y: (b[1] as f32 / 255.0) * (h - bh).max(0.0),
                width: bw,
                height: bh,
            };
            let score = 0.50 + (b[3] % 50) as f32 / 100.0;
            detections.push(Detection::new(bbox, "person", score));
        }

        if digest[31] & 1 == 1 {
            detections.push(Detection::new(
                BoundingBox {
                    x: 4.0,
                    y: 4.0,
                    width: 60.0,
                    height: 60.0,
                },
                "chair",
                0.9,
            ));
        }

        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with(seed: u8) -> Frame {
        Frame::new(vec![seed; 64 * 48 * 3], 64, 48)
    }

    #[test]
    fn identical_frames_produce_identical_detections() {
        let mut detector = StubDetector::new();
        let a = detector.detect(&frame_with(7)).unwrap();
        let b = detector.detect(&frame_with(7)).unwrap();
        assert_eq!(a.len(), b.len());
    }

    #[test]
    fn scores_stay_in_unit_interval() {
        let mut detector = StubDetector::new();
        for seed in 0..32u8 {
            for d in detector.detect(&frame_with(seed)).unwrap() {
                assert!((0.0..=1.0).contains(&d.score));
            }
        }
    }

    #[test]
    fn failure_injection_fires_on_schedule() {
        let mut detector = StubDetector::new().with_failures(3);
        assert!(detector.detect(&frame_with(1)).is_ok());
        assert!(detector.detect(&frame_with(1)).is_ok());
        assert!(detector.detect(&frame_with(1)).is_err());
        assert!(detector.detect(&frame_with(1)).is_ok());
    }

    #[test]
    fn not_ready_backend_reports_not_ready() {
        assert!(!StubDetector::not_ready().ready());
    }
}
