//! Frame container produced by the ingestion layer.
//!
//! Frames flow through one detection cycle and are dropped; nothing in the
//! core retains raw pixels beyond the cycle except the overlay buffer,
//! which holds the composited (annotated) copy.

use chrono::{DateTime, Local};
use std::time::Instant;

/// One captured video frame, RGB8 row-major.
#[derive(Clone)]
pub struct Frame {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Monotonic capture instant, for interval arithmetic.
    pub captured_at: Instant,
    /// Wall-clock capture time, for labels and artifact names.
    pub wall_time: DateTime<Local>,
}

impl Frame {
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            pixels,
            width,
            height,
            captured_at: Instant::now(),
            wall_time: Local::now(),
        }
    }

    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }

    /// Age of this frame relative to its capture instant.
    pub fn age(&self) -> std::time::Duration {
        self.captured_at.elapsed()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}
