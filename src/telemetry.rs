//! FPS measurement and the bounded trend buffer.
//!
//! Sampling runs on its own one-second cadence, independent of how fast
//! the detection cycle happens to run: the reported FPS reflects completed
//! detection cycles per wall-clock second, not a configured target.

use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Rolling history capacity for the trend chart.
pub const TREND_CAPACITY: usize = 30;

const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone, Debug, PartialEq)]
pub struct TrendPoint {
    /// Formatted local clock time of the sample.
    pub label: String,
    /// Occupancy count at sample time.
    pub count: u32,
}

pub struct TelemetryTracker {
    frames_since_sample: u32,
    last_sample: Option<Instant>,
    fps: u32,
    trend: VecDeque<TrendPoint>,
}

impl TelemetryTracker {
    pub fn new() -> Self {
        Self {
            frames_since_sample: 0,
            last_sample: None,
            fps: 0,
            trend: VecDeque::with_capacity(TREND_CAPACITY),
        }
    }

    /// Open the first sampling window. Called when monitoring starts so the
    /// first FPS window is measured from session start, not from the first
    /// completed cycle.
    pub fn begin(&mut self, now: Instant) {
        self.frames_since_sample = 0;
        self.last_sample = Some(now);
    }

    /// Record one completed detection cycle.
    ///
    /// When at least a second has elapsed since the last sample, computes
    /// FPS over the elapsed window, appends a trend point for the current
    /// count, and starts a new window.
    pub fn tick(&mut self, count: u32, now: Instant, wall: DateTime<Local>) {
        self.frames_since_sample += 1;

        let Some(last) = self.last_sample else {
            // Session started without `begin`; open the window here.
            self.last_sample = Some(now);
            self.frames_since_sample = 0;
            return;
        };

        let elapsed = now.saturating_duration_since(last);
        if elapsed < SAMPLE_INTERVAL {
            return;
        }

        let elapsed_ms = elapsed.as_millis().max(1) as u64;
        self.fps = ((self.frames_since_sample as u64 * 1000 + elapsed_ms / 2) / elapsed_ms) as u32;
        self.frames_since_sample = 0;
        self.last_sample = Some(now);

        self.trend.push_back(TrendPoint {
            label: wall.format("%H:%M:%S").to_string(),
            count,
        });
        while self.trend.len() > TREND_CAPACITY {
            self.trend.pop_front();
        }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Trend points oldest-first.
    pub fn trend(&self) -> impl Iterator<Item = &TrendPoint> {
        self.trend.iter()
    }

    pub fn trend_len(&self) -> usize {
        self.trend.len()
    }
}

impl Default for TelemetryTracker {
    fn default() -> Self {
        Self::new()
    }
}
