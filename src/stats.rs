//! Running occupancy counters.
//!
//! `update` must be invoked exactly once per completed detection cycle so
//! `occupied_frames` stays meaningful as a frame-occurrence counter (one
//! increment per qualifying frame, not per detected person).

use chrono::{DateTime, Local};
use serde::Serialize;

#[derive(Clone, Debug, Default, Serialize)]
pub struct OccupancyStats {
    /// Filtered count of the most recent frame.
    pub current_count: u32,
    /// Running maximum of `current_count`; non-decreasing within a session.
    pub peak_count: u32,
    /// Number of frames observed with `current_count > 0`.
    pub occupied_frames: u64,
    /// Set when monitoring starts. Survives `stop`; cleared only by
    /// `reset`.
    #[serde(skip)]
    pub session_start: Option<DateTime<Local>>,
}

pub struct StatsAggregator {
    stats: OccupancyStats,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self {
            stats: OccupancyStats::default(),
        }
    }

    pub fn update(&mut self, count: u32) -> &OccupancyStats {
        self.stats.current_count = count;
        self.stats.peak_count = self.stats.peak_count.max(count);
        if count > 0 {
            self.stats.occupied_frames += 1;
        }
        &self.stats
    }

    pub fn begin_session(&mut self, now: DateTime<Local>) {
        self.stats.session_start = Some(now);
    }

    /// Explicit reset. Counters deliberately survive `stop`/`start`; only
    /// this call zeroes them.
    pub fn reset(&mut self) {
        self.stats = OccupancyStats::default();
    }

    pub fn stats(&self) -> &OccupancyStats {
        &self.stats
    }

    pub fn snapshot(&self) -> OccupancyStats {
        self.stats.clone()
    }

    pub fn session_duration(&self, now: DateTime<Local>) -> Option<chrono::Duration> {
        self.stats.session_start.map(|start| now - start)
    }
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new()
    }
}
