//! occuwatch
//!
//! Real-time occupancy monitoring engine. Consumes per-frame object
//! detections from a pluggable vision backend, reduces them to a live
//! people-count signal, and maintains the session state around it.
//!
//! # Architecture
//!
//! The core is the detection-aggregation, alerting, and session-state
//! engine. Everything that touches hardware or a real model sits behind a
//! trait seam:
//!
//! - `ingest`: frame sources (camera, file, synthetic stubs)
//! - `detect`: detector backends and the per-frame detection filter
//! - `stats` / `telemetry`: running counters, FPS, bounded trend history
//! - `alert`: cooldown-gated alert emission
//! - `overlay`: annotation compositing and the shared latest-overlay buffer
//! - `capture`: manual snapshots and the continuous recorder task
//! - `session`: the monitoring state machine and the detection cycle loop
//! - `events`: bounded in-memory event log
//! - `export`: artifact hand-off (memory sink for tests, directory sink
//!   for the daemon)

pub mod alert;
pub mod capture;
pub mod config;
pub mod detect;
pub mod events;
pub mod export;
pub mod frame;
pub mod ingest;
pub mod overlay;
pub mod session;
pub mod stats;
pub mod telemetry;

pub use alert::{AlertChannel, AlertEmitter, TerminalBell, ALERT_COOLDOWN};
pub use capture::{CaptureManager, Screenshot};
pub use config::{MonitorConfig, ProcessingMode};
pub use detect::{filter_detections, BoundingBox, Detection, DetectorBackend, StubDetector};
pub use events::{EventLog, LogEntry, Severity, LOG_CAPACITY};
pub use export::{
    DirectoryExportSink, ExportSink, ImageArtifact, MemoryExportSink, VideoArtifact,
};
pub use frame::Frame;
pub use ingest::{open_source, FrameSource, SourceSpec, SourceStats};
pub use overlay::{Annotation, ComposedFrame, OverlayBuffer};
pub use session::{MonitorSession, MonitorState};
pub use stats::{OccupancyStats, StatsAggregator};
pub use telemetry::{TelemetryTracker, TrendPoint, TREND_CAPACITY};
