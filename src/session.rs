//! Monitoring session state machine and detection cycle loop.
//!
//! States: `Idle`, `Monitoring`, `MonitoringAndRecording` (recording is
//! only reachable from `Monitoring`). Transitions are guarded methods;
//! invalid commands are rejected without altering state.
//!
//! The detection cycle is an explicit cooperative loop, not a dedicated
//! worker per cycle: each call to [`MonitorSession::step`] runs one full
//! cycle (read frame, detect, filter, aggregate, composite, alert-check)
//! and the caller schedules the next one after the configured processing
//! delay. At most one cycle is in flight; stats and telemetry for frame N
//! are fully applied before frame N+1 is read. The session owns a
//! cancellation flag, checked before applying each cycle's results, so a
//! stop issued while a cycle is in flight discards that cycle's results
//! instead of applying them to a torn-down session.
//!
//! Failure taxonomy: setup failures keep the session in `Idle` with an
//! `Error` entry and are retryable; transient per-cycle failures log a
//! `Warning` and skip the cycle; losing the frame source mid-session is an
//! implicit stop with a `Warning`. Nothing here ends the process and no
//! failure escapes `step` as an error.

use anyhow::{bail, Result};
use chrono::Local;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::alert::AlertEmitter;
use crate::capture::CaptureManager;
use crate::config::MonitorConfig;
use crate::detect::{filter_detections, DetectorBackend};
use crate::events::{EventLog, Severity};
use crate::export::ExportSink;
use crate::ingest::{open_source, FrameSource, SourceSpec};
use crate::overlay::{self, OverlayBuffer};
use crate::stats::StatsAggregator;
use crate::telemetry::TelemetryTracker;

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Monitoring,
    MonitoringAndRecording,
}

pub struct MonitorSession {
    config: MonitorConfig,
    state: MonitorState,
    detector: Box<dyn DetectorBackend>,
    source: Option<Box<dyn FrameSource>>,
    stats: StatsAggregator,
    telemetry: TelemetryTracker,
    alerts: AlertEmitter,
    events: EventLog,
    capture: CaptureManager,
    overlay: OverlayBuffer,
    export: Box<dyn ExportSink>,
    cancel: Arc<AtomicBool>,
}

impl MonitorSession {
    pub fn new(
        config: MonitorConfig,
        detector: Box<dyn DetectorBackend>,
        alerts: AlertEmitter,
        export: Box<dyn ExportSink>,
    ) -> Self {
        let capture = CaptureManager::new(config.capture.recording_fps);
        Self {
            config,
            state: MonitorState::Idle,
            detector,
            source: None,
            stats: StatsAggregator::new(),
            telemetry: TelemetryTracker::new(),
            alerts,
            events: EventLog::new(),
            capture,
            overlay: OverlayBuffer::new(),
            export,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn is_monitoring(&self) -> bool {
        matches!(
            self.state,
            MonitorState::Monitoring | MonitorState::MonitoringAndRecording
        )
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }

    pub fn telemetry(&self) -> &TelemetryTracker {
        &self.telemetry
    }

    pub fn capture(&self) -> &CaptureManager {
        &self.capture
    }

    pub fn overlay(&self) -> OverlayBuffer {
        self.overlay.clone()
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Configuration is read each cycle; callers may adjust it live.
    pub fn config_mut(&mut self) -> &mut MonitorConfig {
        &mut self.config
    }

    /// Shared cancellation flag; flipping it stops the loop before the
    /// next cycle's results are applied.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// `Idle -> Monitoring`. Requires a ready detector and an openable
    /// frame source; on failure the session stays `Idle` and the command
    /// may simply be retried.
    pub fn start(&mut self) -> Result<()> {
        if self.state != MonitorState::Idle {
            self.events
                .push(Severity::Warning, "monitoring already active");
            bail!("monitoring already active");
        }
        if !self.detector.ready() {
            self.events.push(
                Severity::Error,
                format!("detection model '{}' is not ready", self.detector.name()),
            );
            bail!("detection model not ready");
        }

        let spec = SourceSpec::parse(&self.config.source);
        let mut source = match open_source(&spec, &self.config.frame) {
            Ok(source) => source,
            Err(e) => {
                self.events.push(
                    Severity::Error,
                    format!("failed to open frame source '{}': {:#}", self.config.source, e),
                );
                return Err(e);
            }
        };
        if let Err(e) = source.connect() {
            self.events.push(
                Severity::Error,
                format!("failed to connect frame source '{}': {:#}", self.config.source, e),
            );
            return Err(e);
        }

        self.source = Some(source);
        self.cancel.store(false, Ordering::SeqCst);
        self.state = MonitorState::Monitoring;
        self.stats.begin_session(Local::now());
        self.telemetry.begin(Instant::now());
        self.events.push(
            Severity::Info,
            format!("monitoring started ({})", self.config.source),
        );
        Ok(())
    }

    /// `Monitoring -> Idle`. A no-op while already `Idle`: no transition
    /// and no log entry. Any active recording is finalized first.
    pub fn stop(&mut self) {
        if self.state == MonitorState::Idle {
            return;
        }
        self.cancel.store(true, Ordering::SeqCst);
        self.teardown();
        self.events.push(Severity::Info, "monitoring stopped");
    }

    /// `Monitoring -> MonitoringAndRecording`.
    pub fn start_recording(&mut self) -> Result<()> {
        match self.state {
            MonitorState::Idle => {
                self.events.push(
                    Severity::Warning,
                    "recording requires an active monitoring session",
                );
                bail!("recording requires an active monitoring session");
            }
            MonitorState::MonitoringAndRecording => {
                self.events
                    .push(Severity::Warning, "recording already in progress");
                bail!("recording already in progress");
            }
            MonitorState::Monitoring => {}
        }

        self.capture.start_recording(self.overlay.clone())?;
        self.state = MonitorState::MonitoringAndRecording;
        self.events.push(Severity::Info, "recording started");
        Ok(())
    }

    /// `MonitoringAndRecording -> Monitoring`, finalizing the artifact.
    pub fn stop_recording(&mut self) -> Result<()> {
        if self.state != MonitorState::MonitoringAndRecording {
            bail!("no recording in progress");
        }
        let result = self.capture.stop_recording(&mut *self.export);
        self.state = MonitorState::Monitoring;
        match result {
            Ok(frames) => {
                self.events.push(
                    Severity::Success,
                    format!("recording saved ({} frames)", frames),
                );
                Ok(())
            }
            Err(e) => {
                self.events.push(
                    Severity::Warning,
                    format!("recording finalization failed: {:#}", e),
                );
                Err(e)
            }
        }
    }

    /// Convenience toggle: starts a recording when idle on that front,
    /// finalizes it otherwise.
    pub fn toggle_recording(&mut self) -> Result<()> {
        if self.state == MonitorState::MonitoringAndRecording {
            self.stop_recording()
        } else {
            self.start_recording()
        }
    }

    /// Store the current annotated frame as a screenshot. Valid only while
    /// monitoring; cooldown-free and unbounded, unlike alerts.
    pub fn capture_snapshot(&mut self) -> Result<String> {
        if self.state == MonitorState::Idle {
            self.events.push(
                Severity::Warning,
                "snapshot requires an active monitoring session",
            );
            bail!("snapshot requires an active monitoring session");
        }
        match self.capture.capture_snapshot(&self.overlay, &mut *self.export) {
            Ok((id, count)) => {
                self.events.push(
                    Severity::Success,
                    format!("snapshot captured (occupancy {})", count),
                );
                Ok(id)
            }
            Err(e) => {
                self.events
                    .push(Severity::Warning, format!("snapshot failed: {:#}", e));
                Err(e)
            }
        }
    }

    /// Run one detection cycle. Returns false once the session has left
    /// the monitoring states (stop, cancellation, or source loss); all
    /// per-cycle failures are handled internally per the failure taxonomy.
    pub fn step(&mut self) -> bool {
        if !self.is_monitoring() || self.cancel.load(Ordering::SeqCst) {
            return false;
        }
        let Some(source) = self.source.as_mut() else {
            return false;
        };

        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                self.handle_source_loss("frame source ended");
                return false;
            }
            Err(e) => {
                self.events
                    .push(Severity::Warning, format!("frame read failed: {:#}", e));
                return true;
            }
        };

        let detections = match self.detector.detect(&frame) {
            Ok(detections) => detections,
            Err(e) => {
                self.events
                    .push(Severity::Warning, format!("detection failed: {:#}", e));
                return true;
            }
        };

        // Late-result discard: a stop issued while this cycle was in
        // flight invalidates its results.
        if self.cancel.load(Ordering::SeqCst) || !self.is_monitoring() {
            return false;
        }

        let filtered = filter_detections(
            &detections,
            &self.config.target_label,
            self.config.confidence_cutoff,
        );
        let count = filtered.len() as u32;

        self.stats.update(count);
        self.telemetry.tick(count, Instant::now(), Local::now());

        match overlay::compose(&frame, &filtered) {
            Ok(composed) => self.overlay.publish(composed),
            Err(e) => {
                self.events.push(
                    Severity::Warning,
                    format!("overlay compositing failed: {:#}", e),
                );
            }
        }

        if self.alerts.maybe_alert(
            count,
            self.config.alert_threshold,
            self.config.sound_alerts,
            Instant::now(),
        ) {
            self.events.push(
                Severity::Alert,
                format!(
                    "occupancy {} reached alert threshold {}",
                    count, self.config.alert_threshold
                ),
            );
        }

        true
    }

    /// Drive the cycle loop until the session stops or is cancelled,
    /// sleeping the configured processing delay between cycles.
    pub fn run(&mut self) {
        let mut last_health = Instant::now();
        while self.step() {
            if last_health.elapsed() >= HEALTH_LOG_INTERVAL {
                if let Some(source) = &self.source {
                    let stats = source.stats();
                    log::info!(
                        "source health={} frames={} fps={} occupancy={}",
                        source.is_healthy(),
                        stats.frames_captured,
                        self.telemetry.fps(),
                        self.stats.stats().current_count
                    );
                }
                last_health = Instant::now();
            }
            std::thread::sleep(self.config.processing_mode.delay());
        }
    }

    fn handle_source_loss(&mut self, why: &str) {
        self.events
            .push(Severity::Warning, format!("{}; monitoring stopped", why));
        self.cancel.store(true, Ordering::SeqCst);
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.capture.is_recording() {
            match self.capture.stop_recording(&mut *self.export) {
                Ok(frames) => {
                    self.events.push(
                        Severity::Success,
                        format!("recording saved ({} frames)", frames),
                    );
                }
                Err(e) => {
                    self.events.push(
                        Severity::Warning,
                        format!("recording finalization failed: {:#}", e),
                    );
                }
            }
        }
        if let Some(mut source) = self.source.take() {
            source.close();
        }
        self.overlay.clear();
        self.state = MonitorState::Idle;
    }
}
