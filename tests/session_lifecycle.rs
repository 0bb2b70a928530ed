use anyhow::Result;
use std::sync::atomic::Ordering;

use occuwatch::{
    AlertChannel, AlertEmitter, MemoryExportSink, MonitorConfig, MonitorSession, MonitorState,
    Severity, StubDetector,
};

struct SilentChannel;

impl AlertChannel for SilentChannel {
    fn play_two_tone(&mut self) -> Result<()> {
        Ok(())
    }
}

fn config(source: &str) -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.source = source.to_string();
    config.frame.width = 64;
    config.frame.height = 48;
    config
}

fn session(source: &str) -> (MonitorSession, MemoryExportSink) {
    let sink = MemoryExportSink::new();
    let session = MonitorSession::new(
        config(source),
        Box::new(StubDetector::new()),
        AlertEmitter::new(Box::new(SilentChannel)),
        Box::new(sink.clone()),
    );
    (session, sink)
}

#[test]
fn full_session_against_a_bounded_source() {
    let (mut session, _sink) = session("stub://lobby?frames=40");
    assert_eq!(session.state(), MonitorState::Idle);

    session.start().expect("start");
    assert_eq!(session.state(), MonitorState::Monitoring);
    assert!(session.stats().stats().session_start.is_some());

    let mut cycles = 0u32;
    while session.step() {
        cycles += 1;
    }
    // All 40 frames consumed, then the stream end stopped the session.
    assert_eq!(cycles, 40);
    assert_eq!(session.state(), MonitorState::Idle);

    let stats = session.stats().snapshot();
    assert!(stats.peak_count >= stats.current_count);
    assert!(stats.occupied_frames <= 40);
    assert!(session
        .events()
        .entries()
        .any(|e| e.severity == Severity::Warning && e.message.contains("frame source ended")));
}

#[test]
fn restart_after_stop_reuses_counters() {
    let (mut session, _sink) = session("stub://lobby?frames=10");
    session.start().expect("start");
    while session.step() {}
    let first_run = session.stats().snapshot();

    // The bounded stub replays the same scene, so counters keep growing
    // from where they left off rather than resetting.
    session.start().expect("restart");
    while session.step() {}
    let second_run = session.stats().snapshot();
    assert!(second_run.occupied_frames >= first_run.occupied_frames);
    assert!(second_run.peak_count >= first_run.peak_count);
}

#[test]
fn alerts_appear_in_the_event_log() {
    let (mut session, _sink) = session("stub://lobby?frames=60");
    // Threshold 1 so any occupied frame breaches it.
    session.config_mut().alert_threshold = 1;
    session.start().expect("start");
    while session.step() {}

    let alerts = session
        .events()
        .entries()
        .filter(|e| e.severity == Severity::Alert)
        .count();
    assert!(alerts >= 1);
    // Cooldown keeps rapid breaches from alerting every cycle.
    assert!(alerts < 60);
}

#[test]
fn cancel_flag_stops_the_run_loop() {
    let (mut session, _sink) = session("stub://lobby");
    session.start().expect("start");
    session.cancel_flag().store(true, Ordering::SeqCst);
    // An unbounded source would loop forever if cancellation were ignored.
    session.run();
    assert!(session.is_monitoring());
    session.stop();
    assert_eq!(session.state(), MonitorState::Idle);
}

#[test]
fn snapshot_during_monitoring_lands_in_the_sink() {
    let (mut session, sink) = session("stub://lobby");
    session.start().expect("start");
    assert!(session.step());

    let id = session.capture_snapshot().expect("snapshot");
    assert!(id.starts_with("occuwatch_snapshot_"));
    assert_eq!(sink.image_count(), 1);
    assert_eq!(session.capture().screenshots().len(), 1);
    assert_eq!(
        session.events().latest().unwrap().severity,
        Severity::Success
    );

    // Snapshots are cooldown-free.
    session.capture_snapshot().expect("second snapshot");
    assert_eq!(sink.image_count(), 2);

    session.stop();
}

#[test]
fn detector_failures_do_not_end_the_session() {
    let sink = MemoryExportSink::new();
    let mut session = MonitorSession::new(
        config("stub://lobby?frames=8"),
        Box::new(StubDetector::new().with_failures(2)),
        AlertEmitter::new(Box::new(SilentChannel)),
        Box::new(sink),
    );
    session.start().expect("start");
    let mut cycles = 0;
    while session.step() {
        cycles += 1;
    }
    assert_eq!(cycles, 8);
    let warnings = session
        .events()
        .entries()
        .filter(|e| e.severity == Severity::Warning && e.message.contains("detection failed"))
        .count();
    assert_eq!(warnings, 4);
}
