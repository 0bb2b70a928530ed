use anyhow::Result;
use std::time::Duration;

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

fn session(source: &str) -> (MonitorSession, MemoryExportSink) {
    let mut config = MonitorConfig::default();
    config.source = source.to_string();
    config.frame.width = 64;
    config.frame.height = 48;
    config.capture.recording_fps = 30;

    let sink = MemoryExportSink::new();
    let session = MonitorSession::new(
        config,
        Box::new(StubDetector::new()),
        AlertEmitter::new(Box::new(SilentChannel)),
        Box::new(sink.clone()),
    );
    (session, sink)
}

#[test]
fn recording_lifecycle_produces_an_artifact() {
    let (mut session, sink) = session("stub://lobby");
    session.start().expect("start");
    assert!(session.step());

    session.start_recording().expect("start recording");
    assert_eq!(session.state(), MonitorState::MonitoringAndRecording);

    // Let the recorder sample the overlay a few times while cycles run.
    for _ in 0..3 {
        assert!(session.step());
        std::thread::sleep(Duration::from_millis(50));
    }

    session.stop_recording().expect("stop recording");
    assert_eq!(session.state(), MonitorState::Monitoring);
    assert_eq!(sink.video_count(), 1);
    assert!(sink.last_video_frame_count().unwrap() >= 1);
    assert!(session
        .events()
        .entries()
        .any(|e| e.severity == Severity::Success && e.message.contains("recording saved")));

    session.stop();
}

#[test]
fn double_start_recording_is_rejected() {
    let (mut session, sink) = session("stub://lobby");
    session.start().expect("start");
    session.start_recording().expect("start recording");
    assert!(session.start_recording().is_err());
    assert_eq!(session.state(), MonitorState::MonitoringAndRecording);
    session.stop();
    assert_eq!(sink.video_count(), 1);
}

#[test]
fn stop_recording_without_recording_is_rejected() {
    let (mut session, sink) = session("stub://lobby");
    session.start().expect("start");
    assert!(session.stop_recording().is_err());
    assert_eq!(sink.video_count(), 0);
    session.stop();
}

#[test]
fn stop_finalizes_an_active_recording_implicitly() {
    let (mut session, sink) = session("stub://lobby");
    session.start().expect("start");
    assert!(session.step());
    session.start_recording().expect("start recording");
    std::thread::sleep(Duration::from_millis(80));

    // A plain stop while recording behaves like stopRecording + stop.
    session.stop();
    assert_eq!(session.state(), MonitorState::Idle);
    assert_eq!(sink.video_count(), 1);
}

#[test]
fn source_loss_mid_recording_is_recoverable() {
    let (mut session, sink) = session("stub://lobby?frames=4");
    session.start().expect("start");
    assert!(session.step());
    session.start_recording().expect("start recording");

    // Drain the remaining frames; the stream end forces an implicit stop
    // that must finalize the recording rather than crash.
    while session.step() {
        std::thread::sleep(Duration::from_millis(40));
    }
    assert_eq!(session.state(), MonitorState::Idle);
    assert_eq!(sink.video_count(), 1);
    assert!(session
        .events()
        .entries()
        .any(|e| e.severity == Severity::Warning && e.message.contains("frame source ended")));
}

#[test]
fn toggle_flips_recording_state() {
    let (mut session, sink) = session("stub://lobby");
    session.start().expect("start");
    assert!(session.step());

    session.toggle_recording().expect("toggle on");
    assert_eq!(session.state(), MonitorState::MonitoringAndRecording);
    std::thread::sleep(Duration::from_millis(60));
    session.toggle_recording().expect("toggle off");
    assert_eq!(session.state(), MonitorState::Monitoring);
    assert_eq!(sink.video_count(), 1);
    session.stop();
}

#[test]
fn snapshot_includes_current_occupancy_count() {
    let (mut session, _sink) = session("stub://lobby");
    session.start().expect("start");
    assert!(session.step());
    session.capture_snapshot().expect("snapshot");

    let current = session.stats().stats().current_count;
    let shot = &session.capture().screenshots()[0];
    assert_eq!(shot.count, current);
    session.stop();
}
