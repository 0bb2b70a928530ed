//! occuwatchd - occupancy monitoring daemon
//!
//! This daemon:
//! 1. Loads configuration (file + environment + CLI overrides)
//! 2. Opens the configured frame source and starts a monitoring session
//! 3. Runs the detection cycle loop until Ctrl-C or end of stream
//! 4. Optionally records the annotated feed for the whole session
//! 5. Exports snapshots/recordings to the capture directory

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use occuwatch::{
    AlertEmitter, DirectoryExportSink, MonitorConfig, MonitorSession, ProcessingMode,
    StubDetector, TerminalBell,
};

#[derive(Parser, Debug)]
#[command(name = "occuwatchd", about = "Real-time occupancy monitoring daemon")]
struct Args {
    /// Config file path (JSON). Falls back to OCCUWATCH_CONFIG.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Frame source: camera:<device>, a frame directory, or stub://<name>
    #[arg(long)]
    source: Option<String>,
    /// Occupancy count that triggers an alert
    #[arg(long)]
    threshold: Option<u32>,
    /// Minimum detection confidence, exclusive (0, 1)
    #[arg(long)]
    cutoff: Option<f32>,
    /// Processing mode: fast, normal, accurate
    #[arg(long)]
    mode: Option<String>,
    /// Disable the audible alert channel
    #[arg(long)]
    no_sound: bool,
    /// Directory receiving exported snapshots and recordings
    #[arg(long, value_name = "DIR")]
    export_dir: Option<PathBuf>,
    /// Record the annotated feed for the whole session
    #[arg(long)]
    record: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = build_config(&args)?;

    log::info!(
        "occuwatchd starting: source={} target={} threshold={} cutoff={}",
        config.source,
        config.target_label,
        config.alert_threshold,
        config.confidence_cutoff
    );

    let export = DirectoryExportSink::new(config.capture.export_dir.clone());
    let mut session = MonitorSession::new(
        config,
        Box::new(StubDetector::new()),
        AlertEmitter::new(Box::new(TerminalBell)),
        Box::new(export),
    );

    let cancel = session.cancel_flag();
    ctrlc::set_handler(move || {
        log::info!("shutdown requested");
        cancel.store(true, Ordering::SeqCst);
    })?;

    session.start()?;
    if args.record {
        session.start_recording()?;
    }

    session.run();
    session.stop();

    let stats = session.stats().snapshot();
    let duration = session
        .stats()
        .session_duration(chrono::Local::now())
        .map(|d| d.num_seconds())
        .unwrap_or(0);
    log::info!(
        "session summary: duration={}s peak={} occupied_frames={} snapshots={}",
        duration,
        stats.peak_count,
        stats.occupied_frames,
        session.capture().screenshots().len()
    );
    Ok(())
}

fn build_config(args: &Args) -> Result<MonitorConfig> {
    let mut config = match &args.config {
        Some(path) => MonitorConfig::load_from(path)?,
        None => MonitorConfig::load()?,
    };

    if let Some(source) = &args.source {
        config.source = source.clone();
    }
    if let Some(threshold) = args.threshold {
        config.alert_threshold = threshold;
    }
    if let Some(cutoff) = args.cutoff {
        config.confidence_cutoff = cutoff;
    }
    if let Some(mode) = &args.mode {
        config.processing_mode = mode.parse::<ProcessingMode>()?;
    }
    if args.no_sound {
        config.sound_alerts = false;
    }
    if let Some(dir) = &args.export_dir {
        config.capture.export_dir = dir.clone();
    }

    config.validate()?;
    Ok(config)
}
