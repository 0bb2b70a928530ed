//! Cooldown-gated alert emission.
//!
//! The emitter owns its own cooldown timestamp. It is injected into the
//! session rather than living in module-level state, so two independent
//! monitoring instances never share cooldown state by accident. The
//! timestamp deliberately survives session stop/start.

use anyhow::Result;
use std::io::Write;
use std::time::{Duration, Instant};

/// Minimum wall-clock interval between alert firings. Global per channel:
/// repeated threshold breaches inside the window produce at most one alert.
pub const ALERT_COOLDOWN: Duration = Duration::from_millis(2000);

/// Plays the audible alert signal. Fire-and-forget from the emitter's
/// viewpoint: a failing channel must never interrupt the detection loop.
pub trait AlertChannel: Send {
    fn play_two_tone(&mut self) -> Result<()>;
}

/// Default channel: rings the terminal bell twice.
pub struct TerminalBell;

impl AlertChannel for TerminalBell {
    fn play_two_tone(&mut self) -> Result<()> {
        let mut err = std::io::stderr();
        err.write_all(b"\x07\x07")?;
        err.flush()?;
        Ok(())
    }
}

pub struct AlertEmitter {
    channel: Box<dyn AlertChannel>,
    last_fired: Option<Instant>,
    cooldown: Duration,
}

impl AlertEmitter {
    pub fn new(channel: Box<dyn AlertChannel>) -> Self {
        Self {
            channel,
            last_fired: None,
            cooldown: ALERT_COOLDOWN,
        }
    }

    /// Fire an alert if the occupancy count breaches the threshold, alerts
    /// are enabled, and the cooldown window has passed. Returns whether an
    /// alert fired so the caller can record it.
    pub fn maybe_alert(&mut self, count: u32, threshold: u32, enabled: bool, now: Instant) -> bool {
        if !enabled || count < threshold {
            return false;
        }
        if let Some(last) = self.last_fired {
            if now.saturating_duration_since(last) < self.cooldown {
                return false;
            }
        }

        self.last_fired = Some(now);
        if let Err(e) = self.channel.play_two_tone() {
            // Audio device trouble is not the loop's problem.
            log::debug!("alert channel failed: {}", e);
        }
        true
    }

    pub fn last_fired(&self) -> Option<Instant> {
        self.last_fired
    }
}
