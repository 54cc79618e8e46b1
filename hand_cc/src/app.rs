//! The frame loop: source → engine → bus.
//!
//! `run` owns the [`MappingEngine`] for the whole session.  Frames arrive on
//! a channel from a [`FrameSource`](crate::source::FrameSource) thread; each
//! one is stepped and whatever changed goes straight out on the bus.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use cc_bus::{BusError, ControlBus};
use cc_engine::{EngineError, FeatureFrame, MappingEngine};
use log::{info, trace, warn};
use thiserror::Error;

use crate::config::AppConfig;

/// How often the loop looks at the stop flag while no frames arrive.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

// ════════════════════════════════════════════════════════════════════════════
// AppError
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum AppError {
    #[error("could not read config {path}: {source}")]
    ConfigRead { path: String, source: std::io::Error },

    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("unknown preset {0:?} (expected \"gestures\" or \"hand\")")]
    UnknownPreset(String),

    #[error("invalid channel table: {0}")]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error("could not open replay {path}: {source}")]
    Replay { path: String, source: std::io::Error },

    #[error("{0}")]
    Usage(String),
}

// ════════════════════════════════════════════════════════════════════════════
// RunSummary
// ════════════════════════════════════════════════════════════════════════════

/// Counters for one session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames:      u64,
    /// Control changes produced by the engine.
    pub emissions:   u64,
    /// Channel-frames held because a landmark was missing.
    pub skipped:     u64,
    /// Messages the bus failed to deliver.
    pub send_errors: u64,
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main loop
// ════════════════════════════════════════════════════════════════════════════

/// Run until the source hangs up or `stop` is raised.
///
/// Configuration problems fail before the first frame.  Delivery failures
/// are logged and counted, never fatal: the engine state stays correct and
/// the next change is sent as usual.
pub fn run(
    cfg:    &AppConfig,
    frames: Receiver<FeatureFrame>,
    bus:    &mut ControlBus,
    stop:   &AtomicBool,
) -> Result<RunSummary, AppError> {
    let mut engine = MappingEngine::new(&cfg.engine)?;
    bus.wire().validate(engine.channel_ids())?;
    info!(
        "running {} channel(s) → {} (MIDI channel {})",
        engine.len(), bus.port_name(), bus.wire().midi_channel + 1
    );

    let mut summary = RunSummary::default();
    let mut synced = false;

    while !stop.load(Ordering::Relaxed) {
        let frame = match frames.recv_timeout(POLL_INTERVAL) {
            Ok(f) => f,
            Err(RecvTimeoutError::Timeout)      => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        // The receiver starts from whatever it last heard; put it at rest.
        if !synced {
            deliver(bus, &frame, &engine.resync(), &mut summary);
            synced = true;
        }

        let report = engine.step_report(&frame);
        summary.frames    += 1;
        summary.emissions += report.emissions.len() as u64;
        summary.skipped   += report.skipped.len() as u64;
        deliver(bus, &frame, &report.emissions, &mut summary);

        trace!(
            "frame {} t={:.3}s labels={:?} tracked={} → {} update(s)",
            summary.frames, frame.timestamp.as_secs_f64(),
            frame.active_labels, frame.is_tracked(), report.emissions.len()
        );
    }

    info!(
        "stopped after {} frame(s): {} control change(s), {} held channel-frame(s)",
        summary.frames, summary.emissions, summary.skipped
    );
    Ok(summary)
}

fn deliver(
    bus:     &mut ControlBus,
    frame:   &FeatureFrame,
    updates: &[cc_engine::ControlUpdate],
    summary: &mut RunSummary,
) {
    for update in updates {
        if let Err(e) = bus.send(frame.timestamp, update) {
            summary.send_errors += 1;
            warn!("dropped {}={}: {}", update.channel, update.value, e);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
