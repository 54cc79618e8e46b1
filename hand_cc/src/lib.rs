//! # hand_cc
//!
//! Hand-gesture MIDI controller.  Frames from a hand tracker (or the
//! built-in simulator, or a recorded session) go through
//! [`cc_engine::MappingEngine`] and come out as Control Change messages on a
//! MIDI port.
//!
//! ## Presets
//!
//! | Preset | Channels | CC |
//! |---|---|---|
//! | `gestures` | palm height | 1 |
//! | | `Open_Palm`, `Closed_Fist`, `Pointing_Up`, `Victory`, `ILoveYou`, `Thumb_Up`, `Thumb_Down` envelopes (2 s decay) | 2–8 |
//! | `hand` | palm height | 1 |
//! | | index, middle, ring, pinky, thumb closedness (wrist→tip distance) | 2–6 |
//!
//! ## Frame sources
//!
//! * (default) — **Simulation**: a synthetic hand that moves, flashes
//!   recogniser labels and periodically leaves the frame.
//! * `--replay FILE` — **Replay**: one JSON frame per line, as written by an
//!   external tracker.

pub mod app;
pub mod config;
pub mod source;

pub use app::{run, AppError, RunSummary};
pub use config::AppConfig;
pub use source::{spawn_frame_source, FrameSource, ReplayFrameSource, SimFrameSource};
