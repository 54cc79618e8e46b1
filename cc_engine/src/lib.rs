//! # cc_engine
//!
//! Turns noisy, frame-by-frame hand sensing into a quiet stream of MIDI
//! Control Change values.
//!
//! * **Envelope channels** — a discrete label (`"Victory"`, `"Open_Palm"`)
//!   snaps its channel to 127 and lets it decay linearly to 0 once the label
//!   disappears.
//! * **Interpolation channels** — a landmark feature (wrist height, wrist→tip
//!   distance) is mapped linearly, with saturation, into a control range.
//! * **Change gate** — every channel is rounded to 0–127 and only reported
//!   when that integer changes.
//!
//! The [`MappingEngine`] owns all of them and is driven by one
//! [`step`](MappingEngine::step) per captured frame.  It does no I/O.
//!
//! ## Quick start
//!
//! ```rust
//! use cc_engine::{EngineConfig, FeatureFrame, Landmark, MappingEngine};
//!
//! let mut engine = MappingEngine::new(&EngineConfig::gestures()).unwrap();
//!
//! let frame = FeatureFrame::at_secs(0.0)
//!     .with_label("Open_Palm")
//!     .with_landmark("wrist", Landmark::new(0.5, 0.5));
//!
//! for update in engine.step(&frame) {
//!     println!("{} → {}", update.channel, update.value);
//! }
//! ```

pub mod config;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod gate;
pub mod interpolation;

pub use config::{EngineConfig, EnvelopeSpec, InterpolationSpec, GESTURE_LABELS};
pub use engine::{ChannelSnapshot, ControlUpdate, MappingEngine, StepReport};
pub use envelope::EnvelopeChannel;
pub use error::{EngineError, FeatureError};
pub use frame::{FeatureFrame, Landmark, Landmarks};
pub use gate::{quantize, ChangeGate};
pub use interpolation::{Axis, Feature, InterpolationChannel, OnLoss, RangeMap};

/// Full scale of a 7-bit controller.
pub const CC_MAX: f64 = 127.0;
