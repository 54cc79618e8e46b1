//! # cc_bus
//!
//! Delivers [`cc_engine`] updates to a MIDI output as 7-bit Control Change
//! messages.
//!
//! * [`WireMap`] — static table of channel id → controller number.
//! * [`MidiOut`] — output backend: a real port via `midir`, [`NullOut`], or
//!   [`RecordingOut`] for dry runs and tests.
//! * [`ControlBus`] — ties the two together; optionally tees every message
//!   into a [`SessionCapture`] that can be saved as a `.mid` file.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use cc_bus::{open_output, ControlBus, PortSelector, WireMap};
//! use cc_engine::ControlUpdate;
//!
//! let out = open_output(&PortSelector::Named("PythonMIDI".into())).unwrap();
//! let mut bus = ControlBus::new(out, WireMap::gestures());
//! bus.send(Duration::ZERO, &ControlUpdate::new("Victory", 127)).unwrap();
//! ```

pub mod bus;
pub mod error;
pub mod output;
pub mod smf;
pub mod wire;

pub use bus::{control_change, describe, ControlBus};
pub use error::BusError;
pub use output::{list_output_ports, open_output, MidiOut, MidirOut, NullOut, PortSelector, RecordingOut};
pub use smf::SessionCapture;
pub use wire::WireMap;
