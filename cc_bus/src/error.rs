use thiserror::Error;

/// Anything that can go wrong between a [`ControlUpdate`](cc_engine::ControlUpdate)
/// and the wire.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("MIDI init failed: {0}")]
    Init(#[from] midir::InitError),

    #[error("could not connect to MIDI port {port:?}: {reason}")]
    Connect { port: String, reason: String },

    #[error("MIDI send failed: {0}")]
    Send(#[from] midir::SendError),

    #[error("could not read MIDI port name: {0}")]
    PortInfo(#[from] midir::PortInfoError),

    #[error("no MIDI output port matching {wanted:?} (available: {available:?})")]
    PortNotFound { wanted: String, available: Vec<String> },

    #[error("channel {0:?} has no control number in the wire map")]
    UnmappedChannel(String),

    #[error("channel {channel:?}: control number {cc} is reserved (0–119 allowed)")]
    InvalidControl { channel: String, cc: u8 },

    #[error("MIDI channel {0} out of range (0–15)")]
    InvalidMidiChannel(u8),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
