//! The control bus: engine updates in, Control Change messages out.

use std::time::Duration;

use cc_engine::ControlUpdate;
use log::trace;

use crate::error::BusError;
use crate::output::MidiOut;
use crate::smf::SessionCapture;
use crate::wire::WireMap;

/// 7-bit Control Change: status `0xB0 | channel`, controller, value.
pub fn control_change(channel: u8, control: u8, value: u8) -> [u8; 3] {
    [0xB0 | (channel & 0x0F), control & 0x7F, value & 0x7F]
}

/// Human-readable rendering of a Control Change message.
pub fn describe(message: &[u8]) -> String {
    match message {
        [status, cc, value] if status & 0xF0 == 0xB0 => {
            format!("ch{:<2} CC{:<3} = {}", (status & 0x0F) + 1, cc, value)
        }
        other => format!("{:02X?}", other),
    }
}

/// Owns the output backend and the wire table.
pub struct ControlBus {
    out:     Box<dyn MidiOut>,
    wire:    WireMap,
    capture: Option<SessionCapture>,
    sent:    u64,
}

impl ControlBus {
    pub fn new(out: Box<dyn MidiOut>, wire: WireMap) -> Self {
        ControlBus { out, wire, capture: None, sent: 0 }
    }

    /// Also keep a copy of everything sent, for [`SessionCapture::write_file`].
    pub fn with_capture(mut self, capture: SessionCapture) -> Self {
        self.capture = Some(capture);
        self
    }

    pub fn wire(&self) -> &WireMap { &self.wire }
    pub fn port_name(&self) -> &str { self.out.name() }
    pub fn messages_sent(&self) -> u64 { self.sent }
    pub fn capture(&self) -> Option<&SessionCapture> { self.capture.as_ref() }
    pub fn take_capture(&mut self) -> Option<SessionCapture> { self.capture.take() }

    /// Encode one update without sending it.
    pub fn encode(&self, update: &ControlUpdate) -> Result<[u8; 3], BusError> {
        let cc = self.wire.control_for(&update.channel)
            .ok_or_else(|| BusError::UnmappedChannel(update.channel.clone()))?;
        Ok(control_change(self.wire.midi_channel, cc, update.value))
    }

    /// Send one update.  `at` is the frame time, used only for capture.
    pub fn send(&mut self, at: Duration, update: &ControlUpdate) -> Result<(), BusError> {
        let msg = self.encode(update)?;
        self.out.send(&msg)?;
        self.sent += 1;
        if let Some(cap) = self.capture.as_mut() {
            cap.record(at, &msg);
        }
        trace!("{} → {}", update.channel, describe(&msg));
        Ok(())
    }

    /// Send updates in order, stopping at the first failure.
    pub fn send_all(&mut self, at: Duration, updates: &[ControlUpdate]) -> Result<(), BusError> {
        for u in updates {
            self.send(at, u)?;
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
