//! Change suppression — the only place float state becomes a 7-bit value.

use crate::CC_MAX;

/// Round and clamp a channel value to the 0–127 wire range.
pub fn quantize(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, CC_MAX).round() as u8
}

/// Remembers the last value sent for one channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChangeGate {
    last_emitted: u8,
}

impl ChangeGate {
    pub fn new() -> Self { ChangeGate::default() }

    pub fn last_emitted(&self) -> u8 { self.last_emitted }

    /// `Some(v)` iff the quantised value differs from the last one sent.
    pub fn emit_if_changed(&mut self, value: f64) -> Option<u8> {
        let q = quantize(value);
        if q == self.last_emitted {
            return None;
        }
        self.last_emitted = q;
        Some(q)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
