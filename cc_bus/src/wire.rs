//! Static channel-id → Control Change number table.

use std::collections::{BTreeMap, HashMap};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::BusError;

/// Highest controller number that is not a channel-mode message.
pub const MAX_CONTROL: u8 = 119;

/// Where each engine channel lands on the wire.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireMap {
    /// MIDI channel 0–15 (shown to users as 1–16).
    pub midi_channel: u8,
    pub controls:     BTreeMap<String, u8>,
}

impl WireMap {
    pub fn new(midi_channel: u8) -> Self {
        WireMap { midi_channel, controls: BTreeMap::new() }
    }

    pub fn with(mut self, channel_id: impl Into<String>, cc: u8) -> Self {
        self.controls.insert(channel_id.into(), cc);
        self
    }

    pub fn control_for(&self, channel_id: &str) -> Option<u8> {
        self.controls.get(channel_id).copied()
    }

    /// Check the table against the engine's channels.
    ///
    /// Every engine channel needs a control number.  Extra table entries are
    /// harmless.  Two channels sharing a controller is allowed but usually a
    /// typo, so it is logged.
    pub fn validate<'a>(&self, channel_ids: impl IntoIterator<Item = &'a str>) -> Result<(), BusError> {
        if self.midi_channel > 15 {
            return Err(BusError::InvalidMidiChannel(self.midi_channel));
        }
        for (channel, &cc) in &self.controls {
            if cc > MAX_CONTROL {
                return Err(BusError::InvalidControl { channel: channel.clone(), cc });
            }
        }

        let mut owners: HashMap<u8, &str> = HashMap::new();
        for id in channel_ids {
            let cc = self.control_for(id)
                .ok_or_else(|| BusError::UnmappedChannel(id.to_string()))?;
            if let Some(prev) = owners.insert(cc, id) {
                warn!("channels {:?} and {:?} both drive CC {}", prev, id, cc);
            }
        }
        Ok(())
    }

    /// CC numbers used with the gesture-recogniser preset, on MIDI channel 2.
    pub fn gestures() -> Self {
        WireMap::new(1)
            .with("palm_height", 1)
            .with("Open_Palm",   2)
            .with("Closed_Fist", 3)
            .with("Pointing_Up", 4)
            .with("Victory",     5)
            .with("ILoveYou",    6)
            .with("Thumb_Up",    7)
            .with("Thumb_Down",  8)
    }

    /// CC numbers used with the hand-tracking preset, on MIDI channel 1.
    pub fn hand() -> Self {
        WireMap::new(0)
            .with("palm_height",       1)
            .with("index_closedness",  2)
            .with("middle_closedness", 3)
            .with("ring_closedness",   4)
            .with("pinky_closedness",  5)
            .with("thumb_closedness",  6)
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "gestures" => Some(WireMap::gestures()),
            "hand"     => Some(WireMap::hand()),
            _          => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use cc_engine::{EngineConfig, MappingEngine};

    #[test]
    fn presets_cover_engine_presets() {
        for name in ["gestures", "hand"] {
            let engine = MappingEngine::new(&EngineConfig::preset(name).unwrap()).unwrap();
            WireMap::preset(name).unwrap().validate(engine.channel_ids()).unwrap();
        }
    }

    #[test]
    fn presets_use_their_own_midi_channels() {
        assert_eq!(crate::control_change(WireMap::gestures().midi_channel, 5, 127), [0xB1, 5, 127]);
        assert_eq!(crate::control_change(WireMap::hand().midi_channel, 1, 64), [0xB0, 1, 64]);
    }

    #[test]
    fn unmapped_channel_rejected() {
        let wire = WireMap::new(0).with("palm_height", 1);
        assert!(matches!(
            wire.validate(["palm_height", "Victory"]),
            Err(BusError::UnmappedChannel(id)) if id == "Victory"
        ));
    }

    #[test]
    fn reserved_control_rejected() {
        let wire = WireMap::new(0).with("palm_height", 123);
        assert!(matches!(
            wire.validate(["palm_height"]),
            Err(BusError::InvalidControl { cc: 123, .. })
        ));
    }

    #[test]
    fn bad_midi_channel_rejected() {
        assert!(matches!(
            WireMap::new(16).validate(std::iter::empty()),
            Err(BusError::InvalidMidiChannel(16))
        ));
    }

    #[test]
    fn shared_controller_is_allowed() {
        let wire = WireMap::new(0).with("a", 7).with("b", 7);
        assert!(wire.validate(["a", "b"]).is_ok());
    }

    #[test]
    fn parses_from_toml() {
        let wire: WireMap = toml::from_str(r#"
            midi_channel = 3
            [controls]
            palm_height = 1
            Victory = 20
        "#).unwrap();
        assert_eq!(wire.midi_channel, 3);
        assert_eq!(wire.control_for("Victory"), Some(20));
        assert_eq!(wire.control_for("Thumb_Up"), None);
    }
}
