//! Channel tables — what the engine should track and how.
//!
//! Tables are plain data so they can live in a TOML file:
//!
//! ```toml
//! [[envelopes]]
//! channel_id = "victory"
//! target_label = "Victory"
//! decay_seconds_full_scale = 2.0
//!
//! [[interpolations]]
//! channel_id = "palm_height"
//! feature_kind = "point_y"
//! point_refs = ["wrist"]
//! domain_range = [0.0, 1.0]
//! output_range = [127.0, 0.0]
//! ```
//!
//! Nothing is validated here; [`MappingEngine::new`](crate::MappingEngine::new)
//! does that in one place.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::interpolation::{Axis, Feature};

pub const DEFAULT_DECAY_SECS: f64 = 2.0;

/// Landmark names of the 21-point hand model.
pub mod hand {
    pub const WRIST:             &str = "wrist";
    pub const THUMB_CMC:         &str = "thumb_cmc";
    pub const THUMB_MCP:         &str = "thumb_mcp";
    pub const THUMB_IP:          &str = "thumb_ip";
    pub const THUMB_TIP:         &str = "thumb_tip";
    pub const INDEX_FINGER_MCP:  &str = "index_finger_mcp";
    pub const INDEX_FINGER_PIP:  &str = "index_finger_pip";
    pub const INDEX_FINGER_DIP:  &str = "index_finger_dip";
    pub const INDEX_FINGER_TIP:  &str = "index_finger_tip";
    pub const MIDDLE_FINGER_MCP: &str = "middle_finger_mcp";
    pub const MIDDLE_FINGER_PIP: &str = "middle_finger_pip";
    pub const MIDDLE_FINGER_DIP: &str = "middle_finger_dip";
    pub const MIDDLE_FINGER_TIP: &str = "middle_finger_tip";
    pub const RING_FINGER_MCP:   &str = "ring_finger_mcp";
    pub const RING_FINGER_PIP:   &str = "ring_finger_pip";
    pub const RING_FINGER_DIP:   &str = "ring_finger_dip";
    pub const RING_FINGER_TIP:   &str = "ring_finger_tip";
    pub const PINKY_MCP:         &str = "pinky_mcp";
    pub const PINKY_PIP:         &str = "pinky_pip";
    pub const PINKY_DIP:         &str = "pinky_dip";
    pub const PINKY_TIP:         &str = "pinky_tip";

    /// All 21 names in model index order.
    pub const ALL: [&str; 21] = [
        WRIST,
        THUMB_CMC, THUMB_MCP, THUMB_IP, THUMB_TIP,
        INDEX_FINGER_MCP, INDEX_FINGER_PIP, INDEX_FINGER_DIP, INDEX_FINGER_TIP,
        MIDDLE_FINGER_MCP, MIDDLE_FINGER_PIP, MIDDLE_FINGER_DIP, MIDDLE_FINGER_TIP,
        RING_FINGER_MCP, RING_FINGER_PIP, RING_FINGER_DIP, RING_FINGER_TIP,
        PINKY_MCP, PINKY_PIP, PINKY_DIP, PINKY_TIP,
    ];

    /// Fingertips paired with the channel id used by the `hand` preset.
    pub const FINGERTIPS: [(&str, &str); 5] = [
        ("index_closedness",  INDEX_FINGER_TIP),
        ("middle_closedness", MIDDLE_FINGER_TIP),
        ("ring_closedness",   RING_FINGER_TIP),
        ("pinky_closedness",  PINKY_TIP),
        ("thumb_closedness",  THUMB_TIP),
    ];
}

/// Labels produced by the stock gesture recogniser model.
pub const GESTURE_LABELS: [&str; 7] = [
    "Open_Palm",
    "Closed_Fist",
    "Pointing_Up",
    "Victory",
    "ILoveYou",
    "Thumb_Up",
    "Thumb_Down",
];

// ════════════════════════════════════════════════════════════════════════════
// Specs
// ════════════════════════════════════════════════════════════════════════════

/// One discrete-label channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeSpec {
    pub channel_id:   String,
    pub target_label: String,
    #[serde(default = "default_decay")]
    pub decay_seconds_full_scale: f64,
}

fn default_decay() -> f64 { DEFAULT_DECAY_SECS }

/// One continuous-feature channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterpolationSpec {
    pub channel_id:   String,
    /// `point_x`, `point_y`, `point_z` or `distance`.
    pub feature_kind: String,
    pub point_refs:   Vec<String>,
    pub domain_range: [f64; 2],
    pub output_range: [f64; 2],
    /// Unset: hold the last value while no hand is tracked.
    /// Set: fall back to rest over this many seconds (full scale).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss_decay_seconds: Option<f64>,
}

impl InterpolationSpec {
    /// Resolve `feature_kind` + `point_refs` to a [`Feature`].
    pub fn feature(&self) -> Result<Feature, EngineError> {
        let axis = match self.feature_kind.as_str() {
            "point_x"  => Some(Axis::X),
            "point_y"  => Some(Axis::Y),
            "point_z"  => Some(Axis::Z),
            "distance" => None,
            other => {
                return Err(EngineError::UnknownFeatureKind {
                    channel: self.channel_id.clone(),
                    kind:    other.to_string(),
                })
            }
        };
        let expected = if axis.is_some() { 1 } else { 2 };
        if self.point_refs.len() != expected {
            return Err(EngineError::PointRefCount {
                channel:  self.channel_id.clone(),
                kind:     self.feature_kind.clone(),
                expected,
                got:      self.point_refs.len(),
            });
        }
        Ok(match axis {
            Some(axis) => Feature::PointAxis { point: self.point_refs[0].clone(), axis },
            None => Feature::Distance {
                from: self.point_refs[0].clone(),
                to:   self.point_refs[1].clone(),
            },
        })
    }
}

/// The complete channel table.
///
/// Envelopes are registered before interpolation channels, each in table
/// order; emissions follow the same order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub envelopes:      Vec<EnvelopeSpec>,
    pub interpolations: Vec<InterpolationSpec>,
}

impl EngineConfig {
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty() && self.interpolations.is_empty()
    }

    /// Gesture recogniser labels as envelopes, plus palm height.
    pub fn gestures() -> Self {
        EngineConfig {
            envelopes: GESTURE_LABELS.iter()
                .map(|label| EnvelopeSpec {
                    channel_id:   label.to_string(),
                    target_label: label.to_string(),
                    decay_seconds_full_scale: DEFAULT_DECAY_SECS,
                })
                .collect(),
            interpolations: vec![palm_height()],
        }
    }

    /// Palm height plus how closed each finger is.
    pub fn hand() -> Self {
        let mut interpolations = vec![palm_height()];
        interpolations.extend(hand::FINGERTIPS.iter().map(|(id, tip)| InterpolationSpec {
            channel_id:   id.to_string(),
            feature_kind: "distance".into(),
            point_refs:   vec![hand::WRIST.into(), tip.to_string()],
            domain_range: [0.0, 0.5],
            output_range: [127.0, 0.0],
            loss_decay_seconds: None,
        }));
        EngineConfig { envelopes: Vec::new(), interpolations }
    }

    /// Look up a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "gestures" => Some(EngineConfig::gestures()),
            "hand"     => Some(EngineConfig::hand()),
            _          => None,
        }
    }
}

fn palm_height() -> InterpolationSpec {
    InterpolationSpec {
        channel_id:   "palm_height".into(),
        feature_kind: "point_y".into(),
        point_refs:   vec![hand::WRIST.into()],
        domain_range: [0.0, 1.0],
        output_range: [127.0, 0.0],
        loss_decay_seconds: None,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
