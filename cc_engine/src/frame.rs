//! Feature frames — one timestep of sensing output.
//!
//! A [`FeatureFrame`] is produced by whatever watches the hand (a gesture
//! recogniser, a landmark tracker, a replay file) and consumed by the
//! [`MappingEngine`](crate::MappingEngine).  It carries no behaviour of its
//! own.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

/// A named tracking point in normalised image coordinates.
///
/// `x` and `y` are in `[0, 1]` (origin top-left, `y` grows downward).
/// `z` is optional depth; 2D trackers leave it at `0.0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Landmark { x, y, z: 0.0 }
    }

    pub fn with_depth(x: f64, y: f64, z: f64) -> Self {
        Landmark { x, y, z }
    }

    /// Euclidean distance in the x/y plane.
    pub fn planar_distance(&self, other: &Landmark) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

pub type Landmarks = HashMap<String, Landmark>;

// ════════════════════════════════════════════════════════════════════════════
// FeatureFrame
// ════════════════════════════════════════════════════════════════════════════

/// Everything the sensing side reported for one captured frame.
///
/// A frame with no tracked hand has `landmarks == None`.  The engine treats
/// such a frame exactly like a frame that never arrived.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureFrame {
    /// Monotonic capture time, relative to an arbitrary session origin.
    #[serde(rename = "t", with = "seconds")]
    pub timestamp: Duration,

    /// Discrete labels detected this frame (e.g. `"Open_Palm"`).
    #[serde(default, rename = "labels")]
    pub active_labels: HashSet<String>,

    /// Landmark coordinates, present only while a hand is tracked.
    #[serde(default)]
    pub landmarks: Option<Landmarks>,
}

impl FeatureFrame {
    /// A frame with nothing in it: no labels, no tracked source.
    pub fn empty(timestamp: Duration) -> Self {
        FeatureFrame { timestamp, ..Default::default() }
    }

    /// Convenience for tests and simulators: timestamp in seconds.
    pub fn at_secs(secs: f64) -> Self {
        FeatureFrame::empty(Duration::from_secs_f64(secs.max(0.0)))
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.active_labels.insert(label.into());
        self
    }

    /// Add a landmark, switching the frame to "source tracked".
    pub fn with_landmark(mut self, name: impl Into<String>, point: Landmark) -> Self {
        self.landmarks
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), point);
        self
    }

    /// Mark the frame as tracked without adding any points.
    pub fn tracked(mut self) -> Self {
        self.landmarks.get_or_insert_with(HashMap::new);
        self
    }

    pub fn is_tracked(&self) -> bool {
        self.landmarks.is_some()
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.active_labels.contains(label)
    }
}

/// Serialise a `Duration` as floating-point seconds.
mod seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
