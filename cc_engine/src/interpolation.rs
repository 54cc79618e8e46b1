//! Continuous features mapped into a bounded control range.
//!
//! A [`Feature`] reads one scalar out of the landmark set (a coordinate, a
//! distance); a [`RangeMap`] squeezes it linearly into the output range with
//! saturation at both ends; an [`InterpolationChannel`] keeps the result
//! between frames so a lost hand doesn't snap the control to a default.
//!
//! No rounding happens here.  Values stay `f64` until the
//! [`ChangeGate`](crate::ChangeGate).

use crate::error::FeatureError;
use crate::frame::{Landmark, Landmarks};

// ════════════════════════════════════════════════════════════════════════════
// Feature
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis { X, Y, Z }

/// A pure function of one frame's landmarks.
#[derive(Clone, Debug, PartialEq)]
pub enum Feature {
    /// One coordinate of one point, e.g. wrist height.
    PointAxis { point: String, axis: Axis },
    /// Distance between two points in the x/y plane.
    Distance { from: String, to: String },
}

impl Feature {
    /// Every point name this feature needs.
    pub fn point_refs(&self) -> Vec<&str> {
        match self {
            Feature::PointAxis { point, .. } => vec![point.as_str()],
            Feature::Distance { from, to }   => vec![from.as_str(), to.as_str()],
        }
    }

    pub fn evaluate(&self, landmarks: &Landmarks) -> Result<f64, FeatureError> {
        match self {
            Feature::PointAxis { point, axis } => {
                let p = lookup(landmarks, point)?;
                Ok(match axis {
                    Axis::X => p.x,
                    Axis::Y => p.y,
                    Axis::Z => p.z,
                })
            }
            Feature::Distance { from, to } => {
                let a = lookup(landmarks, from)?;
                let b = lookup(landmarks, to)?;
                Ok(a.planar_distance(b))
            }
        }
    }
}

fn lookup<'a>(landmarks: &'a Landmarks, name: &str) -> Result<&'a Landmark, FeatureError> {
    landmarks
        .get(name)
        .ok_or_else(|| FeatureError::MissingRequiredLandmark(name.to_string()))
}

// ════════════════════════════════════════════════════════════════════════════
// RangeMap
// ════════════════════════════════════════════════════════════════════════════

/// Clamped linear map `domain → output`.  Either range may be inverted.
///
/// The domain must not be empty; [`MappingEngine::new`](crate::MappingEngine::new)
/// rejects such configurations before a `RangeMap` is ever built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RangeMap {
    pub domain: (f64, f64),
    pub output: (f64, f64),
}

impl RangeMap {
    pub fn new(domain: (f64, f64), output: (f64, f64)) -> Self {
        RangeMap { domain, output }
    }

    pub fn map(&self, x: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (o0, o1) = self.output;
        let t = ((x - d0) / (d1 - d0)).clamp(0.0, 1.0);
        if t >= 1.0 {
            return o1;
        }
        (o0 + t * (o1 - o0)).clamp(self.output_min(), self.output_max())
    }

    pub fn output_min(&self) -> f64 { self.output.0.min(self.output.1) }
    pub fn output_max(&self) -> f64 { self.output.0.max(self.output.1) }
    pub fn output_span(&self) -> f64 { (self.output.1 - self.output.0).abs() }
}

// ════════════════════════════════════════════════════════════════════════════
// InterpolationChannel
// ════════════════════════════════════════════════════════════════════════════

/// What a channel does on frames where no source is tracked.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OnLoss {
    /// Keep the last value.
    Hold,
    /// Fall toward the rest value at this many units per second.
    Decay { rate: f64 },
}

/// Continuous channel state.
#[derive(Clone, Debug, PartialEq)]
pub struct InterpolationChannel {
    feature: Feature,
    map:     RangeMap,
    on_loss: OnLoss,
    value:   f64,
}

impl InterpolationChannel {
    pub fn new(feature: Feature, map: RangeMap, on_loss: OnLoss) -> Self {
        InterpolationChannel { value: map.output_min(), feature, map, on_loss }
    }

    pub fn feature(&self) -> &Feature { &self.feature }
    pub fn range_map(&self) -> &RangeMap { &self.map }
    pub fn value(&self) -> f64 { self.value }

    /// Value every channel starts at and decays toward.
    pub fn rest_value(&self) -> f64 { self.map.output_min() }

    /// Recompute from this frame's landmarks.
    ///
    /// `None` means the source is not tracked.  A missing point is reported
    /// as an error and leaves the value untouched.
    pub fn update(&mut self, landmarks: Option<&Landmarks>, dt: f64) -> Result<f64, FeatureError> {
        match landmarks {
            Some(points) => {
                let raw = self.feature.evaluate(points)?;
                // A NaN coordinate from the tracker is treated like no reading.
                if raw.is_finite() {
                    self.value = self.map.map(raw);
                }
            }
            None => self.release(dt),
        }
        Ok(self.value)
    }

    fn release(&mut self, dt: f64) {
        if let OnLoss::Decay { rate } = self.on_loss {
            let dt = if dt > 0.0 { dt } else { 0.0 };
            let rest = self.rest_value();
            self.value = (self.value - rate * dt).max(rest);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
