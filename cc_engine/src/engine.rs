//! The mapping engine — owns every channel and advances them once per frame.
//!
//! ```text
//!   FeatureFrame ──► step() ──► envelopes ──┐
//!                            └► interpolation ┴─► ChangeGate ──► Vec<ControlUpdate>
//! ```
//!
//! All channels in one `step` see the same `dt` and the same frame.

use std::collections::HashSet;
use std::time::Duration;

use log::{debug, trace};

use crate::config::{EngineConfig, EnvelopeSpec, InterpolationSpec};
use crate::envelope::EnvelopeChannel;
use crate::error::{EngineError, FeatureError};
use crate::frame::FeatureFrame;
use crate::gate::ChangeGate;
use crate::interpolation::{InterpolationChannel, OnLoss, RangeMap};
use crate::CC_MAX;

// ════════════════════════════════════════════════════════════════════════════
// Outputs
// ════════════════════════════════════════════════════════════════════════════

/// One changed channel value, ready for the control bus.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ControlUpdate {
    pub channel: String,
    pub value:   u8,
}

impl ControlUpdate {
    pub fn new(channel: impl Into<String>, value: u8) -> Self {
        ControlUpdate { channel: channel.into(), value }
    }
}

/// Everything one `step` produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    /// Changed values, in registration order.
    pub emissions: Vec<ControlUpdate>,
    /// Channels that held their value because a landmark was missing.
    pub skipped:   Vec<(String, FeatureError)>,
    /// Seconds charged to this step (never negative).
    pub dt:        f64,
}

/// Read-only view of one channel, for diagnostics.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelSnapshot {
    pub channel_id:   String,
    pub value:        f64,
    pub last_emitted: u8,
}

// ════════════════════════════════════════════════════════════════════════════
// Channel registry
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
enum ChannelKind {
    Envelope(EnvelopeChannel),
    Interpolation(InterpolationChannel),
}

#[derive(Clone, Debug)]
struct Channel {
    id:   String,
    kind: ChannelKind,
    gate: ChangeGate,
}

impl Channel {
    fn value(&self) -> f64 {
        match &self.kind {
            ChannelKind::Envelope(e)      => e.value(),
            ChannelKind::Interpolation(i) => i.value(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MappingEngine
// ════════════════════════════════════════════════════════════════════════════

/// Stateful frame → control-value mapper.
///
/// # Example
///
/// ```
/// use cc_engine::{EngineConfig, FeatureFrame, MappingEngine};
///
/// let mut engine = MappingEngine::new(&EngineConfig::gestures()).unwrap();
/// let out = engine.step(&FeatureFrame::at_secs(0.0).with_label("Victory"));
/// assert_eq!(out[0].channel, "Victory");
/// assert_eq!(out[0].value, 127);
/// ```
#[derive(Clone, Debug)]
pub struct MappingEngine {
    channels:       Vec<Channel>,
    last_step_time: Option<Duration>,
}

impl MappingEngine {
    /// Build every channel in `config`, rejecting anything that could not be
    /// evaluated safely later.
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let mut seen = HashSet::new();
        let mut channels = Vec::with_capacity(config.envelopes.len() + config.interpolations.len());

        for spec in &config.envelopes {
            register_id(&mut seen, &spec.channel_id)?;
            channels.push(Channel {
                id:   spec.channel_id.clone(),
                kind: ChannelKind::Envelope(build_envelope(spec)?),
                gate: ChangeGate::new(),
            });
        }
        for spec in &config.interpolations {
            register_id(&mut seen, &spec.channel_id)?;
            channels.push(Channel {
                id:   spec.channel_id.clone(),
                kind: ChannelKind::Interpolation(build_interpolation(spec)?),
                gate: ChangeGate::new(),
            });
        }

        debug!("mapping engine ready with {} channel(s)", channels.len());
        Ok(MappingEngine { channels, last_step_time: None })
    }

    /// Advance every channel by one frame and return the values that changed.
    pub fn step(&mut self, frame: &FeatureFrame) -> Vec<ControlUpdate> {
        self.step_report(frame).emissions
    }

    /// Like [`step`](Self::step), but also reports channels that had to hold
    /// because the frame lacked a landmark they need.
    pub fn step_report(&mut self, frame: &FeatureFrame) -> StepReport {
        let dt = self.advance_clock(frame.timestamp);
        let landmarks = frame.landmarks.as_ref();
        let mut skipped = Vec::new();

        for ch in &mut self.channels {
            match &mut ch.kind {
                ChannelKind::Envelope(env) => {
                    let active = frame.has_label(env.target_label());
                    env.update(active, dt);
                }
                ChannelKind::Interpolation(interp) => {
                    if let Err(e) = interp.update(landmarks, dt) {
                        debug!("channel {} held: {}", ch.id, e);
                        skipped.push((ch.id.clone(), e));
                    }
                }
            }
        }

        let mut emissions = Vec::new();
        for ch in &mut self.channels {
            let value = ch.value();
            if let Some(v) = ch.gate.emit_if_changed(value) {
                emissions.push(ControlUpdate::new(ch.id.clone(), v));
            }
        }

        trace!(
            "step t={:.3}s dt={:.4}s emitted={} skipped={}",
            frame.timestamp.as_secs_f64(), dt, emissions.len(), skipped.len()
        );
        StepReport { emissions, skipped, dt }
    }

    /// Advance with no frame at all.  Same as stepping an empty frame.
    pub fn idle(&mut self, timestamp: Duration) -> Vec<ControlUpdate> {
        self.step(&FeatureFrame::empty(timestamp))
    }

    /// Every channel's last emitted value, unconditionally.  State is untouched.
    pub fn resync(&self) -> Vec<ControlUpdate> {
        self.channels.iter()
            .map(|ch| ControlUpdate::new(ch.id.clone(), ch.gate.last_emitted()))
            .collect()
    }

    pub fn snapshot(&self) -> Vec<ChannelSnapshot> {
        self.channels.iter()
            .map(|ch| ChannelSnapshot {
                channel_id:   ch.id.clone(),
                value:        ch.value(),
                last_emitted: ch.gate.last_emitted(),
            })
            .collect()
    }

    pub fn channel_ids(&self) -> Vec<&str> {
        self.channels.iter().map(|ch| ch.id.as_str()).collect()
    }

    pub fn value_of(&self, channel_id: &str) -> Option<f64> {
        self.channels.iter().find(|ch| ch.id == channel_id).map(Channel::value)
    }

    pub fn len(&self) -> usize { self.channels.len() }
    pub fn is_empty(&self) -> bool { self.channels.is_empty() }

    pub fn last_step_time(&self) -> Option<Duration> { self.last_step_time }

    /// Seconds since the previous step; the first step and any clock
    /// regression count as zero.
    fn advance_clock(&mut self, now: Duration) -> f64 {
        let dt = match self.last_step_time {
            None => 0.0,
            Some(prev) => match now.checked_sub(prev) {
                Some(d) => d.as_secs_f64(),
                None => {
                    debug!(
                        "clock went backwards ({:.3}s -> {:.3}s), dt clamped to 0",
                        prev.as_secs_f64(), now.as_secs_f64()
                    );
                    0.0
                }
            },
        };
        self.last_step_time = Some(now);
        dt
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Construction helpers
// ════════════════════════════════════════════════════════════════════════════

fn register_id(seen: &mut HashSet<String>, id: &str) -> Result<(), EngineError> {
    if id.is_empty() {
        return Err(EngineError::EmptyChannelId);
    }
    if !seen.insert(id.to_string()) {
        return Err(EngineError::DuplicateChannel(id.to_string()));
    }
    Ok(())
}

fn check_decay(channel: &str, seconds: f64) -> Result<(), EngineError> {
    if !(seconds.is_finite() && seconds > 0.0) {
        return Err(EngineError::InvalidDecay { channel: channel.to_string(), seconds });
    }
    Ok(())
}

fn build_envelope(spec: &EnvelopeSpec) -> Result<EnvelopeChannel, EngineError> {
    check_decay(&spec.channel_id, spec.decay_seconds_full_scale)?;
    Ok(EnvelopeChannel::new(spec.target_label.clone(), spec.decay_seconds_full_scale))
}

fn build_interpolation(spec: &InterpolationSpec) -> Result<InterpolationChannel, EngineError> {
    let channel = || spec.channel_id.clone();
    let feature = spec.feature()?;

    let [d0, d1] = spec.domain_range;
    if !(d0.is_finite() && d1.is_finite()) {
        return Err(EngineError::NonFinite { channel: channel(), what: "domain_range" });
    }
    if d0 == d1 {
        return Err(EngineError::DegenerateDomain { channel: channel(), min: d0, max: d1 });
    }

    let [o0, o1] = spec.output_range;
    for bound in [o0, o1] {
        if !bound.is_finite() {
            return Err(EngineError::NonFinite { channel: channel(), what: "output_range" });
        }
        if !(0.0..=CC_MAX).contains(&bound) {
            return Err(EngineError::OutputOutOfRange { channel: channel(), value: bound });
        }
    }

    let map = RangeMap::new((d0, d1), (o0, o1));
    let on_loss = match spec.loss_decay_seconds {
        None => OnLoss::Hold,
        Some(secs) => {
            check_decay(&spec.channel_id, secs)?;
            OnLoss::Decay { rate: map.output_span() / secs }
        }
    };
    Ok(InterpolationChannel::new(feature, map, on_loss))
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::hand;
    use crate::frame::Landmark;

    fn envelope_only(decay: f64) -> MappingEngine {
        MappingEngine::new(&EngineConfig {
            envelopes: vec![EnvelopeSpec {
                channel_id:   "victory".into(),
                target_label: "Victory".into(),
                decay_seconds_full_scale: decay,
            }],
            interpolations: vec![],
        }).unwrap()
    }

    fn palm_only() -> MappingEngine {
        let mut cfg = EngineConfig::gestures();
        cfg.envelopes.clear();
        MappingEngine::new(&cfg).unwrap()
    }

    fn wrist_at(t: f64, y: f64) -> FeatureFrame {
        FeatureFrame::at_secs(t).with_landmark(hand::WRIST, Landmark::new(0.5, y))
    }

    // ── literal scenarios ────────────────────────────────────────────────
    #[test]
    fn envelope_scenario() {
        let mut e = envelope_only(2.0);

        let out = e.step(&FeatureFrame::at_secs(0.0).with_label("Victory"));
        assert_eq!(out, vec![ControlUpdate::new("victory", 127)]);

        let out = e.step(&FeatureFrame::at_secs(1.0));
        assert_eq!(e.value_of("victory"), Some(63.5));
        assert_eq!(out, vec![ControlUpdate::new("victory", 64)]);

        let out = e.step(&FeatureFrame::at_secs(2.0));
        assert_eq!(e.value_of("victory"), Some(0.0));
        assert_eq!(out, vec![ControlUpdate::new("victory", 0)]);

        let out = e.step(&FeatureFrame::at_secs(3.0));
        assert_eq!(e.value_of("victory"), Some(0.0));
        assert!(out.is_empty());
    }

    #[test]
    fn interpolation_scenario() {
        let mut e = palm_only();
        assert_eq!(e.step(&wrist_at(0.0, 0.0)), vec![ControlUpdate::new("palm_height", 127)]);
        assert_eq!(e.step(&wrist_at(0.1, 1.0)), vec![ControlUpdate::new("palm_height", 0)]);
        assert_eq!(e.step(&wrist_at(0.2, 0.5)), vec![ControlUpdate::new("palm_height", 64)]);
    }

    // ── clock ────────────────────────────────────────────────────────────
    #[test]
    fn first_step_has_zero_dt() {
        let mut e = envelope_only(2.0);
        let r = e.step_report(&FeatureFrame::at_secs(12.0));
        assert_eq!(r.dt, 0.0);
        assert_eq!(e.last_step_time(), Some(Duration::from_secs(12)));
    }

    #[test]
    fn clock_regression_clamps_dt() {
        let mut e = envelope_only(2.0);
        e.step(&FeatureFrame::at_secs(5.0).with_label("Victory"));
        let r = e.step_report(&FeatureFrame::at_secs(4.0));
        assert_eq!(r.dt, 0.0);
        assert_eq!(e.value_of("victory"), Some(127.0));
        // The regressed time becomes the new reference.
        let r = e.step_report(&FeatureFrame::at_secs(4.5));
        assert!((r.dt - 0.5).abs() < 1e-9);
    }

    #[test]
    fn idle_equals_empty_frame() {
        let mut a = envelope_only(2.0);
        let mut b = envelope_only(2.0);
        a.step(&FeatureFrame::at_secs(0.0).with_label("Victory"));
        b.step(&FeatureFrame::at_secs(0.0).with_label("Victory"));
        assert_eq!(a.idle(Duration::from_millis(500)), b.step(&FeatureFrame::at_secs(0.5)));
        assert_eq!(a.snapshot(), b.snapshot());
    }

    // ── partial failure ──────────────────────────────────────────────────
    #[test]
    fn missing_landmark_skips_only_that_channel() {
        let mut e = MappingEngine::new(&EngineConfig::hand()).unwrap();
        let frame = FeatureFrame::at_secs(0.0)
            .with_landmark(hand::WRIST, Landmark::new(0.5, 0.0))
            .with_landmark(hand::INDEX_FINGER_TIP, Landmark::new(0.5, 0.5));
        let r = e.step_report(&frame);

        assert_eq!(r.skipped.len(), 4);
        assert!(r.skipped.iter().any(|(id, err)| id == "thumb_closedness"
            && *err == FeatureError::MissingRequiredLandmark(hand::THUMB_TIP.into())));
        assert!(r.emissions.contains(&ControlUpdate::new("palm_height", 127)));
        // distance 0.5 → saturates at output 0 → equal to last_emitted, no message
        assert!(!r.emissions.iter().any(|u| u.channel == "index_closedness"));
    }

    #[test]
    fn unknown_labels_are_ignored() {
        let mut e = envelope_only(2.0);
        assert!(e.step(&FeatureFrame::at_secs(0.0).with_label("Jazz_Hands")).is_empty());
    }

    #[test]
    fn emission_order_follows_registration() {
        let mut e = MappingEngine::new(&EngineConfig::gestures()).unwrap();
        let frame = FeatureFrame::at_secs(0.0)
            .with_label("Thumb_Down")
            .with_label("Open_Palm")
            .with_landmark(hand::WRIST, Landmark::new(0.5, 0.2));
        let ids: Vec<_> = e.step(&frame).into_iter().map(|u| u.channel).collect();
        assert_eq!(ids, vec!["Open_Palm", "Thumb_Down", "palm_height"]);
    }

    #[test]
    fn resync_reports_every_channel() {
        let mut e = MappingEngine::new(&EngineConfig::gestures()).unwrap();
        e.step(&FeatureFrame::at_secs(0.0).with_label("Victory"));
        let all = e.resync();
        assert_eq!(all.len(), e.len());
        assert!(all.contains(&ControlUpdate::new("Victory", 127)));
        assert!(all.contains(&ControlUpdate::new("Open_Palm", 0)));
        // resync doesn't disturb the gate
        assert!(e.step(&FeatureFrame::at_secs(0.0).with_label("Victory")).is_empty());
    }

    // ── construction errors ──────────────────────────────────────────────
    #[test]
    fn rejects_duplicate_ids() {
        let mut cfg = EngineConfig::gestures();
        cfg.interpolations[0].channel_id = "Victory".into();
        assert_eq!(
            MappingEngine::new(&cfg).unwrap_err(),
            EngineError::DuplicateChannel("Victory".into())
        );
    }

    #[test]
    fn rejects_degenerate_domain() {
        let mut cfg = EngineConfig::hand();
        cfg.interpolations[1].domain_range = [0.3, 0.3];
        assert!(matches!(
            MappingEngine::new(&cfg),
            Err(EngineError::DegenerateDomain { .. })
        ));
    }

    #[test]
    fn rejects_unknown_feature_kind() {
        let mut cfg = EngineConfig::hand();
        cfg.interpolations[0].feature_kind = "curl".into();
        assert!(matches!(
            MappingEngine::new(&cfg),
            Err(EngineError::UnknownFeatureKind { .. })
        ));
    }

    #[test]
    fn rejects_bad_decay_and_output() {
        let mut cfg = EngineConfig::gestures();
        cfg.envelopes[0].decay_seconds_full_scale = 0.0;
        assert!(matches!(MappingEngine::new(&cfg), Err(EngineError::InvalidDecay { .. })));

        let mut cfg = EngineConfig::gestures();
        cfg.interpolations[0].output_range = [0.0, 200.0];
        assert!(matches!(MappingEngine::new(&cfg), Err(EngineError::OutputOutOfRange { .. })));

        let mut cfg = EngineConfig::gestures();
        cfg.interpolations[0].domain_range = [0.0, f64::INFINITY];
        assert!(matches!(MappingEngine::new(&cfg), Err(EngineError::NonFinite { .. })));
    }

    #[test]
    fn loss_decay_seconds_sets_release_rate() {
        let mut cfg = EngineConfig::gestures();
        cfg.envelopes.clear();
        cfg.interpolations[0].loss_decay_seconds = Some(1.0);
        let mut e = MappingEngine::new(&cfg).unwrap();

        assert_eq!(e.step(&wrist_at(0.0, 0.0)), vec![ControlUpdate::new("palm_height", 127)]);
        // full output span over one second: 127 - 63.5 = 63.5 → 64
        assert_eq!(e.step(&FeatureFrame::at_secs(0.5)), vec![ControlUpdate::new("palm_height", 64)]);
        assert_eq!(e.step(&FeatureFrame::at_secs(1.0)), vec![ControlUpdate::new("palm_height", 0)]);
        assert!(e.step(&FeatureFrame::at_secs(1.5)).is_empty());
        assert_eq!(e.value_of("palm_height"), Some(0.0));
    }

    #[test]
    fn rejects_non_positive_loss_decay() {
        for secs in [0.0, -1.0, f64::NAN] {
            let mut cfg = EngineConfig::gestures();
            cfg.interpolations[0].loss_decay_seconds = Some(secs);
            assert!(matches!(
                MappingEngine::new(&cfg),
                Err(EngineError::InvalidDecay { ref channel, .. }) if channel == "palm_height"
            ));
        }
    }

    #[test]
    fn empty_config_is_allowed() {
        let mut e = MappingEngine::new(&EngineConfig::default()).unwrap();
        assert!(e.is_empty());
        assert!(e.step(&FeatureFrame::at_secs(0.0)).is_empty());
    }
}
