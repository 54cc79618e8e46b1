//! Attack/decay envelopes for discrete labels.
//!
//! An envelope jumps to full scale the instant its label is seen and falls
//! linearly while the label is absent:
//!
//! ```text
//!  127 ┤█╲         █╲
//!      │  ╲        █ ╲
//!      │   ╲       █  ╲
//!    0 ┤    ╲______█   ╲____
//!        ^label      ^label
//! ```

use crate::CC_MAX;

/// Envelope state for one discrete label.
#[derive(Clone, Debug, PartialEq)]
pub struct EnvelopeChannel {
    target_label: String,
    /// Units per second.
    decay_rate:   f64,
    value:        f64,
}

impl EnvelopeChannel {
    /// `full_scale_secs` is the time to fall from 127 to 0.  A zero,
    /// negative or NaN time releases instantly on the first frame without
    /// the label.
    ///
    /// [`MappingEngine::new`](crate::MappingEngine::new) rejects such times
    /// in a channel table.
    pub fn new(target_label: impl Into<String>, full_scale_secs: f64) -> Self {
        let decay_rate = if full_scale_secs > 0.0 { CC_MAX / full_scale_secs } else { f64::INFINITY };
        EnvelopeChannel {
            target_label: target_label.into(),
            decay_rate,
            value:        0.0,
        }
    }

    pub fn target_label(&self) -> &str { &self.target_label }
    pub fn decay_rate(&self)   -> f64  { self.decay_rate }
    pub fn value(&self)        -> f64  { self.value }

    /// Advance by `dt` seconds.  Negative or NaN `dt` counts as zero.
    pub fn update(&mut self, is_active: bool, dt: f64) -> f64 {
        if is_active {
            self.value = CC_MAX;
        } else if dt > 0.0 {
            // infinite rate: inf * dt saturates, then clamps to 0
            self.value = (self.value - self.decay_rate * dt).clamp(0.0, CC_MAX);
        }
        self.value
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_rate_from_full_scale_time() {
        assert_eq!(EnvelopeChannel::new("Victory", 2.0).decay_rate(), 63.5);
    }

    #[test]
    fn attack_is_instant() {
        let mut env = EnvelopeChannel::new("Victory", 2.0);
        assert_eq!(env.update(true, 0.0), 127.0);
        env.update(false, 0.5);
        // Re-trigger mid-decay goes straight back to peak, whatever dt is.
        assert_eq!(env.update(true, 10.0), 127.0);
    }

    #[test]
    fn decays_linearly_and_floors_at_zero() {
        let mut env = EnvelopeChannel::new("Victory", 2.0);
        env.update(true, 0.0);
        assert_eq!(env.update(false, 1.0), 63.5);
        assert_eq!(env.update(false, 1.0), 0.0);
        assert_eq!(env.update(false, 1.0), 0.0);
    }

    #[test]
    fn clock_regression_is_ignored() {
        let mut env = EnvelopeChannel::new("Victory", 2.0);
        env.update(true, 0.0);
        assert_eq!(env.update(false, -3.0), 127.0);
        assert_eq!(env.update(false, f64::NAN), 127.0);
    }

    #[test]
    fn zero_full_scale_time_releases_instantly() {
        for secs in [0.0, -1.0, f64::NAN] {
            let mut env = EnvelopeChannel::new("Victory", secs);
            assert_eq!(env.update(true, 0.0), 127.0);
            // no time has passed: still at peak, never NaN
            assert_eq!(env.update(false, 0.0), 127.0);
            assert_eq!(env.update(false, 0.01), 0.0);
        }
    }

    #[test]
    fn inactive_from_rest_stays_at_zero() {
        let mut env = EnvelopeChannel::new("Thumb_Up", 0.5);
        assert_eq!(env.update(false, 0.1), 0.0);
    }

    #[test]
    fn many_small_steps_reach_zero() {
        let mut env = EnvelopeChannel::new("Open_Palm", 2.0);
        env.update(true, 0.0);
        for _ in 0..20 { env.update(false, 0.1); }
        assert!(env.value() < 1e-9);
        // One more step lands exactly on the floor.
        env.update(false, 0.1);
        assert_eq!(env.value(), 0.0);
    }
}
