//! Property tests for the mapping engine.

use proptest::prelude::*;

use cc_engine::config::hand;
use cc_engine::{
    quantize, EngineConfig, EnvelopeChannel, EnvelopeSpec, FeatureFrame, InterpolationSpec,
    Landmark, MappingEngine, RangeMap,
};

fn mixed_engine(output_range: [f64; 2]) -> MappingEngine {
    MappingEngine::new(&EngineConfig {
        envelopes: vec![EnvelopeSpec {
            channel_id:   "fist".into(),
            target_label: "Closed_Fist".into(),
            decay_seconds_full_scale: 1.5,
        }],
        interpolations: vec![InterpolationSpec {
            channel_id:   "height".into(),
            feature_kind: "point_y".into(),
            point_refs:   vec![hand::WRIST.into()],
            domain_range: [0.1, 0.9],
            output_range,
            loss_decay_seconds: None,
        }],
    })
    .unwrap()
}

/// (label present, seconds since previous frame, wrist y if tracked)
fn frame_input() -> impl Strategy<Value = (bool, f64, Option<f64>)> {
    (any::<bool>(), 0.0..0.5f64, prop::option::of(-0.5..1.5f64))
}

fn build_frames(inputs: &[(bool, f64, Option<f64>)]) -> Vec<FeatureFrame> {
    let mut t = 0.0;
    inputs.iter()
        .map(|(label, dt, y)| {
            t += dt;
            let mut f = FeatureFrame::at_secs(t);
            if *label {
                f = f.with_label("Closed_Fist");
            }
            if let Some(y) = y {
                f = f.with_landmark(hand::WRIST, Landmark::new(0.5, *y));
            }
            f
        })
        .collect()
}

proptest! {
    #[test]
    fn values_stay_in_range(
        inputs in prop::collection::vec(frame_input(), 1..60),
        lo in 0.0..60.0f64,
        hi in 70.0..127.0f64,
        inverted in any::<bool>(),
    ) {
        let range = if inverted { [hi, lo] } else { [lo, hi] };
        let mut engine = mixed_engine(range);
        for frame in build_frames(&inputs) {
            engine.step(&frame);
            let snap = engine.snapshot();
            prop_assert!((0.0..=127.0).contains(&snap[0].value));
            prop_assert!(snap[1].value >= lo && snap[1].value <= hi);
        }
    }

    #[test]
    fn emissions_match_rounded_changes(inputs in prop::collection::vec(frame_input(), 1..80)) {
        let mut engine = mixed_engine([127.0, 0.0]);
        let mut prev = [0u8; 2];
        for frame in build_frames(&inputs) {
            let out = engine.step(&frame);
            let snap = engine.snapshot();
            for (i, ch) in snap.iter().enumerate() {
                let q = quantize(ch.value);
                let emitted: Vec<_> = out.iter().filter(|u| u.channel == ch.channel_id).collect();
                if q != prev[i] {
                    prop_assert_eq!(emitted.len(), 1);
                    prop_assert_eq!(emitted[0].value, q);
                } else {
                    prop_assert!(emitted.is_empty());
                }
                prev[i] = q;
            }
        }
    }

    #[test]
    fn decay_reaches_zero(
        full_scale in 0.1..5.0f64,
        steps in prop::collection::vec(0.001..0.3f64, 1..200),
    ) {
        let mut env = EnvelopeChannel::new("Victory", full_scale);
        env.update(true, 0.0);
        let mut elapsed = 0.0;
        for dt in steps {
            env.update(false, dt);
            elapsed += dt;
            if elapsed >= full_scale {
                prop_assert!(env.value() < 1e-9);
            }
        }
    }

    #[test]
    fn attack_is_instant_from_any_state(
        decay in prop::collection::vec(0.0..1.0f64, 0..10),
        dt in -5.0..5.0f64,
    ) {
        let mut env = EnvelopeChannel::new("Victory", 2.0);
        env.update(true, 0.0);
        for d in decay { env.update(false, d); }
        prop_assert_eq!(env.update(true, dt), 127.0);
    }

    #[test]
    fn interpolation_saturates_and_is_monotonic(
        a in -2.0..2.0f64,
        b in -2.0..2.0f64,
        o0 in 0.0..127.0f64,
        o1 in 0.0..127.0f64,
    ) {
        let m = RangeMap::new((0.0, 1.0), (o0, o1));
        prop_assert_eq!(m.map(a.min(0.0) - 1.0), o0);
        prop_assert_eq!(m.map(b.max(1.0) + 1.0), o1);

        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        if o1 >= o0 {
            prop_assert!(m.map(lo) <= m.map(hi));
        } else {
            prop_assert!(m.map(lo) >= m.map(hi));
        }
    }

    #[test]
    fn tracking_loss_holds_value(
        y in 0.0..1.0f64,
        gap in 1usize..20,
    ) {
        let mut engine = mixed_engine([127.0, 0.0]);
        let tracked = |t: f64| FeatureFrame::at_secs(t).with_landmark(hand::WRIST, Landmark::new(0.5, y));
        engine.step(&tracked(0.0));
        let before = engine.value_of("height");
        for i in 0..gap {
            engine.step(&FeatureFrame::at_secs(0.1 * (i + 1) as f64));
            prop_assert_eq!(engine.value_of("height"), before);
        }
        engine.step(&tracked(0.1 * (gap + 1) as f64));
        prop_assert_eq!(engine.value_of("height"), before);
    }
}
