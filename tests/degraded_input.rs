//! Degraded-input behavior with a real subscriber installed, so every
//! warn/debug path runs through an active `tracing` dispatch instead of a
//! no-op one.

use glowmote::{
    BlendType, ChannelPatch, DurationSpec, GestureDef, GestureTick, GestureTuning, MascotEngine,
    MotionContext, TempoSample,
};

fn install_subscriber() {
    // First caller wins; later tests share the dispatch.
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

fn nan_glow(_: GestureTick, _: &GestureTuning, _: &MotionContext) -> ChannelPatch {
    ChannelPatch {
        glow_intensity: Some(f64::NAN),
        position: Some(glowmote::Vec3::new(f64::INFINITY, 0.0, 0.0)),
        ..Default::default()
    }
}

#[test]
fn warn_paths_log_and_degrade_without_state_damage() {
    install_subscriber();
    let mut engine = MascotEngine::default();

    // Invalid tempo warns and keeps the previous value.
    engine.set_tempo(f64::NAN).unwrap();
    assert_eq!(engine.bpm(), 120.0);

    // Unknown undertone warns; the emotion still applies.
    engine.set_emotion("joy", Some("spicy")).unwrap();
    assert_eq!(engine.emotion(), "joy");

    // Invalid rest values warn and are ignored.
    engine.set_scale(-2.0).unwrap();
    engine.set_position(glowmote::Vec3::new(f64::NAN, 0.0, 0.0)).unwrap();

    // Out-of-range tempo samples are logged and discarded.
    engine.connect_audio().unwrap();
    engine
        .push_tempo_sample(TempoSample {
            bpm: 9_000.0,
            confidence: 1.0,
        })
        .unwrap();
    assert_eq!(engine.bpm(), 120.0);

    let frame = engine.tick(16.0).unwrap();
    assert!(frame.glow_intensity.is_finite());
    assert_eq!(frame.scale, 1.0);
}

#[test]
fn non_finite_gesture_output_is_contained_and_logged() {
    install_subscriber();
    let mut engine = MascotEngine::default();
    engine
        .register_gesture(GestureDef {
            name: "broken".to_string(),
            blend: BlendType::Blend,
            duration: DurationSpec::Millis(500.0),
            conflict_group: None,
            eval: nan_glow,
        })
        .unwrap();
    engine.trigger_gesture("broken", None).unwrap();

    // The fault is reported once and every emitted frame stays finite.
    for _ in 0..40 {
        let frame = engine.tick(16.0).unwrap();
        assert!(frame.glow_intensity.is_finite());
        assert!(frame.position.is_finite());
        assert_eq!(frame.glow_intensity, 1.0);
    }
    assert!(!engine.is_gesture_active("broken"));
}
