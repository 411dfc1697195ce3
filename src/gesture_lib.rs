//! Built-in gesture catalog. Each evaluate function is pure: progress in,
//! partial patch out.

use std::f64::consts::{PI, TAU};

use crate::{
    core::Vec3,
    ease::Ease,
    frame::{ChannelPatch, CutoutPattern, EffectChannel},
    gesture::{BlendType, DurationSpec, GestureDef, GestureTick, GestureTuning, MotionContext},
};

pub fn builtin_defs() -> Vec<GestureDef> {
    vec![
        blend("bounce", DurationSpec::Millis(600.0), bounce),
        blend("pulse", DurationSpec::Beats(1.0), pulse),
        blend("sway", DurationSpec::Millis(900.0), sway),
        blend("shake", DurationSpec::Millis(500.0), shake),
        blend("nod", DurationSpec::Millis(700.0), nod),
        blend("flash", DurationSpec::Millis(300.0), flash),
        blend("breathe", DurationSpec::Beats(4.0), breathe),
        blend("cutout", DurationSpec::Beats(2.0), cutout),
        override_("spin", DurationSpec::Beats(2.0), "transform", spin),
        override_("shatter", DurationSpec::Millis(2_000.0), "transform", shatter),
    ]
}

fn blend(name: &str, duration: DurationSpec, eval: fn(GestureTick, &GestureTuning, &MotionContext) -> ChannelPatch) -> GestureDef {
    GestureDef {
        name: name.to_string(),
        blend: BlendType::Blend,
        duration,
        conflict_group: None,
        eval,
    }
}

fn override_(
    name: &str,
    duration: DurationSpec,
    group: &str,
    eval: fn(GestureTick, &GestureTuning, &MotionContext) -> ChannelPatch,
) -> GestureDef {
    GestureDef {
        name: name.to_string(),
        blend: BlendType::Override,
        duration,
        conflict_group: Some(group.to_string()),
        eval,
    }
}

// Damped double hop.
fn bounce(t: GestureTick, tuning: &GestureTuning, _: &MotionContext) -> ChannelPatch {
    let hop = (PI * t.progress * 2.0 * tuning.frequency).sin().abs() * (1.0 - t.progress);
    ChannelPatch {
        position: Some(Vec3::new(0.0, 0.35 * tuning.amplitude * hop, 0.0)),
        ..Default::default()
    }
}

// One beat of scale-and-glow swell.
fn pulse(t: GestureTick, tuning: &GestureTuning, _: &MotionContext) -> ChannelPatch {
    let swell = (PI * t.progress).sin();
    ChannelPatch {
        scale: Some(1.0 + 0.12 * tuning.amplitude * swell),
        glow_intensity: Some(0.35 * tuning.amplitude * swell),
        ..Default::default()
    }
}

fn sway(t: GestureTick, tuning: &GestureTuning, _: &MotionContext) -> ChannelPatch {
    let drift = (TAU * t.progress * tuning.frequency).sin() * (PI * t.progress).sin();
    ChannelPatch {
        position: Some(Vec3::new(0.25 * tuning.amplitude * drift, 0.0, 0.0)),
        ..Default::default()
    }
}

// High-frequency horizontal jitter, dying out toward the end.
fn shake(t: GestureTick, tuning: &GestureTuning, _: &MotionContext) -> ChannelPatch {
    let jitter = (TAU * t.progress * 4.0 * tuning.frequency).sin() * (1.0 - t.progress);
    ChannelPatch {
        position: Some(Vec3::new(0.12 * tuning.amplitude * jitter, 0.0, 0.0)),
        rotation: Some(Vec3::new(0.0, 0.0, 0.06 * tuning.amplitude * jitter)),
        ..Default::default()
    }
}

fn nod(t: GestureTick, tuning: &GestureTuning, _: &MotionContext) -> ChannelPatch {
    let dip = (PI * t.progress * 2.0 * tuning.frequency).sin() * (PI * t.progress).sin();
    ChannelPatch {
        rotation: Some(Vec3::new(0.3 * tuning.amplitude * dip, 0.0, 0.0)),
        ..Default::default()
    }
}

// Sharp additive glow spike with a quadratic falloff.
fn flash(t: GestureTick, tuning: &GestureTuning, _: &MotionContext) -> ChannelPatch {
    ChannelPatch {
        glow_intensity: Some(0.9 * tuning.amplitude * (1.0 - t.progress).powi(2)),
        ..Default::default()
    }
}

// Slow breathing cycle; frequency stretches the cycle count.
fn breathe(t: GestureTick, tuning: &GestureTuning, _: &MotionContext) -> ChannelPatch {
    let cycle = (TAU * t.progress * tuning.frequency - PI / 2.0).sin() * 0.5 + 0.5;
    let fade = (PI * t.progress).sin();
    ChannelPatch {
        scale: Some(1.0 + 0.06 * tuning.amplitude * cycle * fade),
        glow_intensity: Some(0.12 * tuning.amplitude * cycle * fade),
        ..Default::default()
    }
}

// Traveling cutout mask.
fn cutout(t: GestureTick, tuning: &GestureTuning, _: &MotionContext) -> ChannelPatch {
    ChannelPatch {
        glow_intensity: Some(-0.1 * tuning.amplitude * (PI * t.progress).sin()),
        effect: Some(EffectChannel::Cutout {
            pattern: CutoutPattern::Bars,
            travel: Ease::InOutQuad.apply(t.progress),
        }),
        ..Default::default()
    }
}

// Full turn around the vertical axis, squeezing at the midpoint.
fn spin(t: GestureTick, tuning: &GestureTuning, _: &MotionContext) -> ChannelPatch {
    let turn = Ease::InOutQuad.apply(t.progress) * TAU * tuning.frequency;
    ChannelPatch {
        rotation: Some(Vec3::new(0.0, turn, 0.0)),
        scale: Some(1.0 - 0.1 * tuning.amplitude * (PI * t.progress).sin()),
        ..Default::default()
    }
}

// Squeeze, break apart once as progress crosses 0.1, recover.
fn shatter(t: GestureTick, tuning: &GestureTuning, _: &MotionContext) -> ChannelPatch {
    let scale = if t.progress < 0.1 {
        1.0 - 0.15 * (t.progress / 0.1)
    } else {
        0.85 + 0.15 * Ease::OutCubic.apply((t.progress - 0.1) / 0.9)
    };
    ChannelPatch {
        scale: Some(scale),
        effect: Some(EffectChannel::Shatter {
            enabled: t.crossed(0.1),
            strength: tuning.amplitude,
        }),
        ..Default::default()
    }
}
