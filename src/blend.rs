use std::collections::BTreeSet;

use crate::{
    core::{Rgb, Vec3},
    emotion::EmotionBaseline,
    frame::{BlendedFrame, ChannelPatch, EffectChannel},
    gesture::BlendType,
    gesture_engine::GesturePatch,
    groove::GrooveChannels,
};

/// Ambient groove weight while an override gesture is active. Tunable
/// default, softened rather than disabled.
pub const GROOVE_OVERRIDE_WEIGHT: f64 = 0.3;

#[derive(Clone, Debug)]
pub struct BlendInputs<'a> {
    pub baseline: &'a EmotionBaseline,
    pub rest_position: Vec3,
    pub rest_scale: f64,
    pub patches: &'a [GesturePatch], // trigger order
    pub groove: GrooveChannels,
    pub blink_boost: f64, // added to outgoing glow only
    pub eyelid: f64,
}

/// Per-frame compositor. The accumulator in `compose` is local to one call
/// and re-derived from the baseline every frame.
#[derive(Debug, Default)]
pub struct Blender {
    reported_faults: BTreeSet<String>,
}

impl Blender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compose(&mut self, inputs: BlendInputs<'_>) -> BlendedFrame {
        let mut position = inputs.rest_position;
        let mut rotation = Vec3::ZERO;
        let mut scale = inputs.rest_scale;
        let mut glow = inputs.baseline.glow_intensity;
        let mut color = inputs.baseline.glow_color;
        let mut effects: Vec<EffectChannel> = Vec::new();

        // Last override in trigger order wins the channel.
        let mut ov = ChannelPatch::default();
        for gp in inputs.patches {
            if gp.blend != BlendType::Override {
                continue;
            }
            if let Some(v) = self.vec3_channel(&gp.name, "position", gp.patch.position) {
                ov.position = Some(v);
            }
            if let Some(v) = self.vec3_channel(&gp.name, "rotation", gp.patch.rotation) {
                ov.rotation = Some(v);
            }
            if let Some(v) = self.scalar_channel(&gp.name, "scale", gp.patch.scale) {
                ov.scale = Some(v);
            }
            if let Some(v) = self.scalar_channel(&gp.name, "glow", gp.patch.glow_intensity) {
                ov.glow_intensity = Some(v);
            }
            if let Some(v) = self.color_channel(&gp.name, gp.patch.glow_color) {
                ov.glow_color = Some(v);
            }
        }

        // Blend patches add onto the baseline; scale multiplies (additive
        // scale could reach zero or negative). Channels an override
        // claimed are skipped.
        for gp in inputs.patches {
            if gp.blend != BlendType::Blend {
                continue;
            }
            if ov.position.is_none() {
                if let Some(v) = self.vec3_channel(&gp.name, "position", gp.patch.position) {
                    position += v;
                }
            }
            if ov.rotation.is_none() {
                if let Some(v) = self.vec3_channel(&gp.name, "rotation", gp.patch.rotation) {
                    rotation += v;
                }
            }
            if ov.scale.is_none() {
                if let Some(v) = self.scalar_channel(&gp.name, "scale", gp.patch.scale) {
                    scale *= v;
                }
            }
            if ov.glow_intensity.is_none() {
                if let Some(v) = self.scalar_channel(&gp.name, "glow", gp.patch.glow_intensity) {
                    glow += v;
                }
            }
            if ov.glow_color.is_none() {
                if let Some(v) = self.color_channel(&gp.name, gp.patch.glow_color) {
                    color = color.add(v);
                }
            }
        }

        if let Some(v) = ov.position {
            position = v;
        }
        if let Some(v) = ov.rotation {
            rotation = v;
        }
        if let Some(v) = ov.scale {
            scale = v;
        }
        if let Some(v) = ov.glow_intensity {
            glow = v;
        }
        if let Some(v) = ov.glow_color {
            color = v;
        }

        // Effect channels pass through as tagged variants, never
        // accumulated.
        for gp in inputs.patches {
            if let Some(effect) = gp.patch.effect {
                if effect_is_finite(&effect) {
                    effects.push(effect);
                } else {
                    self.report_fault(&gp.name, "effect");
                }
            }
        }

        let override_active = inputs
            .patches
            .iter()
            .any(|gp| gp.blend == BlendType::Override);
        let weight = if override_active {
            GROOVE_OVERRIDE_WEIGHT
        } else {
            1.0
        };
        position += inputs.groove.offset * weight;
        rotation += inputs.groove.rotation * weight;
        scale *= 1.0 + (inputs.groove.scale - 1.0) * weight;
        glow *= 1.0 + (inputs.groove.glow - 1.0) * weight;

        // Blink boost joins the outgoing value only, never baseline or
        // groove state.
        let blink = if inputs.blink_boost.is_finite() {
            inputs.blink_boost.max(0.0)
        } else {
            0.0
        };
        let outgoing_glow = (glow + blink).max(0.0);

        BlendedFrame {
            position,
            rotation,
            scale: scale.max(0.0),
            glow_color: color.clamped(),
            glow_intensity: outgoing_glow,
            eyelid: inputs.eyelid.clamp(0.0, 1.0),
            effects,
        }
    }

    fn vec3_channel(&mut self, gesture: &str, channel: &str, v: Option<Vec3>) -> Option<Vec3> {
        let v = v?;
        if v.is_finite() {
            Some(v)
        } else {
            self.report_fault(gesture, channel);
            None
        }
    }

    fn scalar_channel(&mut self, gesture: &str, channel: &str, v: Option<f64>) -> Option<f64> {
        let v = v?;
        if v.is_finite() {
            Some(v)
        } else {
            self.report_fault(gesture, channel);
            None
        }
    }

    fn color_channel(&mut self, gesture: &str, v: Option<Rgb>) -> Option<Rgb> {
        let v = v?;
        if v.is_finite() {
            Some(v)
        } else {
            self.report_fault(gesture, "color");
            None
        }
    }

    // Logged once per gesture/channel key.
    fn report_fault(&mut self, gesture: &str, channel: &str) {
        let key = format!("{gesture}/{channel}");
        if self.reported_faults.insert(key) {
            tracing::warn!(gesture, channel, "non-finite channel value dropped");
        }
    }
}

fn effect_is_finite(effect: &EffectChannel) -> bool {
    match *effect {
        EffectChannel::Cutout { travel, .. } => travel.is_finite(),
        EffectChannel::Shatter { strength, .. } => strength.is_finite(),
        EffectChannel::Deformation { amount, frequency } => {
            amount.is_finite() && frequency.is_finite()
        }
    }
}
