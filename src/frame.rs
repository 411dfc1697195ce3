use crate::core::{Rgb, Vec3};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CutoutPattern {
    Bars,
    Rings,
    Scatter,
}

/// Special-effect channels, a closed set of tagged variants passed through
/// the blender unchanged.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "params")]
pub enum EffectChannel {
    Cutout { pattern: CutoutPattern, travel: f64 },
    Shatter { enabled: bool, strength: f64 },
    Deformation { amount: f64, frequency: f64 },
}

/// Partial parameter patch produced by one gesture for one frame. A
/// `Blend` patch holds deltas (scale a multiplier), an `Override` patch
/// holds absolute values.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ChannelPatch {
    pub position: Option<Vec3>,
    pub rotation: Option<Vec3>,
    pub scale: Option<f64>,
    pub glow_intensity: Option<f64>,
    pub glow_color: Option<Rgb>,
    pub effect: Option<EffectChannel>,
}

impl ChannelPatch {
    pub fn is_empty(&self) -> bool {
        self.position.is_none()
            && self.rotation.is_none()
            && self.scale.is_none()
            && self.glow_intensity.is_none()
            && self.glow_color.is_none()
            && self.effect.is_none()
    }
}

/// The fully-resolved parameter set handed to the renderer each tick.
/// Every field is the complete, final value for this frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct BlendedFrame {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: f64,
    pub glow_color: Rgb,
    pub glow_intensity: f64,
    pub eyelid: f64, // 0 open .. 1 closed
    pub effects: Vec<EffectChannel>,
}

impl Default for BlendedFrame {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: 1.0,
            glow_color: Rgb::WHITE,
            glow_intensity: 1.0,
            eyelid: 0.0,
            effects: Vec::new(),
        }
    }
}

impl BlendedFrame {
    pub fn shatter_enabled(&self) -> bool {
        self.effects
            .iter()
            .any(|e| matches!(e, EffectChannel::Shatter { enabled: true, .. }))
    }
}
