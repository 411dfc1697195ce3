use std::collections::BTreeMap;

use crate::core::Rgb;

/// Baseline render parameters contributed by the current emotion.
/// Replaced atomically by `set_emotion`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EmotionBaseline {
    pub emotion: String,
    pub undertone: Option<String>,
    pub glow_intensity: f64,
    pub glow_color: Rgb,
    pub particle_behavior: String,
}

impl Default for EmotionBaseline {
    fn default() -> Self {
        baseline("neutral", 1.0, Rgb::new(0.92, 0.94, 1.0), "ambient")
    }
}

fn baseline(emotion: &str, glow: f64, color: Rgb, particles: &str) -> EmotionBaseline {
    EmotionBaseline {
        emotion: emotion.to_string(),
        undertone: None,
        glow_intensity: glow,
        glow_color: color,
        particle_behavior: particles.to_string(),
    }
}

/// The built-in emotion catalog.
pub fn builtin_emotions() -> BTreeMap<String, EmotionBaseline> {
    let entries = [
        baseline("neutral", 1.0, Rgb::new(0.92, 0.94, 1.0), "ambient"),
        baseline("joy", 1.6, Rgb::new(1.0, 0.85, 0.35), "sparkle"),
        baseline("sadness", 0.7, Rgb::new(0.35, 0.5, 0.85), "rain"),
        baseline("anger", 1.4, Rgb::new(1.0, 0.3, 0.2), "embers"),
        baseline("fear", 0.9, Rgb::new(0.6, 0.4, 0.85), "scatter"),
        baseline("surprise", 1.5, Rgb::new(0.4, 0.95, 1.0), "burst"),
        baseline("love", 1.3, Rgb::new(1.0, 0.5, 0.7), "hearts"),
        baseline("excited", 1.7, Rgb::new(1.0, 0.65, 0.25), "sparkle"),
        baseline("calm", 0.85, Rgb::new(0.5, 0.85, 0.8), "drift"),
        baseline("focused", 1.1, Rgb::new(0.85, 0.9, 1.0), "orbit"),
        baseline("euphoria", 1.8, Rgb::new(0.95, 0.45, 1.0), "aura"),
        baseline("glitch", 1.2, Rgb::new(0.45, 1.0, 0.5), "static"),
    ];
    entries
        .into_iter()
        .map(|b| (b.emotion.clone(), b))
        .collect()
}

/// How an undertone bends the emotion it rides on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UndertoneModifier {
    pub glow_mul: f64,
    pub color_toward: Option<Rgb>,
    pub color_mix: f64,
}

pub fn undertone_modifier(name: &str) -> Option<UndertoneModifier> {
    let m = match name {
        "intense" => UndertoneModifier {
            glow_mul: 1.25,
            color_toward: None,
            color_mix: 0.0,
        },
        "subdued" => UndertoneModifier {
            glow_mul: 0.75,
            color_toward: None,
            color_mix: 0.0,
        },
        "tender" => UndertoneModifier {
            glow_mul: 0.9,
            color_toward: Some(Rgb::new(1.0, 0.9, 0.8)),
            color_mix: 0.3,
        },
        "nervous" => UndertoneModifier {
            glow_mul: 1.05,
            color_toward: Some(Rgb::new(0.8, 1.0, 0.85)),
            color_mix: 0.15,
        },
        _ => return None,
    };
    Some(m)
}

/// Applies a named undertone to a baseline; `None` when the undertone is
/// unknown.
pub fn apply_undertone(base: &EmotionBaseline, undertone: &str) -> Option<EmotionBaseline> {
    let m = undertone_modifier(undertone)?;
    let mut out = base.clone();
    out.undertone = Some(undertone.to_string());
    out.glow_intensity = base.glow_intensity * m.glow_mul;
    if let Some(target) = m.color_toward {
        out.glow_color = Rgb::lerp(base.glow_color, target, m.color_mix).clamped();
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_carries_expected_baselines() {
        let emotions = builtin_emotions();
        assert_eq!(emotions["joy"].glow_intensity, 1.6);
        assert_eq!(emotions["neutral"].glow_intensity, 1.0);
        assert!(emotions.contains_key("euphoria"));
    }

    #[test]
    fn undertone_scales_glow() {
        let joy = builtin_emotions()["joy"].clone();
        let intense = apply_undertone(&joy, "intense").unwrap();
        assert!((intense.glow_intensity - 2.0).abs() < 1e-9);
        assert_eq!(intense.undertone.as_deref(), Some("intense"));
        // Base is untouched.
        assert_eq!(joy.glow_intensity, 1.6);
    }

    #[test]
    fn unknown_undertone_is_none() {
        let joy = builtin_emotions()["joy"].clone();
        assert!(apply_undertone(&joy, "spicy").is_none());
    }

    #[test]
    fn tender_shifts_color_toward_warm() {
        let sadness = builtin_emotions()["sadness"].clone();
        let tender = apply_undertone(&sadness, "tender").unwrap();
        assert!(tender.glow_color.r > sadness.glow_color.r);
    }
}
