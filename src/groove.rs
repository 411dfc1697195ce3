use std::collections::BTreeMap;
use std::f64::consts::TAU;

use crate::{
    clock::MusicalClock,
    core::{Vec3, lerp, smoothing_factor},
    ease::{Ease, GrooveShaping},
    error::{GlowmoteError, GlowmoteResult},
};

/// Confidence floor; uncertain tempo softens ambient motion, never
/// freezes it.
pub const MIN_CONFIDENCE: f64 = 0.15;

/// Accent boost window past a strong downbeat, in beats.
pub const ACCENT_WINDOW_BEATS: f64 = 0.25;

/// Preset swaps are eased over at least this many bars.
pub const MIN_TRANSITION_BARS: f64 = 1.0;

/// A named bundle of ambient-motion amplitudes. Immutable once registered,
/// looked up by name.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GroovePreset {
    pub name: String,
    pub bounce: f64,   // vertical bob, scene units
    pub sway: f64,     // horizontal sway, scene units
    pub pulse: f64,    // scale breathing around 1.0
    pub rotation: f64, // tilt/nod, radians
    pub glow: f64,     // glow breathing around 1.0
    pub shaping: GrooveShaping,
    pub accent_boost: f64, // extra amplitude just after strong downbeats
}

impl GroovePreset {
    pub fn validate(&self) -> GlowmoteResult<()> {
        if self.name.trim().is_empty() {
            return Err(GlowmoteError::validation("groove preset name must be non-empty"));
        }
        for (label, v) in [
            ("bounce", self.bounce),
            ("sway", self.sway),
            ("pulse", self.pulse),
            ("rotation", self.rotation),
            ("glow", self.glow),
            ("accent_boost", self.accent_boost),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(GlowmoteError::validation(format!(
                    "groove preset '{}': {label} must be finite and >= 0",
                    self.name
                )));
            }
        }
        Ok(())
    }

    // Amplitude-space mix; shaping snaps at the midpoint.
    fn mix(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            name: b.name.clone(),
            bounce: lerp(a.bounce, b.bounce, t),
            sway: lerp(a.sway, b.sway, t),
            pulse: lerp(a.pulse, b.pulse, t),
            rotation: lerp(a.rotation, b.rotation, t),
            glow: lerp(a.glow, b.glow, t),
            shaping: if t < 0.5 { a.shaping } else { b.shaping },
            accent_boost: lerp(a.accent_boost, b.accent_boost, t),
        }
    }
}

fn preset(
    name: &str,
    bounce: f64,
    sway: f64,
    pulse: f64,
    rotation: f64,
    glow: f64,
    shaping: GrooveShaping,
    accent_boost: f64,
) -> GroovePreset {
    GroovePreset {
        name: name.to_string(),
        bounce,
        sway,
        pulse,
        rotation,
        glow,
        shaping,
        accent_boost,
    }
}

pub fn builtin_grooves() -> BTreeMap<String, GroovePreset> {
    let entries = [
        preset("still", 0.0, 0.0, 0.0, 0.0, 0.0, GrooveShaping::Sine, 0.0),
        preset("drift", 0.015, 0.02, 0.01, 0.01, 0.04, GrooveShaping::Sine, 0.0),
        preset("sway", 0.02, 0.06, 0.015, 0.03, 0.05, GrooveShaping::Sine, 0.2),
        preset("pulse", 0.02, 0.01, 0.05, 0.01, 0.12, GrooveShaping::Bounce, 0.4),
        preset("bounce", 0.08, 0.02, 0.04, 0.02, 0.08, GrooveShaping::Bounce, 0.5),
        preset("stomp", 0.06, 0.03, 0.06, 0.05, 0.15, GrooveShaping::Elastic, 0.9),
    ];
    entries
        .into_iter()
        .map(|p| (p.name.clone(), p))
        .collect()
}

/// Ambient modulation recomputed fully from clock phase every frame.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct GrooveChannels {
    pub offset: Vec3,
    pub rotation: Vec3,
    pub scale: f64, // multiplier around 1.0
    pub glow: f64,  // multiplier around 1.0
}

impl GrooveChannels {
    pub const IDENTITY: Self = Self {
        offset: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: 1.0,
        glow: 1.0,
    };
}

impl Default for GrooveChannels {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Clone, Debug)]
struct PresetTransition {
    target: GroovePreset,
    progress: f64,
    duration_beats: f64,
}

/// Converts clock phase + groove preset into groove channels. Cross-frame
/// state is only the smoothing filter and the preset transition.
#[derive(Clone, Debug)]
pub struct RhythmAdapter {
    presets: BTreeMap<String, GroovePreset>,
    current: GroovePreset,
    transition: Option<PresetTransition>,
    smoothed: GrooveChannels,
    smoothing_rate: f64,
}

impl RhythmAdapter {
    pub fn new(initial: &str) -> Self {
        let presets = builtin_grooves();
        let current = presets
            .get(initial)
            .cloned()
            .unwrap_or_else(|| {
                tracing::warn!(preset = initial, "unknown initial groove, using 'drift'");
                presets["drift"].clone()
            });
        Self {
            presets,
            current,
            transition: None,
            smoothed: GrooveChannels::IDENTITY,
            smoothing_rate: 10.0,
        }
    }

    // The preset being settled on: the transition target while one runs.
    pub fn preset_name(&self) -> &str {
        match &self.transition {
            Some(t) => &t.target.name,
            None => &self.current.name,
        }
    }

    pub fn preset_names(&self) -> Vec<&str> {
        self.presets.keys().map(String::as_str).collect()
    }

    pub fn register(&mut self, preset: GroovePreset) -> GlowmoteResult<()> {
        preset.validate()?;
        self.presets.insert(preset.name.clone(), preset);
        Ok(())
    }

    /// Starts an eased swap toward a named preset, animated over whole
    /// bars; never instantaneous.
    pub fn set_preset(
        &mut self,
        name: &str,
        transition_bars: f64,
        clock: &MusicalClock,
    ) -> GlowmoteResult<()> {
        let target = self
            .presets
            .get(name)
            .cloned()
            .ok_or_else(|| GlowmoteError::validation(format!("unknown groove preset '{name}'")))?;
        if self.preset_name() == name {
            return Ok(());
        }
        let bars = if transition_bars.is_finite() && transition_bars > 0.0 {
            transition_bars.max(MIN_TRANSITION_BARS)
        } else {
            MIN_TRANSITION_BARS
        };
        // A mid-flight transition restarts from the currently mixed state.
        if let Some(t) = self.transition.take() {
            self.current = GroovePreset::mix(&self.current, &t.target, t.progress.clamp(0.0, 1.0));
        }
        self.transition = Some(PresetTransition {
            target,
            progress: 0.0,
            duration_beats: bars * clock.beats_per_bar(),
        });
        Ok(())
    }

    /// Recomputes groove channels for this tick. Oscillator targets are a
    /// pure function of clock phase.
    pub fn compute(&mut self, clock: &MusicalClock, confidence: f64, dt_ms: f64) -> GrooveChannels {
        let dt_ms = if dt_ms.is_finite() && dt_ms > 0.0 { dt_ms } else { 0.0 };

        // Own beat integration; a swap completes even while stopped.
        if let Some(t) = &mut self.transition {
            t.progress += dt_ms * clock.bpm() / 60_000.0 / t.duration_beats;
        }
        if self.transition.as_ref().is_some_and(|t| t.progress >= 1.0) {
            if let Some(t) = self.transition.take() {
                self.current = t.target;
            }
        }

        let preset = match &self.transition {
            Some(t) => GroovePreset::mix(
                &self.current,
                &t.target,
                Ease::InOutQuad.apply(t.progress),
            ),
            None => self.current.clone(),
        };

        let target = if clock.is_playing() {
            Self::oscillate(&preset, clock, confidence)
        } else {
            GrooveChannels::IDENTITY
        };

        let k = smoothing_factor(self.smoothing_rate, dt_ms / 1_000.0);
        self.smoothed.offset += (target.offset - self.smoothed.offset) * k;
        self.smoothed.rotation += (target.rotation - self.smoothed.rotation) * k;
        self.smoothed.scale += (target.scale - self.smoothed.scale) * k;
        self.smoothed.glow += (target.glow - self.smoothed.glow) * k;
        self.smoothed
    }

    fn oscillate(preset: &GroovePreset, clock: &MusicalClock, confidence: f64) -> GrooveChannels {
        let conf = if confidence.is_finite() {
            confidence.clamp(MIN_CONFIDENCE, 1.0)
        } else {
            MIN_CONFIDENCE
        };
        // Whole beats plus the swung fraction.
        let beats = clock.elapsed_beats().floor() + clock.swung_phase();
        let osc = |freq: f64, phase: f64| preset.shaping.shape((TAU * (beats * freq + phase)).sin());

        // Per-axis phase offsets are deliberately distinct, never in unison.
        let bounce = osc(1.0, 0.0);
        let sway = osc(0.5, 0.33);
        let drift = osc(0.25, 0.61);
        let nod = osc(1.0, 0.42);
        let tilt = osc(0.5, 0.17);
        let pulse = osc(1.0, 0.77);
        let glow = osc(0.5, 0.9);

        let amp = conf * (1.0 + preset.accent_boost * clock.accent_envelope(ACCENT_WINDOW_BEATS));

        GrooveChannels {
            offset: Vec3::new(
                sway * preset.sway * amp,
                bounce * preset.bounce * amp,
                drift * preset.sway * 0.3 * amp,
            ),
            rotation: Vec3::new(nod * preset.rotation * 0.4 * amp, 0.0, tilt * preset.rotation * amp),
            scale: 1.0 + pulse * preset.pulse * amp,
            glow: 1.0 + glow * preset.glow * amp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::RhythmPattern;

    fn running_clock() -> MusicalClock {
        let mut clock = MusicalClock::new(120.0, RhythmPattern::Straight);
        clock.start();
        clock
    }

    #[test]
    fn builtin_presets_validate() {
        for preset in builtin_grooves().values() {
            preset.validate().unwrap();
        }
    }

    #[test]
    fn unknown_preset_is_an_error() {
        let mut adapter = RhythmAdapter::new("sway");
        let clock = running_clock();
        assert!(adapter.set_preset("wobble", 1.0, &clock).is_err());
        assert_eq!(adapter.preset_name(), "sway");
    }

    #[test]
    fn channels_are_identity_while_stopped() {
        let mut adapter = RhythmAdapter::new("bounce");
        let mut clock = MusicalClock::new(120.0, RhythmPattern::Straight);
        clock.stop();
        // Long settle: smoothing converges onto identity.
        let mut channels = GrooveChannels::IDENTITY;
        for _ in 0..300 {
            channels = adapter.compute(&clock, 1.0, 16.0);
        }
        assert!(channels.offset.length() < 1e-6);
        assert!((channels.scale - 1.0).abs() < 1e-6);
        assert!((channels.glow - 1.0).abs() < 1e-6);
    }

    #[test]
    fn motion_softens_under_low_confidence() {
        let mut strong = RhythmAdapter::new("bounce");
        let mut weak = RhythmAdapter::new("bounce");
        let mut clock = running_clock();

        let mut strong_peak = 0.0f64;
        let mut weak_peak = 0.0f64;
        for _ in 0..400 {
            clock.tick(16.0);
            strong_peak = strong_peak.max(strong.compute(&clock, 1.0, 16.0).offset.y.abs());
            weak_peak = weak_peak.max(weak.compute(&clock, 0.0, 16.0).offset.y.abs());
        }
        assert!(weak_peak > 0.0, "low confidence softens, never disables");
        assert!(weak_peak < strong_peak * 0.5);
    }

    #[test]
    fn preset_swap_is_never_instantaneous() {
        let mut adapter = RhythmAdapter::new("still");
        let mut clock = running_clock();
        // Settle on stillness first.
        for _ in 0..50 {
            clock.tick(16.0);
            adapter.compute(&clock, 1.0, 16.0);
        }
        adapter.set_preset("bounce", 1.0, &clock).unwrap();
        clock.tick(16.0);
        let first = adapter.compute(&clock, 1.0, 16.0);
        // One frame into a one-bar transition: still essentially still.
        assert!(first.offset.y.abs() < 0.005);
        assert_eq!(adapter.preset_name(), "bounce");

        // After two bars the swap has completed.
        for _ in 0..300 {
            clock.tick(16.0);
            adapter.compute(&clock, 1.0, 16.0);
        }
        assert!(adapter.transition.is_none());
        assert_eq!(adapter.current.name, "bounce");
    }

    #[test]
    fn transition_completes_even_while_stopped() {
        let mut adapter = RhythmAdapter::new("still");
        let mut clock = MusicalClock::new(120.0, RhythmPattern::Straight);
        clock.stop();
        adapter.set_preset("sway", 1.0, &clock).unwrap();
        for _ in 0..300 {
            adapter.compute(&clock, 1.0, 16.0);
        }
        assert!(adapter.transition.is_none());
        assert_eq!(adapter.current.name, "sway");
    }

    #[test]
    fn accent_boost_raises_amplitude_near_downbeat() {
        let stomp = builtin_grooves()["stomp"].clone();
        let mut flat = stomp.clone();
        flat.accent_boost = 0.0;

        // Just inside the accent window after the bar's downbeat.
        let mut clock = running_clock();
        clock.tick(50.0);
        assert!(clock.accent_envelope(ACCENT_WINDOW_BEATS) > 0.0);

        let boosted = RhythmAdapter::oscillate(&stomp, &clock, 1.0);
        let plain = RhythmAdapter::oscillate(&flat, &clock, 1.0);
        assert!(boosted.offset.length() > plain.offset.length());

        // Outside the window both presets produce the same motion.
        while clock.elapsed_beats() < 1.4 {
            clock.tick(16.0);
        }
        assert_eq!(clock.accent_envelope(ACCENT_WINDOW_BEATS), 0.0);
        let late_boosted = RhythmAdapter::oscillate(&stomp, &clock, 1.0);
        let late_plain = RhythmAdapter::oscillate(&flat, &clock, 1.0);
        assert_eq!(late_boosted.offset, late_plain.offset);
    }
}
