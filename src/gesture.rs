use std::collections::BTreeMap;

use crate::{
    error::{GlowmoteError, GlowmoteResult},
    frame::ChannelPatch,
    gesture_lib,
};

/// Whether a gesture's output replaces the accumulated channel value
/// (`Override`) or adds to it (`Blend`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BlendType {
    Override,
    Blend,
}

/// Gesture length, wall-clock or musical. Musical durations resolve
/// against the clock tempo once, at trigger time.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum DurationSpec {
    Millis(f64),
    Beats(f64),
    Bars(f64),
}

impl DurationSpec {
    pub fn resolve_ms(self, bpm: f64, beats_per_bar: f64) -> f64 {
        match self {
            Self::Millis(ms) => ms,
            Self::Beats(beats) => beats * 60_000.0 / bpm,
            Self::Bars(bars) => bars * beats_per_bar * 60_000.0 / bpm,
        }
    }

    fn raw_value(self) -> f64 {
        match self {
            Self::Millis(v) | Self::Beats(v) | Self::Bars(v) => v,
        }
    }
}

fn one() -> f64 {
    1.0
}

/// Host-tunable knobs shared by every gesture evaluate function.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GestureTuning {
    #[serde(default = "one")]
    pub amplitude: f64,
    #[serde(default = "one")]
    pub frequency: f64,
}

impl Default for GestureTuning {
    fn default() -> Self {
        Self {
            amplitude: 1.0,
            frequency: 1.0,
        }
    }
}

/// Rhythm context handed to evaluate functions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionContext {
    pub bpm: f64,
    pub beats_per_bar: f64,
    pub beat_phase: f64,
    pub bar_progress: f64,
    pub confidence: f64,
}

impl Default for MotionContext {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            beats_per_bar: 4.0,
            beat_phase: 0.0,
            bar_progress: 0.0,
            confidence: 1.0,
        }
    }
}

/// Progress pair for one evaluate call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureTick {
    pub progress: f64,
    pub previous: f64, // prior tick's progress
}

impl GestureTick {
    /// True on the single tick where progress first reaches `at`.
    pub fn crossed(self, at: f64) -> bool {
        self.previous < at && self.progress >= at
    }
}

/// Pure per-frame output function: no side effects, no cross-frame state.
pub type GestureEval = fn(GestureTick, &GestureTuning, &MotionContext) -> ChannelPatch;

#[derive(Clone, Debug)]
pub struct GestureDef {
    pub name: String,
    pub blend: BlendType,
    pub duration: DurationSpec,
    pub conflict_group: Option<String>, // an incoming override preempts the group
    pub eval: GestureEval,
}

impl GestureDef {
    pub fn validate(&self) -> GlowmoteResult<()> {
        if self.name.trim().is_empty() {
            return Err(GlowmoteError::validation("gesture name must be non-empty"));
        }
        if !self.duration.raw_value().is_finite() {
            return Err(GlowmoteError::validation(format!(
                "gesture '{}' duration must be finite",
                self.name
            )));
        }
        if let Some(group) = &self.conflict_group {
            if group.trim().is_empty() {
                return Err(GlowmoteError::validation(format!(
                    "gesture '{}' conflict group must be non-empty when present",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Gesture definitions validated at registration, looked up by name.
#[derive(Clone, Debug, Default)]
pub struct GestureRegistry {
    defs: BTreeMap<String, GestureDef>,
}

impl GestureRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::default();
        for def in gesture_lib::builtin_defs() {
            // Built-ins go through the same validation.
            if let Err(err) = registry.register(def) {
                tracing::error!(%err, "builtin gesture failed validation");
            }
        }
        registry
    }

    pub fn register(&mut self, def: GestureDef) -> GlowmoteResult<()> {
        def.validate()?;
        if self.defs.insert(def.name.clone(), def).is_some() {
            tracing::debug!("gesture definition replaced");
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&GestureDef> {
        self.defs.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.defs.keys().map(String::as_str).collect()
    }
}
