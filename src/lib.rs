//! Glowmote is a real-time animation blending and rhythm-synchronization
//! engine for an expressive mascot character.
//!
//! Each frame, the active animation sources (emotion baseline, triggered
//! gestures, tempo-locked groove motion, blink micro-animation) are
//! composited into a single [`BlendedFrame`] of render parameters, with
//! defined precedence per channel and no cross-frame accumulation.
//!
//! # Pipeline overview (one `tick`)
//!
//! 1. **Clock**: [`MusicalClock`] advances beat/bar position and reports
//!    boundary crossings (catch-up, never skip).
//! 2. **Rhythm**: [`RhythmAdapter`] turns clock phase plus a
//!    [`GroovePreset`] into ambient groove channels, softened by tempo
//!    confidence.
//! 3. **Gestures**: [`GestureEngine`] evaluates every active gesture's pure
//!    output function against its time-derived progress and retires
//!    completed ones.
//! 4. **Blink**: [`BlinkManager`] advances the eyelid cycle; its glow boost
//!    is a transient, query-computed term.
//! 5. **Blend**: [`Blender`] folds everything into a [`BlendedFrame`]:
//!    override channels replace, blend channels add, scale composes
//!    multiplicatively, every value recomputed from source state.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **No in-place accumulation**: no numeric channel is ever advanced with
//!   `+=` across frames; repeated blinks converge instead of compounding.
//! - **Deterministic-by-default**: the only randomness (blink intervals) is
//!   seeded through the engine config.
//! - **Never crash the host**: invalid input degrades with a warning, a
//!   broken gesture is contained per channel, and calls after teardown
//!   return a tagged `Destroyed` result.
//!
//! [`MascotEngine`] is the host-facing state surface driving the pipeline,
//! one instance per mascot, no global state. The renderer is an external
//! collaborator that consumes each [`BlendedFrame`] as plain data.
#![forbid(unsafe_code)]

pub mod blend;
pub mod blink;
pub mod clock;
pub mod core;
pub mod ease;
pub mod emotion;
pub mod error;
pub mod events;
pub mod frame;
pub mod gesture;
pub mod gesture_engine;
pub mod gesture_lib;
pub mod groove;
pub mod mascot;
pub mod scenario;
pub mod tempo;

pub use blend::{BlendInputs, Blender, GROOVE_OVERRIDE_WEIGHT};
pub use blink::{BlinkConfig, BlinkManager, BlinkPhase};
pub use clock::{BeatEvent, MAX_BPM, MAX_TICK_MS, MIN_BPM, MusicalClock, RhythmPattern};
pub use crate::core::{Rgb, Rng64, TimeSignature, Vec3};
pub use ease::{Ease, GrooveShaping};
pub use emotion::{EmotionBaseline, apply_undertone, builtin_emotions, undertone_modifier};
pub use error::{GlowmoteError, GlowmoteResult};
pub use events::{EngineEvent, EventHandler};
pub use frame::{BlendedFrame, ChannelPatch, CutoutPattern, EffectChannel};
pub use gesture::{
    BlendType, DurationSpec, GestureDef, GestureEval, GestureRegistry, GestureTick, GestureTuning,
    MotionContext,
};
pub use gesture_engine::{GestureEngine, GesturePatch, GestureUpdate};
pub use groove::{GrooveChannels, GroovePreset, RhythmAdapter, builtin_grooves};
pub use mascot::{EngineConfig, MascotEngine};
pub use scenario::{Command, RunSummary, Scenario, TimedCommand, run_scenario};
pub use tempo::{TempoFollower, TempoFollowerConfig, TempoSample};
