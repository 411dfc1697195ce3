use std::collections::BTreeMap;

use crate::{
    blend::{BlendInputs, Blender},
    blink::{BlinkConfig, BlinkManager},
    clock::{MAX_TICK_MS, MusicalClock, RhythmPattern},
    core::Vec3,
    emotion::{EmotionBaseline, apply_undertone, builtin_emotions},
    error::{GlowmoteError, GlowmoteResult},
    events::{EngineEvent, EventHandler},
    frame::BlendedFrame,
    gesture::{GestureDef, GestureRegistry, GestureTuning, MotionContext},
    gesture_engine::GestureEngine,
    groove::{GroovePreset, RhythmAdapter},
    tempo::{TempoFollower, TempoSample},
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub seed: u64,
    pub bpm: f64,
    pub pattern: RhythmPattern,
    pub emotion: String,
    pub groove: String,
    pub blink: BlinkConfig,
    pub rest_position: Vec3,
    pub rest_scale: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0x6d6f_7465,
            bpm: 120.0,
            pattern: RhythmPattern::Straight,
            emotion: "neutral".to_string(),
            groove: "drift".to_string(),
            blink: BlinkConfig::default(),
            rest_position: Vec3::ZERO,
            rest_scale: 1.0,
        }
    }
}

/// The state surface: owns the emotion baseline, active gestures, groove
/// settings and rest pose, and drives the fixed per-tick pipeline
/// Clock -> Rhythm Adapter -> Gesture Engine -> Blink -> Blender.
///
/// One engine per mascot instance, no process-wide shared state. Host API
/// calls and `tick` must happen on the same logical thread; no locking is
/// used. Every call after [`destroy`](Self::destroy) returns
/// `Err(GlowmoteError::Destroyed)` rather than panicking.
pub struct MascotEngine {
    clock: MusicalClock,
    follower: TempoFollower,
    adapter: RhythmAdapter,
    gestures: GestureEngine,
    blink: BlinkManager,
    blender: Blender,
    emotions: BTreeMap<String, EmotionBaseline>,
    baseline: EmotionBaseline,
    rest_position: Vec3,
    rest_scale: f64,
    audio_connected: bool,
    handler: Option<EventHandler>,
    last_frame: BlendedFrame,
    destroyed: bool,
}

impl MascotEngine {
    /// Construction never fails; a config entry that does not resolve is
    /// warned about and replaced with its default.
    pub fn new(config: EngineConfig) -> Self {
        let emotions = builtin_emotions();
        let baseline = match emotions.get(&config.emotion) {
            Some(b) => b.clone(),
            None => {
                tracing::warn!(emotion = %config.emotion, "unknown initial emotion, using neutral");
                EmotionBaseline::default()
            }
        };
        let blink_config = match config.blink.validate() {
            Ok(()) => config.blink,
            Err(err) => {
                tracing::warn!(%err, "invalid blink config, using defaults");
                BlinkConfig::default()
            }
        };
        let rest_position = if config.rest_position.is_finite() {
            config.rest_position
        } else {
            Vec3::ZERO
        };
        let rest_scale = if config.rest_scale.is_finite() && config.rest_scale > 0.0 {
            config.rest_scale
        } else {
            1.0
        };

        Self {
            clock: MusicalClock::new(config.bpm, config.pattern),
            follower: TempoFollower::default(),
            adapter: RhythmAdapter::new(&config.groove),
            gestures: GestureEngine::new(GestureRegistry::with_builtins()),
            blink: BlinkManager::new(blink_config, config.seed),
            blender: Blender::new(),
            emotions,
            baseline,
            rest_position,
            rest_scale,
            audio_connected: false,
            handler: None,
            last_frame: BlendedFrame::default(),
            destroyed: false,
        }
    }

    fn ensure_alive(&self) -> GlowmoteResult<()> {
        if self.destroyed {
            Err(GlowmoteError::Destroyed)
        } else {
            Ok(())
        }
    }

    fn emit(&mut self, event: EngineEvent) {
        if let Some(handler) = self.handler.as_mut() {
            handler(&event);
        }
    }

    /// Registers the synchronous event callback, replacing any previous one.
    pub fn set_event_handler(&mut self, handler: impl FnMut(&EngineEvent) + 'static) {
        self.handler = Some(Box::new(handler));
    }

    pub fn emotion(&self) -> &str {
        &self.baseline.emotion
    }

    pub fn bpm(&self) -> f64 {
        self.clock.bpm()
    }

    pub fn clock(&self) -> &MusicalClock {
        &self.clock
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// The frame from the most recent successful tick; the safe fallback
    /// for a skipped tick.
    pub fn last_frame(&self) -> &BlendedFrame {
        &self.last_frame
    }

    pub fn is_gesture_active(&self, name: &str) -> bool {
        self.gestures.is_active(name)
    }

    pub fn set_emotion(&mut self, name: &str, undertone: Option<&str>) -> GlowmoteResult<()> {
        self.ensure_alive()?;
        let base = self
            .emotions
            .get(name)
            .cloned()
            .ok_or_else(|| GlowmoteError::emotion(format!("unknown emotion '{name}'")))?;

        let next = match undertone {
            Some(u) => match apply_undertone(&base, u) {
                Some(modified) => modified,
                None => {
                    tracing::warn!(undertone = u, "unknown undertone ignored");
                    base
                }
            },
            None => base,
        };

        let from = std::mem::replace(&mut self.baseline, next).emotion;
        self.emit(EngineEvent::EmotionChanged {
            from,
            to: name.to_string(),
        });
        Ok(())
    }

    pub fn trigger_gesture(
        &mut self,
        name: &str,
        tuning: Option<GestureTuning>,
    ) -> GlowmoteResult<()> {
        self.ensure_alive()?;
        self.gestures
            .trigger(name, tuning.unwrap_or_default(), &self.clock)?;
        self.emit(EngineEvent::GestureStarted {
            name: name.to_string(),
        });
        Ok(())
    }

    pub fn chain_gestures(&mut self, names: &[&str]) -> GlowmoteResult<()> {
        self.ensure_alive()?;
        let entries: Vec<(String, GestureTuning)> = names
            .iter()
            .map(|n| (n.to_string(), GestureTuning::default()))
            .collect();
        self.gestures.chain(entries, &self.clock)?;
        if let Some(first) = names.first() {
            self.emit(EngineEvent::GestureStarted {
                name: first.to_string(),
            });
        }
        Ok(())
    }

    pub fn clear_gestures(&mut self) -> GlowmoteResult<()> {
        self.ensure_alive()?;
        self.gestures.clear_all();
        Ok(())
    }

    /// Custom gesture definitions join the same validated registry the
    /// built-ins live in.
    pub fn register_gesture(&mut self, def: GestureDef) -> GlowmoteResult<()> {
        self.ensure_alive()?;
        self.gestures.registry_mut().register(def)
    }

    pub fn register_groove(&mut self, preset: GroovePreset) -> GlowmoteResult<()> {
        self.ensure_alive()?;
        self.adapter.register(preset)
    }

    pub fn set_groove_preset(&mut self, name: &str, transition_bars: f64) -> GlowmoteResult<()> {
        self.ensure_alive()?;
        let from = self.adapter.preset_name().to_string();
        self.adapter.set_preset(name, transition_bars, &self.clock)?;
        if from != name {
            self.emit(EngineEvent::GroovePresetChanged {
                from,
                to: name.to_string(),
            });
        }
        Ok(())
    }

    /// Out-of-range values clamp, invalid values drop with a warning.
    /// Only lifecycle misuse errors.
    pub fn set_tempo(&mut self, bpm: f64) -> GlowmoteResult<()> {
        self.ensure_alive()?;
        self.clock.set_tempo(bpm);
        Ok(())
    }

    pub fn start_rhythm(&mut self) -> GlowmoteResult<()> {
        self.ensure_alive()?;
        self.clock.start();
        Ok(())
    }

    /// Freezes the beat position; in-flight musical gestures finish on
    /// their resolved durations.
    pub fn stop_rhythm(&mut self) -> GlowmoteResult<()> {
        self.ensure_alive()?;
        self.clock.stop();
        Ok(())
    }

    /// Switches to audio-driven tempo; groove motion follows the detection
    /// confidence until a tempo locks. Capturing and analyzing audio is the
    /// host collaborator's job; it surfaces `GlowmoteError::Init` when a
    /// context cannot be acquired.
    pub fn connect_audio(&mut self) -> GlowmoteResult<()> {
        self.ensure_alive()?;
        self.audio_connected = true;
        self.follower.reset();
        Ok(())
    }

    /// Back to manual tempo. Detection state drops and the beat position
    /// rewinds.
    pub fn disconnect_audio(&mut self) -> GlowmoteResult<()> {
        self.ensure_alive()?;
        self.audio_connected = false;
        self.follower.reset();
        self.clock.reset();
        Ok(())
    }

    /// Consumes one observation from the external beat detector. A vetted
    /// tempo is committed to the clock and announced.
    pub fn push_tempo_sample(&mut self, sample: TempoSample) -> GlowmoteResult<()> {
        self.ensure_alive()?;
        if !self.audio_connected {
            tracing::debug!("tempo sample ignored while audio is disconnected");
            return Ok(());
        }
        if let Some(bpm) = self.follower.push(sample) {
            self.clock.set_tempo(bpm);
            self.emit(EngineEvent::TempoLocked { bpm });
        }
        Ok(())
    }

    pub fn set_position(&mut self, position: Vec3) -> GlowmoteResult<()> {
        self.ensure_alive()?;
        if position.is_finite() {
            self.rest_position = position;
        } else {
            tracing::warn!("ignoring non-finite rest position");
        }
        Ok(())
    }

    pub fn set_scale(&mut self, scale: f64) -> GlowmoteResult<()> {
        self.ensure_alive()?;
        if scale.is_finite() && scale > 0.0 {
            self.rest_scale = scale;
        } else {
            tracing::warn!(scale, "ignoring invalid rest scale");
        }
        Ok(())
    }

    /// Starts a blink immediately.
    pub fn blink_now(&mut self) -> GlowmoteResult<()> {
        self.ensure_alive()?;
        self.blink.trigger_now();
        Ok(())
    }

    /// Advances the engine one frame and composes the render parameters.
    /// Pipeline order is fixed: clock, rhythm adapter, gesture engine,
    /// blink, blender.
    #[tracing::instrument(skip(self), level = "trace")]
    pub fn tick(&mut self, delta_ms: f64) -> GlowmoteResult<&BlendedFrame> {
        self.ensure_alive()?;
        // One delta cap for the whole pipeline.
        let dt = if delta_ms.is_finite() && delta_ms > 0.0 {
            delta_ms.min(MAX_TICK_MS)
        } else {
            0.0
        };

        let beat_events = self.clock.tick(dt);
        for ev in &beat_events {
            self.emit(EngineEvent::Beat {
                index: ev.beat_index,
                accent: ev.accent,
            });
            if ev.is_bar_start {
                self.emit(EngineEvent::Bar { index: ev.bar_index });
            }
        }

        let confidence = if self.audio_connected {
            self.follower.confidence()
        } else {
            1.0
        };
        let groove = self.adapter.compute(&self.clock, confidence, dt);

        let ctx = MotionContext {
            bpm: self.clock.bpm(),
            beats_per_bar: self.clock.beats_per_bar(),
            beat_phase: self.clock.beat_phase(),
            bar_progress: self.clock.bar_progress(),
            confidence,
        };
        let update = self.gestures.update(dt, &ctx, &self.clock);
        for name in &update.started {
            self.emit(EngineEvent::GestureStarted { name: name.clone() });
        }
        for name in &update.ended {
            self.emit(EngineEvent::GestureEnded { name: name.clone() });
        }

        self.blink.update(dt);

        let frame = self.blender.compose(BlendInputs {
            baseline: &self.baseline,
            rest_position: self.rest_position,
            rest_scale: self.rest_scale,
            patches: &update.patches,
            groove,
            blink_boost: self.blink.glow_boost(),
            eyelid: self.blink.eyelid(),
        });
        self.last_frame = frame;
        Ok(&self.last_frame)
    }

    /// Tears the instance down; every later call returns the tagged
    /// `Destroyed` result.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.gestures.clear_all();
        self.clock.stop();
        self.handler = None;
    }
}

impl Default for MascotEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for MascotEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MascotEngine")
            .field("emotion", &self.baseline.emotion)
            .field("bpm", &self.clock.bpm())
            .field("groove", &self.adapter.preset_name())
            .field("active_gestures", &self.gestures.active_names())
            .field("audio_connected", &self.audio_connected)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, rc::Rc};

    #[test]
    fn default_engine_ticks_neutral() {
        let mut engine = MascotEngine::default();
        let frame = engine.tick(16.0).unwrap().clone();
        assert_eq!(frame.glow_intensity, 1.0);
        assert_eq!(frame.scale, 1.0);
        assert_eq!(engine.emotion(), "neutral");
    }

    #[test]
    fn unknown_names_error_without_state_change() {
        let mut engine = MascotEngine::default();
        assert!(engine.set_emotion("smug", None).is_err());
        assert_eq!(engine.emotion(), "neutral");
        assert!(engine.trigger_gesture("somersault", None).is_err());
        assert!(engine.set_groove_preset("wobble", 1.0).is_err());
    }

    #[test]
    fn unknown_undertone_still_applies_emotion() {
        let mut engine = MascotEngine::default();
        engine.set_emotion("joy", Some("spicy")).unwrap();
        assert_eq!(engine.emotion(), "joy");
        let frame = engine.tick(16.0).unwrap();
        assert!((frame.glow_intensity - 1.6).abs() < 0.2);
    }

    #[test]
    fn events_fire_synchronously_with_previous_values() {
        let mut engine = MascotEngine::default();
        let seen: Rc<RefCell<Vec<EngineEvent>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        engine.set_event_handler(move |ev| sink.borrow_mut().push(ev.clone()));

        engine.set_emotion("joy", None).unwrap();
        engine.trigger_gesture("pulse", None).unwrap();

        let events = seen.borrow();
        assert_eq!(
            events[0],
            EngineEvent::EmotionChanged {
                from: "neutral".to_string(),
                to: "joy".to_string()
            }
        );
        assert_eq!(
            events[1],
            EngineEvent::GestureStarted {
                name: "pulse".to_string()
            }
        );
    }

    #[test]
    fn beat_events_fire_during_tick() {
        let mut engine = MascotEngine::default();
        engine.start_rhythm().unwrap();
        let beats: Rc<RefCell<u64>> = Rc::new(RefCell::new(0));
        let sink = beats.clone();
        engine.set_event_handler(move |ev| {
            if matches!(ev, EngineEvent::Beat { .. }) {
                *sink.borrow_mut() += 1;
            }
        });
        // 2.4 seconds at 120bpm is 4.8 beats: beats 1..4.
        for _ in 0..150 {
            engine.tick(16.0).unwrap();
        }
        assert_eq!(*beats.borrow(), 4);
    }

    #[test]
    fn destroyed_engine_tags_every_call() {
        let mut engine = MascotEngine::default();
        engine.destroy();
        assert!(engine.is_destroyed());
        assert!(matches!(engine.tick(16.0), Err(GlowmoteError::Destroyed)));
        assert!(matches!(
            engine.set_emotion("joy", None),
            Err(GlowmoteError::Destroyed)
        ));
        assert!(matches!(
            engine.trigger_gesture("pulse", None),
            Err(GlowmoteError::Destroyed)
        ));
        assert!(matches!(engine.set_tempo(90.0), Err(GlowmoteError::Destroyed)));
        // Idempotent.
        engine.destroy();
    }

    #[test]
    fn tempo_lock_needs_audio_and_agreement() {
        let mut engine = MascotEngine::default();
        let locked: Rc<RefCell<Option<f64>>> = Rc::new(RefCell::new(None));
        let sink = locked.clone();
        engine.set_event_handler(move |ev| {
            if let EngineEvent::TempoLocked { bpm } = ev {
                *sink.borrow_mut() = Some(*bpm);
            }
        });

        // Samples while disconnected change nothing.
        for _ in 0..6 {
            engine
                .push_tempo_sample(TempoSample {
                    bpm: 140.0,
                    confidence: 0.9,
                })
                .unwrap();
        }
        assert_eq!(engine.bpm(), 120.0);

        engine.connect_audio().unwrap();
        for _ in 0..6 {
            engine
                .push_tempo_sample(TempoSample {
                    bpm: 140.0,
                    confidence: 0.9,
                })
                .unwrap();
        }
        assert_eq!(engine.bpm(), 140.0);
        assert_eq!(*locked.borrow(), Some(140.0));
    }

    #[test]
    fn disconnect_rewinds_the_beat_position() {
        let mut engine = MascotEngine::default();
        engine.start_rhythm().unwrap();
        for _ in 0..20 {
            engine.tick(16.0).unwrap();
        }
        assert!(engine.clock().elapsed_beats() > 0.0);
        engine.disconnect_audio().unwrap();
        assert_eq!(engine.clock().elapsed_beats(), 0.0);
    }

    #[test]
    fn rest_pose_feeds_the_frame() {
        let mut engine = MascotEngine::default();
        engine.set_position(Vec3::new(2.0, 0.0, 0.0)).unwrap();
        engine.set_scale(1.5).unwrap();
        let frame = engine.tick(16.0).unwrap();
        assert_eq!(frame.position.x, 2.0);
        assert_eq!(frame.scale, 1.5);

        engine.set_scale(f64::NAN).unwrap();
        let frame = engine.tick(16.0).unwrap();
        assert_eq!(frame.scale, 1.5);
    }

    #[test]
    fn bad_config_degrades_to_defaults() {
        let config = EngineConfig {
            emotion: "smug".to_string(),
            groove: "wobble".to_string(),
            rest_scale: -3.0,
            ..Default::default()
        };
        let mut engine = MascotEngine::new(config);
        assert_eq!(engine.emotion(), "neutral");
        let frame = engine.tick(16.0).unwrap();
        assert_eq!(frame.scale, 1.0);
    }
}
