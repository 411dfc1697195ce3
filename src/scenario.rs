//! Headless scenario replay: timed host-API calls driven against an
//! engine at a fixed tick. Powers the CLI and the integration tests.

use std::{cell::RefCell, rc::Rc};

use crate::{
    core::Vec3,
    error::{GlowmoteError, GlowmoteResult},
    events::EngineEvent,
    frame::BlendedFrame,
    gesture::GestureTuning,
    mascot::{EngineConfig, MascotEngine},
    tempo::TempoSample,
};

fn default_tick_ms() -> f64 {
    1_000.0 / 60.0
}

fn one_bar() -> f64 {
    1.0
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: EngineConfig,
    pub duration_ms: f64,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: f64,
    #[serde(default)]
    pub commands: Vec<TimedCommand>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimedCommand {
    pub at_ms: f64,
    #[serde(flatten)]
    pub command: Command,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    SetEmotion {
        name: String,
        #[serde(default)]
        undertone: Option<String>,
    },
    TriggerGesture {
        name: String,
        #[serde(default)]
        tuning: GestureTuning,
    },
    ChainGestures {
        names: Vec<String>,
    },
    SetGroovePreset {
        name: String,
        #[serde(default = "one_bar")]
        transition_bars: f64,
    },
    SetTempo {
        bpm: f64,
    },
    StartRhythm,
    StopRhythm,
    ConnectAudio,
    DisconnectAudio,
    PushTempoSample {
        bpm: f64,
        confidence: f64,
    },
    SetPosition {
        position: Vec3,
    },
    SetScale {
        scale: f64,
    },
    Blink,
}

impl Scenario {
    pub fn validate(&self) -> GlowmoteResult<()> {
        if !self.duration_ms.is_finite() || self.duration_ms <= 0.0 {
            return Err(GlowmoteError::validation("scenario duration_ms must be > 0"));
        }
        if !self.tick_ms.is_finite() || self.tick_ms <= 0.0 {
            return Err(GlowmoteError::validation("scenario tick_ms must be > 0"));
        }
        for c in &self.commands {
            if !c.at_ms.is_finite() || c.at_ms < 0.0 {
                return Err(GlowmoteError::validation("command at_ms must be >= 0"));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct RunSummary {
    pub frames: u64,
    pub beats: u64,
    pub min_glow: f64,
    pub max_glow: f64,
}

/// Replays the scenario against a fresh engine, handing every frame to
/// `sink`. Command failures degrade to warnings; only a structural
/// problem aborts the run.
pub fn run_scenario(
    scenario: &Scenario,
    mut sink: impl FnMut(f64, &BlendedFrame),
) -> GlowmoteResult<RunSummary> {
    scenario.validate()?;

    let mut engine = MascotEngine::new(scenario.config.clone());
    let beat_count = Rc::new(RefCell::new(0u64));
    let sink_count = beat_count.clone();
    engine.set_event_handler(move |ev| {
        if matches!(ev, EngineEvent::Beat { .. }) {
            *sink_count.borrow_mut() += 1;
        }
    });

    let mut commands: Vec<&TimedCommand> = scenario.commands.iter().collect();
    commands.sort_by(|a, b| a.at_ms.total_cmp(&b.at_ms));

    let mut next = 0usize;
    let mut t = 0.0f64;
    let mut frames = 0u64;
    let mut min_glow = f64::INFINITY;
    let mut max_glow = f64::NEG_INFINITY;

    while t < scenario.duration_ms {
        while next < commands.len() && commands[next].at_ms <= t {
            apply(&mut engine, &commands[next].command);
            next += 1;
        }

        let frame = engine.tick(scenario.tick_ms)?;
        frames += 1;
        min_glow = min_glow.min(frame.glow_intensity);
        max_glow = max_glow.max(frame.glow_intensity);
        sink(t, frame);

        t += scenario.tick_ms;
    }

    if frames == 0 {
        min_glow = 0.0;
        max_glow = 0.0;
    }
    Ok(RunSummary {
        frames,
        beats: *beat_count.borrow(),
        min_glow,
        max_glow,
    })
}

fn apply(engine: &mut MascotEngine, command: &Command) {
    let result = match command {
        Command::SetEmotion { name, undertone } => {
            engine.set_emotion(name, undertone.as_deref())
        }
        Command::TriggerGesture { name, tuning } => engine.trigger_gesture(name, Some(*tuning)),
        Command::ChainGestures { names } => {
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            engine.chain_gestures(&refs)
        }
        Command::SetGroovePreset {
            name,
            transition_bars,
        } => engine.set_groove_preset(name, *transition_bars),
        Command::SetTempo { bpm } => engine.set_tempo(*bpm),
        Command::StartRhythm => engine.start_rhythm(),
        Command::StopRhythm => engine.stop_rhythm(),
        Command::ConnectAudio => engine.connect_audio(),
        Command::DisconnectAudio => engine.disconnect_audio(),
        Command::PushTempoSample { bpm, confidence } => engine.push_tempo_sample(TempoSample {
            bpm: *bpm,
            confidence: *confidence,
        }),
        Command::SetPosition { position } => engine.set_position(*position),
        Command::SetScale { scale } => engine.set_scale(*scale),
        Command::Blink => engine.blink_now(),
    };
    if let Err(err) = result {
        tracing::warn!(%err, ?command, "scenario command degraded to no-op");
    }
}
