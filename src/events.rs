/// Discrete notifications fired synchronously at the point of state
/// change, carrying the previous value where meaningful.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    EmotionChanged { from: String, to: String },
    GestureStarted { name: String },
    GestureEnded { name: String },
    Beat { index: u64, accent: f64 },
    Bar { index: u64 },
    GroovePresetChanged { from: String, to: String },
    TempoLocked { bpm: f64 },
}

/// Host callback; runs inline on the calling thread and must not re-enter
/// the engine.
pub type EventHandler = Box<dyn FnMut(&EngineEvent)>;
