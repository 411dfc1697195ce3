use crate::core::TimeSignature;

/// Per-tick delta cap in milliseconds; bounds the beat jump after a frame
/// spike (tab backgrounding).
pub const MAX_TICK_MS: f64 = 100.0;

pub const MIN_BPM: f64 = 20.0;
pub const MAX_BPM: f64 = 300.0;

/// Rhythmic feel driving accent placement and swing warp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RhythmPattern {
    Straight,
    Swing,
    Waltz,
    Dubstep,
    Breakbeat,
}

impl RhythmPattern {
    pub fn default_signature(self) -> TimeSignature {
        match self {
            Self::Waltz => TimeSignature::three_four(),
            _ => TimeSignature::four_four(),
        }
    }

    /// Phase warp amount in 0..1; zero means no swing.
    pub fn swing(self) -> f64 {
        match self {
            Self::Swing => 0.55,
            Self::Breakbeat => 0.25,
            _ => 0.0,
        }
    }

    /// Accent weight per beat; exactly `beats_per_bar` entries, downbeat
    /// forced to 1.0.
    pub fn accents(self, beats_per_bar: u8) -> Vec<f64> {
        let canon: &[f64] = match self {
            Self::Straight => &[1.0, 0.45, 0.7, 0.45],
            Self::Swing => &[1.0, 0.35, 0.65, 0.5],
            Self::Waltz => &[1.0, 0.4, 0.55],
            Self::Dubstep => &[1.0, 0.25, 0.95, 0.25],
            Self::Breakbeat => &[1.0, 0.6, 0.35, 0.85],
        };
        let n = beats_per_bar.max(1) as usize;
        let mut out: Vec<f64> = (0..n).map(|i| canon[i % canon.len()]).collect();
        out[0] = 1.0;
        out
    }
}

/// One integer beat boundary crossed during a `tick`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeatEvent {
    pub beat_index: u64,
    pub bar_index: u64,
    pub beat_in_bar: u8,
    pub is_bar_start: bool,
    pub accent: f64,
}

/// Monotonic musical time. Accepts vetted tempo values only; audio
/// analysis lives in an external collaborator behind `TempoFollower`.
#[derive(Clone, Debug)]
pub struct MusicalClock {
    bpm: f64,
    signature: TimeSignature,
    pattern: RhythmPattern,
    playing: bool,
    elapsed_beats: f64,
    accents: Vec<f64>,
    max_tick_ms: f64,
}

impl MusicalClock {
    pub fn new(bpm: f64, pattern: RhythmPattern) -> Self {
        let signature = pattern.default_signature();
        let mut clock = Self {
            bpm: 120.0,
            signature,
            pattern,
            playing: false,
            elapsed_beats: 0.0,
            accents: pattern.accents(signature.numerator),
            max_tick_ms: MAX_TICK_MS,
        };
        clock.set_tempo(bpm);
        clock
    }

    /// Adjusts the per-tick delta cap. Non-positive values are discarded.
    pub fn set_max_tick_ms(&mut self, max_tick_ms: f64) {
        if !max_tick_ms.is_finite() || max_tick_ms <= 0.0 {
            tracing::warn!(max_tick_ms, "rejecting invalid tick cap");
            return;
        }
        self.max_tick_ms = max_tick_ms;
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn pattern(&self) -> RhythmPattern {
        self.pattern
    }

    pub fn signature(&self) -> TimeSignature {
        self.signature
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn elapsed_beats(&self) -> f64 {
        self.elapsed_beats
    }

    /// Clamps to [`MIN_BPM`, `MAX_BPM`]; a non-finite or non-positive
    /// value is discarded with a warning, never an error.
    pub fn set_tempo(&mut self, bpm: f64) {
        if !bpm.is_finite() || bpm <= 0.0 {
            tracing::warn!(bpm, "rejecting invalid tempo, keeping {}", self.bpm);
            return;
        }
        self.bpm = bpm.clamp(MIN_BPM, MAX_BPM);
    }

    pub fn set_pattern(&mut self, pattern: RhythmPattern) {
        self.pattern = pattern;
        self.signature = pattern.default_signature();
        self.accents = pattern.accents(self.signature.numerator);
    }

    pub fn start(&mut self) {
        self.playing = true;
    }

    /// Freezes the beat position; [`reset`](Self::reset) rewinds it.
    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn reset(&mut self) {
        self.elapsed_beats = 0.0;
    }

    pub fn beats_per_bar(&self) -> f64 {
        self.signature.beats_per_bar()
    }

    // Fractional position inside the current beat, 0..1.
    pub fn beat_phase(&self) -> f64 {
        self.elapsed_beats.fract()
    }

    // Beat phase with the pattern's swing warp applied.
    pub fn swung_phase(&self) -> f64 {
        apply_swing(self.beat_phase(), self.pattern.swing())
    }

    // Fractional position inside the current bar, 0..1.
    pub fn bar_progress(&self) -> f64 {
        (self.elapsed_beats / self.beats_per_bar()).fract()
    }

    pub fn beats_to_ms(&self, beats: f64) -> f64 {
        beats * 60_000.0 / self.bpm
    }

    // Accent weight of the beat the clock is currently inside.
    pub fn current_accent(&self) -> f64 {
        let idx = (self.elapsed_beats.floor().max(0.0) as u64) % u64::from(self.signature.numerator);
        self.accents[idx as usize]
    }

    /// 1..0 ramp inside a window after a strong beat (accent >= 0.9), 0
    /// elsewhere. Recomputed from phase, stateless.
    pub fn accent_envelope(&self, window_beats: f64) -> f64 {
        if window_beats <= 0.0 {
            return 0.0;
        }
        let pos = self.beat_phase();
        if pos >= window_beats || self.current_accent() < 0.9 {
            return 0.0;
        }
        self.current_accent() * (1.0 - pos / window_beats)
    }

    /// Advances musical time and reports every integer beat boundary
    /// crossed, in order (catch-up, not skip).
    pub fn tick(&mut self, delta_ms: f64) -> Vec<BeatEvent> {
        if !self.playing {
            return Vec::new();
        }
        let delta = if delta_ms.is_finite() && delta_ms > 0.0 {
            delta_ms.min(self.max_tick_ms)
        } else {
            0.0
        };

        let before = self.elapsed_beats;
        let after = before + delta * self.bpm / 60_000.0;
        self.elapsed_beats = after;

        let mut events = Vec::new();
        let mut boundary = before.floor() + 1.0;
        while boundary <= after {
            let beat_index = boundary as u64;
            let numerator = u64::from(self.signature.numerator);
            let beat_in_bar = (beat_index % numerator) as u8;
            events.push(BeatEvent {
                beat_index,
                bar_index: beat_index / numerator,
                beat_in_bar,
                is_bar_start: beat_in_bar == 0,
                accent: self.accents[beat_in_bar as usize],
            });
            boundary += 1.0;
        }
        events
    }
}

impl Default for MusicalClock {
    fn default() -> Self {
        Self::new(120.0, RhythmPattern::Straight)
    }
}

/// Warp phase with a swing amount while preserving `[0, 1]` bounds.
pub fn apply_swing(phase: f64, swing: f64) -> f64 {
    let p = phase.fract();
    let split = (0.5 + swing.clamp(0.0, 1.0) * 0.24).clamp(0.1, 0.9);
    if p < split {
        (p / split) * 0.5
    } else {
        0.5 + ((p - split) / (1.0 - split)) * 0.5
    }
}
