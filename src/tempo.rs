use crate::clock::{MAX_BPM, MIN_BPM};
use crate::core::lerp;

/// One observation posted by the external beat-detection collaborator.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TempoSample {
    pub bpm: f64,
    pub confidence: f64, // detection certainty, 0..1
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TempoFollowerConfig {
    pub min_confidence: f64,      // below this the agreement streak resets
    pub agree_samples: u32,       // consecutive agreeing samples to vet a tempo
    pub bpm_tolerance: f64,       // bpm distance that still counts as agreeing
    pub confidence_smoothing: f64, // per-sample lerp on the exposed confidence
}

impl Default for TempoFollowerConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            agree_samples: 4,
            bpm_tolerance: 3.0,
            confidence_smoothing: 0.25,
        }
    }
}

/// Debounces raw tempo observations into vetted tempo commits; only a
/// sustained, confident reading gets through.
#[derive(Clone, Debug, Default)]
pub struct TempoFollower {
    config: TempoFollowerConfig,
    candidate_bpm: Option<f64>,
    agreeing: u32,
    confidence: f64,
    locked_bpm: Option<f64>,
}

impl TempoFollower {
    pub fn new(config: TempoFollowerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    // Smoothed detection certainty, 0..1. Feeds groove softening.
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn locked_bpm(&self) -> Option<f64> {
        self.locked_bpm
    }

    /// Consumes one sample. Returns `Some(bpm)` when a newly vetted tempo
    /// should be committed to the clock.
    pub fn push(&mut self, sample: TempoSample) -> Option<f64> {
        if !sample.bpm.is_finite() || !(MIN_BPM..=MAX_BPM).contains(&sample.bpm) {
            tracing::debug!(bpm = sample.bpm, "discarding out-of-range tempo sample");
            return None;
        }
        let sample_confidence = if sample.confidence.is_finite() {
            sample.confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };

        self.confidence = lerp(
            self.confidence,
            sample_confidence,
            self.config.confidence_smoothing.clamp(0.0, 1.0),
        );

        if sample_confidence < self.config.min_confidence {
            self.candidate_bpm = None;
            self.agreeing = 0;
            return None;
        }

        match self.candidate_bpm {
            Some(candidate) if (candidate - sample.bpm).abs() <= self.config.bpm_tolerance => {
                self.agreeing += 1;
                // Track the reading as it settles.
                self.candidate_bpm = Some(lerp(candidate, sample.bpm, 0.25));
            }
            _ => {
                self.candidate_bpm = Some(sample.bpm);
                self.agreeing = 1;
            }
        }

        if self.agreeing < self.config.agree_samples {
            return None;
        }

        let vetted = self.candidate_bpm?;
        let changed = self
            .locked_bpm
            .map(|locked| (locked - vetted).abs() > 0.5)
            .unwrap_or(true);
        if !changed {
            return None;
        }

        tracing::debug!(bpm = vetted, "tempo lock");
        self.locked_bpm = Some(vetted);
        Some(vetted)
    }

    // Drops all detection state, e.g. on audio disconnect.
    pub fn reset(&mut self) {
        self.candidate_bpm = None;
        self.agreeing = 0;
        self.confidence = 0.0;
        self.locked_bpm = None;
    }
}
