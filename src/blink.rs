use crate::core::Rng64;
use crate::error::{GlowmoteError, GlowmoteResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BlinkPhase {
    Open,
    Closing,
    Closed,
    Opening,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BlinkConfig {
    pub min_interval_ms: f64, // randomized pause between blinks
    pub max_interval_ms: f64,
    pub closing_ms: f64,
    pub closed_ms: f64,
    pub opening_ms: f64,
    pub glow_boost: f64, // peak additive glow while shut, render-time only
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 2_400.0,
            max_interval_ms: 6_200.0,
            closing_ms: 70.0,
            closed_ms: 50.0,
            opening_ms: 110.0,
            glow_boost: 0.18,
        }
    }
}

impl BlinkConfig {
    pub fn validate(&self) -> GlowmoteResult<()> {
        let all = [
            self.min_interval_ms,
            self.max_interval_ms,
            self.closing_ms,
            self.closed_ms,
            self.opening_ms,
            self.glow_boost,
        ];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(GlowmoteError::validation("blink config must be finite"));
        }
        if self.min_interval_ms <= 0.0 || self.max_interval_ms < self.min_interval_ms {
            return Err(GlowmoteError::validation(
                "blink interval must satisfy 0 < min <= max",
            ));
        }
        if self.closing_ms <= 0.0 || self.closed_ms <= 0.0 || self.opening_ms <= 0.0 {
            return Err(GlowmoteError::validation("blink phase durations must be > 0"));
        }
        if self.glow_boost < 0.0 {
            return Err(GlowmoteError::validation("blink glow boost must be >= 0"));
        }
        Ok(())
    }
}

/// Autonomous eyelid micro-animation, decoupled from emotion and gesture
/// state. Owns nothing the blender persists; `glow_boost` and `eyelid`
/// are recomputed on every query.
#[derive(Clone, Debug)]
pub struct BlinkManager {
    config: BlinkConfig,
    phase: BlinkPhase,
    phase_elapsed_ms: f64,
    next_blink_ms: f64,
    rng: Rng64,
}

impl BlinkManager {
    pub fn new(config: BlinkConfig, seed: u64) -> Self {
        let mut manager = Self {
            config,
            phase: BlinkPhase::Open,
            phase_elapsed_ms: 0.0,
            next_blink_ms: 0.0,
            rng: Rng64::new(seed),
        };
        manager.schedule_next();
        manager
    }

    pub fn phase(&self) -> BlinkPhase {
        self.phase
    }

    fn schedule_next(&mut self) {
        let span = self.config.max_interval_ms - self.config.min_interval_ms;
        self.next_blink_ms = self.config.min_interval_ms + self.rng.next_f64_01() * span;
    }

    fn phase_limit_ms(&self) -> f64 {
        match self.phase {
            BlinkPhase::Open => self.next_blink_ms,
            BlinkPhase::Closing => self.config.closing_ms,
            BlinkPhase::Closed => self.config.closed_ms,
            BlinkPhase::Opening => self.config.opening_ms,
        }
    }

    fn advance_phase(&mut self) {
        self.phase = match self.phase {
            BlinkPhase::Open => BlinkPhase::Closing,
            BlinkPhase::Closing => BlinkPhase::Closed,
            BlinkPhase::Closed => BlinkPhase::Opening,
            BlinkPhase::Opening => {
                self.schedule_next();
                BlinkPhase::Open
            }
        };
        self.phase_elapsed_ms = 0.0;
    }

    /// Starts a blink now instead of waiting out the random interval.
    pub fn trigger_now(&mut self) {
        if self.phase == BlinkPhase::Open {
            self.phase = BlinkPhase::Closing;
            self.phase_elapsed_ms = 0.0;
        }
    }

    pub fn update(&mut self, dt_ms: f64) {
        let mut remaining = if dt_ms.is_finite() && dt_ms > 0.0 { dt_ms } else { 0.0 };
        // Carry leftover time across phase edges.
        loop {
            let needed = self.phase_limit_ms() - self.phase_elapsed_ms;
            if remaining < needed {
                self.phase_elapsed_ms += remaining;
                return;
            }
            remaining -= needed;
            self.advance_phase();
        }
    }

    fn phase_progress(&self) -> f64 {
        let limit = self.phase_limit_ms();
        if limit <= 0.0 {
            1.0
        } else {
            (self.phase_elapsed_ms / limit).clamp(0.0, 1.0)
        }
    }

    // Eyelid closure for the renderer, 0 open .. 1 closed.
    pub fn eyelid(&self) -> f64 {
        match self.phase {
            BlinkPhase::Open => 0.0,
            BlinkPhase::Closing => self.phase_progress(),
            BlinkPhase::Closed => 1.0,
            BlinkPhase::Opening => 1.0 - self.phase_progress(),
        }
    }

    /// Transient additive glow term, recomputed per query. Nonzero only
    /// while the lids close; never folded into persisted state.
    pub fn glow_boost(&self) -> f64 {
        match self.phase {
            BlinkPhase::Closing => self.config.glow_boost * self.phase_progress(),
            BlinkPhase::Closed => self.config.glow_boost,
            BlinkPhase::Open | BlinkPhase::Opening => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> BlinkManager {
        BlinkManager::new(BlinkConfig::default(), 7)
    }

    #[test]
    fn config_validates_bounds() {
        assert!(BlinkConfig::default().validate().is_ok());
        let bad = BlinkConfig {
            min_interval_ms: 0.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let swapped = BlinkConfig {
            min_interval_ms: 5_000.0,
            max_interval_ms: 1_000.0,
            ..Default::default()
        };
        assert!(swapped.validate().is_err());
    }

    #[test]
    fn cycle_walks_all_phases_and_returns_open() {
        let mut manager = manager();
        manager.trigger_now();
        assert_eq!(manager.phase(), BlinkPhase::Closing);
        manager.update(70.0);
        assert_eq!(manager.phase(), BlinkPhase::Closed);
        manager.update(50.0);
        assert_eq!(manager.phase(), BlinkPhase::Opening);
        manager.update(110.0);
        assert_eq!(manager.phase(), BlinkPhase::Open);
        assert_eq!(manager.eyelid(), 0.0);
        assert_eq!(manager.glow_boost(), 0.0);
    }

    #[test]
    fn long_frame_carries_over_phase_edges() {
        let mut manager = manager();
        manager.trigger_now();
        // One big step eats closing + closed and lands mid-opening.
        manager.update(70.0 + 50.0 + 55.0);
        assert_eq!(manager.phase(), BlinkPhase::Opening);
        assert!((manager.eyelid() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn boost_is_transient_and_query_computed() {
        let mut manager = manager();
        manager.trigger_now();
        manager.update(35.0); // halfway through closing
        let boost = manager.glow_boost();
        assert!((boost - 0.09).abs() < 1e-9);
        // Querying repeatedly returns the same value; nothing accumulates.
        assert_eq!(manager.glow_boost(), boost);
        assert_eq!(manager.glow_boost(), boost);

        manager.update(35.0 + 50.0); // through closed, into opening
        assert_eq!(manager.glow_boost(), 0.0);
    }

    #[test]
    fn intervals_are_randomized_within_bounds() {
        let config = BlinkConfig::default();
        let mut manager = BlinkManager::new(config, 42);
        let mut intervals = Vec::new();
        for _ in 0..8 {
            intervals.push(manager.next_blink_ms);
            // Run a full cycle: wait out the interval, then the blink.
            manager.update(manager.next_blink_ms);
            manager.update(config.closing_ms + config.closed_ms + config.opening_ms);
            assert_eq!(manager.phase(), BlinkPhase::Open);
        }
        for interval in &intervals {
            assert!(*interval >= config.min_interval_ms);
            assert!(*interval <= config.max_interval_ms);
        }
        // Not all the same: the interval is randomized, not fixed.
        assert!(intervals.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn blinking_is_deterministic_per_seed() {
        let a = BlinkManager::new(BlinkConfig::default(), 9).next_blink_ms;
        let b = BlinkManager::new(BlinkConfig::default(), 9).next_blink_ms;
        assert_eq!(a, b);
    }
}
