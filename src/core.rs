use crate::error::{GlowmoteError, GlowmoteResult};

pub use glam::DVec3 as Vec3;

/// Linear-space RGB, components nominally in 0..1.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }

    pub fn clamped(self) -> Self {
        Self {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
        }
    }

    pub fn lerp(a: Self, b: Self, t: f64) -> Self {
        Self {
            r: a.r + (b.r - a.r) * t,
            g: a.g + (b.g - a.g) * t,
            b: a.b + (b.b - a.b) * t,
        }
    }

    pub fn add(self, other: Self) -> Self {
        Self {
            r: self.r + other.r,
            g: self.g + other.g,
            b: self.b + other.b,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u8, // power of two
}

impl TimeSignature {
    pub fn new(numerator: u8, denominator: u8) -> GlowmoteResult<Self> {
        if numerator == 0 {
            return Err(GlowmoteError::validation(
                "TimeSignature numerator must be > 0",
            ));
        }
        if !matches!(denominator, 1 | 2 | 4 | 8 | 16) {
            return Err(GlowmoteError::validation(
                "TimeSignature denominator must be 1, 2, 4, 8 or 16",
            ));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub const fn four_four() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }

    pub const fn three_four() -> Self {
        Self {
            numerator: 3,
            denominator: 4,
        }
    }

    pub fn beats_per_bar(self) -> f64 {
        f64::from(self.numerator)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::four_four()
    }
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Frame-rate-independent exponential smoothing coefficient: the fraction
/// of the remaining distance to cover this step. Higher rate follows
/// targets faster.
pub fn smoothing_factor(rate_per_sec: f64, dt_secs: f64) -> f64 {
    if !rate_per_sec.is_finite() || !dt_secs.is_finite() || rate_per_sec <= 0.0 || dt_secs <= 0.0 {
        return 0.0;
    }
    1.0 - (-rate_per_sec * dt_secs).exp()
}

#[derive(Clone, Copy, Debug)]
pub struct Rng64 {
    state: u64,
}

impl Rng64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        // SplitMix64
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    pub fn next_f64_01(&mut self) -> f64 {
        // 53 bits of precision.
        let v = self.next_u64() >> 11;
        (v as f64) * (1.0 / ((1u64 << 53) as f64))
    }
}
