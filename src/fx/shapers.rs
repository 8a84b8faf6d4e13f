// Waveshaper curves for SatuMorpher
// Every curve is memoryless and maps any finite input into [-1, 1]

use nih_plug::params::enums::Enum;
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_2_PI;

// Asym tanh shape
const ASYM_K: f32 = 1.2;
const ASYM_BIAS: f32 = 0.15;
const ASYM_NORM_EPSILON: f32 = 1.0e-5;

/// Plain function pointer for a single transfer curve.
pub type ShaperFn = fn(f32) -> f32;

#[derive(Debug, Clone, Copy, Enum, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShaperType {
    #[name = "tanh"]
    Tanh,
    #[name = "hard clip"]
    HardClip,
    #[name = "cubic soft clip"]
    CubicSoftClip,
    #[name = "atan"]
    Atan,
    #[name = "rational"]
    Rational,
    #[name = "exponential"]
    Exponential,
    #[name = "asym tanh"]
    AsymTanh,
}

impl ShaperType {
    pub const ALL: [ShaperType; 7] = [
        ShaperType::Tanh,
        ShaperType::HardClip,
        ShaperType::CubicSoftClip,
        ShaperType::Atan,
        ShaperType::Rational,
        ShaperType::Exponential,
        ShaperType::AsymTanh,
    ];

    /// Builds a variant from an untrusted index, clamping it into the valid range.
    pub fn from_raw(index: i64) -> Self {
        let last = (Self::ALL.len() - 1) as i64;
        Self::ALL[index.clamp(0, last) as usize]
    }

    pub fn process_fn(self) -> ShaperFn {
        match self {
            ShaperType::Tanh => sat_tanh,
            ShaperType::HardClip => sat_hard_clip,
            ShaperType::CubicSoftClip => sat_cubic_soft_clip,
            ShaperType::Atan => sat_atan,
            ShaperType::Rational => sat_rational,
            ShaperType::Exponential => sat_exponential,
            ShaperType::AsymTanh => sat_asym_tanh,
        }
    }

    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        (self.process_fn())(x)
    }
}

pub fn sat_tanh(x: f32) -> f32 {
    x.tanh()
}

pub fn sat_hard_clip(x: f32) -> f32 {
    x.clamp(-1.0, 1.0)
}

// Knee at +-1, flat at 2/3 beyond it
pub fn sat_cubic_soft_clip(x: f32) -> f32 {
    if x.abs() <= 1.0 {
        x - (x * x * x) / 3.0
    } else {
        (2.0 / 3.0_f32).copysign(x)
    }
}

pub fn sat_atan(x: f32) -> f32 {
    FRAC_2_PI * x.atan()
}

pub fn sat_rational(x: f32) -> f32 {
    x / (1.0 + x.abs())
}

pub fn sat_exponential(x: f32) -> f32 {
    (1.0 - (-x.abs()).exp()).copysign(x)
}

/// Biased tanh. The zero-input response is subtracted so silence stays silent,
/// then the curve is rescaled so the positive side still reaches 1.
pub fn sat_asym_tanh(x: f32) -> f32 {
    let y = (ASYM_K * (x + ASYM_BIAS)).tanh();
    let y0 = (ASYM_K * ASYM_BIAS).tanh();

    let mut z = y - y0;
    let norm = 1.0 - y0.abs();
    if norm > ASYM_NORM_EPSILON {
        z /= norm;
    }

    z.clamp(-1.0, 1.0)
}
