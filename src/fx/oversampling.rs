// Polyphase IIR half-band oversampling for the waveshaper stage
//
// Each 2x stage is a pair of first-order allpass cascades running at the lower rate.
// Interpolation interleaves the two branches, decimation averages branch A with the
// one sample delayed branch B. Coefficients are the published steep elliptic
// half-band sets (12 and 8 coefficients).

use nih_plug::{nih_debug_assert, params::enums::Enum};
use serde::{Deserialize, Serialize};

// Stage 1: base rate <-> 2x, ~104 dB rejection with a 0.01 transition band
const STEEP_12_BRANCH_A: [f32; 6] = [
    0.036_681_502_163_648_017,
    0.274_631_759_379_454_1,
    0.561_098_969_787_919_48,
    0.769_741_833_862_266,
    0.892_260_818_003_878_9,
    0.962_094_548_378_084,
];
const STEEP_12_BRANCH_B: [f32; 6] = [
    0.136_547_624_631_957_71,
    0.423_138_617_436_566_67,
    0.677_540_049_974_161_6,
    0.839_889_624_849_638,
    0.931_541_959_963_183_9,
    0.987_816_370_732_897_1,
];

// Stage 2: 2x <-> 4x, the first stage already removed everything near the top
const STEEP_8_BRANCH_A: [f32; 4] = [
    0.077_115_079_832_416_22,
    0.482_070_625_061_047_2,
    0.796_820_471_331_579_7,
    0.941_251_427_774_047_1,
];
const STEEP_8_BRANCH_B: [f32; 4] = [
    0.265_968_526_521_094_6,
    0.665_104_153_263_495_7,
    0.884_101_508_550_615_9,
    0.982_005_414_188_607_5,
];

#[derive(Debug, Clone, Copy, Enum, PartialEq, Eq, Serialize, Deserialize)]
pub enum OversampleMode {
    #[name = "Off"]
    Off,
    #[name = "x2"]
    X2,
    #[name = "x4"]
    X4,
}

impl OversampleMode {
    pub const ALL: [OversampleMode; 3] = [OversampleMode::Off, OversampleMode::X2, OversampleMode::X4];

    pub fn from_raw(index: i64) -> Self {
        Self::ALL[index.clamp(0, 2) as usize]
    }

    /// Number of cascaded 2x stages
    pub fn stages(self) -> usize {
        match self {
            OversampleMode::Off => 0,
            OversampleMode::X2 => 1,
            OversampleMode::X4 => 2,
        }
    }

    pub fn factor(self) -> usize {
        1 << self.stages()
    }
}

struct HalfBandCoefficients {
    branch_a: &'static [f32],
    branch_b: &'static [f32],
}

impl HalfBandCoefficients {
    fn for_stage(stage: usize) -> Self {
        if stage == 0 {
            Self {
                branch_a: &STEEP_12_BRANCH_A,
                branch_b: &STEEP_12_BRANCH_B,
            }
        } else {
            Self {
                branch_a: &STEEP_8_BRANCH_A,
                branch_b: &STEEP_8_BRANCH_B,
            }
        }
    }

    // Delay at DC in samples of the stage's lower rate for one up + down pass
    fn latency(&self) -> f32 {
        let delay = |coeffs: &[f32]| -> f32 { coeffs.iter().map(|a| (1.0 - a) / (1.0 + a)).sum() };
        delay(self.branch_a) + delay(self.branch_b) + 0.5
    }
}

// y = (a + z^-1) / (1 + a*z^-1)
#[derive(Clone, Copy)]
struct AllpassSection {
    a: f32,
    state: f32,
}

impl AllpassSection {
    #[inline]
    fn process(&mut self, x: f32) -> f32 {
        let y = self.a * x + self.state;
        self.state = x - self.a * y;
        y
    }
}

#[inline]
fn process_branch(sections: &mut [AllpassSection], x: f32) -> f32 {
    sections.iter_mut().fold(x, |y, section| section.process(y))
}

#[derive(Clone)]
struct HalfBandFilter {
    branch_a: Vec<AllpassSection>,
    branch_b: Vec<AllpassSection>,
    delay: f32,
}

impl HalfBandFilter {
    fn new(coeffs: &HalfBandCoefficients) -> Self {
        let sections = |c: &[f32]| -> Vec<AllpassSection> {
            c.iter().map(|&a| AllpassSection { a, state: 0.0 }).collect()
        };
        Self {
            branch_a: sections(coeffs.branch_a),
            branch_b: sections(coeffs.branch_b),
            delay: 0.0,
        }
    }

    fn reset(&mut self) {
        for section in self.branch_a.iter_mut().chain(self.branch_b.iter_mut()) {
            section.state = 0.0;
        }
        self.delay = 0.0;
    }

    // output.len() == 2 * input.len()
    fn interpolate(&mut self, input: &[f32], output: &mut [f32]) {
        for (&x, pair) in input.iter().zip(output.chunks_exact_mut(2)) {
            pair[0] = process_branch(&mut self.branch_a, x);
            pair[1] = process_branch(&mut self.branch_b, x);
        }
    }

    // input.len() == 2 * output.len()
    fn decimate(&mut self, input: &[f32], output: &mut [f32]) {
        for (pair, out) in input.chunks_exact(2).zip(output.iter_mut()) {
            let a = process_branch(&mut self.branch_a, pair[0]);
            let b = process_branch(&mut self.branch_b, pair[1]);
            *out = (a + self.delay) * 0.5;
            self.delay = b;
        }
    }
}

// One 2x step: per channel filters for both directions plus the buffer at the upper rate
struct OversamplingStage {
    up: Vec<HalfBandFilter>,
    down: Vec<HalfBandFilter>,
    buffers: Vec<Vec<f32>>,
}

/// Cascaded 2x half-band oversampler owning its delay lines and scratch buffers.
///
/// `upsample` and `downsample` are meant to be called as a pair per channel with the
/// same base-rate length, the nonlinear stage running on the slice `upsample` returns.
pub struct Oversampler {
    mode: OversampleMode,
    num_channels: usize,
    block_size: usize,
    stages: Vec<OversamplingStage>,
}

impl Oversampler {
    pub fn new(mode: OversampleMode) -> Self {
        Self {
            mode,
            num_channels: 0,
            block_size: 0,
            stages: Vec::new(),
        }
    }

    /// Allocates delay lines and buffers for `num_channels` channels of at most
    /// `block_size` base-rate samples. This is the only allocating call.
    pub fn prepare(&mut self, num_channels: usize, block_size: usize) {
        self.num_channels = num_channels;
        self.block_size = block_size;
        self.stages = (0..self.mode.stages())
            .map(|stage| {
                let coeffs = HalfBandCoefficients::for_stage(stage);
                let upper_len = block_size << (stage + 1);
                OversamplingStage {
                    up: vec![HalfBandFilter::new(&coeffs); num_channels],
                    down: vec![HalfBandFilter::new(&coeffs); num_channels],
                    buffers: vec![vec![0.0; upper_len]; num_channels],
                }
            })
            .collect();
    }

    pub fn reset(&mut self) {
        for stage in self.stages.iter_mut() {
            for filter in stage.up.iter_mut().chain(stage.down.iter_mut()) {
                filter.reset();
            }
            for buffer in stage.buffers.iter_mut() {
                buffer.fill(0.0);
            }
        }
    }

    pub fn factor(&self) -> usize {
        self.mode.factor()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Added delay in base-rate samples for a full up + down pass
    pub fn latency(&self) -> f32 {
        (0..self.mode.stages())
            .map(|stage| HalfBandCoefficients::for_stage(stage).latency() / (1 << stage) as f32)
            .sum()
    }

    pub fn latency_samples(&self) -> u32 {
        self.latency().round() as u32
    }

    /// Returns `factor * input.len()` band-limited samples at the upper rate.
    /// Input beyond the configured block size is ignored.
    pub fn upsample(&mut self, channel: usize, input: &[f32]) -> &mut [f32] {
        if input.is_empty() || channel >= self.num_channels || self.stages.is_empty() {
            return &mut [];
        }
        nih_debug_assert!(input.len() <= self.block_size);
        let len = input.len().min(self.block_size);

        let mut lower_len = len;
        for index in 0..self.stages.len() {
            let (done, rest) = self.stages.split_at_mut(index);
            let stage = &mut rest[0];
            let output = &mut stage.buffers[channel][..lower_len * 2];
            let source: &[f32] = match done.last() {
                Some(previous) => &previous.buffers[channel][..lower_len],
                None => &input[..len],
            };
            stage.up[channel].interpolate(source, output);
            lower_len *= 2;
        }

        match self.stages.last_mut() {
            Some(stage) => &mut stage.buffers[channel][..lower_len],
            None => &mut [],
        }
    }

    /// Decimates the upper-rate buffer filled by the last `upsample` call on this
    /// channel into `output`.
    pub fn downsample(&mut self, channel: usize, output: &mut [f32]) {
        if output.is_empty() || channel >= self.num_channels || self.stages.is_empty() {
            return;
        }
        nih_debug_assert!(output.len() <= self.block_size);
        let len = output.len().min(self.block_size);

        let mut upper_len = len << self.stages.len();
        for index in (0..self.stages.len()).rev() {
            let (lower, rest) = self.stages.split_at_mut(index);
            let stage = &mut rest[0];
            let source = &stage.buffers[channel][..upper_len];
            let lower_len = upper_len / 2;
            match lower.last_mut() {
                Some(previous) => {
                    stage.down[channel].decimate(source, &mut previous.buffers[channel][..lower_len])
                }
                None => stage.down[channel].decimate(source, &mut output[..lower_len]),
            }
            upper_len = lower_len;
        }
    }
}
