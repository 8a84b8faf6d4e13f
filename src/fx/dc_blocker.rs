// One-pole DC blocker
// Topology-preserving first order high-pass, a single state cell per channel

use std::f32::consts::PI;

pub const DC_BLOCK_CUTOFF_HZ: f32 = 20.0;

#[derive(Clone, Copy)]
pub(crate) struct DcBlocker {
    // g / (1 + g) with g = tan(pi * fc / fs)
    coefficient: f32,
    state: f32,
}

impl Default for DcBlocker {
    fn default() -> Self {
        let mut blocker = Self {
            coefficient: 0.0,
            state: 0.0,
        };
        blocker.update(44100.0);
        blocker
    }
}

impl DcBlocker {
    pub fn new(sample_rate: f32) -> Self {
        let mut blocker = Self::default();
        blocker.update(sample_rate);
        blocker
    }

    pub fn update(&mut self, sample_rate: f32) {
        // Keep the cutoff safely under Nyquist for silly low rates
        let cutoff = DC_BLOCK_CUTOFF_HZ.min(sample_rate * 0.49);
        let g = (PI * cutoff / sample_rate).tan();
        self.coefficient = g / (1.0 + g);
    }

    pub fn reset(&mut self) {
        self.state = 0.0;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let v = (input - self.state) * self.coefficient;
        let low = v + self.state;
        self.state = low + v;
        input - low
    }
}
