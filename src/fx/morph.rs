// Morphing between two waveshapers on the same driven sample

use super::shapers::{ShaperFn, ShaperType};

#[inline]
pub fn blend(a: f32, b: f32, m: f32) -> f32 {
    // Exact at the right end so a full morph reproduces the right curve bit for bit
    if m >= 1.0 {
        b
    } else {
        a + m * (b - a)
    }
}

#[derive(Clone)]
pub(crate) struct MorphShaper {
    left_type: ShaperType,
    right_type: ShaperType,
    left_fn: ShaperFn,
    right_fn: ShaperFn,
}

impl MorphShaper {
    pub fn new(left_type: ShaperType, right_type: ShaperType) -> Self {
        Self {
            left_type,
            right_type,
            left_fn: left_type.process_fn(),
            right_fn: right_type.process_fn(),
        }
    }

    // Function pointers only get swapped when the selection actually changes
    pub fn set_types(&mut self, left_type: ShaperType, right_type: ShaperType) {
        if self.left_type != left_type {
            self.left_type = left_type;
            self.left_fn = left_type.process_fn();
        }
        if self.right_type != right_type {
            self.right_type = right_type;
            self.right_fn = right_type.process_fn();
        }
    }

    #[inline]
    pub fn process(&self, input: f32, drive: f32, morph: f32, makeup: f32) -> f32 {
        let x = input * drive;
        let a = (self.left_fn)(x);
        let b = (self.right_fn)(x);
        blend(a, b, morph) * makeup
    }

    pub fn process_slice(&self, samples: &mut [f32], drive: f32, morph: f32, makeup: f32) {
        for sample in samples.iter_mut() {
            *sample = self.process(*sample, drive, morph, makeup);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    #[test]
    fn blend_hits_both_endpoints_exactly() {
        let mut rng = Pcg64::seed_from_u64(7);
        for _ in 0..1000 {
            let a: f32 = rng.gen_range(-1.0..1.0);
            let b: f32 = rng.gen_range(-1.0..1.0);
            assert_eq!(blend(a, b, 0.0), a);
            assert_eq!(blend(a, b, 1.0), b);
        }
    }

    #[test]
    fn blend_is_monotonic_in_morph() {
        let mut rng = Pcg64::seed_from_u64(11);
        for _ in 0..500 {
            let a: f32 = rng.gen_range(-1.0..1.0);
            let b: f32 = rng.gen_range(-1.0..1.0);
            let mut previous = blend(a, b, 0.0);
            for step in 1..=64 {
                let current = blend(a, b, step as f32 / 64.0);
                if b >= a {
                    assert!(current >= previous, "a={a} b={b} step={step}");
                } else {
                    assert!(current <= previous, "a={a} b={b} step={step}");
                }
                previous = current;
            }
        }
    }

    #[test]
    fn matching_shapers_make_morph_inert() {
        let shaper = MorphShaper::new(ShaperType::Atan, ShaperType::Atan);
        for x in [-0.9_f32, -0.2, 0.0, 0.31, 0.77] {
            let reference = shaper.process(x, 2.0, 0.0, 0.5);
            for m in [0.1_f32, 0.5, 0.9, 1.0] {
                assert_eq!(shaper.process(x, 2.0, m, 0.5), reference);
            }
        }
    }

    #[test]
    fn both_sides_see_the_same_driven_input() {
        let shaper = MorphShaper::new(ShaperType::HardClip, ShaperType::Rational);
        let x = 0.3_f32;
        let drive = 4.0_f32;
        let expected = blend(
            ShaperType::HardClip.apply(x * drive),
            ShaperType::Rational.apply(x * drive),
            0.25,
        );
        assert_eq!(shaper.process(x, drive, 0.25, 1.0), expected);
    }

    #[test]
    fn set_types_switches_curves() {
        let mut shaper = MorphShaper::new(ShaperType::Tanh, ShaperType::Tanh);
        shaper.set_types(ShaperType::HardClip, ShaperType::CubicSoftClip);
        assert_eq!(shaper.process(3.0, 1.0, 0.0, 1.0), 1.0);
        assert!((shaper.process(3.0, 1.0, 1.0, 1.0) - 2.0 / 3.0).abs() < 1.0e-6);
    }

    #[test]
    fn process_slice_applies_makeup() {
        let shaper = MorphShaper::new(ShaperType::HardClip, ShaperType::HardClip);
        let mut samples = [0.5_f32, -2.0, 0.1];
        shaper.process_slice(&mut samples, 1.0, 0.5, 0.5);
        assert_eq!(samples, [0.25, -0.5, 0.05]);
    }
}
