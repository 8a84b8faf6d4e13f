// The host independent saturation engine
// The plugin, the offline renderer and the tests all drive this same type

use nih_plug::{nih_log, nih_warn};

use crate::fx::{
    dc_blocker::DcBlocker,
    gain::GainStage,
    morph::MorphShaper,
    oversampling::{OversampleMode, Oversampler},
};
use crate::params::{ParamSnapshot, LEFT_TYPE_DEFAULT, RIGHT_TYPE_DEFAULT};

/// Only the first two channels are ever processed
pub const MAX_CHANNELS: usize = 2;

pub struct SaturationEngine {
    sample_rate: f32,
    block_size: usize,
    prepared: bool,
    shaper: MorphShaper,
    dc_blockers: [DcBlocker; MAX_CHANNELS],
    oversampler_2x: Oversampler,
    oversampler_4x: Oversampler,
}

impl Default for SaturationEngine {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            block_size: 0,
            prepared: false,
            shaper: MorphShaper::new(LEFT_TYPE_DEFAULT, RIGHT_TYPE_DEFAULT),
            dc_blockers: [DcBlocker::default(); MAX_CHANNELS],
            oversampler_2x: Oversampler::new(OversampleMode::X2),
            oversampler_4x: Oversampler::new(OversampleMode::X4),
        }
    }
}

impl SaturationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)configures DC blockers and both oversamplers. Allocates, so never call this
    /// from the audio thread. Returns false and leaves the engine bypassed when the
    /// configuration is unusable.
    pub fn prepare(&mut self, sample_rate: f32, block_size: usize) -> bool {
        if !sample_rate.is_finite() || sample_rate <= 0.0 || block_size == 0 {
            nih_warn!(
                "Rejecting configuration: sample rate {} Hz, block size {}",
                sample_rate,
                block_size
            );
            self.prepared = false;
            return false;
        }

        self.sample_rate = sample_rate;
        self.block_size = block_size;
        for blocker in self.dc_blockers.iter_mut() {
            blocker.update(sample_rate);
            blocker.reset();
        }
        self.oversampler_2x.prepare(MAX_CHANNELS, block_size);
        self.oversampler_4x.prepare(MAX_CHANNELS, block_size);
        self.prepared = true;

        nih_log!("Prepared: {} Hz, {} samples per block", sample_rate, block_size);
        true
    }

    /// Clears every filter memory without reallocating
    pub fn reset(&mut self) {
        for blocker in self.dc_blockers.iter_mut() {
            blocker.reset();
        }
        self.oversampler_2x.reset();
        self.oversampler_4x.reset();
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Delay added by the half-band filters of the given mode, 0 when off
    pub fn latency_samples(&self, mode: OversampleMode) -> u32 {
        match mode {
            OversampleMode::Off => 0,
            OversampleMode::X2 => self.oversampler_2x.latency_samples(),
            OversampleMode::X4 => self.oversampler_4x.latency_samples(),
        }
    }

    /// Processes the first two channels in place, anything after that passes through.
    /// Never allocates, locks or fails: bad input turns into a no-op.
    pub fn process_block(&mut self, channels: &mut [&mut [f32]], snapshot: &ParamSnapshot) {
        let proc_channels = channels.len().min(MAX_CHANNELS);
        if proc_channels == 0 || !self.prepared {
            return;
        }

        let snapshot = snapshot.clamped();
        let gains = GainStage::new(snapshot.drive_db, snapshot.output_db);
        let morph = snapshot.morph;
        self.shaper.set_types(snapshot.left_type, snapshot.right_type);

        for (channel, samples) in channels.iter_mut().take(proc_channels).enumerate() {
            // Hosts may hand us more than they promised, split into prepared sizes
            for chunk in samples.chunks_mut(self.block_size) {
                match snapshot.oversample_mode {
                    OversampleMode::Off => {
                        self.shaper.process_slice(chunk, gains.drive, morph, gains.makeup)
                    }
                    OversampleMode::X2 => run_oversampled(
                        &mut self.oversampler_2x,
                        &self.shaper,
                        channel,
                        chunk,
                        &gains,
                        morph,
                    ),
                    OversampleMode::X4 => run_oversampled(
                        &mut self.oversampler_4x,
                        &self.shaper,
                        channel,
                        chunk,
                        &gains,
                        morph,
                    ),
                }
            }

            // DC block first, then output gain
            let blocker = &mut self.dc_blockers[channel];
            for sample in samples.iter_mut() {
                *sample = blocker.process(*sample) * gains.output;
            }
        }
    }
}

fn run_oversampled(
    oversampler: &mut Oversampler,
    shaper: &MorphShaper,
    channel: usize,
    chunk: &mut [f32],
    gains: &GainStage,
    morph: f32,
) {
    let upsampled = oversampler.upsample(channel, chunk);
    shaper.process_slice(upsampled, gains.drive, morph, gains.makeup);
    oversampler.downsample(channel, chunk);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::shapers::ShaperType;
    use num_complex::Complex;
    use std::f64::consts::PI;

    const SAMPLE_RATE: f32 = 48000.0;

    fn prepared(block_size: usize) -> SaturationEngine {
        let mut engine = SaturationEngine::new();
        assert!(engine.prepare(SAMPLE_RATE, block_size));
        engine
    }

    fn sine(freq: f64, amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|n| amplitude * (2.0 * PI * freq * n as f64 / SAMPLE_RATE as f64).sin() as f32)
            .collect()
    }

    fn process_mono(engine: &mut SaturationEngine, input: &[f32], snapshot: &ParamSnapshot) -> Vec<f32> {
        let mut samples = input.to_vec();
        {
            let mut channels: [&mut [f32]; 1] = [&mut samples];
            engine.process_block(&mut channels, snapshot);
        }
        samples
    }

    fn snapshot(mode: OversampleMode) -> ParamSnapshot {
        ParamSnapshot {
            oversample_mode: mode,
            ..ParamSnapshot::default()
        }
    }

    // Energy in the bins that are not multiples of the test tone's bin, up to Nyquist
    fn alias_energy(samples: &[f32], tone_bin: usize) -> f64 {
        let n = samples.len();
        let twiddles: Vec<Complex<f64>> = (0..n)
            .map(|i| Complex::from_polar(1.0, -2.0 * PI * i as f64 / n as f64))
            .collect();
        (1..=n / 2)
            .filter(|k| k % tone_bin != 0)
            .map(|k| {
                let bin: Complex<f64> = samples
                    .iter()
                    .enumerate()
                    .map(|(i, &x)| twiddles[(i * k) % n] * x as f64)
                    .sum();
                bin.norm_sqr()
            })
            .sum()
    }

    #[test]
    fn silence_in_silence_out() {
        for left_type in ShaperType::ALL {
            let mut engine = prepared(256);
            let params = ParamSnapshot {
                left_type,
                right_type: ShaperType::AsymTanh,
                drive_db: 36.0,
                output_db: 24.0,
                ..snapshot(OversampleMode::Off)
            };
            let output = process_mono(&mut engine, &[0.0; 1024], &params);
            assert!(output.iter().all(|&x| x == 0.0), "{left_type:?} leaked DC");
        }
    }

    #[test]
    fn matching_shapers_at_unity_drive_equal_a_single_shaper() {
        let input = sine(220.0, 0.8, 2048);
        for shaper in ShaperType::ALL {
            for morph in [0.0_f32, 0.37, 1.0] {
                let mut engine = prepared(512);
                let params = ParamSnapshot {
                    drive_db: 0.0,
                    morph,
                    left_type: shaper,
                    right_type: shaper,
                    output_db: 0.0,
                    oversample_mode: OversampleMode::Off,
                };
                let output = process_mono(&mut engine, &input, &params);

                let mut blocker = DcBlocker::new(SAMPLE_RATE);
                let expected: Vec<f32> = input.iter().map(|&x| blocker.process(shaper.apply(x))).collect();
                assert_eq!(output, expected, "{shaper:?} with morph {morph}");
            }
        }
    }

    #[test]
    fn output_gain_is_applied_after_the_dc_blocker() {
        let input = sine(440.0, 0.5, 1024);
        let base = ParamSnapshot {
            drive_db: 0.0,
            left_type: ShaperType::HardClip,
            right_type: ShaperType::HardClip,
            ..snapshot(OversampleMode::Off)
        };
        let unity = process_mono(&mut prepared(256), &input, &base);
        let boosted = process_mono(
            &mut prepared(256),
            &input,
            &ParamSnapshot {
                output_db: 20.0,
                ..base
            },
        );
        let gain = nih_plug::util::db_to_gain(20.0);
        for (u, b) in unity.iter().zip(boosted.iter()) {
            assert_eq!(u * gain, *b);
        }
    }

    #[test]
    fn oversampling_leaves_gentle_low_frequency_content_alone() {
        let input = sine(93.75, 0.25, 8192);
        let gentle = |mode| ParamSnapshot {
            drive_db: 0.0,
            left_type: ShaperType::Tanh,
            right_type: ShaperType::Tanh,
            ..snapshot(mode)
        };
        let reference = process_mono(&mut prepared(512), &input, &gentle(OversampleMode::Off));

        for mode in [OversampleMode::X2, OversampleMode::X4] {
            let mut engine = prepared(512);
            let latency = engine.latency_samples(mode) as usize;
            let output = process_mono(&mut engine, &input, &gentle(mode));
            for n in 4096..8192 {
                let diff = (output[n] - reference[n - latency]).abs();
                assert!(diff < 0.01, "{mode:?} differs by {diff} at {n}");
            }
        }
    }

    #[test]
    fn oversampling_reduces_aliasing_at_high_drive() {
        // The tone sits exactly on bin 171 of a 2048 point DFT so harmonics don't leak
        const N: usize = 2048;
        const TONE_BIN: usize = 171;
        let freq = TONE_BIN as f64 * SAMPLE_RATE as f64 / N as f64;
        let input = sine(freq, 0.5, N * 5);
        let hot = |mode| ParamSnapshot {
            drive_db: 36.0,
            morph: 0.0,
            left_type: ShaperType::HardClip,
            right_type: ShaperType::HardClip,
            output_db: 0.0,
            oversample_mode: mode,
        };

        let energy = |mode| {
            let output = process_mono(&mut prepared(512), &input, &hot(mode));
            alias_energy(&output[N * 4..], TONE_BIN)
        };
        let off = energy(OversampleMode::Off);
        let x2 = energy(OversampleMode::X2);
        let x4 = energy(OversampleMode::X4);

        assert!(off > 0.0);
        assert!(x2 < off * 0.7, "x2 {x2} vs off {off}");
        assert!(x4 < off * 0.5, "x4 {x4} vs off {off}");
        assert!(x4 < x2, "x4 {x4} vs x2 {x2}");
    }

    #[test]
    fn extreme_settings_stay_finite() {
        let square: Vec<f32> = (0..4096).map(|n| if (n / 37) % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let params = ParamSnapshot {
            drive_db: 36.0,
            morph: 1.0,
            left_type: ShaperType::HardClip,
            right_type: ShaperType::HardClip,
            output_db: 24.0,
            oversample_mode: OversampleMode::X4,
        };
        let mut engine = prepared(512);
        let mut left = square.clone();
        let mut right: Vec<f32> = square.iter().map(|x| -x).collect();
        {
            let mut channels: [&mut [f32]; 2] = [&mut left, &mut right];
            engine.process_block(&mut channels, &params);
        }
        assert!(left.iter().chain(right.iter()).all(|x| x.is_finite()));
    }

    #[test]
    fn channels_past_the_second_pass_through() {
        let mut engine = prepared(128);
        let original = sine(1000.0, 0.9, 128);
        let mut left = original.clone();
        let mut right = original.clone();
        let mut third = original.clone();
        let mut fourth = original.clone();
        {
            let mut channels: [&mut [f32]; 4] = [&mut left, &mut right, &mut third, &mut fourth];
            engine.process_block(&mut channels, &snapshot(OversampleMode::X2));
        }
        assert_ne!(left, original);
        assert_ne!(right, original);
        assert_eq!(third, original);
        assert_eq!(fourth, original);
    }

    #[test]
    fn zero_channels_is_a_no_op() {
        let mut engine = prepared(64);
        let mut channels: [&mut [f32]; 0] = [];
        engine.process_block(&mut channels, &ParamSnapshot::default());
    }

    #[test]
    fn invalid_configuration_bypasses_processing() {
        let mut engine = SaturationEngine::new();
        assert!(!engine.prepare(0.0, 512));
        assert!(!engine.prepare(f32::NAN, 512));
        assert!(!engine.prepare(48000.0, 0));
        assert!(!engine.is_prepared());

        let input = sine(500.0, 0.7, 256);
        let output = process_mono(&mut engine, &input, &snapshot(OversampleMode::X4));
        assert_eq!(output, input);
    }

    #[test]
    fn oversized_buffers_are_processed_in_prepared_chunks() {
        let input = sine(3000.0, 0.6, 256);
        let params = ParamSnapshot {
            drive_db: 18.0,
            ..snapshot(OversampleMode::X4)
        };

        let whole = process_mono(&mut prepared(64), &input, &params);

        let mut engine = prepared(64);
        let mut pieces = Vec::new();
        for chunk in input.chunks(64) {
            pieces.extend(process_mono(&mut engine, chunk, &params));
        }
        assert_eq!(whole, pieces);
    }

    #[test]
    fn switching_modes_keeps_each_oversampler_continuous() {
        let input = sine(700.0, 0.5, 512);
        let (first, second) = input.split_at(256);
        let x2 = snapshot(OversampleMode::X2);

        // Reference: two X2 calls back to back on a fresh oversampler
        let mut reference = Oversampler::new(OversampleMode::X2);
        reference.prepare(MAX_CHANNELS, 256);
        let shaper = MorphShaper::new(x2.left_type, x2.right_type);
        let gains = GainStage::new(x2.drive_db, x2.output_db);
        let mut expected_second = second.to_vec();
        let mut scratch = first.to_vec();
        run_oversampled(&mut reference, &shaper, 0, &mut scratch, &gains, x2.morph);
        run_oversampled(&mut reference, &shaper, 0, &mut expected_second, &gains, x2.morph);

        // Engine: X2, then an Off block in between, then X2 again
        let mut engine = prepared(256);
        process_mono(&mut engine, first, &x2);
        process_mono(&mut engine, &sine(100.0, 0.3, 256), &snapshot(OversampleMode::Off));
        let mut upsampled_second = second.to_vec();
        run_oversampled(
            &mut engine.oversampler_2x,
            &engine.shaper,
            0,
            &mut upsampled_second,
            &gains,
            x2.morph,
        );
        assert_eq!(upsampled_second, expected_second);
    }

    #[test]
    fn latency_is_reported_per_mode() {
        let engine = prepared(512);
        assert_eq!(engine.latency_samples(OversampleMode::Off), 0);
        assert_eq!(engine.latency_samples(OversampleMode::X2), 4);
        assert_eq!(engine.latency_samples(OversampleMode::X4), 5);
    }
}
