// Offline renderer: runs a WAV file through the same engine the plugin uses
// Usage: satu_render <input.wav> <output.wav> [preset.json]

use anyhow::{bail, Context};
use std::path::PathBuf;

use satu_morpher::engine::SaturationEngine;
use satu_morpher::preset::SatuPreset;

const BLOCK_SIZE: usize = 512;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let (input, output) = match (args.next(), args.next()) {
        (Some(input), Some(output)) => (PathBuf::from(input), PathBuf::from(output)),
        _ => bail!("usage: satu_render <input.wav> <output.wav> [preset.json]"),
    };

    let preset = match args.next() {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("could not read preset {}", path))?;
            SatuPreset::from_json(&json).with_context(|| format!("could not parse preset {}", path))?
        }
        None => SatuPreset::default(),
    };

    let mut reader = hound::WavReader::open(&input)
        .with_context(|| format!("could not open {}", input.display()))?;
    let spec = reader.spec();
    let num_channels = spec.channels as usize;
    if num_channels == 0 {
        bail!("{} has no channels", input.display());
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|s| s as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    let frames = interleaved.len() / num_channels;
    let mut channels: Vec<Vec<f32>> = (0..num_channels)
        .map(|channel| {
            interleaved
                .iter()
                .skip(channel)
                .step_by(num_channels)
                .copied()
                .collect()
        })
        .collect();

    eprintln!(
        "Rendering {} frames, {} channels at {} Hz with {:?}",
        frames, num_channels, spec.sample_rate, preset
    );

    let mut engine = SaturationEngine::new();
    if !engine.prepare(spec.sample_rate as f32, BLOCK_SIZE) {
        bail!("unsupported sample rate {}", spec.sample_rate);
    }
    let snapshot = preset.to_snapshot();

    let mut start = 0;
    while start < frames {
        let end = (start + BLOCK_SIZE).min(frames);
        let mut block: Vec<&mut [f32]> = channels
            .iter_mut()
            .map(|channel| &mut channel[start..end])
            .collect();
        engine.process_block(&mut block, &snapshot);
        start = end;
    }

    let out_spec = hound::WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&output, out_spec)
        .with_context(|| format!("could not create {}", output.display()))?;
    for frame in 0..frames {
        for channel in channels.iter() {
            writer.write_sample(channel[frame])?;
        }
    }
    writer.finalize()?;

    eprintln!(
        "Wrote {} ({} samples of latency)",
        output.display(),
        engine.latency_samples(snapshot.oversample_mode)
    );
    Ok(())
}
