/*
Copyright (C) 2024 SatuMorpher

This program is free software:
you can redistribute it and/or modify it under the terms of the GNU General Public License
as published by the Free Software Foundation,either version 3 of the License, or (at your option) any later version.

This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
See the GNU General Public License for more details.

You should have received a copy of the GNU General Public License along with this program.
If not, see https://www.gnu.org/licenses/.

#####################################

SatuMorpher - Morphing dual waveshaper saturation
Version 0.1.0

#####################################

Two waveshapers run on the same driven signal and a morph control crossfades between them.
Optional 2x/4x oversampling keeps the aliasing down when you push the drive.

#####################################
*/

use nih_plug::prelude::*;
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

pub mod engine;
pub mod fx;
pub mod params;
pub mod preset;
mod editor;

use engine::SaturationEngine;
use fx::oversampling::OversampleMode;
use params::{ParamSnapshot, SatuMorpherParams};

pub struct SatuMorpher {
    params: Arc<SatuMorpherParams>,
    engine: SaturationEngine,

    // Shared with the editor so it can show what the host was told
    reported_latency: Arc<AtomicU32>,
    latency_mode: OversampleMode,
}

impl Default for SatuMorpher {
    fn default() -> Self {
        Self {
            params: Arc::new(SatuMorpherParams::default()),
            engine: SaturationEngine::new(),
            reported_latency: Arc::new(AtomicU32::new(0)),
            latency_mode: OversampleMode::Off,
        }
    }
}

impl SatuMorpher {
    fn update_latency(&mut self, mode: OversampleMode) -> u32 {
        let latency = self.engine.latency_samples(mode);
        self.latency_mode = mode;
        self.reported_latency.store(latency, Ordering::Relaxed);
        latency
    }
}

impl Plugin for SatuMorpher {
    const NAME: &'static str = "SatuMorpher";
    const VENDOR: &'static str = "SatuMorpher";
    const URL: &'static str = "https://github.com/satumorpher/satumorpher";
    const EMAIL: &'static str = "info@satumorpher.com";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;
    const MIDI_INPUT: MidiConfig = MidiConfig::None;
    const MIDI_OUTPUT: MidiConfig = MidiConfig::None;

    type SysExMessage = ();
    type BackgroundTask = ();

    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            ..AudioIOLayout::const_default()
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            ..AudioIOLayout::const_default()
        },
    ];

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    fn editor(&mut self, _async_executor: AsyncExecutor<Self>) -> Option<Box<dyn Editor>> {
        editor::create(self.params.clone(), self.reported_latency.clone())
    }

    fn initialize(
        &mut self,
        _audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        context: &mut impl InitContext<Self>,
    ) -> bool {
        if !self
            .engine
            .prepare(buffer_config.sample_rate, buffer_config.max_buffer_size as usize)
        {
            return false;
        }

        let latency = self.update_latency(self.params.oversample_mode.value());
        context.set_latency_samples(latency);
        nih_log!("Reporting {} samples of latency", latency);
        true
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let snapshot = ParamSnapshot::from_params(&self.params);

        if snapshot.oversample_mode != self.latency_mode {
            let latency = self.update_latency(snapshot.oversample_mode);
            context.set_latency_samples(latency);
        }

        self.engine.process_block(buffer.as_slice(), &snapshot);
        ProcessStatus::Normal
    }

    // Called by the host when playback restarts
    fn reset(&mut self) {
        self.engine.reset();
    }
}

impl ClapPlugin for SatuMorpher {
    const CLAP_ID: &'static str = "com.satumorpher.satumorpher";
    const CLAP_DESCRIPTION: Option<&'static str> = Some("Morphing dual waveshaper saturation");
    const CLAP_MANUAL_URL: Option<&'static str> = Some(Self::URL);
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Distortion,
        ClapFeature::Stereo,
        ClapFeature::Mono,
    ];
}

impl Vst3Plugin for SatuMorpher {
    const VST3_CLASS_ID: [u8; 16] = *b"SatuMorpherFxAAA";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] = &[
        Vst3SubCategory::Fx,
        Vst3SubCategory::Distortion,
    ];
}

nih_export_clap!(SatuMorpher);
nih_export_vst3!(SatuMorpher);
