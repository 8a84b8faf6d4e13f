// Parameter layout and the per-block snapshot the engine works from

use nih_plug::prelude::*;
use nih_plug_egui::EguiState;
use std::sync::Arc;

use crate::editor;
use crate::fx::{oversampling::OversampleMode, shapers::ShaperType};

pub const DRIVE_MIN_DB: f32 = 0.0;
pub const DRIVE_MAX_DB: f32 = 36.0;
pub const DRIVE_DEFAULT_DB: f32 = 6.0;

pub const MORPH_MIN: f32 = 0.0;
pub const MORPH_MAX: f32 = 1.0;
pub const MORPH_DEFAULT: f32 = 0.5;

pub const OUTPUT_MIN_DB: f32 = -24.0;
pub const OUTPUT_MAX_DB: f32 = 24.0;
pub const OUTPUT_DEFAULT_DB: f32 = 0.0;

pub const LEFT_TYPE_DEFAULT: ShaperType = ShaperType::Tanh;
pub const RIGHT_TYPE_DEFAULT: ShaperType = ShaperType::AsymTanh;
pub const OVERSAMPLE_MODE_DEFAULT: OversampleMode = OversampleMode::Off;

#[derive(Params)]
pub struct SatuMorpherParams {
    #[persist = "editor-state"]
    pub(crate) editor_state: Arc<EguiState>,

    #[id = "drive"]
    pub drive: FloatParam,
    #[id = "morph"]
    pub morph: FloatParam,
    #[id = "leftType"]
    pub left_type: EnumParam<ShaperType>,
    #[id = "rightType"]
    pub right_type: EnumParam<ShaperType>,
    #[id = "output"]
    pub output: FloatParam,
    #[id = "oversampleMode"]
    pub oversample_mode: EnumParam<OversampleMode>,
}

impl Default for SatuMorpherParams {
    fn default() -> Self {
        Self {
            editor_state: editor::default_state(),

            drive: FloatParam::new(
                "Drive",
                DRIVE_DEFAULT_DB,
                FloatRange::Linear {
                    min: DRIVE_MIN_DB,
                    max: DRIVE_MAX_DB,
                },
            )
            .with_step_size(0.01)
            .with_unit(" dB")
            .with_value_to_string(formatters::v2s_f32_rounded(2)),
            morph: FloatParam::new(
                "Morph",
                MORPH_DEFAULT,
                FloatRange::Linear {
                    min: MORPH_MIN,
                    max: MORPH_MAX,
                },
            )
            .with_step_size(0.001)
            .with_value_to_string(formatters::v2s_f32_rounded(3)),
            left_type: EnumParam::new("Left Type", LEFT_TYPE_DEFAULT),
            right_type: EnumParam::new("Right Type", RIGHT_TYPE_DEFAULT),
            output: FloatParam::new(
                "Output",
                OUTPUT_DEFAULT_DB,
                FloatRange::Linear {
                    min: OUTPUT_MIN_DB,
                    max: OUTPUT_MAX_DB,
                },
            )
            .with_step_size(0.01)
            .with_unit(" dB")
            .with_value_to_string(formatters::v2s_f32_rounded(2)),
            oversample_mode: EnumParam::new("Oversampling", OVERSAMPLE_MODE_DEFAULT),
        }
    }
}

/// Everything the engine needs for one block, read once from the atomic parameter cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSnapshot {
    pub drive_db: f32,
    pub morph: f32,
    pub left_type: ShaperType,
    pub right_type: ShaperType,
    pub output_db: f32,
    pub oversample_mode: OversampleMode,
}

impl Default for ParamSnapshot {
    fn default() -> Self {
        Self {
            drive_db: DRIVE_DEFAULT_DB,
            morph: MORPH_DEFAULT,
            left_type: LEFT_TYPE_DEFAULT,
            right_type: RIGHT_TYPE_DEFAULT,
            output_db: OUTPUT_DEFAULT_DB,
            oversample_mode: OVERSAMPLE_MODE_DEFAULT,
        }
    }
}

impl ParamSnapshot {
    // Unsmoothed values, values may move in the middle of a block and we accept that
    pub fn from_params(params: &SatuMorpherParams) -> Self {
        Self {
            drive_db: params.drive.value(),
            morph: params.morph.value(),
            left_type: params.left_type.value(),
            right_type: params.right_type.value(),
            output_db: params.output.value(),
            oversample_mode: params.oversample_mode.value(),
        }
    }

    /// Forces every field into its declared range. Non-finite values fall back to the default.
    pub fn clamped(&self) -> Self {
        Self {
            drive_db: clamp_or_default(self.drive_db, DRIVE_MIN_DB, DRIVE_MAX_DB, DRIVE_DEFAULT_DB),
            morph: clamp_or_default(self.morph, MORPH_MIN, MORPH_MAX, MORPH_DEFAULT),
            output_db: clamp_or_default(self.output_db, OUTPUT_MIN_DB, OUTPUT_MAX_DB, OUTPUT_DEFAULT_DB),
            ..*self
        }
    }
}

fn clamp_or_default(value: f32, min: f32, max: f32, default: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        default
    }
}
