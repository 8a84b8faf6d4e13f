// Preset save/load
// Binary presets are MessagePack through serde, then gzip
// JSON is for hand edited presets used by the offline renderer

use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use nih_plug::prelude::{Param, ParamSetter};
use serde::{Deserialize, Serialize};
use std::{
    io::{Read, Write},
    path::Path,
};
use thiserror::Error;

use crate::fx::{oversampling::OversampleMode, shapers::ShaperType};
use crate::params::{ParamSnapshot, SatuMorpherParams};

pub const PRESET_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("preset i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode preset: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("could not decode preset: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("invalid preset json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported preset version {0}")]
    UnsupportedVersion(u32),
}

/// Opaque copy of every parameter value. Saving then loading gives back the exact same values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SatuPreset {
    pub version: u32,
    pub drive_db: f32,
    pub morph: f32,
    pub left_type: ShaperType,
    pub right_type: ShaperType,
    pub output_db: f32,
    pub oversample_mode: OversampleMode,
}

impl Default for SatuPreset {
    fn default() -> Self {
        Self::from_snapshot(&ParamSnapshot::default())
    }
}

impl SatuPreset {
    pub fn from_snapshot(snapshot: &ParamSnapshot) -> Self {
        Self {
            version: PRESET_VERSION,
            drive_db: snapshot.drive_db,
            morph: snapshot.morph,
            left_type: snapshot.left_type,
            right_type: snapshot.right_type,
            output_db: snapshot.output_db,
            oversample_mode: snapshot.oversample_mode,
        }
    }

    pub fn from_params(params: &SatuMorpherParams) -> Self {
        Self::from_snapshot(&ParamSnapshot::from_params(params))
    }

    pub fn to_snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            drive_db: self.drive_db,
            morph: self.morph,
            left_type: self.left_type,
            right_type: self.right_type,
            output_db: self.output_db,
            oversample_mode: self.oversample_mode,
        }
    }

    /// Pushes the preset into the live parameters. GUI thread only.
    pub fn apply(&self, setter: &ParamSetter, params: &SatuMorpherParams) {
        set_param(setter, &params.drive, self.drive_db);
        set_param(setter, &params.morph, self.morph);
        set_param(setter, &params.left_type, self.left_type);
        set_param(setter, &params.right_type, self.right_type);
        set_param(setter, &params.output, self.output_db);
        set_param(setter, &params.oversample_mode, self.oversample_mode);
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PresetError> {
        let serialized = rmp_serde::to_vec(self)?;
        Ok(compress_bytes(&serialized)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PresetError> {
        let decompressed = decompress_bytes(bytes)?;
        let preset: SatuPreset = rmp_serde::from_slice(&decompressed)?;
        preset.checked()
    }

    pub fn to_json(&self) -> Result<String, PresetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PresetError> {
        let preset: SatuPreset = serde_json::from_str(json)?;
        preset.checked()
    }

    pub fn save(&self, path: &Path) -> Result<(), PresetError> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, PresetError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    fn checked(self) -> Result<Self, PresetError> {
        if self.version > PRESET_VERSION {
            return Err(PresetError::UnsupportedVersion(self.version));
        }
        Ok(self)
    }
}

fn set_param<P: Param>(setter: &ParamSetter, param: &P, value: P::Plain) {
    setter.begin_set_parameter(param);
    setter.set_parameter(param, value);
    setter.end_set_parameter(param);
}

// Functions to compress bytes and decompress using gz
fn compress_bytes(data: &[u8]) -> Result<Vec<u8>, std::io::Error> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data)?;
    encoder.finish()
}

fn decompress_bytes(compressed_data: &[u8]) -> Result<Vec<u8>, std::io::Error> {
    let mut decoder = GzDecoder::new(compressed_data);
    let mut decompressed_data = Vec::new();
    decoder.read_to_end(&mut decompressed_data)?;
    Ok(decompressed_data)
}
