// Drive, makeup and output gain staging

use nih_plug::util::db_to_gain;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainStage {
    pub drive: f32,
    pub makeup: f32,
    pub output: f32,
}

impl GainStage {
    pub fn new(drive_db: f32, output_db: f32) -> Self {
        let drive = db_to_gain(drive_db);
        Self {
            drive,
            // Drive is at least 0 dB so this never divides by zero
            makeup: 1.0 / drive.sqrt(),
            output: db_to_gain(output_db),
        }
    }
}
