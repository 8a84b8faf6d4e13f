pub mod dc_blocker;
pub mod gain;
pub mod morph;
pub mod oversampling;
pub mod shapers;
