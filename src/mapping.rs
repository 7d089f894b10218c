use serde::{Deserialize, Serialize};

use crate::peaks::Peak;

/// The two interpolation domains: infrared wavenumbers on one side, audible
/// frequencies on the other. Invariants: `ir_min < ir_max`,
/// `0 < audio_min < audio_max`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MappingConfig {
    pub ir_min: f32,
    pub ir_max: f32,
    pub audio_min: f32,
    pub audio_max: f32,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            ir_min: 400.0,
            ir_max: 4000.0,
            audio_min: 100.0,
            audio_max: 8000.0,
        }
    }
}

/// A peak with its audible frequency attached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MappedPeak {
    pub wavenumber: f32,
    pub absorbance: f32,
    pub audio_frequency: f32,
}

/// Linear interpolation between the IR and audio domains, clamped so that
/// out-of-range wavenumbers from noisy input still land inside
/// `[audio_min, audio_max]`. Keeping the mapping linear preserves the
/// relative spacing of the peaks, so the chord keeps the shape of the
/// spectrum.
pub fn map_wavenumber(wavenumber: f32, config: &MappingConfig) -> f32 {
    let t = ((wavenumber - config.ir_min) / (config.ir_max - config.ir_min)).clamp(0.0, 1.0);
    config.audio_min + t * (config.audio_max - config.audio_min)
}

pub fn map_peak(peak: Peak, config: &MappingConfig) -> MappedPeak {
    MappedPeak {
        wavenumber: peak.wavenumber,
        absorbance: peak.absorbance,
        audio_frequency: map_wavenumber(peak.wavenumber, config),
    }
}

pub fn map_peaks(peaks: &[Peak], config: &MappingConfig) -> Vec<MappedPeak> {
    peaks.iter().map(|p| map_peak(*p, config)).collect()
}
