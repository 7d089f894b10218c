use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::mapping::MappingConfig;
use crate::peaks::DetectionConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// FFT size; snapshots carry `transform_size / 2` bins
    pub transform_size: usize,
    /// Highest frequency the visualization draws
    pub display_cutoff_hz: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            transform_size: 2048,
            display_cutoff_hz: 10_000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Seconds
    pub duration: f64,
    /// 0.0 -> 1.0
    pub volume: f32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            duration: 5.0,
            volume: 0.7,
        }
    }
}

/// Process-wide configuration. Immutable once handed to a controller;
/// replacing it takes effect on the next `play`, never on an in-flight
/// session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SonifierConfig {
    pub mapping: MappingConfig,
    pub detection: DetectionConfig,
    pub analyzer: AnalyzerConfig,
    pub playback: PlaybackConfig,
}

impl SonifierConfig {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let ron_string = fs::read_to_string(path)?;
        let config: SonifierConfig = ron::from_str(&ron_string)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, ron_string)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_tuning_values() {
        let config = SonifierConfig::default();
        assert_eq!(config.mapping.ir_min, 400.0);
        assert_eq!(config.mapping.ir_max, 4000.0);
        assert_eq!(config.mapping.audio_min, 100.0);
        assert_eq!(config.mapping.audio_max, 8000.0);
        assert_eq!(config.detection.threshold, 0.3);
        assert_eq!(config.detection.max_peaks, 10);
        assert_eq!(config.analyzer.transform_size, 2048);
    }

    #[test]
    fn ron_round_trip() {
        let mut config = SonifierConfig::default();
        config.detection.threshold = 0.45;
        config.playback.volume = 0.25;

        let ron_string =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        let parsed: SonifierConfig = ron::from_str(&ron_string).unwrap();
        assert_eq!(parsed.detection.threshold, 0.45);
        assert_eq!(parsed.playback.volume, 0.25);
        assert_eq!(parsed.mapping.ir_max, 4000.0);
    }
}
