use serde::{Deserialize, Serialize};

use crate::spectrum::SpectrumSample;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Minimum absorbance (0 -> 1) a candidate must reach
    pub threshold: f32,
    /// Upper bound on returned peaks
    pub max_peaks: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            max_peaks: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub wavenumber: f32,
    pub absorbance: f32,
}

/// Extracts absorption peaks from a raw spectrum. Input ordering does not
/// matter; samples are normalized to ascending wavenumber internally. A
/// candidate is a strict local minimum of transmittance at an interior
/// sample. Survivors are ranked by absorbance, capped at `max_peaks`, then
/// returned sorted by wavenumber descending (IR convention, high first).
///
/// Fewer than three samples, or a spectrum with no local minima above the
/// threshold, yields an empty result rather than an error.
pub fn extract(spectrum: &[SpectrumSample], config: &DetectionConfig) -> Vec<Peak> {
    if spectrum.len() < 3 {
        return Vec::new();
    }

    let mut samples = spectrum.to_vec();
    samples.sort_by(|a, b| a.wavenumber.partial_cmp(&b.wavenumber).unwrap());

    let mut candidates: Vec<Peak> = Vec::new();
    for i in 1..samples.len() - 1 {
        let t = samples[i].transmittance;
        if t < samples[i - 1].transmittance && t < samples[i + 1].transmittance {
            let absorbance = samples[i].absorbance();
            if absorbance >= config.threshold {
                candidates.push(Peak {
                    wavenumber: samples[i].wavenumber,
                    absorbance,
                });
            }
        }
    }

    candidates.sort_by(|a, b| b.absorbance.partial_cmp(&a.absorbance).unwrap());
    candidates.truncate(config.max_peaks);
    candidates.sort_by(|a, b| b.wavenumber.partial_cmp(&a.wavenumber).unwrap());
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(wavenumber: f32, transmittance: f32) -> SpectrumSample {
        SpectrumSample::new(wavenumber, transmittance)
    }

    fn config(threshold: f32, max_peaks: usize) -> DetectionConfig {
        DetectionConfig {
            threshold,
            max_peaks,
        }
    }

    #[test]
    fn finds_interior_local_minima() {
        let spectrum = vec![
            sample(400.0, 80.0),
            sample(500.0, 30.0),
            sample(600.0, 90.0),
            sample(700.0, 45.0),
            sample(800.0, 95.0),
        ];
        let peaks = extract(&spectrum, &config(0.1, 10));
        assert_eq!(peaks.len(), 2);
        // Wavenumber descending
        assert_eq!(peaks[0].wavenumber, 700.0);
        assert_eq!(peaks[1].wavenumber, 500.0);
        assert!((peaks[0].absorbance - 0.55).abs() < 1e-6);
        assert!((peaks[1].absorbance - 0.70).abs() < 1e-6);
    }

    #[test]
    fn tolerates_unsorted_input() {
        let spectrum = vec![
            sample(800.0, 95.0),
            sample(500.0, 30.0),
            sample(400.0, 80.0),
            sample(700.0, 45.0),
            sample(600.0, 90.0),
        ];
        let peaks = extract(&spectrum, &config(0.1, 10));
        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[0].wavenumber, 700.0);
        assert_eq!(peaks[1].wavenumber, 500.0);
    }

    #[test]
    fn threshold_filters_shallow_peaks() {
        let spectrum = vec![
            sample(400.0, 80.0),
            sample(500.0, 30.0),
            sample(600.0, 90.0),
            sample(700.0, 45.0),
            sample(800.0, 95.0),
        ];
        let peaks = extract(&spectrum, &config(0.6, 10));
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].wavenumber, 500.0);
        for peak in &peaks {
            assert!(peak.absorbance >= 0.6);
        }
    }

    #[test]
    fn max_peaks_keeps_the_deepest() {
        let spectrum = vec![
            sample(400.0, 80.0),
            sample(500.0, 30.0),
            sample(600.0, 90.0),
            sample(700.0, 45.0),
            sample(800.0, 95.0),
        ];
        let peaks = extract(&spectrum, &config(0.1, 1));
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].wavenumber, 500.0);
    }

    #[test]
    fn max_peaks_larger_than_candidates_returns_all() {
        let spectrum = vec![
            sample(400.0, 80.0),
            sample(500.0, 30.0),
            sample(600.0, 90.0),
        ];
        let peaks = extract(&spectrum, &config(0.1, 100));
        assert_eq!(peaks.len(), 1);
    }

    #[test]
    fn three_points_with_interior_maximum_yield_nothing() {
        // The only interior sample (2000 cm^-1) is a transmittance maximum,
        // so there is no candidate at all.
        let spectrum = vec![
            sample(3000.0, 20.0),
            sample(2000.0, 90.0),
            sample(1000.0, 50.0),
        ];
        let peaks = extract(&spectrum, &config(0.3, 5));
        assert!(peaks.is_empty());
    }

    #[test]
    fn fewer_than_three_samples_yield_nothing() {
        assert!(extract(&[], &config(0.1, 10)).is_empty());
        assert!(extract(&[sample(400.0, 20.0)], &config(0.1, 10)).is_empty());
        assert!(
            extract(
                &[sample(400.0, 20.0), sample(500.0, 10.0)],
                &config(0.1, 10)
            )
            .is_empty()
        );
    }

    #[test]
    fn flat_spectrum_yields_nothing() {
        let spectrum: Vec<SpectrumSample> =
            (0..20).map(|i| sample(400.0 + i as f32 * 10.0, 50.0)).collect();
        assert!(extract(&spectrum, &config(0.0, 10)).is_empty());
    }

    #[test]
    fn peak_count_never_exceeds_bound() {
        // Sawtooth transmittance: every odd sample is a local minimum.
        let spectrum: Vec<SpectrumSample> = (0..40)
            .map(|i| {
                let t = if i % 2 == 1 { 20.0 } else { 80.0 };
                sample(400.0 + i as f32 * 10.0, t)
            })
            .collect();
        for k in [1, 3, 7, 50] {
            let peaks = extract(&spectrum, &config(0.1, k));
            assert!(peaks.len() <= k);
        }
    }
}
