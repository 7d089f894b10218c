use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumSample {
    /// cm^-1
    pub wavenumber: f32,
    /// Percent of light transmitted, 0 -> 100
    pub transmittance: f32,
}

impl SpectrumSample {
    pub fn new(wavenumber: f32, transmittance: f32) -> Self {
        Self {
            wavenumber,
            transmittance,
        }
    }

    pub fn absorbance(&self) -> f32 {
        (100.0 - self.transmittance) / 100.0
    }
}

/// Synthetic ethanol-like spectrum for the demo binary: a broad O-H stretch,
/// a sharp C-H stretch and two fingerprint bands.
pub fn demo_spectrum() -> Vec<SpectrumSample> {
    let bands: [(f32, f32, f32); 4] = [
        (3350.0, 0.65, 140.0),
        (2950.0, 0.80, 45.0),
        (1650.0, 0.50, 35.0),
        (1050.0, 0.90, 40.0),
    ];

    let mut samples = Vec::new();
    let mut wavenumber = 400.0_f32;
    while wavenumber <= 4000.0 {
        let mut absorbed = 0.0_f32;
        for (center, depth, width) in bands {
            let x = (wavenumber - center) / width;
            absorbed += depth * (-x * x).exp();
        }
        samples.push(SpectrumSample::new(
            wavenumber,
            100.0 * (1.0 - absorbed.min(0.99)),
        ));
        wavenumber += 10.0;
    }
    samples
}
