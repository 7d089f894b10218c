use ringbuf::{HeapCons, traits::Consumer};
use rustfft::{Fft, FftPlanner, num_complex::Complex};
use std::f32::consts::PI;
use std::sync::Arc;

// Byte conversion matches the usual analyser convention: magnitudes are
// smoothed across frames, then mapped from a fixed decibel range onto 0-255.
const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;
const SMOOTHING: f32 = 0.8;

/// One frequency-domain frame: amplitude per bin on a 0-255 scale, plus the
/// metadata a visualization needs to place the bins on a frequency axis.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub bins: Vec<u8>,
    pub sample_rate_hz: f32,
    pub transform_size: usize,
}

impl Snapshot {
    /// Number of leading bins at or below `cutoff_hz`; the slice a
    /// visualization should draw.
    pub fn bins_below(&self, cutoff_hz: f32) -> usize {
        if self.sample_rate_hz <= 0.0 {
            return 0;
        }
        let count = ((cutoff_hz / self.sample_rate_hz) * self.transform_size as f32) as usize;
        count.min(self.bins.len())
    }
}

/// Reads the rendered mono mix from the sink's tap and produces byte-scale
/// magnitude snapshots. Sampling never blocks and never touches playback
/// state; the tap is read-only with respect to the synthesis graph.
pub struct SpectrumAnalyzer {
    tap: HeapCons<f32>,
    /// Ring of the most recent `transform_size` samples
    window: Vec<f32>,
    pos: usize,
    filled: usize,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    sample_rate: f32,
    transform_size: usize,
}

impl SpectrumAnalyzer {
    pub fn new(tap: HeapCons<f32>, sample_rate: f32, transform_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(transform_size);
        Self {
            tap,
            window: vec![0.0; transform_size],
            pos: 0,
            filled: 0,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); transform_size],
            smoothed: vec![0.0; transform_size / 2],
            sample_rate,
            transform_size,
        }
    }

    pub fn sample_rate_hz(&self) -> f32 {
        self.sample_rate
    }

    pub fn transform_size(&self) -> usize {
        self.transform_size
    }

    /// Usable bins per snapshot (half the transform size).
    pub fn bin_count(&self) -> usize {
        self.transform_size / 2
    }

    /// Drains the tap and returns the current snapshot. All-zero until audio
    /// has flowed.
    pub fn sample(&mut self) -> Snapshot {
        self.drain_tap();

        let mut snapshot = Snapshot {
            bins: vec![0; self.bin_count()],
            sample_rate_hz: self.sample_rate,
            transform_size: self.transform_size,
        };
        if self.filled == 0 {
            return snapshot;
        }

        // Oldest sample first, Hann-windowed into the FFT buffer.
        for i in 0..self.transform_size {
            let sample = self.window[(self.pos + i) % self.transform_size];
            self.scratch[i] = Complex::new(sample * hann_window(i, self.transform_size), 0.0);
        }
        self.fft.process(&mut self.scratch);

        for (k, bin) in snapshot.bins.iter_mut().enumerate() {
            let norm = self.scratch[k].norm() / self.transform_size as f32;
            self.smoothed[k] = SMOOTHING * self.smoothed[k] + (1.0 - SMOOTHING) * norm;
            let db = 20.0 * self.smoothed[k].max(1e-10).log10();
            let scaled = 255.0 * (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS);
            *bin = scaled.clamp(0.0, 255.0) as u8;
        }
        snapshot
    }

    fn drain_tap(&mut self) {
        while let Some(sample) = self.tap.try_pop() {
            self.window[self.pos] = sample;
            self.pos = (self.pos + 1) % self.transform_size;
            if self.filled < self.transform_size {
                self.filled += 1;
            }
        }
    }
}

/// Hann window, zero at the edges and one at the center.
pub fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::{HeapRb, traits::{Producer, Split}};

    const SR: f32 = 48_000.0;
    const N: usize = 2048;

    fn analyzer_with_tap() -> (SpectrumAnalyzer, ringbuf::HeapProd<f32>) {
        let (producer, consumer) = HeapRb::<f32>::new(1 << 16).split();
        (SpectrumAnalyzer::new(consumer, SR, N), producer)
    }

    #[test]
    fn hann_window_shape() {
        assert!(hann_window(0, 1024).abs() < 0.01);
        assert!(hann_window(1023, 1024).abs() < 0.01);
        assert!((hann_window(512, 1024) - 1.0).abs() < 0.01);
    }

    #[test]
    fn transform_size_determines_bin_count() {
        let (analyzer, _producer) = analyzer_with_tap();
        assert_eq!(analyzer.bin_count(), 1024);
        assert_eq!(analyzer.transform_size(), 2048);
        assert_eq!(analyzer.sample_rate_hz(), SR);
    }

    #[test]
    fn display_cutoff_bin_math() {
        let snapshot = Snapshot {
            bins: vec![0; 1024],
            sample_rate_hz: 44_100.0,
            transform_size: 2048,
        };
        assert_eq!(snapshot.bins_below(10_000.0), 464);

        let empty = Snapshot::default();
        assert_eq!(empty.bins_below(10_000.0), 0);
    }

    #[test]
    fn silent_tap_yields_all_zero_bins() {
        let (mut analyzer, _producer) = analyzer_with_tap();
        let snapshot = analyzer.sample();
        assert_eq!(snapshot.bins.len(), 1024);
        assert!(snapshot.bins.iter().all(|b| *b == 0));
    }

    #[test]
    fn sine_tap_peaks_at_its_bin() {
        let (mut analyzer, mut producer) = analyzer_with_tap();

        // Bin 128 center frequency: 128 * 48000 / 2048 = 3000 Hz.
        let freq = 3000.0_f32;
        for i in 0..N {
            let t = i as f32 / SR;
            producer
                .try_push(0.5 * (2.0 * PI * freq * t).sin())
                .unwrap();
        }

        let snapshot = analyzer.sample();
        let loudest = snapshot
            .bins
            .iter()
            .enumerate()
            .max_by_key(|(_, b)| **b)
            .map(|(k, _)| k)
            .unwrap();
        assert_eq!(loudest, 128);
        assert!(snapshot.bins[128] > 0);
        // Far-away bins stay quiet relative to the peak.
        assert!(snapshot.bins[512] < snapshot.bins[128]);
    }

    #[test]
    fn snapshot_carries_axis_metadata() {
        let (mut analyzer, mut producer) = analyzer_with_tap();
        producer.try_push(0.1).unwrap();
        let snapshot = analyzer.sample();
        assert_eq!(snapshot.sample_rate_hz, SR);
        assert_eq!(snapshot.transform_size, N);
    }
}
