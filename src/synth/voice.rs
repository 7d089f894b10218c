use serde::{Deserialize, Serialize};

use super::{
    FADE_IN_SECS, FADE_OUT_SECS, GAIN_HEADROOM, LOUDNESS_REF_HZ, Waveform, waveform_for_index,
};
use crate::mapping::MappedPeak;

/// Everything the render side needs to know about one voice. Pure data; the
/// sink turns it into a running oscillator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoicePlan {
    pub frequency: f32,
    pub waveform: Waveform,
    /// Sustain-level gain after headroom and loudness correction
    pub gain: f32,
}

impl VoicePlan {
    /// Builds the voice for peak `index` of `count` in one session. The base
    /// gain divides the 0.8 headroom across all voices so the sum can never
    /// clip, and the loudness correction `min(1, 1000 / f)` tames high
    /// frequencies without ever amplifying.
    pub fn build(peak: &MappedPeak, index: usize, count: usize) -> Self {
        let base_gain = (peak.absorbance * GAIN_HEADROOM) / count as f32;
        let correction = (LOUDNESS_REF_HZ / peak.audio_frequency).min(1.0);
        Self {
            frequency: peak.audio_frequency,
            waveform: waveform_for_index(index),
            gain: base_gain * correction,
        }
    }

    /// One cycle of the waveform at `phase` in [0, 1).
    pub fn waveform_sample(&self, phase: f32) -> f32 {
        match self.waveform {
            Waveform::Sine => (phase * 2.0 * std::f32::consts::PI).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    -1.0
                } else {
                    1.0
                }
            }
            Waveform::Triangle => {
                if phase < 0.5 {
                    4.0 * phase - 1.0
                } else {
                    3.0 - 4.0 * phase
                }
            }
        }
    }
}

/// Trapezoid envelope: linear ramp from zero over the fade-in, hold at
/// `sustain`, linear ramp back to zero ending exactly at `duration`. `t` is
/// seconds since voice start. Fades are shortened for very short voices so
/// the ramps never extend past the end.
pub fn envelope_gain(t: f64, duration: f64, sustain: f32) -> f32 {
    if t <= 0.0 || t >= duration {
        return 0.0;
    }
    let fade_in = FADE_IN_SECS.min(duration);
    let fade_out = FADE_OUT_SECS.min(duration);
    if t < fade_in {
        sustain * (t / fade_in) as f32
    } else if t > duration - fade_out {
        sustain * ((duration - t) / fade_out) as f32
    } else {
        sustain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::PANIC_FADE_SECS;

    fn peak(absorbance: f32, frequency: f32) -> MappedPeak {
        MappedPeak {
            wavenumber: 0.0,
            absorbance,
            audio_frequency: frequency,
        }
    }

    #[test]
    fn base_gain_scales_down_with_voice_count() {
        let lone = VoicePlan::build(&peak(1.0, 500.0), 0, 1);
        let crowded = VoicePlan::build(&peak(1.0, 500.0), 0, 8);
        assert!((lone.gain - 0.8).abs() < 1e-6);
        assert!((crowded.gain - 0.1).abs() < 1e-6);
    }

    #[test]
    fn loudness_correction_never_amplifies() {
        // 2 kHz is attenuated by half, 500 Hz is left alone.
        let high = VoicePlan::build(&peak(1.0, 2000.0), 0, 1);
        let low = VoicePlan::build(&peak(1.0, 500.0), 0, 1);
        assert!((high.gain - 0.4).abs() < 1e-6);
        assert!((low.gain - 0.8).abs() < 1e-6);
    }

    #[test]
    fn session_gain_sum_stays_under_headroom() {
        for n in [1, 2, 5, 12] {
            let total: f32 = (0..n)
                .map(|i| VoicePlan::build(&peak(1.0, 500.0), i, n).gain)
                .sum();
            assert!(total <= GAIN_HEADROOM + 1e-5, "n={n} total={total}");
        }
    }

    #[test]
    fn envelope_is_a_trapezoid() {
        let sustain = 0.5;
        let duration = 2.0;
        assert_eq!(envelope_gain(0.0, duration, sustain), 0.0);
        assert!((envelope_gain(0.025, duration, sustain) - 0.25).abs() < 1e-6);
        assert!((envelope_gain(0.05, duration, sustain) - 0.5).abs() < 1e-6);
        assert!((envelope_gain(1.0, duration, sustain) - 0.5).abs() < 1e-6);
        assert!((envelope_gain(1.95, duration, sustain) - 0.25).abs() < 1e-6);
        assert_eq!(envelope_gain(2.0, duration, sustain), 0.0);
        assert_eq!(envelope_gain(2.5, duration, sustain), 0.0);
    }

    #[test]
    fn envelope_fades_fit_short_voices() {
        // A panic-fade-length voice still starts and ends at zero.
        let duration = PANIC_FADE_SECS;
        assert_eq!(envelope_gain(0.0, duration, 1.0), 0.0);
        assert_eq!(envelope_gain(duration, duration, 1.0), 0.0);
        assert!(envelope_gain(duration / 2.0, duration, 1.0) > 0.0);
    }

    #[test]
    fn square_and_triangle_cover_full_swing() {
        let square = VoicePlan {
            frequency: 440.0,
            waveform: Waveform::Square,
            gain: 1.0,
        };
        assert_eq!(square.waveform_sample(0.25), -1.0);
        assert_eq!(square.waveform_sample(0.75), 1.0);

        let triangle = VoicePlan {
            waveform: Waveform::Triangle,
            ..square
        };
        assert_eq!(triangle.waveform_sample(0.0), -1.0);
        assert_eq!(triangle.waveform_sample(0.5), 1.0);
        assert!((triangle.waveform_sample(0.25)).abs() < 1e-6);
    }
}
