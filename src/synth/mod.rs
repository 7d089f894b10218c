mod engine;
mod sink;
mod voice;

pub use engine::{Session, SynthesisEngine};
pub use sink::{AudioSink, SinkError};
pub use voice::{VoicePlan, envelope_gain};

#[cfg(test)]
pub(crate) use sink::testing;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Waveform {
    Sine,
    Triangle,
    Square,
}

/// Deterministic timbre cycle over peak position: every third voice is a
/// square, the rest alternate sine/triangle.
pub fn waveform_for_index(i: usize) -> Waveform {
    if i % 3 == 2 {
        Waveform::Square
    } else if i % 2 == 0 {
        Waveform::Sine
    } else {
        Waveform::Triangle
    }
}

// Fixed tuning values, chosen by ear rather than derived from any physical
// constant.
pub const GAIN_HEADROOM: f32 = 0.8;
pub const LOUDNESS_REF_HZ: f32 = 1000.0;
pub const FADE_IN_SECS: f64 = 0.05;
pub const FADE_OUT_SECS: f64 = 0.1;
pub const PANIC_FADE_SECS: f64 = 0.05;
