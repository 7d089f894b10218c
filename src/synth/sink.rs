use thiserror::Error;

use super::voice::VoicePlan;

#[derive(Debug, Clone, Error)]
pub enum SinkError {
    #[error("audio output device unavailable: {0}")]
    Device(String),
    #[error("event queue full")]
    QueueFull,
}

/// Capability boundary between scheduling decisions and the platform audio
/// graph. The engine decides what every voice should do and when; a sink
/// owns the real-time side and executes those decisions.
pub trait AudioSink {
    /// Current engine time in seconds. Monotone once the sink is running.
    fn now(&self) -> f64;

    fn sample_rate(&self) -> f32;

    /// Brings the output device up if it is not already running. This is the
    /// single point of asynchronous waiting in the system; it must succeed
    /// before any voice is scheduled.
    fn ensure_running(&mut self) -> Result<(), SinkError>;

    /// Schedules one voice: oscillator runs from `start` to `stop` (engine
    /// time, seconds) with the plan's trapezoid envelope.
    fn schedule_voice(&mut self, plan: VoicePlan, start: f64, stop: f64) -> Result<(), SinkError>;

    /// Cancels all pending envelope automation and fades every live voice to
    /// silence over `fade` seconds, atomically with respect to the next
    /// render quantum. No-op when nothing is sounding.
    fn cancel_all(&mut self, fade: f64);

    /// Master gain, effective immediately. Last write wins.
    fn set_master_gain(&mut self, gain: f32);
}
