use crate::synth::VoicePlan;

/// A sink command stamped with the sample at which it takes effect.
#[derive(Debug, Clone)]
pub struct ScheduledEvent {
    pub sample_timestamp: u64,
    pub event: Event,
}

#[derive(Debug, Clone)]
pub enum Event {
    /// Start a voice at the event's timestamp; the oscillator is released at
    /// `stop_sample`.
    StartVoice { plan: VoicePlan, stop_sample: u64 },
    /// Cancel pending automation on every live voice and fade the current
    /// gain to zero over `fade_samples`. One event covers all voices, so
    /// cancellation is atomic per render quantum.
    CancelAll { fade_samples: u32 },
}
