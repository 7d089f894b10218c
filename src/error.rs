use thiserror::Error;

use crate::synth::SinkError;

/// Everything a `play` call can fail with. Extraction and mapping are pure
/// and infallible; an empty spectrum is a valid empty result, not an error,
/// until the moment the caller asks for playback.
#[derive(Debug, Clone, Error)]
pub enum PlayError {
    /// Duration must be strictly positive; rejected before any voice exists.
    #[error("invalid duration {0}: must be greater than zero")]
    InvalidDuration(f64),
    /// The engine was handed an empty peak list.
    #[error("peak list is empty")]
    NoPeaks,
    /// Extraction found nothing above the threshold; surfaced as a warning,
    /// no partial playback is started.
    #[error("no peaks detected in spectrum")]
    NoPeaksDetected,
    /// Output device failed to initialize or resume. Fatal for this call
    /// only; retrying is the caller's choice.
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),
}

impl From<SinkError> for PlayError {
    fn from(err: SinkError) -> Self {
        PlayError::DeviceUnavailable(err.to_string())
    }
}
