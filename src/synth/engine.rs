use tracing::{debug, info};

use super::PANIC_FADE_SECS;
use super::sink::AudioSink;
use super::voice::VoicePlan;
use crate::error::PlayError;
use crate::mapping::MappedPeak;

/// Bookkeeping for the one active playback session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Engine time at which the voices were scheduled
    pub started_at: f64,
    pub duration: f64,
    pub voices: Vec<VoicePlan>,
}

impl Session {
    pub fn end(&self) -> f64 {
        self.started_at + self.duration
    }
}

/// Additive-synthesis engine: one oscillator voice per mapped peak, mixed on
/// the sink's master bus. At most one session is active at any instant; a
/// superseding `play` tears the previous one down first.
pub struct SynthesisEngine<S: AudioSink> {
    sink: S,
    session: Option<Session>,
}

impl<S: AudioSink> SynthesisEngine<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            session: None,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Schedules the peaks as a chord for `duration` seconds and returns the
    /// new session. Validation happens before any voice is touched, so a
    /// rejected call leaves the prior session playing.
    pub fn play(&mut self, peaks: &[MappedPeak], duration: f64) -> Result<&Session, PlayError> {
        if duration <= 0.0 {
            return Err(PlayError::InvalidDuration(duration));
        }
        if peaks.is_empty() {
            return Err(PlayError::NoPeaks);
        }

        self.sink.ensure_running()?;

        // Exactly one active session: a second play passes through Idle.
        self.stop();

        let t0 = self.sink.now();
        let voices: Vec<VoicePlan> = peaks
            .iter()
            .enumerate()
            .map(|(i, peak)| VoicePlan::build(peak, i, peaks.len()))
            .collect();

        for plan in &voices {
            if let Err(e) = self.sink.schedule_voice(*plan, t0, t0 + duration) {
                // Half-scheduled sessions are not allowed to linger.
                self.sink.cancel_all(PANIC_FADE_SECS);
                return Err(e.into());
            }
        }

        info!(voices = voices.len(), duration, "session started");
        Ok(self.session.insert(Session {
            started_at: t0,
            duration,
            voices,
        }))
    }

    /// Idempotent. Fades any live voices out over the panic fade and drops
    /// the session; a no-op when idle or after natural completion.
    pub fn stop(&mut self) {
        self.expire_finished();
        if self.session.take().is_some() {
            self.sink.cancel_all(PANIC_FADE_SECS);
            debug!("session stopped");
        }
    }

    /// Master volume in [0, 1]; applies immediately, with or without an
    /// active session.
    pub fn set_volume(&mut self, volume: f32) {
        self.sink.set_master_gain(volume.clamp(0.0, 1.0));
    }

    pub fn is_playing(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| self.sink.now() < s.end())
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn active_voices(&self) -> usize {
        if self.is_playing() {
            self.session.as_ref().map_or(0, |s| s.voices.len())
        } else {
            0
        }
    }

    /// Sessions self-terminate on the render side; the bookkeeping follows
    /// lazily whenever the engine is observed.
    fn expire_finished(&mut self) {
        if let Some(s) = &self.session {
            if self.sink.now() >= s.end() {
                self.session = None;
            }
        }
    }
}
