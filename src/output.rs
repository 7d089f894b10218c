use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use ringbuf::{
    HeapCons, HeapProd, HeapRb,
    traits::{Consumer, Producer, Split},
};
use std::sync::{
    Arc,
    atomic::{AtomicU32, AtomicU64, Ordering},
};
use tracing::{error, info};

use crate::events::{Event, ScheduledEvent};
use crate::synth::{AudioSink, SinkError, VoicePlan, envelope_gain};

const EVENT_QUEUE_CAPACITY: usize = 4096;
const TAP_CAPACITY: usize = 1 << 15;
const DEFAULT_SAMPLE_RATE: f32 = 48_000.0;

/// One sounding voice on the render side.
struct ActiveVoice {
    plan: VoicePlan,
    start_sample: u64,
    stop_sample: u64,
    duration_secs: f64,
    phase: f32,
    fade_override: Option<FadeOut>,
    released: bool,
}

/// Result of a CancelAll: the envelope is replaced by a linear ramp from the
/// gain captured at cancel time down to zero.
struct FadeOut {
    from_gain: f32,
    at_sample: u64,
    fade_samples: u32,
}

impl ActiveVoice {
    fn gain_at(&self, sample: u64, sample_rate: f32) -> f32 {
        if let Some(fade) = &self.fade_override {
            if sample <= fade.at_sample {
                return fade.from_gain;
            }
            let progress = (sample - fade.at_sample) as f32 / fade.fade_samples.max(1) as f32;
            return if progress >= 1.0 {
                0.0
            } else {
                fade.from_gain * (1.0 - progress)
            };
        }
        let t = sample.saturating_sub(self.start_sample) as f64 / sample_rate as f64;
        envelope_gain(t, self.duration_secs, self.plan.gain)
    }

    /// Idempotent; the second release is a no-op whichever path triggers it.
    fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        true
    }
}

/// Everything the audio callback owns.
struct RenderState {
    voices: Vec<ActiveVoice>,
    pending_event: Option<ScheduledEvent>,
    consumer: HeapCons<ScheduledEvent>,
    tap: HeapProd<f32>,
    master_gain: Arc<AtomicU32>,
    sample_rate: f32,
    num_channels: usize,
}

/// Real-time `AudioSink` over a cpal output stream. Control-side calls only
/// push sample-stamped events onto an SPSC queue; the callback applies them
/// at their exact frame and renders the voices itself.
pub struct CpalSink {
    stream: Option<cpal::Stream>,
    producer: HeapProd<ScheduledEvent>,
    event_consumer: Option<HeapCons<ScheduledEvent>>,
    tap_producer: Option<HeapProd<f32>>,
    sample_counter: Arc<AtomicU64>,
    master_gain: Arc<AtomicU32>,
    sample_rate: f32,
    last_error: Arc<Mutex<Option<String>>>,
}

impl CpalSink {
    /// Returns the sink plus the mono tap the analyzer reads from.
    pub fn new() -> (Self, HeapCons<f32>) {
        let (producer, event_consumer) = HeapRb::<ScheduledEvent>::new(EVENT_QUEUE_CAPACITY).split();
        let (tap_producer, tap_consumer) = HeapRb::<f32>::new(TAP_CAPACITY).split();

        let sink = Self {
            stream: None,
            producer,
            event_consumer: Some(event_consumer),
            tap_producer: Some(tap_producer),
            sample_counter: Arc::new(AtomicU64::new(0)),
            master_gain: Arc::new(AtomicU32::new(1.0_f32.to_bits())),
            sample_rate: DEFAULT_SAMPLE_RATE,
            last_error: Arc::new(Mutex::new(None)),
        };
        (sink, tap_consumer)
    }

    fn to_sample(&self, secs: f64) -> u64 {
        (secs * self.sample_rate as f64).round() as u64
    }

    /// Most recent stream error reported by the device callback, if any.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }
}

impl AudioSink for CpalSink {
    fn now(&self) -> f64 {
        self.sample_counter.load(Ordering::Relaxed) as f64 / self.sample_rate as f64
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn ensure_running(&mut self) -> Result<(), SinkError> {
        if self.stream.is_some() {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| SinkError::Device("no output device".into()))?;
        let config = device
            .default_output_config()
            .map_err(|e| SinkError::Device(e.to_string()))?;
        let stream_config: cpal::StreamConfig = config.into();

        let sample_rate = stream_config.sample_rate as f32;
        let num_channels = stream_config.channels as usize;
        self.sample_rate = sample_rate;

        let mut state = RenderState {
            voices: Vec::with_capacity(32),
            pending_event: None,
            consumer: self
                .event_consumer
                .take()
                .ok_or_else(|| SinkError::Device("render state already consumed".into()))?,
            tap: self
                .tap_producer
                .take()
                .ok_or_else(|| SinkError::Device("analyzer tap already consumed".into()))?,
            master_gain: self.master_gain.clone(),
            sample_rate,
            num_channels,
        };

        let counter = self.sample_counter.clone();
        let last_error = self.last_error.clone();

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    render(data, &mut state, &counter);
                },
                move |err| {
                    error!("audio stream error: {err}");
                    *last_error.lock() = Some(err.to_string());
                },
                None,
            )
            .map_err(|e| SinkError::Device(e.to_string()))?;
        stream.play().map_err(|e| SinkError::Device(e.to_string()))?;

        info!(sample_rate, num_channels, "audio output running");
        self.stream = Some(stream);
        Ok(())
    }

    fn schedule_voice(&mut self, plan: VoicePlan, start: f64, stop: f64) -> Result<(), SinkError> {
        let start_sample = self.to_sample(start);
        let stop_sample = self.to_sample(stop);
        self.producer
            .try_push(ScheduledEvent {
                sample_timestamp: start_sample,
                event: Event::StartVoice { plan, stop_sample },
            })
            .map_err(|_| SinkError::QueueFull)
    }

    fn cancel_all(&mut self, fade: f64) {
        let now = self.sample_counter.load(Ordering::Relaxed);
        let fade_samples = (fade * self.sample_rate as f64) as u32;
        let event = ScheduledEvent {
            sample_timestamp: now,
            event: Event::CancelAll { fade_samples },
        };
        if self.producer.try_push(event).is_err() {
            error!("event queue full, cancel dropped");
        }
    }

    fn set_master_gain(&mut self, gain: f32) {
        self.master_gain.store(gain.to_bits(), Ordering::Relaxed);
    }
}

fn render(data: &mut [f32], state: &mut RenderState, sample_counter: &Arc<AtomicU64>) {
    let num_frames = data.len() / state.num_channels;
    let current_sample = sample_counter.load(Ordering::Relaxed);
    let buffer_end = current_sample + num_frames as u64;

    let mut events: Vec<ScheduledEvent> = Vec::with_capacity(16);
    if let Some(ev) = state.pending_event.take() {
        if ev.sample_timestamp < buffer_end {
            events.push(ev);
        } else {
            state.pending_event = Some(ev);
        }
    }
    while state.pending_event.is_none() {
        match state.consumer.try_pop() {
            Some(ev) if ev.sample_timestamp < buffer_end => events.push(ev),
            Some(ev) => {
                state.pending_event = Some(ev);
                break;
            }
            None => break,
        }
    }
    events.sort_by_key(|e| e.sample_timestamp);

    data.fill(0.0);
    let master = f32::from_bits(state.master_gain.load(Ordering::Relaxed));
    let mut event_idx = 0;

    for frame in 0..num_frames {
        let sample = current_sample + frame as u64;

        while event_idx < events.len() {
            let event_frame = events[event_idx]
                .sample_timestamp
                .saturating_sub(current_sample) as usize;
            if event_frame > frame {
                break;
            }
            apply_event(&mut state.voices, &events[event_idx], state.sample_rate);
            event_idx += 1;
        }

        let mut mix = 0.0_f32;
        for voice in state.voices.iter_mut() {
            if voice.released || sample < voice.start_sample {
                continue;
            }
            mix += voice.plan.waveform_sample(voice.phase) * voice.gain_at(sample, state.sample_rate);
            voice.phase += voice.plan.frequency / state.sample_rate;
            if voice.phase >= 1.0 {
                voice.phase -= 1.0;
            }
            if sample + 1 >= voice.stop_sample {
                voice.release();
            }
        }
        mix *= master;

        let _ = state.tap.try_push(mix);
        let out = &mut data[frame * state.num_channels..(frame + 1) * state.num_channels];
        for channel in out.iter_mut() {
            *channel = mix;
        }
    }

    state.voices.retain(|v| !v.released);
    sample_counter.fetch_add(num_frames as u64, Ordering::Relaxed);
}

fn apply_event(voices: &mut Vec<ActiveVoice>, event: &ScheduledEvent, sample_rate: f32) {
    match &event.event {
        Event::StartVoice { plan, stop_sample } => {
            let start_sample = event.sample_timestamp;
            voices.push(ActiveVoice {
                plan: *plan,
                start_sample,
                stop_sample: *stop_sample,
                duration_secs: stop_sample.saturating_sub(start_sample) as f64 / sample_rate as f64,
                phase: 0.0,
                fade_override: None,
                released: false,
            });
        }
        Event::CancelAll { fade_samples } => {
            for voice in voices.iter_mut() {
                if voice.released {
                    continue;
                }
                let from_gain = voice.gain_at(event.sample_timestamp, sample_rate);
                voice.fade_override = Some(FadeOut {
                    from_gain,
                    at_sample: event.sample_timestamp,
                    fade_samples: *fade_samples,
                });
                voice.stop_sample = event.sample_timestamp + *fade_samples as u64;
            }
        }
    }
}
