pub mod analyzer;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod mapping;
pub mod output;
pub mod peaks;
pub mod service;
pub mod spectrum;
pub mod synth;

pub use analyzer::{Snapshot, SpectrumAnalyzer};
pub use config::SonifierConfig;
pub use controller::PlaybackController;
pub use error::PlayError;
pub use mapping::{MappedPeak, MappingConfig};
pub use output::CpalSink;
pub use peaks::{DetectionConfig, Peak};
pub use service::{SonifierCommand, SonifierHandle, SonifierUpdate, spawn_sonifier};
pub use spectrum::SpectrumSample;
pub use synth::{AudioSink, Session, SynthesisEngine, VoicePlan, Waveform};
