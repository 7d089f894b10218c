use arc_swap::ArcSwap;
use ringbuf::HeapCons;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, warn};

use crate::analyzer::{Snapshot, SpectrumAnalyzer};
use crate::config::SonifierConfig;
use crate::error::PlayError;
use crate::mapping::{self, MappedPeak};
use crate::peaks;
use crate::spectrum::SpectrumSample;
use crate::synth::{AudioSink, SynthesisEngine};

/// Display-refresh cadence for the analyzer loop.
const ANALYZER_INTERVAL: Duration = Duration::from_millis(16);

struct AnalyzerLoop {
    running: Arc<AtomicBool>,
    handle: JoinHandle<SpectrumAnalyzer>,
}

/// The external control surface: composes peak extraction, frequency mapping
/// and the synthesis engine, and runs the analyzer sampling loop while a
/// session is live. Snapshots publish through an `ArcSwap`, so readers never
/// block and never touch synthesis state.
pub struct PlaybackController<S: AudioSink> {
    engine: SynthesisEngine<S>,
    config: SonifierConfig,
    /// Tap from the sink, consumed when the analyzer is first built
    tap: Option<HeapCons<f32>>,
    /// Parked analyzer while no loop is running
    analyzer: Option<SpectrumAnalyzer>,
    analyzer_loop: Option<AnalyzerLoop>,
    snapshot: Arc<ArcSwap<Snapshot>>,
    peaks: Vec<MappedPeak>,
}

impl<S: AudioSink> PlaybackController<S> {
    pub fn new(sink: S, tap: HeapCons<f32>, config: SonifierConfig) -> Self {
        Self::with_snapshot(sink, tap, config, Arc::new(ArcSwap::from_pointee(Snapshot::default())))
    }

    /// Like `new`, but publishing snapshots into a caller-owned cell.
    pub fn with_snapshot(
        sink: S,
        tap: HeapCons<f32>,
        config: SonifierConfig,
        snapshot: Arc<ArcSwap<Snapshot>>,
    ) -> Self {
        Self {
            engine: SynthesisEngine::new(sink),
            config,
            tap: Some(tap),
            analyzer: None,
            analyzer_loop: None,
            snapshot,
            peaks: Vec::new(),
        }
    }

    /// Peak extraction and mapping without playback, for selection overlays.
    /// Output is wavenumber-descending, like every peak list the controller
    /// hands out.
    pub fn extract_peaks(&self, spectrum: &[SpectrumSample]) -> Vec<MappedPeak> {
        let found = peaks::extract(spectrum, &self.config.detection);
        mapping::map_peaks(&found, &self.config.mapping)
    }

    /// Extracts, maps and plays the spectrum for `duration` seconds. An empty
    /// extraction short-circuits with `NoPeaksDetected` before any audio node
    /// exists. On success the extracted peak list is returned for display.
    pub fn play(
        &mut self,
        spectrum: &[SpectrumSample],
        duration: f64,
    ) -> Result<&[MappedPeak], PlayError> {
        let mapped = self.extract_peaks(spectrum);
        if mapped.is_empty() {
            warn!("no peaks above threshold, nothing to play");
            return Err(PlayError::NoPeaksDetected);
        }

        self.engine.play(&mapped, duration)?;
        self.peaks = mapped;
        self.start_analyzer_loop();
        Ok(&self.peaks)
    }

    /// Stops the analyzer loop first so it never samples a half-torn-down
    /// graph, then fades the engine out. Idempotent.
    pub fn stop(&mut self) {
        self.stop_analyzer_loop();
        self.engine.stop();
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.engine.set_volume(volume);
    }

    pub fn is_playing(&self) -> bool {
        self.engine.is_playing()
    }

    pub fn sample_rate_hz(&self) -> f32 {
        self.engine.sink().sample_rate()
    }

    /// Latest analyzer snapshot; empty while idle. Never blocks.
    pub fn sample(&self) -> Snapshot {
        (**self.snapshot.load()).clone()
    }

    /// Peaks from the most recent `play`, wavenumber-descending.
    pub fn peaks(&self) -> &[MappedPeak] {
        &self.peaks
    }

    pub fn engine(&self) -> &SynthesisEngine<S> {
        &self.engine
    }

    /// Swaps the configuration; effective on the next `play` or
    /// `extract_peaks`, never on an in-flight session.
    pub fn set_config(&mut self, config: SonifierConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &SonifierConfig {
        &self.config
    }

    fn start_analyzer_loop(&mut self) {
        if self.analyzer_loop.is_some() {
            // Superseding play keeps the running loop.
            return;
        }
        let analyzer = match self.analyzer.take() {
            Some(analyzer) => analyzer,
            None => match self.tap.take() {
                // Built lazily so it sees the real device rate.
                Some(tap) => SpectrumAnalyzer::new(
                    tap,
                    self.engine.sink().sample_rate(),
                    self.config.analyzer.transform_size,
                ),
                None => return,
            },
        };

        let running = Arc::new(AtomicBool::new(true));
        let handle = spawn_analyzer_loop(analyzer, self.snapshot.clone(), running.clone());
        self.analyzer_loop = Some(AnalyzerLoop { running, handle });
        debug!("analyzer loop started");
    }

    fn stop_analyzer_loop(&mut self) {
        if let Some(ctl) = self.analyzer_loop.take() {
            ctl.running.store(false, Ordering::Relaxed);
            if let Ok(analyzer) = ctl.handle.join() {
                self.analyzer = Some(analyzer);
            }
            self.snapshot.store(Arc::new(Snapshot::default()));
            debug!("analyzer loop stopped");
        }
    }
}

impl<S: AudioSink> Drop for PlaybackController<S> {
    fn drop(&mut self) {
        self.stop_analyzer_loop();
    }
}

fn spawn_analyzer_loop(
    mut analyzer: SpectrumAnalyzer,
    snapshot: Arc<ArcSwap<Snapshot>>,
    running: Arc<AtomicBool>,
) -> JoinHandle<SpectrumAnalyzer> {
    std::thread::spawn(move || {
        while running.load(Ordering::Relaxed) {
            snapshot.store(Arc::new(analyzer.sample()));
            std::thread::sleep(ANALYZER_INTERVAL);
        }
        // Hand the analyzer back for the next session.
        analyzer
    })
}
