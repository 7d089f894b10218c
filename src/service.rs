use arc_swap::ArcSwap;
use crossbeam::channel::{Receiver, Sender};
use std::sync::Arc;
use tracing::info;

use crate::analyzer::Snapshot;
use crate::config::SonifierConfig;
use crate::controller::PlaybackController;
use crate::mapping::MappedPeak;
use crate::output::CpalSink;
use crate::spectrum::SpectrumSample;

#[derive(Debug, Clone)]
pub enum SonifierCommand {
    Play {
        spectrum: Vec<SpectrumSample>,
        duration: f64,
    },
    Stop,
    SetVolume(f32),
    Shutdown,
}

#[derive(Debug, Clone)]
pub enum SonifierUpdate {
    PlaybackState {
        playing: bool,
        peaks: Vec<MappedPeak>,
    },
    Error {
        message: String,
    },
}

/// Channel handle to the sonifier thread. Snapshots bypass the channels: the
/// visualization reads the cell at its own cadence without blocking anything.
pub struct SonifierHandle {
    pub command_tx: Sender<SonifierCommand>,
    pub update_rx: Receiver<SonifierUpdate>,
    snapshot: Arc<ArcSwap<Snapshot>>,
}

impl SonifierHandle {
    /// Latest frequency-domain snapshot; empty while idle.
    pub fn sample(&self) -> Snapshot {
        (**self.snapshot.load()).clone()
    }
}

/// Spawns the control thread that owns the cpal sink and the controller.
/// The sink must live on one thread, which is exactly what this gives it.
pub fn spawn_sonifier(config: SonifierConfig) -> SonifierHandle {
    let (command_tx, command_rx) = crossbeam::channel::unbounded();
    let (update_tx, update_rx) = crossbeam::channel::unbounded();
    let snapshot = Arc::new(ArcSwap::from_pointee(Snapshot::default()));
    let snapshot_thread = snapshot.clone();

    std::thread::spawn(move || {
        service_thread(config, command_rx, update_tx, snapshot_thread);
    });

    SonifierHandle {
        command_tx,
        update_rx,
        snapshot,
    }
}

fn service_thread(
    config: SonifierConfig,
    command_rx: Receiver<SonifierCommand>,
    update_tx: Sender<SonifierUpdate>,
    snapshot: Arc<ArcSwap<Snapshot>>,
) {
    let (sink, tap) = CpalSink::new();
    let mut controller = PlaybackController::with_snapshot(sink, tap, config, snapshot);

    loop {
        match command_rx.recv() {
            Ok(SonifierCommand::Play { spectrum, duration }) => {
                match controller.play(&spectrum, duration) {
                    Ok(peaks) => {
                        let _ = update_tx.send(SonifierUpdate::PlaybackState {
                            playing: true,
                            peaks: peaks.to_vec(),
                        });
                    }
                    Err(e) => {
                        let _ = update_tx.send(SonifierUpdate::Error {
                            message: e.to_string(),
                        });
                    }
                }
            }
            Ok(SonifierCommand::Stop) => {
                controller.stop();
                let _ = update_tx.send(SonifierUpdate::PlaybackState {
                    playing: false,
                    peaks: Vec::new(),
                });
            }
            Ok(SonifierCommand::SetVolume(volume)) => {
                controller.set_volume(volume);
            }
            Ok(SonifierCommand::Shutdown) | Err(_) => {
                controller.stop();
                info!("sonifier shut down");
                break;
            }
        }
    }
}
