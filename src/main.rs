use irsonic::{SonifierCommand, SonifierConfig, SonifierUpdate, spawn_sonifier, spectrum};
use std::path::Path;
use std::time::Duration;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match SonifierConfig::load(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {path}: {e}");
                std::process::exit(1);
            }
        },
        None => SonifierConfig::default(),
    };

    let duration = config.playback.duration;
    let volume = config.playback.volume;

    let sonifier = spawn_sonifier(config);
    let _ = sonifier.command_tx.send(SonifierCommand::SetVolume(volume));
    let _ = sonifier.command_tx.send(SonifierCommand::Play {
        spectrum: spectrum::demo_spectrum(),
        duration,
    });

    match sonifier.update_rx.recv_timeout(Duration::from_secs(5)) {
        Ok(SonifierUpdate::PlaybackState { peaks, .. }) => {
            println!("Playing {} peaks for {duration} s:", peaks.len());
            for peak in &peaks {
                println!(
                    "  {:7.1} cm^-1  absorbance {:.2}  ->  {:7.1} Hz",
                    peak.wavenumber, peak.absorbance, peak.audio_frequency
                );
            }
        }
        Ok(SonifierUpdate::Error { message }) => {
            eprintln!("{message}");
            std::process::exit(1);
        }
        Err(_) => {
            eprintln!("Sonifier did not respond");
            std::process::exit(1);
        }
    }

    std::thread::sleep(Duration::from_secs_f64(duration + 0.2));
    let _ = sonifier.command_tx.send(SonifierCommand::Shutdown);
}
