//! harmonist: feeds a scripted melody through the live harmonizer and
//! prints each frame as a JSON line

use std::io::Write;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use harmonist_core::{DetectedPitch, HarmonizationEngine};
use harmonist_services::{load_config, read_config, FrameDriver};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// "Ode to Joy", then the same phrase a fifth higher
const MELODY: [u8; 15] = [64, 64, 65, 67, 67, 65, 64, 62, 60, 60, 62, 64, 64, 62, 62];
const NOTE_SPACING: Duration = Duration::from_millis(60);

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("harmonist_core=debug".parse()?)
            .add_directive("harmonist_services=debug".parse()?))
        .init();

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => read_config(&path).with_context(|| format!("reading {}", path.display()))?,
        None => load_config(),
    };
    let harmonization = config.harmonization();
    tracing::info!(
        style = harmonization.style.name(),
        harmony_type = ?harmonization.harmony_type,
        voices = harmonization.voice_count,
        "Starting harmonist demo"
    );

    let mut engine = HarmonizationEngine::new(harmonization, config.engine);
    let mut sender = engine
        .take_pitch_sender()
        .context("pitch sender already taken")?;

    let interval = Duration::from_millis(engine.settings().frame_interval_ms);
    let mut driver = FrameDriver::start(engine, interval)?;
    let results = driver.subscribe();

    // Stand-in for the pitch detector running on the audio thread
    let producer = thread::spawn(move || {
        let start = Instant::now();
        let phrases = MELODY.iter().copied().chain(MELODY.iter().map(|n| n + 7));
        let mut dropped = 0u32;
        for note in phrases {
            let pitch = DetectedPitch::new(note, 0.9, 0.75, start.elapsed().as_secs_f64());
            if !sender.write(pitch) {
                dropped += 1;
            }
            thread::sleep(NOTE_SPACING);
        }
        dropped
    });

    let stdout = std::io::stdout();
    while !producer.is_finished() || !results.is_empty() {
        let Ok(result) = results.recv_timeout(NOTE_SPACING * 2) else { continue };
        let mut out = stdout.lock();
        serde_json::to_writer(&mut out, &result)?;
        writeln!(out)?;
    }

    let dropped = producer
        .join()
        .map_err(|_| anyhow::anyhow!("producer thread panicked"))?;
    let engine = driver.stop()?;
    let stats = engine.stats();
    tracing::info!(
        frames = stats.frames,
        average_ms = stats.average_ms,
        max_ms = stats.max_ms,
        overruns = stats.overruns,
        dropped,
        key = %engine.current_key().name(),
        "Demo finished"
    );
    Ok(())
}
