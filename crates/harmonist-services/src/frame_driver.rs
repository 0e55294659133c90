//! Periodic frame cycle on a dedicated thread

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use harmonist_core::{DetectedKey, HarmonizationConfig, HarmonizationEngine, HarmonizationResult};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Results buffered per subscriber before new ones are dropped
pub const SUBSCRIBER_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Failed to spawn frame thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Frame driver already stopped")]
    AlreadyStopped,
    #[error("Frame thread is gone")]
    Disconnected,
    #[error("Frame thread panicked")]
    Panicked,
}

/// Shared driver counters (lock-free reads from any thread)
pub struct DriverStats {
    active: AtomicBool,
    frames: AtomicU64,
    pitches: AtomicU64,
    last_latency_raw: AtomicU64,
    dropped_results: AtomicU64,
}

impl DriverStats {
    fn new(active: bool) -> Self {
        Self {
            active: AtomicBool::new(active),
            frames: AtomicU64::new(0),
            pitches: AtomicU64::new(0),
            last_latency_raw: AtomicU64::new(0),
            dropped_results: AtomicU64::new(0),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Frames that had input
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn pitches(&self) -> u64 {
        self.pitches.load(Ordering::Relaxed)
    }

    pub fn last_latency_ms(&self) -> f64 {
        f64::from_bits(self.last_latency_raw.load(Ordering::Relaxed))
    }

    /// Results a full subscriber queue could not take
    pub fn dropped_results(&self) -> u64 {
        self.dropped_results.load(Ordering::Relaxed)
    }

    fn record(&self, result: &HarmonizationResult) {
        self.frames.fetch_add(1, Ordering::Relaxed);
        self.pitches.fetch_add(result.pitches_processed as u64, Ordering::Relaxed);
        self.last_latency_raw.store(result.latency_ms.to_bits(), Ordering::Relaxed);
    }
}

impl Default for DriverStats {
    fn default() -> Self {
        Self::new(true)
    }
}

enum Command {
    Config(HarmonizationConfig),
    Key(DetectedKey),
    Reset,
    Stop,
}

type Subscribers = Arc<Mutex<Vec<Sender<HarmonizationResult>>>>;

/// Runs `process_frame` every `interval` on its own thread and publishes
/// non-empty results to subscribers.
///
/// Configuration changes are applied between frames. Take the engine's
/// pitch sender before starting the driver so a producer can feed it.
/// The driver starts paused if the engine was paused, and the engine it
/// hands back from [`FrameDriver::stop`] carries the driver's last state.
pub struct FrameDriver {
    commands: Sender<Command>,
    subscribers: Subscribers,
    stats: Arc<DriverStats>,
    handle: Option<JoinHandle<HarmonizationEngine>>,
}

impl FrameDriver {
    pub fn start(engine: HarmonizationEngine, interval: Duration) -> Result<Self, DriverError> {
        let interval = interval.max(Duration::from_millis(1));
        let (commands, command_rx) = unbounded();
        let subscribers: Subscribers = Arc::new(Mutex::new(Vec::new()));
        let stats = Arc::new(DriverStats::new(engine.is_active()));

        let loop_subscribers = subscribers.clone();
        let loop_stats = stats.clone();
        let handle = thread::Builder::new()
            .name("harmonist-frames".into())
            .spawn(move || Self::frame_loop(engine, interval, command_rx, loop_subscribers, loop_stats))?;

        info!(interval_ms = interval.as_millis() as u64, "Frame driver started");
        Ok(Self {
            commands,
            subscribers,
            stats,
            handle: Some(handle),
        })
    }

    /// Receive every non-empty frame result from now on
    pub fn subscribe(&self) -> Receiver<HarmonizationResult> {
        let (tx, rx) = bounded(SUBSCRIBER_CAPACITY);
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }
        rx
    }

    pub fn stats(&self) -> Arc<DriverStats> {
        self.stats.clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.stats.is_active()
    }

    /// Pause or resume the frame cycle; a frame already running completes
    pub fn set_active(&self, active: bool) {
        self.stats.active.store(active, Ordering::SeqCst);
        info!(active, "Frame cycle toggled");
    }

    pub fn update_config(&self, config: HarmonizationConfig) -> Result<(), DriverError> {
        self.send(Command::Config(config))
    }

    pub fn set_key(&self, key: DetectedKey) -> Result<(), DriverError> {
        self.send(Command::Key(key))
    }

    pub fn reset(&self) -> Result<(), DriverError> {
        self.send(Command::Reset)
    }

    /// Stop the thread and get the engine back
    pub fn stop(&mut self) -> Result<HarmonizationEngine, DriverError> {
        let handle = self.handle.take().ok_or(DriverError::AlreadyStopped)?;
        let _ = self.commands.send(Command::Stop);
        let engine = handle.join().map_err(|_| DriverError::Panicked)?;
        info!(frames = self.stats.frames(), "Frame driver stopped");
        Ok(engine)
    }

    fn send(&self, command: Command) -> Result<(), DriverError> {
        if self.handle.is_none() {
            return Err(DriverError::AlreadyStopped);
        }
        self.commands.send(command).map_err(|_| DriverError::Disconnected)
    }

    fn frame_loop(
        mut engine: HarmonizationEngine,
        interval: Duration,
        commands: Receiver<Command>,
        subscribers: Subscribers,
        stats: Arc<DriverStats>,
    ) -> HarmonizationEngine {
        let mut next_tick = Instant::now() + interval;

        loop {
            let timeout = next_tick.saturating_duration_since(Instant::now());
            match commands.recv_timeout(timeout) {
                Ok(Command::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(Command::Config(config)) => {
                    engine.set_config(config);
                    continue;
                }
                Ok(Command::Key(key)) => {
                    engine.set_key(key);
                    continue;
                }
                Ok(Command::Reset) => {
                    engine.reset();
                    continue;
                }
                Err(RecvTimeoutError::Timeout) => {}
            }

            let now = Instant::now();
            next_tick += interval;
            if next_tick < now {
                debug!("Frame driver fell behind, skipping missed ticks");
                next_tick = now + interval;
            }

            engine.set_active(stats.is_active());
            let Some(result) = engine.tick() else { continue };
            if result.is_empty() {
                continue;
            }
            stats.record(&result);
            Self::publish(&subscribers, &stats, result);
        }

        engine.set_active(stats.is_active());
        engine
    }

    fn publish(subscribers: &Subscribers, stats: &DriverStats, result: HarmonizationResult) {
        let Ok(mut subs) = subscribers.lock() else { return };
        subs.retain(|tx| match tx.try_send(result.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                let dropped = stats.dropped_results.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped.is_power_of_two() {
                    warn!(dropped, "Subscriber too slow, dropping results");
                }
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }
}

impl Drop for FrameDriver {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.stop();
        }
    }
}
