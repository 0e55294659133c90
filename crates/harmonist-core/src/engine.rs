//! The frame cycle: drain pitches, track key and chord, harmonize

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, HarmonizationCache};
use crate::channel::{pitch_channel, PitchReceiver, PitchSender};
use crate::chord::{ChordRecognizer, RealTimeChord};
use crate::config::{EngineSettings, HarmonizationConfig};
use crate::harmony::{HarmonizedVoice, HarmonyGenerator};
use crate::key::{DetectedKey, KeyTracker};
use crate::monitor::{PerformanceMonitor, PerformanceStats};
use crate::pitch::DetectedPitch;

/// Output of one frame
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HarmonizationResult {
    /// Melody first, then harmony voices
    pub voices: Vec<HarmonizedVoice>,
    pub key: DetectedKey,
    pub chord: Option<RealTimeChord>,
    pub latency_ms: f64,
    /// Pitches drained from the channel this frame
    pub pitches_processed: usize,
}

impl HarmonizationResult {
    fn idle(key: DetectedKey) -> Self {
        Self { key, ..Default::default() }
    }

    /// True for the no-op result of a frame with no input
    pub fn is_empty(&self) -> bool {
        self.pitches_processed == 0
    }
}

/// Real-time harmonization engine.
///
/// Everything here runs on the consumer side. The only state shared with
/// the producer is the pitch channel; hand its sending half to the audio
/// thread with [`HarmonizationEngine::take_pitch_sender`].
pub struct HarmonizationEngine {
    config: HarmonizationConfig,
    settings: EngineSettings,
    sender: Option<PitchSender>,
    receiver: PitchReceiver,
    key_tracker: KeyTracker,
    chords: ChordRecognizer,
    generator: HarmonyGenerator,
    cache: HarmonizationCache,
    monitor: PerformanceMonitor,
    current_key: DetectedKey,
    manual_key: DetectedKey,
    batch: Vec<DetectedPitch>,
    notes: Vec<u8>,
    active: bool,
    dropped_pitches: u64,
    reported_drops: u64,
}

impl HarmonizationEngine {
    pub fn new(config: HarmonizationConfig, settings: EngineSettings) -> Self {
        let config = config.sanitized();
        let (sender, receiver) = pitch_channel(settings.channel_capacity);
        let capacity = receiver.capacity();

        Self {
            config,
            settings,
            sender: Some(sender),
            receiver,
            key_tracker: KeyTracker::new(settings.key_window),
            chords: ChordRecognizer::new(),
            generator: HarmonyGenerator::new(settings.seed),
            cache: HarmonizationCache::new(settings.cache_size),
            monitor: PerformanceMonitor::new(config.max_latency_ms),
            current_key: DetectedKey::default(),
            manual_key: DetectedKey::default(),
            batch: Vec::with_capacity(capacity),
            notes: Vec::with_capacity(capacity),
            active: true,
            dropped_pitches: 0,
            reported_drops: 0,
        }
    }

    /// Queue a detected pitch. Never blocks and never logs; drops the pitch
    /// when the channel is full or the sender has been handed off. Overflow
    /// is reported by the next `process_frame`.
    pub fn process_pitch(&mut self, pitch: DetectedPitch) {
        let Some(sender) = self.sender.as_mut() else { return };
        if !sender.write(pitch) {
            self.dropped_pitches += 1;
        }
    }

    /// Hand the producer half to a real-time thread. Returns `None` if it
    /// was already taken.
    pub fn take_pitch_sender(&mut self) -> Option<PitchSender> {
        self.sender.take()
    }

    /// Run one frame
    pub fn process_frame(&mut self) -> HarmonizationResult {
        let start = Instant::now();

        if self.dropped_pitches != self.reported_drops {
            warn!(
                dropped = self.dropped_pitches - self.reported_drops,
                total = self.dropped_pitches,
                "Pitch channel full, input was dropped"
            );
            self.reported_drops = self.dropped_pitches;
        }

        self.batch.clear();
        self.receiver.drain_into(&mut self.batch);
        if self.batch.is_empty() {
            return HarmonizationResult::idle(self.current_key);
        }

        self.update_key();

        self.notes.clear();
        self.notes.extend(self.batch.iter().map(|p| p.midi_note));
        let chord = self.chords.recognize(&self.notes);

        let voices = match melodic_anchor(&self.batch) {
            Some(anchor) => self.harmonize(&anchor),
            None => Vec::new(),
        };

        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.monitor.record(latency_ms);

        HarmonizationResult {
            voices,
            key: self.current_key,
            chord,
            latency_ms,
            pitches_processed: self.batch.len(),
        }
    }

    /// Run one frame if the engine is active
    pub fn tick(&mut self) -> Option<HarmonizationResult> {
        if !self.active {
            return None;
        }
        Some(self.process_frame())
    }

    fn update_key(&mut self) {
        if !self.config.auto_detect_key {
            self.current_key = self.manual_key;
            return;
        }

        for pitch in &self.batch {
            self.key_tracker.add_pitch(pitch.midi_note);
        }
        let key = self.key_tracker.current_key();
        if !key.same_key(&self.current_key) {
            debug!(key = %key.name(), confidence = key.confidence, "Key changed");
        }
        self.current_key = key;
    }

    fn harmonize(&mut self, anchor: &DetectedPitch) -> Vec<HarmonizedVoice> {
        let key = self.current_key;
        let config = self.config;

        if !config.use_cache {
            return self.generator.generate(anchor, &key, &config);
        }

        // Cached voicings are velocity independent; scale on the way out
        let unit = DetectedPitch { velocity: 1.0, ..*anchor };
        let cache_key = CacheKey::new(anchor.midi_note, key.tonic, key.mode, config.style);
        let generator = &mut self.generator;
        self.cache
            .get_or_insert_with(cache_key, || generator.generate(&unit, &key, &config))
            .iter()
            .map(|v| v.scaled(anchor.velocity))
            .collect()
    }

    pub fn config(&self) -> &HarmonizationConfig {
        &self.config
    }

    /// Replace the configuration between frames. Out-of-range values are
    /// clamped. Cached voicings are dropped when the voice count or harmony
    /// type changes, since neither is part of the cache key.
    pub fn set_config(&mut self, config: HarmonizationConfig) {
        let config = config.sanitized();
        if config.voice_count != self.config.voice_count || config.harmony_type != self.config.harmony_type {
            self.cache.clear();
        }
        if !config.auto_detect_key {
            self.current_key = self.manual_key;
        }
        self.monitor.set_budget(config.max_latency_ms);
        self.config = config;
        info!(?config, "Harmonization config updated");
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Key used while auto-detection is off
    pub fn set_key(&mut self, key: DetectedKey) {
        self.manual_key = DetectedKey { tonic: key.tonic % 12, ..key };
        if !self.config.auto_detect_key {
            self.current_key = self.manual_key;
        }
    }

    pub fn current_key(&self) -> DetectedKey {
        self.current_key
    }

    pub fn last_chord(&self) -> Option<RealTimeChord> {
        self.chords.last_chord()
    }

    pub fn key_tracker(&self) -> &KeyTracker {
        &self.key_tracker
    }

    pub fn cache(&self) -> &HarmonizationCache {
        &self.cache
    }

    /// How many voicings were computed rather than served from cache
    pub fn generator_invocations(&self) -> u64 {
        self.generator.invocations()
    }

    pub fn stats(&self) -> PerformanceStats {
        self.monitor.stats()
    }

    pub fn dropped_pitches(&self) -> u64 {
        self.dropped_pitches
    }

    /// Drops not yet reported by a frame
    pub fn unreported_drops(&self) -> u64 {
        self.dropped_pitches - self.reported_drops
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Gates `tick`; a frame already running is never interrupted
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Clear histogram, cache and statistics. Configuration is kept.
    pub fn reset(&mut self) {
        self.key_tracker.reset();
        self.chords.reset();
        self.cache.clear();
        self.monitor.reset();
        self.current_key = self.manual_key;
        self.dropped_pitches = 0;
        self.reported_drops = 0;
        info!("Harmonization engine reset");
    }
}

impl Default for HarmonizationEngine {
    fn default() -> Self {
        Self::new(HarmonizationConfig::default(), EngineSettings::default())
    }
}

/// Highest-confidence pitch of the batch; the earliest wins ties
fn melodic_anchor(batch: &[DetectedPitch]) -> Option<DetectedPitch> {
    batch
        .iter()
        .copied()
        .reduce(|best, p| if p.confidence > best.confidence { p } else { best })
}
