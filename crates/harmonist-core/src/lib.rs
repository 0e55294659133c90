//! harmonist-core: real-time key tracking, chord recognition and
//! harmony voice generation

pub mod cache;
pub mod channel;
pub mod chord;
mod config;
mod engine;
pub mod harmony;
pub mod key;
mod monitor;
mod pitch;

pub use cache::{CacheKey, FifoCache, HarmonizationCache};
pub use channel::{pitch_channel, PitchReceiver, PitchSender};
pub use chord::{recognize, ChordQuality, ChordRecognizer, RealTimeChord};
pub use config::{EngineSettings, HarmonizationConfig, HarmonyStyle, HarmonyType};
pub use config::{DEFAULT_MAX_LATENCY_MS, MAX_VOICES, MIN_VOICES};
pub use engine::{HarmonizationEngine, HarmonizationResult};
pub use harmony::{HarmonizedVoice, HarmonyGenerator, VoiceType};
pub use key::{DetectedKey, KeyMode, KeyTracker};
pub use monitor::{PerformanceMonitor, PerformanceStats};
pub use pitch::{midi_to_frequency, pitch_class, DetectedPitch, BASS_FLOOR, NOTE_NAMES};
