//! Harmonization and engine configuration

use serde::{Deserialize, Serialize};

use crate::channel;
use crate::key;

/// Musical style; selects interval sets for parallel and counterpoint
/// voices and the chord vocabulary for chordal voices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarmonyStyle {
    #[default]
    Classical,
    Jazz,
    Pop,
    Gospel,
    Barbershop,
    Orchestral,
}

impl HarmonyStyle {
    pub const ALL: [HarmonyStyle; 6] = [
        Self::Classical,
        Self::Jazz,
        Self::Pop,
        Self::Gospel,
        Self::Barbershop,
        Self::Orchestral,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Classical => "Classical",
            Self::Jazz => "Jazz",
            Self::Pop => "Pop",
            Self::Gospel => "Gospel",
            Self::Barbershop => "Barbershop",
            Self::Orchestral => "Orchestral",
        }
    }
}

/// Voice generation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarmonyType {
    #[default]
    Chordal,
    Counterpoint,
    Drone,
    Parallel,
    /// Picks a strategy per note from the stability of its scale degree
    Mixed,
}

pub const MIN_VOICES: u8 = 1;
pub const MAX_VOICES: u8 = 4;
pub const DEFAULT_MAX_LATENCY_MS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarmonizationConfig {
    /// Total voices including the melody, 1-4
    pub voice_count: u8,
    pub style: HarmonyStyle,
    pub auto_detect_key: bool,
    pub use_cache: bool,
    /// Latency budget per frame; measured and reported, never enforced
    pub max_latency_ms: f64,
    pub harmony_type: HarmonyType,
}

impl Default for HarmonizationConfig {
    fn default() -> Self {
        Self {
            voice_count: MAX_VOICES,
            style: HarmonyStyle::Classical,
            auto_detect_key: true,
            use_cache: true,
            max_latency_ms: DEFAULT_MAX_LATENCY_MS,
            harmony_type: HarmonyType::Chordal,
        }
    }
}

impl HarmonizationConfig {
    /// Copy with out-of-range values pulled back into range
    pub fn sanitized(&self) -> Self {
        let max_latency_ms = if self.max_latency_ms.is_finite() && self.max_latency_ms > 0.0 {
            self.max_latency_ms
        } else {
            DEFAULT_MAX_LATENCY_MS
        };
        Self {
            voice_count: self.voice_count.clamp(MIN_VOICES, MAX_VOICES),
            max_latency_ms,
            ..*self
        }
    }
}

/// Sizing of the engine's fixed resources, chosen once at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub channel_capacity: usize,
    pub key_window: usize,
    pub cache_size: usize,
    /// Period of the frame cycle when driven by a timer
    pub frame_interval_ms: u64,
    /// Seed for the counterpoint random source
    pub seed: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            channel_capacity: channel::DEFAULT_CAPACITY,
            key_window: key::DEFAULT_WINDOW,
            cache_size: crate::cache::DEFAULT_MAX_SIZE,
            frame_interval_ms: 10,
            seed: 0x5eed_cafe,
        }
    }
}
