//! Harmony voice generation
//!
//! Every strategy turns one melodic pitch plus the current key into an
//! ordered voice list whose first entry is the melody itself. Output depends
//! only on (pitch, key, config) and, for counterpoint, the injected random
//! source, which is what makes the results cacheable.

mod chordal;
mod counterpoint;
mod drone;
mod parallel;

use serde::{Deserialize, Serialize};

use crate::config::{HarmonizationConfig, HarmonyType};
use crate::key::DetectedKey;
use crate::pitch::{DetectedPitch, BASS_FLOOR};

pub use chordal::diatonic_quality;
pub use counterpoint::consonances;
pub use parallel::parallel_offsets;

/// Velocity lost per harmony voice, relative to the melody
const VELOCITY_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceType {
    Soprano,
    Alto,
    Tenor,
    Bass,
}

impl VoiceType {
    /// Voice type by position in the output list
    pub fn for_index(index: usize) -> Self {
        match index {
            0 => Self::Soprano,
            1 => Self::Alto,
            2 => Self::Tenor,
            _ => Self::Bass,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HarmonizedVoice {
    pub midi_note: u8,
    pub velocity: f64,
    pub voice_type: VoiceType,
}

impl HarmonizedVoice {
    fn melody(pitch: &DetectedPitch) -> Self {
        Self {
            midi_note: pitch.midi_note,
            velocity: pitch.velocity,
            voice_type: VoiceType::Soprano,
        }
    }

    /// Harmony voice `index` (1-based), attenuated relative to the melody
    fn harmony(midi_note: u8, melody_velocity: f64, index: usize, voice_type: VoiceType) -> Self {
        let gain = (1.0 - VELOCITY_STEP * index as f64).max(0.0);
        Self {
            midi_note,
            velocity: melody_velocity * gain,
            voice_type,
        }
    }

    /// Copy with the velocity multiplied by `gain`
    pub fn scaled(&self, gain: f64) -> Self {
        Self {
            velocity: (self.velocity * gain).clamp(0.0, 1.0),
            ..*self
        }
    }
}

/// Highest note at or below `anchor` with pitch class `pc`, raised by
/// octaves onto the bass floor
pub(crate) fn closest_below(pc: u8, anchor: i32) -> u8 {
    let anchor = anchor.min(127);
    let mut note = anchor - (anchor - pc as i32).rem_euclid(12);
    while note < BASS_FLOOR as i32 {
        note += 12;
    }
    note as u8
}

/// Fold a note into BASS_FLOOR..=127 by whole octaves
pub(crate) fn fit_range(note: i32) -> u8 {
    let mut note = note;
    while note < BASS_FLOOR as i32 {
        note += 12;
    }
    while note > 127 {
        note -= 12;
    }
    note as u8
}

/// Strategy used by `Mixed` for a scale degree: chords on the stable
/// degrees, parallel motion on the passing ones, counterpoint elsewhere
pub fn mixed_strategy(degree: u8) -> HarmonyType {
    match degree {
        0 | 4 | 7 => HarmonyType::Chordal,
        2 | 5 | 9 | 11 => HarmonyType::Parallel,
        _ => HarmonyType::Counterpoint,
    }
}

/// Harmony generator with an injected, seeded random source
#[derive(Debug, Clone)]
pub struct HarmonyGenerator {
    rng: fastrand::Rng,
    /// Direction of the first counterpoint voice; flips every call
    ascending: bool,
    invocations: u64,
}

impl HarmonyGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            ascending: false,
            invocations: 0,
        }
    }

    /// Number of times a strategy actually ran
    pub fn invocations(&self) -> u64 {
        self.invocations
    }

    pub fn generate(
        &mut self,
        pitch: &DetectedPitch,
        key: &DetectedKey,
        config: &HarmonizationConfig,
    ) -> Vec<HarmonizedVoice> {
        self.invocations += 1;
        let config = config.sanitized();

        let strategy = match config.harmony_type {
            HarmonyType::Mixed => mixed_strategy(key.scale_degree(pitch.midi_note)),
            other => other,
        };

        let mut voices = Vec::with_capacity(config.voice_count as usize);
        voices.push(HarmonizedVoice::melody(pitch));

        let extra = config.voice_count as usize - 1;
        match strategy {
            HarmonyType::Chordal => chordal::harmonize(pitch, key, &config, extra, &mut voices),
            HarmonyType::Parallel => parallel::harmonize(pitch, config.style, extra, &mut voices),
            HarmonyType::Drone => drone::harmonize(pitch, key, extra, &mut voices),
            HarmonyType::Counterpoint | HarmonyType::Mixed => {
                counterpoint::harmonize(pitch, config.style, extra, self.ascending, &mut self.rng, &mut voices);
                self.ascending = !self.ascending;
            }
        }
        voices
    }
}

impl Default for HarmonyGenerator {
    fn default() -> Self {
        Self::new(crate::config::EngineSettings::default().seed)
    }
}
