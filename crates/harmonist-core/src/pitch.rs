//! Detected pitch events and MIDI helpers

use serde::{Deserialize, Serialize};

pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Lowest note any generated harmony voice may sound (E1)
pub const BASS_FLOOR: u8 = 28;

/// Pitch class (0-11) of a MIDI note
pub fn pitch_class(midi_note: u8) -> u8 {
    midi_note % 12
}

/// Equal-tempered frequency of a MIDI note, A4 = 440 Hz
pub fn midi_to_frequency(midi_note: u8) -> f64 {
    440.0 * 2f64.powf((midi_note as f64 - 69.0) / 12.0)
}

/// A pitch reported by the external detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectedPitch {
    pub midi_note: u8,
    pub frequency: f64,
    /// Detector confidence, 0.0-1.0
    pub confidence: f64,
    /// Normalized velocity, 0.0-1.0
    pub velocity: f64,
    /// Seconds, detector clock
    pub timestamp: f64,
}

impl DetectedPitch {
    /// Build a pitch with the frequency derived from the note
    pub fn new(midi_note: u8, confidence: f64, velocity: f64, timestamp: f64) -> Self {
        let midi_note = midi_note.min(127);
        Self {
            midi_note,
            frequency: midi_to_frequency(midi_note),
            confidence: clamp_unit(confidence),
            velocity: clamp_unit(velocity),
            timestamp,
        }
    }

    /// Override the derived frequency with the detector's measurement
    pub fn with_frequency(mut self, frequency: f64) -> Self {
        if frequency.is_finite() && frequency > 0.0 {
            self.frequency = frequency;
        }
        self
    }

    pub fn pitch_class(&self) -> u8 {
        pitch_class(self.midi_note)
    }

    /// Note name with octave, e.g. "C4" for MIDI 60
    pub fn name(&self) -> String {
        let octave = self.midi_note as i32 / 12 - 1;
        format!("{}{}", NOTE_NAMES[self.pitch_class() as usize], octave)
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}
