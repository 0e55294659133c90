//! Key tracking with a windowed pitch-class histogram and
//! Krumhansl-Schmuckler profile correlation

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::pitch::{pitch_class, NOTE_NAMES};

/// Krumhansl-Kessler major key profile
pub const MAJOR_PROFILE: [f64; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Krumhansl-Kessler minor key profile
pub const MINOR_PROFILE: [f64; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

/// Default number of recent pitch classes kept in the histogram
pub const DEFAULT_WINDOW: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    #[default]
    Major,
    Minor,
}

impl KeyMode {
    pub fn profile(&self) -> &'static [f64; 12] {
        match self {
            Self::Major => &MAJOR_PROFILE,
            Self::Minor => &MINOR_PROFILE,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
        }
    }
}

/// Best-fit key for the current histogram
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectedKey {
    /// Tonic pitch class, 0-11
    pub tonic: u8,
    pub mode: KeyMode,
    /// Raw Pearson correlation with the winning profile (-1.0..=1.0)
    pub confidence: f64,
}

impl DetectedKey {
    pub fn new(tonic: u8, mode: KeyMode) -> Self {
        Self { tonic: tonic % 12, mode, confidence: 0.0 }
    }

    /// Semitones from the tonic up to the note's pitch class
    pub fn scale_degree(&self, midi_note: u8) -> u8 {
        (pitch_class(midi_note) + 12 - self.tonic % 12) % 12
    }

    pub fn name(&self) -> String {
        format!("{} {}", NOTE_NAMES[(self.tonic % 12) as usize], self.mode.name())
    }

    /// Same tonic and mode, ignoring confidence
    pub fn same_key(&self, other: &DetectedKey) -> bool {
        self.tonic == other.tonic && self.mode == other.mode
    }
}

/// Windowed pitch-class histogram.
///
/// Old observations leave the histogram exactly when they fall out of the
/// window, so counts never drift.
#[derive(Debug, Clone)]
pub struct KeyTracker {
    histogram: [u32; 12],
    window: VecDeque<u8>,
    window_size: usize,
}

impl Default for KeyTracker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl KeyTracker {
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            histogram: [0; 12],
            window: VecDeque::with_capacity(window_size + 1),
            window_size,
        }
    }

    pub fn add_pitch(&mut self, midi_note: u8) {
        let pc = pitch_class(midi_note);
        self.histogram[pc as usize] += 1;
        self.window.push_back(pc);

        if self.window.len() > self.window_size {
            if let Some(old) = self.window.pop_front() {
                let bucket = &mut self.histogram[old as usize];
                *bucket = bucket.saturating_sub(1);
            }
        }
    }

    pub fn histogram(&self) -> &[u32; 12] {
        &self.histogram
    }

    /// Pitches currently inside the window
    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn reset(&mut self) {
        self.histogram = [0; 12];
        self.window.clear();
    }

    /// Histogram as a probability distribution; all zero when empty
    pub fn distribution(&self) -> [f64; 12] {
        let total: u32 = self.histogram.iter().sum();
        let mut dist = [0.0; 12];
        if total == 0 {
            return dist;
        }
        for (d, &count) in dist.iter_mut().zip(&self.histogram) {
            *d = count as f64 / total as f64;
        }
        dist
    }

    /// All 24 candidate keys in evaluation order: tonic ascending,
    /// major before minor
    pub fn correlations(&self) -> Vec<DetectedKey> {
        let dist = self.distribution();
        let mut keys = Vec::with_capacity(24);
        for tonic in 0..12u8 {
            for mode in [KeyMode::Major, KeyMode::Minor] {
                keys.push(DetectedKey {
                    tonic,
                    mode,
                    confidence: profile_correlation(&dist, mode.profile(), tonic),
                });
            }
        }
        keys
    }

    /// Highest-correlating key; the first maximum wins ties
    pub fn current_key(&self) -> DetectedKey {
        let mut best = DetectedKey { tonic: 0, mode: KeyMode::Major, confidence: f64::NEG_INFINITY };
        for candidate in self.correlations() {
            if candidate.confidence > best.confidence {
                best = candidate;
            }
        }
        if best.confidence.is_finite() { best } else { DetectedKey::default() }
    }
}

/// Pearson correlation between a distribution and a profile rotated so that
/// its first entry sits on `tonic`
fn profile_correlation(dist: &[f64; 12], profile: &[f64; 12], tonic: u8) -> f64 {
    let mut rotated = [0.0; 12];
    for (pc, r) in rotated.iter_mut().enumerate() {
        *r = profile[(pc + 12 - tonic as usize) % 12];
    }

    let n = 12.0;
    let mean_x = dist.iter().sum::<f64>() / n;
    let mean_y = rotated.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in dist.iter().zip(&rotated) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom > 1e-12 { cov / denom } else { 0.0 }
}
