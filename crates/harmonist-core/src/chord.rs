//! Real-time chord recognition by template matching

use serde::{Deserialize, Serialize};

use crate::pitch::{pitch_class, NOTE_NAMES};

/// Best score must be strictly above this to report a chord
pub const ACCEPT_THRESHOLD: i32 = 15;

/// Points per matched pitch class
pub const OVERLAP_WEIGHT: i32 = 10;

/// Points lost per pitch class of size difference between input and template
pub const CARDINALITY_PENALTY: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Dominant7,
    Major7,
    Minor7,
    Diminished7,
    HalfDiminished7,
    Sus2,
    Sus4,
}

impl ChordQuality {
    /// Catalogue order; earlier entries win score ties
    pub const ALL: [ChordQuality; 11] = [
        Self::Major,
        Self::Minor,
        Self::Diminished,
        Self::Augmented,
        Self::Dominant7,
        Self::Major7,
        Self::Minor7,
        Self::Diminished7,
        Self::HalfDiminished7,
        Self::Sus2,
        Self::Sus4,
    ];

    /// Semitones above the root
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            Self::Major => &[0, 4, 7],
            Self::Minor => &[0, 3, 7],
            Self::Diminished => &[0, 3, 6],
            Self::Augmented => &[0, 4, 8],
            Self::Dominant7 => &[0, 4, 7, 10],
            Self::Major7 => &[0, 4, 7, 11],
            Self::Minor7 => &[0, 3, 7, 10],
            Self::Diminished7 => &[0, 3, 6, 9],
            Self::HalfDiminished7 => &[0, 3, 6, 10],
            Self::Sus2 => &[0, 2, 7],
            Self::Sus4 => &[0, 5, 7],
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Major => "",
            Self::Minor => "m",
            Self::Diminished => "dim",
            Self::Augmented => "aug",
            Self::Dominant7 => "7",
            Self::Major7 => "maj7",
            Self::Minor7 => "m7",
            Self::Diminished7 => "dim7",
            Self::HalfDiminished7 => "m7b5",
            Self::Sus2 => "sus2",
            Self::Sus4 => "sus4",
        }
    }

    /// Pitch-class bitmask of the chord built on `root`
    fn mask(&self, root: u8) -> u16 {
        self.intervals()
            .iter()
            .fold(0u16, |mask, &i| mask | 1 << ((root + i) % 12))
    }
}

/// A chord recognized from the notes of one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealTimeChord {
    /// Root pitch class, 0-11
    pub root: u8,
    pub quality: ChordQuality,
    /// Bass pitch class when it is not the root (slash chord)
    pub bass: Option<u8>,
}

impl RealTimeChord {
    /// Pitch classes of the chord, root first
    pub fn pitch_classes(&self) -> Vec<u8> {
        self.quality
            .intervals()
            .iter()
            .map(|&i| (self.root + i) % 12)
            .collect()
    }

    pub fn name(&self) -> String {
        let mut name = format!("{}{}", NOTE_NAMES[self.root as usize], self.quality.symbol());
        if let Some(bass) = self.bass {
            name.push('/');
            name.push_str(NOTE_NAMES[bass as usize]);
        }
        name
    }
}

/// Score of one (root, quality) hypothesis against a pitch-class set
fn score(pcs: u16, root: u8, quality: ChordQuality) -> i32 {
    let template = quality.mask(root);
    let overlap = (pcs & template).count_ones() as i32;
    let size_diff = (pcs.count_ones() as i32 - template.count_ones() as i32).abs();
    overlap * OVERLAP_WEIGHT - size_diff * CARDINALITY_PENALTY
}

/// Recognize a chord from MIDI notes.
///
/// The first note is taken as the sounding bass; it is reported only when
/// it differs from the recognized root.
pub fn recognize(notes: &[u8]) -> Option<RealTimeChord> {
    let first = *notes.first()?;
    let pcs = notes.iter().fold(0u16, |mask, &n| mask | 1 << pitch_class(n));

    let mut best: Option<(i32, u8, ChordQuality)> = None;
    for root in 0..12u8 {
        for quality in ChordQuality::ALL {
            let s = score(pcs, root, quality);
            if best.is_none_or(|(b, _, _)| s > b) {
                best = Some((s, root, quality));
            }
        }
    }

    let (best_score, root, quality) = best?;
    if best_score <= ACCEPT_THRESHOLD {
        return None;
    }

    let bass = pitch_class(first);
    Some(RealTimeChord {
        root,
        quality,
        bass: (bass != root).then_some(bass),
    })
}

/// Recognizer kept by the engine; remembers the last accepted chord
#[derive(Debug, Clone, Default)]
pub struct ChordRecognizer {
    last: Option<RealTimeChord>,
}

impl ChordRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recognize(&mut self, notes: &[u8]) -> Option<RealTimeChord> {
        let chord = recognize(notes);
        if chord.is_some() {
            self.last = chord;
        }
        chord
    }

    /// Most recent chord that cleared the threshold
    pub fn last_chord(&self) -> Option<RealTimeChord> {
        self.last
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
