//! Counterpoint: free voices at consonant intervals, in contrary motion

use crate::config::HarmonyStyle;
use crate::pitch::{DetectedPitch, BASS_FLOOR};

use super::{fit_range, HarmonizedVoice, VoiceType};

/// Thirds, fourth, fifth and sixths
const CONSONANCES: [u8; 6] = [3, 4, 5, 7, 8, 9];

/// Jazz also treats seconds and sevenths as stable
const JAZZ_CONSONANCES: [u8; 9] = [2, 3, 4, 5, 7, 8, 9, 10, 11];

/// At most two lines move against the melody
const MAX_LINES: usize = 2;

/// Intervals (semitones) a counterpoint voice may sit from the melody
pub fn consonances(style: HarmonyStyle) -> &'static [u8] {
    match style {
        HarmonyStyle::Jazz => &JAZZ_CONSONANCES,
        _ => &CONSONANCES,
    }
}

pub(super) fn harmonize(
    pitch: &DetectedPitch,
    style: HarmonyStyle,
    extra: usize,
    ascending: bool,
    rng: &mut fastrand::Rng,
    voices: &mut Vec<HarmonizedVoice>,
) {
    let intervals = consonances(style);
    let melody = pitch.midi_note as i32;

    for i in 0..extra.min(MAX_LINES) {
        let interval = intervals[rng.usize(..intervals.len())] as i32;
        let up = if i == 0 { ascending } else { !ascending };

        let mut note = if up { melody + interval } else { melody - interval };
        if note > 127 || note < BASS_FLOOR as i32 {
            // No room on this side; reflect across the melody
            note = if up { melody - interval } else { melody + interval };
        }

        let voice_type = if up { VoiceType::Alto } else { VoiceType::for_index(i + 2) };
        voices.push(HarmonizedVoice::harmony(fit_range(note), pitch.velocity, i + 1, voice_type));
    }
}
