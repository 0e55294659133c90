//! Parallel harmonization: fixed offsets that move with the melody

use crate::config::HarmonyStyle;
use crate::pitch::DetectedPitch;

use super::{fit_range, HarmonizedVoice, VoiceType};

/// Semitone offsets below the melody for each style, nearest voice first
pub fn parallel_offsets(style: HarmonyStyle) -> &'static [i32] {
    match style {
        HarmonyStyle::Classical => &[-3, -8, -12],
        HarmonyStyle::Jazz => &[-3, -5, -10],
        HarmonyStyle::Pop => &[-12, -5],
        HarmonyStyle::Gospel => &[-3, -5, -7],
        HarmonyStyle::Barbershop => &[-4, -7, -12],
        HarmonyStyle::Orchestral => &[-7, -12, -19],
    }
}

pub(super) fn harmonize(
    pitch: &DetectedPitch,
    style: HarmonyStyle,
    extra: usize,
    voices: &mut Vec<HarmonizedVoice>,
) {
    let melody = pitch.midi_note as i32;
    for (i, &offset) in parallel_offsets(style).iter().take(extra).enumerate() {
        let note = fit_range(melody + offset);
        voices.push(HarmonizedVoice::harmony(note, pitch.velocity, i + 1, VoiceType::for_index(i + 1)));
    }
}
