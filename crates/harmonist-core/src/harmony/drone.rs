//! Drone: a sustained tonic (and fifth) under whatever the melody does

use crate::key::DetectedKey;
use crate::pitch::DetectedPitch;

use super::{closest_below, HarmonizedVoice, VoiceType};

pub(super) fn harmonize(
    pitch: &DetectedPitch,
    key: &DetectedKey,
    extra: usize,
    voices: &mut Vec<HarmonizedVoice>,
) {
    if extra == 0 {
        return;
    }

    let bass = closest_below(key.tonic, pitch.midi_note as i32 - 12);
    if extra >= 2 {
        let fifth = (bass + 7).min(127);
        voices.push(HarmonizedVoice::harmony(fifth, pitch.velocity, 1, VoiceType::Tenor));
        voices.push(HarmonizedVoice::harmony(bass, pitch.velocity, 2, VoiceType::Bass));
    } else {
        voices.push(HarmonizedVoice::harmony(bass, pitch.velocity, 1, VoiceType::Bass));
    }
}
