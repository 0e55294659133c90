//! Chordal harmonization: block chords under the melody

use crate::chord::ChordQuality;
use crate::config::{HarmonizationConfig, HarmonyStyle};
use crate::key::{DetectedKey, KeyMode};
use crate::pitch::DetectedPitch;

use super::{closest_below, HarmonizedVoice, VoiceType};

/// Diatonic chord quality rooted on a scale degree (semitones above the
/// tonic), or `None` for chromatic degrees
pub fn diatonic_quality(degree: u8, mode: KeyMode, sevenths: bool) -> Option<ChordQuality> {
    use ChordQuality::*;

    let quality = match (mode, sevenths, degree) {
        (KeyMode::Major, false, 0 | 5 | 7) => Major,
        (KeyMode::Major, false, 2 | 4 | 9) => Minor,
        (KeyMode::Major, false, 11) => Diminished,

        (KeyMode::Major, true, 0 | 5) => Major7,
        (KeyMode::Major, true, 2 | 4 | 9) => Minor7,
        (KeyMode::Major, true, 7) => Dominant7,
        (KeyMode::Major, true, 11) => HalfDiminished7,

        (KeyMode::Minor, false, 0 | 5 | 7) => Minor,
        (KeyMode::Minor, false, 2) => Diminished,
        (KeyMode::Minor, false, 3 | 8 | 10) => Major,

        (KeyMode::Minor, true, 0 | 5 | 7) => Minor7,
        (KeyMode::Minor, true, 2) => HalfDiminished7,
        (KeyMode::Minor, true, 3 | 8) => Major7,
        (KeyMode::Minor, true, 10) => Dominant7,

        _ => return None,
    };
    Some(quality)
}

pub(super) fn harmonize(
    pitch: &DetectedPitch,
    key: &DetectedKey,
    config: &HarmonizationConfig,
    extra: usize,
    voices: &mut Vec<HarmonizedVoice>,
) {
    let degree = key.scale_degree(pitch.midi_note);
    let sevenths = config.style == HarmonyStyle::Jazz;
    let quality = diatonic_quality(degree, key.mode, sevenths).unwrap_or(ChordQuality::Diminished);

    let root = pitch.pitch_class();
    let intervals = quality.intervals();
    let third = (root + intervals[1]) % 12;
    // Fifth of a triad, seventh of a seventh chord
    let upper = (root + intervals[intervals.len() - 1]) % 12;

    let melody = pitch.midi_note as i32;
    let targets = [
        (VoiceType::Alto, third, melody - 5),
        (VoiceType::Tenor, upper, melody - 12),
        (VoiceType::Bass, root, melody - 24),
    ];

    for (i, &(voice_type, pc, anchor)) in targets.iter().take(extra).enumerate() {
        let note = closest_below(pc, anchor);
        voices.push(HarmonizedVoice::harmony(note, pitch.velocity, i + 1, voice_type));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarmonyType;
    use crate::harmony::HarmonyGenerator;
    use crate::pitch::BASS_FLOOR;

    fn chordal(voice_count: u8, style: HarmonyStyle) -> HarmonizationConfig {
        HarmonizationConfig {
            voice_count,
            style,
            harmony_type: HarmonyType::Chordal,
            ..Default::default()
        }
    }

    fn notes(voices: &[HarmonizedVoice]) -> Vec<u8> {
        voices.iter().map(|v| v.midi_note).collect()
    }

    #[test]
    fn test_tonic_triad_placement() {
        let key = DetectedKey::new(0, KeyMode::Major);
        let mut generator = HarmonyGenerator::new(0);
        let voices = generator.generate(&DetectedPitch::new(72, 1.0, 1.0, 0.0), &key, &chordal(4, HarmonyStyle::Classical));

        assert_eq!(notes(&voices), vec![72, 64, 55, 48]);
        let types: Vec<VoiceType> = voices.iter().map(|v| v.voice_type).collect();
        assert_eq!(types, vec![VoiceType::Soprano, VoiceType::Alto, VoiceType::Tenor, VoiceType::Bass]);
    }

    #[test]
    fn test_supertonic_is_minor() {
        let key = DetectedKey::new(0, KeyMode::Major);
        let mut generator = HarmonyGenerator::new(0);
        let voices = generator.generate(&DetectedPitch::new(74, 1.0, 1.0, 0.0), &key, &chordal(4, HarmonyStyle::Classical));

        // D minor: F, A, D
        assert_eq!(notes(&voices), vec![74, 65, 57, 50]);
    }

    #[test]
    fn test_bass_floor_for_low_melody() {
        let key = DetectedKey::new(0, KeyMode::Major);
        let mut generator = HarmonyGenerator::new(0);
        let voices = generator.generate(&DetectedPitch::new(40, 1.0, 1.0, 0.0), &key, &chordal(4, HarmonyStyle::Classical));

        assert_eq!(voices.len(), 4);
        let bass = voices[3];
        assert_eq!(bass.voice_type, VoiceType::Bass);
        assert!(bass.midi_note >= BASS_FLOOR);
        assert_eq!(bass.midi_note % 12, 4);
        assert!(voices.iter().all(|v| v.midi_note >= BASS_FLOOR));
    }

    #[test]
    fn test_chromatic_degree_falls_back_to_diminished() {
        let key = DetectedKey::new(0, KeyMode::Major);
        let mut generator = HarmonyGenerator::new(0);
        // C# over C major: C#, E, G
        let voices = generator.generate(&DetectedPitch::new(73, 1.0, 1.0, 0.0), &key, &chordal(4, HarmonyStyle::Classical));
        let classes: Vec<u8> = voices.iter().map(|v| v.midi_note % 12).collect();
        assert_eq!(classes, vec![1, 4, 7, 1]);
    }

    #[test]
    fn test_jazz_uses_sevenths() {
        let key = DetectedKey::new(0, KeyMode::Major);
        let mut generator = HarmonyGenerator::new(0);
        // G7: alto B, tenor F, bass G
        let voices = generator.generate(&DetectedPitch::new(79, 1.0, 1.0, 0.0), &key, &chordal(4, HarmonyStyle::Jazz));
        let classes: Vec<u8> = voices.iter().map(|v| v.midi_note % 12).collect();
        assert_eq!(classes, vec![7, 11, 5, 7]);
    }

    #[test]
    fn test_minor_key_table() {
        assert_eq!(diatonic_quality(0, KeyMode::Minor, false), Some(ChordQuality::Minor));
        assert_eq!(diatonic_quality(3, KeyMode::Minor, false), Some(ChordQuality::Major));
        assert_eq!(diatonic_quality(2, KeyMode::Minor, true), Some(ChordQuality::HalfDiminished7));
        assert_eq!(diatonic_quality(4, KeyMode::Minor, false), None);
        assert_eq!(diatonic_quality(11, KeyMode::Major, false), Some(ChordQuality::Diminished));
    }

    #[test]
    fn test_fewer_voices_drop_from_the_bottom() {
        let key = DetectedKey::new(0, KeyMode::Major);
        let mut generator = HarmonyGenerator::new(0);
        let voices = generator.generate(&DetectedPitch::new(72, 1.0, 1.0, 0.0), &key, &chordal(2, HarmonyStyle::Classical));
        assert_eq!(notes(&voices), vec![72, 64]);
    }
}
