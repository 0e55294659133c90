use std::thread;

use harmonist_core::harmony::diatonic_quality;
use harmonist_core::{
    DetectedPitch, EngineSettings, HarmonizationConfig, HarmonizationEngine, HarmonyStyle,
    HarmonyType, KeyMode, VoiceType, BASS_FLOOR,
};

const C_MAJOR_SCALE: [u8; 8] = [60, 62, 64, 65, 67, 69, 71, 72];

fn classical_chordal() -> HarmonizationConfig {
    HarmonizationConfig {
        voice_count: 4,
        style: HarmonyStyle::Classical,
        harmony_type: HarmonyType::Chordal,
        ..Default::default()
    }
}

#[test]
fn scale_converges_to_c_major_with_diatonic_voices() {
    let mut engine = HarmonizationEngine::new(classical_chordal(), EngineSettings::default());

    for (i, &note) in C_MAJOR_SCALE.iter().enumerate() {
        engine.process_pitch(DetectedPitch::new(note, 0.95, 0.8, i as f64 * 0.25));
        let result = engine.process_frame();

        assert_eq!(result.pitches_processed, 1);
        assert_eq!(result.key.tonic, 0, "frame {}", i);
        assert_eq!(result.key.mode, KeyMode::Major, "frame {}", i);
        assert_eq!(result.voices.len(), 4);

        let degree = result.key.scale_degree(note);
        let quality = diatonic_quality(degree, KeyMode::Major, false).expect("scale tones are diatonic");
        let root = note % 12;
        let triad: Vec<u8> = quality.intervals().iter().map(|i| (root + i) % 12).collect();

        for voice in &result.voices {
            assert!(
                triad.contains(&(voice.midi_note % 12)),
                "note {} outside triad {:?} for melody {}",
                voice.midi_note,
                triad,
                note
            );
            assert!(voice.midi_note >= BASS_FLOOR);
        }

        let types: Vec<VoiceType> = result.voices.iter().map(|v| v.voice_type).collect();
        assert_eq!(types, vec![VoiceType::Soprano, VoiceType::Alto, VoiceType::Tenor, VoiceType::Bass]);
    }

    let stats = engine.stats();
    assert_eq!(stats.frames, C_MAJOR_SCALE.len() as u64);
    assert!(stats.max_ms >= stats.average_ms);
}

#[test]
fn low_melody_bass_stays_above_floor() {
    let mut engine = HarmonizationEngine::new(classical_chordal(), EngineSettings::default());
    engine.process_pitch(DetectedPitch::new(40, 1.0, 1.0, 0.0));
    let result = engine.process_frame();

    let bass = result
        .voices
        .iter()
        .find(|v| v.voice_type == VoiceType::Bass)
        .expect("four voices include a bass");
    assert!(bass.midi_note >= BASS_FLOOR);
}

#[test]
fn repeated_context_is_served_from_cache() {
    let mut engine = HarmonizationEngine::new(classical_chordal(), EngineSettings::default());

    for _ in 0..5 {
        engine.process_pitch(DetectedPitch::new(67, 1.0, 0.9, 0.0));
        engine.process_frame();
    }

    assert_eq!(engine.generator_invocations(), 1);
    assert_eq!(engine.cache().hits(), 4);
}

#[test]
fn producer_thread_feeds_frames() {
    let mut engine = HarmonizationEngine::new(classical_chordal(), EngineSettings::default());
    let mut sender = engine.take_pitch_sender().expect("sender available once");

    let producer = thread::spawn(move || {
        let mut written = 0;
        for (i, &note) in C_MAJOR_SCALE.iter().cycle().take(200).enumerate() {
            while !sender.write(DetectedPitch::new(note, 0.9, 0.7, i as f64)) {
                thread::yield_now();
            }
            written += 1;
        }
        written
    });

    let mut processed = 0;
    while processed < 200 {
        let result = engine.process_frame();
        processed += result.pitches_processed;
        if !result.is_empty() {
            assert!(!result.voices.is_empty());
        }
        thread::yield_now();
    }

    assert_eq!(producer.join().unwrap(), 200);
    assert_eq!(processed, 200);
    assert_eq!(engine.current_key().tonic, 0);
    assert_eq!(engine.current_key().mode, KeyMode::Major);
}
