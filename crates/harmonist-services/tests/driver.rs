use std::thread;
use std::time::Duration;

use harmonist_core::{
    DetectedKey, DetectedPitch, EngineSettings, HarmonizationConfig, HarmonizationEngine, KeyMode,
};
use harmonist_services::FrameDriver;

const INTERVAL: Duration = Duration::from_millis(2);
const WAIT: Duration = Duration::from_secs(2);

#[test]
fn published_results_follow_the_melody() {
    let mut engine = HarmonizationEngine::new(HarmonizationConfig::default(), EngineSettings::default());
    let mut sender = engine.take_pitch_sender().unwrap();
    let mut driver = FrameDriver::start(engine, INTERVAL).unwrap();
    let results = driver.subscribe();

    for (i, note) in [60u8, 64, 67, 72].into_iter().enumerate() {
        assert!(sender.write(DetectedPitch::new(note, 0.9, 0.8, i as f64)));
        let result = results.recv_timeout(WAIT).unwrap();
        assert_eq!(result.voices[0].midi_note, note);
        assert_eq!(result.pitches_processed, 1);
    }

    let stats = driver.stats();
    assert_eq!(stats.frames(), 4);
    assert_eq!(stats.pitches(), 4);
    assert_eq!(stats.dropped_results(), 0);

    let engine = driver.stop().unwrap();
    assert_eq!(engine.current_key().tonic, 0);
}

#[test]
fn inactive_driver_holds_pitches_until_resumed() {
    let mut engine = HarmonizationEngine::default();
    let mut sender = engine.take_pitch_sender().unwrap();
    let driver = FrameDriver::start(engine, INTERVAL).unwrap();
    let results = driver.subscribe();

    driver.set_active(false);
    // Let any frame that was already running finish
    thread::sleep(Duration::from_millis(20));

    assert!(sender.write(DetectedPitch::new(62, 1.0, 1.0, 0.0)));
    assert!(results.recv_timeout(Duration::from_millis(50)).is_err());

    driver.set_active(true);
    let result = results.recv_timeout(WAIT).unwrap();
    assert_eq!(result.voices[0].midi_note, 62);
}

#[test]
fn manual_key_reaches_the_engine() {
    let config = HarmonizationConfig { auto_detect_key: false, ..Default::default() };
    let mut engine = HarmonizationEngine::new(config, EngineSettings::default());
    let mut sender = engine.take_pitch_sender().unwrap();
    let driver = FrameDriver::start(engine, INTERVAL).unwrap();
    let results = driver.subscribe();

    driver.set_key(DetectedKey::new(7, KeyMode::Major)).unwrap();
    thread::sleep(Duration::from_millis(20));

    assert!(sender.write(DetectedPitch::new(67, 1.0, 1.0, 0.0)));
    let result = results.recv_timeout(WAIT).unwrap();
    assert_eq!(result.key.tonic, 7);
}

#[test]
fn dropped_subscriber_is_pruned() {
    let mut engine = HarmonizationEngine::default();
    let mut sender = engine.take_pitch_sender().unwrap();
    let driver = FrameDriver::start(engine, INTERVAL).unwrap();

    drop(driver.subscribe());
    let live = driver.subscribe();

    assert!(sender.write(DetectedPitch::new(60, 1.0, 1.0, 0.0)));
    assert!(live.recv_timeout(WAIT).is_ok());
}

#[test]
fn paused_engine_starts_a_paused_driver() {
    let mut engine = HarmonizationEngine::default();
    engine.set_active(false);
    let mut sender = engine.take_pitch_sender().unwrap();
    let mut driver = FrameDriver::start(engine, INTERVAL).unwrap();
    let results = driver.subscribe();
    assert!(!driver.is_active());

    assert!(sender.write(DetectedPitch::new(64, 1.0, 1.0, 0.0)));
    assert!(results.recv_timeout(Duration::from_millis(50)).is_err());
    assert_eq!(driver.stats().frames(), 0);

    driver.set_active(true);
    let result = results.recv_timeout(WAIT).unwrap();
    assert_eq!(result.voices[0].midi_note, 64);

    let engine = driver.stop().unwrap();
    assert!(engine.is_active());
}

#[test]
fn stopped_engine_keeps_the_driver_pause() {
    let mut driver = FrameDriver::start(HarmonizationEngine::default(), INTERVAL).unwrap();
    driver.set_active(false);
    let engine = driver.stop().unwrap();
    assert!(!engine.is_active());
}
