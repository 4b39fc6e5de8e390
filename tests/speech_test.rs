//! Integration tests for the real speech backends
//!
//! These exercise whatever engine the host has. Headless CI machines
//! usually have none, so absence is reported rather than failed.

use readaloud::speech::{create_provider, BackendKind, SpeechEvent, Utterance};
use std::time::{Duration, Instant};

const POLL: Duration = Duration::from_secs(5);

#[test]
fn test_create_provider() {
    match create_provider(BackendKind::Auto, POLL) {
        Ok(provider) => println!("✓ Created speech provider: {}", provider.name()),
        Err(e) => println!("⚠ No speech provider (may be expected): {}", e),
    }
}

#[test]
fn test_list_voices() {
    let Ok(mut provider) = create_provider(BackendKind::Auto, POLL) else {
        println!("⚠ Skipping voice listing (TTS not available)");
        return;
    };

    match provider.list_voices() {
        Ok(voices) => {
            println!("✓ {} voices", voices.len());
            assert!(voices.iter().filter(|v| v.is_default).count() <= 1);
            for voice in &voices {
                assert!(!voice.id.is_empty());
            }
        }
        Err(e) => println!("⚠ Voice listing failed: {}", e),
    }
}

#[test]
fn test_speak_reports_start_or_end() {
    let Ok(mut provider) = create_provider(BackendKind::Auto, POLL) else {
        println!("⚠ Skipping speak test (TTS not available)");
        return;
    };

    let subscription = provider.subscribe().expect("subscribe");
    let utterance = Utterance {
        id: 1,
        text: "Integration test".to_string(),
        voice: None,
    };

    if let Err(e) = provider.speak(&utterance) {
        println!("⚠ Speak failed (may be expected without audio): {}", e);
        return;
    }

    let deadline = Instant::now() + Duration::from_secs(2);
    let mut seen = Vec::new();
    while Instant::now() < deadline && seen.is_empty() {
        provider.poll().ok();
        seen.extend(subscription.drain());
        std::thread::sleep(Duration::from_millis(20));
    }

    // Every event must belong to our request
    for event in &seen {
        match event {
            SpeechEvent::Started(id) | SpeechEvent::Ended(id) => assert_eq!(*id, 1),
            SpeechEvent::Failed { request, .. } => assert_eq!(*request, 1),
            SpeechEvent::VoicesChanged => {}
        }
    }

    assert!(provider.cancel().is_ok(), "Should cancel without error");
}

#[test]
fn test_speech_parameters() {
    let Ok(mut provider) = create_provider(BackendKind::Auto, POLL) else {
        println!("⚠ Skipping parameter tests (TTS not available)");
        return;
    };

    for rate in [0, 50, 100] {
        assert!(provider.set_rate(rate).is_ok(), "Should set rate to {}", rate);
    }
    for volume in [0, 50, 100] {
        assert!(provider.set_volume(volume).is_ok(), "Should set volume to {}", volume);
    }
}
