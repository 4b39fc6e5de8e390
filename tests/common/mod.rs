//! Recording speech provider shared by the integration tests

#![allow(dead_code)]

use readaloud::speech::{
    EventHub, SpeechEvent, SpeechProvider, Subscription, Utterance, VoiceDescriptor,
};
use readaloud::{ReadAloudError, Result};
use std::sync::{Arc, Mutex};

/// Every call the controller made on the provider
#[derive(Debug, Default)]
pub struct Calls {
    pub list_voices: usize,
    pub subscribes: usize,
    pub spoken: Vec<Utterance>,
    pub cancels: usize,
    pub rates: Vec<u8>,
    pub volumes: Vec<u8>,
}

impl Calls {
    pub fn total(&self) -> usize {
        self.list_voices
            + self.subscribes
            + self.spoken.len()
            + self.cancels
            + self.rates.len()
            + self.volumes.len()
    }
}

/// Provider that records calls and only emits events when told to
pub struct FakeProvider {
    voices: Arc<Mutex<Vec<VoiceDescriptor>>>,
    calls: Arc<Mutex<Calls>>,
    hub: Arc<EventHub>,
    fail_speak: bool,
}

/// Test-side view of a [`FakeProvider`] after it was boxed
#[derive(Clone)]
pub struct FakeHandle {
    voices: Arc<Mutex<Vec<VoiceDescriptor>>>,
    calls: Arc<Mutex<Calls>>,
    hub: Arc<EventHub>,
}

pub fn fake_provider(voices: Vec<VoiceDescriptor>) -> (Box<dyn SpeechProvider>, FakeHandle) {
    build(voices, false)
}

/// A provider whose `speak` always fails synchronously
pub fn failing_provider(voices: Vec<VoiceDescriptor>) -> (Box<dyn SpeechProvider>, FakeHandle) {
    build(voices, true)
}

/// A second provider publishing on the same event hub as `other`
///
/// Calls are recorded separately for each provider.
pub fn fake_provider_sharing(
    other: &FakeHandle,
    voices: Vec<VoiceDescriptor>,
) -> (Box<dyn SpeechProvider>, FakeHandle) {
    build_on(Arc::clone(&other.hub), voices, false)
}

fn build(voices: Vec<VoiceDescriptor>, fail_speak: bool) -> (Box<dyn SpeechProvider>, FakeHandle) {
    build_on(EventHub::new(), voices, fail_speak)
}

fn build_on(
    hub: Arc<EventHub>,
    voices: Vec<VoiceDescriptor>,
    fail_speak: bool,
) -> (Box<dyn SpeechProvider>, FakeHandle) {
    let handle = FakeHandle {
        voices: Arc::new(Mutex::new(voices)),
        calls: Arc::new(Mutex::new(Calls::default())),
        hub,
    };
    let provider = FakeProvider {
        voices: Arc::clone(&handle.voices),
        calls: Arc::clone(&handle.calls),
        hub: Arc::clone(&handle.hub),
        fail_speak,
    };
    (Box::new(provider), handle)
}

pub fn voice(id: &str, is_default: bool) -> VoiceDescriptor {
    VoiceDescriptor::new(id, format!("Voice {}", id), "en-US").with_default(is_default)
}

impl SpeechProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    fn list_voices(&mut self) -> Result<Vec<VoiceDescriptor>> {
        self.calls.lock().unwrap().list_voices += 1;
        Ok(self.voices.lock().unwrap().clone())
    }

    fn subscribe(&mut self) -> Result<Subscription> {
        self.calls.lock().unwrap().subscribes += 1;
        Ok(self.hub.subscribe())
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        self.calls.lock().unwrap().spoken.push(utterance.clone());
        if self.fail_speak {
            return Err(ReadAloudError::Speech("engine busy".to_string()));
        }
        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        self.calls.lock().unwrap().cancels += 1;
        Ok(())
    }

    fn set_rate(&mut self, rate: u8) -> Result<()> {
        self.calls.lock().unwrap().rates.push(rate);
        Ok(())
    }

    fn set_volume(&mut self, volume: u8) -> Result<()> {
        self.calls.lock().unwrap().volumes.push(volume);
        Ok(())
    }
}

impl FakeHandle {
    pub fn spoken(&self) -> Vec<Utterance> {
        self.calls.lock().unwrap().spoken.clone()
    }

    pub fn cancels(&self) -> usize {
        self.calls.lock().unwrap().cancels
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().total()
    }

    pub fn rates(&self) -> Vec<u8> {
        self.calls.lock().unwrap().rates.clone()
    }

    pub fn subscribers(&self) -> usize {
        self.hub.subscriber_count()
    }

    pub fn start(&self, id: u64) {
        self.hub.publish(SpeechEvent::Started(id));
    }

    pub fn end(&self, id: u64) {
        self.hub.publish(SpeechEvent::Ended(id));
    }

    pub fn fail(&self, id: u64, detail: &str) {
        self.hub.publish(SpeechEvent::Failed {
            request: id,
            detail: detail.to_string(),
        });
    }

    /// Swap the voice list and announce the change
    pub fn change_voices(&self, voices: Vec<VoiceDescriptor>) {
        *self.voices.lock().unwrap() = voices;
        self.hub.publish(SpeechEvent::VoicesChanged);
    }
}
