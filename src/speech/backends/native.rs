//! Native TTS backend using the tts crate
//!
//! This backend uses the `tts` crate which provides a unified interface to:
//! - Speech Dispatcher on Linux (via native bindings)
//! - AVFoundation on macOS/iOS (via native bindings)
//! - WinRT / SAPI on Windows
//!
//! Engine callbacks arrive on engine threads. They only forward the raw
//! utterance signal over a channel; `poll()` translates those into
//! [`SpeechEvent`]s on the caller's thread, where the utterance-to-request
//! mapping lives.

use crate::speech::{EventHub, RequestId, SpeechEvent, SpeechProvider, Subscription, Utterance};
use crate::speech::VoiceDescriptor;
use crate::{ReadAloudError, Result};
use log::{debug, error, warn};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tts::{Features, Tts as TtsCrate, UtteranceId};

/// How often the voice list is re-read to detect changes
const DEFAULT_VOICE_POLL: Duration = Duration::from_secs(5);

/// Raw signal forwarded from an engine callback
#[derive(Debug)]
enum Signal {
    Begin(UtteranceId),
    End(UtteranceId),
}

/// How the end of an utterance is detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completion {
    /// Engine begin/end callbacks
    Callbacks,
    /// Polling `is_speaking()`
    Polling,
    /// The engine cannot tell; report the end right after the start
    Immediate,
}

impl Completion {
    fn detect(callbacks: bool, is_speaking: bool) -> Self {
        if callbacks {
            Completion::Callbacks
        } else if is_speaking {
            Completion::Polling
        } else {
            Completion::Immediate
        }
    }
}

/// Engine utterances still in flight and the requests they carry
#[derive(Debug)]
struct UtteranceMap<U> {
    entries: Vec<(U, RequestId)>,
}

impl<U: PartialEq> UtteranceMap<U> {
    fn new() -> Self {
        Self { entries: Vec::new() }
    }

    fn insert(&mut self, utterance: U, request: RequestId) {
        self.entries.push((utterance, request));
    }

    /// Request for an utterance that began speaking
    fn begin(&self, utterance: &U) -> Option<RequestId> {
        self.entries
            .iter()
            .find(|(id, _)| id == utterance)
            .map(|(_, request)| *request)
    }

    /// Request for an utterance that ended; forgets the utterance
    fn end(&mut self, utterance: &U) -> Option<RequestId> {
        let index = self.entries.iter().position(|(id, _)| id == utterance)?;
        Some(self.entries.remove(index).1)
    }
}

/// Last voice list seen, to spot changes between listings
#[derive(Debug, Default)]
struct VoiceListWatch {
    known: Vec<String>,
}

impl VoiceListWatch {
    /// Record `ids`; true if they differ from the previous list
    fn update(&mut self, ids: Vec<String>) -> bool {
        if ids == self.known {
            return false;
        }
        debug!("Voice list changed: {} -> {} voices", self.known.len(), ids.len());
        self.known = ids;
        true
    }
}

/// Native TTS backend using the tts crate
pub struct NativeProvider {
    /// The tts crate's TTS instance
    tts: TtsCrate,

    /// Engine capabilities, read once at startup
    features: Features,

    /// Listeners for this provider's events
    hub: Arc<EventHub>,

    /// Signals forwarded from engine callbacks
    signals: Receiver<Signal>,

    completion: Completion,

    /// Engine utterances still awaiting an end signal
    utterances: UtteranceMap<UtteranceId>,

    /// Request tracked by `is_speaking()` polling when callbacks are unavailable
    polled: Option<RequestId>,

    /// Id of the engine's voice at startup, reported as the default
    default_voice: Option<String>,

    voices: VoiceListWatch,

    last_voice_check: Instant,
    voice_poll: Duration,
}

impl NativeProvider {
    /// Create a new native TTS provider
    ///
    /// Initializes the platform-appropriate TTS backend
    pub fn new() -> Result<Self> {
        debug!("Creating native TTS backend");

        let tts = TtsCrate::default()
            .map_err(|e| ReadAloudError::Speech(format!("Failed to initialize TTS: {}", e)))?;
        let features = tts.supported_features();

        let default_voice = if features.get_voice {
            match tts.voice() {
                Ok(voice) => voice.map(|v| v.id()),
                Err(e) => {
                    warn!("Could not read current voice: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let (tx, rx) = mpsc::channel();
        let callbacks = features.utterance_callbacks && Self::register_callbacks(&tts, tx);
        let completion = Completion::detect(callbacks, features.is_speaking);
        match completion {
            Completion::Callbacks => {}
            Completion::Polling => warn!("Utterance callbacks not available, falling back to polling"),
            Completion::Immediate => warn!(
                "Engine reports neither utterance callbacks nor speaking state; \
                 playback will show as finished as soon as it starts"
            ),
        }

        debug!("Native TTS backend created successfully");

        Ok(Self {
            tts,
            features,
            hub: EventHub::new(),
            signals: rx,
            completion,
            utterances: UtteranceMap::new(),
            polled: None,
            default_voice,
            voices: VoiceListWatch::default(),
            last_voice_check: Instant::now(),
            voice_poll: DEFAULT_VOICE_POLL,
        })
    }

    /// Change how often the voice list is checked for changes
    pub fn set_voice_poll_interval(&mut self, interval: Duration) {
        self.voice_poll = interval;
    }

    fn register_callbacks(tts: &TtsCrate, tx: Sender<Signal>) -> bool {
        let begin_tx = tx.clone();
        let end_tx = tx.clone();
        let stop_tx = tx;

        let result = tts
            .on_utterance_begin(Some(Box::new(move |id: UtteranceId| {
                let _ = begin_tx.send(Signal::Begin(id));
            })))
            .and_then(|_| {
                tts.on_utterance_end(Some(Box::new(move |id: UtteranceId| {
                    let _ = end_tx.send(Signal::End(id));
                })))
            })
            .and_then(|_| {
                tts.on_utterance_stop(Some(Box::new(move |id: UtteranceId| {
                    let _ = stop_tx.send(Signal::End(id));
                })))
            });

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to register utterance callbacks: {}", e);
                false
            }
        }
    }

    fn drain_signals(&mut self) {
        while let Ok(signal) = self.signals.try_recv() {
            match signal {
                Signal::Begin(utterance) => match self.utterances.begin(&utterance) {
                    Some(request) => self.hub.publish(SpeechEvent::Started(request)),
                    None => debug!("Begin for unknown utterance {:?}", utterance),
                },
                Signal::End(utterance) => match self.utterances.end(&utterance) {
                    Some(request) => self.hub.publish(SpeechEvent::Ended(request)),
                    None => debug!("End for unknown utterance {:?}", utterance),
                },
            }
        }
    }

    fn check_polled(&mut self) -> Result<()> {
        let Some(request) = self.polled else {
            return Ok(());
        };

        let speaking = self
            .tts
            .is_speaking()
            .map_err(|e| ReadAloudError::Speech(format!("Failed to query speaking state: {}", e)))?;
        if !speaking {
            self.polled = None;
            self.hub.publish(SpeechEvent::Ended(request));
        }
        Ok(())
    }

    fn check_voices(&mut self) -> Result<()> {
        if self.last_voice_check.elapsed() < self.voice_poll {
            return Ok(());
        }
        self.last_voice_check = Instant::now();

        let ids = self.engine_voices()?.iter().map(|v| v.id()).collect();
        if self.voices.update(ids) {
            self.hub.publish(SpeechEvent::VoicesChanged);
        }
        Ok(())
    }

    fn engine_voices(&self) -> Result<Vec<tts::Voice>> {
        self.tts
            .voices()
            .map_err(|e| ReadAloudError::Speech(format!("Failed to get voices: {}", e)))
    }

    fn apply_voice(&mut self, voice: &VoiceDescriptor) -> Result<()> {
        if !self.features.voice {
            warn!("Voice selection not supported on this platform");
            return Ok(());
        }

        let voices = self.engine_voices()?;
        match voices.iter().find(|v| v.id() == voice.id) {
            Some(engine_voice) => {
                debug!("Selecting voice: {:?}", engine_voice);
                self.tts
                    .set_voice(engine_voice)
                    .map_err(|e| ReadAloudError::Speech(format!("Failed to set voice: {}", e)))
            }
            None => {
                warn!("Voice {} no longer offered by the engine", voice.id);
                Ok(())
            }
        }
    }
}

/// Map a 0-100 setting onto an engine range with `normal` at 50
fn scale_to_range(value: u8, min: f32, normal: f32, max: f32) -> f32 {
    let value = value.min(100) as f32;
    if value <= 50.0 {
        min + (normal - min) * value / 50.0
    } else {
        normal + (max - normal) * (value - 50.0) / 50.0
    }
}

impl SpeechProvider for NativeProvider {
    fn name(&self) -> &str {
        "native"
    }

    fn list_voices(&mut self) -> Result<Vec<VoiceDescriptor>> {
        let voices = self.engine_voices()?;
        self.voices.update(voices.iter().map(|v| v.id()).collect());

        let descriptors = voices
            .iter()
            .map(|v| {
                let id = v.id();
                let is_default = self.default_voice.as_deref() == Some(id.as_str());
                VoiceDescriptor::new(id, v.name(), v.language().to_string()).with_default(is_default)
            })
            .collect();
        Ok(descriptors)
    }

    fn subscribe(&mut self) -> Result<Subscription> {
        Ok(self.hub.subscribe())
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        if let Some(voice) = &utterance.voice {
            self.apply_voice(voice)?;
        }

        debug!("Speaking request {}: {} chars", utterance.id, utterance.text.len());
        let engine_id = self.tts.speak(utterance.text.as_str(), false).map_err(|e| {
            error!("Failed to speak: {}", e);
            ReadAloudError::Speech(format!("Speak failed: {}", e))
        })?;

        match (self.completion, engine_id) {
            (Completion::Callbacks, Some(engine_id)) => {
                self.utterances.insert(engine_id, utterance.id);
            }
            (Completion::Callbacks | Completion::Polling, _) if self.features.is_speaking => {
                // No callback will come for this one, so report the start now
                self.polled = Some(utterance.id);
                self.hub.publish(SpeechEvent::Started(utterance.id));
            }
            _ => {
                self.hub.publish(SpeechEvent::Started(utterance.id));
                self.hub.publish(SpeechEvent::Ended(utterance.id));
            }
        }
        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        debug!("Canceling speech");
        self.polled = None;
        if !self.features.stop {
            warn!("Stopping speech not supported on this platform");
            return Ok(());
        }

        self.tts.stop().map_err(|e| {
            error!("Failed to cancel speech: {}", e);
            ReadAloudError::Speech(format!("Cancel failed: {}", e))
        })?;
        Ok(())
    }

    fn set_rate(&mut self, rate: u8) -> Result<()> {
        debug!("Setting rate to {}", rate);
        if !self.features.rate {
            warn!("Rate control not supported on this platform");
            return Ok(());
        }

        let converted = scale_to_range(
            rate,
            self.tts.min_rate(),
            self.tts.normal_rate(),
            self.tts.max_rate(),
        );
        self.tts
            .set_rate(converted)
            .map_err(|e| ReadAloudError::Speech(format!("Failed to set rate: {}", e)))?;
        Ok(())
    }

    fn set_volume(&mut self, volume: u8) -> Result<()> {
        debug!("Setting volume to {}", volume);
        if !self.features.volume {
            warn!("Volume control not supported on this platform");
            return Ok(());
        }

        let min = self.tts.min_volume();
        let max = self.tts.max_volume();
        let converted = min + (max - min) * volume.min(100) as f32 / 100.0;
        self.tts
            .set_volume(converted)
            .map_err(|e| ReadAloudError::Speech(format!("Failed to set volume: {}", e)))?;
        Ok(())
    }

    fn poll(&mut self) -> Result<()> {
        self.drain_signals();
        self.check_polled()?;
        self.check_voices()
    }
}
