//! Application state management
//!
//! [`ReadAloud`] is the controller behind the UI: it owns the text being
//! edited, the voice catalog, and the playback state machine, and it is the
//! only thing that talks to the speech provider.

pub mod catalog;
pub mod config;
pub mod playback;

use crate::speech::{RequestId, SpeechEvent, SpeechProvider, Subscription, Utterance, VoiceDescriptor};
use crate::{ReadAloudError, Result};
use catalog::VoiceCatalog;
use log::{debug, error, info, warn};
use playback::{Playback, PlaybackState};

/// Result of pressing the speak/stop toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// A request was handed to the provider
    Submitted(RequestId),
    /// The in-flight request was cancelled
    Cancelled,
    /// Nothing to read; the text is blank
    IgnoredBlank,
    /// No speech provider on this host
    Unsupported,
    /// The provider refused the request
    Failed,
}

/// Something the UI should redraw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Voices,
    Playback(PlaybackState),
}

/// Read-aloud controller
pub struct ReadAloud {
    /// Speech engine; `None` when the host has no speech capability
    provider: Option<Box<dyn SpeechProvider>>,

    /// Our listener on the provider; dropped on shutdown
    subscription: Option<Subscription>,

    catalog: VoiceCatalog,
    playback: Playback,

    /// Text in the editor
    text: String,

    disposed: bool,
}

impl ReadAloud {
    /// Create the controller and load the initial voice catalog
    pub fn new(
        provider: Option<Box<dyn SpeechProvider>>,
        text: impl Into<String>,
        preferred_voice: Option<String>,
    ) -> Result<Self> {
        let mut provider = provider;
        let subscription = match provider.as_mut() {
            Some(p) => {
                info!("Using speech provider: {}", p.name());
                Some(p.subscribe()?)
            }
            None => {
                warn!("No speech provider available");
                None
            }
        };

        let mut controller = Self {
            provider,
            subscription,
            catalog: VoiceCatalog::with_preferred(preferred_voice),
            playback: Playback::new(),
            text: text.into(),
            disposed: false,
        };
        controller.refresh_catalog();
        Ok(controller)
    }

    /// Whether a speech provider is present
    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_ref().map(|p| p.name())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the editor text
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        debug!("Text updated: {} chars", self.text.len());
    }

    pub fn catalog(&self) -> &VoiceCatalog {
        &self.catalog
    }

    pub fn state(&self) -> PlaybackState {
        self.playback.state()
    }

    /// The request currently submitted or speaking
    pub fn active_request(&self) -> Option<&Utterance> {
        self.playback.active()
    }

    /// Re-read the provider's voices
    ///
    /// Returns true if a list was obtained. Listing failures leave the
    /// catalog as it was.
    pub fn refresh_catalog(&mut self) -> bool {
        let Some(provider) = self.provider.as_mut() else {
            return false;
        };

        match provider.list_voices() {
            Ok(voices) => {
                self.catalog.replace(voices);
                true
            }
            Err(e) => {
                error!("Failed to list voices: {}", e);
                false
            }
        }
    }

    /// Select a voice by id; it must be in the current catalog
    pub fn select_voice(&mut self, id: &str) -> Result<&VoiceDescriptor> {
        let voice = self.catalog.select(id)?;
        info!("Selected voice {}", voice.id);
        Ok(voice)
    }

    /// Select a voice by 0-based position in the catalog
    pub fn select_voice_index(&mut self, index: usize) -> Result<&VoiceDescriptor> {
        let voice = self.catalog.select_index(index)?;
        info!("Selected voice {}", voice.id);
        Ok(voice)
    }

    /// Speak the current text, or stop if already speaking
    pub fn toggle(&mut self) -> ToggleOutcome {
        let Some(provider) = self.provider.as_mut() else {
            warn!("Toggle pressed but no speech provider is available");
            return ToggleOutcome::Unsupported;
        };

        if self.playback.is_active() {
            let cancelled = self.playback.cancel();
            info!("Cancelling request {:?}", cancelled);
            if let Err(e) = provider.cancel() {
                error!("Cancel failed: {}", e);
            }
            return ToggleOutcome::Cancelled;
        }

        if self.text.trim().is_empty() {
            debug!("Toggle ignored: text is blank");
            return ToggleOutcome::IgnoredBlank;
        }

        let voice = self.catalog.selected().cloned();
        let utterance = self.playback.begin(&self.text, voice);
        info!(
            "Submitting request {} with voice {:?}",
            utterance.id,
            utterance.voice.as_ref().map(|v| v.id.as_str())
        );

        match provider.speak(&utterance) {
            Ok(()) => ToggleOutcome::Submitted(utterance.id),
            Err(e) => {
                error!("Speech request {} failed: {}", utterance.id, e);
                self.playback.finished(utterance.id);
                ToggleOutcome::Failed
            }
        }
    }

    /// Set speech rate (0-100)
    pub fn set_rate(&mut self, rate: u8) -> Result<()> {
        self.provider
            .as_mut()
            .ok_or(ReadAloudError::Unsupported)?
            .set_rate(rate)
    }

    /// Set speech volume (0-100)
    pub fn set_volume(&mut self, volume: u8) -> Result<()> {
        self.provider
            .as_mut()
            .ok_or(ReadAloudError::Unsupported)?
            .set_volume(volume)
    }

    /// Process everything the provider reported since the last call
    ///
    /// Does nothing after [`shutdown`](Self::shutdown).
    pub fn pump_events(&mut self) -> Vec<Change> {
        let Some(subscription) = self.subscription.as_ref() else {
            return Vec::new();
        };

        if let Some(provider) = self.provider.as_mut() {
            if let Err(e) = provider.poll() {
                warn!("Speech provider poll failed: {}", e);
            }
        }

        let mut changes = Vec::new();
        for event in subscription.drain() {
            match event {
                SpeechEvent::VoicesChanged => {
                    if self.refresh_catalog() {
                        changes.push(Change::Voices);
                    }
                }
                SpeechEvent::Started(id) => {
                    if self.playback.started(id) {
                        changes.push(Change::Playback(PlaybackState::Speaking));
                    }
                }
                SpeechEvent::Ended(id) => {
                    if self.playback.finished(id) {
                        changes.push(Change::Playback(PlaybackState::Idle));
                    }
                }
                SpeechEvent::Failed { request, detail } => {
                    error!("Speech request {} failed: {}", request, detail);
                    if self.playback.finished(request) {
                        changes.push(Change::Playback(PlaybackState::Idle));
                    }
                }
            }
        }
        changes
    }

    /// Stop speaking and detach from the provider
    ///
    /// Safe to call more than once; also runs on drop.
    pub fn shutdown(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.subscription = None;

        if self.playback.cancel().is_some() {
            if let Some(provider) = self.provider.as_mut() {
                if let Err(e) = provider.cancel() {
                    warn!("Cancel during shutdown failed: {}", e);
                }
            }
        }
        debug!("Controller shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.disposed
    }
}

impl Drop for ReadAloud {
    fn drop(&mut self) {
        self.shutdown();
    }
}
