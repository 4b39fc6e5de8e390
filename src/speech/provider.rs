//! Speech provider abstraction
//!
//! The provider is the only thing that actually talks to a speech engine.
//! Everything above it works in terms of voice descriptors, utterances and
//! the events published through a [`Subscription`].

use super::events::{RequestId, Subscription};
use super::voice::VoiceDescriptor;
use crate::{ReadAloudError, Result};
use log::info;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// One request to read text aloud
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    /// Identifier echoed back in the provider's events
    pub id: RequestId,

    /// Text to speak
    pub text: String,

    /// Voice bound at submission time; `None` means the engine default
    pub voice: Option<VoiceDescriptor>,
}

/// Speech capability provider
///
/// Backends report progress asynchronously through the events hub:
/// `Started`, then either `Ended` or `Failed`, for each utterance.
pub trait SpeechProvider {
    /// Short backend name for logs and status output
    fn name(&self) -> &str;

    /// Snapshot of the voices currently offered (may be empty)
    fn list_voices(&mut self) -> Result<Vec<VoiceDescriptor>>;

    /// Attach a listener for this provider's events
    fn subscribe(&mut self) -> Result<Subscription>;

    /// Start speaking an utterance
    fn speak(&mut self, utterance: &Utterance) -> Result<()>;

    /// Stop any in-flight utterance
    fn cancel(&mut self) -> Result<()>;

    /// Set speech rate (0-100, where 50 is normal)
    fn set_rate(&mut self, rate: u8) -> Result<()>;

    /// Set speech volume (0-100)
    fn set_volume(&mut self, volume: u8) -> Result<()>;

    /// Give the backend a chance to detect completion or voice list changes
    ///
    /// Called once per event loop tick.
    fn poll(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Which backend to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Native engine first, espeak-ng as fallback
    #[default]
    Auto,
    /// Platform speech engine through the tts crate
    Native,
    /// espeak-ng subprocess
    Espeak,
}

impl FromStr for BackendKind {
    type Err = ReadAloudError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(BackendKind::Auto),
            "native" | "tts" => Ok(BackendKind::Native),
            "espeak" | "espeak-ng" => Ok(BackendKind::Espeak),
            other => Err(ReadAloudError::Config(format!(
                "Unknown speech backend '{}' (expected auto, native or espeak)",
                other
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Auto => "auto",
            BackendKind::Native => "native",
            BackendKind::Espeak => "espeak",
        };
        f.write_str(name)
    }
}

/// Create a speech provider
///
/// With [`BackendKind::Auto`] the platform engine is tried first:
/// 1. Native (Speech Dispatcher / AVFoundation / WinRT via the tts crate)
/// 2. espeak-ng subprocess
///
/// `voice_poll` sets how often the native backend re-reads its voice list.
///
/// Returns [`ReadAloudError::Unsupported`] when nothing can be initialised.
pub fn create_provider(kind: BackendKind, voice_poll: Duration) -> Result<Box<dyn SpeechProvider>> {
    use super::backends::espeak::EspeakProvider;
    use super::backends::native::NativeProvider;

    if matches!(kind, BackendKind::Auto | BackendKind::Native) {
        info!("Trying native speech backend...");
        match NativeProvider::new() {
            Ok(mut provider) => {
                provider.set_voice_poll_interval(voice_poll);
                info!("✓ Successfully initialized native backend");
                return Ok(Box::new(provider));
            }
            Err(e) => info!("✗ Native backend unavailable: {}", e),
        }
    }

    if matches!(kind, BackendKind::Auto | BackendKind::Espeak) {
        info!("Trying espeak-ng backend...");
        match EspeakProvider::new() {
            Ok(provider) => {
                info!("✓ Successfully initialized espeak-ng backend");
                return Ok(Box::new(provider));
            }
            Err(e) => info!("✗ espeak-ng backend unavailable: {}", e),
        }
    }

    Err(ReadAloudError::Unsupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!("auto".parse::<BackendKind>().unwrap(), BackendKind::Auto);
        assert_eq!("Native".parse::<BackendKind>().unwrap(), BackendKind::Native);
        assert_eq!("espeak-ng".parse::<BackendKind>().unwrap(), BackendKind::Espeak);
        assert!("festival".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_backend_kind_display_round_trips() {
        for kind in [BackendKind::Auto, BackendKind::Native, BackendKind::Espeak] {
            assert_eq!(kind.to_string().parse::<BackendKind>().unwrap(), kind);
        }
    }
}
