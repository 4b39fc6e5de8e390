//! Speech capability providers

pub mod backends;
pub mod events;
pub mod provider;
pub mod voice;

pub use events::{EventHub, RequestId, SpeechEvent, Subscription};
pub use provider::{create_provider, BackendKind, SpeechProvider, Utterance};
pub use voice::VoiceDescriptor;
