//! Voice descriptors reported by speech backends

use serde::{Deserialize, Serialize};
use std::fmt;

/// One synthetic voice offered by a speech backend
///
/// The `id` is opaque and only meaningful to the backend that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceDescriptor {
    /// Backend-specific identifier (voice URI)
    pub id: String,

    /// Human readable name
    pub name: String,

    /// Language tag, e.g. "en-US"
    pub language: String,

    /// Whether the backend flags this voice as its default
    #[serde(rename = "default")]
    pub is_default: bool,
}

impl VoiceDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            language: language.into(),
            is_default: false,
        }
    }

    /// Mark this voice as the backend default
    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }
}

impl fmt::Display for VoiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.language)
    }
}
