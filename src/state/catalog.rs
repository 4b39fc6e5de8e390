//! Voice catalog and the current voice selection

use crate::speech::VoiceDescriptor;
use crate::{ReadAloudError, Result};
use log::{debug, info};

/// Snapshot of the provider's voices plus the user's selection
///
/// Voices are kept in the order the provider reported them. Once the list is
/// non-empty the selection always names one of its entries.
#[derive(Debug, Default)]
pub struct VoiceCatalog {
    voices: Vec<VoiceDescriptor>,
    selected: Option<String>,
}

impl VoiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a preferred voice that is applied once it shows up
    pub fn with_preferred(id: Option<String>) -> Self {
        Self {
            voices: Vec::new(),
            selected: id,
        }
    }

    pub fn voices(&self) -> &[VoiceDescriptor] {
        &self.voices
    }

    /// True until the provider has reported at least one voice
    pub fn is_loading(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The selected voice, if it resolves against the current list
    pub fn selected(&self) -> Option<&VoiceDescriptor> {
        let id = self.selected.as_deref()?;
        self.voices.iter().find(|v| v.id == id)
    }

    /// 0-based position of the selected voice
    pub fn selected_index(&self) -> Option<usize> {
        let id = self.selected.as_deref()?;
        self.voices.iter().position(|v| v.id == id)
    }

    /// Replace the voice list with a fresh snapshot
    ///
    /// With no usable selection, picks the provider default, else the first
    /// voice. Returns true when the selection changed.
    pub fn replace(&mut self, voices: Vec<VoiceDescriptor>) -> bool {
        debug!("Catalog refreshed with {} voices", voices.len());
        self.voices = voices;

        if self.voices.is_empty() || self.selected().is_some() {
            return false;
        }

        if let Some(stale) = &self.selected {
            info!("Selected voice {} is no longer offered", stale);
        }

        let fallback = self
            .voices
            .iter()
            .find(|v| v.is_default)
            .or_else(|| self.voices.first())
            .map(|v| v.id.clone());

        info!("Auto-selected voice {:?}", fallback);
        self.selected = fallback;
        true
    }

    /// Select a voice by id
    pub fn select(&mut self, id: &str) -> Result<&VoiceDescriptor> {
        let index = self
            .voices
            .iter()
            .position(|v| v.id == id)
            .ok_or_else(|| ReadAloudError::UnknownVoice(id.to_string()))?;
        self.select_index(index)
    }

    /// Select a voice by 0-based position in the list
    pub fn select_index(&mut self, index: usize) -> Result<&VoiceDescriptor> {
        let voice = self
            .voices
            .get(index)
            .ok_or_else(|| ReadAloudError::UnknownVoice(format!("#{}", index + 1)))?;
        self.selected = Some(voice.id.clone());
        Ok(voice)
    }
}
