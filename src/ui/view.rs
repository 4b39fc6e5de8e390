//! Text rendering of the controls
//!
//! Everything here is a pure function of controller state so the event loop
//! can redraw whatever changed.

use crate::state::catalog::VoiceCatalog;
use crate::state::playback::PlaybackState;
use crate::state::{Change, ReadAloud};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Shown when the host has no speech engine at all
pub const UNSUPPORTED_NOTICE: &str = "Sorry, text-to-speech is not supported on this system.";

/// Placeholder while the voice list is empty
pub const LOADING_VOICES: &str = "Loading voices...";

const TITLE: &str = "Text-to-Speech Synthesizer";
const SUBTITLE: &str = "Type any text and pick a voice to hear it read aloud by your system's speech engine.";

/// Icons for the toggle control
const SPEAKER_WAVE: &str = "🔊";
const SPEAKER_MUTED: &str = "🔇";

/// Widest a voice label may get before it is cut
const MAX_VOICE_WIDTH: usize = 48;

/// Label of the speak/stop toggle for a given state
pub fn toggle_label(state: PlaybackState) -> &'static str {
    match state {
        PlaybackState::Idle => "Read Aloud",
        PlaybackState::Speaking => "Stop Reading",
    }
}

/// Icon of the speak/stop toggle for a given state
pub fn toggle_icon(state: PlaybackState) -> &'static str {
    match state {
        PlaybackState::Idle => SPEAKER_WAVE,
        PlaybackState::Speaking => SPEAKER_MUTED,
    }
}

/// The toggle control, e.g. `[🔊 Read Aloud]`
pub fn render_toggle(state: PlaybackState) -> String {
    format!("[{} {}]", toggle_icon(state), toggle_label(state))
}

/// Cut `text` to at most `max` display columns, marking the cut with `…`
pub fn truncate_to_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        // Leave a column for the ellipsis
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Voice choices, one per line, selected one marked with `*`
///
/// Numbers are 1-based to match `:voice N`.
pub fn render_voice_list(catalog: &VoiceCatalog) -> Vec<String> {
    if catalog.is_loading() {
        return vec![LOADING_VOICES.to_string()];
    }

    let selected = catalog.selected_index();
    let digits = catalog.voices().len().to_string().len();

    catalog
        .voices()
        .iter()
        .enumerate()
        .map(|(i, voice)| {
            let marker = if Some(i) == selected { '*' } else { ' ' };
            let label = truncate_to_width(&voice.to_string(), MAX_VOICE_WIDTH);
            format!("{} {:>width$}) {}", marker, i + 1, label, width = digits)
        })
        .collect()
}

/// The selected voice as a one-line summary
pub fn render_selected_voice(catalog: &VoiceCatalog) -> String {
    if catalog.is_loading() {
        return LOADING_VOICES.to_string();
    }
    match catalog.selected() {
        Some(voice) => truncate_to_width(&voice.to_string(), MAX_VOICE_WIDTH),
        None => "engine default".to_string(),
    }
}

/// First line of the text, cut to `width` columns
pub fn render_text_preview(text: &str, width: usize) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "(empty)".to_string();
    }

    let first = trimmed.lines().next().unwrap_or_default();
    let lines = trimmed.lines().count();
    let preview = truncate_to_width(first, width);
    if lines > 1 {
        format!("{} (+{} more lines)", preview, lines - 1)
    } else {
        preview
    }
}

/// Status block: text, voice, and toggle
pub fn render_status(controller: &ReadAloud) -> Vec<String> {
    let backend = controller.provider_name().unwrap_or("none");
    vec![
        format!("Text:  {}", render_text_preview(controller.text(), 60)),
        format!("Voice: {}", render_selected_voice(controller.catalog())),
        format!("Engine: {}", backend),
        render_toggle(controller.state()),
    ]
}

/// Lines to print after the controller reported a change
pub fn render_change(change: Change, controller: &ReadAloud) -> Vec<String> {
    match change {
        Change::Playback(state) => vec![render_toggle(state)],
        Change::Voices => {
            let mut lines = vec!["Voices updated:".to_string()];
            lines.extend(render_voice_list(controller.catalog()));
            lines
        }
    }
}

/// Title shown at startup
pub fn render_banner() -> Vec<String> {
    vec![TITLE.to_string(), SUBTITLE.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::VoiceDescriptor;

    #[test]
    fn test_toggle_reflects_state() {
        assert_eq!(render_toggle(PlaybackState::Idle), "[🔊 Read Aloud]");
        assert_eq!(render_toggle(PlaybackState::Speaking), "[🔇 Stop Reading]");
    }

    #[test]
    fn test_loading_placeholder() {
        let catalog = VoiceCatalog::new();
        assert_eq!(render_voice_list(&catalog), vec![LOADING_VOICES.to_string()]);
        assert_eq!(render_selected_voice(&catalog), LOADING_VOICES);
    }

    #[test]
    fn test_voice_list_marks_selection() {
        let mut catalog = VoiceCatalog::new();
        catalog.replace(vec![
            VoiceDescriptor::new("a", "Alice", "en-GB"),
            VoiceDescriptor::new("b", "Bob", "en-US").with_default(true),
        ]);

        let lines = render_voice_list(&catalog);
        assert_eq!(lines, vec!["  1) Alice (en-GB)", "* 2) Bob (en-US)"]);
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefghij", 5), "abcd…");
        // Wide characters take two columns each
        assert_eq!(truncate_to_width("世界世界", 5), "世界…");
    }

    #[test]
    fn test_text_preview() {
        assert_eq!(render_text_preview("   ", 10), "(empty)");
        assert_eq!(render_text_preview("one\ntwo\nthree", 10), "one (+2 more lines)");
    }
}
