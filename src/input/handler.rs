//! Applies parsed commands to the controller
//!
//! Settings the user changes here (voice, rate, volume) are written back to
//! the config file so the next session starts with them.

use super::command::{parse_command, Command, VoiceChoice, HELP};
use crate::state::config::Config;
use crate::state::{ReadAloud, ToggleOutcome};
use crate::ui::view;
use crate::{ReadAloudError, Result};
use log::debug;
use std::io::Write;

/// What the event loop should do after a line was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerAction {
    Continue,
    Quit,
}

/// Handles input lines for one session
pub struct CommandHandler {
    config: Config,
}

impl CommandHandler {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parse and apply one input line, writing feedback to `out`
    pub fn process_line(
        &mut self,
        line: &str,
        controller: &mut ReadAloud,
        out: &mut dyn Write,
    ) -> Result<HandlerAction> {
        let command = parse_command(line);
        debug!("Command: {:?}", command);
        self.apply(command, controller, out)
    }

    /// Apply a parsed command
    pub fn apply(
        &mut self,
        command: Command,
        controller: &mut ReadAloud,
        out: &mut dyn Write,
    ) -> Result<HandlerAction> {
        match command {
            Command::Edit(text) => {
                controller.set_text(text);
                writeln!(out, "Text updated ({} chars)", controller.text().chars().count())?;
            }

            Command::Toggle => match controller.toggle() {
                ToggleOutcome::Unsupported => {
                    writeln!(out, "!! {}", view::UNSUPPORTED_NOTICE)?;
                }
                ToggleOutcome::Cancelled => {
                    writeln!(out, "{}", view::render_toggle(controller.state()))?;
                }
                // Started requests show up through provider events; a refused
                // request is only logged
                ToggleOutcome::Submitted(_) | ToggleOutcome::IgnoredBlank | ToggleOutcome::Failed => {}
            },

            Command::ListVoices => {
                for line in view::render_voice_list(controller.catalog()) {
                    writeln!(out, "{}", line)?;
                }
            }

            Command::SelectVoice(choice) => {
                let selected = match &choice {
                    VoiceChoice::Index(i) => controller.select_voice_index(*i),
                    VoiceChoice::Id(id) => controller.select_voice(id),
                };
                match selected {
                    Ok(voice) => {
                        writeln!(out, "Voice: {}", voice)?;
                        let id = voice.id.clone();
                        self.config.set_voice(&id);
                        self.config.save()?;
                    }
                    Err(ReadAloudError::UnknownVoice(name)) => {
                        writeln!(out, "Unknown voice {} (see :voices)", name)?;
                    }
                    Err(e) => return Err(e),
                }
            }

            Command::Rate(rate) => {
                self.apply_setting(controller, out, "rate", rate, ReadAloud::set_rate)?;
            }

            Command::Volume(volume) => {
                self.apply_setting(controller, out, "volume", volume, ReadAloud::set_volume)?;
            }

            Command::Paste => match crate::clipboard::get_from_clipboard() {
                Ok(text) => {
                    controller.set_text(text);
                    writeln!(out, "Pasted {} chars", controller.text().chars().count())?;
                }
                Err(e) => writeln!(out, "{}", e)?,
            },

            Command::Show => {
                for line in view::render_status(controller) {
                    writeln!(out, "{}", line)?;
                }
            }

            Command::Help => writeln!(out, "{}", HELP)?,

            Command::Quit => return Ok(HandlerAction::Quit),

            Command::Invalid(message) => writeln!(out, "{}", message)?,
        }

        Ok(HandlerAction::Continue)
    }

    fn apply_setting(
        &mut self,
        controller: &mut ReadAloud,
        out: &mut dyn Write,
        key: &str,
        value: u8,
        set: fn(&mut ReadAloud, u8) -> Result<()>,
    ) -> Result<()> {
        match set(controller, value) {
            Ok(()) => {
                self.config.set("speech", key, &value.to_string());
                self.config.save()?;
                writeln!(out, "{} set to {}", key, value)?;
            }
            Err(ReadAloudError::Unsupported) => {
                writeln!(out, "!! {}", view::UNSUPPORTED_NOTICE)?;
            }
            Err(e) => writeln!(out, "Could not set {}: {}", key, e)?,
        }
        Ok(())
    }
}
