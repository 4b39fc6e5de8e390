//! Configuration management

use crate::speech::BackendKind;
use crate::{ReadAloudError, Result};
use ini::Ini;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Text loaded into the editor when nothing else is configured
pub const DEFAULT_TEXT: &str = "Hello! I am a world-class senior frontend engineer. \
Edit this text, and I will read it aloud for you in any voice you choose.";

/// Persistent settings (~/.readaloud.cfg)
///
/// Holds the preferred backend, voice and speech parameters, plus the
/// text the editor starts with.
pub struct Config {
    /// INI configuration storage
    ini: Ini,

    /// Config file path
    path: PathBuf,
}

impl Config {
    /// Load configuration from the default location or create it
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from `path`, writing defaults if it does not exist
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        debug!("Loading config from {:?}", path);

        let ini = if path.exists() {
            Ini::load_from_file(&path)
                .map_err(|e| ReadAloudError::IniParse(format!("Failed to load config: {}", e)))?
        } else {
            info!("Config file not found, creating default");
            let default = Self::default_config();
            default
                .write_to_file(&path)
                .map_err(|e| ReadAloudError::IniParse(format!("Failed to write config: {}", e)))?;
            default
        };

        Ok(Self { ini, path })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        debug!("Saving config to {:?}", self.path);
        self.ini
            .write_to_file(&self.path)
            .map_err(|e| ReadAloudError::Config(format!("Failed to save config: {}", e)))
    }

    /// Default config file path (~/.readaloud.cfg)
    fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".readaloud.cfg")
    }

    /// Expose the config file path for display
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn default_config() -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("speech"))
            .set("backend", "auto")
            .set("voice", "")
            .set("voice_poll_secs", "5");

        ini.with_section(Some("text")).set("initial", DEFAULT_TEXT);

        ini
    }

    /// Get a string value from config
    pub fn get_string(&self, section: &str, key: &str, default: &str) -> String {
        self.ini
            .get_from(Some(section), key)
            .unwrap_or(default)
            .to_string()
    }

    /// Get an integer value from config
    pub fn get_int(&self, section: &str, key: &str, default: i32) -> i32 {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Set a value in config
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.ini.with_section(Some(section)).set(key, value);
    }

    /// Which speech backend to use
    pub fn backend(&self) -> BackendKind {
        let value = self.get_string("speech", "backend", "auto");
        value.parse().unwrap_or_else(|e| {
            warn!("{}; using auto", e);
            BackendKind::Auto
        })
    }

    /// Preferred voice id, if one was saved
    pub fn voice(&self) -> Option<String> {
        Some(self.get_string("speech", "voice", ""))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Remember the selected voice
    pub fn set_voice(&mut self, id: &str) {
        self.set("speech", "voice", id);
    }

    /// Speech rate (0-100)
    pub fn rate(&self) -> Option<u8> {
        self.get_int("speech", "rate", -1)
            .try_into()
            .ok()
            .filter(|&r| r <= 100)
    }

    /// Speech volume (0-100)
    pub fn volume(&self) -> Option<u8> {
        self.get_int("speech", "volume", -1)
            .try_into()
            .ok()
            .filter(|&v| v <= 100)
    }

    /// How often the native backend re-reads its voice list
    pub fn voice_poll_interval(&self) -> Duration {
        let secs = self.get_int("speech", "voice_poll_secs", 5).max(1);
        Duration::from_secs(secs as u64)
    }

    /// Text the editor starts with
    pub fn initial_text(&self) -> String {
        self.get_string("text", "initial", DEFAULT_TEXT)
    }
}
