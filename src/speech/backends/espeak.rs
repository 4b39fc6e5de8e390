//! espeak-ng subprocess backend
//!
//! Fallback for hosts without a usable platform speech engine. Each utterance
//! runs as one `espeak-ng` process; `poll()` reaps it and reports the outcome.
//!
//! Dependencies:
//! - espeak-ng (install with: sudo apt install espeak-ng)

use crate::speech::{EventHub, RequestId, SpeechEvent, SpeechProvider, Subscription, Utterance};
use crate::speech::VoiceDescriptor;
use crate::{ReadAloudError, Result};
use log::{debug, error, warn};
use regex::Regex;
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;

/// Voice espeak-ng uses when none is given
const ESPEAK_DEFAULT_VOICE: &str = "en";

/// espeak-ng subprocess backend
pub struct EspeakProvider {
    /// Currently running espeak-ng process and the request it belongs to
    current: Option<(RequestId, Child)>,

    /// Cached rate setting (0-100)
    rate: u8,

    /// Cached volume setting (0-100)
    volume: u8,

    /// Path to espeak-ng
    espeak_path: String,

    hub: Arc<EventHub>,
}

impl EspeakProvider {
    /// Create a new espeak-ng provider
    ///
    /// Verifies espeak-ng is installed
    pub fn new() -> Result<Self> {
        debug!("Creating espeak-ng backend");

        let espeak_path = Self::find_espeak()?;
        debug!("Found espeak-ng at: {}", espeak_path);

        Ok(Self {
            current: None,
            rate: 50,
            volume: 80,
            espeak_path,
            hub: EventHub::new(),
        })
    }

    /// Find espeak-ng executable
    fn find_espeak() -> Result<String> {
        let paths = ["espeak-ng", "/usr/bin/espeak-ng", "/usr/local/bin/espeak-ng"];

        for path in paths {
            if let Ok(status) = Command::new(path)
                .arg("--version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
            {
                if status.success() {
                    return Ok(path.to_string());
                }
            }
        }

        Err(ReadAloudError::Speech(
            "espeak-ng not found. Install with: sudo apt install espeak-ng".to_string(),
        ))
    }

    /// Convert rate (0-100) to espeak speed in words per minute
    ///
    /// 0 = 80 wpm, 50 = 175 wpm (espeak default), 100 = 450 wpm
    fn rate_to_espeak_speed(rate: u8) -> u16 {
        let rate = rate.min(100) as u16;
        if rate <= 50 {
            80 + rate * 95 / 50
        } else {
            175 + (rate - 50) * 275 / 50
        }
    }

    /// Convert volume (0-100) to espeak amplitude (0-200)
    fn volume_to_espeak_amplitude(volume: u8) -> u8 {
        ((volume.min(100) as u16 * 200) / 100) as u8
    }

    /// Kill the running process, if any, without reporting it
    fn kill_current(&mut self) {
        if let Some((request, mut child)) = self.current.take() {
            debug!("Killing espeak-ng process for request {}", request);
            match child.kill() {
                Ok(_) => {
                    let _ = child.wait(); // Clean up zombie
                }
                Err(e) => debug!("Failed to kill espeak-ng process: {}", e),
            }
        }
    }

    /// Start `cmd` as the process for `request`, replacing any running one
    fn launch(&mut self, request: RequestId, mut cmd: Command) -> Result<()> {
        if self.current.is_some() {
            warn!("Replacing in-flight espeak-ng process");
            self.kill_current();
        }

        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::piped());

        match cmd.spawn() {
            Ok(child) => {
                debug!("espeak-ng process started for request {}", request);
                self.current = Some((request, child));
                self.hub.publish(SpeechEvent::Started(request));
                Ok(())
            }
            Err(e) => {
                error!("Failed to spawn espeak-ng: {}", e);
                Err(ReadAloudError::Speech(format!("Failed to start espeak-ng: {}", e)))
            }
        }
    }

    /// Reap the running process if it has exited
    fn reap(&mut self) -> Result<()> {
        let Some((request, child)) = self.current.as_mut() else {
            return Ok(());
        };
        let request = *request;

        let Some(status) = child.try_wait()? else {
            return Ok(());
        };

        let event = if status.success() {
            SpeechEvent::Ended(request)
        } else {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                let _ = pipe.read_to_string(&mut stderr);
            }
            let detail = match stderr.trim() {
                "" => format!("espeak-ng exited with {}", status),
                msg => format!("espeak-ng exited with {}: {}", status, msg),
            };
            SpeechEvent::Failed { request, detail }
        };

        self.current = None;
        self.hub.publish(event);
        Ok(())
    }
}

/// Parse the table printed by `espeak-ng --voices`
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File          Other Languages
///  5  en-us           --/M      English_(America)  gmw/en-US     (en 10)
/// ```
///
/// The File column is the id: several rows can share a language, but each
/// has its own file, and `-v` accepts it.
pub fn parse_voice_table(output: &str) -> Vec<VoiceDescriptor> {
    let Ok(row) = Regex::new(r"^\s*\d+\s+(\S+)\s+\S+\s+(\S+)\s+(\S+)") else {
        return Vec::new();
    };

    output
        .lines()
        .skip(1)
        .filter_map(|line| row.captures(line))
        .map(|caps| {
            let language = caps[1].to_string();
            let name = caps[2].replace('_', " ");
            let is_default = language == ESPEAK_DEFAULT_VOICE;
            VoiceDescriptor::new(&caps[3], name, language).with_default(is_default)
        })
        .collect()
}

impl SpeechProvider for EspeakProvider {
    fn name(&self) -> &str {
        "espeak"
    }

    fn list_voices(&mut self) -> Result<Vec<VoiceDescriptor>> {
        let output = Command::new(&self.espeak_path)
            .arg("--voices")
            .stderr(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(ReadAloudError::Speech(format!(
                "espeak-ng --voices exited with {}",
                output.status
            )));
        }

        let voices = parse_voice_table(&String::from_utf8_lossy(&output.stdout));
        debug!("espeak-ng offers {} voices", voices.len());
        Ok(voices)
    }

    fn subscribe(&mut self) -> Result<Subscription> {
        Ok(self.hub.subscribe())
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        let voice = utterance
            .voice
            .as_ref()
            .map_or(ESPEAK_DEFAULT_VOICE, |v| v.id.as_str());

        let mut cmd = Command::new(&self.espeak_path);
        cmd.arg("-v").arg(voice);
        cmd.arg("-s").arg(Self::rate_to_espeak_speed(self.rate).to_string());
        cmd.arg("-a").arg(Self::volume_to_espeak_amplitude(self.volume).to_string());
        // End of options, so text starting with '-' is not parsed as a flag
        cmd.arg("--").arg(&utterance.text);

        self.launch(utterance.id, cmd)
    }

    fn cancel(&mut self) -> Result<()> {
        debug!("Canceling speech");
        self.kill_current();
        Ok(())
    }

    fn set_rate(&mut self, rate: u8) -> Result<()> {
        debug!("Setting rate to {}", rate);
        self.rate = rate;
        Ok(())
    }

    fn set_volume(&mut self, volume: u8) -> Result<()> {
        debug!("Setting volume to {}", volume);
        self.volume = volume;
        Ok(())
    }

    fn poll(&mut self) -> Result<()> {
        self.reap()
    }
}

impl Drop for EspeakProvider {
    fn drop(&mut self) {
        debug!("Shutting down espeak-ng backend");
        self.kill_current();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    const VOICES: &str = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 2  en              --/M      English            gmw/en               (en-gb 2)
 5  en-us           --/M      English_(America)  gmw/en-US            (en 10)
";

    #[test]
    fn test_rate_conversion() {
        assert_eq!(EspeakProvider::rate_to_espeak_speed(0), 80);
        assert_eq!(EspeakProvider::rate_to_espeak_speed(50), 175);
        assert_eq!(EspeakProvider::rate_to_espeak_speed(100), 450);
    }

    #[test]
    fn test_volume_conversion() {
        assert_eq!(EspeakProvider::volume_to_espeak_amplitude(0), 0);
        assert_eq!(EspeakProvider::volume_to_espeak_amplitude(50), 100);
        assert_eq!(EspeakProvider::volume_to_espeak_amplitude(100), 200);
    }

    #[test]
    fn test_parse_voice_table() {
        let voices = parse_voice_table(VOICES);
        assert_eq!(voices.len(), 3);

        assert_eq!(voices[0].id, "gmw/af");
        assert_eq!(voices[0].language, "af");
        assert_eq!(voices[0].name, "Afrikaans");
        assert!(!voices[0].is_default);

        assert_eq!(voices[1].id, "gmw/en");
        assert!(voices[1].is_default);

        assert_eq!(voices[2].name, "English (America)");
        assert_eq!(voices[2].language, "en-us");
    }

    #[test]
    fn test_voices_sharing_a_language_get_distinct_ids() {
        let table = format!("{} 5  en-us           --/M      us1                mb/mb-us1            (en 8)\n", VOICES);
        let voices = parse_voice_table(&table);
        assert_eq!(voices.len(), 4);

        assert_eq!(voices[2].id, "gmw/en-US");
        assert_eq!(voices[3].id, "mb/mb-us1");
        assert_eq!(voices[2].language, voices[3].language);
        assert_ne!(voices[2].id, voices[3].id);
    }

    #[test]
    fn test_parse_ignores_header_and_blank_lines() {
        assert!(parse_voice_table("Pty Language Age/Gender VoiceName File\n\n").is_empty());
    }

    #[test]
    fn test_create_espeak_provider() {
        match EspeakProvider::new() {
            Ok(_) => println!("✓ espeak-ng backend available"),
            Err(e) => println!("⚠ espeak-ng backend not available: {}", e),
        }
    }

    /// Provider running `program` in place of espeak-ng
    fn provider_with(program: &str) -> EspeakProvider {
        EspeakProvider {
            current: None,
            rate: 50,
            volume: 80,
            espeak_path: program.to_string(),
            hub: EventHub::new(),
        }
    }

    fn utterance(id: RequestId) -> Utterance {
        Utterance {
            id,
            text: "hello".to_string(),
            voice: None,
        }
    }

    fn sleeper() -> Command {
        let mut cmd = Command::new("sleep");
        cmd.arg("30");
        cmd
    }

    /// Poll until the running process has been reaped
    fn poll_until_idle(provider: &mut EspeakProvider) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while provider.current.is_some() {
            assert!(Instant::now() < deadline, "process did not exit");
            provider.poll().unwrap();
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn test_clean_exit_reports_ended() {
        let mut provider = provider_with("true");
        let subscription = provider.subscribe().unwrap();

        provider.speak(&utterance(9)).unwrap();
        poll_until_idle(&mut provider);

        assert_eq!(
            subscription.drain(),
            vec![SpeechEvent::Started(9), SpeechEvent::Ended(9)]
        );
    }

    #[test]
    fn test_failed_exit_reports_status() {
        let mut provider = provider_with("false");
        let subscription = provider.subscribe().unwrap();

        provider.speak(&utterance(9)).unwrap();
        poll_until_idle(&mut provider);

        let events = subscription.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], SpeechEvent::Started(9));
        match &events[1] {
            SpeechEvent::Failed { request, detail } => {
                assert_eq!(*request, 9);
                assert!(detail.contains("exit status: 1"), "detail: {}", detail);
            }
            other => panic!("expected a failure, got {:?}", other),
        }
    }

    #[test]
    fn test_cancel_is_silent() {
        let mut provider = provider_with("true");
        let subscription = provider.subscribe().unwrap();

        provider.launch(3, sleeper()).unwrap();
        assert_eq!(subscription.drain(), vec![SpeechEvent::Started(3)]);

        provider.cancel().unwrap();
        assert!(provider.current.is_none());
        provider.poll().unwrap();
        assert!(subscription.drain().is_empty());
    }

    #[test]
    fn test_launch_replaces_running_process() {
        let mut provider = provider_with("true");
        let subscription = provider.subscribe().unwrap();

        provider.launch(1, sleeper()).unwrap();
        provider.launch(2, sleeper()).unwrap();
        assert_eq!(provider.current.as_ref().map(|(id, _)| *id), Some(2));

        // The replaced request is never reported as ended or failed
        provider.poll().unwrap();
        assert_eq!(
            subscription.drain(),
            vec![SpeechEvent::Started(1), SpeechEvent::Started(2)]
        );

        provider.cancel().unwrap();
    }

    #[test]
    fn test_spawn_failure_is_an_error() {
        let mut provider = provider_with("/nonexistent/espeak-ng");
        let subscription = provider.subscribe().unwrap();

        assert!(provider.speak(&utterance(4)).is_err());
        assert!(provider.current.is_none());
        assert!(subscription.drain().is_empty());
    }
}
