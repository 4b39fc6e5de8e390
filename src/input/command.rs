//! Line commands typed at the prompt

/// Help text for `:help`
pub const HELP: &str = "\
Type text and press Enter to replace the text to read.
Press Enter on an empty line to read aloud, or again to stop.
  :s, :speak      read aloud / stop reading
  :voices         list voices (* marks the selected one)
  :voice N|ID     select voice by list number or id
  :rate N         speech rate 0-100
  :volume N       speech volume 0-100
  :paste          replace the text with the clipboard contents
  :show           show text, voice and playback state
  :help           this help
  :quit           exit
Start a line with '::' to enter text that begins with ':'.";

/// How a voice was named in `:voice`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceChoice {
    /// 0-based position in the list
    Index(usize),
    Id(String),
}

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Replace the text to read
    Edit(String),
    Toggle,
    ListVoices,
    SelectVoice(VoiceChoice),
    Rate(u8),
    Volume(u8),
    Paste,
    Show,
    Help,
    Quit,
    /// Unusable input, with a message for the user
    Invalid(String),
}

/// Parse one line of input (without its trailing newline)
pub fn parse_command(line: &str) -> Command {
    let line = line.trim_end_matches(['\r', '\n']);

    if line.is_empty() {
        return Command::Toggle;
    }
    if let Some(escaped) = line.strip_prefix("::") {
        return Command::Edit(format!(":{}", escaped));
    }
    let Some(command) = line.strip_prefix(':') else {
        return Command::Edit(line.to_string());
    };

    let mut parts = command.trim().splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).unwrap_or_default();

    match name {
        "s" | "speak" | "stop" => Command::Toggle,
        "v" | "voices" => Command::ListVoices,
        "voice" => parse_voice_choice(arg),
        "rate" => parse_percent(arg, "rate").map_or_else(Command::Invalid, Command::Rate),
        "volume" | "vol" => parse_percent(arg, "volume").map_or_else(Command::Invalid, Command::Volume),
        "paste" => Command::Paste,
        "show" | "status" => Command::Show,
        "h" | "help" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        other => Command::Invalid(format!("Unknown command :{} (try :help)", other)),
    }
}

fn parse_voice_choice(arg: &str) -> Command {
    if arg.is_empty() {
        return Command::Invalid("Usage: :voice N|ID".to_string());
    }
    match arg.parse::<usize>() {
        Ok(0) => Command::Invalid("Voice numbers start at 1".to_string()),
        Ok(n) => Command::SelectVoice(VoiceChoice::Index(n - 1)),
        Err(_) => Command::SelectVoice(VoiceChoice::Id(arg.to_string())),
    }
}

fn parse_percent(arg: &str, what: &str) -> Result<u8, String> {
    match arg.parse::<u8>() {
        Ok(value) if value <= 100 => Ok(value),
        _ => Err(format!("Invalid {}: expected 0-100", what)),
    }
}
