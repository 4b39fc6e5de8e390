//! readaloud main entry point
//!
//! The main loop watches two sources:
//! 1. stdin (one line at a time) - text to read or `:commands`
//! 2. the speech provider - start, end and error events, voice list changes
//!
//! Provider events are drained on every tick, so a poll timeout keeps the
//! loop turning while the user is not typing.

use log::{debug, error, info, warn};
use mio::{Events, Interest, Poll, Token};
use nix::libc;
use nix::sys::signal::{self, SigHandler, Signal};
use readaloud::input::{CommandHandler, HandlerAction};
use readaloud::speech::{create_provider, BackendKind};
use readaloud::state::config::Config;
use readaloud::state::ReadAloud;
use readaloud::ui::{self, UNSUPPORTED_NOTICE};
use readaloud::{ReadAloudError, Result};
use std::io::{self, Read, Write};
use std::os::unix::io::AsRawFd;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Token for stdin in mio poll
const STDIN: Token = Token(0);

/// Upper bound on how long provider events can wait to be handled
const TICK: Duration = Duration::from_millis(100);

/// Global flag set by the SIGINT/SIGTERM handler
static QUIT_PENDING: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_quit(_: libc::c_int) {
    QUIT_PENDING.store(true, Ordering::Relaxed);
}

const USAGE: &str = "\
Usage: readaloud [OPTIONS]

Options:
  -d, --debug            log to readaloud.log
  -b, --backend NAME     speech backend: auto, native or espeak
      --list-voices      print the available voices and exit
      --json             with --list-voices, print JSON
  -h, --help             show this help";

/// Command line options
#[derive(Debug, Default)]
struct Options {
    debug: bool,
    backend: Option<BackendKind>,
    list_voices: bool,
    json: bool,
    help: bool,
}

impl Options {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Options::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-d" | "--debug" => options.debug = true,
                "-b" | "--backend" => {
                    let value = args
                        .next()
                        .ok_or_else(|| ReadAloudError::Config("--backend needs a value".to_string()))?;
                    options.backend = Some(value.parse()?);
                }
                "--list-voices" => options.list_voices = true,
                "--json" => options.json = true,
                "-h" | "--help" => options.help = true,
                other => {
                    return Err(ReadAloudError::Config(format!("Unknown option: {}", other)));
                }
            }
        }
        Ok(options)
    }
}

fn init_logging(debug_mode: bool) {
    if debug_mode {
        // Debug mode: write to readaloud.log file
        use std::fs::OpenOptions;
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open("readaloud.log")
        {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Warning: Failed to open readaloud.log for debug logging: {}", e);
                eprintln!("Continuing without file logging...");
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Warn)
                    .init();
            }
        }

        info!(
            "readaloud version {} starting (debug mode, logging to readaloud.log)",
            readaloud::VERSION
        );
    } else {
        // Normal mode: errors only, RUST_LOG can raise it
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Error)
            .parse_default_env()
            .init();
    }
}

fn main() {
    let options = match Options::parse(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    };

    if options.help {
        println!("{}", USAGE);
        return;
    }

    init_logging(options.debug);

    let result = if options.list_voices {
        list_voices(&options)
    } else {
        run(&options)
    };

    if let Err(e) = result {
        error!("Fatal error: {}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Print the provider's voices and exit
fn list_voices(options: &Options) -> Result<()> {
    let config = Config::load()?;
    let backend = options.backend.unwrap_or_else(|| config.backend());

    let mut provider = match create_provider(backend, config.voice_poll_interval()) {
        Ok(provider) => provider,
        Err(ReadAloudError::Unsupported) => {
            eprintln!("{}", UNSUPPORTED_NOTICE);
            process::exit(1);
        }
        Err(e) => return Err(e),
    };

    let voices = provider.list_voices()?;
    if options.json {
        println!("{}", serde_json::to_string_pretty(&voices)?);
    } else {
        for voice in &voices {
            let marker = if voice.is_default { '*' } else { ' ' };
            println!("{} {:<24} {}", marker, voice.id, voice);
        }
    }
    Ok(())
}

fn run(options: &Options) -> Result<()> {
    debug!("Initializing readaloud");

    // Lines are read from an interactive terminal
    let stdin_fd = io::stdin().as_raw_fd();
    if unsafe { libc::isatty(stdin_fd) } == 0 {
        eprintln!("Error: readaloud requires an interactive terminal (stdin is not a TTY)");
        eprintln!("Use --list-voices to query voices from a script");
        process::exit(1);
    }

    let config = Config::load()?;
    info!("Configuration loaded from {:?}", config.path());

    let backend = options.backend.unwrap_or_else(|| config.backend());
    let provider = match create_provider(backend, config.voice_poll_interval()) {
        Ok(provider) => Some(provider),
        Err(e) => {
            warn!("Speech unavailable: {}", e);
            None
        }
    };

    let mut controller = ReadAloud::new(provider, config.initial_text(), config.voice())?;

    if controller.is_available() {
        if let Some(rate) = config.rate() {
            if let Err(e) = controller.set_rate(rate) {
                warn!("Could not apply rate {}: {}", rate, e);
            }
        }
        if let Some(volume) = config.volume() {
            if let Err(e) = controller.set_volume(volume) {
                warn!("Could not apply volume {}: {}", volume, e);
            }
        }
    }

    let mut handler = CommandHandler::new(config);

    unsafe {
        for sig in [Signal::SIGINT, Signal::SIGTERM] {
            signal::signal(sig, SigHandler::Handler(handle_quit)).map_err(|e| {
                ReadAloudError::Io(io::Error::new(
                    io::ErrorKind::Other,
                    format!("Failed to set {} handler: {}", sig, e),
                ))
            })?;
        }
    }

    let mut poll = Poll::new()?;
    let mut events = Events::with_capacity(16);
    let mut stdin_source = mio::unix::SourceFd(&stdin_fd);
    poll.registry()
        .register(&mut stdin_source, STDIN, Interest::READABLE)?;

    let mut stdout = io::stdout();
    for line in ui::render_banner() {
        writeln!(stdout, "{}", line)?;
    }
    writeln!(stdout)?;
    for line in ui::render_status(&controller) {
        writeln!(stdout, "{}", line)?;
    }
    writeln!(stdout, "Type :help for commands")?;
    stdout.flush()?;

    info!("readaloud ready - entering event loop");

    let mut pending = String::new();
    let mut buf = [0u8; 4096];

    'main: loop {
        if QUIT_PENDING.load(Ordering::Relaxed) {
            info!("Quit requested by signal");
            break;
        }

        for change in controller.pump_events() {
            for line in ui::render_change(change, &controller) {
                writeln!(stdout, "{}", line)?;
            }
            stdout.flush()?;
        }

        match poll.poll(&mut events, Some(TICK)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                debug!("poll() interrupted by signal");
                continue;
            }
            Err(e) => return Err(e.into()),
        }

        for event in events.iter() {
            if event.token() != STDIN {
                continue;
            }

            let n = match io::stdin().read(&mut buf) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if n == 0 {
                info!("stdin closed");
                break 'main;
            }
            pending.push_str(&String::from_utf8_lossy(&buf[..n]));

            while let Some(end) = pending.find('\n') {
                let line: String = pending.drain(..=end).collect();
                match handler.process_line(&line, &mut controller, &mut stdout) {
                    Ok(HandlerAction::Continue) => {}
                    Ok(HandlerAction::Quit) => break 'main,
                    Err(e) => {
                        error!("Command failed: {}", e);
                        writeln!(stdout, "Error: {}", e)?;
                    }
                }
                stdout.flush()?;
            }
        }
    }

    controller.shutdown();
    info!("readaloud exiting");
    Ok(())
}
