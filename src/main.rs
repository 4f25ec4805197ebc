use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use voice_synth::engines::espeak::EspeakEngine;
use voice_synth::engines::scripted::ScriptedEngine;
use voice_synth::{
    PlaybackRequestBuilder, PlaybackState, RequestId, Session, Settings, SpeechEngine,
    StartOutcome, Voice,
};

/// Transform your text into speech
///
/// Reads the message from the command line (or stdin), picks a voice and
/// plays it through the system espeak-ng.
#[derive(Parser)]
#[command(name = "voice-synth")]
#[command(version)]
struct Cli {
    /// Text to speak (reads from stdin if not provided)
    text: Vec<String>,

    /// Voice name as shown by --list-voices
    #[arg(short, long)]
    voice: Option<String>,

    /// Speed multiplier, 0.5 to 2.0
    #[arg(short, long)]
    rate: Option<f32>,

    /// Pitch multiplier, 0.5 to 2.0
    #[arg(short, long)]
    pitch: Option<f32>,

    /// List available voices and exit
    #[arg(long)]
    list_voices: bool,

    /// Print the voice list as JSON
    #[arg(long, requires = "list_voices")]
    json: bool,

    /// JSON settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the speech to a WAV file instead of playing it
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Run the playback lifecycle without producing audio
    #[arg(long, conflicts_with = "output")]
    dry_run: bool,
}

// The longest message accepted from stdin, in characters.
const MAX_STDIN_CHARS: usize = 10_000;

/// Read a message, replacing invalid UTF-8 and keeping at most
/// `MAX_STDIN_CHARS` characters.
fn read_message(mut reader: impl Read) -> io::Result<String> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let text = String::from_utf8_lossy(&bytes);

    let total = text.chars().count();
    if total > MAX_STDIN_CHARS {
        log::warn!("Message has {total} characters, keeping the first {MAX_STDIN_CHARS}");
        return Ok(text.chars().take(MAX_STDIN_CHARS).collect());
    }
    Ok(text.into_owned())
}

fn settings_from(cli: &Cli) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(rate) = cli.rate {
        settings.rate = rate.into();
    }
    if let Some(pitch) = cli.pitch {
        settings.pitch = pitch.into();
    }
    if let Some(voice) = &cli.voice {
        settings.voice = Some(voice.clone());
    }
    Ok(settings)
}

fn espeak_engine(settings: &Settings) -> Result<EspeakEngine, Box<dyn std::error::Error>> {
    Ok(match &settings.espeak_binary {
        Some(binary) => EspeakEngine::with_binary(binary),
        None => EspeakEngine::new()?,
    })
}

fn print_voices(voices: &[Voice], json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(voices)?);
        return Ok(());
    }
    for voice in voices {
        let marker = if voice.default { " *" } else { "" };
        println!("{voice}{marker}");
    }
    Ok(())
}

fn speak<E: SpeechEngine>(
    engine: E,
    settings: Settings,
    text: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::new(engine, settings);
    if let Some(name) = session.catalog().selected() {
        if session.catalog().find(name).is_none() {
            log::warn!("Voice '{name}' not found, using the engine default");
        }
    }
    session.set_text(text);

    // A blank message surfaces its notice through the error.
    if let StartOutcome::Scheduled(id) = session.start(Instant::now())? {
        log::debug!("Scheduled request {id}");
    }
    println!("{}", PlaybackState::Preparing);
    session.run_until_idle(|state| match state {
        PlaybackState::Speaking => println!("{state} Audio playing..."),
        PlaybackState::Idle => println!("Done."),
        PlaybackState::Preparing => println!("{state}"),
    });
    session.close();
    Ok(())
}

fn render(
    engine: &EspeakEngine,
    settings: &Settings,
    text: String,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let voices = engine.voices().unwrap_or_default();
    let voice = settings
        .voice
        .as_deref()
        .and_then(|name| voices.iter().find(|v| v.name == name).cloned());
    let request = PlaybackRequestBuilder::default()
        .id(RequestId(1))
        .text(text)
        .voice(voice)
        .rate(settings.rate)
        .pitch(settings.pitch)
        .build()?;

    let result = engine.render_to_file(&request, path)?;
    println!(
        "Saved {:.2}s of audio to {}",
        result.duration_secs(),
        path.display()
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();
    let settings = settings_from(&cli)?;

    if cli.list_voices {
        let engine = espeak_engine(&settings)?;
        return print_voices(&engine.voices()?, cli.json);
    }

    let text = if cli.text.is_empty() {
        read_message(io::stdin().lock())?
    } else {
        cli.text.join(" ")
    };
    println!("{} characters", text.chars().count());

    if cli.dry_run {
        let engine = ScriptedEngine::with_voices(vec![Voice::new("Dry run", "en-us")]).auto_play();
        return speak(engine, settings, text);
    }

    let engine = espeak_engine(&settings)?;
    match &cli.output {
        Some(path) => render(&engine, &settings, text, path),
        None => speak(engine, settings, text),
    }
}
