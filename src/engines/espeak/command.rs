use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;

use crate::error::SpeechError;
use crate::types::{PlaybackRequest, SliderValue};

/// espeak-ng speaking rate at a rate multiplier of 1.0, in words per minute.
pub const BASE_WPM: f32 = 175.0;

/// espeak-ng pitch at a pitch multiplier of 1.0 (its scale is 0–99).
pub const BASE_PITCH: f32 = 50.0;

const MAX_PITCH: u32 = 99;

/// Location of the espeak-ng (or espeak) binary.
#[derive(Debug, Clone)]
pub struct EspeakConfig {
    pub binary: PathBuf,
}

impl EspeakConfig {
    /// Find `espeak-ng` on PATH, falling back to `espeak`.
    pub fn detect() -> Result<Self, SpeechError> {
        ["espeak-ng", "espeak"]
            .iter()
            .find_map(|name| which::which(name).ok())
            .map(|binary| Self { binary })
            .ok_or_else(|| SpeechError::EngineNotFound("espeak-ng, espeak".to_string()))
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn name(&self) -> String {
        self.binary.display().to_string()
    }

    fn command(&self) -> Command {
        Command::new(&self.binary)
    }

    /// Run `--voices` and return its stdout.
    pub fn list_voices(&self) -> Result<String, SpeechError> {
        let output = self
            .command()
            .arg("--voices")
            .output()
            .map_err(|e| SpeechError::VoiceEnumeration(format!("{}: {e}", self.name())))?;

        if !output.status.success() {
            return Err(SpeechError::VoiceEnumeration(format!(
                "{} --voices exited with {}: {}",
                self.name(),
                output.status,
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Spawn a child speaking `request` to the default audio device.
    pub fn spawn_speak(&self, request: &PlaybackRequest) -> Result<Child, SpeechError> {
        let mut cmd = self.command();
        cmd.args(voice_args(request))
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            // Nothing reads stderr while the child plays.
            .stderr(Stdio::null());
        self.spawn_with_text(cmd, &request.text)
    }

    /// Synthesize `request` into a WAV file at `wav_path` and wait for it.
    pub fn write_wav(&self, request: &PlaybackRequest, wav_path: &Path) -> Result<(), SpeechError> {
        let mut cmd = self.command();
        cmd.args(voice_args(request))
            .arg("-w")
            .arg(wav_path)
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        let child = self.spawn_with_text(cmd, &request.text)?;

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(SpeechError::EngineFailed {
                engine: self.name(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }

    /// Spawn `cmd` and feed `text` to its stdin from a writer thread.
    ///
    /// The pipe holds far less than a long message, so writing inline would
    /// block the caller until the child has consumed most of the text.
    fn spawn_with_text(&self, mut cmd: Command, text: &str) -> Result<Child, SpeechError> {
        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SpeechError::EngineNotFound(self.name())
            } else {
                SpeechError::Io(e)
            }
        })?;

        let Some(mut stdin) = child.stdin.take() else {
            return Ok(child);
        };
        let payload = stdin_payload(text).into_owned();
        let pid = child.id();
        let feeder = thread::Builder::new()
            .name(format!("espeak-stdin-{pid}"))
            .spawn(move || {
                // Dropping stdin when the closure returns sends EOF.
                if let Err(e) = stdin.write_all(payload.as_bytes()) {
                    // A cancelled child closes its end early.
                    log::debug!("Stopped feeding text to pid {pid}: {e}");
                }
            });

        if let Err(e) = feeder {
            if let Err(kill_err) = child.kill() {
                log::debug!("Could not kill pid {pid}: {kill_err}");
            }
            if let Err(wait_err) = child.wait() {
                log::warn!("Failed to reap pid {pid}: {wait_err}");
            }
            return Err(SpeechError::Io(e));
        }
        Ok(child)
    }
}

fn voice_args(request: &PlaybackRequest) -> Vec<String> {
    let mut args = Vec::with_capacity(6);
    if let Some(voice) = &request.voice {
        args.push("-v".to_string());
        args.push(voice.identifier.clone());
    }
    args.push("-s".to_string());
    args.push(words_per_minute(request.rate).to_string());
    args.push("-p".to_string());
    args.push(espeak_pitch(request.pitch).to_string());
    args
}

pub fn words_per_minute(rate: SliderValue) -> u32 {
    (BASE_WPM * rate.get()).round() as u32
}

pub fn espeak_pitch(pitch: SliderValue) -> u32 {
    ((BASE_PITCH * pitch.get()).round() as u32).min(MAX_PITCH)
}

// espeak-ng reads stdin line by line; an unterminated last line can be
// under-processed.
fn stdin_payload(input: &str) -> Cow<'_, str> {
    if input.ends_with('\n') {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(format!("{input}\n"))
    }
}
