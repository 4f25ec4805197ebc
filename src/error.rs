#[derive(thiserror::Error, Debug)]
pub enum SpeechError {
    /// Shown to the user when playback is requested without any text.
    #[error("Please enter some text!")]
    EmptyText,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WAV decode error: {0}")]
    Wav(#[from] hound::Error),
    #[error("Invalid settings file: {0}")]
    Settings(#[from] serde_json::Error),
    #[error("Incomplete playback request: {0}")]
    IncompleteRequest(#[from] derive_builder::UninitializedFieldError),
    #[error(
        "No speech engine found (tried `{0}`). Install: Linux: `sudo apt-get install espeak-ng`, \
         macOS: `brew install espeak-ng`, Windows: https://espeak-ng.org/download"
    )]
    EngineNotFound(String),
    #[error("{engine} exited with code {code:?}: {stderr}")]
    EngineFailed {
        engine: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("Failed to enumerate voices: {0}")]
    VoiceEnumeration(String),
}
