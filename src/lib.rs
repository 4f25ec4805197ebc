//! # voice-synth
//!
//! A Rust library for driving the host text-to-speech engine from a simple
//! "type, pick a voice, press speak" interface.
//!
//! ## Features
//!
//! - **Voice catalog**: enumerates the engine's voices and keeps a selection
//! - **Playback lifecycle**: `Idle -> Preparing -> Speaking -> Idle`, driven by
//!   start/stop actions and by events the engine publishes
//! - **espeak-ng backend**: speaks through the system `espeak-ng`, or renders
//!   to a WAV file
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Instant;
//! use voice_synth::{engines::espeak::EspeakEngine, Session, Settings};
//!
//! let engine = EspeakEngine::new()?;
//! let mut session = Session::new(engine, Settings::default());
//! session.set_text("Hello, world!");
//! session.start(Instant::now())?;
//! session.run_until_idle(|state| println!("{state}"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod catalog;
pub mod controller;
pub mod engines;
pub mod error;
pub mod events;
pub mod session;
pub mod settings;
pub mod types;

use std::path::Path;
use std::sync::mpsc::Receiver;

pub use catalog::VoiceCatalog;
pub use controller::{PlaybackController, StartOutcome};
pub use error::SpeechError;
pub use events::{EventBus, Subscription};
pub use session::Session;
pub use settings::Settings;
pub use types::{
    EngineEvent, PlaybackRequest, PlaybackRequestBuilder, PlaybackState, RequestId, SliderValue,
    Voice,
};

/// Audio an engine rendered instead of playing.
///
/// Samples are interleaved when `channels > 1`, exactly as decoded.
#[derive(Debug)]
pub struct SynthesisResult {
    pub samples: Vec<f32>,
    pub channels: u16,
    /// espeak-ng renders at 22050 Hz.
    pub sample_rate: u32,
}

impl SynthesisResult {
    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Save as 32-bit float WAV with the rendered channel layout.
    pub fn write_wav(&self, path: &Path) -> Result<(), SpeechError> {
        let spec = hound::WavSpec {
            channels: self.channels.max(1),
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        self.samples
            .iter()
            .try_for_each(|&sample| writer.write_sample(sample))?;
        writer.finalize()?;
        log::debug!(
            "Wrote {:.2}s ({} ch) to {}",
            self.duration_secs(),
            spec.channels,
            path.display()
        );
        Ok(())
    }
}

/// Common interface for host speech engines.
///
/// An engine is a single, process-wide collaborator: it owns audio output and
/// a queue of pending requests. Lifecycle signals are not returned from
/// [`speak`](SpeechEngine::speak); they are published as [`EngineEvent`]s to
/// every subscriber.
pub trait SpeechEngine {
    /// Enumerate the voices currently available.
    fn voices(&self) -> Result<Vec<Voice>, SpeechError>;

    /// Register for engine events. Dropping the returned [`Subscription`]
    /// stops delivery.
    fn subscribe(&self) -> (Subscription, Receiver<EngineEvent>);

    /// Queue a request for playback. Returns once the request is accepted;
    /// `Started` and `Ended` follow asynchronously.
    fn speak(&mut self, request: PlaybackRequest) -> Result<(), SpeechError>;

    /// Stop the in-flight request and discard anything queued.
    fn cancel(&mut self);

    /// Advance engine-internal work (reaping finished playback, starting the
    /// next queued request). Called from the session loop.
    fn poll(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_counts_frames_not_samples() {
        let mono = SynthesisResult {
            samples: vec![0.0; 11025],
            channels: 1,
            sample_rate: 22050,
        };
        assert!((mono.duration_secs() - 0.5).abs() < f64::EPSILON);

        let stereo = SynthesisResult {
            samples: vec![0.0; 22050],
            channels: 2,
            sample_rate: 22050,
        };
        assert_eq!(stereo.frames(), 11025);
        assert!((stereo.duration_secs() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn write_wav_keeps_channel_layout() {
        let path = std::env::temp_dir().join(format!("voice-synth-{}.wav", std::process::id()));
        let result = SynthesisResult {
            samples: vec![0.0, 0.25, -0.25, 0.5],
            channels: 2,
            sample_rate: 22050,
        };
        result.write_wav(&path).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        let frames = reader.duration();
        drop(reader);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.sample_format, hound::SampleFormat::Float);
        assert_eq!(frames, 2);
    }
}
