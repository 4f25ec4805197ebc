use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Child;
use std::sync::mpsc::Receiver;

use crate::error::SpeechError;
use crate::events::{EventBus, Subscription};
use crate::types::{EngineEvent, PlaybackRequest, RequestId, Voice};
use crate::{SpeechEngine, SynthesisResult};

use super::command::EspeakConfig;
use super::voices::parse_voice_list;

struct Playback {
    id: RequestId,
    child: Child,
}

/// Speech engine backed by the system espeak-ng.
///
/// Each request runs as one `espeak-ng` child process playing to the default
/// audio device. Requests submitted while one is playing wait in a queue and
/// start as soon as the previous child exits.
///
/// # Quick Start
///
/// ```rust,no_run
/// use voice_synth::{engines::espeak::EspeakEngine, PlaybackRequestBuilder, RequestId, SpeechEngine};
///
/// let mut engine = EspeakEngine::new()?;
/// let (_subscription, events) = engine.subscribe();
/// let request = PlaybackRequestBuilder::default()
///     .id(RequestId(1))
///     .text("Hello, world!")
///     .build()?;
/// engine.speak(request)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct EspeakEngine {
    config: EspeakConfig,
    bus: EventBus,
    queue: VecDeque<PlaybackRequest>,
    current: Option<Playback>,
}

impl EspeakEngine {
    /// Create an engine using `espeak-ng` (or `espeak`) from PATH.
    pub fn new() -> Result<Self, SpeechError> {
        Ok(Self::with_config(EspeakConfig::detect()?))
    }

    /// Create an engine with an explicit binary, e.g. a bundled espeak-ng.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self::with_config(EspeakConfig::with_binary(binary))
    }

    pub fn with_config(config: EspeakConfig) -> Self {
        log::info!("Using speech engine at {}", config.binary.display());
        Self {
            config,
            bus: EventBus::new(),
            queue: VecDeque::new(),
            current: None,
        }
    }

    pub fn binary(&self) -> &Path {
        &self.config.binary
    }

    pub fn is_speaking(&self) -> bool {
        self.current.is_some()
    }

    /// Synthesize `request` without playing it.
    ///
    /// Does not touch the playback queue and publishes no events.
    pub fn render(&self, request: &PlaybackRequest) -> Result<SynthesisResult, SpeechError> {
        let scratch = std::env::temp_dir().join(format!(
            "voice-synth-{}-{}.wav",
            std::process::id(),
            request.id.0
        ));
        self.config.write_wav(request, &scratch)?;
        let result = read_wav(&scratch);
        if let Err(e) = std::fs::remove_file(&scratch) {
            log::warn!("Could not remove {}: {e}", scratch.display());
        }
        result
    }

    /// Render `request` and write it to `wav_path` as 32-bit float WAV.
    pub fn render_to_file(
        &self,
        request: &PlaybackRequest,
        wav_path: &Path,
    ) -> Result<SynthesisResult, SpeechError> {
        let result = self.render(request)?;
        result.write_wav(wav_path)?;
        Ok(result)
    }

    fn start_next(&mut self) {
        while let Some(request) = self.queue.pop_front() {
            match self.launch(&request) {
                Ok(()) => return,
                Err(e) => {
                    log::error!("Failed to start request {}: {e}", request.id);
                    self.bus.publish(EngineEvent::Ended(request.id));
                }
            }
        }
    }

    fn launch(&mut self, request: &PlaybackRequest) -> Result<(), SpeechError> {
        let child = self.config.spawn_speak(request)?;
        log::debug!("Request {} playing (pid {})", request.id, child.id());
        self.current = Some(Playback {
            id: request.id,
            child,
        });
        self.bus.publish(EngineEvent::Started(request.id));
        Ok(())
    }

    fn finish(&mut self, playback: Playback) {
        log::debug!("Request {} finished", playback.id);
        self.bus.publish(EngineEvent::Ended(playback.id));
    }
}

impl Drop for EspeakEngine {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl SpeechEngine for EspeakEngine {
    fn voices(&self) -> Result<Vec<Voice>, SpeechError> {
        let output = self.config.list_voices()?;
        Ok(parse_voice_list(&output))
    }

    fn subscribe(&self) -> (Subscription, Receiver<EngineEvent>) {
        self.bus.subscribe()
    }

    fn speak(&mut self, request: PlaybackRequest) -> Result<(), SpeechError> {
        if self.current.is_some() {
            log::debug!("Queueing request {} behind the current one", request.id);
            self.queue.push_back(request);
            return Ok(());
        }
        self.launch(&request)
    }

    fn cancel(&mut self) {
        if !self.queue.is_empty() {
            log::debug!("Discarding {} queued requests", self.queue.len());
            self.queue.clear();
        }
        if let Some(mut playback) = self.current.take() {
            log::info!("Cancelling request {}", playback.id);
            if let Err(e) = playback.child.kill() {
                // The child may already have exited on its own.
                log::debug!("Could not kill request {}: {e}", playback.id);
            }
            if let Err(e) = playback.child.wait() {
                log::warn!("Failed to reap espeak child: {e}");
            }
            self.finish(playback);
        }
    }

    fn poll(&mut self) {
        let Some(playback) = self.current.as_mut() else {
            return;
        };
        match playback.child.try_wait() {
            Ok(None) => return,
            Ok(Some(status)) if !status.success() => {
                log::error!("Request {} exited with {status}", playback.id);
            }
            Ok(Some(_)) => {}
            Err(e) => log::error!("Lost track of request {}: {e}", playback.id),
        }
        if let Some(playback) = self.current.take() {
            self.finish(playback);
        }
        self.start_next();
    }
}

fn read_wav(path: &Path) -> Result<SynthesisResult, SpeechError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    Ok(SynthesisResult {
        samples,
        channels: spec.channels.max(1),
        sample_rate: spec.sample_rate,
    })
}
