//! Text-to-speech sounds
//!
//! Speech is rendered by a [`SpeechSynthesizer`] on a background Tokio task
//! that starts the first time a buffer is requested.
//!
//! **Hand-off:**
//! - A buffer produced while requests are waiting goes to the oldest waiting request
//! - Otherwise it is queued and handed out on the next request, oldest first
//! - When rendering ends (naturally, by error or by `stop_rendering`) every
//!   waiting request resolves `None`
//!
//! Synthesis errors are logged and treated as end of speech.

use futures::stream::BoxStream;
use futures::StreamExt;
use scape_common::Location;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::{debug, error, trace};

use crate::audio::{EqParameters, GainSettings, PcmBuffer, VoiceFilters};
use crate::error::SynthesisError;
use crate::sound::{ready, BufferFuture, RingMode, Sound, SoundType};

/// Stream of rendered speech buffers
pub type SpeechStream = BoxStream<'static, Result<PcmBuffer, SynthesisError>>;

/// Speech synthesis backend
pub trait SpeechSynthesizer: Send + Sync {
    /// Start rendering `text`, optionally with a specific voice
    fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<SpeechStream, SynthesisError>;

    /// Voice used when none is requested
    fn default_voice(&self) -> Option<String> {
        None
    }
}

enum RenderState {
    Idle,
    Rendering(AbortHandle),
    Finished,
}

struct TtsState {
    buffers: VecDeque<PcmBuffer>,
    resolvers: VecDeque<oneshot::Sender<Option<PcmBuffer>>>,
    render: RenderState,
}

impl TtsState {
    /// Hand a buffer to the oldest live request, or queue it
    fn deliver(&mut self, buffer: PcmBuffer) {
        let mut buffer = buffer;
        while let Some(resolver) = self.resolvers.pop_front() {
            match resolver.send(Some(buffer)) {
                Ok(()) => return,
                // Requester went away, try the next one
                Err(returned) => match returned {
                    Some(b) => buffer = b,
                    None => return,
                },
            }
        }
        self.buffers.push_back(buffer);
    }

    /// Mark rendering done and release every waiting request
    fn finish(&mut self) {
        self.render = RenderState::Finished;
        for resolver in self.resolvers.drain(..) {
            let _ = resolver.send(None);
        }
    }
}

fn lock(state: &Mutex<TtsState>) -> std::sync::MutexGuard<'_, TtsState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Speech sound streaming buffers from a synthesizer
pub struct TtsSound {
    text: String,
    sound_type: SoundType,
    voice: Option<String>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    filters: Arc<VoiceFilters>,
    state: Arc<Mutex<TtsState>>,
}

impl TtsSound {
    /// Standard (non-spatial) speech
    pub fn new(text: impl Into<String>, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            text: text.into(),
            sound_type: SoundType::Standard,
            voice: None,
            synthesizer,
            filters: Arc::new(VoiceFilters::default()),
            state: Arc::new(Mutex::new(TtsState {
                buffers: VecDeque::new(),
                resolvers: VecDeque::new(),
                render: RenderState::Idle,
            })),
        }
    }

    pub fn localized(mut self, location: Location) -> Self {
        self.sound_type = SoundType::Localized(location, RingMode::Ring);
        self
    }

    pub fn relative(mut self, direction: f64) -> Self {
        self.sound_type = SoundType::Relative(direction, RingMode::Ring);
        self
    }

    pub fn compass(mut self, heading: f64) -> Self {
        self.sound_type = SoundType::Compass(heading, RingMode::Ring);
        self
    }

    /// Render with a specific voice instead of the synthesizer default
    pub fn with_voice(mut self, voice: Option<String>) -> Self {
        self.voice = voice;
        self
    }

    pub fn with_voice_filters(mut self, filters: Arc<VoiceFilters>) -> Self {
        self.filters = filters;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cancel rendering; waiting requests resolve `None`
    ///
    /// Buffers already queued are still handed out.
    pub fn stop_rendering(&self) {
        let mut state = lock(&self.state);
        if let RenderState::Rendering(handle) = &state.render {
            debug!("Stopping speech rendering for \"{}\"", self.text);
            handle.abort();
        }
        state.finish();
    }

    fn start_rendering(&self, state: &mut TtsState) {
        let stream = match self.synthesizer.synthesize(&self.text, self.voice.as_deref()) {
            Ok(stream) => stream,
            Err(e) => {
                error!("Unable to synthesize \"{}\": {}", self.text, e);
                state.finish();
                return;
            }
        };

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("No Tokio runtime to render \"{}\": {}", self.text, e);
                state.finish();
                return;
            }
        };

        trace!("Rendering \"{}\"", self.text);
        let weak = Arc::downgrade(&self.state);
        let text = self.text.clone();
        let task = runtime.spawn(render(stream, weak, text));
        state.render = RenderState::Rendering(task.abort_handle());
    }
}

async fn render(mut stream: SpeechStream, state: Weak<Mutex<TtsState>>, text: String) {
    while let Some(item) = stream.next().await {
        match item {
            Ok(buffer) => {
                let Some(state) = state.upgrade() else {
                    return;
                };
                lock(&state).deliver(buffer);
            }
            Err(e) => {
                error!("Speech rendering failed for \"{}\": {}", text, e);
                break;
            }
        }
    }

    if let Some(state) = state.upgrade() {
        trace!("Finished rendering \"{}\"", text);
        lock(&state).finish();
    }
}

impl Sound for TtsSound {
    fn sound_type(&self) -> &SoundType {
        &self.sound_type
    }

    fn layer_count(&self) -> usize {
        1
    }

    fn description(&self) -> String {
        format!("\"{}\"", self.text)
    }

    fn next_buffer(&self, layer: usize) -> BufferFuture {
        if layer != 0 {
            return ready(None);
        }

        let mut state = lock(&self.state);

        if matches!(state.render, RenderState::Idle) {
            self.start_rendering(&mut state);
        }

        if let Some(buffer) = state.buffers.pop_front() {
            return ready(Some(buffer));
        }

        if matches!(state.render, RenderState::Finished) {
            return ready(None);
        }

        let (tx, rx) = oneshot::channel();
        state.resolvers.push_back(tx);
        Box::pin(async move { rx.await.unwrap_or(None) })
    }

    fn equalizer_params(&self, layer: usize, gains: &GainSettings) -> Option<EqParameters> {
        if layer != 0 {
            return None;
        }

        let voice = gains
            .voice_id
            .clone()
            .or_else(|| self.synthesizer.default_voice())?;
        let bands = self.filters.get(&voice).map(|f| f.band_parameters.clone());

        if bands.is_none() && gains.tts_gain == 0.0 {
            return None;
        }

        Some(EqParameters::new(gains.tts_gain, bands.unwrap_or_default()))
    }
}

impl Drop for TtsSound {
    fn drop(&mut self) {
        if let RenderState::Rendering(handle) = &lock(&self.state).render {
            handle.abort();
        }
    }
}
