//! Single-buffer sounds from a named asset or an audio file

use scape_common::Location;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

use crate::audio::{load_wav_file, AssetLoader, EqParameters, GainSettings, PcmBuffer};
use crate::sound::{ready, BufferFuture, RingMode, Sound, SoundType};

/// Where a generic sound's audio came from
#[derive(Debug, Clone, PartialEq)]
pub enum SoundSource {
    /// Named asset resolved through an [`AssetLoader`]
    Asset(String),
    /// Audio file on disk
    File(PathBuf),
    /// Buffer supplied directly by the caller
    Buffer(String),
}

/// Sound holding one preloaded buffer
///
/// The buffer is handed out on the first `next_buffer(0)` call and every later
/// call resolves `None`. A source that fails to load leaves the sound silent
/// rather than failing the surrounding composition.
#[derive(Debug)]
pub struct GenericSound {
    sound_type: SoundType,
    source: SoundSource,
    buffer: Mutex<Option<PcmBuffer>>,
    duration: Option<f64>,
}

impl GenericSound {
    /// Standard sound from a named asset
    pub fn from_asset(loader: &dyn AssetLoader, name: &str) -> Self {
        let buffer = match loader.load(name) {
            Ok(buffer) => Some(buffer),
            Err(e) => {
                warn!("Unable to load asset {}: {}", name, e);
                None
            }
        };
        Self::with_buffer(SoundSource::Asset(name.to_string()), buffer)
    }

    /// Standard sound from an audio file
    pub fn from_file(path: &Path) -> Self {
        let buffer = match load_wav_file(path) {
            Ok(buffer) => Some(buffer),
            Err(e) => {
                warn!("Unable to load audio file {}: {}", path.display(), e);
                None
            }
        };
        Self::with_buffer(SoundSource::File(path.to_path_buf()), buffer)
    }

    /// Standard sound from an already decoded buffer
    pub fn from_buffer(name: impl Into<String>, buffer: PcmBuffer) -> Self {
        Self::with_buffer(SoundSource::Buffer(name.into()), Some(buffer))
    }

    fn with_buffer(source: SoundSource, buffer: Option<PcmBuffer>) -> Self {
        Self {
            sound_type: SoundType::Standard,
            source,
            duration: buffer.as_ref().map(PcmBuffer::duration),
            buffer: Mutex::new(buffer),
        }
    }

    /// Render from a geographic point
    pub fn localized(mut self, location: Location) -> Self {
        self.sound_type = SoundType::Localized(location, RingMode::Ring);
        self
    }

    /// Render at a bearing relative to the user's heading
    pub fn relative(mut self, direction: f64) -> Self {
        self.sound_type = SoundType::Relative(direction, RingMode::Ring);
        self
    }

    /// Render at an absolute compass heading
    pub fn compass(mut self, heading: f64) -> Self {
        self.sound_type = SoundType::Compass(heading, RingMode::Ring);
        self
    }

    pub fn source(&self) -> &SoundSource {
        &self.source
    }

    /// Seconds of audio, `None` when the source failed to load
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub(crate) fn source_name(&self) -> String {
        match &self.source {
            SoundSource::Asset(name) | SoundSource::Buffer(name) => name.clone(),
            SoundSource::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
        }
    }

    pub(crate) fn take_buffer(&self) -> Option<PcmBuffer> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl Sound for GenericSound {
    fn sound_type(&self) -> &SoundType {
        &self.sound_type
    }

    fn layer_count(&self) -> usize {
        1
    }

    fn description(&self) -> String {
        format!("{{{}}}", self.source_name())
    }

    fn next_buffer(&self, layer: usize) -> BufferFuture {
        if layer != 0 {
            return ready(None);
        }
        ready(self.take_buffer())
    }

    fn equalizer_params(&self, _layer: usize, gains: &GainSettings) -> Option<EqParameters> {
        EqParameters::from_gain(gains.afx_gain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{MemoryAssetLoader, PcmFormat};

    fn loader() -> MemoryAssetLoader {
        MemoryAssetLoader::new().with_asset("click", PcmBuffer::silent(PcmFormat::mono_f32(8_000), 800))
    }

    #[tokio::test]
    async fn test_single_shot() {
        let sound = GenericSound::from_asset(&loader(), "click");

        assert_eq!(sound.duration(), Some(0.1));
        assert!(sound.next_buffer(0).await.is_some());
        assert!(sound.next_buffer(0).await.is_none());
        assert!(sound.next_buffer(0).await.is_none());
    }

    #[tokio::test]
    async fn test_out_of_range_layer() {
        let sound = GenericSound::from_asset(&loader(), "click");
        assert!(sound.next_buffer(1).await.is_none());
        // Layer 0 is untouched by the out-of-range request
        assert!(sound.next_buffer(0).await.is_some());
    }

    #[tokio::test]
    async fn test_missing_asset_is_silent() {
        let sound = GenericSound::from_asset(&loader(), "missing");
        assert_eq!(sound.duration(), None);
        assert!(sound.next_buffer(0).await.is_none());
    }

    #[test]
    fn test_description_and_type() {
        let sound = GenericSound::from_asset(&loader(), "click").relative(90.0);
        assert_eq!(sound.description(), "{click}");
        assert_eq!(sound.sound_type(), &SoundType::Relative(90.0, RingMode::Ring));

        let sound = GenericSound::from_file(Path::new("/tmp/none/alert.wav"));
        assert_eq!(sound.description(), "{alert.wav}");
    }

    #[test]
    fn test_afx_gain_eq() {
        let sound = GenericSound::from_asset(&loader(), "click");
        let mut gains = GainSettings::default();
        assert!(sound.equalizer_params(0, &gains).is_none());

        gains.afx_gain = -2.0;
        assert_eq!(sound.equalizer_params(0, &gains).unwrap().global_gain, -2.0);
    }
}
