//! Named audio asset loading
//!
//! Sounds never touch the filesystem directly; they ask an [`AssetLoader`] for a
//! named asset and receive a fully decoded [`PcmBuffer`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::audio::types::{PcmBuffer, PcmFormat, SampleEncoding};
use crate::error::{Error, Result};

/// Source of named PCM assets
pub trait AssetLoader: Send + Sync {
    /// Load and fully decode the asset called `name`
    fn load(&self, name: &str) -> Result<PcmBuffer>;
}

/// Loads `<directory>/<name>.<extension>` WAV files
#[derive(Debug, Clone)]
pub struct WavAssetLoader {
    directory: PathBuf,
    extension: String,
}

impl WavAssetLoader {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            extension: "wav".to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path an asset name resolves to
    pub fn asset_path(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{}.{}", name, self.extension))
    }
}

impl AssetLoader for WavAssetLoader {
    fn load(&self, name: &str) -> Result<PcmBuffer> {
        let path = self.asset_path(name);
        if !path.is_file() {
            return Err(Error::AssetNotFound(name.to_string()));
        }
        load_wav_file(&path)
    }
}

/// Decode a WAV file into normalized f32 samples
pub fn load_wav_file(path: &Path) -> Result<PcmBuffer> {
    let decode_err = |reason: String| Error::AssetDecode {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = hound::WavReader::open(path).map_err(|e| match e {
        hound::Error::IoError(io) => Error::Io(io),
        other => decode_err(other.to_string()),
    })?;
    let spec = reader.spec();

    let (encoding, samples) = match spec.sample_format {
        hound::SampleFormat::Float => {
            let samples = reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| decode_err(e.to_string()))?;
            (SampleEncoding::Float, samples)
        }
        hound::SampleFormat::Int if spec.bits_per_sample <= 16 => {
            let scale = (1u32 << (spec.bits_per_sample - 1)) as f32;
            let samples = reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| decode_err(e.to_string()))?;
            (SampleEncoding::Int { bits: spec.bits_per_sample }, samples)
        }
        hound::SampleFormat::Int => {
            let scale = (1u64 << (spec.bits_per_sample - 1)) as f32;
            let samples = reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| decode_err(e.to_string()))?;
            (SampleEncoding::Int { bits: spec.bits_per_sample }, samples)
        }
    };

    let format = PcmFormat::new(spec.sample_rate, spec.channels, encoding);
    let buffer = PcmBuffer::new(format, samples);

    debug!(
        "Loaded {} ({} frames, {})",
        path.display(),
        buffer.frame_length(),
        format
    );

    Ok(buffer)
}

/// Pre-registered in-memory assets
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetLoader {
    assets: HashMap<String, PcmBuffer>,
}

impl MemoryAssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, buffer: PcmBuffer) {
        self.assets.insert(name.into(), buffer);
    }

    pub fn with_asset(mut self, name: impl Into<String>, buffer: PcmBuffer) -> Self {
        self.insert(name, buffer);
        self
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetLoader for MemoryAssetLoader {
    fn load(&self, name: &str) -> Result<PcmBuffer> {
        trace!("Memory asset lookup: {}", name);
        self.assets
            .get(name)
            .cloned()
            .ok_or_else(|| Error::AssetNotFound(name.to_string()))
    }
}
