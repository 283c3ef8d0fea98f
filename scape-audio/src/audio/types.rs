//! Core audio data types
//!
//! PCM buffers handed from sounds to the external audio engine.
//!
//! **Format:**
//! - Samples are f32 (floating point -1.0 to 1.0) regardless of the source encoding
//! - Multi-channel audio is interleaved: [L, R, L, R, ...]
//! - The buffer payload sits behind an `Arc` so clones are cheap

use std::fmt;
use std::sync::Arc;

/// Sample encoding of the source material, with its true bit depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleEncoding {
    /// 32-bit IEEE float
    Float,
    /// Signed integer PCM (8, 16, 24 or 32 bits)
    Int { bits: u16 },
}

impl SampleEncoding {
    pub fn bits_per_sample(&self) -> u16 {
        match self {
            SampleEncoding::Float => 32,
            SampleEncoding::Int { bits } => *bits,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            SampleEncoding::Float => "float",
            SampleEncoding::Int { .. } => "int",
        }
    }
}

/// Sample rate, channel layout and bit depth of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channel_count: u16,
    pub encoding: SampleEncoding,
}

impl PcmFormat {
    pub fn new(sample_rate: u32, channel_count: u16, encoding: SampleEncoding) -> Self {
        Self {
            sample_rate,
            channel_count,
            encoding,
        }
    }

    /// Mono float at `sample_rate`, the format speech is rendered in
    pub fn mono_f32(sample_rate: u32) -> Self {
        Self::new(sample_rate, 1, SampleEncoding::Float)
    }
}

impl fmt::Display for PcmFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Hz / {} ch / {}-bit {}",
            self.sample_rate,
            self.channel_count,
            self.encoding.bits_per_sample(),
            self.encoding.kind()
        )
    }
}

/// Block of interleaved PCM frames
#[derive(Debug, Clone)]
pub struct PcmBuffer {
    format: PcmFormat,
    /// Frames the buffer was allocated for
    frame_capacity: usize,
    /// Frames holding valid audio (never more than capacity)
    frame_length: usize,
    samples: Arc<[f32]>,
}

impl PcmBuffer {
    /// Wrap interleaved samples
    ///
    /// Trailing samples that do not complete a frame are dropped.
    pub fn new(format: PcmFormat, samples: Vec<f32>) -> Self {
        let channels = format.channel_count.max(1) as usize;
        let frames = samples.len() / channels;
        let mut samples = samples;
        samples.truncate(frames * channels);

        Self {
            format,
            frame_capacity: frames,
            frame_length: frames,
            samples: samples.into(),
        }
    }

    /// Silence with the given format and frame length
    pub fn silent(format: PcmFormat, frames: usize) -> Self {
        let channels = format.channel_count.max(1) as usize;
        Self {
            format,
            frame_capacity: frames,
            frame_length: frames,
            samples: vec![0.0; frames * channels].into(),
        }
    }

    pub fn format(&self) -> PcmFormat {
        self.format
    }

    pub fn frame_capacity(&self) -> usize {
        self.frame_capacity
    }

    pub fn frame_length(&self) -> usize {
        self.frame_length
    }

    /// Interleaved samples of the valid frames
    pub fn samples(&self) -> &[f32] {
        let channels = self.format.channel_count.max(1) as usize;
        &self.samples[..self.frame_length * channels]
    }

    pub fn is_empty(&self) -> bool {
        self.frame_length == 0
    }

    /// Playback duration in seconds
    pub fn duration(&self) -> f64 {
        if self.format.sample_rate == 0 {
            return 0.0;
        }
        self.frame_length as f64 / self.format.sample_rate as f64
    }

    /// Whether every sample is zero
    pub fn is_silent(&self) -> bool {
        self.samples().iter().all(|s| *s == 0.0)
    }
}
