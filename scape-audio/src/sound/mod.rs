//! Sound abstraction
//!
//! A [`Sound`] is a lazily produced stream of PCM buffers on one or more layers.
//! Callers repeatedly await [`Sound::next_buffer`] for a layer until it resolves
//! `None`, which means that layer has no more audio.
//!
//! **Variants:**
//! - [`GenericSound`] / [`GlyphSound`]: one preloaded buffer, single-shot
//! - [`TtsSound`]: speech rendered on a background task, many buffers
//! - [`LayeredSound`]: constituents played concurrently, one per layer
//! - [`ConcatenatedSound`]: constituents played back to back on one layer
//! - [`BeaconSound`]: directional asset family selected by heading or location

pub mod beacon;
pub mod beacon_assets;
pub mod concatenated;
pub mod generic;
pub mod glyph;
pub mod layered;
pub mod sounds;
pub mod tts;

pub use beacon::{
    BeaconAsset, BeaconSound, DirectionalAssetSelector, ProximitySelector, RegionSelector,
    SelectorInput,
};
pub use concatenated::ConcatenatedSound;
pub use generic::{GenericSound, SoundSource};
pub use glyph::{Glyph, GlyphSound};
pub use layered::LayeredSound;
pub use sounds::Sounds;
pub use tts::{SpeechSynthesizer, SpeechStream, TtsSound};

use futures::future::BoxFuture;
use scape_common::Location;
use std::mem;

use crate::audio::{EqParameters, GainSettings, PcmBuffer};

/// Future resolving to the next buffer of a layer, `None` at end of stream
pub type BufferFuture = BoxFuture<'static, Option<PcmBuffer>>;

/// Whether a positioned sound keeps ringing from its position while the user turns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingMode {
    Normal,
    Ring,
}

/// How a sound is spatialized
#[derive(Debug, Clone, PartialEq)]
pub enum SoundType {
    /// Plain 2D audio
    Standard,
    /// Rendered from a geographic point
    Localized(Location, RingMode),
    /// Rendered at a bearing relative to the user's heading
    Relative(f64, RingMode),
    /// Rendered at an absolute compass heading
    Compass(f64, RingMode),
}

impl SoundType {
    /// Same case, ignoring payload
    pub fn same_kind(&self, other: &SoundType) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }

    pub fn is_spatial(&self) -> bool {
        !matches!(self, SoundType::Standard)
    }
}

/// Playable unit of audio
pub trait Sound: Send + Sync {
    fn sound_type(&self) -> &SoundType;

    /// Independent channels this sound produces, at least one
    fn layer_count(&self) -> usize;

    /// Diagnostic description
    fn description(&self) -> String;

    /// Next buffer for `layer`
    ///
    /// Safe to call repeatedly. Out-of-range layers resolve `None` immediately.
    fn next_buffer(&self, layer: usize) -> BufferFuture;

    /// EQ the audio engine should apply to `layer`
    fn equalizer_params(&self, _layer: usize, _gains: &GainSettings) -> Option<EqParameters> {
        None
    }
}

impl std::fmt::Debug for dyn Sound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.description())
    }
}

/// Already-resolved buffer future
pub(crate) fn ready(buffer: Option<PcmBuffer>) -> BufferFuture {
    Box::pin(futures::future::ready(buffer))
}

/// Shared validation for layered and concatenated composition
///
/// Every constituent must be single-layer and share the first one's type case.
pub(crate) fn composable(sounds: &[Box<dyn Sound>]) -> bool {
    let Some(first) = sounds.first() else {
        return false;
    };

    sounds
        .iter()
        .all(|s| s.layer_count() == 1 && s.sound_type().same_kind(first.sound_type()))
}

/// `"[a, b, c]"` listing of constituent descriptions
pub(crate) fn describe_all(sounds: &[Box<dyn Sound>]) -> String {
    let parts: Vec<String> = sounds.iter().map(|s| s.description()).collect();
    format!("[{}]", parts.join(", "))
}
