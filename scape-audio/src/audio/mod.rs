//! Audio buffers, asset loading and equalizer descriptions

pub mod eq;
pub mod loader;
pub mod types;

pub use eq::{EqParameters, FilterBandParameters, FilterType, GainSettings, VoiceFilters};
pub use loader::{load_wav_file, AssetLoader, MemoryAssetLoader, WavAssetLoader};
pub use types::{PcmBuffer, PcmFormat, SampleEncoding};
