//! # Scape Audio Library (scape-audio)
//!
//! Spatial callout audio composition.
//!
//! **Purpose:** Produce PCM buffers for spoken and earcon callouts, compose them
//! into layered and concatenated sounds, queue them as per-callout playlists and
//! select directional beacon assets from the user's heading and location.
//!
//! **Architecture:** Every playable unit implements [`sound::Sound`], whose
//! `next_buffer(layer)` returns a future resolving to the next buffer or `None`
//! at end of stream. Speech is rendered on a background Tokio task per sound.
//! Playback itself belongs to an external audio engine; [`playback`] provides
//! the reference consumer loop.

pub mod audio;
pub mod callout;
pub mod error;
pub mod localization;
pub mod playback;
pub mod sound;

pub use error::{Error, Result, SynthesisError};
