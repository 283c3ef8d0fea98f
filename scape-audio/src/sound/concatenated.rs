//! Sounds played back to back on a single layer
//!
//! When a constituent runs out, the next constituent's first buffer is requested
//! before the pending request resolves, so consumers never see a gap between
//! constituents. Constituents that produce nothing at all are skipped.

use std::sync::{Arc, Mutex, PoisonError};
use tracing::trace;

use crate::audio::{EqParameters, GainSettings};
use crate::sound::{composable, describe_all, ready, BufferFuture, Sound, SoundType};

struct Inner {
    sounds: Vec<Box<dyn Sound>>,
    current: Mutex<usize>,
}

impl Inner {
    fn current(&self) -> usize {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move past `finished` unless another request already did
    fn advance_from(&self, finished: usize) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if *current == finished {
            *current += 1;
        }
    }
}

pub struct ConcatenatedSound {
    inner: Arc<Inner>,
    description: String,
}

impl ConcatenatedSound {
    /// Sequence single-layer sounds of the same type case
    ///
    /// Returns `None` for an empty list, a multi-layer constituent, or mixed type cases.
    pub fn new(sounds: Vec<Box<dyn Sound>>) -> Option<Self> {
        if !composable(&sounds) {
            return None;
        }

        let description = describe_all(&sounds);
        Some(Self {
            inner: Arc::new(Inner {
                sounds,
                current: Mutex::new(0),
            }),
            description,
        })
    }

    pub fn len(&self) -> usize {
        self.inner.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.sounds.is_empty()
    }
}

impl Sound for ConcatenatedSound {
    fn sound_type(&self) -> &SoundType {
        self.inner.sounds[0].sound_type()
    }

    fn layer_count(&self) -> usize {
        1
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn next_buffer(&self, layer: usize) -> BufferFuture {
        if layer != 0 {
            return ready(None);
        }

        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            loop {
                let index = inner.current();
                let sound = inner.sounds.get(index)?;

                if let Some(buffer) = sound.next_buffer(0).await {
                    return Some(buffer);
                }

                trace!("Constituent {} of {} finished", index + 1, inner.sounds.len());
                inner.advance_from(index);
            }
        })
    }

    fn equalizer_params(&self, _layer: usize, gains: &GainSettings) -> Option<EqParameters> {
        self.inner
            .sounds
            .iter()
            .find_map(|sound| sound.equalizer_params(0, gains))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{PcmBuffer, PcmFormat};
    use crate::sound::GenericSound;

    fn generic(name: &str, frames: usize) -> Box<dyn Sound> {
        Box::new(GenericSound::from_buffer(
            name,
            PcmBuffer::silent(PcmFormat::mono_f32(8_000), frames),
        ))
    }

    #[tokio::test]
    async fn test_plays_in_order_without_gap() {
        let sound = ConcatenatedSound::new(vec![generic("a", 1), generic("b", 2), generic("c", 3)]).unwrap();

        assert_eq!(sound.description(), "[{a}, {b}, {c}]");
        for frames in 1..=3 {
            assert_eq!(sound.next_buffer(0).await.unwrap().frame_length(), frames);
        }
        assert!(sound.next_buffer(0).await.is_none());
        assert!(sound.next_buffer(0).await.is_none());
    }

    #[tokio::test]
    async fn test_only_layer_zero() {
        let sound = ConcatenatedSound::new(vec![generic("a", 1)]).unwrap();
        assert!(sound.next_buffer(1).await.is_none());
        assert!(sound.next_buffer(0).await.is_some());
    }

    #[test]
    fn test_rejects_mixed_types() {
        let relative: Box<dyn Sound> = Box::new(
            GenericSound::from_buffer("r", PcmBuffer::silent(PcmFormat::mono_f32(8_000), 1)).relative(0.0),
        );
        assert!(ConcatenatedSound::new(vec![generic("a", 1), relative]).is_none());
        assert!(ConcatenatedSound::new(Vec::new()).is_none());
    }
}
