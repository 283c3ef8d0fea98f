//! Sounds played concurrently, one constituent per layer

use crate::audio::{EqParameters, GainSettings};
use crate::sound::{composable, describe_all, ready, BufferFuture, Sound, SoundType};

pub struct LayeredSound {
    sounds: Vec<Box<dyn Sound>>,
    description: String,
}

impl LayeredSound {
    /// Compose single-layer sounds of the same type case
    ///
    /// Returns `None` for an empty list, a multi-layer constituent, or mixed type cases.
    pub fn new(sounds: Vec<Box<dyn Sound>>) -> Option<Self> {
        if !composable(&sounds) {
            return None;
        }

        let description = describe_all(&sounds);
        Some(Self { sounds, description })
    }
}

impl Sound for LayeredSound {
    fn sound_type(&self) -> &SoundType {
        // Non-empty by construction
        self.sounds[0].sound_type()
    }

    fn layer_count(&self) -> usize {
        self.sounds.len()
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn next_buffer(&self, layer: usize) -> BufferFuture {
        match self.sounds.get(layer) {
            Some(sound) => sound.next_buffer(0),
            None => ready(None),
        }
    }

    fn equalizer_params(&self, layer: usize, gains: &GainSettings) -> Option<EqParameters> {
        self.sounds.get(layer)?.equalizer_params(0, gains)
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
    async fn test_layers_delegate_to_constituents() {
        let sound = LayeredSound::new(vec![generic("melody", 10), generic("tone", 20)]).unwrap();

        assert_eq!(sound.layer_count(), 2);
        assert_eq!(sound.description(), "[{melody}, {tone}]");
        assert_eq!(sound.next_buffer(1).await.unwrap().frame_length(), 20);
        assert_eq!(sound.next_buffer(0).await.unwrap().frame_length(), 10);
        assert!(sound.next_buffer(0).await.is_none());
        assert!(sound.next_buffer(2).await.is_none());
    }

    #[test]
    fn test_rejects_empty() {
        assert!(LayeredSound::new(Vec::new()).is_none());
    }

    #[test]
    fn test_rejects_mixed_types() {
        let spatial: Box<dyn Sound> = Box::new(
            GenericSound::from_buffer("a", PcmBuffer::silent(PcmFormat::mono_f32(8_000), 1)).compass(10.0),
        );
        assert!(LayeredSound::new(vec![generic("b", 1), spatial]).is_none());
    }

    #[test]
    fn test_rejects_multi_layer_constituent() {
        let inner = LayeredSound::new(vec![generic("a", 1), generic("b", 1)]).unwrap();
        assert!(LayeredSound::new(vec![Box::new(inner), generic("c", 1)]).is_none());
    }

    #[test]
    fn test_equalizer_per_layer() {
        let sound = LayeredSound::new(vec![generic("a", 1), generic("b", 1)]).unwrap();
        let gains = GainSettings {
            afx_gain: 2.0,
            ..GainSettings::default()
        };
        assert!(sound.equalizer_params(1, &gains).is_some());
        assert!(sound.equalizer_params(2, &gains).is_none());
    }
}
